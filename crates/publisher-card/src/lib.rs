//! Publisher card generation
//!
//! Takes a year of monthly ministry activity records for one person and
//! produces a filled, flattened copy of the fixed report-card template, plus
//! a merge operation combining several cards into a single document.
//!
//! ## Example
//!
//! ```no_run
//! use publisher_card::{CardGenerator, CachedProvider, DirProvider, YearlyRecord};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = CachedProvider::new(DirProvider::new("resources"));
//! let generator = CardGenerator::new(provider);
//!
//! let record: YearlyRecord = serde_json::from_str(r#"{
//!     "userInfo": { "name": "홍길동", "isElder": true },
//!     "monthlyRecords": [
//!         { "month": "9월", "participated": true, "hours": 50 }
//!     ]
//! }"#)?;
//!
//! let card = generator.generate_publisher_card(&record, "2025-2026 봉사 연도")?;
//! std::fs::write("card.pdf", card)?;
//! # Ok(())
//! # }
//! ```

mod accumulate;
mod fields;
mod generator;
mod record;
mod resources;

pub use accumulate::{accumulate, Accumulated, MonthCells};
pub use fields::{FieldMap, MonthColumn, StaticField};
pub use generator::CardGenerator;
pub use record::{Division, Gender, Hope, MonthlyRecord, ServiceMonth, UserInfo, YearlyRecord};
pub use resources::{CachedProvider, CardResources, DirProvider, ResourceProvider};

use thiserror::Error;

/// Errors surfaced by card generation
#[derive(Error, Debug)]
pub enum CardError {
    /// A template, font or field-map resource could not be fetched or parsed
    #[error("Failed to load card resources: {0}")]
    ResourceLoad(String),

    /// An abstract field key has no entry in the field map. Always indicates
    /// template/mapping drift rather than bad input data.
    #[error("No field mapping for key '{0}'")]
    UnknownField(String),

    /// Error from the underlying form engine
    #[error(transparent)]
    Form(#[from] form_core::FormError),

    /// Malformed field-map JSON
    #[error("Failed to parse field map: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience result type for card operations
pub type Result<T> = std::result::Result<T, CardError>;
