//! Form Core - AcroForm manipulation on top of lopdf
//!
//! This crate provides functionality for:
//! - Opening a fixed-layout PDF form template and enumerating its fields
//! - Writing text and checkbox values into named fields
//! - Embedding a TrueType font used for field appearances
//! - Wiring in-document calculation scripts (`/AA /C` + `/CO`)
//! - Flattening the interactive layer into static page content
//! - Merging independently generated documents into one file
//!
//! # Example
//!
//! ```ignore
//! use form_core::{FormDocument, TextAppearance};
//!
//! let mut doc = FormDocument::load(&template_bytes)?;
//! doc.embed_font(&font_bytes)?;
//! doc.set_text("성명", "홍길동", &TextAppearance::default())?;
//! doc.set_checkbox("장로", true)?;
//! doc.flatten()?;
//! let bytes = doc.save_to_bytes()?;
//! ```

mod document;
mod encoding;
mod font;
mod merge;
mod script;

pub use document::{FormDocument, TextAppearance};
pub use encoding::{decode_pdf_text, encode_pdf_text};
pub use font::EmbeddedFont;
pub use merge::merge_documents;
pub use script::{build_sum_script, escape_for_script};

use thiserror::Error;

/// Errors that can occur during form operations
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Failed to load PDF: {0}")]
    Load(String),

    #[error("Failed to save PDF: {0}")]
    Save(String),

    #[error("Form field not found: {0}")]
    FieldNotFound(String),

    #[error("Field is not a text field: {0}")]
    NotATextField(String),

    #[error("Field is not a checkbox: {0}")]
    NotACheckbox(String),

    #[error("Failed to parse font: {0}")]
    FontParse(String),

    #[error("No appearance font embedded")]
    FontMissing,

    #[error("Document already flattened")]
    Flattened,

    #[error("PDF parsing error: {0}")]
    Parse(String),

    #[error("Lopdf error: {0}")]
    Lopdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for form operations
pub type Result<T> = std::result::Result<T, FormError>;

/// Horizontal alignment of a value inside its field widget
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_default() {
        assert_eq!(Align::default(), Align::Left);
    }

    #[test]
    fn test_field_not_found_names_field() {
        let err = FormError::FieldNotFound("총계 시간".to_string());
        assert!(err.to_string().contains("총계 시간"));
    }
}
