//! Field resolution
//!
//! Abstract field keys are resolved to concrete template field names in two
//! ways: month-scoped columns compose the month label with a fixed suffix,
//! while static fields go through the configurable field map. A key missing
//! from the map is a hard error, since it indicates template drift that
//! would corrupt every generated card.

use crate::record::ServiceMonth;
use crate::{CardError, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Month-scoped table columns of the card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthColumn {
    Participated,
    Studies,
    AssistantPioneer,
    Hours,
    Remarks,
}

impl MonthColumn {
    /// Concrete template field name for this column in the given month
    pub fn field_name(self, month: ServiceMonth) -> String {
        let label = month.label();
        match self {
            MonthColumn::Participated => format!("{label} 봉사에 참여했음"),
            MonthColumn::Studies => format!("{label} 성서 연구"),
            MonthColumn::AssistantPioneer => format!("{label} 보조 파이오니아"),
            MonthColumn::Hours => format!("{label} 시간"),
            MonthColumn::Remarks => format!("{label} 비고"),
        }
    }
}

/// Fields that appear exactly once on the card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticField {
    Name,
    BirthDate,
    BaptismDate,
    Male,
    Female,
    OtherSheep,
    Anointed,
    Elder,
    MinisterialServant,
    RegularPioneer,
    SpecialPioneer,
    Missionary,
    ServiceYear,
    TotalHours,
    TotalRemarks,
}

impl StaticField {
    /// The key this field is looked up under in the field map
    pub fn map_key(self) -> &'static str {
        match self {
            StaticField::Name => "name",
            StaticField::BirthDate => "birthDate",
            StaticField::BaptismDate => "baptismDate",
            StaticField::Male => "genderMale",
            StaticField::Female => "genderFemale",
            StaticField::OtherSheep => "hopeOtherSheep",
            StaticField::Anointed => "hopeAnointed",
            StaticField::Elder => "elder",
            StaticField::MinisterialServant => "ministerialServant",
            StaticField::RegularPioneer => "regularPioneer",
            StaticField::SpecialPioneer => "specialPioneer",
            StaticField::Missionary => "missionary",
            StaticField::ServiceYear => "serviceYear",
            StaticField::TotalHours => "totalHours",
            StaticField::TotalRemarks => "totalRemarks",
        }
    }
}

/// Static key -> template field name mapping, loaded as JSON configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct FieldMap {
    entries: HashMap<String, String>,
}

impl FieldMap {
    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Resolve a static field, failing fast when the mapping is missing
    pub fn require(&self, field: StaticField) -> Result<&str> {
        let key = field.map_key();
        self.entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| CardError::UnknownField(key.to_string()))
    }
}

impl Default for FieldMap {
    /// Field names of the stock Korean report-card template
    fn default() -> Self {
        let entries = [
            ("name", "성명"),
            ("birthDate", "생년월일"),
            ("baptismDate", "침례 일자"),
            ("genderMale", "남"),
            ("genderFemale", "여"),
            ("hopeOtherSheep", "다른 양"),
            ("hopeAnointed", "기름부음받은 자"),
            ("elder", "장로"),
            ("ministerialServant", "봉사의 종"),
            ("regularPioneer", "정규 파이오니아"),
            ("specialPioneer", "특별 파이오니아"),
            ("missionary", "야외 선교인"),
            ("serviceYear", "봉사 연도"),
            ("totalHours", "총계 시간"),
            ("totalRemarks", "총계 비고"),
        ]
        .into_iter()
        .map(|(key, label)| (key.to_string(), label.to_string()))
        .collect();
        Self { entries }
    }
}
