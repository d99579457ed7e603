//! Input data model
//!
//! The yearly record arrives from the reporting layer as JSON. Numeric
//! fields are deserialized leniently: a value that cannot be parsed is
//! logged and treated as zero, so one bad field never blocks an otherwise
//! valid annual report.

use serde::{Deserialize, Deserializer, Serialize};

/// Months of the service year, which runs September through August
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceMonth {
    #[serde(rename = "9월")]
    September,
    #[serde(rename = "10월")]
    October,
    #[serde(rename = "11월")]
    November,
    #[serde(rename = "12월")]
    December,
    #[serde(rename = "1월")]
    January,
    #[serde(rename = "2월")]
    February,
    #[serde(rename = "3월")]
    March,
    #[serde(rename = "4월")]
    April,
    #[serde(rename = "5월")]
    May,
    #[serde(rename = "6월")]
    June,
    #[serde(rename = "7월")]
    July,
    #[serde(rename = "8월")]
    August,
}

impl ServiceMonth {
    /// All twelve months in service-year order
    pub const ALL: [ServiceMonth; 12] = [
        ServiceMonth::September,
        ServiceMonth::October,
        ServiceMonth::November,
        ServiceMonth::December,
        ServiceMonth::January,
        ServiceMonth::February,
        ServiceMonth::March,
        ServiceMonth::April,
        ServiceMonth::May,
        ServiceMonth::June,
        ServiceMonth::July,
        ServiceMonth::August,
    ];

    /// The month label as it appears in template field names
    pub fn label(self) -> &'static str {
        match self {
            ServiceMonth::September => "9월",
            ServiceMonth::October => "10월",
            ServiceMonth::November => "11월",
            ServiceMonth::December => "12월",
            ServiceMonth::January => "1월",
            ServiceMonth::February => "2월",
            ServiceMonth::March => "3월",
            ServiceMonth::April => "4월",
            ServiceMonth::May => "5월",
            ServiceMonth::June => "6월",
            ServiceMonth::July => "7월",
            ServiceMonth::August => "8월",
        }
    }
}

/// Pioneer division reported for a month. Only `AssistantPioneer` affects
/// the card; regular pioneers are marked once via the identity checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Division {
    #[serde(rename = "AP")]
    AssistantPioneer,
    #[serde(rename = "RP")]
    RegularPioneer,
    #[default]
    #[serde(other, rename = "")]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "남", alias = "male")]
    Male,
    #[serde(rename = "여", alias = "female")]
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hope {
    #[serde(rename = "다른 양", alias = "otherSheep")]
    OtherSheep,
    #[serde(rename = "기름부음받은 자", alias = "anointed")]
    Anointed,
}

/// One calendar month's reported activity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecord {
    pub month: Option<ServiceMonth>,
    #[serde(default)]
    pub participated: bool,
    #[serde(default, deserialize_with = "lenient_count")]
    pub bible_studies: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub hours: u32,
    #[serde(default)]
    pub division: Division,
    #[serde(default)]
    pub remarks: String,
}

/// Static identity and role attributes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub baptism_date: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub hope: Option<Hope>,
    #[serde(default)]
    pub is_elder: bool,
    #[serde(default)]
    pub is_ministerial_servant: bool,
    #[serde(default)]
    pub is_regular_pioneer: bool,
    #[serde(default)]
    pub is_special_pioneer: bool,
    #[serde(default)]
    pub is_missionary: bool,
}

/// The unit of work for one card generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyRecord {
    #[serde(default)]
    pub user_info: UserInfo,
    #[serde(default)]
    pub monthly_records: Vec<MonthlyRecord>,
}

impl YearlyRecord {
    /// Find the record for a month, if one was reported
    pub fn month(&self, month: ServiceMonth) -> Option<&MonthlyRecord> {
        self.monthly_records
            .iter()
            .find(|r| r.month == Some(month))
    }
}

/// Accept numbers, numeric strings or null; anything else is logged and
/// treated as zero
fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => 0,
        Some(Raw::Number(n)) if n >= 0.0 && n.is_finite() => n as u32,
        Some(Raw::Number(n)) => {
            log::warn!("Ignoring out-of-range count {n}");
            0
        }
        Some(Raw::Text(text)) => match text.trim().parse::<u32>() {
            Ok(value) => value,
            Err(_) => {
                if !text.trim().is_empty() {
                    log::warn!("Ignoring non-numeric count '{text}'");
                }
                0
            }
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_month_labels_cover_service_year() {
        let labels: Vec<&str> = ServiceMonth::ALL.iter().map(|m| m.label()).collect();
        assert_eq!(labels[0], "9월");
        assert_eq!(labels[11], "8월");
        assert_eq!(labels.len(), 12);
    }

    #[test]
    fn test_monthly_record_from_json() {
        let record: MonthlyRecord = serde_json::from_str(
            r#"{ "month": "9월", "participated": true, "bibleStudies": 2, "hours": 50,
                 "division": "AP", "remarks": "병교위: 3시간" }"#,
        )
        .unwrap();
        assert_eq!(record.month, Some(ServiceMonth::September));
        assert!(record.participated);
        assert_eq!(record.bible_studies, 2);
        assert_eq!(record.hours, 50);
        assert_eq!(record.division, Division::AssistantPioneer);
    }

    #[test]
    fn test_lenient_counts_tolerate_bad_values() {
        let record: MonthlyRecord =
            serde_json::from_str(r#"{ "month": "9월", "hours": "abc", "bibleStudies": "3" }"#)
                .unwrap();
        assert_eq!(record.hours, 0);
        assert_eq!(record.bible_studies, 3);

        let record: MonthlyRecord =
            serde_json::from_str(r#"{ "month": "9월", "hours": null }"#).unwrap();
        assert_eq!(record.hours, 0);
    }

    #[test]
    fn test_unknown_division_defaults_to_none() {
        let record: MonthlyRecord =
            serde_json::from_str(r#"{ "month": "9월", "division": "기타" }"#).unwrap();
        assert_eq!(record.division, Division::None);
    }

    #[test]
    fn test_yearly_record_month_lookup() {
        let record: YearlyRecord = serde_json::from_str(
            r#"{ "userInfo": { "name": "홍길동" },
                 "monthlyRecords": [ { "month": "12월", "hours": 10 } ] }"#,
        )
        .unwrap();
        assert_eq!(record.month(ServiceMonth::December).unwrap().hours, 10);
        assert!(record.month(ServiceMonth::January).is_none());
    }
}
