//! Card generation pipeline
//!
//! Composes resource loading, accumulation and form writing into the two
//! public operations: generating one publisher card and merging many into a
//! single deliverable.

use crate::accumulate::accumulate;
use crate::fields::{FieldMap, MonthColumn, StaticField};
use crate::record::{Gender, Hope, ServiceMonth, UserInfo, YearlyRecord};
use crate::resources::ResourceProvider;
use crate::Result;
use form_core::{build_sum_script, merge_documents, Align, FormDocument, TextAppearance};

/// Identity text fields: name and dates
const IDENTITY: TextAppearance = TextAppearance {
    font_size: 12.0,
    align: Align::Left,
    y_shift: 0.0,
    multiline: false,
};

/// Numeric table cells and totals, nudged up to sit on the printed baseline
const NUMERIC: TextAppearance = TextAppearance {
    font_size: 11.0,
    align: Align::Center,
    y_shift: 3.0,
    multiline: false,
};

/// Service-year label: centered like the table cells, but the header row
/// needs no baseline nudge
const SERVICE_YEAR: TextAppearance = TextAppearance {
    font_size: 11.0,
    align: Align::Center,
    y_shift: 0.0,
    multiline: false,
};

/// Free-text remarks cells
const REMARKS: TextAppearance = TextAppearance {
    font_size: 9.0,
    align: Align::Left,
    y_shift: 4.0,
    multiline: true,
};

/// Generates publisher cards from yearly records
pub struct CardGenerator<P> {
    provider: P,
}

impl<P: ResourceProvider> CardGenerator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Fill the card template for one person and return the flattened PDF
    ///
    /// Fails without producing output when a field mapping is missing or the
    /// template lacks a referenced field; a partial card is never returned.
    pub fn generate_publisher_card(
        &self,
        record: &YearlyRecord,
        service_year: &str,
    ) -> Result<Vec<u8>> {
        let resources = self.provider.load()?;
        let map = &resources.field_map;

        let mut form = FormDocument::load(&resources.template)?;
        form.embed_font(&resources.font)?;
        log::debug!(
            "Generating card for '{}' ({} month entries)",
            record.user_info.name,
            record.monthly_records.len()
        );

        self.write_identity(&mut form, map, &record.user_info, service_year)?;

        let values = accumulate(record);
        for (month, cells) in &values.months {
            form.set_checkbox(
                &MonthColumn::Participated.field_name(*month),
                cells.participated,
            )?;
            form.set_checkbox(
                &MonthColumn::AssistantPioneer.field_name(*month),
                cells.assistant_pioneer,
            )?;
            form.set_text(&MonthColumn::Studies.field_name(*month), &cells.studies, &NUMERIC)?;
            form.set_text(&MonthColumn::Hours.field_name(*month), &cells.hours, &NUMERIC)?;
            form.set_text(&MonthColumn::Remarks.field_name(*month), &cells.remarks, &REMARKS)?;
        }
        form.set_text(
            map.require(StaticField::TotalHours)?,
            &values.total_hours,
            &NUMERIC,
        )?;
        form.set_text(
            map.require(StaticField::TotalRemarks)?,
            &values.total_remarks,
            &REMARKS,
        )?;

        self.wire_calculation(&mut form, map)?;

        form.flatten()?;
        Ok(form.save_to_bytes()?)
    }

    /// Merge independently generated cards into one document, in input order
    pub fn merge_cards(&self, documents: &[Vec<u8>]) -> Result<Vec<u8>> {
        Ok(merge_documents(documents)?)
    }

    fn write_identity(
        &self,
        form: &mut FormDocument,
        map: &FieldMap,
        user: &UserInfo,
        service_year: &str,
    ) -> Result<()> {
        form.set_text(map.require(StaticField::Name)?, &user.name, &IDENTITY)?;
        form.set_text(map.require(StaticField::BirthDate)?, &user.birth_date, &IDENTITY)?;
        form.set_text(
            map.require(StaticField::BaptismDate)?,
            &user.baptism_date,
            &IDENTITY,
        )?;
        form.set_text(
            map.require(StaticField::ServiceYear)?,
            service_year,
            &SERVICE_YEAR,
        )?;

        for (field, checked) in identity_checks(user) {
            form.set_checkbox(map.require(field)?, checked)?;
        }
        Ok(())
    }

    /// Attach the hours-total calculation script and register the viewer
    /// dependency wiring
    fn wire_calculation(&self, form: &mut FormDocument, map: &FieldMap) -> Result<()> {
        let hour_fields: Vec<String> = ServiceMonth::ALL
            .iter()
            .map(|month| MonthColumn::Hours.field_name(*month))
            .collect();

        let script = build_sum_script(&hour_fields);
        form.set_calculation_action(map.require(StaticField::TotalHours)?, &script)?;

        // Compatibility nudge: a validate action on each hour field makes
        // interactive viewers re-run the calculation chain on edits
        for field in &hour_fields {
            form.set_validate_stub(field)?;
        }
        Ok(())
    }
}

/// The nine identity checkboxes, each driven by exactly one `UserInfo` field
fn identity_checks(user: &UserInfo) -> [(StaticField, bool); 9] {
    [
        (StaticField::Male, user.gender == Some(Gender::Male)),
        (StaticField::Female, user.gender == Some(Gender::Female)),
        (StaticField::OtherSheep, user.hope == Some(Hope::OtherSheep)),
        (StaticField::Anointed, user.hope == Some(Hope::Anointed)),
        (StaticField::Elder, user.is_elder),
        (StaticField::MinisterialServant, user.is_ministerial_servant),
        (StaticField::RegularPioneer, user.is_regular_pioneer),
        (StaticField::SpecialPioneer, user.is_special_pioneer),
        (StaticField::Missionary, user.is_missionary),
    ]
}
