// Tidy Reshaper: unpivots the milestone date columns of each canonical
// record into one row per (record, milestone kind) observation. Date
// parsing fails closed — an unparseable cell drops that observation,
// never producing a zero-dated row.
use tracing::{debug, info};

use crate::config::PipelineSettings;
use crate::data::csv_parser::japanese_format;
use shared::models::{CanonicalRecord, TidyRow};

pub fn reshape_records(
    records: &[CanonicalRecord],
    settings: &PipelineSettings,
) -> Vec<TidyRow> {
    let mut rows = Vec::new();
    for record in records {
        for (kind, raw_date) in &record.milestone_dates {
            match japanese_format::parse_date(raw_date, &settings.date_formats) {
                Ok(date) => rows.push(TidyRow {
                    project_name: record.project_name.clone(),
                    assignee_name: record.assignee_name.clone(),
                    contract_amount: record.contract_amount,
                    payment_amount_actual: record.payment_amount_actual,
                    milestone_kind: *kind,
                    milestone_date: date,
                }),
                Err(error) => {
                    debug!(
                        project = %record.project_name,
                        kind = %kind,
                        cell = %raw_date,
                        %error,
                        "dropping milestone with unparseable date"
                    );
                }
            }
        }
    }
    info!(
        records = records.len(),
        tidy_rows = rows.len(),
        "reshaped records into tidy rows"
    );
    rows
}
