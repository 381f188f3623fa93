// Column Normalizer and Numeric Cleanser: maps vendor-specific headers
// onto the canonical schema and turns heterogeneous amount text into
// numbers. The only schema-level failure lives here; everything below is
// per-cell and absorbed.
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::config::{AmountPolicy, CanonicalColumn, PipelineSettings, TAX_RATE};
use crate::data::csv_parser::{japanese_format, RawTable};
use crate::error::EngineError;
use shared::models::CanonicalRecord;

/// Canonical column -> position in the uploaded table.
type ColumnPositions = HashMap<CanonicalColumn, usize>;

/// Maps the header row onto canonical columns and builds one
/// `CanonicalRecord` per usable input row.
pub fn normalize_table(
    table: &RawTable,
    settings: &PipelineSettings,
) -> Result<Vec<CanonicalRecord>, EngineError> {
    let positions = resolve_columns(&table.headers, settings)?;

    let mut records = Vec::with_capacity(table.rows.len());
    for (row_index, row) in table.rows.iter().enumerate() {
        match build_record(row, &positions, settings) {
            Some(record) => records.push(record),
            None => debug!(row = row_index + 2, "row dropped during normalization"),
        }
    }

    info!(
        rows_in = table.rows.len(),
        records_out = records.len(),
        "normalized uploaded table"
    );
    Ok(records)
}

/// Header matching: trim whitespace (including the full-width space),
/// look the header up in the mapping table, and fall back to the
/// canonical ids themselves so already-normalized tables pass through
/// unchanged. Header text is matched verbatim otherwise — both
/// parenthesis widths must be enumerated in the map.
fn resolve_columns(
    headers: &[String],
    settings: &PipelineSettings,
) -> Result<ColumnPositions, EngineError> {
    let mut positions = ColumnPositions::new();
    for (index, raw_header) in headers.iter().enumerate() {
        let header = raw_header.trim();
        let column = settings
            .column_map
            .get(header)
            .copied()
            .or_else(|| CanonicalColumn::from_key(header));
        let Some(column) = column else { continue };

        if positions.contains_key(&column) {
            warn!(
                header = %raw_header,
                column = column.key(),
                "duplicate source header; first occurrence wins"
            );
        } else {
            positions.insert(column, index);
        }
    }

    let missing: Vec<String> = settings
        .required_columns
        .iter()
        .filter(|column| !positions.contains_key(column))
        .map(|column| column.key().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(EngineError::Schema { missing });
    }
    Ok(positions)
}

fn cell<'a>(row: &'a [String], positions: &ColumnPositions, column: CanonicalColumn) -> &'a str {
    positions
        .get(&column)
        .and_then(|&index| row.get(index))
        .map(|value| value.trim())
        .unwrap_or("")
}

fn build_record(
    row: &[String],
    positions: &ColumnPositions,
    settings: &PipelineSettings,
) -> Option<CanonicalRecord> {
    let project_name = cell(row, positions, CanonicalColumn::ProjectName);
    if project_name.is_empty() {
        debug!("empty project name");
        return None;
    }
    let assignee_name = cell(row, positions, CanonicalColumn::AssigneeName).to_string();

    let contract_amount =
        cleanse_amount(row, positions, CanonicalColumn::ContractAmount, settings)?;
    let payment_amount_actual =
        cleanse_amount(row, positions, CanonicalColumn::PaymentAmountActual, settings)?;

    // Milestone date cells stay raw here; the reshaper owns date parsing.
    let mut milestone_dates = BTreeMap::new();
    for column in [
        CanonicalColumn::ContractDate,
        CanonicalColumn::ConstructionDate,
        CanonicalColumn::InvoiceDate,
        CanonicalColumn::PaymentDate,
    ] {
        if !positions.contains_key(&column) {
            continue;
        }
        let value = cell(row, positions, column);
        if value.is_empty() {
            continue;
        }
        // milestone_kind() is Some for every date column
        let kind = column.milestone_kind()?;
        milestone_dates.insert(kind, value.to_string());
    }

    Some(CanonicalRecord {
        project_name: project_name.to_string(),
        assignee_name,
        contract_amount,
        payment_amount_actual,
        milestone_dates,
    })
}

/// Cleansing policy for one amount cell. A column absent from the upload
/// reads as zero under either policy; only cells from a present column
/// can drop the row.
fn cleanse_amount(
    row: &[String],
    positions: &ColumnPositions,
    column: CanonicalColumn,
    settings: &PipelineSettings,
) -> Option<f64> {
    if !positions.contains_key(&column) {
        return Some(0.0);
    }
    let raw = cell(row, positions, column);
    match japanese_format::parse_amount(raw) {
        Ok(amount) => Some(apply_tax(amount, settings)),
        Err(error) => match settings.amount_policy {
            AmountPolicy::ZeroOnError => {
                debug!(column = column.key(), cell = %raw, %error, "amount cell unusable; substituting zero");
                Some(0.0)
            }
            AmountPolicy::DropRow => {
                debug!(column = column.key(), cell = %raw, %error, "amount cell unusable; dropping row");
                None
            }
        },
    }
}

fn apply_tax(amount: f64, settings: &PipelineSettings) -> f64 {
    if settings.tax_exclusive_amounts {
        amount * TAX_RATE
    } else {
        amount
    }
}
