// Pipeline settings. Every knob the near-identical dashboard deployments
// used to fork on is an explicit named option here, loadable from JSON or
// taken from Default.
use serde::{Deserialize, Serialize};
use shared::models::MilestoneKind;
use std::collections::HashMap;

use crate::error::EngineError;

/// Fixed sales-tax multiplier applied when the source amounts are known
/// to be tax-exclusive.
pub const TAX_RATE: f64 = 1.1;

/// Canonical identity of a logical input column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalColumn {
    ProjectName,
    AssigneeName,
    ContractAmount,
    PaymentAmountActual,
    ContractDate,
    ConstructionDate,
    InvoiceDate,
    PaymentDate,
}

impl CanonicalColumn {
    pub fn key(&self) -> &'static str {
        match self {
            CanonicalColumn::ProjectName => "project_name",
            CanonicalColumn::AssigneeName => "assignee_name",
            CanonicalColumn::ContractAmount => "contract_amount",
            CanonicalColumn::PaymentAmountActual => "payment_amount_actual",
            CanonicalColumn::ContractDate => "contract_date",
            CanonicalColumn::ConstructionDate => "construction_date",
            CanonicalColumn::InvoiceDate => "invoice_date",
            CanonicalColumn::PaymentDate => "payment_date",
        }
    }

    /// Resolve a header that already carries a canonical id. This is what
    /// makes normalization a no-op on an already-normalized table.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "project_name" => Some(CanonicalColumn::ProjectName),
            "assignee_name" => Some(CanonicalColumn::AssigneeName),
            "contract_amount" => Some(CanonicalColumn::ContractAmount),
            "payment_amount_actual" => Some(CanonicalColumn::PaymentAmountActual),
            "contract_date" => Some(CanonicalColumn::ContractDate),
            "construction_date" => Some(CanonicalColumn::ConstructionDate),
            "invoice_date" => Some(CanonicalColumn::InvoiceDate),
            "payment_date" => Some(CanonicalColumn::PaymentDate),
            _ => None,
        }
    }

    pub fn milestone_kind(&self) -> Option<MilestoneKind> {
        match self {
            CanonicalColumn::ContractDate => Some(MilestoneKind::Contract),
            CanonicalColumn::ConstructionDate => Some(MilestoneKind::Construction),
            CanonicalColumn::InvoiceDate => Some(MilestoneKind::Invoice),
            CanonicalColumn::PaymentDate => Some(MilestoneKind::Payment),
            _ => None,
        }
    }
}

/// What the cleanser does with an amount cell that fails to parse.
/// Zero substitution keeps the row (and admits zero-value projects into
/// counts); dropping excludes the whole record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AmountPolicy {
    ZeroOnError,
    DropRow,
}

/// Which projects count toward the paid total.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaidTotalPolicy {
    /// A Payment-kind tidy row exists for the project.
    PaymentDatePresent,
    /// The cleansed payment amount is strictly positive.
    AmountPositive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Source header -> canonical column. Full-width and half-width
    /// parenthesis spellings are enumerated explicitly; header text is
    /// matched verbatim after whitespace trimming, without Unicode
    /// normalization.
    pub column_map: HashMap<String, CanonicalColumn>,
    pub required_columns: Vec<CanonicalColumn>,
    pub amount_policy: AmountPolicy,
    /// Multiply cleansed amounts by the fixed 1.1 tax rate. Off when the
    /// source column is already tax-inclusive.
    pub tax_exclusive_amounts: bool,
    /// Gate the payment interval on a construction date being present.
    pub payment_requires_construction: bool,
    pub paid_total_policy: PaidTotalPolicy,
    /// Nominal width of the contract bar, in days.
    pub contract_span_days: i64,
    /// Minimum visual width for a bar whose milestone collapses to a
    /// single instant, in hours.
    pub min_bar_width_hours: i64,
    /// Cumulative month offsets for the projected chain:
    /// contract -> construction -> invoice -> payment.
    pub projected_construction_months: u32,
    pub projected_invoice_months: u32,
    pub projected_payment_months: u32,
    /// Date formats tried in order against NFKC-normalized cell text.
    pub date_formats: Vec<String>,
}

impl PipelineSettings {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.date_formats.is_empty() {
            return Err(EngineError::Config("date_formats must not be empty".to_string()));
        }
        if self.contract_span_days < 1 {
            return Err(EngineError::Config(format!(
                "contract_span_days must be at least 1, got {}",
                self.contract_span_days
            )));
        }
        if self.min_bar_width_hours < 1 {
            return Err(EngineError::Config(format!(
                "min_bar_width_hours must be at least 1, got {}",
                self.min_bar_width_hours
            )));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let settings: PipelineSettings = serde_json::from_str(json)
            .map_err(|e| EngineError::Config(format!("failed to parse settings JSON: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }
}

fn default_column_map() -> HashMap<String, CanonicalColumn> {
    let entries: [(&str, CanonicalColumn); 14] = [
        ("案件名", CanonicalColumn::ProjectName),
        ("物件名", CanonicalColumn::ProjectName),
        ("担当者名", CanonicalColumn::AssigneeName),
        ("担当者", CanonicalColumn::AssigneeName),
        // Both parenthesis widths are live in the wild
        ("契約金額（税込）", CanonicalColumn::ContractAmount),
        ("契約金額(税込)", CanonicalColumn::ContractAmount),
        ("契約金額", CanonicalColumn::ContractAmount),
        ("入金金額（実績）", CanonicalColumn::PaymentAmountActual),
        ("入金金額(実績)", CanonicalColumn::PaymentAmountActual),
        ("入金金額", CanonicalColumn::PaymentAmountActual),
        ("契約日", CanonicalColumn::ContractDate),
        ("着工日", CanonicalColumn::ConstructionDate),
        ("請求日", CanonicalColumn::InvoiceDate),
        ("入金日", CanonicalColumn::PaymentDate),
    ];
    entries
        .into_iter()
        .map(|(header, column)| (header.to_string(), column))
        .collect()
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            column_map: default_column_map(),
            required_columns: vec![
                CanonicalColumn::ProjectName,
                CanonicalColumn::AssigneeName,
            ],
            amount_policy: AmountPolicy::ZeroOnError,
            tax_exclusive_amounts: false,
            payment_requires_construction: true,
            paid_total_policy: PaidTotalPolicy::PaymentDatePresent,
            contract_span_days: 4,
            min_bar_width_hours: 12,
            projected_construction_months: 3,
            projected_invoice_months: 1,
            projected_payment_months: 2,
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%Y/%m/%d".to_string(),
                "%Y.%m.%d".to_string(),
                "%Y年%m月%d日".to_string(),
                "%m/%d/%Y".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_resolves_both_parenthesis_widths() {
        let settings = PipelineSettings::default();
        assert_eq!(
            settings.column_map.get("契約金額（税込）"),
            Some(&CanonicalColumn::ContractAmount)
        );
        assert_eq!(
            settings.column_map.get("契約金額(税込)"),
            Some(&CanonicalColumn::ContractAmount)
        );
    }

    #[test]
    fn canonical_keys_round_trip() {
        for column in [
            CanonicalColumn::ProjectName,
            CanonicalColumn::AssigneeName,
            CanonicalColumn::ContractAmount,
            CanonicalColumn::PaymentAmountActual,
            CanonicalColumn::ContractDate,
            CanonicalColumn::ConstructionDate,
            CanonicalColumn::InvoiceDate,
            CanonicalColumn::PaymentDate,
        ] {
            assert_eq!(CanonicalColumn::from_key(column.key()), Some(column));
        }
        assert_eq!(CanonicalColumn::from_key("担当者名"), None);
    }

    #[test]
    fn milestone_columns_expose_their_kind() {
        assert_eq!(
            CanonicalColumn::ConstructionDate.milestone_kind(),
            Some(MilestoneKind::Construction)
        );
        assert_eq!(CanonicalColumn::ProjectName.milestone_kind(), None);
    }

    #[test]
    fn partial_json_config_keeps_defaults() {
        let settings =
            PipelineSettings::from_json_str(r#"{"tax_exclusive_amounts": true}"#).unwrap();
        assert!(settings.tax_exclusive_amounts);
        assert_eq!(settings.amount_policy, AmountPolicy::ZeroOnError);
        assert_eq!(settings.contract_span_days, 4);
        assert!(!settings.column_map.is_empty());
    }

    #[test]
    fn validate_rejects_empty_date_formats() {
        let mut settings = PipelineSettings::default();
        settings.date_formats.clear();
        assert!(matches!(
            settings.validate(),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_span() {
        let mut settings = PipelineSettings::default();
        settings.contract_span_days = 0;
        assert!(settings.validate().is_err());
    }
}
