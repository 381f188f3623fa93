use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::utils::YearMonth;

/// Named stage in a project's lifecycle. The declaration order is the
/// lifecycle order and drives interval chaining and sorting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneKind {
    Contract,
    Construction,
    Invoice,
    Payment,
}

impl MilestoneKind {
    pub const ALL: [MilestoneKind; 4] = [
        MilestoneKind::Contract,
        MilestoneKind::Construction,
        MilestoneKind::Invoice,
        MilestoneKind::Payment,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MilestoneKind::Contract => "Contract",
            MilestoneKind::Construction => "Construction",
            MilestoneKind::Invoice => "Invoice",
            MilestoneKind::Payment => "Payment",
        }
    }
}

impl fmt::Display for MilestoneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One uploaded project row after header mapping and amount cleansing.
/// Milestone date cells are kept as raw text; date parsing happens when
/// the record is reshaped into tidy rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub project_name: String,
    pub assignee_name: String,
    pub contract_amount: f64,
    pub payment_amount_actual: f64,
    pub milestone_dates: BTreeMap<MilestoneKind, String>,
}

/// One (project, milestone kind, date) observation, the unpivoted form of
/// the wide input table. Rows whose date cell did not parse are dropped,
/// never carried as null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TidyRow {
    pub project_name: String,
    pub assignee_name: String,
    pub contract_amount: f64,
    pub payment_amount_actual: f64,
    pub milestone_kind: MilestoneKind,
    pub milestone_date: NaiveDate,
}

/// One timeline bar handed to the charting layer. `end >= start` always;
/// a same-day milestone is widened to the configured minimum visual width.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GanttInterval {
    pub task_label: String,
    pub milestone_kind: MilestoneKind,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub is_projected: bool,
}

/// Monetary totals for one contract-month bucket. `total_unpaid_value`
/// is contract minus paid by definition, never computed independently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlySummary {
    pub month: YearMonth,
    pub total_contract_value: f64,
    pub total_paid_value: f64,
    pub total_unpaid_value: f64,
}

/// Overall (non-bucketed) totals over the deduplicated project set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectTotals {
    pub project_count: usize,
    pub total_contract_value: f64,
    pub total_paid_value: f64,
    pub total_unpaid_value: f64,
}

/// Filters chosen in the dashboard. All optional; an empty set means the
/// whole table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterParams {
    pub assignee: Option<String>,
    pub contract_from: Option<NaiveDate>,
    pub contract_to: Option<NaiveDate>,
    pub contract_month: Option<YearMonth>,
    /// Independently chosen month; a project counts as paid only if its
    /// payment date falls on or before this month's last day.
    pub comparison_month: Option<YearMonth>,
}

/// Whether the chart shows only actual milestones or overlays the
/// formula-derived projected schedule as a second chain.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    ActualOnly,
    PlannedAndActual,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milestone_kind_order_follows_lifecycle() {
        assert!(MilestoneKind::Contract < MilestoneKind::Construction);
        assert!(MilestoneKind::Construction < MilestoneKind::Invoice);
        assert!(MilestoneKind::Invoice < MilestoneKind::Payment);
    }

    #[test]
    fn milestone_kind_serde_uses_snake_case() {
        let json = serde_json::to_string(&MilestoneKind::Construction).unwrap();
        assert_eq!(json, "\"construction\"");
        let kind: MilestoneKind = serde_json::from_str("\"payment\"").unwrap();
        assert_eq!(kind, MilestoneKind::Payment);
    }
}
