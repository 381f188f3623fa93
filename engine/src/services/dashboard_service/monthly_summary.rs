// Handler for the summary metrics: overall totals plus the per-month
// breakdown, both over the already-filtered tidy rows.
use tracing::debug;

use crate::config::PipelineSettings;
use crate::pipeline::aggregate;
use shared::models::{MonthlySummary, ProjectTotals, TidyRow};
use shared::utils::YearMonth;

pub fn handle_monthly_summary(
    rows: &[TidyRow],
    settings: &PipelineSettings,
    comparison_month: Option<YearMonth>,
) -> (ProjectTotals, Vec<MonthlySummary>) {
    debug!(rows = rows.len(), "building summary metrics");
    let totals = aggregate::project_totals(rows, settings, comparison_month);
    let monthly = aggregate::monthly_breakdown(rows, settings, comparison_month);
    (totals, monthly)
}
