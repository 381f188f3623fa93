// Aggregator: project-level deduplication and monetary totals. The
// unpaid figure is contract minus paid by definition and is never
// derived a second way.
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::config::{PaidTotalPolicy, PipelineSettings};
use shared::models::{FilterParams, MilestoneKind, MonthlySummary, ProjectTotals, TidyRow};
use shared::utils::YearMonth;

/// Per-project digest after deduplication: the first amounts and
/// milestone dates seen in input order.
#[derive(Debug)]
struct ProjectDigest {
    contract_amount: f64,
    payment_amount_actual: f64,
    contract_date: Option<NaiveDate>,
    payment_date: Option<NaiveDate>,
    has_payment_row: bool,
}

/// Applies the dashboard filters to the tidy table. The assignee filter
/// works row-wise; the contract date filters select whole projects by
/// their (first) contract date, removing every row of a project that
/// falls outside. Projects without a contract date are excluded only
/// when a date filter is active.
pub fn apply_filters(rows: &[TidyRow], filters: &FilterParams) -> Vec<TidyRow> {
    let by_assignee: Vec<&TidyRow> = rows
        .iter()
        .filter(|row| match &filters.assignee {
            Some(assignee) => row.assignee_name == *assignee,
            None => true,
        })
        .collect();

    let date_filter_active = filters.contract_from.is_some()
        || filters.contract_to.is_some()
        || filters.contract_month.is_some();
    if !date_filter_active {
        return by_assignee.into_iter().cloned().collect();
    }

    // First contract date per project, in input order
    let mut contract_dates: HashMap<&str, NaiveDate> = HashMap::new();
    for row in &by_assignee {
        if row.milestone_kind == MilestoneKind::Contract {
            contract_dates
                .entry(row.project_name.as_str())
                .or_insert(row.milestone_date);
        }
    }

    let keep = |project: &str| -> bool {
        let Some(&date) = contract_dates.get(project) else {
            return false;
        };
        if let Some(from) = filters.contract_from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = filters.contract_to {
            if date > to {
                return false;
            }
        }
        if let Some(month) = filters.contract_month {
            if !month.contains(date) {
                return false;
            }
        }
        true
    };

    let kept: Vec<TidyRow> = by_assignee
        .into_iter()
        .filter(|row| keep(&row.project_name))
        .cloned()
        .collect();
    debug!(rows_in = rows.len(), rows_out = kept.len(), "applied filters");
    kept
}

fn digest_projects(rows: &[TidyRow]) -> (Vec<String>, HashMap<String, ProjectDigest>) {
    let mut order: Vec<String> = Vec::new();
    let mut digests: HashMap<String, ProjectDigest> = HashMap::new();
    for row in rows {
        let digest = digests
            .entry(row.project_name.clone())
            .or_insert_with(|| {
                order.push(row.project_name.clone());
                ProjectDigest {
                    contract_amount: row.contract_amount,
                    payment_amount_actual: row.payment_amount_actual,
                    contract_date: None,
                    payment_date: None,
                    has_payment_row: false,
                }
            });
        match row.milestone_kind {
            MilestoneKind::Contract => {
                digest.contract_date.get_or_insert(row.milestone_date);
            }
            MilestoneKind::Payment => {
                digest.has_payment_row = true;
                digest.payment_date.get_or_insert(row.milestone_date);
            }
            _ => {}
        }
    }
    (order, digests)
}

/// Whether a deduplicated project counts toward the paid total under the
/// configured policy, optionally further gated by "paid on or before the
/// end of the comparison month".
fn counts_as_paid(
    digest: &ProjectDigest,
    settings: &PipelineSettings,
    comparison_month: Option<YearMonth>,
) -> bool {
    let policy_passes = match settings.paid_total_policy {
        PaidTotalPolicy::PaymentDatePresent => digest.has_payment_row,
        PaidTotalPolicy::AmountPositive => digest.payment_amount_actual > 0.0,
    };
    if !policy_passes {
        return false;
    }
    match comparison_month {
        Some(month) => match digest.payment_date {
            Some(date) => date <= month.last_day(),
            None => false,
        },
        None => true,
    }
}

/// Overall totals over the deduplicated project set.
pub fn project_totals(
    rows: &[TidyRow],
    settings: &PipelineSettings,
    comparison_month: Option<YearMonth>,
) -> ProjectTotals {
    let (order, digests) = digest_projects(rows);

    let mut total_contract_value = 0.0;
    let mut total_paid_value = 0.0;
    for project in &order {
        let digest = &digests[project];
        total_contract_value += digest.contract_amount;
        if counts_as_paid(digest, settings, comparison_month) {
            total_paid_value += digest.payment_amount_actual;
        }
    }

    let totals = ProjectTotals {
        project_count: order.len(),
        total_contract_value,
        total_paid_value,
        total_unpaid_value: total_contract_value - total_paid_value,
    };
    info!(
        projects = totals.project_count,
        contract = totals.total_contract_value,
        paid = totals.total_paid_value,
        "computed project totals"
    );
    totals
}

/// Totals bucketed by contract-date year-month, ascending. Projects
/// without a contract date have no bucket and are absent here.
pub fn monthly_breakdown(
    rows: &[TidyRow],
    settings: &PipelineSettings,
    comparison_month: Option<YearMonth>,
) -> Vec<MonthlySummary> {
    let (order, digests) = digest_projects(rows);

    let mut buckets: BTreeMap<YearMonth, (f64, f64)> = BTreeMap::new();
    for project in &order {
        let digest = &digests[project];
        let Some(contract_date) = digest.contract_date else {
            continue;
        };
        let bucket = buckets
            .entry(YearMonth::from_date(contract_date))
            .or_insert((0.0, 0.0));
        bucket.0 += digest.contract_amount;
        if counts_as_paid(digest, settings, comparison_month) {
            bucket.1 += digest.payment_amount_actual;
        }
    }

    buckets
        .into_iter()
        .map(|(month, (contract, paid))| MonthlySummary {
            month,
            total_contract_value: contract,
            total_paid_value: paid,
            total_unpaid_value: contract - paid,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(
        project: &str,
        assignee: &str,
        contract_amount: f64,
        payment_amount: f64,
        kind: MilestoneKind,
        milestone_date: NaiveDate,
    ) -> TidyRow {
        TidyRow {
            project_name: project.to_string(),
            assignee_name: assignee.to_string(),
            contract_amount,
            payment_amount_actual: payment_amount,
            milestone_kind: kind,
            milestone_date,
        }
    }

    #[test]
    fn duplicate_projects_are_deduplicated_before_summing() {
        // Project B appears twice at 500 each; it must contribute 500
        let rows = vec![
            row("B", "佐藤", 500.0, 0.0, MilestoneKind::Contract, date(2024, 4, 1)),
            row("B", "佐藤", 500.0, 0.0, MilestoneKind::Contract, date(2024, 5, 1)),
        ];
        let totals = project_totals(&rows, &PipelineSettings::default(), None);
        assert_eq!(totals.project_count, 1);
        assert_eq!(totals.total_contract_value, 500.0);
    }

    #[test]
    fn unpaid_is_contract_minus_paid_exactly() {
        let rows = vec![
            row("A", "佐藤", 1000.0, 400.0, MilestoneKind::Contract, date(2024, 4, 1)),
            row("A", "佐藤", 1000.0, 400.0, MilestoneKind::Payment, date(2024, 8, 1)),
            row("B", "鈴木", 500.0, 0.0, MilestoneKind::Contract, date(2024, 4, 2)),
        ];
        let totals = project_totals(&rows, &PipelineSettings::default(), None);
        assert_eq!(totals.total_contract_value, 1500.0);
        assert_eq!(totals.total_paid_value, 400.0);
        assert_eq!(
            totals.total_unpaid_value,
            totals.total_contract_value - totals.total_paid_value
        );
    }

    #[test]
    fn presence_gated_policy_ignores_amount_without_payment_row() {
        // Payment amount recorded but no payment date row
        let rows = vec![row(
            "A", "佐藤", 1000.0, 400.0, MilestoneKind::Contract, date(2024, 4, 1),
        )];
        let totals = project_totals(&rows, &PipelineSettings::default(), None);
        assert_eq!(totals.total_paid_value, 0.0);
    }

    #[test]
    fn amount_positive_policy_counts_paid_without_payment_row() {
        let mut settings = PipelineSettings::default();
        settings.paid_total_policy = PaidTotalPolicy::AmountPositive;
        let rows = vec![row(
            "A", "佐藤", 1000.0, 400.0, MilestoneKind::Contract, date(2024, 4, 1),
        )];
        let totals = project_totals(&rows, &settings, None);
        assert_eq!(totals.total_paid_value, 400.0);
    }

    #[test]
    fn comparison_month_excludes_later_payments() {
        // Contracted 2024-04-10, paid 2024-07-02: in the contract total,
        // out of the paid total when comparing against end of June
        let rows = vec![
            row("A", "佐藤", 1000.0, 1000.0, MilestoneKind::Contract, date(2024, 4, 10)),
            row("A", "佐藤", 1000.0, 1000.0, MilestoneKind::Payment, date(2024, 7, 2)),
        ];
        let comparison = YearMonth::new(2024, 6).unwrap();
        let totals = project_totals(&rows, &PipelineSettings::default(), Some(comparison));
        assert_eq!(totals.total_contract_value, 1000.0);
        assert_eq!(totals.total_paid_value, 0.0);

        let in_time = YearMonth::new(2024, 7).unwrap();
        let totals = project_totals(&rows, &PipelineSettings::default(), Some(in_time));
        assert_eq!(totals.total_paid_value, 1000.0);
    }

    #[test]
    fn assignee_filter_is_row_wise() {
        let rows = vec![
            row("A", "佐藤", 1000.0, 0.0, MilestoneKind::Contract, date(2024, 4, 1)),
            row("B", "鈴木", 500.0, 0.0, MilestoneKind::Contract, date(2024, 4, 2)),
        ];
        let filters = FilterParams {
            assignee: Some("佐藤".to_string()),
            ..FilterParams::default()
        };
        let kept = apply_filters(&rows, &filters);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].project_name, "A");
    }

    #[test]
    fn contract_month_filter_selects_whole_projects() {
        let rows = vec![
            row("A", "佐藤", 1000.0, 0.0, MilestoneKind::Contract, date(2024, 4, 10)),
            row("A", "佐藤", 1000.0, 0.0, MilestoneKind::Payment, date(2024, 7, 2)),
            row("B", "佐藤", 500.0, 0.0, MilestoneKind::Contract, date(2024, 5, 1)),
        ];
        let filters = FilterParams {
            contract_month: Some(YearMonth::new(2024, 4).unwrap()),
            ..FilterParams::default()
        };
        let kept = apply_filters(&rows, &filters);
        // Both of A's rows survive; B disappears entirely
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|row| row.project_name == "A"));
    }

    #[test]
    fn date_range_filter_excludes_projects_without_contract_date() {
        let rows = vec![
            row("A", "佐藤", 1000.0, 0.0, MilestoneKind::Contract, date(2024, 4, 10)),
            row("B", "佐藤", 500.0, 0.0, MilestoneKind::Construction, date(2024, 4, 20)),
        ];
        let filters = FilterParams {
            contract_from: Some(date(2024, 4, 1)),
            contract_to: Some(date(2024, 4, 30)),
            ..FilterParams::default()
        };
        let kept = apply_filters(&rows, &filters);
        assert!(kept.iter().all(|row| row.project_name == "A"));
    }

    #[test]
    fn empty_filter_result_is_empty_not_an_error() {
        let rows = vec![row(
            "A", "佐藤", 1000.0, 0.0, MilestoneKind::Contract, date(2024, 4, 1),
        )];
        let filters = FilterParams {
            assignee: Some("存在しない".to_string()),
            ..FilterParams::default()
        };
        let kept = apply_filters(&rows, &filters);
        assert!(kept.is_empty());
        let totals = project_totals(&kept, &PipelineSettings::default(), None);
        assert_eq!(totals.project_count, 0);
        assert_eq!(totals.total_contract_value, 0.0);
    }

    #[test]
    fn monthly_breakdown_buckets_by_contract_month() {
        let rows = vec![
            row("A", "佐藤", 1000.0, 1000.0, MilestoneKind::Contract, date(2024, 4, 10)),
            row("A", "佐藤", 1000.0, 1000.0, MilestoneKind::Payment, date(2024, 5, 1)),
            row("B", "鈴木", 500.0, 0.0, MilestoneKind::Contract, date(2024, 4, 20)),
            row("C", "佐藤", 300.0, 0.0, MilestoneKind::Contract, date(2024, 6, 1)),
        ];
        let monthly = monthly_breakdown(&rows, &PipelineSettings::default(), None);
        assert_eq!(monthly.len(), 2);

        assert_eq!(monthly[0].month, YearMonth::new(2024, 4).unwrap());
        assert_eq!(monthly[0].total_contract_value, 1500.0);
        assert_eq!(monthly[0].total_paid_value, 1000.0);
        assert_eq!(monthly[0].total_unpaid_value, 500.0);

        assert_eq!(monthly[1].month, YearMonth::new(2024, 6).unwrap());
        assert_eq!(monthly[1].total_contract_value, 300.0);
    }

    #[test]
    fn monthly_breakdown_applies_comparison_gate() {
        let rows = vec![
            row("A", "佐藤", 1000.0, 1000.0, MilestoneKind::Contract, date(2024, 4, 10)),
            row("A", "佐藤", 1000.0, 1000.0, MilestoneKind::Payment, date(2024, 7, 2)),
        ];
        let comparison = YearMonth::new(2024, 6).unwrap();
        let monthly =
            monthly_breakdown(&rows, &PipelineSettings::default(), Some(comparison));
        assert_eq!(monthly[0].total_contract_value, 1000.0);
        assert_eq!(monthly[0].total_paid_value, 0.0);
        assert_eq!(monthly[0].total_unpaid_value, 1000.0);
    }
}
