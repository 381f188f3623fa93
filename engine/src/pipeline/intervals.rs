// Interval Synthesizer: reduces the tidy rows of each project+assignee
// pair to one date per milestone kind and chains them into sequential,
// non-overlapping chart bars. Every bar starts the day after the
// previous bar ends, so a clamped or padded bar can never run into its
// successor.
use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::PipelineSettings;
use shared::models::{DisplayMode, GanttInterval, MilestoneKind, TidyRow};

type MilestoneDates = HashMap<MilestoneKind, NaiveDate>;

pub fn synthesize_intervals(
    rows: &[TidyRow],
    mode: DisplayMode,
    settings: &PipelineSettings,
) -> Vec<GanttInterval> {
    // Group by (project, assignee) preserving first-appearance order;
    // on duplicate milestone kinds the first date in input order wins.
    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: HashMap<(String, String), MilestoneDates> = HashMap::new();
    for row in rows {
        let key = (row.project_name.clone(), row.assignee_name.clone());
        let dates = match groups.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                order.push(entry.key().clone());
                entry.insert(MilestoneDates::new())
            }
        };
        dates.entry(row.milestone_kind).or_insert(row.milestone_date);
    }

    let mut intervals = Vec::new();
    for key in &order {
        let dates = &groups[key];
        intervals.extend(actual_chain(&key.0, dates, settings));
        if mode == DisplayMode::PlannedAndActual {
            intervals.extend(projected_chain(&key.0, dates, settings));
        }
    }
    info!(
        groups = order.len(),
        intervals = intervals.len(),
        "synthesized gantt intervals"
    );
    intervals
}

fn day_start(date: NaiveDate) -> NaiveDateTime {
    // midnight always exists
    date.and_hms_opt(0, 0, 0).unwrap()
}

/// A bar from `start` to `nominal_end`, widened to the minimum visual
/// width when the milestone collapses to an instant or runs backwards.
fn make_interval(
    task_label: &str,
    kind: MilestoneKind,
    start: NaiveDateTime,
    nominal_end: NaiveDateTime,
    min_width: Duration,
    is_projected: bool,
) -> GanttInterval {
    let end = if nominal_end <= start {
        start + min_width
    } else {
        nominal_end
    };
    GanttInterval {
        task_label: task_label.to_string(),
        milestone_kind: kind,
        start,
        end,
        is_projected,
    }
}

/// The next bar in a chain: starts the day after the day the previous
/// bar ended, ends at the milestone date. Advances the cursor.
fn chained_bar(
    task_label: &str,
    kind: MilestoneKind,
    cursor: &mut NaiveDateTime,
    end_date: NaiveDate,
    min_width: Duration,
    is_projected: bool,
) -> GanttInterval {
    let start = day_start(cursor.date() + Duration::days(1));
    let bar = make_interval(task_label, kind, start, day_start(end_date), min_width, is_projected);
    *cursor = bar.end;
    bar
}

fn actual_chain(
    task_label: &str,
    dates: &MilestoneDates,
    settings: &PipelineSettings,
) -> Vec<GanttInterval> {
    let mut chain = Vec::new();
    let Some(&contract_date) = dates.get(&MilestoneKind::Contract) else {
        debug!(task = task_label, "no contract date; no chain");
        return chain;
    };
    let min_width = Duration::hours(settings.min_bar_width_hours);
    let construction_date = dates.get(&MilestoneKind::Construction).copied();
    let payment_date = dates.get(&MilestoneKind::Payment).copied();

    // Contract bar: nominal span, cut short when the construction date
    // falls inside it.
    let nominal_end = contract_date + Duration::days(settings.contract_span_days);
    let contract_end_date = match construction_date {
        Some(date) if date < nominal_end => date.max(contract_date),
        _ => nominal_end,
    };
    let contract_bar = make_interval(
        task_label,
        MilestoneKind::Contract,
        day_start(contract_date),
        day_start(contract_end_date),
        min_width,
        false,
    );
    let mut cursor = contract_bar.end;
    chain.push(contract_bar);

    if let Some(date) = construction_date {
        chain.push(chained_bar(
            task_label,
            MilestoneKind::Construction,
            &mut cursor,
            date,
            min_width,
            false,
        ));
        if let Some(date) = payment_date {
            chain.push(chained_bar(
                task_label,
                MilestoneKind::Payment,
                &mut cursor,
                date,
                min_width,
                false,
            ));
        }
    } else if let Some(date) = payment_date {
        if settings.payment_requires_construction {
            debug!(
                task = task_label,
                "payment date present without construction date; payment bar suppressed"
            );
        } else {
            chain.push(chained_bar(
                task_label,
                MilestoneKind::Payment,
                &mut cursor,
                date,
                min_width,
                false,
            ));
        }
    }
    chain
}

/// Illustrative schedule derived from the contract date alone: the
/// month offsets accumulate contract -> construction -> invoice ->
/// payment. Not sourced from any stored plan data.
fn projected_chain(
    task_label: &str,
    dates: &MilestoneDates,
    settings: &PipelineSettings,
) -> Vec<GanttInterval> {
    let Some(&contract_date) = dates.get(&MilestoneKind::Contract) else {
        return Vec::new();
    };
    let offsets = [
        (MilestoneKind::Construction, settings.projected_construction_months),
        (MilestoneKind::Invoice, settings.projected_invoice_months),
        (MilestoneKind::Payment, settings.projected_payment_months),
    ];

    let min_width = Duration::hours(settings.min_bar_width_hours);
    let mut cursor = day_start(contract_date + Duration::days(settings.contract_span_days));
    let mut milestone = contract_date;
    let mut chain = Vec::new();
    for (kind, months) in offsets {
        let Some(next) = milestone.checked_add_months(Months::new(months)) else {
            warn!(task = task_label, "projected schedule out of calendar range");
            return chain;
        };
        milestone = next;
        chain.push(chained_bar(
            task_label,
            kind,
            &mut cursor,
            milestone,
            min_width,
            true,
        ));
    }
    chain
}
