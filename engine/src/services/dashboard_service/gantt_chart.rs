// Handler for the gantt chart data: filtered tidy rows in, interval
// chains out.
use tracing::debug;

use crate::config::PipelineSettings;
use crate::pipeline::intervals;
use shared::models::{DisplayMode, GanttInterval, TidyRow};

pub fn handle_gantt_chart(
    rows: &[TidyRow],
    display_mode: DisplayMode,
    settings: &PipelineSettings,
) -> Vec<GanttInterval> {
    debug!(rows = rows.len(), ?display_mode, "building gantt intervals");
    intervals::synthesize_intervals(rows, display_mode, settings)
}
