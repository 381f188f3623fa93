// Service layer: request/response types consumed by the hosting
// dashboard, and the service that produces them.
pub mod dashboard_service;

use serde::{Deserialize, Serialize};
use shared::models::{DisplayMode, FilterParams, GanttInterval, MonthlySummary, ProjectTotals};

pub use dashboard_service::DashboardService;

/// Parameters of one render cycle: which slice of the table to show and
/// whether to overlay the projected schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderRequest {
    pub filters: FilterParams,
    pub display_mode: DisplayMode,
}

/// Everything the charting layer needs for one render, as plain data.
/// `warnings` carries informational messages (for example, an empty
/// filter result); it is never an error channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResponse {
    pub intervals: Vec<GanttInterval>,
    pub totals: ProjectTotals,
    pub monthly: Vec<MonthlySummary>,
    pub warnings: Vec<String>,
}
