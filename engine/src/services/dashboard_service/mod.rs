// Dashboard service: the explicit request/response cycle the hosting
// dashboard calls on every interaction. One handler file per operation;
// this hub owns the settings and the session store and wires the stages
// together.
use std::path::Path;
use tracing::info;

use crate::config::PipelineSettings;
use crate::data::session_store::SessionStore;
use crate::error::EngineError;
use crate::pipeline::aggregate;
use crate::services::{RenderRequest, RenderResponse};

pub mod gantt_chart;
pub mod load_table;
pub mod monthly_summary;

pub struct DashboardService {
    settings: PipelineSettings,
    store: SessionStore,
}

impl DashboardService {
    pub fn new(settings: PipelineSettings) -> Result<Self, EngineError> {
        settings.validate()?;
        Ok(DashboardService {
            settings,
            store: SessionStore::new(),
        })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// The whole pipeline as a pure function of (upload bytes, request):
    /// identical inputs produce identical responses; the session store
    /// only short-circuits the cleaning work for a repeated upload.
    pub fn render_bytes(
        &mut self,
        bytes: &[u8],
        request: &RenderRequest,
    ) -> Result<RenderResponse, EngineError> {
        let table = load_table::handle_load_table(bytes, &self.settings, &mut self.store)?;

        let mut warnings = Vec::new();
        if table.records.is_empty() {
            warnings.push("The uploaded table contains no usable project rows.".to_string());
        } else if table.rows.is_empty() {
            warnings.push(
                "No milestone dates could be read from the uploaded table; nothing to chart."
                    .to_string(),
            );
        }

        let rows = aggregate::apply_filters(&table.rows, &request.filters);
        if rows.is_empty() && !table.rows.is_empty() {
            warnings.push("The selected filters match no projects.".to_string());
        }

        let intervals =
            gantt_chart::handle_gantt_chart(&rows, request.display_mode, &self.settings);
        let (totals, monthly) = monthly_summary::handle_monthly_summary(
            &rows,
            &self.settings,
            request.filters.comparison_month,
        );

        info!(
            intervals = intervals.len(),
            projects = totals.project_count,
            warnings = warnings.len(),
            "render complete"
        );
        Ok(RenderResponse {
            intervals,
            totals,
            monthly,
            warnings,
        })
    }

    pub fn render_file(
        &mut self,
        path: &Path,
        request: &RenderRequest,
    ) -> Result<RenderResponse, EngineError> {
        info!(path = %path.display(), "rendering dashboard data from file");
        let bytes = std::fs::read(path)?;
        self.render_bytes(&bytes, request)
    }
}
