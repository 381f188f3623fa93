// Engine main entry point: a stand-in for the dashboard host. Reads an
// uploaded CSV from argv, runs one render cycle, and prints the
// structured response as JSON.
use std::path::Path;
use std::process::ExitCode;

use engine::config::PipelineSettings;
use engine::services::{DashboardService, RenderRequest};
use shared::models::DisplayMode;
use tracing::info;

fn usage() -> ExitCode {
    eprintln!("Usage: engine <data.csv> [--assignee NAME] [--planned]");
    ExitCode::from(2)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        return usage();
    };

    let mut request = RenderRequest::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--assignee" => {
                let Some(name) = args.next() else {
                    return usage();
                };
                request.filters.assignee = Some(name);
            }
            "--planned" => request.display_mode = DisplayMode::PlannedAndActual,
            _ => return usage(),
        }
    }

    info!(path = %path, "starting gantt line engine");

    let mut service = match DashboardService::new(PipelineSettings::default()) {
        Ok(service) => service,
        Err(error) => {
            eprintln!("{}", error.user_message());
            return ExitCode::FAILURE;
        }
    };

    match service.render_file(Path::new(&path), &request) {
        Ok(response) => {
            for warning in &response.warnings {
                eprintln!("note: {warning}");
            }
            match serde_json::to_string_pretty(&response) {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(error) => {
                    eprintln!("Failed to serialize response: {error}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(error) => {
            eprintln!("{}", error.user_message());
            ExitCode::FAILURE
        }
    }
}
