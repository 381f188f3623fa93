use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// A required logical column is still missing after header mapping.
    /// This is the only schema-level failure; it halts processing for the
    /// uploaded table.
    #[error("required column(s) missing after header mapping: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("CSV parsing system error: {source}")]
    CsvSystem {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal processing error: {0}")]
    Processing(String),

    // Catch-all for anyhow errors when direct conversion is suitable
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl EngineError {
    /// The string the hosting dashboard layer shows the user. Cell-level
    /// parse failures never reach this point; they are absorbed inside
    /// the pipeline stages.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Schema { missing } => format!(
                "The uploaded table is missing required column(s): {}. \
                 Check the column-mapping configuration against the file's header row.",
                missing.join(", ")
            ),
            EngineError::CsvSystem { source } => {
                format!("The uploaded file could not be read as a delimited table: {source}")
            }
            EngineError::Io { source } => format!("The file could not be opened: {source}"),
            EngineError::Config(msg) => format!("Invalid pipeline configuration: {msg}"),
            EngineError::Processing(msg) => format!("Processing failed: {msg}"),
            EngineError::Anyhow(source) => format!("Processing failed: {source}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_lists_every_missing_column() {
        let err = EngineError::Schema {
            missing: vec!["project_name".to_string(), "assignee_name".to_string()],
        };
        let msg = err.user_message();
        assert!(msg.contains("project_name"));
        assert!(msg.contains("assignee_name"));
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: EngineError = io.into();
        assert!(matches!(err, EngineError::Io { .. }));
        assert!(err.user_message().contains("no such file"));
    }
}
