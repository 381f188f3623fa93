// Handler for turning raw upload bytes into the cleaned table, with the
// session store as memoization keyed by content hash.
use tracing::{debug, info};

use crate::config::PipelineSettings;
use crate::data::csv_parser::TableReader;
use crate::data::session_store::{CleanTable, SessionStore};
use crate::error::EngineError;
use crate::pipeline::{normalize, reshape};

pub fn handle_load_table(
    bytes: &[u8],
    settings: &PipelineSettings,
    store: &mut SessionStore,
) -> Result<CleanTable, EngineError> {
    let key = SessionStore::content_key(bytes);
    if let Some(table) = store.get(&key) {
        debug!(key = %key, "session store hit; reusing cleaned table");
        return Ok(table.clone());
    }

    let raw = TableReader::read_bytes(bytes)?;
    let records = normalize::normalize_table(&raw, settings)?;
    let rows = reshape::reshape_records(&records, settings);
    let table = CleanTable { records, rows };

    info!(
        key = %key,
        records = table.records.len(),
        tidy_rows = table.rows.len(),
        "cleaned and cached uploaded table"
    );
    store.insert(key, table.clone());
    Ok(table)
}
