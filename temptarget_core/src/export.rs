//! CSV export of the activation ledger for audit.
//!
//! The export is a copy; the ledger journals are never truncated or archived.

use crate::{ActivationRecord, Result};
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    date: String,
    active: bool,
    start_date: Option<String>,
    duration: f64,
    hbt: Option<f64>,
    preset_id: Option<String>,
}

impl From<&ActivationRecord> for CsvRow {
    fn from(record: &ActivationRecord) -> Self {
        CsvRow {
            date: record.date.to_rfc3339(),
            active: record.active,
            start_date: record.start_date.map(|t| t.to_rfc3339()),
            duration: record.duration,
            hbt: record.hbt,
            preset_id: record.preset_id.clone(),
        }
    }
}

/// Write `records` to `csv_path` (replacing any previous export), oldest first.
///
/// Returns the number of rows written.
pub fn ledger_to_csv(records: &[ActivationRecord], csv_path: &Path) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut ordered: Vec<&ActivationRecord> = records.iter().collect();
    // Stable sort keeps append order for equal dates
    ordered.sort_by_key(|r| r.date);

    let mut writer = csv::Writer::from_path(csv_path)?;
    for record in &ordered {
        writer.serialize(CsvRow::from(*record))?;
    }
    writer.flush()?;

    tracing::info!("Exported {} ledger records to {:?}", ordered.len(), csv_path);
    Ok(ordered.len())
}
