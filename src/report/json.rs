//! JSON report export

use crate::error::Result;
use crate::models::AuditReport;
use std::path::Path;
use tracing::info;

/// Exports audit reports as a pretty-printed JSON array
pub fn export(reports: &[AuditReport], output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(reports)?;
    std::fs::write(output_path, json)?;
    info!("JSON report saved to {}", output_path.display());
    Ok(())
}

/// Loads audit reports from a JSON file written by [`export`]
pub fn load(input_path: &Path) -> Result<Vec<AuditReport>> {
    let content = std::fs::read_to_string(input_path)?;
    let reports: Vec<AuditReport> = serde_json::from_str(&content)?;
    Ok(reports)
}
