//! JSONL (JSON Lines) report export, one finding per line

use crate::error::Result;
use crate::models::{AuditReport, Finding};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct Line<'a> {
    target: &'a str,
    audit_id: &'a str,
    #[serde(flatten)]
    finding: &'a Finding,
}

/// Exports every finding of every report, tagged with its target
pub fn export(reports: &[AuditReport], output_path: &Path) -> Result<()> {
    let file = std::fs::File::create(output_path)?;
    let mut writer = std::io::BufWriter::new(file);

    for report in reports {
        for finding in &report.findings {
            let line = serde_json::to_string(&Line {
                target: &report.target,
                audit_id: &report.audit_id,
                finding,
            })?;
            writeln!(writer, "{}", line)?;
        }
    }

    writer.flush()?;
    info!("JSONL report saved to {}", output_path.display());
    Ok(())
}
