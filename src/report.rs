//! Per-message outcome report of a labeling run

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::error::{LabelerError, Result};
use crate::models::Category;

/// What happened to one listed message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The category label was added
    Applied,
    /// A category was found but the label could not be added
    Failed,
    /// No rule matched, or the message could not be read
    Unclassified,
}

/// One CSV row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageOutcome {
    pub message_id: String,
    pub category: Option<Category>,
    pub outcome: Outcome,
}

const HEADER: [&str; 3] = ["message_id", "category", "outcome"];

/// Outcomes in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    rows: Vec<MessageOutcome>,
}

impl RunReport {
    pub(crate) fn record(&mut self, message_id: &str, category: Option<Category>, outcome: Outcome) {
        self.rows.push(MessageOutcome {
            message_id: message_id.to_string(),
            category,
            outcome,
        });
    }

    pub fn rows(&self) -> &[MessageOutcome] {
        &self.rows
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.rows.iter().filter(|row| row.outcome == outcome).count()
    }

    /// Messages labeled per category
    pub fn applied_by_category(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            if let (Outcome::Applied, Some(category)) = (row.outcome, row.category) {
                *counts.entry(category).or_default() += 1;
            }
        }
        counts
    }

    /// Write one row per message, header first, even when there are no rows
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(report_error)?;
        writer.write_record(HEADER).map_err(report_error)?;
        for row in &self.rows {
            writer.serialize(row).map_err(report_error)?;
        }
        writer.flush()?;

        info!("Wrote {} report rows to {:?}", self.rows.len(), path);
        Ok(())
    }
}

fn report_error(e: csv::Error) -> LabelerError {
    LabelerError::ReportError(e.to_string())
}
