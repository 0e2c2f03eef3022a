use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::db::models::{ActivityRecord, Routine};
use crate::prediction::Prediction;

pub const EXPORT_VERSION: &str = "1.0";

/// Everything the user owns, as written by "export data".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub activities: Vec<ActivityRecord>,
    pub routines: Vec<Routine>,
    pub predictions: Vec<Prediction>,
}

impl ExportBundle {
    pub fn new(
        exported_at: DateTime<Utc>,
        activities: Vec<ActivityRecord>,
        routines: Vec<Routine>,
        predictions: Vec<Prediction>,
    ) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            exported_at,
            activities,
            routines,
            predictions,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize export bundle")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write export to {}", path.display()))?;
        log::info!(
            "Exported {} activities and {} routines to {}",
            self.activities.len(),
            self.routines.len(),
            path.display()
        );
        Ok(())
    }
}

/// `timewise_data_YYYY-MM-DD.json`
pub fn default_file_name(date: NaiveDate) -> String {
    format!("timewise_data_{}.json", date.format("%Y-%m-%d"))
}
