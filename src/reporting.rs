//! Report generation
//!
//! Writes the aggregate snapshot to disk. The snapshot is plain data, so a
//! report can be produced at any point of a run without blocking writers.

use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

use crate::{config::AppConfig, error::Result, store::FleetSnapshot};

#[async_trait]
pub trait ReportWriter: Send + Sync {
    async fn write_report(&self, snapshot: &FleetSnapshot, output_path: &Path) -> Result<()>;
}

pub struct JsonReportWriter {
    pretty: bool,
}

impl JsonReportWriter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

#[async_trait]
impl ReportWriter for JsonReportWriter {
    async fn write_report(&self, snapshot: &FleetSnapshot, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = if self.pretty {
            serde_json::to_string_pretty(snapshot)?
        } else {
            serde_json::to_string(snapshot)?
        };
        fs::write(output_path, content).await?;

        tracing::info!(
            path = %output_path.display(),
            instances = snapshot.instances.len(),
            "Report written"
        );
        Ok(())
    }
}

/// Factory function for creating the report writer
pub async fn create_report_writer(config: &AppConfig) -> Result<Box<dyn ReportWriter + Send + Sync>> {
    Ok(Box::new(JsonReportWriter::new(config.output.pretty)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FleetStore;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_report_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("reports").join("fleet.json");

        let mut store = FleetStore::new(false);
        store.create_instance("https://u1.example.org/", Default::default());
        store.forks.push("https://github.com/searx/searx".to_string());

        let writer = JsonReportWriter::new(true);
        writer.write_report(&store.snapshot(), &output_path).await.unwrap();

        let raw = tokio::fs::read_to_string(&output_path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(parsed["instances"]["https://u1.example.org/"].is_object());
        assert_eq!(parsed["forks"], json!(["https://github.com/searx/searx"]));
        assert!(parsed.get("private").is_none());
    }
}
