//! Data source that serves a JSON fixture instead of live data.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::error::StageError;
use crate::models::{DataPackage, ExecutionPlan};
use crate::stage::DataSource;

/// Sample campaign embedded in the binary, used when no file is configured.
static SAMPLE_CAMPAIGN: &str = include_str!("sample_campaign.json");

/// Source label reported for the embedded sample.
pub const EMBEDDED_SOURCE: &str = "embedded_sample";

/// Loads a data package payload from a JSON file, or from the embedded
/// sample when no path is set.
#[derive(Debug, Clone, Default)]
pub struct FixtureDataSource {
    path: Option<PathBuf>,
}

impl FixtureDataSource {
    /// Serve the embedded sample campaign.
    pub fn embedded() -> Self {
        Self { path: None }
    }

    /// Serve the JSON file at `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    async fn read_payload(&self) -> Result<(String, String), StageError> {
        match &self.path {
            None => Ok((EMBEDDED_SOURCE.to_owned(), SAMPLE_CAMPAIGN.to_owned())),
            Some(path) => {
                let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
                    StageError::collection(format!("failed to read {}: {e}", path.display()))
                })?;
                Ok((path.display().to_string(), raw))
            }
        }
    }
}

#[async_trait]
impl DataSource for FixtureDataSource {
    async fn collect(&self, plan: &ExecutionPlan, task: &str) -> Result<DataPackage, StageError> {
        let (source, raw) = self.read_payload().await?;
        let data: Value = serde_json::from_str(&raw)
            .map_err(|e| StageError::collection(format!("invalid JSON in {source}: {e}")))?;

        let mut meta = Map::new();
        meta.insert("bytes".to_owned(), json!(raw.len()));
        meta.insert("plan_steps".to_owned(), json!(plan.steps().len()));
        meta.insert("task".to_owned(), json!(task));
        if let Some(rows) = data.get("segments").and_then(Value::as_array) {
            meta.insert("rows".to_owned(), json!(rows.len()));
        }

        tracing::info!(source = %source, bytes = raw.len(), "loaded data fixture");
        Ok(DataPackage::ok(source, data, meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataStatus;

    fn plan() -> ExecutionPlan {
        ExecutionPlan::Steps(vec!["a".into(), "b".into()])
    }

    #[tokio::test]
    async fn embedded_sample_is_valid() {
        let pkg = FixtureDataSource::embedded()
            .collect(&plan(), "Generate a summary")
            .await
            .unwrap();
        assert_eq!(pkg.status, DataStatus::Ok);
        assert_eq!(pkg.source.as_deref(), Some(EMBEDDED_SOURCE));
        assert_eq!(pkg.meta["rows"], json!(4));
        assert_eq!(pkg.meta["plan_steps"], json!(2));
        assert!(pkg.data.unwrap().get("insights").is_some());
    }

    #[test]
    fn path_reports_configured_file() {
        assert!(FixtureDataSource::embedded().path().is_none());
        let source = FixtureDataSource::from_path("/data/campaign.json");
        assert_eq!(source.path(), Some(&PathBuf::from("/data/campaign.json")));
    }

    #[tokio::test]
    async fn reads_fixture_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("campaign.json");
        std::fs::write(&path, r#"{"segments": [], "insights": {}}"#).unwrap();

        let pkg = FixtureDataSource::from_path(&path)
            .collect(&plan(), "t")
            .await
            .unwrap();
        assert_eq!(pkg.source.as_deref(), Some(path.display().to_string().as_str()));
        assert_eq!(pkg.meta["rows"], json!(0));
    }

    #[tokio::test]
    async fn missing_file_is_a_collection_error() {
        let err = FixtureDataSource::from_path("/definitely/not/here.json")
            .collect(&plan(), "t")
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Collection { .. }));
        assert!(err.message().contains("failed to read"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_collection_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = FixtureDataSource::from_path(&path)
            .collect(&plan(), "t")
            .await
            .unwrap_err();
        assert!(err.message().contains("invalid JSON"));
    }
}
