//! Read API composing storage, blob decoding and formatting.

use std::sync::Arc;

use tracing::{debug, warn};

use super::decode::decode_blob;
use super::domain::{Run, RunMetadata, RunRecord};
use super::error::RunError;
use super::format::format_run;
use crate::persistence::RunStore;

/// Serves runs from an injected [`RunStore`].
#[derive(Debug, Clone)]
pub struct RunQueryService {
    store: Arc<dyn RunStore>,
}

impl RunQueryService {
    pub fn new(store: Arc<dyn RunStore>) -> Self {
        Self { store }
    }

    /// Fetch one run by identifier.
    pub async fn get_run(&self, run_id: &str) -> Result<Run, RunError> {
        debug!(run_id = %run_id, "Fetching run");
        let record = self
            .store
            .find_by_id(run_id)
            .await?
            .ok_or_else(|| RunError::NotFound(run_id.to_string()))?;
        build_run(&record)
    }

    /// Fetch every stored run.
    ///
    /// The first record that fails to decode or format aborts the whole batch.
    pub async fn get_runs(&self) -> Result<Vec<Run>, RunError> {
        let records = self.store.find_all().await?;
        debug!(count = records.len(), "Fetching all runs");
        records.iter().map(build_run).collect()
    }

    /// Fetch the metadata of the given runs, in request order.
    pub async fn get_runs_metadata(&self, run_ids: &[String]) -> Result<Vec<RunMetadata>, RunError> {
        let mut metadata = Vec::with_capacity(run_ids.len());
        for run_id in run_ids {
            metadata.push(self.get_run(run_id).await?.metadata);
        }
        Ok(metadata)
    }
}

fn build_run(record: &RunRecord) -> Result<Run, RunError> {
    let result = decode_blob(&record.blob)
        .map_err(|source| RunError::Decode {
            run_id: record.id.clone(),
            source,
        })
        .and_then(|blob| format_run(&record.id, &blob));

    if let Err(e) = &result {
        warn!(run_id = %record.id, code = e.code(), error = %e, "Failed to build run");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::providers::memory::InMemoryRunStore;
    use async_graphql::ID;

    const EXAMPLE_BLOB: &str = r#"{"git":{"commit_sha":"deadbeef"},"cli":{"command_path":"kedro run"},"session_id":"2021-01-01T00:00:00"}"#;

    fn service(store: InMemoryRunStore) -> RunQueryService {
        RunQueryService::new(Arc::new(store))
    }

    fn blob(sha: &str, command: &str, session: &str) -> String {
        format!(
            "{{'git': {{'commit_sha': '{sha}'}}, 'cli': {{'command_path': '{command}'}}, 'session_id': '{session}'}}"
        )
    }

    #[tokio::test]
    async fn test_get_run_example() {
        let svc = service(InMemoryRunStore::default().with_record("abc", EXAMPLE_BLOB));

        let run = svc.get_run("abc").await.unwrap();

        assert_eq!(run.id, ID::from("abc"));
        assert_eq!(run.metadata.id, ID::from("abc"));
        assert_eq!(run.metadata.git_sha, "deadbeef");
        assert_eq!(run.metadata.run_command, "kedro run");
        assert_eq!(run.metadata.timestamp, "2021-01-01T00:00:00");
        assert_eq!(run.metadata.author, "");
        assert_eq!(run.metadata.git_branch, "");
        assert_eq!(run.metadata.title, "");
        assert_eq!(run.metadata.notes, "");
        assert!(!run.metadata.bookmark);
        assert_eq!(run.details.id, ID::from("abc"));
        assert_eq!(run.details.details, "");
    }

    #[tokio::test]
    async fn test_get_run_is_idempotent() {
        let svc = service(InMemoryRunStore::default().with_record("abc", EXAMPLE_BLOB));

        let first = svc.get_run("abc").await.unwrap();
        let second = svc.get_run("abc").await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_get_run_unknown_id_is_not_found() {
        let svc = service(InMemoryRunStore::default().with_record("abc", EXAMPLE_BLOB));

        let err = svc.get_run("missing").await.unwrap_err();

        assert!(matches!(err, RunError::NotFound(ref id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_get_run_missing_command_path() {
        let svc = service(InMemoryRunStore::default().with_record(
            "abc",
            r#"{"git":{"commit_sha":"deadbeef"},"cli":{},"session_id":"2021-01-01T00:00:00"}"#,
        ));

        let err = svc.get_run("abc").await.unwrap_err();

        assert!(matches!(
            err,
            RunError::MissingField {
                field: "cli.command_path",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_get_run_rejects_executable_blob() {
        let svc = service(
            InMemoryRunStore::default()
                .with_record("evil", "__import__('os').system('touch /tmp/run-tracking-pwned')"),
        );

        let err = svc.get_run("evil").await.unwrap_err();

        assert!(matches!(err, RunError::Decode { ref run_id, .. } if run_id == "evil"));
        assert!(!std::path::Path::new("/tmp/run-tracking-pwned").exists());
    }

    #[tokio::test]
    async fn test_get_runs_empty_store() {
        let svc = service(InMemoryRunStore::default());

        assert!(svc.get_runs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_runs_preserves_store_order() {
        let svc = service(
            InMemoryRunStore::default()
                .with_record("b", &blob("222", "kedro run", "2021-02-02T00.00.00.000Z"))
                .with_record("a", &blob("111", "kedro run --env=prod", "2021-01-01T00.00.00.000Z")),
        );

        let runs = svc.get_runs().await.unwrap();

        let ids: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(runs[1].metadata.run_command, "kedro run --env=prod");
    }

    #[tokio::test]
    async fn test_get_runs_fails_fast() {
        let svc = service(
            InMemoryRunStore::default()
                .with_record("good", EXAMPLE_BLOB)
                .with_record("broken", "not a blob")
                .with_record("incomplete", "{'git': {}}"),
        );

        let err = svc.get_runs().await.unwrap_err();

        assert!(matches!(err, RunError::Decode { ref run_id, .. } if run_id == "broken"));
    }

    #[tokio::test]
    async fn test_get_runs_metadata_in_request_order() {
        let svc = service(
            InMemoryRunStore::default()
                .with_record("a", &blob("111", "kedro run", "t1"))
                .with_record("b", &blob("222", "kedro run", "t2")),
        );

        let ids = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        let metadata = svc.get_runs_metadata(&ids).await.unwrap();

        let shas: Vec<&str> = metadata.iter().map(|m| m.git_sha.as_str()).collect();
        assert_eq!(shas, vec!["222", "111", "222"]);
    }

    #[tokio::test]
    async fn test_get_runs_metadata_unknown_id() {
        let svc = service(InMemoryRunStore::default().with_record("a", EXAMPLE_BLOB));

        let ids = vec!["a".to_string(), "zzz".to_string()];
        let err = svc.get_runs_metadata(&ids).await.unwrap_err();

        assert!(matches!(err, RunError::NotFound(ref id) if id == "zzz"));
    }
}
