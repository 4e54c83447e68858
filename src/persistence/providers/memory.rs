use crate::persistence::RunStore;
use crate::runs::domain::RunRecord;
use anyhow::Result;
use async_trait::async_trait;

/// A fixed, insertion-ordered set of run records held in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRunStore {
    records: Vec<RunRecord>,
}

impl InMemoryRunStore {
    #[must_use]
    pub fn with_record(mut self, id: &str, blob: &str) -> Self {
        self.records.push(RunRecord::new(id, blob));
        self
    }
}

#[async_trait]
impl RunStore for InMemoryRunStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<RunRecord>> {
        Ok(self.records.iter().find(|r| r.id == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<RunRecord>> {
        Ok(self.records.clone())
    }
}
