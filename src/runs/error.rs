use async_graphql::ErrorExtensions;

use super::decode::DecodeError;

/// Errors that can occur while serving run queries.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// No run is stored under the requested identifier.
    #[error("Run not found: {0}")]
    NotFound(String),

    /// The stored blob is not structured data this service understands.
    #[error("Failed to decode blob of run {run_id}: {source}")]
    Decode {
        run_id: String,
        #[source]
        source: DecodeError,
    },

    /// The blob decoded but a required field is absent or not a string.
    #[error("Run {run_id} is missing required field `{field}`")]
    MissingField { run_id: String, field: &'static str },

    /// The store could not be queried.
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl RunError {
    /// Machine-readable code exposed as `extensions.code`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Decode { .. } => "DECODE_ERROR",
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn run_id(&self) -> Option<&str> {
        match self {
            Self::NotFound(id) | Self::Decode { run_id: id, .. } => Some(id),
            Self::MissingField { run_id, .. } => Some(run_id),
            Self::Storage(_) => None,
        }
    }
}

impl ErrorExtensions for RunError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", self.code());
            if let Some(id) = self.run_id() {
                e.set("runId", id);
            }
        })
    }
}
