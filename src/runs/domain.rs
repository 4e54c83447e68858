//! Output shapes served to the front-end.
//!
//! Field names are camel-cased by async-graphql (`git_sha` becomes `gitSha`),
//! which keeps them identical to what existing consumers query.

use async_graphql::{ID, SimpleObject};

/// A run row as persisted by the pipeline that wrote it.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RunRecord {
    pub id: String,
    pub blob: String,
}

impl RunRecord {
    pub fn new(id: impl Into<String>, blob: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            blob: blob.into(),
        }
    }
}

/// One recorded pipeline execution.
#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct Run {
    pub id: ID,
    pub metadata: RunMetadata,
    pub details: RunDetails,
}

/// Summary shown in the runs list and the metadata panel.
///
/// `author`, `git_branch`, `title` and `notes` are part of the contract but
/// nothing populates them yet, so they are always empty.
#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct RunMetadata {
    pub id: ID,
    pub author: String,
    pub git_branch: String,
    pub git_sha: String,
    pub bookmark: bool,
    pub title: String,
    pub notes: String,
    pub timestamp: String,
    pub run_command: String,
}

#[derive(SimpleObject, Debug, Clone, PartialEq)]
pub struct RunDetails {
    pub id: ID,
    pub details: String,
}
