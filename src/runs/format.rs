use async_graphql::ID;

use super::decode::DecodedBlob;
use super::domain::{Run, RunDetails, RunMetadata};
use super::error::RunError;

const GIT_SHA: (&str, &[&str]) = ("git.commit_sha", &["git", "commit_sha"]);
const RUN_COMMAND: (&str, &[&str]) = ("cli.command_path", &["cli", "command_path"]);
const TIMESTAMP: (&str, &[&str]) = ("session_id", &["session_id"]);

/// Build the [`Run`] served for `run_id` from its decoded blob.
///
/// `git.commit_sha`, `cli.command_path` and `session_id` must be present as
/// strings; the remaining fields are not recorded by run writers and are
/// returned empty.
pub fn format_run(run_id: &str, blob: &DecodedBlob) -> Result<Run, RunError> {
    let required = |(field, path): (&'static str, &[&str])| {
        blob.str_at(path)
            .map(str::to_string)
            .ok_or_else(|| RunError::MissingField {
                run_id: run_id.to_string(),
                field,
            })
    };

    let metadata = RunMetadata {
        id: ID::from(run_id),
        author: String::new(),
        git_branch: String::new(),
        git_sha: required(GIT_SHA)?,
        bookmark: false,
        title: String::new(),
        notes: String::new(),
        timestamp: required(TIMESTAMP)?,
        run_command: required(RUN_COMMAND)?,
    };
    let details = RunDetails {
        id: ID::from(run_id),
        details: String::new(),
    };

    Ok(Run {
        id: ID::from(run_id),
        metadata,
        details,
    })
}
