use chrono::{DateTime, Utc};
use serde::Serialize;

/// Owner/name pair extracted from a repository URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

/// One commit as reported by the upstream API. Everything except the sha
/// and message may be missing when upstream data is incomplete.
#[derive(Debug, Clone)]
pub struct CommitDetail {
    pub sha: String,
    pub author_name: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub message: String,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
}

impl CommitDetail {
    /// Refine into a `ValidCommit` if author, timestamp, and both change
    /// counts are present.
    pub fn into_valid(self) -> Option<ValidCommit> {
        match self {
            CommitDetail {
                sha,
                author_name: Some(author_name),
                timestamp: Some(timestamp),
                message,
                additions: Some(additions),
                deletions: Some(deletions),
            } => Some(ValidCommit {
                sha,
                author_name,
                timestamp,
                message,
                additions,
                deletions,
            }),
            _ => None,
        }
    }
}

/// A commit with every field the velocity computation needs.
#[derive(Debug, Clone)]
pub struct ValidCommit {
    pub sha: String,
    pub author_name: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub additions: u64,
    pub deletions: u64,
}

/// One point of the velocity series: the change volume of the newer
/// commit in a pair over the whole minutes elapsed since the older one.
#[derive(Debug, Clone, Serialize)]
pub struct VelocityPoint {
    pub sha: String,
    pub date: DateTime<Utc>,
    pub velocity: f64,
    pub author: String,
    pub message: String,
    pub additions: u64,
    pub deletions: u64,
}
