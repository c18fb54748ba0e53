use chrono::{DateTime, Utc};

use crate::models::{CommitDetail, ValidCommit, VelocityPoint};

/// Filter out commits missing author identity, timestamp, or change
/// statistics. The fetcher's newest-first order is preserved; dropped
/// records are not an error.
pub fn reconcile(details: Vec<CommitDetail>) -> Vec<ValidCommit> {
    let mut valid = Vec::with_capacity(details.len());
    for detail in details {
        let sha = detail.sha.clone();
        match detail.into_valid() {
            Some(commit) => valid.push(commit),
            None => tracing::debug!("Dropping incomplete commit {sha}"),
        }
    }
    valid
}

/// Build the velocity series from reconciled commits (newest first).
///
/// Each adjacent pair yields one point dated at the newer commit of the
/// two; fewer than two commits yield an empty series. The returned
/// series is chronologically ascending.
pub fn build_series(commits: &[ValidCommit]) -> Vec<VelocityPoint> {
    let mut points: Vec<VelocityPoint> = commits
        .windows(2)
        .map(|pair| velocity_point(&pair[0], &pair[1]))
        .collect();
    points.reverse();
    points
}

fn velocity_point(current: &ValidCommit, previous: &ValidCommit) -> VelocityPoint {
    let elapsed = elapsed_minutes(current.timestamp, previous.timestamp);
    let total_changes = current.additions + current.deletions;

    VelocityPoint {
        sha: current.sha.clone(),
        date: current.timestamp,
        velocity: round2(total_changes as f64 / elapsed as f64),
        author: current.author_name.clone(),
        message: first_line(&current.message),
        additions: current.additions,
        deletions: current.deletions,
    }
}

/// Whole minutes between two commits, clamped to at least one so
/// sub-minute commit bursts cannot divide by zero.
fn elapsed_minutes(current: DateTime<Utc>, previous: DateTime<Utc>) -> i64 {
    let seconds = (current - previous).num_seconds();
    ((seconds as f64 / 60.0).round() as i64).max(1)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or("").to_string()
}
