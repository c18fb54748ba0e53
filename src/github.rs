use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{AnalysisError, Result};
use crate::models::{CommitDetail, RepositoryRef};

const USER_AGENT: &str = "git-velocity-service";
const COMMIT_PAGE_SIZE: u32 = 100;

/// Client for the GitHub REST API.
#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

/// Entry of the commit list response. Only the sha is needed to drive
/// the detail lookups.
#[derive(Debug, Deserialize)]
struct CommitSummary {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitBody,
    stats: Option<CommitStats>,
}

#[derive(Debug, Deserialize)]
struct CommitBody {
    author: Option<CommitSignature>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct CommitSignature {
    name: Option<String>,
    date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct CommitStats {
    additions: u64,
    deletions: u64,
}

impl From<CommitResponse> for CommitDetail {
    fn from(response: CommitResponse) -> Self {
        let (author_name, timestamp) = match response.commit.author {
            Some(author) => (author.name, author.date),
            None => (None, None),
        };

        CommitDetail {
            sha: response.sha,
            author_name,
            timestamp,
            message: response.commit.message,
            additions: response.stats.as_ref().map(|stats| stats.additions),
            deletions: response.stats.map(|stats| stats.deletions),
        }
    }
}

impl GithubClient {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            token,
        }
    }

    fn get(&self, url: &str, token: Option<&str>) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github.v3+json");

        // Request token wins over the configured one. Absence only
        // lowers the upstream rate ceiling.
        if let Some(token) = token.or(self.token.as_deref()) {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        request
    }

    /// Fetch the most recent commits (one page, newest first) and
    /// resolve each to its detail record concurrently.
    ///
    /// Detail lookups that fail or return an unexpected shape are
    /// skipped; the stage only aborts when none of them survive.
    pub async fn fetch_recent_commits(
        &self,
        repo: &RepositoryRef,
        token: Option<&str>,
    ) -> Result<Vec<CommitDetail>> {
        let url = format!(
            "{}/repos/{}/{}/commits",
            self.base_url, repo.owner, repo.name
        );
        let response = self
            .get(&url, token)
            .query(&[("per_page", COMMIT_PAGE_SIZE)])
            .send()
            .await?;
        check_status(response.status())?;

        let summaries: Vec<CommitSummary> = response.json().await.map_err(decode_error)?;
        if summaries.len() < 2 {
            return Err(AnalysisError::InsufficientHistory);
        }

        tracing::info!(
            "Fetched {} commit summaries for {}/{}",
            summaries.len(),
            repo.owner,
            repo.name
        );

        let lookups = summaries
            .iter()
            .map(|summary| self.fetch_commit(repo, &summary.sha, token));
        let results = join_all(lookups).await;

        let total = results.len();
        let mut details = Vec::with_capacity(total);
        let mut first_error = None;
        for (summary, result) in summaries.iter().zip(results) {
            match result {
                Ok(detail) => details.push(detail),
                Err(error) => {
                    tracing::warn!("Skipping commit {}: {}", summary.sha, error);
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }

        if details.is_empty() {
            return Err(match first_error {
                Some(error @ AnalysisError::RateLimited) => error,
                _ => AnalysisError::UpstreamData,
            });
        }

        let skipped = total - details.len();
        if skipped > 0 {
            tracing::warn!("Skipped {skipped} of {total} commit details");
        }

        Ok(details)
    }

    async fn fetch_commit(
        &self,
        repo: &RepositoryRef,
        sha: &str,
        token: Option<&str>,
    ) -> Result<CommitDetail> {
        let url = format!(
            "{}/repos/{}/{}/commits/{}",
            self.base_url, repo.owner, repo.name, sha
        );
        let response = self.get(&url, token).send().await?;
        check_status(response.status())?;

        let commit: CommitResponse = response.json().await.map_err(decode_error)?;
        Ok(commit.into())
    }
}

fn check_status(status: StatusCode) -> Result<()> {
    match status {
        StatusCode::NOT_FOUND => Err(AnalysisError::RepositoryNotFound),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => Err(AnalysisError::RateLimited),
        status if !status.is_success() => Err(AnalysisError::Upstream(status.to_string())),
        _ => Ok(()),
    }
}

fn decode_error(error: reqwest::Error) -> AnalysisError {
    if error.is_decode() {
        AnalysisError::UpstreamData
    } else {
        AnalysisError::Transport(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> StatusCode {
        StatusCode::from_u16(code).unwrap()
    }

    #[test]
    fn not_found_and_rate_limit_classified_first() {
        assert!(matches!(
            check_status(status(404)),
            Err(AnalysisError::RepositoryNotFound)
        ));
        assert!(matches!(
            check_status(status(403)),
            Err(AnalysisError::RateLimited)
        ));
        assert!(matches!(
            check_status(status(429)),
            Err(AnalysisError::RateLimited)
        ));
    }

    #[test]
    fn other_failures_carry_status_description() {
        match check_status(status(502)) {
            Err(AnalysisError::Upstream(description)) => {
                assert!(description.contains("502"));
            }
            other => panic!("expected Upstream error, got {other:?}"),
        }
    }

    #[test]
    fn success_statuses_pass() {
        assert!(check_status(status(200)).is_ok());
        assert!(check_status(status(201)).is_ok());
    }

    #[test]
    fn summary_list_parses() {
        let body = r#"[{"sha": "aaa111"}, {"sha": "bbb222"}]"#;
        let summaries: Vec<CommitSummary> = serde_json::from_str(body).unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].sha, "aaa111");
    }

    #[test]
    fn full_commit_response_parses() {
        let body = r#"{
            "sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e",
            "commit": {
                "author": {
                    "name": "Monalisa Octocat",
                    "email": "support@github.com",
                    "date": "2011-04-14T16:00:49Z"
                },
                "message": "Fix all the bugs\n\nCloses #42"
            },
            "stats": {"total": 108, "additions": 104, "deletions": 4}
        }"#;

        let detail: CommitDetail = serde_json::from_str::<CommitResponse>(body).unwrap().into();
        assert_eq!(detail.sha, "6dcb09b5b57875f334f61aebed695e2e4193db5e");
        assert_eq!(detail.author_name.as_deref(), Some("Monalisa Octocat"));
        assert_eq!(detail.message, "Fix all the bugs\n\nCloses #42");
        assert_eq!(detail.additions, Some(104));
        assert_eq!(detail.deletions, Some(4));
        assert!(detail.timestamp.is_some());
    }

    #[test]
    fn null_author_and_missing_stats_become_absent_fields() {
        let body = r#"{
            "sha": "abc123",
            "commit": {"author": null, "message": "import"}
        }"#;

        let detail: CommitDetail = serde_json::from_str::<CommitResponse>(body).unwrap().into();
        assert!(detail.author_name.is_none());
        assert!(detail.timestamp.is_none());
        assert!(detail.additions.is_none());
        assert!(detail.deletions.is_none());
    }

    #[test]
    fn unexpected_shape_fails_validation() {
        let body = r#"{"sha": "abc123", "commit": "not-an-object"}"#;
        assert!(serde_json::from_str::<CommitResponse>(body).is_err());

        let body = r#"{"commit": {"author": null, "message": "no sha"}}"#;
        assert!(serde_json::from_str::<CommitResponse>(body).is_err());
    }
}
