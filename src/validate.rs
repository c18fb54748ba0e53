use crate::error::{AnalysisError, Result};
use crate::models::RepositoryRef;

/// Parse a user-supplied repository URL into an owner/name pair.
///
/// Accepts absolute http(s) URLs on github.com with at least two
/// non-empty path segments. Extra segments, trailing slashes, query
/// strings, and fragments are ignored for extraction.
pub fn parse_repo_url(input: &str) -> Result<RepositoryRef> {
    let trimmed = input.trim();

    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| {
            AnalysisError::Validation(format!("\"{trimmed}\" is not an absolute http(s) URL"))
        })?;

    let (host, path) = match rest.split_once('/') {
        Some((host, path)) => (host, path),
        None => (rest, ""),
    };

    if host != "github.com" && host != "www.github.com" {
        return Err(AnalysisError::Validation(format!(
            "expected a github.com URL, got host \"{host}\""
        )));
    }

    // Owner/name live in the path; query string and fragment do not count.
    let path = match path.find(|c| c == '?' || c == '#') {
        Some(cut) => &path[..cut],
        None => path,
    };

    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let owner = segments.next();
    let name = segments.next();

    match (owner, name) {
        (Some(owner), Some(name)) => Ok(RepositoryRef {
            owner: owner.to_string(),
            name: name.to_string(),
        }),
        _ => Err(AnalysisError::Validation(format!(
            "expected https://github.com/<owner>/<repository>, got \"{trimmed}\""
        ))),
    }
}
