//! GitHub Releases API source

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use tracing::debug;

use crate::version::error::{CheckError, ExtractError};
use crate::version::fetcher::Fetcher;

/// Prefix stripped from repository values given as web URLs
const GITHUB_WEB_PREFIX: &str = "https://github.com/";

/// Prefix marking a value that already is an API URL
const API_HOST_PREFIX: &str = "https://api.";

/// One entry of the releases list, reduced to what selection needs
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub tag_name: Option<String>,
    pub prerelease: bool,
    /// `None` when absent or not an RFC 3339 timestamp
    pub published_at: Option<DateTime<FixedOffset>>,
}

impl Release {
    fn from_value(value: &Value) -> Self {
        Self {
            tag_name: value
                .get("tag_name")
                .and_then(Value::as_str)
                .map(String::from),
            prerelease: value
                .get("prerelease")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            published_at: value
                .get("published_at")
                .and_then(Value::as_str)
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok()),
        }
    }
}

/// Pick the release to report.
///
/// The most recently published non-prerelease wins; only when there is none
/// does the most recent release of any kind win. Releases without a timestamp
/// never win, and ties keep the earlier entry.
pub fn select_latest(releases: &[Release]) -> Option<&Release> {
    latest_published(releases.iter().filter(|r| !r.prerelease))
        .or_else(|| latest_published(releases.iter()))
}

fn latest_published<'a>(releases: impl Iterator<Item = &'a Release>) -> Option<&'a Release> {
    releases
        .filter_map(|release| release.published_at.map(|ts| (ts, release)))
        .fold(None, |best, (ts, release)| match best {
            Some((best_ts, _)) if ts <= best_ts => best,
            _ => Some((ts, release)),
        })
        .map(|(_, release)| release)
}

/// Resolves the latest release tag of a GitHub repository
pub struct GitHubReleases {
    fetcher: Arc<dyn Fetcher>,
    api_base: String,
}

impl GitHubReleases {
    /// Creates a source with a custom API base URL
    pub fn new(fetcher: Arc<dyn Fetcher>, api_base: &str) -> Self {
        Self {
            fetcher,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Releases endpoint for `owner/repo`, a github.com URL, or a verbatim API URL
    pub fn releases_url(&self, repo: &str) -> String {
        if repo.starts_with(API_HOST_PREFIX) {
            return repo.to_string();
        }

        let repo = repo
            .strip_prefix(GITHUB_WEB_PREFIX)
            .unwrap_or(repo)
            .trim_end_matches('/');
        format!("{}/repos/{}/releases", self.api_base, repo)
    }

    pub async fn latest_version(
        &self,
        repo: &str,
        user_agent: &str,
    ) -> Result<Option<String>, CheckError> {
        let url = self.releases_url(repo);
        let body = self.fetcher.fetch_text(&url, user_agent).await?;

        let document: Value = serde_json::from_str(&body).map_err(ExtractError::from)?;
        let Value::Array(entries) = document else {
            debug!("GitHub response for {} is not a release list", repo);
            return Ok(None);
        };

        let releases: Vec<Release> = entries.iter().map(Release::from_value).collect();
        let latest = select_latest(&releases).and_then(|release| release.tag_name.clone());
        debug!("Latest GitHub release of {}: {:?}", repo, latest);

        Ok(latest)
    }
}
