//! Interpreter for `checkver` descriptors

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{DEFAULT_USER_AGENT, GITHUB_API_BASE_URL, SOURCEFORGE_BASE_URL};
use crate::manifest::{Checkver, CheckverStrategy};
use crate::version::error::{CheckError, ExtractError};
use crate::version::extract::{extract_json, extract_regex, extract_xml, first_group};
use crate::version::fetcher::Fetcher;
use crate::version::sources::{GitHubReleases, SourceForgeRss};

/// Literal descriptor selecting the GitHub path with the homepage as repository
const GITHUB_LITERAL: &str = "github";

/// How a fetched document is reduced to a version string
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Extraction<'a> {
    json_path: Option<&'a str>,
    xpath: Option<&'a str>,
    regex: Option<&'a str>,
    replace: Option<&'a str>,
    reverse: bool,
}

impl<'a> Extraction<'a> {
    /// A bare regex, as carried by a literal descriptor
    fn pattern(regex: &'a str) -> Self {
        Self {
            regex: Some(regex),
            ..Self::default()
        }
    }

    fn from_strategy(strategy: &'a CheckverStrategy) -> Self {
        Self {
            json_path: strategy.json_path(),
            xpath: strategy.xpath(),
            regex: strategy.regex(),
            replace: strategy.replace(),
            reverse: strategy.reverse(),
        }
    }

    /// JSONPath wins over XPath, which wins over a standalone regex.
    /// After JSONPath/XPath the regex only filters (group 1 of the first match).
    fn apply(&self, content: &str) -> Result<Option<String>, ExtractError> {
        if let Some(path) = self.json_path {
            let value = extract_json(content, path)?;
            return self.post_filter(value);
        }

        if let Some(xpath) = self.xpath {
            let value = extract_xml(content, xpath)?;
            return self.post_filter(value);
        }

        match self.regex {
            Some(pattern) => extract_regex(content, pattern, self.replace, self.reverse),
            None => Ok(None),
        }
    }

    fn post_filter(&self, value: Option<String>) -> Result<Option<String>, ExtractError> {
        match (value, self.regex) {
            (Some(value), Some(pattern)) => first_group(&value, pattern),
            (value, _) => Ok(value),
        }
    }
}

/// Resolves the latest upstream version of a package from its descriptor
pub struct VersionChecker {
    fetcher: Arc<dyn Fetcher>,
    github: GitHubReleases,
    sourceforge: SourceForgeRss,
}

impl VersionChecker {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_endpoints(fetcher, GITHUB_API_BASE_URL, SOURCEFORGE_BASE_URL)
    }

    /// Creates a checker talking to custom GitHub API / SourceForge hosts
    pub fn with_endpoints(
        fetcher: Arc<dyn Fetcher>,
        github_api: &str,
        sourceforge_base: &str,
    ) -> Self {
        Self {
            github: GitHubReleases::new(Arc::clone(&fetcher), github_api),
            sourceforge: SourceForgeRss::new(Arc::clone(&fetcher), sourceforge_base),
            fetcher,
        }
    }

    /// Resolve the latest version described by `checkver`.
    ///
    /// # Returns
    /// * `Ok(Some(version))` - A version was extracted
    /// * `Ok(None)` - Nothing to resolve, nothing matched, or `cancel` fired
    /// * `Err(CheckError)` - Transport failure or unusable extraction input
    pub async fn resolve(
        &self,
        checkver: &Checkver,
        homepage: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, CheckError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Version check cancelled");
                Ok(None)
            }
            result = self.dispatch(checkver, homepage) => result,
        }
    }

    /// [`resolve`](Self::resolve) bounded by `timeout`; expiry yields `Ok(None)`
    pub async fn resolve_with_timeout(
        &self,
        checkver: &Checkver,
        homepage: Option<&str>,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, CheckError> {
        match tokio::time::timeout(timeout, self.resolve(checkver, homepage, cancel)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Version check timed out after {:?}", timeout);
                Ok(None)
            }
        }
    }

    async fn dispatch(
        &self,
        checkver: &Checkver,
        homepage: Option<&str>,
    ) -> Result<Option<String>, CheckError> {
        match checkver {
            Checkver::NoCheck => Ok(None),
            Checkver::Unrecognized(value) => {
                warn!("Ignoring unsupported checkver descriptor: {}", value);
                Ok(None)
            }
            Checkver::Literal(literal) if literal == GITHUB_LITERAL => {
                let Some(repo) = required_homepage(homepage) else {
                    return Ok(None);
                };
                debug!("Checking GitHub releases of homepage {}", repo);
                self.github.latest_version(repo, DEFAULT_USER_AGENT).await
            }
            Checkver::Literal(pattern) => {
                let Some(url) = required_homepage(homepage) else {
                    return Ok(None);
                };
                self.fetch_and_extract(url, DEFAULT_USER_AGENT, Extraction::pattern(pattern))
                    .await
            }
            Checkver::Strategy(strategy) => self.dispatch_strategy(strategy).await,
        }
    }

    async fn dispatch_strategy(
        &self,
        strategy: &CheckverStrategy,
    ) -> Result<Option<String>, CheckError> {
        let user_agent = strategy.user_agent().unwrap_or(DEFAULT_USER_AGENT);

        if let Some(repo) = strategy.github() {
            debug!("Checking GitHub releases of {}", repo);
            return self.github.latest_version(repo, user_agent).await;
        }

        if let Some(project) = strategy.sourceforge() {
            debug!("Checking SourceForge feed of {}", project);
            return self
                .sourceforge
                .latest_version(
                    project,
                    strategy.sourceforge_path(),
                    strategy.regex(),
                    user_agent,
                )
                .await;
        }

        if let Some(url) = strategy.url() {
            return self
                .fetch_and_extract(url, user_agent, Extraction::from_strategy(strategy))
                .await;
        }

        debug!("Checkver descriptor names no source");
        Ok(None)
    }

    async fn fetch_and_extract(
        &self,
        url: &str,
        user_agent: &str,
        extraction: Extraction<'_>,
    ) -> Result<Option<String>, CheckError> {
        let content = self.fetcher.fetch_text(url, user_agent).await?;
        let version = extraction.apply(&content)?;
        debug!("Extracted {:?} from {}", version, url);
        Ok(version)
    }
}

fn required_homepage(homepage: Option<&str>) -> Option<&str> {
    let homepage = homepage.filter(|h| !h.is_empty());
    if homepage.is_none() {
        warn!("Checkver descriptor needs a homepage but the manifest has none");
    }
    homepage
}
