//! Query façade combining the manifest stores and the version checker

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{ScoopContext, Settings};
use crate::manifest::{BucketStore, InstalledStore, ManifestStore, Package, ScanFilter, StoreError};
use crate::version::{CheckError, Fetcher, VersionChecker, same_version};

/// Operations offered to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    List,
    Search,
}

impl QueryKind {
    pub const ALL: [QueryKind; 2] = [QueryKind::List, QueryKind::Search];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::List => "list",
            QueryKind::Search => "search",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            QueryKind::List => "List installed apps",
            QueryKind::Search => "Search apps from added buckets",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown query kind: {0}")]
pub struct ParseQueryKindError(pub String);

impl FromStr for QueryKind {
    type Err = ParseQueryKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "list" => Ok(QueryKind::List),
            "search" => Ok(QueryKind::Search),
            _ => Err(ParseQueryKindError(s.to_string())),
        }
    }
}

/// Outcome of comparing a package against its upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateStatus {
    UpToDate,
    UpdateAvailable(String),
    /// No descriptor, nothing matched, cancelled or timed out
    Unresolved,
}

/// Entry point for listing, searching and update checks against one Scoop root
pub struct ScoopQuery {
    installed: Arc<dyn ManifestStore>,
    buckets: Arc<dyn ManifestStore>,
    checker: VersionChecker,
    settings: Settings,
}

impl ScoopQuery {
    /// Query the root resolved by `context`; `None` when no root was found
    pub fn new(context: &ScoopContext, fetcher: Arc<dyn Fetcher>) -> Option<Self> {
        let root = context.root()?;
        Some(Self::from_root(
            root,
            context.settings().clone(),
            VersionChecker::new(fetcher),
        ))
    }

    pub fn from_root(root: &Path, settings: Settings, checker: VersionChecker) -> Self {
        Self::build(
            Arc::new(InstalledStore::new(root)),
            Arc::new(BucketStore::new(root)),
            checker,
            settings,
        )
    }

    pub fn build(
        installed: Arc<dyn ManifestStore>,
        buckets: Arc<dyn ManifestStore>,
        checker: VersionChecker,
        settings: Settings,
    ) -> Self {
        Self {
            installed,
            buckets,
            checker,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Installed packages whose name contains `keyword`
    pub async fn list(
        &self,
        keyword: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Package>, StoreError> {
        let filter = ScanFilter::keyword(keyword.trim());
        self.installed.scan(&filter, cancel).await
    }

    /// Bucket manifests matching `raw`, either `keyword` or `bucket/keyword`
    pub async fn search(
        &self,
        raw: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Package>, StoreError> {
        let filter = parse_search(raw).with_limit(self.settings.search_limit);
        debug!("Searching buckets with {:?}", filter);
        self.buckets.scan(&filter, cancel).await
    }

    pub async fn query(
        &self,
        kind: QueryKind,
        raw: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Package>, StoreError> {
        match kind {
            QueryKind::List => self.list(raw, cancel).await,
            QueryKind::Search => self.search(raw, cancel).await,
        }
    }

    /// Resolve the upstream version of `package` within the configured timeout
    pub async fn check_update(
        &self,
        package: &Package,
        cancel: &CancellationToken,
    ) -> Result<UpdateStatus, CheckError> {
        if package.checkver.is_no_check() {
            debug!("{} has no checkver descriptor", package.name);
            return Ok(UpdateStatus::Unresolved);
        }

        let latest = self
            .checker
            .resolve_with_timeout(
                &package.checkver,
                package.homepage.as_deref(),
                self.settings.check_timeout(),
                cancel,
            )
            .await?;

        let status = match latest {
            None => UpdateStatus::Unresolved,
            Some(latest) if same_version(&latest, &package.version) => UpdateStatus::UpToDate,
            Some(latest) => UpdateStatus::UpdateAvailable(latest),
        };
        debug!("Update status of {}: {:?}", package.name, status);

        Ok(status)
    }
}

/// `bucket/keyword` narrows the search to one bucket; anything else is a keyword
fn parse_search(raw: &str) -> ScanFilter {
    let raw = raw.trim();
    match raw.split_once('/') {
        Some((bucket, rest)) => {
            let keyword = rest.split('/').next().unwrap_or_default();
            let filter = ScanFilter::keyword(keyword.trim());
            match bucket.trim() {
                "" => filter,
                bucket => filter.with_bucket(bucket),
            }
        }
        None => ScanFilter::keyword(raw),
    }
}
