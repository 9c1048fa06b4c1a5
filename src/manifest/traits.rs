//! Manifest store trait definition

#[cfg(test)]
use mockall::automock;

use tokio_util::sync::CancellationToken;

use crate::manifest::error::StoreError;
use crate::manifest::types::Package;

/// Keyword, bucket and size constraints for one scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanFilter {
    /// Case-insensitive substring matched against package names
    pub keyword: String,
    /// Only packages from this bucket
    pub bucket: Option<String>,
    /// Stop after this many packages; `None` is unbounded
    pub limit: Option<usize>,
}

impl ScanFilter {
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Self::default()
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `name` contains the keyword, ignoring case. An empty keyword matches.
    pub fn matches_name(&self, name: &str) -> bool {
        self.keyword.is_empty() || name.to_lowercase().contains(&self.keyword.to_lowercase())
    }

    pub(crate) fn is_full(&self, count: usize) -> bool {
        self.limit.is_some_and(|limit| count >= limit)
    }
}

/// A source of package records laid out on disk
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ManifestStore: Send + Sync {
    /// Scan the store for packages matching `filter`.
    ///
    /// Per-package decode failures are skipped. Result order is unspecified.
    ///
    /// # Returns
    /// * `Ok(Vec<Package>)` - Matching packages
    /// * `Err(StoreError::NotFound)` - The store's root directory does not exist
    /// * `Err(StoreError::Cancelled)` - `cancel` fired before the scan finished
    async fn scan(
        &self,
        filter: &ScanFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<Package>, StoreError>;
}
