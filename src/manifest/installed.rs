//! Store over installed apps: `<root>/apps/<name>/current/{manifest,install}.json`

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::MAX_CONCURRENT_READS;
use crate::manifest::decode::{InstallRecord, Manifest};
use crate::manifest::error::{ManifestError, StoreError};
use crate::manifest::traits::{ManifestStore, ScanFilter};
use crate::manifest::types::Package;
use crate::manifest::walk::{is_dir, list_dirs};

/// Manifest store for apps installed under a Scoop root
pub struct InstalledStore {
    root: PathBuf,
}

impl InstalledStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn apps_dir(&self) -> PathBuf {
        self.root.join("apps")
    }

    async fn scan_apps(&self, filter: &ScanFilter) -> Result<Vec<Package>, StoreError> {
        let apps_dir = self.apps_dir();
        if !is_dir(&apps_dir).await {
            return Err(StoreError::NotFound(apps_dir));
        }

        let candidates: Vec<(String, PathBuf)> = list_dirs(&apps_dir)
            .await?
            .into_iter()
            .filter_map(|dir| {
                let name = dir.file_name()?.to_str()?.to_string();
                filter.matches_name(&name).then_some((name, dir))
            })
            .collect();
        debug!(
            "{} app directories match {:?}",
            candidates.len(),
            filter.keyword
        );

        let bucket = filter.bucket.as_deref();
        // `buffered` keeps listing order so the limit keeps the first matches
        let mut loads = stream::iter(candidates)
            .map(|(name, dir)| async move {
                let result = load_installed(&name, &dir, bucket).await;
                (name, result)
            })
            .buffered(MAX_CONCURRENT_READS);

        let mut packages = Vec::new();
        while !filter.is_full(packages.len()) {
            let Some((name, result)) = loads.next().await else {
                break;
            };
            match result {
                Ok(Some(package)) => packages.push(package),
                Ok(None) => debug!("Skipping {}: not from bucket {:?}", name, bucket),
                Err(e) => debug!("Skipping installed app {}: {}", name, e),
            }
        }

        info!(
            "Found {} installed packages under {:?}",
            packages.len(),
            apps_dir
        );
        Ok(packages)
    }
}

#[async_trait::async_trait]
impl ManifestStore for InstalledStore {
    async fn scan(
        &self,
        filter: &ScanFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<Package>, StoreError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StoreError::Cancelled),
            result = self.scan_apps(filter) => result,
        }
    }
}

/// Load one installed app. `Ok(None)` means the app belongs to another bucket.
async fn load_installed(
    name: &str,
    app_dir: &Path,
    bucket_filter: Option<&str>,
) -> Result<Option<Package>, ManifestError> {
    let current = app_dir.join("current");

    let manifest = Manifest::parse(&tokio::fs::read_to_string(current.join("manifest.json")).await?)?;
    let record =
        InstallRecord::parse(&tokio::fs::read_to_string(current.join("install.json")).await?)?;

    let bucket = record.bucket();
    if bucket_filter.is_some_and(|wanted| wanted != bucket) {
        return Ok(None);
    }

    let version = manifest.version();
    let file_name = manifest.entry_point();
    let homepage = manifest.homepage();
    let description = manifest.description();

    Ok(Some(Package {
        name: name.to_string(),
        version,
        file_name,
        bucket,
        path: current,
        checkver: manifest.checkver,
        homepage,
        description,
    }))
}
