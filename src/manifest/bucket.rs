//! Store over bucket manifests: `<root>/buckets/<bucket>/bucket/*.json`

use std::path::{Component, Path, PathBuf};

use futures::stream::{self, StreamExt};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MAX_CONCURRENT_READS;
use crate::manifest::decode::Manifest;
use crate::manifest::error::{ManifestError, StoreError};
use crate::manifest::traits::{ManifestStore, ScanFilter};
use crate::manifest::types::{Package, UNKNOWN};
use crate::manifest::walk::{is_dir, list_dirs, list_json_files};

/// Manifest store for the buckets added to a Scoop root
pub struct BucketStore {
    root: PathBuf,
}

impl BucketStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn buckets_dir(&self) -> PathBuf {
        self.root.join("buckets")
    }

    async fn scan_buckets(&self, filter: &ScanFilter) -> Result<Vec<Package>, StoreError> {
        // Searching the catalog needs a keyword
        if filter.keyword.is_empty() {
            return Ok(Vec::new());
        }

        let buckets_dir = self.buckets_dir();
        if !is_dir(&buckets_dir).await {
            return Err(StoreError::NotFound(buckets_dir));
        }

        let bucket_dirs = match &filter.bucket {
            Some(name) => {
                if !is_bucket_name(name) {
                    debug!("Bucket filter {:?} is not a bucket name", name);
                    return Ok(Vec::new());
                }
                let dir = buckets_dir.join(name.to_lowercase());
                if !is_dir(&dir).await {
                    debug!("Bucket {} is not added under {:?}", name, buckets_dir);
                    return Ok(Vec::new());
                }
                vec![dir]
            }
            None => list_dirs(&buckets_dir).await?,
        };

        let mut tasks = JoinSet::new();
        for dir in bucket_dirs {
            tasks.spawn(search_bucket(dir, filter.clone()));
        }

        let mut packages = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(found) => packages.extend(found),
                Err(e) => warn!("Bucket scan task failed: {}", e),
            }
        }

        if let Some(limit) = filter.limit {
            packages.truncate(limit);
        }

        info!(
            "Found {} bucket manifests matching {:?}",
            packages.len(),
            filter.keyword
        );
        Ok(packages)
    }
}

#[async_trait::async_trait]
impl ManifestStore for BucketStore {
    async fn scan(
        &self,
        filter: &ScanFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<Package>, StoreError> {
        // Dropping the scan future drops the JoinSet, which aborts its tasks
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StoreError::Cancelled),
            result = self.scan_buckets(filter) => result,
        }
    }
}

/// Scan one bucket directory. Missing or unreadable `bucket/` yields nothing.
async fn search_bucket(bucket_dir: PathBuf, filter: ScanFilter) -> Vec<Package> {
    let manifests_dir = bucket_dir.join("bucket");
    let files = match list_json_files(&manifests_dir).await {
        Ok(files) => files,
        Err(e) => {
            debug!("Skipping bucket {:?}: {}", bucket_dir, e);
            return Vec::new();
        }
    };

    let matching = files.into_iter().filter(|file| {
        file.file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| filter.matches_name(stem))
    });

    stream::iter(matching)
        .map(|file| async move {
            let result = load_manifest(&file).await;
            (file, result)
        })
        .buffer_unordered(MAX_CONCURRENT_READS)
        .filter_map(|(file, result)| async move {
            result
                .inspect_err(|e| debug!("Skipping manifest {:?}: {}", file, e))
                .ok()
        })
        .collect()
        .await
}

async fn load_manifest(file: &Path) -> Result<Package, ManifestError> {
    let manifest = Manifest::parse(&tokio::fs::read_to_string(file).await?)?;

    let name = file_name_part(file.file_stem());
    let file_name = file_name_part(file.file_name());
    let manifests_dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
    let bucket = manifests_dir
        .parent()
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .map_or_else(|| UNKNOWN.to_string(), String::from);

    let version = manifest.version();
    let homepage = manifest.homepage();
    let description = manifest.description();

    Ok(Package {
        name,
        version,
        file_name: Some(file_name),
        bucket,
        path: manifests_dir,
        checkver: manifest.checkver,
        homepage,
        description,
    })
}

fn file_name_part(part: Option<&std::ffi::OsStr>) -> String {
    part.map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A bucket filter must name exactly one directory under `buckets/`
fn is_bucket_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
