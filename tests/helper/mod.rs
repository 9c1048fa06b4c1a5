//! Scoop directory fixtures for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

/// A throwaway Scoop root with `apps/` and `buckets/`
pub struct ScoopTree {
    dir: TempDir,
}

impl ScoopTree {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("apps")).unwrap();
        fs::create_dir_all(dir.path().join("buckets")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    fn current_dir(&self, name: &str) -> PathBuf {
        let current = self.root().join("apps").join(name).join("current");
        fs::create_dir_all(&current).unwrap();
        current
    }

    /// Install `name` with a manifest and an install record naming `bucket`
    pub fn install(&self, name: &str, manifest: Value, bucket: &str) -> &Self {
        self.install_raw(name, &manifest.to_string(), Some(bucket))
    }

    /// Install with verbatim manifest text; `None` leaves out the install record
    pub fn install_raw(&self, name: &str, manifest: &str, bucket: Option<&str>) -> &Self {
        let current = self.current_dir(name);
        fs::write(current.join("manifest.json"), manifest).unwrap();
        if let Some(bucket) = bucket {
            fs::write(
                current.join("install.json"),
                json!({ "bucket": bucket, "architecture": "64bit" }).to_string(),
            )
            .unwrap();
        }
        self
    }

    /// An app directory whose `current/` has an install record but no manifest
    pub fn install_without_manifest(&self, name: &str) -> &Self {
        let current = self.current_dir(name);
        fs::write(current.join("install.json"), json!({ "bucket": "main" }).to_string()).unwrap();
        self
    }

    /// Add `<bucket>/bucket/<name>.json` and return its path
    pub fn add_manifest(&self, bucket: &str, name: &str, manifest: Value) -> PathBuf {
        self.add_raw_manifest(bucket, &format!("{name}.json"), &manifest.to_string())
    }

    pub fn add_raw_manifest(&self, bucket: &str, file_name: &str, content: &str) -> PathBuf {
        let dir = self.root().join("buckets").join(bucket).join("bucket");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file_name);
        fs::write(&path, content).unwrap();
        path
    }
}

/// Minimal manifest with a version and homepage
pub fn manifest(version: &str) -> Value {
    json!({
        "version": version,
        "homepage": "https://example.com",
        "description": "Test app"
    })
}

/// Manifest carrying a `checkver` descriptor
pub fn manifest_with_checkver(version: &str, checkver: Value) -> Value {
    json!({
        "version": version,
        "homepage": "https://example.com",
        "checkver": checkver
    })
}

pub fn sorted_names(packages: &[scoop_query::manifest::Package]) -> Vec<String> {
    let mut names: Vec<String> = packages.iter().map(|p| p.name.clone()).collect();
    names.sort();
    names
}
