use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

// =============================================================================
// Time-related constants
// =============================================================================

/// Default bound for an interactive version check in milliseconds (10 seconds)
pub const CHECK_TIMEOUT_MS: u64 = 10_000;

/// Timeout for a single HTTP fetch in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

// =============================================================================
// Scan and query constants
// =============================================================================

/// Maximum number of manifest files read concurrently within one scan unit
pub const MAX_CONCURRENT_READS: usize = 32;

/// Default number of bucket search results handed to the presentation layer
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

// =============================================================================
// Remote endpoints
// =============================================================================

/// Browser-like user agent sent unless a descriptor overrides it.
/// Several upstream download pages refuse requests without one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Default base URL for the GitHub REST API
pub const GITHUB_API_BASE_URL: &str = "https://api.github.com";

/// Default base URL for SourceForge project feeds
pub const SOURCEFORGE_BASE_URL: &str = "https://sourceforge.net";

/// File name of the log written under [`data_dir`]
pub const LOG_FILE_NAME: &str = "scoop-query.log";

/// File names of the Scoop shim looked up on PATH
const SHIM_NAMES: [&str; 4] = ["scoop", "scoop.cmd", "scoop.ps1", "scoop.exe"];

/// User-facing settings supplied by the host application
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Explicit Scoop root; overrides every other discovery rule when non-blank
    pub scoop_home: Option<PathBuf>,
    /// Upper bound for one version check in milliseconds
    pub check_timeout_ms: u64,
    /// Maximum number of bucket search results
    pub search_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scoop_home: None,
            check_timeout_ms: CHECK_TIMEOUT_MS,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl Settings {
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    fn explicit_home(&self) -> Option<&Path> {
        self.scoop_home
            .as_deref()
            .filter(|home| !home.as_os_str().to_string_lossy().trim().is_empty())
    }
}

/// Environment inputs consulted while locating the Scoop root.
///
/// Captured once so that root resolution stays a pure function of its inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootEnv {
    pub scoop_global: Option<PathBuf>,
    pub scoop: Option<PathBuf>,
    pub path: Option<OsString>,
    pub xdg_config_home: Option<PathBuf>,
    pub home_dir: Option<PathBuf>,
    pub program_data: Option<PathBuf>,
}

impl RootEnv {
    /// Reads the process environment
    pub fn from_env() -> Self {
        Self {
            scoop_global: env_path("SCOOP_GLOBAL"),
            scoop: env_path("SCOOP"),
            path: std::env::var_os("PATH").filter(|v| !v.is_empty()),
            xdg_config_home: env_path("XDG_CONFIG_HOME"),
            home_dir: dirs::home_dir(),
            program_data: env_path("ProgramData"),
        }
    }

    /// Path of Scoop's own config.json
    fn scoop_config_path(&self) -> Option<PathBuf> {
        self.xdg_config_home
            .as_ref()
            .map(|xdg| xdg.join("scoop").join("config.json"))
            .or_else(|| {
                self.home_dir
                    .as_ref()
                    .map(|home| home.join(".config").join("scoop").join("config.json"))
            })
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Subset of Scoop's config.json that matters for root discovery
#[derive(Debug, Default, Deserialize)]
struct ScoopConfigFile {
    #[serde(alias = "rootPath", alias = "RootPath")]
    root_path: Option<PathBuf>,
}

/// A directory is a Scoop root when it exists and has an `apps` subdirectory
pub fn is_scoop_root(path: &Path) -> bool {
    path.is_dir() && path.join("apps").is_dir()
}

/// Resolve the Scoop root directory.
///
/// Order: explicit setting, `SCOOP_GLOBAL`, `SCOOP`, a `scoop` shim on PATH,
/// Scoop's config.json (`root_path`, then its directory), `%ProgramData%/scoop`,
/// `~/scoop`. Every candidate except the explicit setting must pass
/// [`is_scoop_root`].
pub fn resolve_root(settings: &Settings, env: &RootEnv) -> Option<PathBuf> {
    if let Some(home) = settings.explicit_home() {
        debug!("Using Scoop root from settings: {:?}", home);
        return Some(home.to_path_buf());
    }

    let valid = |candidate: &Option<PathBuf>| candidate.clone().filter(|p| is_scoop_root(p));

    valid(&env.scoop_global)
        .or_else(|| valid(&env.scoop))
        .or_else(|| env.path.as_ref().and_then(find_shim_root))
        .or_else(|| env.scoop_config_path().and_then(|p| root_from_config(&p)))
        .or_else(|| valid(&env.program_data.as_ref().map(|p| p.join("scoop"))))
        .or_else(|| valid(&env.home_dir.as_ref().map(|p| p.join("scoop"))))
}

fn find_shim_root(path_var: &OsString) -> Option<PathBuf> {
    std::env::split_paths(path_var).find_map(|dir| {
        if !SHIM_NAMES.iter().any(|name| dir.join(name).is_file()) {
            return None;
        }
        let root = if dir
            .file_name()
            .is_some_and(|name| name.eq_ignore_ascii_case("shims"))
        {
            dir.parent()?.to_path_buf()
        } else {
            dir
        };
        is_scoop_root(&root).then_some(root)
    })
}

fn root_from_config(config_path: &Path) -> Option<PathBuf> {
    if !config_path.is_file() {
        return None;
    }

    let from_file = std::fs::read_to_string(config_path)
        .ok()
        .and_then(|content| serde_json::from_str::<ScoopConfigFile>(&content).ok())
        .and_then(|config| config.root_path)
        .filter(|root| is_scoop_root(root));

    from_file.or_else(|| {
        config_path
            .parent()
            .map(Path::to_path_buf)
            .filter(|dir| is_scoop_root(dir))
    })
}

/// Explicit configuration shared by the manifest stores and the version checker.
///
/// Replaces ambient process-wide state: callers hold a context, and changing the
/// settings re-resolves the root in one place.
#[derive(Debug, Clone)]
pub struct ScoopContext {
    settings: Settings,
    env: RootEnv,
    root: Option<PathBuf>,
}

impl ScoopContext {
    /// Resolve against the current process environment
    pub fn resolve(settings: Settings) -> Self {
        Self::with_env(settings, RootEnv::from_env())
    }

    pub fn with_env(settings: Settings, env: RootEnv) -> Self {
        let root = resolve_root(&settings, &env);
        match &root {
            Some(root) => info!("Resolved Scoop root at {:?}", root),
            None => info!("No Scoop root found"),
        }
        Self {
            settings,
            env,
            root,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The resolved Scoop root, if any
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Replace the settings and re-resolve the root
    pub fn update_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.reload();
    }

    /// Re-resolve the root with the current settings and captured environment
    pub fn reload(&mut self) {
        self.root = resolve_root(&self.settings, &self.env);
        debug!("Reloaded Scoop root: {:?}", self.root);
    }
}

/// Returns the path to the data directory for scoop-query.
/// Uses $XDG_DATA_HOME/scoop-query if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/scoop-query,
/// or ./scoop-query if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join(LOG_FILE_NAME)
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("scoop-query")
}
