// Runtime configuration: environment first, CLI flags layered on top by
// `main.rs`.

use std::path::PathBuf;
use std::time::Duration;

use crate::session::FileSessionStore;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// How long a status message stays visible.
pub const STATUS_TTL: Duration = Duration::from_secs(5);

/// Pause before reloading the catalog after a write, so the read sees it.
pub const RELOAD_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    /// `None` keeps the session in memory only.
    pub session_file: Option<PathBuf>,
    pub timing: Timing,
}

/// Fixed delays used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub status_ttl: Duration,
    pub reload_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            status_ttl: STATUS_TTL,
            reload_delay: RELOAD_DELAY,
        }
    }
}

impl Timing {
    /// No pauses; for tests and scripted runs.
    pub fn immediate() -> Self {
        Timing {
            status_ttl: STATUS_TTL,
            reload_delay: Duration::ZERO,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_URL.into(),
            session_file: Some(FileSessionStore::default_path()),
            timing: Timing::default(),
        }
    }
}

impl Config {
    /// Read `CATALOG_API_URL` and `CATALOG_SESSION_FILE`, falling back to
    /// the defaults for anything unset or empty.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        if let Some(url) = lookup("CATALOG_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_base_url = url.trim().to_string();
        }
        if let Some(path) = lookup("CATALOG_SESSION_FILE").filter(|v| !v.trim().is_empty()) {
            config.session_file = Some(PathBuf::from(path));
        }
        config
    }
}
