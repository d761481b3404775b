//! Execution mode, sync scope, and recorder settings.
//!
//! Settings are plain data resolved once, either from the environment via
//! [`Settings::from_env`] or built in code. Nothing here touches global
//! state after construction; each [`Recorder`](crate::Recorder) owns its
//! own copy.

use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::error::{Result, SnapError};

/// Environment variable selecting record or replay.
pub const ENV_MODE: &str = "SNAPCACHE_MODE";
/// Environment variable selecting which stores to use.
pub const ENV_SYNC_MODE: &str = "SNAPCACHE_SYNC_MODE";
/// Environment variable holding the remote store bearer token.
pub const ENV_API_KEY: &str = "SNAPCACHE_API_KEY";
/// Environment variable overriding the remote store endpoint.
pub const ENV_API_URL: &str = "SNAPCACHE_API_URL";

/// Default remote store endpoint.
pub const DEFAULT_API_URL: &str = "https://app.snapcache.dev";
/// Default fixtures directory, relative to the working directory.
pub const DEFAULT_FIXTURES_DIR: &str = "fixtures";
/// Default per-call cost estimate in dollars, used for savings reports
/// and remote uploads.
pub const DEFAULT_ESTIMATED_COST: f64 = 0.002;

/// What [`Recorder::snapshot`](crate::Recorder::snapshot) does on each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Run the wrapped call and persist its result as a fixture.
    #[default]
    Record,
    /// Serve the stored fixture; fall back to record behavior on a miss.
    Replay,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Record => "record",
            Mode::Replay => "replay",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = SnapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "record" => Ok(Mode::Record),
            "replay" => Ok(Mode::Replay),
            other => Err(SnapError::Config(format!(
                "invalid mode '{other}', expected 'record' or 'replay'"
            ))),
        }
    }
}

/// Which store tiers a recorder reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncScope {
    /// Local JSON files only.
    #[default]
    Local,
    /// Remote store only; nothing is written to disk.
    Cloud,
    /// Both tiers: local wins on lookup, remote hits are backfilled.
    Both,
}

impl SyncScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncScope::Local => "local",
            SyncScope::Cloud => "cloud",
            SyncScope::Both => "both",
        }
    }

    pub fn includes_local(&self) -> bool {
        matches!(self, SyncScope::Local | SyncScope::Both)
    }

    pub fn includes_remote(&self) -> bool {
        matches!(self, SyncScope::Cloud | SyncScope::Both)
    }
}

impl std::fmt::Display for SyncScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncScope {
    type Err = SnapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(SyncScope::Local),
            "cloud" => Ok(SyncScope::Cloud),
            "both" => Ok(SyncScope::Both),
            other => Err(SnapError::Config(format!(
                "invalid sync scope '{other}', expected 'local', 'cloud', or 'both'"
            ))),
        }
    }
}

/// Resolved recorder configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: Mode,
    pub sync: SyncScope,
    /// Bearer token for the remote store. `None` disables remote sync
    /// regardless of the sync scope.
    pub api_key: Option<String>,
    /// Remote store base URL, without a trailing slash.
    pub api_url: String,
    /// Directory fixture files are written to.
    pub fixtures_dir: PathBuf,
    /// Dollar cost attributed to one live call.
    pub estimated_cost: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::Record,
            sync: SyncScope::Local,
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            fixtures_dir: PathBuf::from(DEFAULT_FIXTURES_DIR),
            estimated_cost: DEFAULT_ESTIMATED_COST,
        }
    }
}

impl Settings {
    /// Resolve settings from the environment, falling back to defaults.
    ///
    /// Empty variables are treated as unset. Unrecognized mode or sync
    /// scope values and malformed endpoint URLs are configuration errors
    /// rather than silent fallbacks.
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();

        if let Some(raw) = env_var(ENV_MODE) {
            settings.mode = raw.parse()?;
        }
        if let Some(raw) = env_var(ENV_SYNC_MODE) {
            settings.sync = raw.parse()?;
        }
        settings.api_key = env_var(ENV_API_KEY);
        if let Some(raw) = env_var(ENV_API_URL) {
            settings.api_url = validate_url(&raw)?;
        }

        Ok(settings)
    }

    /// Enable remote sync with the given credential and scope.
    ///
    /// `api_url` overrides the endpoint when given; `None` keeps the
    /// current one.
    pub fn configure_sync(
        &mut self,
        api_key: impl Into<String>,
        sync: SyncScope,
        api_url: Option<&str>,
    ) -> Result<()> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SnapError::Config("API key must not be empty".into()));
        }
        if let Some(raw) = api_url {
            self.api_url = validate_url(raw)?;
        }
        self.api_key = Some(api_key);
        self.sync = sync;
        Ok(())
    }

    /// True when the sync scope selects the remote tier and a credential
    /// is present.
    pub fn remote_enabled(&self) -> bool {
        self.sync.includes_remote() && self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse and normalize an endpoint URL, stripping any trailing slash so
/// path joins stay predictable.
fn validate_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw)
        .map_err(|e| SnapError::Config(format!("invalid endpoint URL '{raw}': {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SnapError::Config(format!(
            "invalid endpoint URL '{raw}': expected http or https"
        )));
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}
