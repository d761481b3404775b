//! The record/replay engine.
//!
//! [`Recorder::snapshot`] wraps one expensive call. In record mode the
//! call runs and its result is persisted as a fixture; in replay mode the
//! stored fixture is returned without running the call, and a miss falls
//! through to record behavior so replay runs never fail on coverage gaps.
//!
//! Store faults never break the wrapped call: a failed read is a miss, a
//! failed write is a warning, and the only error `snapshot` returns is
//! the one the call itself produced.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{Mode, Settings, SyncScope};
use crate::error::Result;
use crate::identity::CallArgs;
use crate::inspect::{self, Stats};
use crate::store::{LabelEntry, LocalStore, RemoteStore};

/// Records and replays the results of expensive calls.
///
/// Each recorder owns its settings and store handles; there is no global
/// state, so two recorders with different configurations can coexist in
/// one process.
///
/// ```no_run
/// use snapcache::{CallArgs, Recorder, Settings};
///
/// let recorder = Recorder::new(Settings::default());
/// let answer: String = recorder.snapshot(
///     "summarize",
///     CallArgs::new().arg("doc-42").kwarg("model", "gpt-4"),
///     || Ok::<_, std::io::Error>("three key points".to_string()),
/// )?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Recorder {
    settings: Settings,
    local: LocalStore,
    remote: Option<RemoteStore>,
}

impl Recorder {
    pub fn new(settings: Settings) -> Self {
        let local = LocalStore::new(settings.fixtures_dir.clone());
        let remote = RemoteStore::from_settings(&settings);
        Self {
            settings,
            local,
            remote,
        }
    }

    /// Build a recorder from `SNAPCACHE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Settings::from_env()?))
    }

    pub fn mode(&self) -> Mode {
        self.settings.mode
    }

    /// Switch between record and replay for subsequent calls.
    pub fn set_mode(&mut self, mode: Mode) {
        self.settings.mode = mode;
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Enable remote sync, rebuilding the remote client with the new
    /// credential and scope.
    pub fn configure_sync(
        &mut self,
        api_key: impl Into<String>,
        sync: SyncScope,
        api_url: Option<&str>,
    ) -> Result<()> {
        self.settings.configure_sync(api_key, sync, api_url)?;
        self.remote = RemoteStore::from_settings(&self.settings);
        Ok(())
    }

    /// Run `call` through the fixture cache.
    ///
    /// Replay mode serves the fixture for `(label, identity)` if one
    /// exists and deserializes as `T`; otherwise it falls through to
    /// record behavior. Record mode always runs the call, then persists
    /// the result to every store the sync scope selects. An `Err` from
    /// the call is returned unchanged and nothing is persisted.
    pub fn snapshot<T, E, F>(&self, label: &str, args: CallArgs, call: F) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        let identity = args.identity();

        if self.settings.mode == Mode::Replay {
            if let Some(value) = self.lookup(label, &identity, &args) {
                match serde_json::from_value::<T>(value) {
                    Ok(result) => {
                        debug!("Replaying fixture '{}' ({})", label, identity);
                        return Ok(result);
                    }
                    Err(e) => warn!(
                        "Fixture '{}' does not deserialize as the expected type, \
                         falling back to live call: {}",
                        label, e
                    ),
                }
            } else {
                warn!(
                    "No fixture for '{}' ({}), falling back to live call",
                    label, identity
                );
            }
        }

        let result = call()?;
        match serde_json::to_value(&result) {
            Ok(value) => self.persist(label, &identity, &args, &value),
            Err(e) => warn!(
                "Result of '{}' is not JSON-serializable, skipping fixture: {}",
                label, e
            ),
        }
        Ok(result)
    }

    /// Aggregate statistics over the local store.
    pub fn stats(&self) -> Result<Stats> {
        inspect::gather(&self.local)
    }

    /// Every local fixture recorded under `label`, corrupt files included
    /// as error entries.
    pub fn find_by_label(&self, label: &str) -> Result<Vec<LabelEntry>> {
        self.local.find_by_label(label)
    }

    /// Delete all local fixtures. Returns how many were removed.
    pub fn clear_local(&self) -> Result<usize> {
        self.local.clear()
    }

    /// Direct handle on the local store, for external tooling.
    pub fn local_store(&self) -> &LocalStore {
        &self.local
    }

    // ── Tier plumbing ────────────────────────────────────────────────

    /// Two-tier lookup: local first, then remote. A remote hit under
    /// scope `Both` is backfilled into the local store so the next
    /// replay stays offline.
    fn lookup(&self, label: &str, identity: &str, args: &CallArgs) -> Option<Value> {
        if self.settings.sync.includes_local() {
            match self.local.get(label, identity) {
                Ok(Some(value)) => return Some(value),
                Ok(None) => {}
                Err(e) => warn!("Local fixture '{}' unreadable, treating as miss: {}", label, e),
            }
        }

        if self.settings.sync.includes_remote() {
            let Some(remote) = &self.remote else {
                debug!("Remote scope selected but no credential configured");
                return None;
            };
            match remote.get(label, identity) {
                Ok(Some(value)) => {
                    if self.settings.sync == SyncScope::Both {
                        if let Err(e) = self.local.put(label, identity, args, &value) {
                            warn!("Could not backfill fixture '{}' locally: {}", label, e);
                        }
                    }
                    return Some(value);
                }
                Ok(None) => {}
                Err(e) => warn!("Remote lookup for '{}' failed, treating as miss: {}", label, e),
            }
        }

        None
    }

    /// Persist one recorded result to every tier the sync scope selects.
    /// Failures are logged and absorbed.
    fn persist(&self, label: &str, identity: &str, args: &CallArgs, value: &Value) {
        if self.settings.sync.includes_local() {
            match self.local.put(label, identity, args, value) {
                Ok(path) => debug!("Saved fixture {}", path.display()),
                Err(e) => warn!("Could not save fixture '{}' locally: {}", label, e),
            }
        }

        if self.settings.sync.includes_remote() {
            match &self.remote {
                Some(remote) => {
                    if let Err(e) = remote.put(label, args, value, self.settings.estimated_cost) {
                        warn!("Could not sync fixture '{}' to remote store: {}", label, e);
                    }
                }
                None => debug!("Remote scope selected but no credential configured"),
            }
        }
    }
}
