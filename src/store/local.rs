//! File-backed fixture store.
//!
//! One pretty-printed JSON document per fixture, named
//! `<label>-<identity>.json` inside the fixtures directory. The directory
//! is created lazily on first write, so replay-only runs never touch the
//! filesystem layout.
//!
//! Scans are fault-isolated: one corrupt or foreign file never aborts a
//! listing, it is skipped (or reported, for per-label scans) and the scan
//! continues.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{fixture_filename, Fixture};
use crate::error::{Result, SnapError};
use crate::identity::CallArgs;

/// Filename shape of a fixture file: `<label>-<16 hex chars>.json`.
static FIXTURE_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.+-[0-9a-f]{16}\.json$").unwrap());

/// Metadata for one stored fixture, as returned by [`LocalStore::list_all`].
#[derive(Debug, Clone, Serialize)]
pub struct FixtureInfo {
    /// Label the fixture was recorded under.
    pub name: String,
    /// Filename within the fixtures directory.
    pub filename: String,
    /// ISO-8601 recording time.
    pub recorded_at: String,
    /// On-disk size of the fixture file.
    pub size_bytes: u64,
}

/// One record from a per-label scan: either a parsed fixture or a
/// fault-isolated entry for a file that would not parse.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelEntry {
    Fixture {
        filename: String,
        identity: String,
        fixture: Fixture,
    },
    Corrupt {
        filename: String,
        error: String,
    },
}

/// Local fixture store rooted at a single directory.
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory fixtures are read from and written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a fixture, creating the directory if needed. Re-recording
    /// the same `(label, identity)` pair overwrites in place.
    pub fn put(
        &self,
        label: &str,
        identity: &str,
        call: &CallArgs,
        response: &Value,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let fixture = Fixture::new(label, call, response.clone());
        let path = self.dir.join(fixture_filename(label, identity));
        fs::write(&path, serde_json::to_string_pretty(&fixture)?)?;
        Ok(path)
    }

    /// Read back the recorded response for `(label, identity)`.
    ///
    /// `Ok(None)` means no such fixture; a file that exists but will not
    /// parse is an error, which callers on the replay path treat as a
    /// miss.
    pub fn get(&self, label: &str, identity: &str) -> Result<Option<Value>> {
        let path = self.dir.join(fixture_filename(label, identity));
        if !path.exists() {
            return Ok(None);
        }
        let fixture = read_fixture(&path)?;
        Ok(Some(fixture.response))
    }

    /// List metadata for every readable fixture, sorted by filename.
    ///
    /// Files that do not look like fixtures, or that fail to parse, are
    /// skipped with a debug log.
    pub fn list_all(&self) -> Result<Vec<FixtureInfo>> {
        let mut out = Vec::new();
        for (name, path) in self.fixture_files(None)? {
            let fixture = match read_fixture(&path) {
                Ok(f) => f,
                Err(e) => {
                    debug!("Skipping unreadable fixture {}: {}", name, e);
                    continue;
                }
            };
            let size_bytes = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            out.push(FixtureInfo {
                name: fixture.name,
                filename: name,
                recorded_at: fixture.timestamp,
                size_bytes,
            });
        }
        Ok(out)
    }

    /// Scan every fixture recorded under `label`.
    ///
    /// The match is a glob-style filename prefix (`<label>-*.json`), the
    /// same shape `put` writes. Corrupt files become [`LabelEntry::Corrupt`]
    /// entries instead of aborting the scan, so one bad file still lets
    /// the rest of the label be inspected.
    pub fn find_by_label(&self, label: &str) -> Result<Vec<LabelEntry>> {
        let pattern = Pattern::new(&format!("{}-*.json", Pattern::escape(label)))
            .map_err(|e| SnapError::Fixture(format!("invalid label '{label}': {e}")))?;

        let mut out = Vec::new();
        for (name, path) in self.fixture_files(Some(&pattern))? {
            // Identity is the 16 hex chars right before ".json".
            let identity = name[name.len() - 21..name.len() - 5].to_string();
            match read_fixture(&path) {
                Ok(fixture) => out.push(LabelEntry::Fixture {
                    filename: name,
                    identity,
                    fixture,
                }),
                Err(e) => out.push(LabelEntry::Corrupt {
                    filename: name,
                    error: e.to_string(),
                }),
            }
        }
        Ok(out)
    }

    /// Delete every fixture file in the store. Returns how many were
    /// removed. Non-fixture files in the directory are left alone.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for (name, path) in self.fixture_files(None)? {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Could not remove fixture {}: {}", name, e),
            }
        }
        Ok(removed)
    }

    /// Enumerate fixture-shaped files, sorted by filename. `pattern`
    /// narrows the listing to one label.
    fn fixture_files(&self, pattern: Option<&Pattern>) -> Result<Vec<(String, PathBuf)>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !FIXTURE_FILE_RE.is_match(&name) {
                continue;
            }
            if let Some(p) = pattern {
                if !p.matches(&name) {
                    continue;
                }
            }
            files.push((name, entry.path()));
        }
        files.sort();
        Ok(files)
    }
}

fn read_fixture(path: &Path) -> Result<Fixture> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data)
        .map_err(|e| SnapError::Fixture(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn sample_call() -> CallArgs {
        CallArgs::new().arg("Ann").kwarg("greeting", "Hello")
    }

    #[test]
    fn test_put_then_get() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        assert_eq!(store.dir(), dir.path());
        let call = sample_call();
        let identity = call.identity();

        let path = store
            .put("greet", &identity, &call, &json!("Hello, Ann!"))
            .unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("greet-{identity}.json")
        );

        let response = store.get("greet", &identity).unwrap();
        assert_eq!(response, Some(json!("Hello, Ann!")));
    }

    #[test]
    fn test_get_missing_is_none() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let got = store.get("greet", "0123456789abcdef").unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn test_get_corrupt_is_error() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        fs::write(dir.path().join("greet-0123456789abcdef.json"), "{ not json").unwrap();

        let err = store.get("greet", "0123456789abcdef").unwrap_err();
        assert!(matches!(err, SnapError::Fixture(_)));
    }

    #[test]
    fn test_put_overwrites_same_identity() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let call = sample_call();
        let identity = call.identity();

        store.put("greet", &identity, &call, &json!("v1")).unwrap();
        store.put("greet", &identity, &call, &json!("v2")).unwrap();

        assert_eq!(store.get("greet", &identity).unwrap(), Some(json!("v2")));
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_directory_reads_as_empty() {
        let store = LocalStore::new("/tmp/snapcache-does-not-exist");
        assert!(store.list_all().unwrap().is_empty());
        assert!(store.find_by_label("greet").unwrap().is_empty());
        assert_eq!(store.clear().unwrap(), 0);
    }

    #[test]
    fn test_list_all_skips_foreign_and_corrupt_files() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let call = sample_call();
        store.put("greet", &call.identity(), &call, &json!("hi")).unwrap();

        fs::write(dir.path().join("notes.txt"), "not a fixture").unwrap();
        fs::write(dir.path().join("README.json"), "{}").unwrap();
        fs::write(dir.path().join("bad-ffffffffffffffff.json"), "{ nope").unwrap();

        let listed = store.list_all().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "greet");
        assert!(listed[0].size_bytes > 0);
        assert!(!listed[0].recorded_at.is_empty());
    }

    #[test]
    fn test_find_by_label() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        let ann = CallArgs::new().arg("Ann");
        let bob = CallArgs::new().arg("Bob");
        store.put("greet", &ann.identity(), &ann, &json!("Hello, Ann!")).unwrap();
        store.put("greet", &bob.identity(), &bob, &json!("Hello, Bob!")).unwrap();
        store.put("other", &ann.identity(), &ann, &json!("x")).unwrap();

        let entries = store.find_by_label("greet").unwrap();
        assert_eq!(entries.len(), 2);
        for entry in &entries {
            match entry {
                LabelEntry::Fixture { identity, fixture, .. } => {
                    assert_eq!(fixture.name, "greet");
                    assert_eq!(identity.len(), 16);
                }
                LabelEntry::Corrupt { filename, .. } => {
                    panic!("unexpected corrupt entry for {filename}")
                }
            }
        }
    }

    #[test]
    fn test_find_by_label_reports_corrupt_files() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let call = sample_call();
        store.put("greet", &call.identity(), &call, &json!("hi")).unwrap();
        fs::write(dir.path().join("greet-ffffffffffffffff.json"), "{ nope").unwrap();

        let entries = store.find_by_label("greet").unwrap();
        assert_eq!(entries.len(), 2);
        let corrupt = entries
            .iter()
            .filter(|e| matches!(e, LabelEntry::Corrupt { .. }))
            .count();
        assert_eq!(corrupt, 1);
    }

    #[test]
    fn test_clear_removes_only_fixtures() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let call = sample_call();
        store.put("greet", &call.identity(), &call, &json!("hi")).unwrap();
        store.put("other", &call.identity(), &call, &json!("yo")).unwrap();
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        assert_eq!(store.clear().unwrap(), 2);
        assert!(store.list_all().unwrap().is_empty());
        assert!(dir.path().join("notes.txt").exists());
    }
}
