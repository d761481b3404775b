//! Fixture persistence: the fixture document format plus the local
//! file-backed store and the remote HTTP store.

pub mod local;
pub mod remote;

pub use local::{FixtureInfo, LabelEntry, LocalStore};
pub use remote::RemoteStore;

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identity::CallArgs;

/// One persisted (arguments, result) record for a label.
///
/// Serialized pretty-printed to `<label>-<identity>.json`; hand-editable
/// and diff-friendly on purpose.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fixture {
    /// Caller-supplied label for the logical call site.
    pub name: String,
    /// Positional arguments in call order.
    pub args: Vec<Value>,
    /// Keyword arguments, keyed by name.
    pub kwargs: Map<String, Value>,
    /// Recorded result of the wrapped call.
    pub response: Value,
    /// ISO-8601 creation time. Set once when the fixture is recorded.
    pub timestamp: String,
}

impl Fixture {
    /// Build a fixture document for `label` from a call's arguments and
    /// result, timestamped now.
    pub fn new(label: &str, call: &CallArgs, response: Value) -> Self {
        Self {
            name: label.to_string(),
            args: call.args.clone(),
            kwargs: call.kwargs.clone(),
            response,
            timestamp: Local::now().to_rfc3339(),
        }
    }

    /// Rebuild the arguments this fixture was recorded with.
    pub fn call_args(&self) -> CallArgs {
        CallArgs {
            args: self.args.clone(),
            kwargs: self.kwargs.clone(),
        }
    }
}

/// Deterministic filename for a `(label, identity)` pair.
pub fn fixture_filename(label: &str, identity: &str) -> String {
    format!("{label}-{identity}.json")
}
