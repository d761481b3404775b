//! Call-argument capture and fixture identity derivation.
//!
//! A fixture identity is the first 16 hex characters of the SHA-256 digest
//! of a call's arguments in canonical JSON form:
//!
//! ```text
//! {"args":[...],"kwargs":{...}}
//! ```
//!
//! Canonical means compact separators and keyword arguments sorted by
//! name, so the same logical call always hashes to the same identity no
//! matter what order the arguments were supplied in.

use std::fmt::Debug;

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Hex characters kept from the SHA-256 digest.
///
/// Identities are namespaced by label, so 64 bits of digest is plenty for
/// the argument space any one label sees, and the short form keeps
/// fixture filenames readable.
pub const IDENTITY_LEN: usize = 16;

/// Positional and keyword arguments of one wrapped call.
///
/// Arguments are captured as JSON values. A value that cannot be
/// serialized is captured as its `Debug` string instead, so opaque
/// handles still contribute to the identity; two handles with the same
/// `Debug` output are indistinguishable to the cache.
///
/// ```
/// use snapcache::CallArgs;
///
/// let call = CallArgs::new()
///     .arg("What is Rust?")
///     .kwarg("model", "gpt-4")
///     .kwarg("temperature", 0.7);
/// assert_eq!(call.identity().len(), 16);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    /// Positional arguments in call order.
    pub args: Vec<Value>,
    /// Keyword arguments, sorted by name.
    pub kwargs: Map<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg<T: Serialize + Debug>(mut self, value: T) -> Self {
        self.args.push(to_value_lossy(&value));
        self
    }

    /// Set a keyword argument. Setting the same name twice keeps the
    /// last value.
    pub fn kwarg<T: Serialize + Debug>(mut self, name: &str, value: T) -> Self {
        self.kwargs.insert(name.to_string(), to_value_lossy(&value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Derive the fixture identity for these arguments.
    pub fn identity(&self) -> String {
        derive(self)
    }
}

fn to_value_lossy<T: Serialize + Debug>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|_| Value::String(format!("{value:?}")))
}

#[derive(Serialize)]
struct Canonical<'a> {
    args: &'a [Value],
    kwargs: &'a Map<String, Value>,
}

/// Derive the 16-hex-character identity for a call.
///
/// Deterministic across processes and platforms: object keys serialize
/// in sorted order and the output is compact JSON.
pub fn derive(call: &CallArgs) -> String {
    let canonical = Canonical {
        args: &call.args,
        kwargs: &call.kwargs,
    };
    // A Value tree with string keys always serializes.
    let text = serde_json::to_string(&canonical).expect("canonical form serializes");
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())[..IDENTITY_LEN].to_string()
}
