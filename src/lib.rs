//! Record and replay the results of expensive calls.
//!
//! snapcache memoizes slow or costly operations (LLM completions,
//! embeddings, scraping) behind a single [`Recorder::snapshot`] call.
//! The first run records each result as a JSON fixture on disk; replay
//! runs serve those fixtures back instantly and for free, falling back
//! to a live call (which is then recorded) whenever a fixture is
//! missing.
//!
//! Fixtures live in `./fixtures` as one pretty-printed file per call,
//! named `<label>-<identity>.json`, where the identity is a 16-hex-char
//! digest of the call's arguments. An optional remote store shares
//! fixtures across a team; the local tier always wins on lookup.
//!
//! ```no_run
//! use snapcache::{CallArgs, Recorder, Settings};
//!
//! let recorder = Recorder::new(Settings::default());
//! let answer: String = recorder.snapshot(
//!     "capital_question",
//!     CallArgs::new().arg("What is the capital of France?").kwarg("model", "gpt-4"),
//!     || Ok::<_, std::io::Error>("Paris".to_string()),
//! )?;
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! Set `SNAPCACHE_MODE=replay` and rebuild nothing: the same code now
//! serves every recorded call from disk.

pub mod config;
pub mod error;
pub mod identity;
pub mod inspect;
pub mod recorder;
pub mod store;

pub use config::{Mode, Settings, SyncScope};
pub use error::{Result, SnapError};
pub use identity::CallArgs;
pub use inspect::Stats;
pub use recorder::Recorder;
pub use store::{Fixture, FixtureInfo, LabelEntry, LocalStore, RemoteStore};
