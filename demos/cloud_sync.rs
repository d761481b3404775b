//! Team fixture sharing through the remote store.
//!
//! Needs a credential:
//!
//! ```text
//! SNAPCACHE_API_KEY=sk-... cargo run --example cloud_sync
//! ```
//!
//! Records one fixture to both tiers, then replays it. With scope `both`
//! a teammate running in replay mode pulls the same fixture down and
//! keeps a local copy.

use anyhow::Result;
use serde_json::{json, Value};
use snapcache::{config, CallArgs, Mode, Recorder, SyncScope};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("snapcache=debug")),
        )
        .init();

    let Ok(api_key) = std::env::var(config::ENV_API_KEY) else {
        eprintln!("Set {} to run this demo", config::ENV_API_KEY);
        std::process::exit(1);
    };

    let mut recorder = Recorder::from_env()?;
    recorder.configure_sync(api_key, SyncScope::Both, None)?;
    println!(
        "Syncing fixtures to {} (scope: {})\n",
        recorder.settings().api_url,
        recorder.settings().sync
    );

    let embedding: Value = recorder.snapshot(
        "embed_snippet",
        CallArgs::new()
            .arg("shared team snippet")
            .kwarg("model", "text-embedding-3-small"),
        || Ok::<_, anyhow::Error>(json!({"dims": 1536, "vector": [0.12, -0.07, 0.41]})),
    )?;
    println!("Recorded embedding with {} dims", embedding["dims"]);

    recorder.set_mode(Mode::Replay);
    let replayed: Value = recorder.snapshot(
        "embed_snippet",
        CallArgs::new()
            .arg("shared team snippet")
            .kwarg("model", "text-embedding-3-small"),
        || Ok::<_, anyhow::Error>(json!("should not run")),
    )?;
    println!("Replayed embedding with {} dims", replayed["dims"]);

    for entry in recorder.find_by_label("embed_snippet")? {
        match entry {
            snapcache::LabelEntry::Fixture { filename, identity, .. } => {
                println!("  {filename} ({identity})")
            }
            snapcache::LabelEntry::Corrupt { filename, error } => {
                println!("  {filename}: unreadable ({error})")
            }
        }
    }
    Ok(())
}
