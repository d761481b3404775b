//! Local record/replay walkthrough.
//!
//! Run twice to see both sides of the cache:
//!
//! ```text
//! cargo run --example record_replay                    # records fixtures
//! SNAPCACHE_MODE=replay cargo run --example record_replay
//! ```
//!
//! The first run takes ~2s per call; the second is instant and works
//! offline. Fixtures land in `./fixtures` as plain JSON.

use std::time::{Duration, Instant};

use anyhow::Result;
use serde_json::{json, Value};
use snapcache::{CallArgs, Recorder};

/// Stand-in for a slow, metered API call.
fn expensive_completion(prompt: &str, model: &str) -> Value {
    std::thread::sleep(Duration::from_secs(2));
    json!({
        "model": model,
        "prompt": prompt,
        "completion": format!("A considered answer about: {prompt}"),
        "usage": {"total_tokens": 57},
    })
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("snapcache=debug")),
        )
        .init();

    let recorder = Recorder::from_env()?;
    println!("Mode: {}\n", recorder.mode());

    for prompt in ["What is RAG?", "Why is the sky blue?"] {
        let started = Instant::now();
        let answer: Value = recorder.snapshot(
            "demo_completion",
            CallArgs::new().arg(prompt).kwarg("model", "gpt-4"),
            || Ok::<_, anyhow::Error>(expensive_completion(prompt, "gpt-4")),
        )?;
        println!(
            "[{:>6.2?}] {} -> {}",
            started.elapsed(),
            prompt,
            answer["completion"]
        );
    }

    let stats = recorder.stats()?;
    println!(
        "\n{} fixtures, {} bytes, ~${:.3} saved per replay run",
        stats.count,
        stats.total_size_bytes,
        stats.estimated_savings(recorder.settings().estimated_cost)
    );
    Ok(())
}
