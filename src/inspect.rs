//! Read-only statistics over the local fixture store.

use serde::Serialize;

use crate::error::Result;
use crate::store::{FixtureInfo, LocalStore};

/// Aggregate view of the local store at one point in time.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    /// Number of readable fixtures.
    pub count: usize,
    /// Combined on-disk size of those fixtures.
    pub total_size_bytes: u64,
    /// Per-fixture metadata, sorted by filename.
    pub fixtures: Vec<FixtureInfo>,
}

impl Stats {
    /// Rough dollars saved by replaying every stored fixture once
    /// instead of making the live call.
    pub fn estimated_savings(&self, cost_per_call: f64) -> f64 {
        self.count as f64 * cost_per_call
    }
}

/// Gather statistics for every fixture in `store`. Never mutates the
/// store; an empty or missing directory reads as zero everywhere.
pub fn gather(store: &LocalStore) -> Result<Stats> {
    let fixtures = store.list_all()?;
    let total_size_bytes = fixtures.iter().map(|f| f.size_bytes).sum();
    Ok(Stats {
        count: fixtures.len(),
        total_size_bytes,
        fixtures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::CallArgs;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_stats_over_empty_store() {
        let dir = tempdir().unwrap();
        let stats = gather(&LocalStore::new(dir.path())).unwrap();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.total_size_bytes, 0);
        assert!(stats.fixtures.is_empty());
        assert_eq!(stats.estimated_savings(0.002), 0.0);
    }

    #[test]
    fn test_stats_counts_and_sizes() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        for name in ["Ann", "Bob", "Cid"] {
            let call = CallArgs::new().arg(name);
            store
                .put("greet", &call.identity(), &call, &json!(format!("Hello, {name}!")))
                .unwrap();
        }

        let stats = gather(&store).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(
            stats.total_size_bytes,
            stats.fixtures.iter().map(|f| f.size_bytes).sum::<u64>()
        );
        assert!(stats.total_size_bytes > 0);
        assert!((stats.estimated_savings(0.002) - 0.006).abs() < 1e-12);
    }
}
