//! Content-addressed cache of solved coefficients.
//!
//! Re-solving is triggered on every relevant edit, but many edits (renames,
//! undo/redo back to a previous state, edits to non-participating points)
//! leave the participating pairs unchanged. [`CoefficientCache`] keys each
//! solve by a hash of the ordered pair positions and the solver flags so
//! such edits are free.

use crate::{SolverResult, TpsCoefficients, TpsSolverInputs, solve_pairs};
use hashbrown::HashMap;
use std::collections::VecDeque;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use tracing::debug;
use warp_types::LandmarkPair;

/// Hashes an ordered pair sequence together with the solver flags.
///
/// Coordinates are hashed by bit pattern, so `0.0` and `-0.0` hash
/// differently. Reordering the pairs changes the hash.
#[must_use]
pub fn content_hash(pairs: &[LandmarkPair], inputs: &TpsSolverInputs) -> u64 {
    let mut hasher = DefaultHasher::new();
    pairs.len().hash(&mut hasher);
    for pair in pairs {
        for c in pair.source.coords.iter().chain(pair.destination.coords.iter()) {
            c.to_bits().hash(&mut hasher);
        }
    }
    inputs.hash(&mut hasher);
    hasher.finish()
}

/// Configuration for [`CoefficientCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of solves retained. Oldest entries are evicted first.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 16 }
    }
}

/// Cache of solve results keyed by [`content_hash`].
///
/// Failed solves are cached too, so an unchanged ill-conditioned pair set
/// is not re-factored on every poll.
#[derive(Debug, Default)]
pub struct CoefficientCache {
    entries: HashMap<u64, SolverResult<Arc<TpsCoefficients>>>,
    order: VecDeque<u64>,
    config: CacheConfig,
    hits: u64,
    misses: u64,
}

impl CoefficientCache {
    /// Creates an empty cache with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache with the given configuration.
    #[must_use]
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the cached result for `pairs`, solving on a miss.
    ///
    /// # Errors
    ///
    /// Returns the (possibly cached) solver error for `pairs`.
    pub fn get_or_solve(
        &mut self,
        pairs: &[LandmarkPair],
        inputs: &TpsSolverInputs,
    ) -> SolverResult<Arc<TpsCoefficients>> {
        let key = content_hash(pairs, inputs);
        if let Some(cached) = self.entries.get(&key) {
            self.hits += 1;
            return cached.clone();
        }

        self.misses += 1;
        debug!(key, pairs = pairs.len(), "Coefficient cache miss");
        let result = solve_pairs(pairs, inputs).map(Arc::new);
        self.insert(key, result.clone());
        result
    }

    /// Returns the cached result for a key without solving.
    #[must_use]
    pub fn get(&self, key: u64) -> Option<&SolverResult<Arc<TpsCoefficients>>> {
        self.entries.get(&key)
    }

    /// Stores an externally computed result (e.g. from a background worker).
    pub fn insert(&mut self, key: u64, result: SolverResult<Arc<TpsCoefficients>>) {
        if self.entries.insert(key, result).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > self.config.max_entries.max(1) {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    /// Drops every cached entry.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups answered from the cache.
    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of lookups that required a solve.
    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::SolverError;
    use nalgebra::Point3;

    fn pairs(offset: f64) -> Vec<LandmarkPair> {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ]
        .into_iter()
        .map(|s| LandmarkPair::new(s, s + nalgebra::Vector3::new(offset, 0.0, 0.0)))
        .collect()
    }

    #[test]
    fn test_hash_depends_on_order() {
        let a = pairs(1.0);
        let mut b = a.clone();
        b.swap(0, 1);
        let inputs = TpsSolverInputs::default();
        assert_ne!(content_hash(&a, &inputs), content_hash(&b, &inputs));
        assert_eq!(content_hash(&a, &inputs), content_hash(&a.clone(), &inputs));
    }

    #[test]
    fn test_hash_depends_on_inputs() {
        let a = pairs(1.0);
        assert_ne!(
            content_hash(&a, &TpsSolverInputs::default()),
            content_hash(&a, &TpsSolverInputs::affine_only())
        );
    }

    #[test]
    fn test_same_pairs_share_arc() {
        let mut cache = CoefficientCache::new();
        let inputs = TpsSolverInputs::default();
        let first = cache.get_or_solve(&pairs(1.0), &inputs).unwrap();
        let second = cache.get_or_solve(&pairs(1.0), &inputs).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_changed_pairs_resolve() {
        let mut cache = CoefficientCache::new();
        let inputs = TpsSolverInputs::default();
        let first = cache.get_or_solve(&pairs(1.0), &inputs).unwrap();
        let second = cache.get_or_solve(&pairs(2.0), &inputs).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_errors_are_cached() {
        let mut cache = CoefficientCache::new();
        let inputs = TpsSolverInputs::default();
        let short = &pairs(1.0)[..2];
        let first = cache.get_or_solve(short, &inputs);
        let second = cache.get_or_solve(short, &inputs);
        assert!(matches!(first, Err(SolverError::UnderdeterminedSystem { .. })));
        assert_eq!(first, second);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_eviction_and_invalidate() {
        let mut cache = CoefficientCache::with_config(CacheConfig { max_entries: 2 });
        let inputs = TpsSolverInputs::default();
        for i in 0..4 {
            let _ = cache.get_or_solve(&pairs(f64::from(i)), &inputs);
        }
        assert_eq!(cache.len(), 2);
        let oldest = content_hash(&pairs(0.0), &inputs);
        assert!(cache.get(oldest).is_none());

        cache.invalidate();
        assert!(cache.is_empty());
    }
}
