// config.rs — tuning knobs for model assembly and batched queries
//
// Nothing here changes trace results. Numeric epsilons are constants in the
// modules that use them.

/// Parallel threshold for table processing - below this count, sequential is faster
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

/// Leaf cap for position tests and box contents queries.
pub const DEFAULT_MAX_POSITION_LEAFS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CollisionConfig {
    /// Table sizes at or above this use rayon during model assembly and in
    /// `point_contents_many`.
    pub parallel_threshold: usize,
    /// Maximum number of leaves gathered when a zero-length trace or a box
    /// contents query enumerates the leaves around a box.
    pub max_position_leafs: usize,
}

impl CollisionConfig {
    pub fn new() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            max_position_leafs: DEFAULT_MAX_POSITION_LEAFS,
        }
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn with_max_position_leafs(mut self, max: usize) -> Self {
        self.max_position_leafs = max;
        self
    }

    #[inline]
    pub(crate) fn use_parallel(&self, count: usize) -> bool {
        count >= self.parallel_threshold
    }
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = CollisionConfig::default();
        assert_eq!(cfg.parallel_threshold, 64);
        assert_eq!(cfg.max_position_leafs, 1024);
        assert!(!cfg.use_parallel(63));
        assert!(cfg.use_parallel(64));
    }

    #[test]
    fn test_builders() {
        let cfg = CollisionConfig::new()
            .with_parallel_threshold(1)
            .with_max_position_leafs(8);
        assert!(cfg.use_parallel(1));
        assert_eq!(cfg.max_position_leafs, 8);
    }
}
