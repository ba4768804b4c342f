//! Runtime configuration for the search drivers (§2.1, §5): worker-pool
//! size, transposition-table size, MCTS arena capacity, and node/time
//! budgets, gathered into one small surface passed to a driver at
//! construction rather than threaded through every call.

/// Default worker count recommended by §5; `clamp_workers` enforces the
/// documented maximum regardless of what a caller requests.
pub const DEFAULT_WORKERS: usize = 6;
pub const MAX_WORKERS: usize = 16;

/// Default MCTS per-worker arena capacity (§4.7).
pub const DEFAULT_MCTS_ARENA_CAPACITY: usize = 10_000_000;

/// Default transposition table size; `0` disables the table entirely
/// (§4.6.2).
pub const DEFAULT_TT_SIZE_MB: usize = 64;

fn clamp_workers(requested: usize) -> usize {
    requested.clamp(1, MAX_WORKERS)
}

/// Shared knobs both search drivers are built from.
#[derive(Clone, Copy, Debug)]
pub struct SearchConfig {
    pub workers: usize,
    pub tt_size_mb: usize,
    pub mcts_arena_capacity: usize,
}

impl SearchConfig {
    #[must_use]
    pub fn new(workers: usize, tt_size_mb: usize, mcts_arena_capacity: usize) -> Self {
        SearchConfig { workers: clamp_workers(workers), tt_size_mb, mcts_arena_capacity }
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = clamp_workers(workers);
        self
    }

    #[must_use]
    pub fn with_tt_size_mb(mut self, tt_size_mb: usize) -> Self {
        self.tt_size_mb = tt_size_mb;
        self
    }

    #[must_use]
    pub fn with_mcts_arena_capacity(mut self, capacity: usize) -> Self {
        self.mcts_arena_capacity = capacity;
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            workers: DEFAULT_WORKERS,
            tt_size_mb: DEFAULT_TT_SIZE_MB,
            mcts_arena_capacity: DEFAULT_MCTS_ARENA_CAPACITY,
        }
    }
}

/// Top-level engine configuration; currently just wraps `SearchConfig`,
/// kept as a separate type so a future config surface (e.g. eval weight
/// presets) has somewhere to live without widening `SearchConfig`'s role.
#[derive(Clone, Copy, Debug, Default)]
pub struct EngineConfig {
    pub search: SearchConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_count_is_clamped_to_the_documented_maximum() {
        let cfg = SearchConfig::default().with_workers(64);
        assert_eq!(cfg.workers, MAX_WORKERS);
    }

    #[test]
    fn zero_workers_is_clamped_up_to_one() {
        let cfg = SearchConfig::default().with_workers(0);
        assert_eq!(cfg.workers, 1);
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = SearchConfig::default();
        assert_eq!(cfg.workers, DEFAULT_WORKERS);
        assert_eq!(cfg.mcts_arena_capacity, DEFAULT_MCTS_ARENA_CAPACITY);
    }
}
