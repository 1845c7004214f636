// src/config.rs

/// Tuning for a [`Splitter`](crate::split::Splitter). Everything that used to
/// be ambient process state lives here so tests can pin it down.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// How many parsed input files the reader keeps in memory, evicted
    /// oldest-first. 0 disables caching entirely.
    pub cache_capacity: usize,
    /// Cap on concurrent write workers. `None` derives the cap from the
    /// detected CPU count (75%, clamped to 1..=8); `Some(n)` uses `n`,
    /// raised to at least 1.
    pub max_workers: Option<usize>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 5,
            max_workers: None,
        }
    }
}
