use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct CacheStat {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub size: usize,
}

impl CacheStat {
    pub fn new(hits: u64, misses: u64, size: usize) -> Self {
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };
        Self {
            hits,
            misses,
            hit_rate,
            size,
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub factory: CacheStat,
    pub fetch: CacheStat,
    pub compilations: u64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Cache Statistics:")?;
        writeln!(f, "  Factory Cache:  {}", self.factory)?;
        writeln!(f, "  Fetch Cache:    {}", self.fetch)?;
        writeln!(f, "  Compilations:   {:>8}", self.compilations)?;
        Ok(())
    }
}

impl std::fmt::Display for CacheStat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hits: {:>8}, misses: {:>8}, hit_rate: {:>6.2}%, size: {:>8}",
            self.hits,
            self.misses,
            self.hit_rate * 100.0,
            self.size
        )
    }
}

/// Resolution counters.
///
/// All counters use `Ordering::Relaxed`; they are independent and only need
/// to be updated atomically.
#[derive(Debug, Default)]
pub struct ResolutionMetrics {
    pub factory_cache_hits: AtomicU64,
    pub factory_cache_misses: AtomicU64,
}

impl ResolutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_factory_cache_hit(&self) {
        self.factory_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_factory_cache_miss(&self) {
        self.factory_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_statistics(&self, factory_size: usize, fetch: CacheStat, compilations: u64) -> CacheStats {
        CacheStats {
            factory: CacheStat::new(
                self.factory_cache_hits.load(Ordering::Relaxed),
                self.factory_cache_misses.load(Ordering::Relaxed),
                factory_size,
            ),
            fetch,
            compilations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        assert_eq!(CacheStat::new(0, 0, 0).hit_rate, 0.0);
        assert_eq!(CacheStat::new(3, 1, 2).hit_rate, 0.75);
    }

    #[test]
    fn test_statistics_serialize() {
        let metrics = ResolutionMetrics::new();
        metrics.record_factory_cache_miss();
        metrics.record_factory_cache_hit();
        let stats = metrics.cache_statistics(1, CacheStat::new(0, 1, 1), 2);
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["factory"]["hits"], 1);
        assert_eq!(json["compilations"], 2);
        assert!(stats.to_string().contains("Factory Cache:"));
    }
}
