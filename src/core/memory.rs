//! Heap budget tracking for memory constrained targets
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, info, warn};

const PAGE_SIZE: usize = 4096;

/// Memory monitor for a fixed heap budget
pub struct HeapMonitor {
    budget_bytes: usize,
    warning_threshold: f64, // Percentage (0.0 - 1.0)
    critical_threshold: f64,

    peak_usage: AtomicUsize,
    reclaim_count: AtomicU64,
}

impl HeapMonitor {
    /// Create a monitor with the given budget in kilobytes
    pub fn new(budget_kb: usize) -> Self {
        Self {
            budget_bytes: budget_kb.saturating_mul(1024),
            warning_threshold: 0.8,
            critical_threshold: 0.95,
            peak_usage: AtomicUsize::new(0),
            reclaim_count: AtomicU64::new(0),
        }
    }

    /// Resident set size of this process, if the platform exposes it
    pub fn resident_bytes(&self) -> Option<usize> {
        let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
        let pages: usize = statm.split_whitespace().nth(1)?.parse().ok()?;
        Some(pages * PAGE_SIZE)
    }

    /// Bytes left in the budget
    pub fn free_bytes(&self) -> usize {
        let used = self.resident_bytes().unwrap_or(0);
        self.peak_usage.fetch_max(used, Ordering::Relaxed);
        self.budget_bytes.saturating_sub(used)
    }

    /// Record a reclamation pass
    ///
    /// There is no collector to run, so this accounts the pass and reports
    /// the pressure the process is under afterwards.
    pub fn reclaim(&self) -> MemoryStatus {
        let passes = self.reclaim_count.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Memory reclaim pass {}", passes);
        self.status()
    }

    /// Classify current usage against the thresholds
    pub fn status(&self) -> MemoryStatus {
        let Some(used) = self.resident_bytes() else {
            return MemoryStatus::Normal;
        };
        self.peak_usage.fetch_max(used, Ordering::Relaxed);

        let usage_ratio = used as f64 / self.budget_bytes.max(1) as f64;
        if usage_ratio >= self.critical_threshold {
            warn!("Critical memory usage: {:.1}% ({} KB)", usage_ratio * 100.0, used / 1024);
            MemoryStatus::Critical
        } else if usage_ratio >= self.warning_threshold {
            info!("High memory usage: {:.1}% ({} KB)", usage_ratio * 100.0, used / 1024);
            MemoryStatus::Warning
        } else {
            MemoryStatus::Normal
        }
    }

    /// Get memory statistics
    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            budget_bytes: self.budget_bytes,
            resident_bytes: self.resident_bytes(),
            peak_usage_bytes: self.peak_usage.load(Ordering::Relaxed),
            reclaim_passes: self.reclaim_count.load(Ordering::Relaxed),
        }
    }

    /// Configure memory thresholds
    pub fn set_thresholds(&mut self, warning: f64, critical: f64) {
        self.warning_threshold = warning.clamp(0.0, 1.0);
        self.critical_threshold = critical.clamp(0.0, 1.0);

        if self.warning_threshold >= self.critical_threshold {
            self.warning_threshold = self.critical_threshold - 0.1;
        }
    }
}

/// Memory usage status
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryStatus {
    Normal,
    Warning,
    Critical,
}

/// Memory usage statistics
#[derive(Debug, Clone)]
pub struct MemoryStats {
    pub budget_bytes: usize,
    pub resident_bytes: Option<usize>,
    pub peak_usage_bytes: usize,
    pub reclaim_passes: u64,
}

impl MemoryStats {
    /// Get current usage as a fraction of the budget
    pub fn usage_ratio(&self) -> f64 {
        match (self.resident_bytes, self.budget_bytes) {
            (_, 0) | (None, _) => 0.0,
            (Some(used), budget) => used as f64 / budget as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitor_creation() {
        let monitor = HeapMonitor::new(512);
        let stats = monitor.stats();

        assert_eq!(stats.budget_bytes, 512 * 1024);
        assert_eq!(stats.reclaim_passes, 0);
    }

    #[test]
    fn test_huge_budget_saturates() {
        let monitor = HeapMonitor::new(usize::MAX);
        assert_eq!(monitor.stats().budget_bytes, usize::MAX);
        assert!(monitor.free_bytes() > 0);
    }

    #[test]
    fn test_reclaim_counts() {
        let monitor = HeapMonitor::new(1024 * 1024);
        monitor.reclaim();
        monitor.reclaim();

        assert_eq!(monitor.stats().reclaim_passes, 2);
    }

    #[test]
    fn test_free_bytes_within_budget() {
        let monitor = HeapMonitor::new(64);
        assert!(monitor.free_bytes() <= 64 * 1024);
    }

    #[test]
    fn test_thresholds_ordered() {
        let mut monitor = HeapMonitor::new(64);
        monitor.set_thresholds(0.9, 0.5);
        assert!(monitor.warning_threshold < monitor.critical_threshold);
    }

    #[test]
    fn test_usage_ratio() {
        let stats = MemoryStats {
            budget_bytes: 1000,
            resident_bytes: Some(250),
            peak_usage_bytes: 250,
            reclaim_passes: 0,
        };
        assert!((stats.usage_ratio() - 0.25).abs() < f64::EPSILON);

        let unknown = MemoryStats { resident_bytes: None, ..stats };
        assert_eq!(unknown.usage_ratio(), 0.0);
    }
}
