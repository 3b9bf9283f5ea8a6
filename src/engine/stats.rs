// Transfer statistics: counts and volumes of provider pipe transfers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone)]
pub struct TransferStatsSnapshot {
    pub started: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub failed: u64,
    pub bytes_streamed: u64,
    pub last_elapsed: Option<Duration>,
    /// Throughput of the last completed transfer.
    pub last_bps: u64,
}

impl TransferStatsSnapshot {
    pub fn in_flight(&self) -> u64 {
        self.started
            .saturating_sub(self.completed + self.cancelled + self.failed)
    }
}

struct LastTransfer {
    elapsed: Duration,
    bytes: u64,
}

pub struct TransferStats {
    started: AtomicU64,
    completed: AtomicU64,
    cancelled: AtomicU64,
    failed: AtomicU64,
    bytes_streamed: AtomicU64,
    last_completed: Mutex<Option<LastTransfer>>,
}

impl TransferStats {
    pub fn new() -> Self {
        Self {
            started: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            bytes_streamed: AtomicU64::new(0),
            last_completed: Mutex::new(None),
        }
    }

    pub fn record_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished transfer that moved `bytes` in `elapsed`.
    pub fn record_transfer(&self, outcome: TransferOutcome, bytes: u64, elapsed: Duration) {
        self.bytes_streamed.fetch_add(bytes, Ordering::Relaxed);
        match outcome {
            TransferOutcome::Completed => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                *self.last_completed.lock() = Some(LastTransfer { elapsed, bytes });
            }
            TransferOutcome::Cancelled => {
                self.cancelled.fetch_add(1, Ordering::Relaxed);
            }
            TransferOutcome::Failed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn snapshot(&self) -> TransferStatsSnapshot {
        let (last_elapsed, last_bps) = match &*self.last_completed.lock() {
            Some(last) => {
                let secs = last.elapsed.as_secs_f64();
                let bps = if secs > 0.0 {
                    (last.bytes as f64 / secs) as u64
                } else {
                    0
                };
                (Some(last.elapsed), bps)
            }
            None => (None, 0),
        };

        TransferStatsSnapshot {
            started: self.started.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            bytes_streamed: self.bytes_streamed.load(Ordering::Relaxed),
            last_elapsed,
            last_bps,
        }
    }
}

impl Default for TransferStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_basic() {
        let stats = TransferStats::new();
        stats.record_started();
        stats.record_started();
        stats.record_started();

        stats.record_transfer(TransferOutcome::Completed, 1000, Duration::from_millis(500));
        stats.record_transfer(TransferOutcome::Cancelled, 300, Duration::from_millis(10));

        let snap = stats.snapshot();
        assert_eq!(snap.completed, 1);
        assert_eq!(snap.cancelled, 1);
        assert_eq!(snap.failed, 0);
        assert_eq!(snap.in_flight(), 1);
        assert_eq!(snap.bytes_streamed, 1300);
        assert_eq!(snap.last_elapsed, Some(Duration::from_millis(500)));
        assert_eq!(snap.last_bps, 2000);
    }
}
