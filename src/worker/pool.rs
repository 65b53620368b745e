//! Worker pool: races one CPU worker per salt partition.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use tracing::{debug, info};

use crate::crypto::Address;
use crate::matcher::{FlagMask, FlagSet};

use super::cpu::{CpuWorker, Outcome, WorkerStats, DEFAULT_CHECK_INTERVAL};
use super::{CancelToken, MiningJob, Salt, SaltStream};

/// Aggregate statistics of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    /// Salts tried across all workers, including those that lost the race.
    pub attempts: u64,
    pub elapsed: Duration,
    pub workers: usize,
}

impl SearchStats {
    pub fn salts_per_second(&self) -> f64 {
        let t = self.elapsed.as_secs_f64();
        if t > 0.0 {
            self.attempts as f64 / t
        } else {
            0.0
        }
    }
}

/// A salt whose CREATE2 address carries exactly the requested flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinedSalt {
    pub salt: Salt,
    pub address: Address,
    /// Worker that found it.
    pub worker_id: usize,
    pub stats: SearchStats,
}

impl MinedSalt {
    /// Salt as hex (no 0x).
    pub fn salt_hex(&self) -> String {
        hex::encode(self.salt)
    }

    /// Flags granted by the mined address.
    pub fn flags(&self) -> FlagSet {
        FlagMask::flags_of(&self.address)
    }
}

/// Terminal result of a mining run, produced exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
    Found(MinedSalt),
    /// Cancelled by the caller before any worker matched.
    Cancelled(SearchStats),
}

impl SearchResult {
    pub fn stats(&self) -> &SearchStats {
        match self {
            SearchResult::Found(found) => &found.stats,
            SearchResult::Cancelled(stats) => stats,
        }
    }

    pub fn found(&self) -> Option<&MinedSalt> {
        match self {
            SearchResult::Found(found) => Some(found),
            SearchResult::Cancelled(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.found().is_some()
    }
}

/// Lifecycle of a mining run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Configured, no workers spawned.
    Idle,
    Searching,
    Found,
    Cancelled,
}

/// A configured run that has not started yet.
#[derive(Debug, Clone)]
pub struct Miner {
    job: MiningJob,
    num_workers: usize,
    check_interval: u64,
}

impl Miner {
    /// One worker per CPU core by default.
    pub fn new(job: MiningJob) -> Self {
        Self {
            job,
            num_workers: num_cpus::get(),
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    pub fn workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers.max(1);
        self
    }

    /// Attempts each worker makes between cancellation checks.
    pub fn check_interval(mut self, attempts: u64) -> Self {
        self.check_interval = attempts.max(1);
        self
    }

    pub fn state(&self) -> RunState {
        RunState::Idle
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Spawns the workers. `cancel` belongs to this run only.
    pub fn spawn(self, cancel: CancelToken) -> WorkerPool {
        WorkerPool::new(self.num_workers, self.check_interval, self.job, cancel)
    }

    /// Runs to completion with a fresh token.
    pub fn mine(self) -> SearchResult {
        self.mine_with(CancelToken::new())
    }

    /// Runs to completion; setting `cancel` from another thread ends the run.
    pub fn mine_with(self, cancel: CancelToken) -> SearchResult {
        self.spawn(cancel).wait()
    }
}

struct WorkerReport {
    worker_id: usize,
    outcome: Outcome,
}

pub struct WorkerPool {
    num_workers: usize,
    job: MiningJob,
    handles: Option<Vec<JoinHandle<()>>>,
    report_rx: Receiver<WorkerReport>,
    cancel: CancelToken,
    stats: Arc<WorkerStats>,
    start_time: Instant,
    reported: usize,
    attempts: u64,
    winner: Option<(usize, Salt, Address)>,
    result: Option<SearchResult>,
}

impl WorkerPool {
    fn new(num_workers: usize, check_interval: u64, job: MiningJob, cancel: CancelToken) -> Self {
        // one report per worker, so sends never block
        let (report_tx, report_rx) = bounded(num_workers);
        let stats = Arc::new(WorkerStats::new());

        debug!(workers = num_workers, check_interval, "spawning workers");
        let handles = (0..num_workers)
            .map(|id| {
                let report_tx = report_tx.clone();
                let cancel = cancel.clone();
                let stats = stats.clone();

                thread::Builder::new()
                    .name(format!("hook-miner-worker-{}", id))
                    .spawn(move || {
                        let worker = CpuWorker::new(id, job, check_interval, cancel.clone(), stats);
                        let salts = SaltStream::partition(job.salt_base, id, num_workers);
                        let outcome = worker.search(salts);
                        if matches!(outcome, Outcome::Found { .. }) {
                            cancel.cancel();
                        }
                        debug!(worker = id, attempts = outcome.attempts(), "worker stopped");
                        let _ = report_tx.send(WorkerReport {
                            worker_id: id,
                            outcome,
                        });
                    })
                    .expect("spawn worker")
            })
            .collect();

        drop(report_tx);

        Self {
            num_workers,
            job,
            handles: Some(handles),
            report_rx,
            cancel,
            stats,
            start_time: Instant::now(),
            reported: 0,
            attempts: 0,
            winner: None,
            result: None,
        }
    }

    /// Waits up to `timeout` for the run to finish.
    ///
    /// Returns `None` while workers are still searching, for callers that
    /// print progress in between. Once the run has finished every call
    /// returns the same result.
    pub fn wait_for_result(&mut self, timeout: Duration) -> Option<SearchResult> {
        if self.result.is_some() {
            return self.result;
        }

        let deadline = Instant::now() + timeout;
        while self.reported < self.num_workers {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.report_rx.recv_timeout(remaining) {
                Ok(report) => self.record(report),
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        Some(self.finish())
    }

    /// Blocks until the run finishes.
    pub fn wait(mut self) -> SearchResult {
        if let Some(result) = self.result {
            return result;
        }
        while self.reported < self.num_workers {
            match self.report_rx.recv() {
                Ok(report) => self.record(report),
                Err(_) => break,
            }
        }
        self.finish()
    }

    fn record(&mut self, report: WorkerReport) {
        self.reported += 1;
        self.attempts += report.outcome.attempts();

        if let Outcome::Found { salt, address, .. } = report.outcome {
            if self.winner.is_none() {
                self.winner = Some((report.worker_id, salt, address));
                self.cancel.cancel();
            }
        }
    }

    fn finish(&mut self) -> SearchResult {
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let _ = handle.join();
            }
        }

        let stats = SearchStats {
            attempts: self.attempts,
            elapsed: self.start_time.elapsed(),
            workers: self.num_workers,
        };
        let result = match self.winner {
            Some((worker_id, salt, address)) => {
                info!(
                    %address,
                    worker = worker_id,
                    attempts = stats.attempts,
                    elapsed_ms = stats.elapsed.as_millis() as u64,
                    "found salt"
                );
                SearchResult::Found(MinedSalt {
                    salt,
                    address,
                    worker_id,
                    stats,
                })
            }
            None => {
                info!(attempts = stats.attempts, "search cancelled");
                SearchResult::Cancelled(stats)
            }
        };
        self.result = Some(result);
        result
    }

    pub fn state(&self) -> RunState {
        match self.result {
            None => RunState::Searching,
            Some(SearchResult::Found(_)) => RunState::Found,
            Some(SearchResult::Cancelled(_)) => RunState::Cancelled,
        }
    }

    /// Requests cancellation; workers stop at their next batch boundary.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Salts tried as a multiple of the mean number needed for a match.
    /// Passing 1.0 is not a failure; the search is memoryless.
    pub fn luck(&self) -> f64 {
        self.total_salts() as f64 / self.job.mask.expected_attempts() as f64
    }

    /// Live count, updated once per batch by each worker.
    pub fn total_salts(&self) -> u64 {
        self.stats.total_salts()
    }
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
    pub fn salts_per_second(&self) -> f64 {
        let t = self.elapsed().as_secs_f64();
        if t > 0.0 {
            self.total_salts() as f64 / t
        } else {
            0.0
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let _ = handle.join();
            }
        }
    }
}
