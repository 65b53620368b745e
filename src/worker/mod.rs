//! Salt search: per-worker CPU loop and the pool that runs workers in parallel.
//!
//! This module provides:
//! - Disjoint, deterministic salt streams (one partition per worker)
//! - A per-run cancellation token shared by all workers
//! - Result aggregation and run statistics

mod cancel;
mod cpu;
mod job;
mod pool;
mod salt;

pub use cancel::CancelToken;
pub use cpu::{CpuWorker, Outcome, WorkerStats, DEFAULT_CHECK_INTERVAL};
pub use job::MiningJob;
pub use pool::{MinedSalt, Miner, RunState, SearchResult, SearchStats, WorkerPool};
pub use salt::{Salt, SaltBase, SaltStream, COUNTER_OFFSET};
