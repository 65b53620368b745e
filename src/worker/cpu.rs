//! CPU worker: walks one salt stream until a match or cancellation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::crypto::{Address, Create2Deriver};

use super::{CancelToken, MiningJob, Salt};

/// Attempts between cancellation checks.
pub const DEFAULT_CHECK_INTERVAL: u64 = 1024;

/// Live counters shared by all workers of a run.
#[derive(Debug, Default)]
pub struct WorkerStats {
    pub salts_tried: AtomicU64,
    pub matches_found: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn total_salts(&self) -> u64 {
        self.salts_tried.load(Ordering::Relaxed)
    }
    pub fn total_matches(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }
}

/// How a single worker's search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// First matching salt in stream order.
    Found {
        salt: Salt,
        address: Address,
        attempts: u64,
    },
    /// The run's token was set before this worker found anything.
    Cancelled { attempts: u64 },
    /// A finite stream ran out without a match.
    Exhausted { attempts: u64 },
}

impl Outcome {
    pub fn attempts(&self) -> u64 {
        match *self {
            Outcome::Found { attempts, .. }
            | Outcome::Cancelled { attempts }
            | Outcome::Exhausted { attempts } => attempts,
        }
    }
}

pub struct CpuWorker {
    id: usize,
    job: MiningJob,
    check_interval: u64,
    cancel: CancelToken,
    stats: Arc<WorkerStats>,
}

impl CpuWorker {
    pub fn new(
        id: usize,
        job: MiningJob,
        check_interval: u64,
        cancel: CancelToken,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            job,
            check_interval: check_interval.max(1),
            cancel,
            stats,
        }
    }

    /// Tests salts in the order `salts` yields them.
    ///
    /// The token is checked before every batch of `check_interval` attempts,
    /// so a run cancelled before it starts reports zero attempts.
    pub fn search<I>(&self, salts: I) -> Outcome
    where
        I: IntoIterator<Item = Salt>,
    {
        let mut salts = salts.into_iter();
        let mut deriver = Create2Deriver::new(&self.job.factory, &self.job.init_code_hash);
        let mask = self.job.mask;
        let mut attempts = 0u64;

        loop {
            if self.cancel.is_cancelled() {
                return Outcome::Cancelled { attempts };
            }

            let mut batch = 0u64;
            while batch < self.check_interval {
                let Some(salt) = salts.next() else {
                    self.stats.salts_tried.fetch_add(batch, Ordering::Relaxed);
                    return Outcome::Exhausted {
                        attempts: attempts + batch,
                    };
                };
                batch += 1;

                let address = deriver.derive(&salt);
                if mask.matches(&address).is_match() {
                    self.stats.salts_tried.fetch_add(batch, Ordering::Relaxed);
                    self.stats.matches_found.fetch_add(1, Ordering::Relaxed);
                    return Outcome::Found {
                        salt,
                        address,
                        attempts: attempts + batch,
                    };
                }
            }

            attempts += batch;
            self.stats.salts_tried.fetch_add(batch, Ordering::Relaxed);
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{create2_address, keccak256};
    use crate::matcher::{FlagMask, FlagSet, HookFlag};
    use crate::worker::{SaltBase, SaltStream};

    fn job(mask: FlagMask) -> MiningJob {
        let factory: Address = "0x4e59b44847b379578588920cA78FbF26c0B4956C".parse().unwrap();
        MiningJob::new(factory, keccak256(&[0x60, 0x80]), mask)
    }

    fn worker(job: MiningJob, cancel: CancelToken) -> CpuWorker {
        CpuWorker::new(0, job, 64, cancel, Arc::new(WorkerStats::new()))
    }

    /// First salt in the sequential stream whose address matches.
    fn scan(job: &MiningJob) -> (Salt, Address, u64) {
        SaltStream::new(job.salt_base, 0, 1)
            .enumerate()
            .map(|(i, salt)| {
                (salt, create2_address(&job.factory, &salt, &job.init_code_hash), i as u64 + 1)
            })
            .find(|(_, address, _)| job.mask.matches(address).is_match())
            .unwrap()
    }

    #[test]
    fn test_finds_first_match_in_order() {
        let job = job(FlagMask { mask: 0x00ff, value: 0x5a });
        let (salt, address, attempts) = scan(&job);

        let outcome = worker(job, CancelToken::new()).search(SaltStream::new(job.salt_base, 0, 1));
        assert_eq!(outcome, Outcome::Found { salt, address, attempts });
    }

    #[test]
    fn test_single_flag_match() {
        let flags: FlagSet = [HookFlag::BeforeAddLiquidity].into_iter().collect();
        let job = job(FlagMask::encode(&flags));

        match worker(job, CancelToken::new()).search(SaltStream::new(job.salt_base, 0, 1)) {
            Outcome::Found { salt, address, .. } => {
                assert_eq!(address, create2_address(&job.factory, &salt, &job.init_code_hash));
                assert_eq!(address.low_bits() & 0x3fff, 1 << 11);
                assert_eq!(FlagMask::flags_of(&address), flags);
            }
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let job = job(FlagMask { mask: 0x00ff, value: 0x5a });
        let outcome = worker(job, cancel).search(SaltStream::new(job.salt_base, 0, 1));
        assert_eq!(outcome, Outcome::Cancelled { attempts: 0 });
    }

    #[test]
    fn test_exhausted_finite_stream() {
        let job = job(FlagMask::encode(&FlagSet::all()));
        let stats = Arc::new(WorkerStats::new());
        let w = CpuWorker::new(0, job, 16, CancelToken::new(), stats.clone());
        // stop short of the first match
        let (_, _, first_hit) = scan(&job);
        let end = (first_hit - 1).min(40);
        let salts = SaltStream::new(SaltBase::zero(), 0, 1).take(end as usize);
        assert_eq!(w.search(salts), Outcome::Exhausted { attempts: end });
        assert_eq!(stats.total_salts(), end);
    }

    #[test]
    fn test_stats_count_every_attempt() {
        let job = job(FlagMask { mask: 0x00ff, value: 0x5a });
        let stats = Arc::new(WorkerStats::new());
        let w = CpuWorker::new(3, job, 7, CancelToken::new(), stats.clone());
        let outcome = w.search(SaltStream::new(job.salt_base, 0, 1));
        assert_eq!(stats.total_salts(), outcome.attempts());
        assert_eq!(stats.total_matches(), 1);
        assert_eq!(w.id(), 3);
    }
}
