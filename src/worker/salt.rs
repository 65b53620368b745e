//! Deterministic salt enumeration.
//!
//! Salt layout (32 bytes):
//! - Bytes 0-23: fixed base (zero by default; may carry a deployer address
//!   and a random session segment)
//! - Bytes 24-31: big-endian `u64` counter, the only part a worker varies

use rand::RngCore;

use crate::crypto::Address;

pub type Salt = [u8; 32];

/// Offset of the counter within the salt.
pub const COUNTER_OFFSET: usize = 24;

/// Builds the fixed part of the salt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaltBase([u8; COUNTER_OFFSET]);

impl SaltBase {
    /// All-zero base: salts are plain integers.
    pub const fn zero() -> Self {
        Self([0u8; COUNTER_OFFSET])
    }

    /// Writes `deployer` into bytes 0-19. Factories that check
    /// `msg.sender` against the salt prefix reject anyone else's deployment.
    pub fn with_deployer(mut self, deployer: &Address) -> Self {
        self.0[..20].copy_from_slice(deployer.as_bytes());
        self
    }

    /// Fills bytes 20-23 with random values so separate sessions do not
    /// retrace each other's salts.
    pub fn with_random_segment(mut self) -> Self {
        rand::thread_rng().fill_bytes(&mut self.0[20..]);
        self
    }

    pub fn as_bytes(&self) -> &[u8; COUNTER_OFFSET] {
        &self.0
    }

    /// The salt for a given counter value.
    #[inline]
    pub fn salt(&self, counter: u64) -> Salt {
        let mut salt = [0u8; 32];
        salt[..COUNTER_OFFSET].copy_from_slice(&self.0);
        salt[COUNTER_OFFSET..].copy_from_slice(&counter.to_be_bytes());
        salt
    }
}

/// Salts `start, start + step, start + 2 * step, ...` over a fixed base.
///
/// Strictly increasing counters, so a stream never repeats a salt. Ends when
/// the counter would overflow.
#[derive(Debug, Clone)]
pub struct SaltStream {
    base: SaltBase,
    next: Option<u64>,
    step: u64,
}

impl SaltStream {
    pub fn new(base: SaltBase, start: u64, step: u64) -> Self {
        Self {
            base,
            next: Some(start),
            step: step.max(1),
        }
    }

    /// Worker `worker_id` of `workers` takes every counter congruent to
    /// `worker_id` modulo `workers`. The union over all workers covers each
    /// counter exactly once.
    pub fn partition(base: SaltBase, worker_id: usize, workers: usize) -> Self {
        Self::new(base, worker_id as u64, workers.max(1) as u64)
    }
}

impl Iterator for SaltStream {
    type Item = Salt;

    #[inline]
    fn next(&mut self) -> Option<Salt> {
        let counter = self.next?;
        self.next = counter.checked_add(self.step);
        Some(self.base.salt(counter))
    }
}
