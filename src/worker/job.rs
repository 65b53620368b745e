use crate::crypto::Address;
use crate::matcher::FlagMask;

use super::SaltBase;

/// Read-only inputs of one mining run. Every worker gets its own copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningJob {
    /// Factory that performs the CREATE2 deployment.
    pub factory: Address,
    /// keccak256 of creation code plus encoded constructor arguments.
    pub init_code_hash: [u8; 32],
    /// Required low-order address bits.
    pub mask: FlagMask,
    /// Fixed salt bytes shared by all workers.
    pub salt_base: SaltBase,
}

impl MiningJob {
    pub fn new(factory: Address, init_code_hash: [u8; 32], mask: FlagMask) -> Self {
        Self {
            factory,
            init_code_hash,
            mask,
            salt_base: SaltBase::zero(),
        }
    }

    pub fn with_salt_base(mut self, salt_base: SaltBase) -> Self {
        self.salt_base = salt_base;
        self
    }
}
