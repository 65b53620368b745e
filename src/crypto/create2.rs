//! CREATE2 address computation (EIP-1014).
//!
//! Preimage: 0xff (1) || factory (20) || salt (32) || init_code_hash (32) = 85 bytes.
//! Address = keccak256(preimage)[12..32].

use super::{keccak256, Address};

const PREIMAGE_LEN: usize = 85;
const SALT_OFFSET: usize = 21;
const HASH_OFFSET: usize = 53;

/// Computes the address a CREATE2 deployment from `factory` would produce.
pub fn create2_address(factory: &Address, salt: &[u8; 32], init_code_hash: &[u8; 32]) -> Address {
    let mut preimage = [0u8; PREIMAGE_LEN];
    preimage[0] = 0xff;
    preimage[1..SALT_OFFSET].copy_from_slice(factory.as_bytes());
    preimage[SALT_OFFSET..HASH_OFFSET].copy_from_slice(salt);
    preimage[HASH_OFFSET..].copy_from_slice(init_code_hash);
    address_from_preimage(&preimage)
}

#[inline]
fn address_from_preimage(preimage: &[u8; PREIMAGE_LEN]) -> Address {
    let hash = keccak256(preimage);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    Address::from_bytes(addr)
}

/// CREATE2 derivation with a reusable preimage.
///
/// The factory and init-code hash are written once; each call only copies
/// the salt in before hashing.
#[derive(Clone)]
pub struct Create2Deriver {
    preimage: [u8; PREIMAGE_LEN],
}

impl Create2Deriver {
    pub fn new(factory: &Address, init_code_hash: &[u8; 32]) -> Self {
        let mut preimage = [0u8; PREIMAGE_LEN];
        preimage[0] = 0xff;
        preimage[1..SALT_OFFSET].copy_from_slice(factory.as_bytes());
        preimage[HASH_OFFSET..].copy_from_slice(init_code_hash);
        Self { preimage }
    }

    #[inline]
    pub fn derive(&mut self, salt: &[u8; 32]) -> Address {
        self.preimage[SALT_OFFSET..HASH_OFFSET].copy_from_slice(salt);
        address_from_preimage(&self.preimage)
    }
}
