//! Hashing, address derivation and init-code preparation.
//!
//! This module provides:
//! - Keccak-256 via `tiny-keccak`
//! - The 20-byte `Address` type with EIP-55 checksums
//! - CREATE2 address derivation: `keccak256(0xff || factory || salt || initCodeHash)[12..32]`
//! - ABI encoding of constructor arguments and the init-code hash built from them

pub mod abi;
mod address;
pub mod create2;
pub mod init_code;

pub use abi::{parse_type, parse_value, ConstructorArgs};
pub use address::Address;
pub use create2::{create2_address, Create2Deriver};
pub use init_code::{init_code_hash, parse_bytecode};

use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 of arbitrary bytes (output 32 bytes).
#[inline]
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(input);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_empty() {
        assert_eq!(
            hex::encode(keccak256(&[])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }
}
