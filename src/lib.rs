//! # hook_miner
//!
//! CREATE2 salt miner for hook contracts. A pool manager reads a hook's
//! callback permissions from the low 14 bits of its address, so deploying a
//! hook means finding a salt whose CREATE2 address carries exactly the
//! requested flags and no others.
//!
//! ## Architecture
//!
//! - `crypto`: Keccak-256, CREATE2 derivation, ABI encoding, init-code hashing
//! - `matcher`: Hook flags and the mask/value pair addresses must match
//! - `worker`: Salt streams, the per-worker search loop and the worker pool
//! - `config`: Command line configuration

pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod worker;

pub use config::Config;
pub use alloy_dyn_abi::{DynSolType, DynSolValue};
pub use crypto::{Address, ConstructorArgs};
pub use error::InputError;
pub use matcher::{FlagMask, FlagSet, HookFlag};
pub use worker::{
    CancelToken, MinedSalt, Miner, MiningJob, RunState, SaltBase, SearchResult, SearchStats,
    WorkerPool,
};

/// The deterministic deployment proxy used by Foundry scripts.
/// See: https://github.com/Arachnid/deterministic-deployment-proxy
pub const CREATE2_DEFAULT_FACTORY: Address = Address([
    0x4e, 0x59, 0xb4, 0x48, 0x47, 0xb3, 0x79, 0x57, 0x85, 0x88, 0x92, 0x0c, 0xa7, 0x8f, 0xbf, 0x26,
    0xc0, 0xb4, 0x95, 0x6c,
]);

/// Everything a caller supplies to mine a hook address.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningRequest {
    pub flags: FlagSet,
    /// Creation bytecode, without constructor arguments.
    pub bytecode: Vec<u8>,
    pub constructor_args: ConstructorArgs,
    pub factory: Address,
    pub salt_base: SaltBase,
}

impl MiningRequest {
    /// A request against the default factory with no constructor arguments.
    pub fn new(flags: FlagSet, bytecode: Vec<u8>) -> Self {
        Self {
            flags,
            bytecode,
            constructor_args: ConstructorArgs::new(),
            factory: CREATE2_DEFAULT_FACTORY,
            salt_base: SaltBase::zero(),
        }
    }

    pub fn with_constructor_args(mut self, args: ConstructorArgs) -> Self {
        self.constructor_args = args;
        self
    }

    pub fn with_factory(mut self, factory: Address) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_salt_base(mut self, salt_base: SaltBase) -> Self {
        self.salt_base = salt_base;
        self
    }

    /// Hashes the init code and encodes the flags. Fails on malformed
    /// constructor arguments, before any salt is tried.
    pub fn prepare(&self) -> Result<MiningJob, InputError> {
        let init_code_hash = crypto::init_code_hash(&self.bytecode, &self.constructor_args)?;
        Ok(MiningJob::new(self.factory, init_code_hash, FlagMask::encode(&self.flags))
            .with_salt_base(self.salt_base))
    }
}

/// Prepares `request` and mines it with `workers` threads until a match.
pub fn mine(request: &MiningRequest, workers: usize) -> Result<SearchResult, InputError> {
    let job = request.prepare()?;
    Ok(Miner::new(job).workers(workers).mine())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{create2_address, keccak256, parse_bytecode};
    use alloy_primitives::U256;

    #[test]
    fn test_default_factory() {
        assert_eq!(
            CREATE2_DEFAULT_FACTORY.to_checksum(),
            "0x4e59b44847b379578588920cA78FbF26c0B4956C"
        );
    }

    #[test]
    fn test_single_flag_scenario() {
        let flags: FlagSet = [HookFlag::BeforeAddLiquidity].into_iter().collect();
        let request = MiningRequest::new(flags, parse_bytecode("0x").unwrap());

        let first = mine(&request, 1).unwrap();
        let found = first.found().expect("match");
        let address = create2_address(&CREATE2_DEFAULT_FACTORY, &found.salt, &keccak256(&[]));
        assert_eq!(address, found.address);
        assert_eq!(address.low_bits() & 0x3fff, HookFlag::BeforeAddLiquidity.bit_mask());

        let second = mine(&request, 1).unwrap();
        assert_eq!(second.found().unwrap().salt, found.salt);
    }

    #[test]
    fn test_prepare_rejects_bad_args() {
        let request = MiningRequest::new(FlagSet::empty(), vec![0x60]).with_constructor_args(
            ConstructorArgs {
                types: vec![DynSolType::Uint(256), DynSolType::Bool],
                values: vec![DynSolValue::Uint(U256::from(1u64), 256)],
            },
        );
        assert_eq!(
            request.prepare().unwrap_err(),
            InputError::ArityMismatch { types: 2, values: 1 }
        );
        assert!(mine(&request, 1).is_err());
    }

    #[test]
    fn test_prepare_rejects_illegal_widths() {
        let types = [
            DynSolType::Int(0),
            DynSolType::Uint(512),
            DynSolType::Uint(12),
            DynSolType::FixedBytes(33),
        ];
        for ty in types {
            let value = match ty {
                DynSolType::Int(bits) => DynSolValue::Int(Default::default(), bits),
                DynSolType::Uint(bits) => DynSolValue::Uint(U256::from(0xfffu64), bits),
                DynSolType::FixedBytes(len) => DynSolValue::FixedBytes(Default::default(), len),
                _ => unreachable!(),
            };
            let mut args = ConstructorArgs::new();
            args.push(ty.clone(), value);
            let request =
                MiningRequest::new(FlagSet::empty(), vec![0x60]).with_constructor_args(args);
            assert!(
                matches!(request.prepare(), Err(InputError::UnknownType(_))),
                "{ty:?} was accepted"
            );
        }
    }

    #[test]
    fn test_prepare_hashes_args() {
        let mut args = ConstructorArgs::new();
        args.push(DynSolType::Address, Address::from_bytes([0x44; 20]).into());
        let request = MiningRequest::new(FlagSet::all(), vec![0x60, 0x80])
            .with_constructor_args(args.clone());

        let job = request.prepare().unwrap();
        let mut init_code = vec![0x60, 0x80];
        init_code.extend_from_slice(&args.encode().unwrap());
        assert_eq!(job.init_code_hash, keccak256(&init_code));
        assert_eq!(job.mask, FlagMask { mask: 0x3fff, value: 0x3fff });
        assert_eq!(job.factory, CREATE2_DEFAULT_FACTORY);
    }
}
