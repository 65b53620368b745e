//! Init-code hash: keccak256(creationCode || abi.encode(constructorArgs)).

use crate::error::InputError;

use super::{keccak256, ConstructorArgs};

/// Decodes creation bytecode from hex. `0x` and the empty string are valid
/// and mean empty bytecode.
pub fn parse_bytecode(hex_str: &str) -> Result<Vec<u8>, InputError> {
    let trimmed = hex_str.trim();
    let h = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(h).map_err(|e| InputError::hex("bytecode", e))
}

/// Hashes the full creation payload. Fails if the arguments do not match
/// their declared types.
pub fn init_code_hash(bytecode: &[u8], args: &ConstructorArgs) -> Result<[u8; 32], InputError> {
    let encoded = args.encode()?;
    if encoded.is_empty() {
        return Ok(keccak256(bytecode));
    }
    let mut init_code = Vec::with_capacity(bytecode.len() + encoded.len());
    init_code.extend_from_slice(bytecode);
    init_code.extend_from_slice(&encoded);
    Ok(keccak256(&init_code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_dyn_abi::{DynSolType, DynSolValue};
    use alloy_primitives::U256;

    #[test]
    fn test_empty_bytecode() {
        assert!(parse_bytecode("0x").unwrap().is_empty());
        assert!(parse_bytecode("").unwrap().is_empty());
        let hash = init_code_hash(&[], &ConstructorArgs::new()).unwrap();
        assert_eq!(hash, keccak256(&[]));
    }

    #[test]
    fn test_malformed_bytecode() {
        assert!(matches!(
            parse_bytecode("0x6080zz"),
            Err(InputError::InvalidHex { what: "bytecode", .. })
        ));
        assert!(parse_bytecode("0x608").is_err());
    }

    #[test]
    fn test_args_appended_before_hashing() {
        let bytecode = parse_bytecode("0x60806040").unwrap();
        let mut args = ConstructorArgs::new();
        args.push(DynSolType::Uint(256), DynSolValue::Uint(U256::from(42u64), 256));

        let mut expected = bytecode.clone();
        expected.extend_from_slice(&args.encode().unwrap());

        assert_eq!(
            init_code_hash(&bytecode, &args).unwrap(),
            keccak256(&expected)
        );
        assert_ne!(
            init_code_hash(&bytecode, &args).unwrap(),
            init_code_hash(&bytecode, &ConstructorArgs::new()).unwrap()
        );
    }

    #[test]
    fn test_bad_args_fail() {
        let args = ConstructorArgs {
            types: vec![DynSolType::Address],
            values: vec![],
        };
        assert!(init_code_hash(&[0x60], &args).is_err());
    }
}
