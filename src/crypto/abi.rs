//! Solidity ABI encoding for constructor arguments.
//!
//! Types and values are `alloy-dyn-abi`'s `DynSolType`/`DynSolValue`. This
//! module adds the checks a constructor payload needs before it is hashed:
//! matching arity, matching kinds, legal widths and in-range values. The
//! encoded output is what `abi.encode(args...)` produces.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::I256;

use crate::error::InputError;

use super::Address;

/// Parses a Solidity type name such as `uint24`, `address` or `bytes32[]`.
pub fn parse_type(s: &str) -> Result<DynSolType, InputError> {
    let ty = DynSolType::parse(s.trim()).map_err(|_| InputError::UnknownType(s.to_string()))?;
    if !valid_widths(&ty) {
        return Err(InputError::UnknownType(s.to_string()));
    }
    Ok(ty)
}

/// Parses a textual value for `ty`.
///
/// Integers accept decimal or `0x` hex, byte types take hex, arrays and
/// tuples use bracket syntax (`[0x.., 0x..]`, `(1, true)`).
pub fn parse_value(ty: &DynSolType, raw: &str) -> Result<DynSolValue, InputError> {
    let value = ty.coerce_str(raw).map_err(|_| InputError::InvalidValue {
        ty: ty.sol_type_name().into_owned(),
        value: raw.to_string(),
    })?;
    check(ty, &value).map_err(|mismatch| match mismatch {
        Mismatch::Width => InputError::UnknownType(ty.sol_type_name().into_owned()),
        _ => InputError::ValueOutOfRange {
            ty: ty.sol_type_name().into_owned(),
            value: raw.trim().to_string(),
        },
    })?;
    Ok(value)
}

impl From<Address> for DynSolValue {
    fn from(addr: Address) -> Self {
        DynSolValue::Address(addr.0.into())
    }
}

/// Typed constructor argument list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstructorArgs {
    pub types: Vec<DynSolType>,
    pub values: Vec<DynSolValue>,
}

impl ConstructorArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ty: DynSolType, value: DynSolValue) {
        self.types.push(ty);
        self.values.push(value);
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.values.is_empty()
    }

    pub fn encode(&self) -> Result<Vec<u8>, InputError> {
        encode(&self.types, &self.values)
    }
}

/// `abi.encode(values...)` with each value checked against its declared type.
pub fn encode(types: &[DynSolType], values: &[DynSolValue]) -> Result<Vec<u8>, InputError> {
    if types.len() != values.len() {
        return Err(InputError::ArityMismatch {
            types: types.len(),
            values: values.len(),
        });
    }

    for (index, (ty, value)) in types.iter().zip(values).enumerate() {
        let expected = || ty.sol_type_name().into_owned();
        check(ty, value).map_err(|mismatch| match mismatch {
            Mismatch::Width => InputError::UnknownType(expected()),
            Mismatch::Kind => InputError::TypeMismatch {
                index,
                expected: expected(),
                found: value
                    .sol_type_name()
                    .map_or_else(|| "unknown".to_string(), |name| name.into_owned()),
            },
            Mismatch::Range => InputError::ValueOutOfRange {
                ty: expected(),
                value: format!("argument {index}"),
            },
        })?;
    }

    Ok(DynSolValue::Tuple(values.to_vec()).abi_encode_params())
}

enum Mismatch {
    Width,
    Kind,
    Range,
}

fn check(ty: &DynSolType, value: &DynSolValue) -> Result<(), Mismatch> {
    if !valid_widths(ty) {
        return Err(Mismatch::Width);
    }
    if !ty.matches(value) {
        return Err(Mismatch::Kind);
    }
    if !in_range(value) {
        return Err(Mismatch::Range);
    }
    Ok(())
}

/// `uintN`/`intN` need N in 8..=256 and a multiple of 8; `bytesN` needs N
/// in 1..=32. Hand-built types bypass the parser, so this is rechecked.
fn valid_widths(ty: &DynSolType) -> bool {
    match ty {
        DynSolType::Uint(bits) | DynSolType::Int(bits) => {
            (8..=256).contains(bits) && bits % 8 == 0
        }
        DynSolType::FixedBytes(len) => (1..=32).contains(len),
        DynSolType::Array(inner) | DynSolType::FixedArray(inner, _) => valid_widths(inner),
        DynSolType::Tuple(types) => types.iter().all(valid_widths),
        _ => true,
    }
}

/// Called only after `matches`, so value widths equal the (valid) type widths.
fn in_range(value: &DynSolValue) -> bool {
    match value {
        DynSolValue::Uint(v, bits) => v.bit_len() <= *bits,
        DynSolValue::Int(v, bits) => fits_signed(v, *bits),
        DynSolValue::FixedBytes(word, len) => word.0[*len..].iter().all(|&b| b == 0),
        DynSolValue::Array(values)
        | DynSolValue::FixedArray(values)
        | DynSolValue::Tuple(values) => values.iter().all(in_range),
        _ => true,
    }
}

/// All bytes above the type's width must be sign extension of its top bit.
fn fits_signed(v: &I256, bits: usize) -> bool {
    let w = v.into_raw().to_be_bytes::<32>();
    let keep = bits / 8;
    let fill = if w[32 - keep] & 0x80 != 0 { 0xff } else { 0x00 };
    w[..32 - keep].iter().all(|&b| b == fill)
}
