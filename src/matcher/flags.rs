//! Hook permission flags and the mask/value pair a mined address must match.
//!
//! A hook's permissions are read from the lowest 14 bits of its address.
//! Bit positions follow Uniswap v4 `Hooks.sol`.

use std::fmt;
use std::str::FromStr;

use crate::crypto::Address;
use crate::error::InputError;

/// A single hook callback permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookFlag {
    BeforeInitialize,
    AfterInitialize,
    BeforeAddLiquidity,
    AfterAddLiquidity,
    BeforeRemoveLiquidity,
    AfterRemoveLiquidity,
    BeforeSwap,
    AfterSwap,
    BeforeDonate,
    AfterDonate,
    BeforeSwapReturnsDelta,
    AfterSwapReturnsDelta,
    AfterAddLiquidityReturnsDelta,
    AfterRemoveLiquidityReturnsDelta,
}

impl HookFlag {
    /// Every flag, highest bit first.
    pub const ALL: [HookFlag; 14] = [
        HookFlag::BeforeInitialize,
        HookFlag::AfterInitialize,
        HookFlag::BeforeAddLiquidity,
        HookFlag::AfterAddLiquidity,
        HookFlag::BeforeRemoveLiquidity,
        HookFlag::AfterRemoveLiquidity,
        HookFlag::BeforeSwap,
        HookFlag::AfterSwap,
        HookFlag::BeforeDonate,
        HookFlag::AfterDonate,
        HookFlag::BeforeSwapReturnsDelta,
        HookFlag::AfterSwapReturnsDelta,
        HookFlag::AfterAddLiquidityReturnsDelta,
        HookFlag::AfterRemoveLiquidityReturnsDelta,
    ];

    /// Bit position in the address, counted from the least significant bit.
    pub const fn bit(self) -> u8 {
        match self {
            HookFlag::BeforeInitialize => 13,
            HookFlag::AfterInitialize => 12,
            HookFlag::BeforeAddLiquidity => 11,
            HookFlag::AfterAddLiquidity => 10,
            HookFlag::BeforeRemoveLiquidity => 9,
            HookFlag::AfterRemoveLiquidity => 8,
            HookFlag::BeforeSwap => 7,
            HookFlag::AfterSwap => 6,
            HookFlag::BeforeDonate => 5,
            HookFlag::AfterDonate => 4,
            HookFlag::BeforeSwapReturnsDelta => 3,
            HookFlag::AfterSwapReturnsDelta => 2,
            HookFlag::AfterAddLiquidityReturnsDelta => 1,
            HookFlag::AfterRemoveLiquidityReturnsDelta => 0,
        }
    }

    #[inline]
    pub const fn bit_mask(self) -> u16 {
        1 << self.bit()
    }

    /// Constant name as used in Solidity, e.g. `BEFORE_SWAP`.
    pub const fn name(self) -> &'static str {
        match self {
            HookFlag::BeforeInitialize => "BEFORE_INITIALIZE",
            HookFlag::AfterInitialize => "AFTER_INITIALIZE",
            HookFlag::BeforeAddLiquidity => "BEFORE_ADD_LIQUIDITY",
            HookFlag::AfterAddLiquidity => "AFTER_ADD_LIQUIDITY",
            HookFlag::BeforeRemoveLiquidity => "BEFORE_REMOVE_LIQUIDITY",
            HookFlag::AfterRemoveLiquidity => "AFTER_REMOVE_LIQUIDITY",
            HookFlag::BeforeSwap => "BEFORE_SWAP",
            HookFlag::AfterSwap => "AFTER_SWAP",
            HookFlag::BeforeDonate => "BEFORE_DONATE",
            HookFlag::AfterDonate => "AFTER_DONATE",
            HookFlag::BeforeSwapReturnsDelta => "BEFORE_SWAP_RETURNS_DELTA",
            HookFlag::AfterSwapReturnsDelta => "AFTER_SWAP_RETURNS_DELTA",
            HookFlag::AfterAddLiquidityReturnsDelta => "AFTER_ADD_LIQUIDITY_RETURNS_DELTA",
            HookFlag::AfterRemoveLiquidityReturnsDelta => "AFTER_REMOVE_LIQUIDITY_RETURNS_DELTA",
        }
    }
}

/// Strips separators and case so `BEFORE_SWAP`, `before-swap` and
/// `beforeSwap` compare equal. Also folds the other Solidity spellings:
/// the `_FLAG` suffix of the `Hooks.sol` constants and the singular
/// `ReturnDelta` of the `Hooks.Permissions` fields.
fn normalize(name: &str) -> String {
    let folded: String = name
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let folded = folded.strip_suffix("flag").unwrap_or(&folded);
    folded.replace("returndelta", "returnsdelta")
}

impl FromStr for HookFlag {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s.trim());
        HookFlag::ALL
            .into_iter()
            .find(|flag| normalize(flag.name()) == wanted)
            .ok_or_else(|| InputError::UnknownFlag(s.to_string()))
    }
}

impl fmt::Display for HookFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of requested hook flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FlagSet(u16);

impl FlagSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        Self(ALL_HOOK_MASK)
    }

    /// Builds a set from raw address bits. Returns `None` if any bit outside
    /// the flag domain is set.
    pub const fn from_bits(bits: u16) -> Option<Self> {
        if bits & !ALL_HOOK_MASK == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    pub const fn bits(&self) -> u16 {
        self.0
    }

    pub fn insert(&mut self, flag: HookFlag) {
        self.0 |= flag.bit_mask();
    }

    pub const fn contains(&self, flag: HookFlag) -> bool {
        self.0 & flag.bit_mask() != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Flags in the set, highest bit first.
    pub fn iter(&self) -> impl Iterator<Item = HookFlag> + '_ {
        HookFlag::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl FromIterator<HookFlag> for FlagSet {
    fn from_iter<I: IntoIterator<Item = HookFlag>>(iter: I) -> Self {
        let mut set = FlagSet::empty();
        for flag in iter {
            set.insert(flag);
        }
        set
    }
}

impl FromStr for FlagSet {
    type Err = InputError;

    /// Either a comma-separated list of flag names or a `0x` hex bit pattern.
    /// The empty string is the empty set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(h) = s.strip_prefix("0x") {
            return u16::from_str_radix(h, 16)
                .ok()
                .and_then(FlagSet::from_bits)
                .ok_or_else(|| InputError::UnknownFlag(s.to_string()));
        }
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(HookFlag::from_str)
            .collect()
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(none)");
        }
        for (i, flag) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{flag}")?;
        }
        Ok(())
    }
}

/// Every flag-domain bit: `(1 << 14) - 1`.
pub const ALL_HOOK_MASK: u16 = {
    let mut mask = 0u16;
    let mut i = 0;
    while i < HookFlag::ALL.len() {
        mask |= HookFlag::ALL[i].bit_mask();
        i += 1;
    }
    mask
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    Match,
    NoMatch,
}

impl MatchResult {
    #[inline]
    pub fn is_match(self) -> bool {
        matches!(self, MatchResult::Match)
    }
}

/// Required bit pattern over the low-order bits of an address.
///
/// `mask` always covers every flag bit, so an address matches only if it
/// carries exactly the requested flags and no others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagMask {
    pub mask: u16,
    pub value: u16,
}

impl FlagMask {
    pub const fn encode(flags: &FlagSet) -> Self {
        Self {
            mask: ALL_HOOK_MASK,
            value: flags.bits(),
        }
    }

    #[inline]
    pub fn matches(&self, address: &Address) -> MatchResult {
        if address.low_bits() & self.mask == self.value {
            MatchResult::Match
        } else {
            MatchResult::NoMatch
        }
    }

    /// Which flags an address would be granted.
    pub fn flags_of(address: &Address) -> FlagSet {
        FlagSet(address.low_bits() & ALL_HOOK_MASK)
    }

    /// Expected number of attempts before a match.
    pub fn expected_attempts(&self) -> u64 {
        1u64 << self.mask.count_ones()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr_with_low_bits(bits: u16) -> Address {
        let mut bytes = [0xaau8; 20];
        bytes[18..].copy_from_slice(&bits.to_be_bytes());
        Address::from_bytes(bytes)
    }

    #[test]
    fn test_bit_positions_are_distinct() {
        let mut seen = 0u16;
        for flag in HookFlag::ALL {
            assert_eq!(seen & flag.bit_mask(), 0, "{flag} reuses a bit");
            seen |= flag.bit_mask();
        }
        assert_eq!(seen, 0x3fff);
        assert_eq!(ALL_HOOK_MASK, 0x3fff);
    }

    #[test]
    fn test_encode_empty_and_full() {
        assert_eq!(
            FlagMask::encode(&FlagSet::empty()),
            FlagMask { mask: 0x3fff, value: 0 }
        );
        assert_eq!(
            FlagMask::encode(&FlagSet::all()),
            FlagMask { mask: 0x3fff, value: 0x3fff }
        );
    }

    #[test]
    fn test_encode_single_flag() {
        let flags: FlagSet = [HookFlag::BeforeAddLiquidity].into_iter().collect();
        let mask = FlagMask::encode(&flags);
        assert_eq!(mask.value, 1 << 11);
        assert_eq!(mask.mask, 0x3fff);
    }

    #[test]
    fn test_unrequested_bits_must_be_zero() {
        let flags: FlagSet = "BEFORE_SWAP".parse().unwrap();
        let mask = FlagMask::encode(&flags);
        assert!(mask.matches(&addr_with_low_bits(0x0080)).is_match());
        // bits above the flag domain are ignored
        assert!(mask.matches(&addr_with_low_bits(0xc080)).is_match());
        // an extra AFTER_SWAP bit grants an unrequested callback
        assert!(!mask.matches(&addr_with_low_bits(0x00c0)).is_match());
        assert!(!mask.matches(&addr_with_low_bits(0x0000)).is_match());
    }

    #[test]
    fn test_parse_flag_names() {
        assert_eq!("BEFORE_SWAP".parse::<HookFlag>().unwrap(), HookFlag::BeforeSwap);
        assert_eq!("before-swap".parse::<HookFlag>().unwrap(), HookFlag::BeforeSwap);
        assert_eq!("beforeSwap".parse::<HookFlag>().unwrap(), HookFlag::BeforeSwap);
        assert!("BEFORE_LUNCH".parse::<HookFlag>().is_err());
    }

    #[test]
    fn test_parse_solidity_spellings() {
        assert_eq!("BEFORE_SWAP_FLAG".parse::<HookFlag>().unwrap(), HookFlag::BeforeSwap);
        assert_eq!(
            "AFTER_REMOVE_LIQUIDITY_RETURNS_DELTA_FLAG".parse::<HookFlag>().unwrap(),
            HookFlag::AfterRemoveLiquidityReturnsDelta
        );
        assert_eq!(
            "beforeSwapReturnDelta".parse::<HookFlag>().unwrap(),
            HookFlag::BeforeSwapReturnsDelta
        );
        assert_eq!(
            "afterAddLiquidityReturnDelta".parse::<HookFlag>().unwrap(),
            HookFlag::AfterAddLiquidityReturnsDelta
        );
        let set: FlagSet = "BEFORE_SWAP_FLAG,afterSwapReturnDelta".parse().unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(HookFlag::AfterSwapReturnsDelta));
    }

    #[test]
    fn test_parse_flag_set() {
        let set: FlagSet = "before_swap, after_swap,BEFORE_SWAP".parse().unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(HookFlag::AfterSwap));
        assert!("".parse::<FlagSet>().unwrap().is_empty());
        assert_eq!("0x0880".parse::<FlagSet>().unwrap().bits(), 0x0880);
        assert!("0x4000".parse::<FlagSet>().is_err());
    }

    #[test]
    fn test_flags_of_round_trip() {
        let set: FlagSet = "AFTER_INITIALIZE,AFTER_DONATE".parse().unwrap();
        let mask = FlagMask::encode(&set);
        let addr = addr_with_low_bits(mask.value | 0x8000);
        assert_eq!(FlagMask::flags_of(&addr), set);
        assert_eq!(set.to_string(), "AFTER_INITIALIZE, AFTER_DONATE");
    }
}
