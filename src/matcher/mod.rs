//! Address matching against hook permission flags.
//!
//! Requested flags become a mask/value pair over the low 14 address bits;
//! unrequested flag bits are required to be zero.

mod flags;

pub use flags::{FlagMask, FlagSet, HookFlag, MatchResult, ALL_HOOK_MASK};
