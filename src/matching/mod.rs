//! Settlement-row resolution and pair derivation.
//!
//! Matching is exact equality on normalized keys: a row either hits an index
//! or falls through to the next step of the chain.

pub mod pairing;
pub mod resolve;

pub use pairing::{MappingPair, PairPartition, PairingOutcome, derive_pairs};
pub use resolve::{Resolution, ResolvedRow, resolve, resolve_row};
