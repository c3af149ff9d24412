//! R1CS constraint system for zk-rollup block state transitions.
//!
//! A block of fixed size moves the rollup state (accounts with their asset
//! subtrees, liquidity pools, NFTs) from one Poseidon root to the next. This
//! crate provides:
//! - `BlockCircuit`: chains N transaction verifiers and exposes the block
//!   commitment as its only public input
//! - the 18 transaction types, each with validation, pubdata and state deltas
//! - EIP-712 signature hints checked against an ECDSA oracle
//! - `RollupState`: the native state and witness builder producing `Block`s

pub mod builder;
pub mod circuit;
pub mod comparators;
pub mod config;
pub mod delta;
pub mod error;
pub mod field;
pub mod merkle;
pub mod model;
pub mod packed;
pub mod poseidon;
pub mod pubdata;
pub mod signature;
pub mod tx;
pub mod witness;

#[cfg(test)]
mod tests;

pub use builder::{RollupState, TxRequest};
pub use circuit::{verify_transaction, BlockCircuit, TxVerifierOutput};
pub use config::{CircuitConfig, Eip712Domain, TreeDepths};
pub use error::{BuildError, HintError, WitnessError};
pub use model::{Account, AccountAsset, LiquidityPool, Nft, Offer, OfferType, PublicKey, SignatureBytes};
pub use signature::{EcdsaOracle, SignatureOracle, SigningDomain};
pub use tx::{StateView, TxPayload, TxType};
pub use witness::{Block, Transaction};

use ark_bn254::Fr;

/// Common type aliases
pub type ConstraintF = Fr;
