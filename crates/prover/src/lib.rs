//! Groth16 backend for rollup block circuits.
//!
//! This crate provides utilities for:
//! - Trusted setup for a given block shape, with key save/load
//! - Block proof generation (public input: the block commitment)
//! - Local proof verification

pub mod prove;
pub mod setup;
pub mod verify;

pub use prove::{check_block, check_satisfied, prove_block, ProofWithInputs, ProveError};
pub use setup::{
    load_config, save_config, setup_block_circuit, setup_with_seed, BlockKeys, CircuitKeyPair, SetupError,
};
pub use verify::{verify_block, verify_proof, VerifyError};

use ark_bn254::Fr;

/// Common field type for all operations
pub type ConstraintF = Fr;
