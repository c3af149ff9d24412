//! Fixed-depth binary Merkle authentication.
//!
//! - Native sparse tree with cached default subtrees, used by the witness builder
//! - Merkle proofs (siblings + direction bits)
//! - In-circuit verification and root recomputation, parameterized by the hasher

mod gadgets;
mod hasher;
mod proof;
mod tree;

#[cfg(test)]
mod tests;

pub use gadgets::{
    alloc_siblings, index_to_merkle_path, root_from_path, update_merkle_proof, verify_merkle_proof,
};
pub use hasher::{MerkleHasher, PoseidonHasher};
pub use proof::{index_to_path_bits, MerkleProof};
pub use tree::{check_capacity, SparseMerkleTree};
