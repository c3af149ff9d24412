//! In-circuit Merkle path walking.

use ark_bn254::Fr;
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::hasher::MerkleHasher;
use crate::comparators::{assert_equal_if_active, enforce_bit_length, gate};

/// Allocate a sibling path as private witnesses.
pub fn alloc_siblings(
    cs: &ConstraintSystemRef<Fr>,
    siblings: &[Fr],
) -> Result<Vec<FpVar<Fr>>, SynthesisError> {
    siblings
        .iter()
        .map(|h| FpVar::new_witness(cs.clone(), || Ok(*h)))
        .collect()
}

/// Direction bits of `index` in a tree of `depth` levels.
///
/// The decomposition into exactly `depth` bits doubles as the bound
/// `index <= 2^depth - 1`. The index is gated so an inactive slot carrying
/// garbage cannot make the system unsatisfiable.
pub fn index_to_merkle_path(
    active: &Boolean<Fr>,
    index: &FpVar<Fr>,
    depth: usize,
) -> Result<Vec<Boolean<Fr>>, SynthesisError> {
    enforce_bit_length(&gate(active, index)?, depth)
}

/// Hash from a leaf up to the root along the given path.
pub fn root_from_path<H: MerkleHasher>(
    cs: ConstraintSystemRef<Fr>,
    hasher: &H,
    leaf_hash: &FpVar<Fr>,
    siblings: &[FpVar<Fr>],
    path_bits: &[Boolean<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    debug_assert_eq!(siblings.len(), path_bits.len());
    let mut current = leaf_hash.clone();
    for (sibling, is_right) in siblings.iter().zip(path_bits) {
        let left = is_right.select(sibling, &current)?;
        let right = is_right.select(&current, sibling)?;
        current = hasher.hash_two_var(cs.clone(), &left, &right)?;
    }
    Ok(current)
}

/// Assert, when `active`, that `leaf_hash` sits under `root` at the path.
pub fn verify_merkle_proof<H: MerkleHasher>(
    cs: ConstraintSystemRef<Fr>,
    active: &Boolean<Fr>,
    hasher: &H,
    root: &FpVar<Fr>,
    leaf_hash: &FpVar<Fr>,
    siblings: &[FpVar<Fr>],
    path_bits: &[Boolean<Fr>],
) -> Result<(), SynthesisError> {
    let computed = root_from_path(cs, hasher, leaf_hash, siblings, path_bits)?;
    assert_equal_if_active(active, &computed, root)
}

/// Root after replacing the leaf at the path with `new_leaf_hash`.
pub fn update_merkle_proof<H: MerkleHasher>(
    cs: ConstraintSystemRef<Fr>,
    hasher: &H,
    new_leaf_hash: &FpVar<Fr>,
    siblings: &[FpVar<Fr>],
    path_bits: &[Boolean<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    root_from_path(cs, hasher, new_leaf_hash, siblings, path_bits)
}
