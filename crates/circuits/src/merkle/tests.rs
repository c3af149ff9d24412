//! Merkle gadget tests against the native tree.

use super::*;
use ark_bn254::Fr;
use ark_r1cs_std::prelude::*;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystem, ConstraintSystemRef};
use proptest::prelude::*;

const DEPTH: usize = 6;

fn populated_tree() -> SparseMerkleTree {
    let mut tree = SparseMerkleTree::new("test", DEPTH, Fr::from(0u64));
    tree.update(1, Fr::from(100u64)).unwrap();
    tree.update(42, Fr::from(50u64)).unwrap();
    tree.update(63, Fr::from(7u64)).unwrap();
    tree
}

fn alloc(cs: &ConstraintSystemRef<Fr>, v: Fr) -> FpVar<Fr> {
    FpVar::new_witness(cs.clone(), || Ok(v)).unwrap()
}

/// Verify `leaf` at `index` against `root`, with optional tampering.
fn run_verify(root: Fr, index: u64, leaf: Fr, siblings: &[Fr]) -> bool {
    let cs = ConstraintSystem::<Fr>::new_ref();
    let active = Boolean::new_witness(cs.clone(), || Ok(true)).unwrap();
    let root_var = FpVar::new_input(cs.clone(), || Ok(root)).unwrap();
    let index_var = alloc(&cs, Fr::from(index));
    let leaf_var = alloc(&cs, leaf);
    let sibling_vars = alloc_siblings(&cs, siblings).unwrap();
    let bits = index_to_merkle_path(&active, &index_var, DEPTH).unwrap();

    verify_merkle_proof(
        cs.clone(),
        &active,
        &PoseidonHasher,
        &root_var,
        &leaf_var,
        &sibling_vars,
        &bits,
    )
    .unwrap();
    cs.is_satisfied().unwrap()
}

#[test]
fn test_membership_valid() {
    let tree = populated_tree();
    let proof = tree.proof(42).unwrap();
    assert!(run_verify(tree.root(), 42, Fr::from(50u64), proof.siblings()));
}

#[test]
fn test_membership_wrong_leaf() {
    let tree = populated_tree();
    let proof = tree.proof(42).unwrap();
    assert!(!run_verify(tree.root(), 42, Fr::from(51u64), proof.siblings()));
}

#[test]
fn test_membership_tampered_sibling() {
    let tree = populated_tree();
    let mut siblings = tree.proof(42).unwrap().into_siblings();
    siblings[3] += Fr::from(1u64);
    assert!(!run_verify(tree.root(), 42, Fr::from(50u64), &siblings));
}

#[test]
fn test_membership_flipped_path_bit() {
    let tree = populated_tree();
    let proof = tree.proof(42).unwrap();
    // 42 ^ 4 flips the third direction bit
    assert!(!run_verify(tree.root(), 42 ^ 4, Fr::from(50u64), proof.siblings()));
}

#[test]
fn test_index_beyond_capacity_unsatisfied() {
    let tree = populated_tree();
    let proof = tree.proof(1).unwrap();
    assert!(!run_verify(tree.root(), 1 + (1 << DEPTH), Fr::from(100u64), proof.siblings()));
}

#[test]
fn test_inactive_proof_is_vacuous() {
    let cs = ConstraintSystem::<Fr>::new_ref();
    let inactive = Boolean::new_witness(cs.clone(), || Ok(false)).unwrap();
    let root = alloc(&cs, Fr::from(12345u64));
    let index = alloc(&cs, Fr::from(u64::MAX));
    let leaf = alloc(&cs, Fr::from(1u64));
    let siblings = alloc_siblings(&cs, &[Fr::from(0u64); DEPTH]).unwrap();
    let bits = index_to_merkle_path(&inactive, &index, DEPTH).unwrap();

    verify_merkle_proof(cs.clone(), &inactive, &PoseidonHasher, &root, &leaf, &siblings, &bits)
        .unwrap();
    assert!(cs.is_satisfied().unwrap());
}

#[test]
fn test_update_matches_native() {
    let mut tree = populated_tree();
    let old_root = tree.root();
    let proof = tree.proof(42).unwrap();
    let expected = tree.update(42, Fr::from(75u64)).unwrap();

    let cs = ConstraintSystem::<Fr>::new_ref();
    let active = Boolean::new_witness(cs.clone(), || Ok(true)).unwrap();
    let old_root_var = alloc(&cs, old_root);
    let index = alloc(&cs, Fr::from(42u64));
    let siblings = alloc_siblings(&cs, proof.siblings()).unwrap();
    let bits = index_to_merkle_path(&active, &index, DEPTH).unwrap();

    let old_leaf = alloc(&cs, Fr::from(50u64));
    verify_merkle_proof(cs.clone(), &active, &PoseidonHasher, &old_root_var, &old_leaf, &siblings, &bits)
        .unwrap();
    let new_leaf = alloc(&cs, Fr::from(75u64));
    let new_root = update_merkle_proof(cs.clone(), &PoseidonHasher, &new_leaf, &siblings, &bits).unwrap();

    new_root
        .enforce_equal(&FpVar::new_input(cs.clone(), || Ok(expected)).unwrap())
        .unwrap();
    assert!(cs.is_satisfied().unwrap());
    println!("Merkle verify + update constraints (depth {}): {}", DEPTH, cs.num_constraints());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_updated_root_authenticates_leaf(index in 0u64..(1 << DEPTH), leaf in any::<u64>()) {
        let mut tree = populated_tree();
        let proof = tree.proof(index).unwrap();
        let root = tree.update(index, Fr::from(leaf)).unwrap();
        prop_assert_eq!(proof.compute_root(&PoseidonHasher, Fr::from(leaf)), root);
        prop_assert_eq!(tree.proof(index).unwrap(), proof);
    }
}
