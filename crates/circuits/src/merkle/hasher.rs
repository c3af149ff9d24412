//! Two-to-one compression functions usable both natively and in-circuit.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::poseidon::{poseidon_hash_two, poseidon_hash_two_var};

/// Node compression for a Merkle tree. The native and gadget functions must
/// agree on every input.
pub trait MerkleHasher: Clone + std::fmt::Debug {
    fn hash_two(&self, left: Fr, right: Fr) -> Fr;

    fn hash_two_var(
        &self,
        cs: ConstraintSystemRef<Fr>,
        left: &FpVar<Fr>,
        right: &FpVar<Fr>,
    ) -> Result<FpVar<Fr>, SynthesisError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoseidonHasher;

impl MerkleHasher for PoseidonHasher {
    fn hash_two(&self, left: Fr, right: Fr) -> Fr {
        poseidon_hash_two(left, right)
    }

    fn hash_two_var(
        &self,
        cs: ConstraintSystemRef<Fr>,
        left: &FpVar<Fr>,
        right: &FpVar<Fr>,
    ) -> Result<FpVar<Fr>, SynthesisError> {
        poseidon_hash_two_var(cs, left, right)
    }
}
