//! Merkle proofs: sibling hashes from the leaf level up, plus direction bits.

use ark_bn254::Fr;

use super::hasher::MerkleHasher;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleProof {
    siblings: Vec<Fr>,
    /// `true` when the node on the path is the right child at that level.
    path_bits: Vec<bool>,
}

impl MerkleProof {
    pub fn new(siblings: Vec<Fr>, path_bits: Vec<bool>) -> Self {
        debug_assert_eq!(siblings.len(), path_bits.len());
        Self { siblings, path_bits }
    }

    pub fn siblings(&self) -> &[Fr] {
        &self.siblings
    }

    pub fn path_bits(&self) -> &[bool] {
        &self.path_bits
    }

    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    pub fn into_siblings(self) -> Vec<Fr> {
        self.siblings
    }

    /// Walk from `leaf_hash` to the root.
    pub fn compute_root<H: MerkleHasher>(&self, hasher: &H, leaf_hash: Fr) -> Fr {
        self.siblings
            .iter()
            .zip(&self.path_bits)
            .fold(leaf_hash, |current, (sibling, &is_right)| {
                if is_right {
                    hasher.hash_two(*sibling, current)
                } else {
                    hasher.hash_two(current, *sibling)
                }
            })
    }

    pub fn verify<H: MerkleHasher>(&self, hasher: &H, root: Fr, leaf_hash: Fr) -> bool {
        self.compute_root(hasher, leaf_hash) == root
    }
}

/// Little-endian binary decomposition of a leaf index.
pub fn index_to_path_bits(index: u64, depth: usize) -> Vec<bool> {
    (0..depth).map(|level| (index >> level) & 1 == 1).collect()
}
