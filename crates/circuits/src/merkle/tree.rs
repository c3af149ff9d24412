//! Sparse Merkle tree over precomputed leaf hashes.
//!
//! Only written leaves and their ancestors are stored; every other node takes
//! the default hash of an all-empty subtree at its level.

use std::collections::HashMap;

use ark_bn254::Fr;

use super::hasher::{MerkleHasher, PoseidonHasher};
use super::proof::{index_to_path_bits, MerkleProof};
use crate::error::WitnessError;

/// Fails when `index` does not address a leaf of a tree of the given depth.
pub fn check_capacity(tree: &'static str, depth: usize, index: u64) -> Result<(), WitnessError> {
    if index >> depth != 0 {
        return Err(WitnessError::IndexOutOfRange { tree, index, depth });
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct SparseMerkleTree<H: MerkleHasher = PoseidonHasher> {
    name: &'static str,
    depth: usize,
    hasher: H,
    /// (level, index) -> hash. Level 0 = leaves, level `depth` = root.
    nodes: HashMap<(usize, u64), Fr>,
    /// defaults[i] = root of an empty subtree of height i.
    defaults: Vec<Fr>,
}

impl SparseMerkleTree<PoseidonHasher> {
    pub fn new(name: &'static str, depth: usize, empty_leaf: Fr) -> Self {
        Self::with_hasher(name, depth, empty_leaf, PoseidonHasher)
    }
}

impl<H: MerkleHasher> SparseMerkleTree<H> {
    pub fn with_hasher(name: &'static str, depth: usize, empty_leaf: Fr, hasher: H) -> Self {
        let defaults = Self::compute_defaults(&hasher, depth, empty_leaf);
        Self {
            name,
            depth,
            hasher,
            nodes: HashMap::new(),
            defaults,
        }
    }

    fn compute_defaults(hasher: &H, depth: usize, empty_leaf: Fr) -> Vec<Fr> {
        let mut defaults = Vec::with_capacity(depth + 1);
        let mut current = empty_leaf;
        defaults.push(current);
        for _ in 0..depth {
            current = hasher.hash_two(current, current);
            defaults.push(current);
        }
        defaults
    }

    /// Root of an all-empty tree of the given depth.
    pub fn empty_root(hasher: &H, depth: usize, empty_leaf: Fr) -> Fr {
        Self::compute_defaults(hasher, depth, empty_leaf)[depth]
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn root(&self) -> Fr {
        self.node(self.depth, 0)
    }

    pub fn leaf(&self, index: u64) -> Fr {
        self.node(0, index)
    }

    fn node(&self, level: usize, index: u64) -> Fr {
        self.nodes
            .get(&(level, index))
            .copied()
            .unwrap_or(self.defaults[level])
    }

    fn check_index(&self, index: u64) -> Result<(), WitnessError> {
        check_capacity(self.name, self.depth, index)
    }

    /// Set a leaf hash and recompute its ancestors. Returns the new root.
    pub fn update(&mut self, index: u64, leaf_hash: Fr) -> Result<Fr, WitnessError> {
        self.check_index(index)?;
        self.nodes.insert((0, index), leaf_hash);

        let mut current_index = index;
        let mut current_hash = leaf_hash;
        for level in 0..self.depth {
            let sibling = self.node(level, current_index ^ 1);
            current_hash = if current_index & 1 == 0 {
                self.hasher.hash_two(current_hash, sibling)
            } else {
                self.hasher.hash_two(sibling, current_hash)
            };
            current_index >>= 1;
            self.nodes.insert((level + 1, current_index), current_hash);
        }
        Ok(current_hash)
    }

    pub fn proof(&self, index: u64) -> Result<MerkleProof, WitnessError> {
        self.check_index(index)?;
        let siblings = (0..self.depth)
            .map(|level| self.node(level, (index >> level) ^ 1))
            .collect();
        Ok(MerkleProof::new(siblings, index_to_path_bits(index, self.depth)))
    }
}

#[cfg(test)]
mod tree_tests {
    use super::*;

    const DEPTH: usize = 8;

    fn tree() -> SparseMerkleTree {
        SparseMerkleTree::new("test", DEPTH, Fr::from(0u64))
    }

    #[test]
    fn test_empty_root_matches_fresh_tree() {
        let tree = tree();
        assert_eq!(
            tree.root(),
            SparseMerkleTree::empty_root(&PoseidonHasher, DEPTH, Fr::from(0u64))
        );
    }

    #[test]
    fn test_update_changes_root() {
        let mut tree = tree();
        let before = tree.root();
        let after = tree.update(3, Fr::from(100u64)).unwrap();
        assert_ne!(before, after);
        assert_eq!(after, tree.root());
        assert_eq!(tree.leaf(3), Fr::from(100u64));
    }

    #[test]
    fn test_resetting_leaf_restores_root() {
        let mut tree = tree();
        let empty = tree.root();
        tree.update(5, Fr::from(9u64)).unwrap();
        tree.update(5, Fr::from(0u64)).unwrap();
        assert_eq!(tree.root(), empty);
    }

    #[test]
    fn test_order_independence() {
        let mut a = tree();
        a.update(1, Fr::from(100u64)).unwrap();
        a.update(42, Fr::from(50u64)).unwrap();

        let mut b = tree();
        b.update(42, Fr::from(50u64)).unwrap();
        b.update(1, Fr::from(100u64)).unwrap();

        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_proof_recomputes_root() {
        let mut tree = tree();
        tree.update(1, Fr::from(100u64)).unwrap();
        tree.update(200, Fr::from(7u64)).unwrap();

        let proof = tree.proof(1).unwrap();
        assert!(proof.verify(&PoseidonHasher, tree.root(), Fr::from(100u64)));
        assert!(!proof.verify(&PoseidonHasher, tree.root(), Fr::from(99u64)));
    }

    #[test]
    fn test_index_out_of_range() {
        let mut tree = tree();
        assert!(matches!(
            tree.update(1 << DEPTH, Fr::from(1u64)),
            Err(WitnessError::IndexOutOfRange { index: 256, .. })
        ));
        assert!(tree.proof(1 << DEPTH).is_err());
    }
}
