use ark_bn254::Fr;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::asset::empty_assets_root;
use crate::comparators::enforce_range_if_active;
use crate::config::PUBKEY_BYTES;
use crate::field::{bytes32_to_halves, witness};
use crate::poseidon::{poseidon_hash_many, poseidon_hash_many_var};

/// keccak256 of the uncompressed secp256k1 point; the low 20 bytes are the
/// account's layer-1 address.
pub type PublicKey = [u8; PUBKEY_BYTES];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub index: u32,
    pub name_hash: Fr,
    pub public_key: PublicKey,
    pub nonce: u64,
    pub collection_nonce: u64,
    pub assets_root: Fr,
}

impl Account {
    /// Unregistered account: zero fields over an empty asset subtree.
    pub fn empty(index: u32, asset_depth: usize) -> Self {
        Self {
            index,
            name_hash: Fr::from(0u64),
            public_key: [0u8; PUBKEY_BYTES],
            nonce: 0,
            collection_nonce: 0,
            assets_root: empty_assets_root(asset_depth),
        }
    }

    pub fn leaf_hash(&self) -> Fr {
        let (pk_hi, pk_lo) = bytes32_to_halves(&self.public_key);
        poseidon_hash_many(&[
            self.name_hash,
            pk_hi,
            pk_lo,
            Fr::from(self.nonce),
            Fr::from(self.collection_nonce),
            self.assets_root,
        ])
    }

    pub fn l1_address(&self) -> [u8; 20] {
        let mut address = [0u8; 20];
        address.copy_from_slice(&self.public_key[12..]);
        address
    }
}

#[derive(Clone, Debug)]
pub struct AccountVar {
    pub index: FpVar<Fr>,
    pub name_hash: FpVar<Fr>,
    /// One element per byte.
    pub public_key: Vec<FpVar<Fr>>,
    pub nonce: FpVar<Fr>,
    pub collection_nonce: FpVar<Fr>,
    pub assets_root: FpVar<Fr>,
}

impl AccountVar {
    pub fn new_witness(cs: &ConstraintSystemRef<Fr>, account: &Account) -> Result<Self, SynthesisError> {
        Ok(Self {
            index: witness(cs, Fr::from(account.index))?,
            name_hash: witness(cs, account.name_hash)?,
            public_key: account
                .public_key
                .iter()
                .map(|b| witness(cs, Fr::from(*b)))
                .collect::<Result<_, _>>()?,
            nonce: witness(cs, Fr::from(account.nonce))?,
            collection_nonce: witness(cs, Fr::from(account.collection_nonce))?,
            assets_root: witness(cs, account.assets_root)?,
        })
    }

    /// Range-check every key byte. Gated like any other per-slot check.
    pub fn enforce_public_key_bytes(&self, active: &Boolean<Fr>) -> Result<(), SynthesisError> {
        for byte in &self.public_key {
            enforce_range_if_active(active, byte, 8)?;
        }
        Ok(())
    }

    /// Big-endian (high, low) 128-bit halves of the key bytes.
    pub fn public_key_halves(public_key: &[FpVar<Fr>]) -> (FpVar<Fr>, FpVar<Fr>) {
        let recompose = |bytes: &[FpVar<Fr>]| {
            bytes
                .iter()
                .fold(FpVar::zero(), |acc, b| acc * Fr::from(256u64) + b)
        };
        let half = public_key.len() / 2;
        (recompose(&public_key[..half]), recompose(&public_key[half..]))
    }

    /// Leaf hash of this account with the given key bytes and assets root.
    pub fn leaf_hash_with(
        &self,
        cs: ConstraintSystemRef<Fr>,
        name_hash: &FpVar<Fr>,
        public_key: &[FpVar<Fr>],
        nonce: &FpVar<Fr>,
        collection_nonce: &FpVar<Fr>,
        assets_root: &FpVar<Fr>,
    ) -> Result<FpVar<Fr>, SynthesisError> {
        let (pk_hi, pk_lo) = Self::public_key_halves(public_key);
        poseidon_hash_many_var(
            cs,
            &[
                name_hash.clone(),
                pk_hi,
                pk_lo,
                nonce.clone(),
                collection_nonce.clone(),
                assets_root.clone(),
            ],
        )
    }

    pub fn leaf_hash(&self, cs: ConstraintSystemRef<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
        self.leaf_hash_with(
            cs,
            &self.name_hash,
            &self.public_key,
            &self.nonce,
            &self.collection_nonce,
            &self.assets_root,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;

    fn sample() -> Account {
        let mut public_key = [0u8; PUBKEY_BYTES];
        for (i, b) in public_key.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        Account {
            index: 3,
            name_hash: Fr::from(777u64),
            public_key,
            nonce: 4,
            collection_nonce: 2,
            assets_root: empty_assets_root(3),
        }
    }

    #[test]
    fn test_leaf_hash_gadget_matches_native() {
        let account = sample();
        let cs = ConstraintSystem::<Fr>::new_ref();
        let var = AccountVar::new_witness(&cs, &account).unwrap();
        var.enforce_public_key_bytes(&Boolean::TRUE).unwrap();
        let leaf = var.leaf_hash(cs.clone()).unwrap();
        leaf.enforce_equal(&FpVar::constant(account.leaf_hash())).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_key_byte_out_of_range_unsatisfied() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let mut var = AccountVar::new_witness(&cs, &sample()).unwrap();
        var.public_key[0] = witness(&cs, Fr::from(256u64)).unwrap();
        var.enforce_public_key_bytes(&Boolean::TRUE).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_empty_account_differs_from_registered() {
        assert_ne!(Account::empty(3, 3).leaf_hash(), sample().leaf_hash());
        assert_eq!(Account::empty(3, 3).assets_root, empty_assets_root(3));
    }
}
