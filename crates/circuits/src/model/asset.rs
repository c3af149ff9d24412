use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::field::witness;
use crate::merkle::{PoseidonHasher, SparseMerkleTree};
use crate::poseidon::{poseidon_hash_many, poseidon_hash_many_var};

/// One asset leaf of an account's asset subtree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountAsset {
    pub asset_id: u16,
    pub balance: u128,
    pub lp_amount: u128,
    /// Bit `k` set once offer slot `k` has been cancelled or filled.
    pub offer_canceled_or_finalized: u128,
}

impl AccountAsset {
    pub fn empty(asset_id: u16) -> Self {
        Self {
            asset_id,
            ..Default::default()
        }
    }

    pub fn leaf_hash(&self) -> Fr {
        poseidon_hash_many(&[
            Fr::from(self.balance),
            Fr::from(self.lp_amount),
            Fr::from(self.offer_canceled_or_finalized),
        ])
    }

    pub fn is_offer_slot_used(&self, slot: u32) -> bool {
        self.offer_canceled_or_finalized >> slot & 1 == 1
    }
}

pub fn empty_asset_leaf() -> Fr {
    AccountAsset::default().leaf_hash()
}

/// Assets root of an account that holds nothing.
pub fn empty_assets_root(asset_depth: usize) -> Fr {
    SparseMerkleTree::empty_root(&PoseidonHasher, asset_depth, empty_asset_leaf())
}

#[derive(Clone, Debug)]
pub struct AccountAssetVar {
    pub asset_id: FpVar<Fr>,
    pub balance: FpVar<Fr>,
    pub lp_amount: FpVar<Fr>,
    pub offer_canceled_or_finalized: FpVar<Fr>,
}

impl AccountAssetVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        asset: &AccountAsset,
    ) -> Result<Self, SynthesisError> {
        Ok(Self {
            asset_id: witness(cs, Fr::from(asset.asset_id))?,
            balance: witness(cs, Fr::from(asset.balance))?,
            lp_amount: witness(cs, Fr::from(asset.lp_amount))?,
            offer_canceled_or_finalized: witness(cs, Fr::from(asset.offer_canceled_or_finalized))?,
        })
    }

    pub fn leaf_hash(&self, cs: ConstraintSystemRef<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
        poseidon_hash_many_var(
            cs,
            &[
                self.balance.clone(),
                self.lp_amount.clone(),
                self.offer_canceled_or_finalized.clone(),
            ],
        )
    }
}
