use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::field::{address_to_fr, witness};
use crate::poseidon::{poseidon_hash_many, poseidon_hash_many_var};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Nft {
    pub nft_index: u64,
    pub creator_account_index: u32,
    pub owner_account_index: u32,
    pub content_hash: Fr,
    pub l1_address: [u8; 20],
    pub l1_token_id: Fr,
    pub creator_treasury_rate: u16,
    pub collection_id: u16,
}

impl Nft {
    pub fn empty(nft_index: u64) -> Self {
        Self {
            nft_index,
            ..Default::default()
        }
    }

    /// Leaf fields in hash order, shared with the gadget and the deltas.
    pub fn leaf_fields(&self) -> [Fr; 7] {
        [
            Fr::from(self.creator_account_index),
            Fr::from(self.owner_account_index),
            self.content_hash,
            address_to_fr(&self.l1_address),
            self.l1_token_id,
            Fr::from(self.creator_treasury_rate),
            Fr::from(self.collection_id),
        ]
    }

    pub fn leaf_hash(&self) -> Fr {
        poseidon_hash_many(&self.leaf_fields())
    }
}

#[derive(Clone, Debug)]
pub struct NftVar {
    pub nft_index: FpVar<Fr>,
    pub creator_account_index: FpVar<Fr>,
    pub owner_account_index: FpVar<Fr>,
    pub content_hash: FpVar<Fr>,
    pub l1_address: FpVar<Fr>,
    pub l1_token_id: FpVar<Fr>,
    pub creator_treasury_rate: FpVar<Fr>,
    pub collection_id: FpVar<Fr>,
}

impl NftVar {
    pub fn new_witness(cs: &ConstraintSystemRef<Fr>, nft: &Nft) -> Result<Self, SynthesisError> {
        Ok(Self {
            nft_index: witness(cs, Fr::from(nft.nft_index))?,
            creator_account_index: witness(cs, Fr::from(nft.creator_account_index))?,
            owner_account_index: witness(cs, Fr::from(nft.owner_account_index))?,
            content_hash: witness(cs, nft.content_hash)?,
            l1_address: witness(cs, address_to_fr(&nft.l1_address))?,
            l1_token_id: witness(cs, nft.l1_token_id)?,
            creator_treasury_rate: witness(cs, Fr::from(nft.creator_treasury_rate))?,
            collection_id: witness(cs, Fr::from(nft.collection_id))?,
        })
    }

    /// The all-zero NFT at `nft_index`.
    pub fn empty_at(nft_index: &FpVar<Fr>) -> Self {
        Self {
            nft_index: nft_index.clone(),
            creator_account_index: FpVar::zero(),
            owner_account_index: FpVar::zero(),
            content_hash: FpVar::zero(),
            l1_address: FpVar::zero(),
            l1_token_id: FpVar::zero(),
            creator_treasury_rate: FpVar::zero(),
            collection_id: FpVar::zero(),
        }
    }

    pub fn leaf_fields(&self) -> [FpVar<Fr>; 7] {
        [
            self.creator_account_index.clone(),
            self.owner_account_index.clone(),
            self.content_hash.clone(),
            self.l1_address.clone(),
            self.l1_token_id.clone(),
            self.creator_treasury_rate.clone(),
            self.collection_id.clone(),
        ]
    }

    pub fn leaf_hash(&self, cs: ConstraintSystemRef<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
        poseidon_hash_many_var(cs, &self.leaf_fields())
    }
}
