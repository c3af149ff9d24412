//! Minting of a new NFT in one of the creator's collections.
//!
//! Slots: account 0 creator, account 1 first owner.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{
    assert_nft_empty_if_active, assert_rate_if_active, GasFee, GasFeeVar, NativeTx, StateView, TxContextVar,
    TxGadget, TxSlots, TxType,
};
use crate::comparators::{assert_equal_if_active, assert_less_if_active};
use crate::config::{ACCOUNT_INDEX_BITS, COLLECTION_ID_BITS, NFT_INDEX_BITS, NONCE_BITS, RATE_BITS};
use crate::delta::{TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::witness;
use crate::model::{Nft, NftVar};
use crate::pubdata::PubdataField::{self, Bits, Element};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MintNftTx {
    pub creator_account_index: u32,
    pub to_account_index: u32,
    pub to_account_name_hash: Fr,
    pub nft_index: u64,
    pub nft_content_hash: Fr,
    pub creator_treasury_rate: u16,
    pub collection_id: u16,
    pub gas: GasFee,
}

impl NativeTx for MintNftTx {
    fn tx_type(&self) -> TxType {
        TxType::MintNft
    }

    fn slots(&self, _state: &dyn StateView) -> TxSlots {
        let mut slots = TxSlots {
            nft_index: self.nft_index,
            ..Default::default()
        };
        slots.accounts[0] = self.creator_account_index;
        slots.accounts[1] = self.to_account_index;
        self.gas.assign_slots(&mut slots);
        slots
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        let mut fields = vec![
            Bits(Fr::from(self.creator_account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.to_account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.nft_index), NFT_INDEX_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields.extend([
            Bits(Fr::from(self.creator_treasury_rate), RATE_BITS),
            Bits(Fr::from(self.collection_id), COLLECTION_ID_BITS),
            Element(self.nft_content_hash),
        ]);
        fields
    }

    fn hash_fields(&self) -> Vec<Fr> {
        let mut fields = vec![
            Fr::from(self.creator_account_index),
            Fr::from(self.to_account_index),
            self.to_account_name_hash,
            Fr::from(self.nft_index),
            self.nft_content_hash,
            Fr::from(self.creator_treasury_rate),
            Fr::from(self.collection_id),
        ];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, _state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        let mut delta = TxDelta {
            nft: Some(Nft {
                nft_index: self.nft_index,
                creator_account_index: self.creator_account_index,
                owner_account_index: self.to_account_index,
                content_hash: self.nft_content_hash,
                creator_treasury_rate: self.creator_treasury_rate,
                collection_id: self.collection_id,
                ..Default::default()
            }),
            ..Default::default()
        };
        self.gas.apply(&mut delta)?;
        Ok(delta)
    }
}

#[derive(Clone, Debug)]
pub struct MintNftTxVar {
    pub creator_account_index: FpVar<Fr>,
    pub to_account_index: FpVar<Fr>,
    pub to_account_name_hash: FpVar<Fr>,
    pub nft_index: FpVar<Fr>,
    pub nft_content_hash: FpVar<Fr>,
    pub creator_treasury_rate: FpVar<Fr>,
    pub collection_id: FpVar<Fr>,
    pub gas: GasFeeVar,
}

impl MintNftTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &MintNftTx,
        active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        Ok(Self {
            creator_account_index: witness(cs, Fr::from(tx.creator_account_index))?,
            to_account_index: witness(cs, Fr::from(tx.to_account_index))?,
            to_account_name_hash: witness(cs, tx.to_account_name_hash)?,
            nft_index: witness(cs, Fr::from(tx.nft_index))?,
            nft_content_hash: witness(cs, tx.nft_content_hash)?,
            creator_treasury_rate: witness(cs, Fr::from(tx.creator_treasury_rate))?,
            collection_id: witness(cs, Fr::from(tx.collection_id))?,
            gas: GasFeeVar::new_witness(cs, &tx.gas, active)?,
        })
    }
}

impl TxGadget for MintNftTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        let creator = &ctx.accounts[0];
        assert_equal_if_active(active, &self.creator_account_index, &creator.index)?;
        assert_equal_if_active(active, &self.to_account_index, &ctx.accounts[1].index)?;
        assert_equal_if_active(active, &self.to_account_name_hash, &ctx.accounts[1].name_hash)?;
        // only collections the creator has already opened
        assert_less_if_active(active, &self.collection_id, &creator.collection_nonce, NONCE_BITS)?;
        assert_rate_if_active(active, &self.creator_treasury_rate)?;
        assert_equal_if_active(active, &self.nft_index, &ctx.nft.nft_index)?;
        assert_nft_empty_if_active(active, &ctx.nft)?;
        self.gas.validate(active, ctx)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        let mut fields = vec![
            Bits(self.creator_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.to_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.nft_index.clone(), NFT_INDEX_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields.extend([
            Bits(self.creator_treasury_rate.clone(), RATE_BITS),
            Bits(self.collection_id.clone(), COLLECTION_ID_BITS),
            Element(self.nft_content_hash.clone()),
        ]);
        fields
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        let mut fields = vec![
            self.creator_account_index.clone(),
            self.to_account_index.clone(),
            self.to_account_name_hash.clone(),
            self.nft_index.clone(),
            self.nft_content_hash.clone(),
            self.creator_treasury_rate.clone(),
            self.collection_id.clone(),
        ];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        delta.nft = NftVar {
            creator_account_index: self.creator_account_index.clone(),
            owner_account_index: self.to_account_index.clone(),
            content_hash: self.nft_content_hash.clone(),
            creator_treasury_rate: self.creator_treasury_rate.clone(),
            collection_id: self.collection_id.clone(),
            ..NftVar::empty_at(&ctx.nft.nft_index)
        };
        self.gas.apply(&mut delta);
        Ok(delta)
    }
}
