//! Layer-1 NFT bridged into an empty NFT slot.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{assert_nft_empty_if_active, NativeTx, StateView, TxContextVar, TxGadget, TxSlots, TxType};
use crate::comparators::assert_equal_if_active;
use crate::config::{ACCOUNT_INDEX_BITS, ADDRESS_BITS, COLLECTION_ID_BITS, NFT_INDEX_BITS, RATE_BITS};
use crate::delta::{TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::{address_to_fr, witness};
use crate::model::{Nft, NftVar};
use crate::pubdata::PubdataField::{self, Bits, Element};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepositNftTx {
    pub account_index: u32,
    pub account_name_hash: Fr,
    pub nft_index: u64,
    pub creator_account_index: u32,
    pub creator_treasury_rate: u16,
    pub collection_id: u16,
    pub nft_content_hash: Fr,
    pub nft_l1_address: [u8; 20],
    pub nft_l1_token_id: Fr,
}

impl DepositNftTx {
    fn nft(&self) -> Nft {
        Nft {
            nft_index: self.nft_index,
            creator_account_index: self.creator_account_index,
            owner_account_index: self.account_index,
            content_hash: self.nft_content_hash,
            l1_address: self.nft_l1_address,
            l1_token_id: self.nft_l1_token_id,
            creator_treasury_rate: self.creator_treasury_rate,
            collection_id: self.collection_id,
        }
    }
}

impl NativeTx for DepositNftTx {
    fn tx_type(&self) -> TxType {
        TxType::DepositNft
    }

    fn slots(&self, _state: &dyn StateView) -> TxSlots {
        let mut slots = TxSlots::default();
        slots.accounts[0] = self.account_index;
        slots.nft_index = self.nft_index;
        slots
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        vec![
            Bits(Fr::from(self.account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.nft_index), NFT_INDEX_BITS),
            Bits(Fr::from(self.creator_account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.creator_treasury_rate), RATE_BITS),
            Bits(Fr::from(self.collection_id), COLLECTION_ID_BITS),
            Bits(address_to_fr(&self.nft_l1_address), ADDRESS_BITS),
            Element(self.nft_content_hash),
            Element(self.nft_l1_token_id),
            Element(self.account_name_hash),
        ]
    }

    fn hash_fields(&self) -> Vec<Fr> {
        vec![
            Fr::from(self.account_index),
            self.account_name_hash,
            Fr::from(self.nft_index),
            Fr::from(self.creator_account_index),
            Fr::from(self.creator_treasury_rate),
            Fr::from(self.collection_id),
            self.nft_content_hash,
            address_to_fr(&self.nft_l1_address),
            self.nft_l1_token_id,
        ]
    }

    fn deltas(&self, _state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        Ok(TxDelta {
            nft: Some(self.nft()),
            ..Default::default()
        })
    }
}

#[derive(Clone, Debug)]
pub struct DepositNftTxVar {
    pub account_index: FpVar<Fr>,
    pub account_name_hash: FpVar<Fr>,
    pub nft_index: FpVar<Fr>,
    pub creator_account_index: FpVar<Fr>,
    pub creator_treasury_rate: FpVar<Fr>,
    pub collection_id: FpVar<Fr>,
    pub nft_content_hash: FpVar<Fr>,
    pub nft_l1_address: FpVar<Fr>,
    pub nft_l1_token_id: FpVar<Fr>,
}

impl DepositNftTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &DepositNftTx,
        _active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        Ok(Self {
            account_index: witness(cs, Fr::from(tx.account_index))?,
            account_name_hash: witness(cs, tx.account_name_hash)?,
            nft_index: witness(cs, Fr::from(tx.nft_index))?,
            creator_account_index: witness(cs, Fr::from(tx.creator_account_index))?,
            creator_treasury_rate: witness(cs, Fr::from(tx.creator_treasury_rate))?,
            collection_id: witness(cs, Fr::from(tx.collection_id))?,
            nft_content_hash: witness(cs, tx.nft_content_hash)?,
            nft_l1_address: witness(cs, address_to_fr(&tx.nft_l1_address))?,
            nft_l1_token_id: witness(cs, tx.nft_l1_token_id)?,
        })
    }
}

impl TxGadget for DepositNftTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        assert_equal_if_active(active, &self.account_index, &ctx.accounts[0].index)?;
        assert_equal_if_active(active, &self.account_name_hash, &ctx.accounts[0].name_hash)?;
        assert_equal_if_active(active, &self.nft_index, &ctx.nft.nft_index)?;
        assert_nft_empty_if_active(active, &ctx.nft)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        vec![
            Bits(self.account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.nft_index.clone(), NFT_INDEX_BITS),
            Bits(self.creator_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.creator_treasury_rate.clone(), RATE_BITS),
            Bits(self.collection_id.clone(), COLLECTION_ID_BITS),
            Bits(self.nft_l1_address.clone(), ADDRESS_BITS),
            Element(self.nft_content_hash.clone()),
            Element(self.nft_l1_token_id.clone()),
            Element(self.account_name_hash.clone()),
        ]
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        vec![
            self.account_index.clone(),
            self.account_name_hash.clone(),
            self.nft_index.clone(),
            self.creator_account_index.clone(),
            self.creator_treasury_rate.clone(),
            self.collection_id.clone(),
            self.nft_content_hash.clone(),
            self.nft_l1_address.clone(),
            self.nft_l1_token_id.clone(),
        ]
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        delta.nft = NftVar {
            nft_index: ctx.nft.nft_index.clone(),
            creator_account_index: self.creator_account_index.clone(),
            owner_account_index: self.account_index.clone(),
            content_hash: self.nft_content_hash.clone(),
            l1_address: self.nft_l1_address.clone(),
            l1_token_id: self.nft_l1_token_id.clone(),
            creator_treasury_rate: self.creator_treasury_rate.clone(),
            collection_id: self.collection_id.clone(),
        };
        Ok(delta)
    }
}
