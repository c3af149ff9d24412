//! Layer-1 forced exit of an NFT.
//!
//! Slots: account 0 requester, account 1 creator. When the requester does not
//! own the NFT (or its name hash does not match) the exit is a no-op whose
//! pubdata carries zeros for every NFT field.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{NativeTx, StateView, TxContextVar, TxGadget, TxSlots, TxType};
use crate::comparators::assert_equal_if_active;
use crate::config::{ACCOUNT_INDEX_BITS, ADDRESS_BITS, COLLECTION_ID_BITS, NFT_INDEX_BITS, RATE_BITS};
use crate::delta::{TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::{address_to_fr, witness};
use crate::model::{Nft, NftVar};
use crate::pubdata::PubdataField::{self, Bits, Element};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FullExitNftTx {
    pub account_index: u32,
    pub account_name_hash: Fr,
    pub creator_account_index: u32,
    pub creator_account_name_hash: Fr,
    pub nft_index: u64,
    pub creator_treasury_rate: u16,
    pub collection_id: u16,
    pub nft_content_hash: Fr,
    pub nft_l1_address: [u8; 20],
    pub nft_l1_token_id: Fr,
}

impl FullExitNftTx {
    /// The exit the circuit will accept for this request against `state`.
    pub fn for_state(state: &dyn StateView, account_index: u32, account_name_hash: Fr, nft_index: u64) -> Self {
        let nft = state.nft(nft_index);
        let owned = nft.owner_account_index == account_index
            && state.account(account_index).name_hash == account_name_hash;
        let request = Self {
            account_index,
            account_name_hash,
            nft_index,
            ..Default::default()
        };
        if !owned {
            return request;
        }
        Self {
            creator_account_index: nft.creator_account_index,
            creator_account_name_hash: state.account(nft.creator_account_index).name_hash,
            creator_treasury_rate: nft.creator_treasury_rate,
            collection_id: nft.collection_id,
            nft_content_hash: nft.content_hash,
            nft_l1_address: nft.l1_address,
            nft_l1_token_id: nft.l1_token_id,
            ..request
        }
    }
}

impl NativeTx for FullExitNftTx {
    fn tx_type(&self) -> TxType {
        TxType::FullExitNft
    }

    fn slots(&self, _state: &dyn StateView) -> TxSlots {
        let mut slots = TxSlots {
            nft_index: self.nft_index,
            ..Default::default()
        };
        slots.accounts[0] = self.account_index;
        slots.accounts[1] = self.creator_account_index;
        slots
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        vec![
            Bits(Fr::from(self.account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.creator_account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.creator_treasury_rate), RATE_BITS),
            Bits(Fr::from(self.nft_index), NFT_INDEX_BITS),
            Bits(Fr::from(self.collection_id), COLLECTION_ID_BITS),
            Bits(address_to_fr(&self.nft_l1_address), ADDRESS_BITS),
            Element(self.account_name_hash),
            Element(self.creator_account_name_hash),
            Element(self.nft_content_hash),
            Element(self.nft_l1_token_id),
        ]
    }

    fn hash_fields(&self) -> Vec<Fr> {
        vec![
            Fr::from(self.account_index),
            self.account_name_hash,
            Fr::from(self.creator_account_index),
            self.creator_account_name_hash,
            Fr::from(self.nft_index),
            Fr::from(self.creator_treasury_rate),
            Fr::from(self.collection_id),
            self.nft_content_hash,
            address_to_fr(&self.nft_l1_address),
            self.nft_l1_token_id,
        ]
    }

    fn deltas(&self, state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        let nft = state.nft(self.nft_index);
        let owned = nft.owner_account_index == self.account_index
            && state.account(self.account_index).name_hash == self.account_name_hash;
        Ok(TxDelta {
            nft: owned.then(|| Nft::empty(self.nft_index)),
            ..Default::default()
        })
    }
}

#[derive(Clone, Debug)]
pub struct FullExitNftTxVar {
    pub account_index: FpVar<Fr>,
    pub account_name_hash: FpVar<Fr>,
    pub creator_account_index: FpVar<Fr>,
    pub creator_account_name_hash: FpVar<Fr>,
    pub nft_index: FpVar<Fr>,
    pub creator_treasury_rate: FpVar<Fr>,
    pub collection_id: FpVar<Fr>,
    pub nft_content_hash: FpVar<Fr>,
    pub nft_l1_address: FpVar<Fr>,
    pub nft_l1_token_id: FpVar<Fr>,
}

impl FullExitNftTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &FullExitNftTx,
        _active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        Ok(Self {
            account_index: witness(cs, Fr::from(tx.account_index))?,
            account_name_hash: witness(cs, tx.account_name_hash)?,
            creator_account_index: witness(cs, Fr::from(tx.creator_account_index))?,
            creator_account_name_hash: witness(cs, tx.creator_account_name_hash)?,
            nft_index: witness(cs, Fr::from(tx.nft_index))?,
            creator_treasury_rate: witness(cs, Fr::from(tx.creator_treasury_rate))?,
            collection_id: witness(cs, Fr::from(tx.collection_id))?,
            nft_content_hash: witness(cs, tx.nft_content_hash)?,
            nft_l1_address: witness(cs, address_to_fr(&tx.nft_l1_address))?,
            nft_l1_token_id: witness(cs, tx.nft_l1_token_id)?,
        })
    }

    fn is_owner(&self, ctx: &TxContextVar) -> Result<Boolean<Fr>, SynthesisError> {
        let owns = self.account_index.is_eq(&ctx.nft.owner_account_index)?;
        let named = self.account_name_hash.is_eq(&ctx.accounts[0].name_hash)?;
        owns.and(&named)
    }
}

impl TxGadget for FullExitNftTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        let nft = &ctx.nft;
        let creator = &ctx.accounts[1];
        assert_equal_if_active(active, &self.account_index, &ctx.accounts[0].index)?;
        assert_equal_if_active(active, &self.nft_index, &nft.nft_index)?;
        assert_equal_if_active(active, &self.creator_account_index, &creator.index)?;

        let owner = self.is_owner(ctx)?;
        let zero = FpVar::zero();
        let pairs = [
            (&self.creator_account_index, &nft.creator_account_index),
            (&self.creator_account_name_hash, &creator.name_hash),
            (&self.creator_treasury_rate, &nft.creator_treasury_rate),
            (&self.collection_id, &nft.collection_id),
            (&self.nft_content_hash, &nft.content_hash),
            (&self.nft_l1_address, &nft.l1_address),
            (&self.nft_l1_token_id, &nft.l1_token_id),
        ];
        for (claimed, stored) in pairs {
            assert_equal_if_active(active, claimed, &owner.select(stored, &zero)?)?;
        }
        Ok(())
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        vec![
            Bits(self.account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.creator_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.creator_treasury_rate.clone(), RATE_BITS),
            Bits(self.nft_index.clone(), NFT_INDEX_BITS),
            Bits(self.collection_id.clone(), COLLECTION_ID_BITS),
            Bits(self.nft_l1_address.clone(), ADDRESS_BITS),
            Element(self.account_name_hash.clone()),
            Element(self.creator_account_name_hash.clone()),
            Element(self.nft_content_hash.clone()),
            Element(self.nft_l1_token_id.clone()),
        ]
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        vec![
            self.account_index.clone(),
            self.account_name_hash.clone(),
            self.creator_account_index.clone(),
            self.creator_account_name_hash.clone(),
            self.nft_index.clone(),
            self.creator_treasury_rate.clone(),
            self.collection_id.clone(),
            self.nft_content_hash.clone(),
            self.nft_l1_address.clone(),
            self.nft_l1_token_id.clone(),
        ]
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        let owner = self.is_owner(ctx)?;
        let empty = NftVar::empty_at(&ctx.nft.nft_index);
        delta.nft = NftVar {
            nft_index: ctx.nft.nft_index.clone(),
            creator_account_index: owner.select(&empty.creator_account_index, &ctx.nft.creator_account_index)?,
            owner_account_index: owner.select(&empty.owner_account_index, &ctx.nft.owner_account_index)?,
            content_hash: owner.select(&empty.content_hash, &ctx.nft.content_hash)?,
            l1_address: owner.select(&empty.l1_address, &ctx.nft.l1_address)?,
            l1_token_id: owner.select(&empty.l1_token_id, &ctx.nft.l1_token_id)?,
            creator_treasury_rate: owner.select(&empty.creator_treasury_rate, &ctx.nft.creator_treasury_rate)?,
            collection_id: owner.select(&empty.collection_id, &ctx.nft.collection_id)?,
        };
        Ok(delta)
    }
}
