//! Withdrawal of an owned NFT to layer 1.
//!
//! Slots: account 0 owner, account 1 creator. The pubdata carries the full
//! NFT so layer 1 can mint it.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{GasFee, GasFeeVar, NativeTx, StateView, TxContextVar, TxGadget, TxSlots, TxType};
use crate::comparators::assert_equal_if_active;
use crate::config::{ACCOUNT_INDEX_BITS, ADDRESS_BITS, COLLECTION_ID_BITS, NFT_INDEX_BITS, RATE_BITS};
use crate::delta::{TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::{address_to_fr, witness};
use crate::model::{Nft, NftVar};
use crate::pubdata::PubdataField::{self, Bits, Element};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WithdrawNftTx {
    pub account_index: u32,
    pub creator_account_index: u32,
    pub creator_account_name_hash: Fr,
    pub nft_index: u64,
    pub nft_content_hash: Fr,
    pub nft_l1_address: [u8; 20],
    pub nft_l1_token_id: Fr,
    pub creator_treasury_rate: u16,
    pub collection_id: u16,
    pub to_address: [u8; 20],
    pub gas: GasFee,
}

impl WithdrawNftTx {
    /// Withdrawal of `nft` as currently stored, by its owner.
    pub fn for_nft(nft: &Nft, creator_account_name_hash: Fr, to_address: [u8; 20], gas: GasFee) -> Self {
        Self {
            account_index: nft.owner_account_index,
            creator_account_index: nft.creator_account_index,
            creator_account_name_hash,
            nft_index: nft.nft_index,
            nft_content_hash: nft.content_hash,
            nft_l1_address: nft.l1_address,
            nft_l1_token_id: nft.l1_token_id,
            creator_treasury_rate: nft.creator_treasury_rate,
            collection_id: nft.collection_id,
            to_address,
            gas,
        }
    }
}

impl NativeTx for WithdrawNftTx {
    fn tx_type(&self) -> TxType {
        TxType::WithdrawNft
    }

    fn slots(&self, _state: &dyn StateView) -> TxSlots {
        let mut slots = TxSlots {
            nft_index: self.nft_index,
            ..Default::default()
        };
        slots.accounts[0] = self.account_index;
        slots.accounts[1] = self.creator_account_index;
        self.gas.assign_slots(&mut slots);
        slots
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        let mut fields = vec![
            Bits(Fr::from(self.account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.creator_account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.creator_treasury_rate), RATE_BITS),
            Bits(Fr::from(self.nft_index), NFT_INDEX_BITS),
            Bits(Fr::from(self.collection_id), COLLECTION_ID_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields.extend([
            Bits(address_to_fr(&self.nft_l1_address), ADDRESS_BITS),
            Bits(address_to_fr(&self.to_address), ADDRESS_BITS),
            Element(self.nft_content_hash),
            Element(self.nft_l1_token_id),
            Element(self.creator_account_name_hash),
        ]);
        fields
    }

    fn hash_fields(&self) -> Vec<Fr> {
        let mut fields = vec![
            Fr::from(self.account_index),
            Fr::from(self.creator_account_index),
            self.creator_account_name_hash,
            Fr::from(self.nft_index),
            self.nft_content_hash,
            address_to_fr(&self.nft_l1_address),
            self.nft_l1_token_id,
            Fr::from(self.creator_treasury_rate),
            Fr::from(self.collection_id),
            address_to_fr(&self.to_address),
        ];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, _state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        let mut delta = TxDelta {
            nft: Some(Nft::empty(self.nft_index)),
            ..Default::default()
        };
        self.gas.apply(&mut delta)?;
        Ok(delta)
    }
}

#[derive(Clone, Debug)]
pub struct WithdrawNftTxVar {
    pub account_index: FpVar<Fr>,
    pub creator_account_index: FpVar<Fr>,
    pub creator_account_name_hash: FpVar<Fr>,
    pub nft_index: FpVar<Fr>,
    pub nft_content_hash: FpVar<Fr>,
    pub nft_l1_address: FpVar<Fr>,
    pub nft_l1_token_id: FpVar<Fr>,
    pub creator_treasury_rate: FpVar<Fr>,
    pub collection_id: FpVar<Fr>,
    pub to_address: FpVar<Fr>,
    pub gas: GasFeeVar,
}

impl WithdrawNftTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &WithdrawNftTx,
        active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        Ok(Self {
            account_index: witness(cs, Fr::from(tx.account_index))?,
            creator_account_index: witness(cs, Fr::from(tx.creator_account_index))?,
            creator_account_name_hash: witness(cs, tx.creator_account_name_hash)?,
            nft_index: witness(cs, Fr::from(tx.nft_index))?,
            nft_content_hash: witness(cs, tx.nft_content_hash)?,
            nft_l1_address: witness(cs, address_to_fr(&tx.nft_l1_address))?,
            nft_l1_token_id: witness(cs, tx.nft_l1_token_id)?,
            creator_treasury_rate: witness(cs, Fr::from(tx.creator_treasury_rate))?,
            collection_id: witness(cs, Fr::from(tx.collection_id))?,
            to_address: witness(cs, address_to_fr(&tx.to_address))?,
            gas: GasFeeVar::new_witness(cs, &tx.gas, active)?,
        })
    }
}

impl TxGadget for WithdrawNftTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        let nft = &ctx.nft;
        let creator = &ctx.accounts[1];
        assert_equal_if_active(active, &self.account_index, &ctx.accounts[0].index)?;
        assert_equal_if_active(active, &self.creator_account_index, &creator.index)?;
        assert_equal_if_active(active, &self.creator_account_name_hash, &creator.name_hash)?;

        let pairs = [
            (&self.nft_index, &nft.nft_index),
            (&self.account_index, &nft.owner_account_index),
            (&self.creator_account_index, &nft.creator_account_index),
            (&self.nft_content_hash, &nft.content_hash),
            (&self.nft_l1_address, &nft.l1_address),
            (&self.nft_l1_token_id, &nft.l1_token_id),
            (&self.creator_treasury_rate, &nft.creator_treasury_rate),
            (&self.collection_id, &nft.collection_id),
        ];
        for (claimed, stored) in pairs {
            assert_equal_if_active(active, claimed, stored)?;
        }
        self.gas.validate(active, ctx)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        let mut fields = vec![
            Bits(self.account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.creator_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.creator_treasury_rate.clone(), RATE_BITS),
            Bits(self.nft_index.clone(), NFT_INDEX_BITS),
            Bits(self.collection_id.clone(), COLLECTION_ID_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields.extend([
            Bits(self.nft_l1_address.clone(), ADDRESS_BITS),
            Bits(self.to_address.clone(), ADDRESS_BITS),
            Element(self.nft_content_hash.clone()),
            Element(self.nft_l1_token_id.clone()),
            Element(self.creator_account_name_hash.clone()),
        ]);
        fields
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        let mut fields = vec![
            self.account_index.clone(),
            self.creator_account_index.clone(),
            self.creator_account_name_hash.clone(),
            self.nft_index.clone(),
            self.nft_content_hash.clone(),
            self.nft_l1_address.clone(),
            self.nft_l1_token_id.clone(),
            self.creator_treasury_rate.clone(),
            self.collection_id.clone(),
            self.to_address.clone(),
        ];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        delta.nft = NftVar::empty_at(&ctx.nft.nft_index);
        self.gas.apply(&mut delta);
        Ok(delta)
    }
}
