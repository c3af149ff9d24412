//! Cancellation of one of the sender's offers by marking its bitmap slot.
//!
//! Asset slot 0 of the sender holds the bitmap leaf named by the offer id.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{
    mark_offer_slot, GasFee, GasFeeVar, NativeTx, OfferSlotVar, StateView, TxContextVar, TxGadget, TxSlots, TxType,
};
use crate::comparators::assert_equal_if_active;
use crate::config::{ACCOUNT_INDEX_BITS, OFFER_ID_BITS, OFFER_SLOT_BITS};
use crate::delta::{TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::witness;
use crate::pubdata::PubdataField::{self, Bits};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CancelOfferTx {
    pub account_index: u32,
    pub offer_id: u32,
    pub gas: GasFee,
}

impl CancelOfferTx {
    fn bitmap_asset_id(&self) -> u16 {
        (self.offer_id >> OFFER_SLOT_BITS) as u16
    }
}

impl NativeTx for CancelOfferTx {
    fn tx_type(&self) -> TxType {
        TxType::CancelOffer
    }

    fn slots(&self, _state: &dyn StateView) -> TxSlots {
        let mut slots = TxSlots::default();
        slots.accounts[0] = self.account_index;
        slots.assets[0][0] = self.bitmap_asset_id();
        self.gas.assign_slots(&mut slots);
        slots
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        let mut fields = vec![
            Bits(Fr::from(self.account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.offer_id), OFFER_ID_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields
    }

    fn hash_fields(&self) -> Vec<Fr> {
        let mut fields = vec![Fr::from(self.account_index), Fr::from(self.offer_id)];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, _state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        let mut delta = TxDelta::default();
        delta.assets[0][0].set_offer_slot = Some(self.offer_id & ((1 << OFFER_SLOT_BITS) - 1));
        self.gas.apply(&mut delta)?;
        Ok(delta)
    }
}

#[derive(Clone, Debug)]
pub struct CancelOfferTxVar {
    pub account_index: FpVar<Fr>,
    pub offer_id: FpVar<Fr>,
    pub slot: OfferSlotVar,
    pub gas: GasFeeVar,
}

impl CancelOfferTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &CancelOfferTx,
        active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        let offer_id = witness(cs, Fr::from(tx.offer_id))?;
        Ok(Self {
            account_index: witness(cs, Fr::from(tx.account_index))?,
            slot: OfferSlotVar::new(active, &offer_id)?,
            offer_id,
            gas: GasFeeVar::new_witness(cs, &tx.gas, active)?,
        })
    }
}

impl TxGadget for CancelOfferTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        assert_equal_if_active(active, &self.account_index, &ctx.accounts[0].index)?;
        assert_equal_if_active(active, &self.slot.bitmap_asset_id, &ctx.assets[0][0].asset_id)?;
        self.gas.validate(active, ctx)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        let mut fields = vec![
            Bits(self.account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.offer_id.clone(), OFFER_ID_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        let mut fields = vec![self.account_index.clone(), self.offer_id.clone()];
        fields.extend(self.gas.hash_fields());
        fields
    }

    /// Marking the slot also asserts that it is still unset.
    fn deltas(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        let bitmap = &ctx.assets[0][0].offer_canceled_or_finalized;
        delta.assets[0][0].offer_canceled_or_finalized = mark_offer_slot(active, &self.slot, bitmap)?;
        self.gas.apply(&mut delta);
        Ok(delta)
    }
}
