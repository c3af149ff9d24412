//! Gas fee shared by every layer-2 type.
//!
//! The sender pays from asset slot 3 of account slot 0; the gas account sits
//! in account slot 4 and receives on its asset slot 3.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{TxContextVar, TxSlots};
use crate::comparators::{assert_equal_if_active, assert_less_or_equal_if_active};
use crate::config::{ACCOUNT_INDEX_BITS, ASSET_ID_BITS, BALANCE_BITS, PACKED_FEE_BITS};
use crate::delta::{signed, TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::witness;
use crate::packed::{unpack_fee, unpack_fee_var};
use crate::pubdata::PubdataField;

pub(crate) const GAS_ACCOUNT_SLOT: usize = 4;
pub(crate) const GAS_ASSET_SLOT: usize = 3;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GasFee {
    pub gas_account_index: u32,
    pub gas_fee_asset_id: u16,
    /// Packed fee.
    pub gas_fee_asset_amount: u64,
}

impl GasFee {
    pub fn assign_slots(&self, slots: &mut TxSlots) {
        slots.accounts[GAS_ACCOUNT_SLOT] = self.gas_account_index;
        slots.assets[0][GAS_ASSET_SLOT] = self.gas_fee_asset_id;
        slots.assets[GAS_ACCOUNT_SLOT][GAS_ASSET_SLOT] = self.gas_fee_asset_id;
    }

    pub fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        vec![
            PubdataField::Bits(Fr::from(self.gas_account_index), ACCOUNT_INDEX_BITS),
            PubdataField::Bits(Fr::from(self.gas_fee_asset_id), ASSET_ID_BITS),
            PubdataField::Bits(Fr::from(self.gas_fee_asset_amount), PACKED_FEE_BITS),
        ]
    }

    pub fn hash_fields(&self) -> Vec<Fr> {
        vec![
            Fr::from(self.gas_account_index),
            Fr::from(self.gas_fee_asset_id),
            Fr::from(self.gas_fee_asset_amount),
        ]
    }

    pub fn apply(&self, delta: &mut TxDelta) -> Result<(), WitnessError> {
        let fee = signed(unpack_fee(self.gas_fee_asset_amount)?)?;
        delta.add_balance(0, GAS_ASSET_SLOT, -fee);
        delta.add_balance(GAS_ACCOUNT_SLOT, GAS_ASSET_SLOT, fee);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct GasFeeVar {
    pub gas_account_index: FpVar<Fr>,
    pub gas_fee_asset_id: FpVar<Fr>,
    pub gas_fee_asset_amount: FpVar<Fr>,
    /// Unpacked fee, zero when the owning type is inactive.
    pub fee: FpVar<Fr>,
}

impl GasFeeVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        gas: &GasFee,
        active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        let gas_fee_asset_amount = witness(cs, Fr::from(gas.gas_fee_asset_amount))?;
        let fee = unpack_fee_var(active, &gas_fee_asset_amount)?;
        Ok(Self {
            gas_account_index: witness(cs, Fr::from(gas.gas_account_index))?,
            gas_fee_asset_id: witness(cs, Fr::from(gas.gas_fee_asset_id))?,
            gas_fee_asset_amount,
            fee,
        })
    }

    pub fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        let payer = &ctx.assets[0][GAS_ASSET_SLOT];
        let receiver = &ctx.assets[GAS_ACCOUNT_SLOT][GAS_ASSET_SLOT];
        assert_equal_if_active(active, &self.gas_account_index, &ctx.accounts[GAS_ACCOUNT_SLOT].index)?;
        assert_equal_if_active(active, &self.gas_fee_asset_id, &payer.asset_id)?;
        assert_equal_if_active(active, &self.gas_fee_asset_id, &receiver.asset_id)?;
        assert_less_or_equal_if_active(active, &self.fee, &payer.balance, BALANCE_BITS)
    }

    pub fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        vec![
            PubdataField::Bits(self.gas_account_index.clone(), ACCOUNT_INDEX_BITS),
            PubdataField::Bits(self.gas_fee_asset_id.clone(), ASSET_ID_BITS),
            PubdataField::Bits(self.gas_fee_asset_amount.clone(), PACKED_FEE_BITS),
        ]
    }

    pub fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        vec![
            self.gas_account_index.clone(),
            self.gas_fee_asset_id.clone(),
            self.gas_fee_asset_amount.clone(),
        ]
    }

    pub fn apply(&self, delta: &mut TxDeltaVar) {
        delta.sub_balance(0, GAS_ASSET_SLOT, &self.fee);
        delta.add_balance(GAS_ACCOUNT_SLOT, GAS_ASSET_SLOT, &self.fee);
    }
}
