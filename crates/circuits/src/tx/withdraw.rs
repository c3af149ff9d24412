//! Withdrawal of an asset balance to a layer-1 address.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{GasFee, GasFeeVar, NativeTx, StateView, TxContextVar, TxGadget, TxSlots, TxType};
use crate::comparators::{assert_equal_if_active, assert_less_or_equal_if_active};
use crate::config::{ACCOUNT_INDEX_BITS, ADDRESS_BITS, ASSET_ID_BITS, BALANCE_BITS};
use crate::delta::{signed, TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::{address_to_fr, witness};
use crate::pubdata::PubdataField::{self, Bits};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WithdrawTx {
    pub from_account_index: u32,
    pub asset_id: u16,
    pub asset_amount: u128,
    pub to_address: [u8; 20],
    pub gas: GasFee,
}

impl NativeTx for WithdrawTx {
    fn tx_type(&self) -> TxType {
        TxType::Withdraw
    }

    fn slots(&self, _state: &dyn StateView) -> TxSlots {
        let mut slots = TxSlots::default();
        slots.accounts[0] = self.from_account_index;
        slots.assets[0][0] = self.asset_id;
        self.gas.assign_slots(&mut slots);
        slots
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        let mut fields = vec![
            Bits(Fr::from(self.from_account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.asset_id), ASSET_ID_BITS),
            Bits(Fr::from(self.asset_amount), BALANCE_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields.push(Bits(address_to_fr(&self.to_address), ADDRESS_BITS));
        fields
    }

    fn hash_fields(&self) -> Vec<Fr> {
        let mut fields = vec![
            Fr::from(self.from_account_index),
            Fr::from(self.asset_id),
            Fr::from(self.asset_amount),
            address_to_fr(&self.to_address),
        ];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, _state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        let mut delta = TxDelta::default();
        delta.add_balance(0, 0, -signed(self.asset_amount)?);
        self.gas.apply(&mut delta)?;
        Ok(delta)
    }
}

#[derive(Clone, Debug)]
pub struct WithdrawTxVar {
    pub from_account_index: FpVar<Fr>,
    pub asset_id: FpVar<Fr>,
    pub asset_amount: FpVar<Fr>,
    pub to_address: FpVar<Fr>,
    pub gas: GasFeeVar,
}

impl WithdrawTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &WithdrawTx,
        active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        Ok(Self {
            from_account_index: witness(cs, Fr::from(tx.from_account_index))?,
            asset_id: witness(cs, Fr::from(tx.asset_id))?,
            asset_amount: witness(cs, Fr::from(tx.asset_amount))?,
            to_address: witness(cs, address_to_fr(&tx.to_address))?,
            gas: GasFeeVar::new_witness(cs, &tx.gas, active)?,
        })
    }
}

impl TxGadget for WithdrawTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        assert_equal_if_active(active, &self.from_account_index, &ctx.accounts[0].index)?;
        assert_equal_if_active(active, &self.asset_id, &ctx.assets[0][0].asset_id)?;
        assert_less_or_equal_if_active(active, &self.asset_amount, &ctx.assets[0][0].balance, BALANCE_BITS)?;
        self.gas.validate(active, ctx)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        let mut fields = vec![
            Bits(self.from_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.asset_id.clone(), ASSET_ID_BITS),
            Bits(self.asset_amount.clone(), BALANCE_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields.push(Bits(self.to_address.clone(), ADDRESS_BITS));
        fields
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        let mut fields = vec![
            self.from_account_index.clone(),
            self.asset_id.clone(),
            self.asset_amount.clone(),
            self.to_address.clone(),
        ];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        delta.sub_balance(0, 0, &self.asset_amount);
        self.gas.apply(&mut delta);
        Ok(delta)
    }
}
