//! Layer-2 transfer of one asset between two accounts.
//!
//! Slots: account 0 sender, account 1 receiver, asset slot 0 on both.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{GasFee, GasFeeVar, NativeTx, StateView, TxContextVar, TxGadget, TxSlots, TxType};
use crate::comparators::{assert_equal_if_active, assert_less_or_equal_if_active};
use crate::config::{ACCOUNT_INDEX_BITS, ASSET_ID_BITS, BALANCE_BITS, PACKED_AMOUNT_BITS};
use crate::delta::{signed, TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::witness;
use crate::packed::{unpack_amount, unpack_amount_var};
use crate::pubdata::PubdataField::{self, Bits, Element};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferTx {
    pub from_account_index: u32,
    pub to_account_index: u32,
    pub to_account_name_hash: Fr,
    pub asset_id: u16,
    /// Packed amount.
    pub asset_amount: u64,
    pub gas: GasFee,
    pub call_data_hash: Fr,
}

impl NativeTx for TransferTx {
    fn tx_type(&self) -> TxType {
        TxType::Transfer
    }

    fn slots(&self, _state: &dyn StateView) -> TxSlots {
        let mut slots = TxSlots::default();
        slots.accounts[0] = self.from_account_index;
        slots.accounts[1] = self.to_account_index;
        slots.assets[0][0] = self.asset_id;
        slots.assets[1][0] = self.asset_id;
        self.gas.assign_slots(&mut slots);
        slots
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        let mut fields = vec![
            Bits(Fr::from(self.from_account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.to_account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.asset_id), ASSET_ID_BITS),
            Bits(Fr::from(self.asset_amount), PACKED_AMOUNT_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields.push(Element(self.call_data_hash));
        fields
    }

    fn hash_fields(&self) -> Vec<Fr> {
        let mut fields = vec![
            Fr::from(self.from_account_index),
            Fr::from(self.to_account_index),
            self.to_account_name_hash,
            Fr::from(self.asset_id),
            Fr::from(self.asset_amount),
        ];
        fields.extend(self.gas.hash_fields());
        fields.push(self.call_data_hash);
        fields
    }

    fn deltas(&self, _state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        let amount = signed(unpack_amount(self.asset_amount)?)?;
        let mut delta = TxDelta::default();
        delta.add_balance(0, 0, -amount);
        delta.add_balance(1, 0, amount);
        self.gas.apply(&mut delta)?;
        Ok(delta)
    }
}

#[derive(Clone, Debug)]
pub struct TransferTxVar {
    pub from_account_index: FpVar<Fr>,
    pub to_account_index: FpVar<Fr>,
    pub to_account_name_hash: FpVar<Fr>,
    pub asset_id: FpVar<Fr>,
    pub asset_amount: FpVar<Fr>,
    pub amount: FpVar<Fr>,
    pub gas: GasFeeVar,
    pub call_data_hash: FpVar<Fr>,
}

impl TransferTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &TransferTx,
        active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        let asset_amount = witness(cs, Fr::from(tx.asset_amount))?;
        Ok(Self {
            from_account_index: witness(cs, Fr::from(tx.from_account_index))?,
            to_account_index: witness(cs, Fr::from(tx.to_account_index))?,
            to_account_name_hash: witness(cs, tx.to_account_name_hash)?,
            asset_id: witness(cs, Fr::from(tx.asset_id))?,
            amount: unpack_amount_var(active, &asset_amount)?,
            asset_amount,
            gas: GasFeeVar::new_witness(cs, &tx.gas, active)?,
            call_data_hash: witness(cs, tx.call_data_hash)?,
        })
    }
}

impl TxGadget for TransferTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        assert_equal_if_active(active, &self.from_account_index, &ctx.accounts[0].index)?;
        assert_equal_if_active(active, &self.to_account_index, &ctx.accounts[1].index)?;
        assert_equal_if_active(active, &self.to_account_name_hash, &ctx.accounts[1].name_hash)?;
        assert_equal_if_active(active, &self.asset_id, &ctx.assets[0][0].asset_id)?;
        assert_equal_if_active(active, &self.asset_id, &ctx.assets[1][0].asset_id)?;
        assert_less_or_equal_if_active(active, &self.amount, &ctx.assets[0][0].balance, BALANCE_BITS)?;
        self.gas.validate(active, ctx)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        let mut fields = vec![
            Bits(self.from_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.to_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.asset_id.clone(), ASSET_ID_BITS),
            Bits(self.asset_amount.clone(), PACKED_AMOUNT_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields.push(Element(self.call_data_hash.clone()));
        fields
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        let mut fields = vec![
            self.from_account_index.clone(),
            self.to_account_index.clone(),
            self.to_account_name_hash.clone(),
            self.asset_id.clone(),
            self.asset_amount.clone(),
        ];
        fields.extend(self.gas.hash_fields());
        fields.push(self.call_data_hash.clone());
        fields
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        delta.sub_balance(0, 0, &self.amount);
        delta.add_balance(1, 0, &self.amount);
        self.gas.apply(&mut delta);
        Ok(delta)
    }
}
