//! Layer-1 deposit credited to a registered account.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{NativeTx, StateView, TxContextVar, TxGadget, TxSlots, TxType};
use crate::comparators::assert_equal_if_active;
use crate::config::{ACCOUNT_INDEX_BITS, ASSET_ID_BITS, BALANCE_BITS};
use crate::delta::{signed, TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::witness;
use crate::pubdata::PubdataField::{self, Bits, Element};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DepositTx {
    pub account_index: u32,
    pub account_name_hash: Fr,
    pub asset_id: u16,
    pub asset_amount: u128,
}

impl NativeTx for DepositTx {
    fn tx_type(&self) -> TxType {
        TxType::Deposit
    }

    fn slots(&self, _state: &dyn StateView) -> TxSlots {
        let mut slots = TxSlots::default();
        slots.accounts[0] = self.account_index;
        slots.assets[0][0] = self.asset_id;
        slots
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        vec![
            Bits(Fr::from(self.account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.asset_id), ASSET_ID_BITS),
            Bits(Fr::from(self.asset_amount), BALANCE_BITS),
            Element(self.account_name_hash),
        ]
    }

    fn hash_fields(&self) -> Vec<Fr> {
        vec![
            Fr::from(self.account_index),
            self.account_name_hash,
            Fr::from(self.asset_id),
            Fr::from(self.asset_amount),
        ]
    }

    fn deltas(&self, _state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        let mut delta = TxDelta::default();
        delta.add_balance(0, 0, signed(self.asset_amount)?);
        Ok(delta)
    }
}

#[derive(Clone, Debug)]
pub struct DepositTxVar {
    pub account_index: FpVar<Fr>,
    pub account_name_hash: FpVar<Fr>,
    pub asset_id: FpVar<Fr>,
    pub asset_amount: FpVar<Fr>,
}

impl DepositTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &DepositTx,
        _active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        Ok(Self {
            account_index: witness(cs, Fr::from(tx.account_index))?,
            account_name_hash: witness(cs, tx.account_name_hash)?,
            asset_id: witness(cs, Fr::from(tx.asset_id))?,
            asset_amount: witness(cs, Fr::from(tx.asset_amount))?,
        })
    }
}

impl TxGadget for DepositTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        assert_equal_if_active(active, &self.account_index, &ctx.accounts[0].index)?;
        assert_equal_if_active(active, &self.account_name_hash, &ctx.accounts[0].name_hash)?;
        assert_equal_if_active(active, &self.asset_id, &ctx.assets[0][0].asset_id)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        vec![
            Bits(self.account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.asset_id.clone(), ASSET_ID_BITS),
            Bits(self.asset_amount.clone(), BALANCE_BITS),
            Element(self.account_name_hash.clone()),
        ]
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        vec![
            self.account_index.clone(),
            self.account_name_hash.clone(),
            self.asset_id.clone(),
            self.asset_amount.clone(),
        ]
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        delta.add_balance(0, 0, &self.asset_amount);
        Ok(delta)
    }
}
