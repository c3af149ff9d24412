//! Opening of an empty liquidity pool slot for an ordered asset pair.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{assert_rate_if_active, NativeTx, StateView, TxContextVar, TxGadget, TxSlots, TxType};
use crate::comparators::{assert_equal_if_active, assert_less_if_active};
use crate::config::{ACCOUNT_INDEX_BITS, ASSET_ID_BITS, PAIR_INDEX_BITS, RATE_BITS};
use crate::delta::{LiquidityDelta, PairSettings, TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::witness;
use crate::pubdata::PubdataField::{self, Bits};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreatePairTx {
    pub pair_index: u16,
    pub asset_a_id: u16,
    pub asset_b_id: u16,
    pub fee_rate: u16,
    pub treasury_account_index: u32,
    pub treasury_rate: u16,
}

impl NativeTx for CreatePairTx {
    fn tx_type(&self) -> TxType {
        TxType::CreatePair
    }

    fn slots(&self, _state: &dyn StateView) -> TxSlots {
        TxSlots {
            pair_index: self.pair_index,
            ..Default::default()
        }
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        vec![
            Bits(Fr::from(self.pair_index), PAIR_INDEX_BITS),
            Bits(Fr::from(self.asset_a_id), ASSET_ID_BITS),
            Bits(Fr::from(self.asset_b_id), ASSET_ID_BITS),
            Bits(Fr::from(self.fee_rate), RATE_BITS),
            Bits(Fr::from(self.treasury_account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.treasury_rate), RATE_BITS),
        ]
    }

    fn hash_fields(&self) -> Vec<Fr> {
        vec![
            Fr::from(self.pair_index),
            Fr::from(self.asset_a_id),
            Fr::from(self.asset_b_id),
            Fr::from(self.fee_rate),
            Fr::from(self.treasury_account_index),
            Fr::from(self.treasury_rate),
        ]
    }

    fn deltas(&self, _state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        Ok(TxDelta {
            liquidity: LiquidityDelta {
                settings: Some(PairSettings {
                    asset_a_id: self.asset_a_id,
                    asset_b_id: self.asset_b_id,
                    fee_rate: self.fee_rate,
                    treasury_account_index: self.treasury_account_index,
                    treasury_rate: self.treasury_rate,
                }),
                ..Default::default()
            },
            ..Default::default()
        })
    }
}

#[derive(Clone, Debug)]
pub struct CreatePairTxVar {
    pub pair_index: FpVar<Fr>,
    pub asset_a_id: FpVar<Fr>,
    pub asset_b_id: FpVar<Fr>,
    pub fee_rate: FpVar<Fr>,
    pub treasury_account_index: FpVar<Fr>,
    pub treasury_rate: FpVar<Fr>,
}

impl CreatePairTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &CreatePairTx,
        _active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        Ok(Self {
            pair_index: witness(cs, Fr::from(tx.pair_index))?,
            asset_a_id: witness(cs, Fr::from(tx.asset_a_id))?,
            asset_b_id: witness(cs, Fr::from(tx.asset_b_id))?,
            fee_rate: witness(cs, Fr::from(tx.fee_rate))?,
            treasury_account_index: witness(cs, Fr::from(tx.treasury_account_index))?,
            treasury_rate: witness(cs, Fr::from(tx.treasury_rate))?,
        })
    }
}

impl TxGadget for CreatePairTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        let pool = &ctx.pool;
        assert_equal_if_active(active, &self.pair_index, &pool.pair_index)?;
        assert_equal_if_active(active, &pool.asset_a_id, &FpVar::zero())?;
        assert_equal_if_active(active, &pool.asset_b_id, &FpVar::zero())?;
        assert_equal_if_active(active, &pool.lp_amount, &FpVar::zero())?;
        assert_less_if_active(active, &self.asset_a_id, &self.asset_b_id, ASSET_ID_BITS)?;
        assert_rate_if_active(active, &self.fee_rate)?;
        assert_rate_if_active(active, &self.treasury_rate)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        vec![
            Bits(self.pair_index.clone(), PAIR_INDEX_BITS),
            Bits(self.asset_a_id.clone(), ASSET_ID_BITS),
            Bits(self.asset_b_id.clone(), ASSET_ID_BITS),
            Bits(self.fee_rate.clone(), RATE_BITS),
            Bits(self.treasury_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.treasury_rate.clone(), RATE_BITS),
        ]
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        vec![
            self.pair_index.clone(),
            self.asset_a_id.clone(),
            self.asset_b_id.clone(),
            self.fee_rate.clone(),
            self.treasury_account_index.clone(),
            self.treasury_rate.clone(),
        ]
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        let pool = &mut delta.liquidity;
        pool.asset_a_id = self.asset_a_id.clone();
        pool.asset_b_id = self.asset_b_id.clone();
        pool.fee_rate = self.fee_rate.clone();
        pool.treasury_account_index = self.treasury_account_index.clone();
        pool.treasury_rate = self.treasury_rate.clone();
        Ok(delta)
    }
}
