//! Change of an existing pool's fee and treasury parameters.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{assert_rate_if_active, NativeTx, StateView, TxContextVar, TxGadget, TxSlots, TxType};
use crate::comparators::{assert_equal_if_active, assert_true_if_active};
use crate::config::{ACCOUNT_INDEX_BITS, PAIR_INDEX_BITS, RATE_BITS};
use crate::delta::{LiquidityDelta, PairSettings, TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::witness;
use crate::pubdata::PubdataField::{self, Bits};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdatePairRateTx {
    pub pair_index: u16,
    pub fee_rate: u16,
    pub treasury_account_index: u32,
    pub treasury_rate: u16,
}

impl NativeTx for UpdatePairRateTx {
    fn tx_type(&self) -> TxType {
        TxType::UpdatePairRate
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
            Bits(Fr::from(self.fee_rate), RATE_BITS),
            Bits(Fr::from(self.treasury_account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.treasury_rate), RATE_BITS),
        ]
    }

    fn hash_fields(&self) -> Vec<Fr> {
        vec![
            Fr::from(self.pair_index),
            Fr::from(self.fee_rate),
            Fr::from(self.treasury_account_index),
            Fr::from(self.treasury_rate),
        ]
    }

    fn deltas(&self, state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        let pool = state.pool(self.pair_index);
        Ok(TxDelta {
            liquidity: LiquidityDelta {
                settings: Some(PairSettings {
                    asset_a_id: pool.asset_a_id,
                    asset_b_id: pool.asset_b_id,
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
pub struct UpdatePairRateTxVar {
    pub pair_index: FpVar<Fr>,
    pub fee_rate: FpVar<Fr>,
    pub treasury_account_index: FpVar<Fr>,
    pub treasury_rate: FpVar<Fr>,
}

impl UpdatePairRateTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &UpdatePairRateTx,
        _active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        Ok(Self {
            pair_index: witness(cs, Fr::from(tx.pair_index))?,
            fee_rate: witness(cs, Fr::from(tx.fee_rate))?,
            treasury_account_index: witness(cs, Fr::from(tx.treasury_account_index))?,
            treasury_rate: witness(cs, Fr::from(tx.treasury_rate))?,
        })
    }
}

impl TxGadget for UpdatePairRateTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        let pool = &ctx.pool;
        assert_equal_if_active(active, &self.pair_index, &pool.pair_index)?;
        // a created pool always has distinct asset ids, an empty one has 0/0
        let is_empty = pool.asset_a_id.is_eq(&pool.asset_b_id)?;
        assert_true_if_active(active, &is_empty.not())?;
        assert_rate_if_active(active, &self.fee_rate)?;
        assert_rate_if_active(active, &self.treasury_rate)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        vec![
            Bits(self.pair_index.clone(), PAIR_INDEX_BITS),
            Bits(self.fee_rate.clone(), RATE_BITS),
            Bits(self.treasury_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.treasury_rate.clone(), RATE_BITS),
        ]
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        vec![
            self.pair_index.clone(),
            self.fee_rate.clone(),
            self.treasury_account_index.clone(),
            self.treasury_rate.clone(),
        ]
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        let pool = &mut delta.liquidity;
        pool.fee_rate = self.fee_rate.clone();
        pool.treasury_account_index = self.treasury_account_index.clone();
        pool.treasury_rate = self.treasury_rate.clone();
        Ok(delta)
    }
}
