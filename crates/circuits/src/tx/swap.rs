//! Constant-product swap against a liquidity pool.
//!
//! Slots: account 0 the trader with asset slot 0 the input asset and asset
//! slot 1 the output asset. The swap direction follows from which side of the
//! pool holds the input asset.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::add_liquidity::check_amm_width;
use super::{GasFee, GasFeeVar, NativeTx, StateView, TxContextVar, TxGadget, TxSlots, TxType};
use crate::comparators::{
    assert_equal_if_active, assert_less_if_active, assert_less_or_equal_if_active, enforce_range_if_active,
};
use crate::config::{
    ACCOUNT_INDEX_BITS, AMM_AMOUNT_BITS, BALANCE_BITS, PACKED_AMOUNT_BITS, PAIR_INDEX_BITS, RATE_BASE,
};
use crate::delta::{signed, TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::witness;
use crate::model::LiquidityPoolVar;
use crate::packed::{unpack_amount, unpack_amount_var};
use crate::pubdata::PubdataField::{self, Bits};

/// Bound on both sides of the invariant: two reserves, a rate and two rate
/// bases multiplied together.
const INVARIANT_BITS: usize = 2 * AMM_AMOUNT_BITS + 40;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SwapTx {
    pub from_account_index: u32,
    pub pair_index: u16,
    pub asset_a_id: u16,
    /// Packed input amount.
    pub asset_a_amount: u64,
    pub asset_b_id: u16,
    /// Packed minimum output accepted by the trader.
    pub asset_b_min_amount: u64,
    /// Packed output actually paid out.
    pub asset_b_amount_delta: u64,
    pub gas: GasFee,
}

impl NativeTx for SwapTx {
    fn tx_type(&self) -> TxType {
        TxType::Swap
    }

    fn slots(&self, _state: &dyn StateView) -> TxSlots {
        let mut slots = TxSlots {
            pair_index: self.pair_index,
            ..Default::default()
        };
        slots.accounts[0] = self.from_account_index;
        slots.assets[0][0] = self.asset_a_id;
        slots.assets[0][1] = self.asset_b_id;
        self.gas.assign_slots(&mut slots);
        slots
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        let mut fields = vec![
            Bits(Fr::from(self.from_account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.pair_index), PAIR_INDEX_BITS),
            Bits(Fr::from(self.asset_a_amount), PACKED_AMOUNT_BITS),
            Bits(Fr::from(self.asset_b_amount_delta), PACKED_AMOUNT_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields
    }

    fn hash_fields(&self) -> Vec<Fr> {
        let mut fields = vec![
            Fr::from(self.from_account_index),
            Fr::from(self.pair_index),
            Fr::from(self.asset_a_id),
            Fr::from(self.asset_a_amount),
            Fr::from(self.asset_b_id),
            Fr::from(self.asset_b_min_amount),
            Fr::from(self.asset_b_amount_delta),
        ];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        let pool = state.pool(self.pair_index);
        let amount_in = unpack_amount(self.asset_a_amount)?;
        let amount_out = unpack_amount(self.asset_b_amount_delta)?;
        check_amm_width(
            self.pair_index,
            &[
                ("reserve a", pool.asset_a),
                ("reserve b", pool.asset_b),
                ("amount in", amount_in),
                ("amount out", amount_out),
            ],
        )?;
        let (amount_in, amount_out) = (signed(amount_in)?, signed(amount_out)?);
        let mut delta = TxDelta::default();
        delta.add_balance(0, 0, -amount_in);
        delta.add_balance(0, 1, amount_out);
        if pool.asset_a_id == self.asset_a_id {
            delta.liquidity.asset_a = amount_in;
            delta.liquidity.asset_b = -amount_out;
        } else {
            delta.liquidity.asset_a = -amount_out;
            delta.liquidity.asset_b = amount_in;
        }
        self.gas.apply(&mut delta)?;
        Ok(delta)
    }
}

#[derive(Clone, Debug)]
pub struct SwapTxVar {
    pub from_account_index: FpVar<Fr>,
    pub pair_index: FpVar<Fr>,
    pub asset_a_id: FpVar<Fr>,
    pub asset_a_amount: FpVar<Fr>,
    pub asset_b_id: FpVar<Fr>,
    pub asset_b_min_amount: FpVar<Fr>,
    pub asset_b_amount_delta: FpVar<Fr>,
    pub amount_in: FpVar<Fr>,
    pub min_amount_out: FpVar<Fr>,
    pub amount_out: FpVar<Fr>,
    pub gas: GasFeeVar,
}

/// Pool sides as seen from the trader.
struct Direction {
    is_a_in: Boolean<Fr>,
    reserve_in: FpVar<Fr>,
    reserve_out: FpVar<Fr>,
}

impl SwapTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &SwapTx,
        active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        let asset_a_amount = witness(cs, Fr::from(tx.asset_a_amount))?;
        let asset_b_min_amount = witness(cs, Fr::from(tx.asset_b_min_amount))?;
        let asset_b_amount_delta = witness(cs, Fr::from(tx.asset_b_amount_delta))?;
        Ok(Self {
            from_account_index: witness(cs, Fr::from(tx.from_account_index))?,
            pair_index: witness(cs, Fr::from(tx.pair_index))?,
            asset_a_id: witness(cs, Fr::from(tx.asset_a_id))?,
            asset_b_id: witness(cs, Fr::from(tx.asset_b_id))?,
            amount_in: unpack_amount_var(active, &asset_a_amount)?,
            min_amount_out: unpack_amount_var(active, &asset_b_min_amount)?,
            amount_out: unpack_amount_var(active, &asset_b_amount_delta)?,
            asset_a_amount,
            asset_b_min_amount,
            asset_b_amount_delta,
            gas: GasFeeVar::new_witness(cs, &tx.gas, active)?,
        })
    }

    fn direction(&self, pool: &LiquidityPoolVar) -> Result<Direction, SynthesisError> {
        let is_a_in = pool.asset_a_id.is_eq(&self.asset_a_id)?;
        Ok(Direction {
            reserve_in: is_a_in.select(&pool.asset_a, &pool.asset_b)?,
            reserve_out: is_a_in.select(&pool.asset_b, &pool.asset_a)?,
            is_a_in,
        })
    }
}

impl TxGadget for SwapTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        let pool = &ctx.pool;
        assert_equal_if_active(active, &self.from_account_index, &ctx.accounts[0].index)?;
        assert_equal_if_active(active, &self.pair_index, &pool.pair_index)?;
        assert_equal_if_active(active, &self.asset_a_id, &ctx.assets[0][0].asset_id)?;
        assert_equal_if_active(active, &self.asset_b_id, &ctx.assets[0][1].asset_id)?;

        let Direction {
            is_a_in,
            reserve_in,
            reserve_out,
        } = self.direction(pool)?;
        let pool_in_id = is_a_in.select(&pool.asset_a_id, &pool.asset_b_id)?;
        let pool_out_id = is_a_in.select(&pool.asset_b_id, &pool.asset_a_id)?;
        assert_equal_if_active(active, &self.asset_a_id, &pool_in_id)?;
        assert_equal_if_active(active, &self.asset_b_id, &pool_out_id)?;

        for value in [&reserve_in, &reserve_out, &self.amount_in, &self.amount_out] {
            enforce_range_if_active(active, value, AMM_AMOUNT_BITS)?;
        }
        assert_less_or_equal_if_active(active, &self.amount_in, &ctx.assets[0][0].balance, BALANCE_BITS)?;
        assert_less_or_equal_if_active(active, &self.min_amount_out, &self.amount_out, AMM_AMOUNT_BITS)?;
        assert_less_if_active(active, &self.amount_out, &reserve_out, AMM_AMOUNT_BITS)?;

        // r_in * r_out * RB^2 <= (r_in * RB + in * (RB - fee)) * (r_out - out) * RB
        let base = Fr::from(RATE_BASE);
        let before = &reserve_in * &reserve_out * (base * base);
        let fee_factor = FpVar::constant(base) - &pool.fee_rate;
        let adjusted_in = &reserve_in * base + &self.amount_in * fee_factor;
        let after = adjusted_in * (&reserve_out - &self.amount_out) * base;
        assert_less_or_equal_if_active(active, &before, &after, INVARIANT_BITS)?;

        self.gas.validate(active, ctx)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        let mut fields = vec![
            Bits(self.from_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.pair_index.clone(), PAIR_INDEX_BITS),
            Bits(self.asset_a_amount.clone(), PACKED_AMOUNT_BITS),
            Bits(self.asset_b_amount_delta.clone(), PACKED_AMOUNT_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        let mut fields = vec![
            self.from_account_index.clone(),
            self.pair_index.clone(),
            self.asset_a_id.clone(),
            self.asset_a_amount.clone(),
            self.asset_b_id.clone(),
            self.asset_b_min_amount.clone(),
            self.asset_b_amount_delta.clone(),
        ];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let Direction { is_a_in, .. } = self.direction(&ctx.pool)?;
        let mut delta = ctx.identity_delta();
        delta.sub_balance(0, 0, &self.amount_in);
        delta.add_balance(0, 1, &self.amount_out);
        let paid_out = self.amount_out.negate()?;
        delta.liquidity.asset_a = is_a_in.select(&self.amount_in, &paid_out)?;
        delta.liquidity.asset_b = is_a_in.select(&paid_out, &self.amount_in)?;
        self.gas.apply(&mut delta);
        Ok(delta)
    }
}
