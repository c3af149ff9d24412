//! Withdrawal of liquidity by burning LP.
//!
//! Uses the slot layout of [`super::AddLiquidityTx`].

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::add_liquidity::{
    assert_treasury_share, check_amm_width, liquidity_slots, validate_liquidity_slots, LP_ASSET_SLOT, SHARE_PRODUCT_BITS,
    TREASURY_ACCOUNT_SLOT,
};
use super::{GasFee, GasFeeVar, NativeTx, StateView, TxContextVar, TxGadget, TxSlots, TxType};
use crate::comparators::{assert_equal_if_active, assert_less_or_equal_if_active, enforce_range_if_active};
use crate::config::{ACCOUNT_INDEX_BITS, AMM_AMOUNT_BITS, BALANCE_BITS, PACKED_AMOUNT_BITS, PAIR_INDEX_BITS};
use crate::delta::{signed, TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::witness;
use crate::packed::{unpack_amount, unpack_amount_var};
use crate::pubdata::PubdataField::{self, Bits, Element};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoveLiquidityTx {
    pub from_account_index: u32,
    pub pair_index: u16,
    pub asset_a_id: u16,
    /// Packed minimum of asset A accepted.
    pub asset_a_min_amount: u64,
    pub asset_b_id: u16,
    /// Packed minimum of asset B accepted.
    pub asset_b_min_amount: u64,
    /// Packed LP burned.
    pub lp_amount: u64,
    /// Packed asset A paid out.
    pub asset_a_amount_delta: u64,
    /// Packed asset B paid out.
    pub asset_b_amount_delta: u64,
    /// Packed LP minted to the treasury.
    pub treasury_amount: u64,
    /// Reserve product after the withdrawal.
    pub k_last: Fr,
    pub gas: GasFee,
}

impl NativeTx for RemoveLiquidityTx {
    fn tx_type(&self) -> TxType {
        TxType::RemoveLiquidity
    }

    fn slots(&self, state: &dyn StateView) -> TxSlots {
        let pool = state.pool(self.pair_index);
        liquidity_slots(
            self.from_account_index,
            self.pair_index,
            self.asset_a_id,
            self.asset_b_id,
            pool.treasury_account_index,
            &self.gas,
        )
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        let mut fields = vec![
            Bits(Fr::from(self.from_account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.pair_index), PAIR_INDEX_BITS),
            Bits(Fr::from(self.lp_amount), PACKED_AMOUNT_BITS),
            Bits(Fr::from(self.asset_a_amount_delta), PACKED_AMOUNT_BITS),
            Bits(Fr::from(self.asset_b_amount_delta), PACKED_AMOUNT_BITS),
            Bits(Fr::from(self.treasury_amount), PACKED_AMOUNT_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields.push(Element(self.k_last));
        fields
    }

    fn hash_fields(&self) -> Vec<Fr> {
        let mut fields = vec![
            Fr::from(self.from_account_index),
            Fr::from(self.pair_index),
            Fr::from(self.asset_a_id),
            Fr::from(self.asset_a_min_amount),
            Fr::from(self.asset_b_id),
            Fr::from(self.asset_b_min_amount),
            Fr::from(self.lp_amount),
            Fr::from(self.asset_a_amount_delta),
            Fr::from(self.asset_b_amount_delta),
            Fr::from(self.treasury_amount),
            self.k_last,
        ];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        let pool = state.pool(self.pair_index);
        let (a, b) = (
            unpack_amount(self.asset_a_amount_delta)?,
            unpack_amount(self.asset_b_amount_delta)?,
        );
        let (lp, treasury) = (unpack_amount(self.lp_amount)?, unpack_amount(self.treasury_amount)?);
        check_amm_width(
            self.pair_index,
            &[
                ("reserve a", pool.asset_a),
                ("reserve b", pool.asset_b),
                ("pool lp", pool.lp_amount),
                ("amount a", a),
                ("amount b", b),
                ("lp", lp),
                ("treasury lp", treasury),
            ],
        )?;
        let (a, b, lp, treasury) = (signed(a)?, signed(b)?, signed(lp)?, signed(treasury)?);
        let mut delta = TxDelta::default();
        delta.add_balance(0, 0, a);
        delta.add_balance(0, 1, b);
        delta.add_lp(0, LP_ASSET_SLOT, -lp);
        delta.add_lp(TREASURY_ACCOUNT_SLOT, 0, treasury);
        delta.liquidity.asset_a = -a;
        delta.liquidity.asset_b = -b;
        delta.liquidity.lp_amount = treasury - lp;
        delta.liquidity.k_last = Some(self.k_last);
        self.gas.apply(&mut delta)?;
        Ok(delta)
    }
}

#[derive(Clone, Debug)]
pub struct RemoveLiquidityTxVar {
    pub from_account_index: FpVar<Fr>,
    pub pair_index: FpVar<Fr>,
    pub asset_a_id: FpVar<Fr>,
    pub asset_a_min_amount: FpVar<Fr>,
    pub asset_b_id: FpVar<Fr>,
    pub asset_b_min_amount: FpVar<Fr>,
    pub lp_amount: FpVar<Fr>,
    pub asset_a_amount_delta: FpVar<Fr>,
    pub asset_b_amount_delta: FpVar<Fr>,
    pub treasury_amount: FpVar<Fr>,
    pub k_last: FpVar<Fr>,
    pub min_a: FpVar<Fr>,
    pub min_b: FpVar<Fr>,
    pub lp: FpVar<Fr>,
    pub amount_a: FpVar<Fr>,
    pub amount_b: FpVar<Fr>,
    pub treasury: FpVar<Fr>,
    pub gas: GasFeeVar,
}

impl RemoveLiquidityTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &RemoveLiquidityTx,
        active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        let asset_a_min_amount = witness(cs, Fr::from(tx.asset_a_min_amount))?;
        let asset_b_min_amount = witness(cs, Fr::from(tx.asset_b_min_amount))?;
        let lp_amount = witness(cs, Fr::from(tx.lp_amount))?;
        let asset_a_amount_delta = witness(cs, Fr::from(tx.asset_a_amount_delta))?;
        let asset_b_amount_delta = witness(cs, Fr::from(tx.asset_b_amount_delta))?;
        let treasury_amount = witness(cs, Fr::from(tx.treasury_amount))?;
        Ok(Self {
            from_account_index: witness(cs, Fr::from(tx.from_account_index))?,
            pair_index: witness(cs, Fr::from(tx.pair_index))?,
            asset_a_id: witness(cs, Fr::from(tx.asset_a_id))?,
            asset_b_id: witness(cs, Fr::from(tx.asset_b_id))?,
            k_last: witness(cs, tx.k_last)?,
            min_a: unpack_amount_var(active, &asset_a_min_amount)?,
            min_b: unpack_amount_var(active, &asset_b_min_amount)?,
            lp: unpack_amount_var(active, &lp_amount)?,
            amount_a: unpack_amount_var(active, &asset_a_amount_delta)?,
            amount_b: unpack_amount_var(active, &asset_b_amount_delta)?,
            treasury: unpack_amount_var(active, &treasury_amount)?,
            asset_a_min_amount,
            asset_b_min_amount,
            lp_amount,
            asset_a_amount_delta,
            asset_b_amount_delta,
            treasury_amount,
            gas: GasFeeVar::new_witness(cs, &tx.gas, active)?,
        })
    }
}

impl TxGadget for RemoveLiquidityTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        let pool = &ctx.pool;
        validate_liquidity_slots(
            active,
            ctx,
            &self.from_account_index,
            &self.pair_index,
            &self.asset_a_id,
            &self.asset_b_id,
        )?;
        for value in [&self.amount_a, &self.amount_b, &self.lp, &self.treasury] {
            enforce_range_if_active(active, value, AMM_AMOUNT_BITS)?;
        }
        let held = &ctx.assets[0][LP_ASSET_SLOT].lp_amount;
        assert_less_or_equal_if_active(active, &self.lp, held, BALANCE_BITS)?;
        assert_less_or_equal_if_active(active, &self.lp, &pool.lp_amount, AMM_AMOUNT_BITS)?;
        assert_less_or_equal_if_active(active, &self.amount_a, &pool.asset_a, AMM_AMOUNT_BITS)?;
        assert_less_or_equal_if_active(active, &self.amount_b, &pool.asset_b, AMM_AMOUNT_BITS)?;

        // payouts may not exceed the burned share of either reserve
        assert_less_or_equal_if_active(
            active,
            &(&self.amount_a * &pool.lp_amount),
            &(&self.lp * &pool.asset_a),
            SHARE_PRODUCT_BITS,
        )?;
        assert_less_or_equal_if_active(
            active,
            &(&self.amount_b * &pool.lp_amount),
            &(&self.lp * &pool.asset_b),
            SHARE_PRODUCT_BITS,
        )?;
        assert_less_or_equal_if_active(active, &self.min_a, &self.amount_a, AMM_AMOUNT_BITS)?;
        assert_less_or_equal_if_active(active, &self.min_b, &self.amount_b, AMM_AMOUNT_BITS)?;

        assert_treasury_share(active, &self.treasury, &self.lp, &pool.treasury_rate)?;
        let k = (&pool.asset_a - &self.amount_a) * (&pool.asset_b - &self.amount_b);
        assert_equal_if_active(active, &self.k_last, &k)?;
        self.gas.validate(active, ctx)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        let mut fields = vec![
            Bits(self.from_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.pair_index.clone(), PAIR_INDEX_BITS),
            Bits(self.lp_amount.clone(), PACKED_AMOUNT_BITS),
            Bits(self.asset_a_amount_delta.clone(), PACKED_AMOUNT_BITS),
            Bits(self.asset_b_amount_delta.clone(), PACKED_AMOUNT_BITS),
            Bits(self.treasury_amount.clone(), PACKED_AMOUNT_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields.push(Element(self.k_last.clone()));
        fields
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        let mut fields = vec![
            self.from_account_index.clone(),
            self.pair_index.clone(),
            self.asset_a_id.clone(),
            self.asset_a_min_amount.clone(),
            self.asset_b_id.clone(),
            self.asset_b_min_amount.clone(),
            self.lp_amount.clone(),
            self.asset_a_amount_delta.clone(),
            self.asset_b_amount_delta.clone(),
            self.treasury_amount.clone(),
            self.k_last.clone(),
        ];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        delta.add_balance(0, 0, &self.amount_a);
        delta.add_balance(0, 1, &self.amount_b);
        delta.sub_lp(0, LP_ASSET_SLOT, &self.lp);
        delta.add_lp(TREASURY_ACCOUNT_SLOT, 0, &self.treasury);
        delta.liquidity.asset_a = self.amount_a.negate()?;
        delta.liquidity.asset_b = self.amount_b.negate()?;
        delta.liquidity.lp_amount = &self.treasury - &self.lp;
        delta.liquidity.k_last = self.k_last.clone();
        self.gas.apply(&mut delta);
        Ok(delta)
    }
}
