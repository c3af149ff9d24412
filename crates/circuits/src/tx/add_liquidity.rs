//! Liquidity provision into an existing pool.
//!
//! Slots: account 0 the provider with asset slots 0/1 the pool's A/B assets
//! and asset slot 2 its LP position (asset id = pair index); account 1 the
//! pool's treasury account with its LP position on asset slot 0. The same
//! layout serves [`super::RemoveLiquidityTx`].

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{GasFee, GasFeeVar, NativeTx, StateView, TxContextVar, TxGadget, TxSlots, TxType};
use crate::comparators::{
    assert_equal_if_active, assert_floor_div_if_active, assert_less_or_equal_if_active, enforce_range_if_active,
};
use crate::config::{
    ACCOUNT_INDEX_BITS, AMM_AMOUNT_BITS, BALANCE_BITS, PACKED_AMOUNT_BITS, PAIR_INDEX_BITS, RATE_BASE, RATE_BITS,
};
use crate::delta::{signed, TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::witness;
use crate::packed::{unpack_amount, unpack_amount_var};
use crate::pubdata::PubdataField::{self, Bits, Element};

/// Product of two AMM-width amounts.
pub(super) const SHARE_PRODUCT_BITS: usize = 2 * AMM_AMOUNT_BITS + 1;

pub(super) const LP_ASSET_SLOT: usize = 2;
pub(super) const TREASURY_ACCOUNT_SLOT: usize = 1;

pub(super) fn liquidity_slots(
    from_account_index: u32,
    pair_index: u16,
    asset_a_id: u16,
    asset_b_id: u16,
    treasury_account_index: u32,
    gas: &GasFee,
) -> TxSlots {
    let mut slots = TxSlots {
        pair_index,
        ..Default::default()
    };
    slots.accounts[0] = from_account_index;
    slots.accounts[TREASURY_ACCOUNT_SLOT] = treasury_account_index;
    slots.assets[0][0] = asset_a_id;
    slots.assets[0][1] = asset_b_id;
    slots.assets[0][LP_ASSET_SLOT] = pair_index;
    slots.assets[TREASURY_ACCOUNT_SLOT][0] = pair_index;
    gas.assign_slots(&mut slots);
    slots
}

/// Bind the provider, pool and treasury slots of a liquidity operation.
pub(super) fn validate_liquidity_slots(
    active: &Boolean<Fr>,
    ctx: &TxContextVar,
    from_account_index: &FpVar<Fr>,
    pair_index: &FpVar<Fr>,
    asset_a_id: &FpVar<Fr>,
    asset_b_id: &FpVar<Fr>,
) -> Result<(), SynthesisError> {
    let pool = &ctx.pool;
    assert_equal_if_active(active, from_account_index, &ctx.accounts[0].index)?;
    assert_equal_if_active(active, pair_index, &pool.pair_index)?;
    assert_equal_if_active(active, asset_a_id, &pool.asset_a_id)?;
    assert_equal_if_active(active, asset_b_id, &pool.asset_b_id)?;
    assert_equal_if_active(active, asset_a_id, &ctx.assets[0][0].asset_id)?;
    assert_equal_if_active(active, asset_b_id, &ctx.assets[0][1].asset_id)?;
    assert_equal_if_active(active, pair_index, &ctx.assets[0][LP_ASSET_SLOT].asset_id)?;
    assert_equal_if_active(
        active,
        &pool.treasury_account_index,
        &ctx.accounts[TREASURY_ACCOUNT_SLOT].index,
    )?;
    assert_equal_if_active(active, pair_index, &ctx.assets[TREASURY_ACCOUNT_SLOT][0].asset_id)?;
    for value in [&pool.asset_a, &pool.asset_b, &pool.lp_amount] {
        enforce_range_if_active(active, value, AMM_AMOUNT_BITS)?;
    }
    Ok(())
}

/// Native counterpart of the `AMM_AMOUNT_BITS` range checks, so the builder
/// refuses a pool operation the circuit could never accept.
pub(super) fn check_amm_width(pair_index: u16, values: &[(&'static str, u128)]) -> Result<(), WitnessError> {
    match values.iter().find(|&&(_, value)| value >> AMM_AMOUNT_BITS != 0) {
        Some(&(field, _)) => Err(WitnessError::AmmRange { pair_index, field }),
        None => Ok(()),
    }
}

/// `treasury == floor(lp * treasury_rate / RATE_BASE)`.
pub(super) fn assert_treasury_share(
    active: &Boolean<Fr>,
    treasury_amount: &FpVar<Fr>,
    lp_amount: &FpVar<Fr>,
    treasury_rate: &FpVar<Fr>,
) -> Result<(), SynthesisError> {
    assert_floor_div_if_active(
        active,
        treasury_amount,
        &(lp_amount * treasury_rate),
        &FpVar::constant(Fr::from(RATE_BASE)),
        AMM_AMOUNT_BITS + RATE_BITS + 1,
    )
}

/// Native counterpart of [`assert_treasury_share`]: `floor(amount * rate / RATE_BASE)`
/// without overflowing on large amounts. Also used for the AtomicMatch fee split.
pub fn treasury_share(amount: u128, rate: u16) -> u128 {
    let base = RATE_BASE as u128;
    let rate = rate as u128;
    (amount / base) * rate + (amount % base) * rate / base
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddLiquidityTx {
    pub from_account_index: u32,
    pub pair_index: u16,
    pub asset_a_id: u16,
    /// Packed.
    pub asset_a_amount: u64,
    pub asset_b_id: u16,
    /// Packed.
    pub asset_b_amount: u64,
    /// Packed LP minted to the provider.
    pub lp_amount: u64,
    /// Packed LP minted to the treasury.
    pub treasury_amount: u64,
    /// Reserve product after the deposit.
    pub k_last: Fr,
    pub gas: GasFee,
}

impl NativeTx for AddLiquidityTx {
    fn tx_type(&self) -> TxType {
        TxType::AddLiquidity
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
            Bits(Fr::from(self.asset_a_amount), PACKED_AMOUNT_BITS),
            Bits(Fr::from(self.asset_b_amount), PACKED_AMOUNT_BITS),
            Bits(Fr::from(self.lp_amount), PACKED_AMOUNT_BITS),
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
            Fr::from(self.asset_a_amount),
            Fr::from(self.asset_b_id),
            Fr::from(self.asset_b_amount),
            Fr::from(self.lp_amount),
            Fr::from(self.treasury_amount),
            self.k_last,
        ];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        let pool = state.pool(self.pair_index);
        let (a, b) = (unpack_amount(self.asset_a_amount)?, unpack_amount(self.asset_b_amount)?);
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
        delta.add_balance(0, 0, -a);
        delta.add_balance(0, 1, -b);
        delta.add_lp(0, LP_ASSET_SLOT, lp);
        delta.add_lp(TREASURY_ACCOUNT_SLOT, 0, treasury);
        delta.liquidity.asset_a = a;
        delta.liquidity.asset_b = b;
        delta.liquidity.lp_amount = lp + treasury;
        delta.liquidity.k_last = Some(self.k_last);
        self.gas.apply(&mut delta)?;
        Ok(delta)
    }
}

#[derive(Clone, Debug)]
pub struct AddLiquidityTxVar {
    pub from_account_index: FpVar<Fr>,
    pub pair_index: FpVar<Fr>,
    pub asset_a_id: FpVar<Fr>,
    pub asset_a_amount: FpVar<Fr>,
    pub asset_b_id: FpVar<Fr>,
    pub asset_b_amount: FpVar<Fr>,
    pub lp_amount: FpVar<Fr>,
    pub treasury_amount: FpVar<Fr>,
    pub k_last: FpVar<Fr>,
    pub amount_a: FpVar<Fr>,
    pub amount_b: FpVar<Fr>,
    pub lp: FpVar<Fr>,
    pub treasury: FpVar<Fr>,
    pub gas: GasFeeVar,
}

impl AddLiquidityTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &AddLiquidityTx,
        active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        let asset_a_amount = witness(cs, Fr::from(tx.asset_a_amount))?;
        let asset_b_amount = witness(cs, Fr::from(tx.asset_b_amount))?;
        let lp_amount = witness(cs, Fr::from(tx.lp_amount))?;
        let treasury_amount = witness(cs, Fr::from(tx.treasury_amount))?;
        Ok(Self {
            from_account_index: witness(cs, Fr::from(tx.from_account_index))?,
            pair_index: witness(cs, Fr::from(tx.pair_index))?,
            asset_a_id: witness(cs, Fr::from(tx.asset_a_id))?,
            asset_b_id: witness(cs, Fr::from(tx.asset_b_id))?,
            k_last: witness(cs, tx.k_last)?,
            amount_a: unpack_amount_var(active, &asset_a_amount)?,
            amount_b: unpack_amount_var(active, &asset_b_amount)?,
            lp: unpack_amount_var(active, &lp_amount)?,
            treasury: unpack_amount_var(active, &treasury_amount)?,
            asset_a_amount,
            asset_b_amount,
            lp_amount,
            treasury_amount,
            gas: GasFeeVar::new_witness(cs, &tx.gas, active)?,
        })
    }
}

impl TxGadget for AddLiquidityTxVar {
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
        assert_less_or_equal_if_active(active, &self.amount_a, &ctx.assets[0][0].balance, BALANCE_BITS)?;
        assert_less_or_equal_if_active(active, &self.amount_b, &ctx.assets[0][1].balance, BALANCE_BITS)?;

        // first deposit: lp <= sqrt(a * b); later: lp is capped by the
        // smaller of the two proportional shares
        let is_first = pool.lp_amount.is_eq(&FpVar::zero())?;
        let first = active.and(&is_first)?;
        let later = active.and(&is_first.not())?;
        assert_less_or_equal_if_active(
            &first,
            &(&self.lp * &self.lp),
            &(&self.amount_a * &self.amount_b),
            SHARE_PRODUCT_BITS,
        )?;
        assert_less_or_equal_if_active(
            &later,
            &(&self.lp * &pool.asset_a),
            &(&self.amount_a * &pool.lp_amount),
            SHARE_PRODUCT_BITS,
        )?;
        assert_less_or_equal_if_active(
            &later,
            &(&self.lp * &pool.asset_b),
            &(&self.amount_b * &pool.lp_amount),
            SHARE_PRODUCT_BITS,
        )?;

        assert_treasury_share(active, &self.treasury, &self.lp, &pool.treasury_rate)?;
        let k = (&pool.asset_a + &self.amount_a) * (&pool.asset_b + &self.amount_b);
        assert_equal_if_active(active, &self.k_last, &k)?;
        self.gas.validate(active, ctx)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        let mut fields = vec![
            Bits(self.from_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.pair_index.clone(), PAIR_INDEX_BITS),
            Bits(self.asset_a_amount.clone(), PACKED_AMOUNT_BITS),
            Bits(self.asset_b_amount.clone(), PACKED_AMOUNT_BITS),
            Bits(self.lp_amount.clone(), PACKED_AMOUNT_BITS),
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
            self.asset_a_amount.clone(),
            self.asset_b_id.clone(),
            self.asset_b_amount.clone(),
            self.lp_amount.clone(),
            self.treasury_amount.clone(),
            self.k_last.clone(),
        ];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        delta.sub_balance(0, 0, &self.amount_a);
        delta.sub_balance(0, 1, &self.amount_b);
        delta.add_lp(0, LP_ASSET_SLOT, &self.lp);
        delta.add_lp(TREASURY_ACCOUNT_SLOT, 0, &self.treasury);
        delta.liquidity.asset_a = self.amount_a.clone();
        delta.liquidity.asset_b = self.amount_b.clone();
        delta.liquidity.lp_amount = &self.lp + &self.treasury;
        delta.liquidity.k_last = self.k_last.clone();
        self.gas.apply(&mut delta);
        Ok(delta)
    }
}
