use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::field::witness;
use crate::poseidon::{poseidon_hash_many, poseidon_hash_many_var};

/// Constant-product pool. An empty pool has every field zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiquidityPool {
    pub pair_index: u16,
    pub asset_a_id: u16,
    pub asset_a: u128,
    pub asset_b_id: u16,
    pub asset_b: u128,
    pub lp_amount: u128,
    /// Reserve product recorded at the last liquidity change.
    pub k_last: Fr,
    pub fee_rate: u16,
    pub treasury_account_index: u32,
    pub treasury_rate: u16,
}

impl LiquidityPool {
    pub fn empty(pair_index: u16) -> Self {
        Self {
            pair_index,
            ..Default::default()
        }
    }

    pub fn leaf_hash(&self) -> Fr {
        poseidon_hash_many(&[
            Fr::from(self.asset_a_id),
            Fr::from(self.asset_a),
            Fr::from(self.asset_b_id),
            Fr::from(self.asset_b),
            Fr::from(self.lp_amount),
            self.k_last,
            Fr::from(self.fee_rate),
            Fr::from(self.treasury_account_index),
            Fr::from(self.treasury_rate),
        ])
    }

    /// `reserve_a * reserve_b` in the field.
    pub fn product(reserve_a: u128, reserve_b: u128) -> Fr {
        Fr::from(reserve_a) * Fr::from(reserve_b)
    }
}

#[derive(Clone, Debug)]
pub struct LiquidityPoolVar {
    pub pair_index: FpVar<Fr>,
    pub asset_a_id: FpVar<Fr>,
    pub asset_a: FpVar<Fr>,
    pub asset_b_id: FpVar<Fr>,
    pub asset_b: FpVar<Fr>,
    pub lp_amount: FpVar<Fr>,
    pub k_last: FpVar<Fr>,
    pub fee_rate: FpVar<Fr>,
    pub treasury_account_index: FpVar<Fr>,
    pub treasury_rate: FpVar<Fr>,
}

impl LiquidityPoolVar {
    pub fn new_witness(cs: &ConstraintSystemRef<Fr>, pool: &LiquidityPool) -> Result<Self, SynthesisError> {
        Ok(Self {
            pair_index: witness(cs, Fr::from(pool.pair_index))?,
            asset_a_id: witness(cs, Fr::from(pool.asset_a_id))?,
            asset_a: witness(cs, Fr::from(pool.asset_a))?,
            asset_b_id: witness(cs, Fr::from(pool.asset_b_id))?,
            asset_b: witness(cs, Fr::from(pool.asset_b))?,
            lp_amount: witness(cs, Fr::from(pool.lp_amount))?,
            k_last: witness(cs, pool.k_last)?,
            fee_rate: witness(cs, Fr::from(pool.fee_rate))?,
            treasury_account_index: witness(cs, Fr::from(pool.treasury_account_index))?,
            treasury_rate: witness(cs, Fr::from(pool.treasury_rate))?,
        })
    }

    pub fn leaf_hash(&self, cs: ConstraintSystemRef<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
        poseidon_hash_many_var(
            cs,
            &[
                self.asset_a_id.clone(),
                self.asset_a.clone(),
                self.asset_b_id.clone(),
                self.asset_b.clone(),
                self.lp_amount.clone(),
                self.k_last.clone(),
                self.fee_rate.clone(),
                self.treasury_account_index.clone(),
                self.treasury_rate.clone(),
            ],
        )
    }
}
