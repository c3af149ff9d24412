//! State changes produced by a transaction.
//!
//! Natively a delta is a list of operations (add to a balance, set an offer
//! bit, replace an NFT) so the witness builder can apply it to whatever state
//! a slot holds at its turn. In-circuit a delta carries the additive changes
//! plus the replacement values, starting from the identity built from the
//! slot's pre-image. The 18 per-type candidates are folded into one applied
//! delta by flag selection.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

use crate::config::{NUM_ACCOUNTS_PER_TX, NUM_ASSETS_PER_ACCOUNT};
use crate::error::WitnessError;
use crate::model::{
    AccountAsset, AccountAssetVar, AccountVar, LiquidityPool, LiquidityPoolVar, Nft, NftVar, PublicKey,
};

/// Native per-asset change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountAssetDelta {
    pub balance: i128,
    pub lp_amount: i128,
    /// Offer slot to mark as cancelled or finalized.
    pub set_offer_slot: Option<u32>,
}

impl AccountAssetDelta {
    pub fn apply(&self, account_index: u32, asset: &AccountAsset) -> Result<AccountAsset, WitnessError> {
        let underflow = |field| WitnessError::BalanceUnderflow {
            account: account_index,
            asset_id: asset.asset_id,
            field,
        };
        let mut after = asset.clone();
        after.balance = asset
            .balance
            .checked_add_signed(self.balance)
            .ok_or_else(|| underflow("balance"))?;
        after.lp_amount = asset
            .lp_amount
            .checked_add_signed(self.lp_amount)
            .ok_or_else(|| underflow("lp amount"))?;
        if let Some(slot) = self.set_offer_slot {
            after.offer_canceled_or_finalized |= 1u128 << slot;
        }
        Ok(after)
    }
}

/// Pair parameters written by CreatePair and UpdatePairRate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairSettings {
    pub asset_a_id: u16,
    pub asset_b_id: u16,
    pub fee_rate: u16,
    pub treasury_account_index: u32,
    pub treasury_rate: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiquidityDelta {
    pub asset_a: i128,
    pub asset_b: i128,
    pub lp_amount: i128,
    pub k_last: Option<Fr>,
    pub settings: Option<PairSettings>,
}

impl LiquidityDelta {
    pub fn apply(&self, pool: &LiquidityPool) -> Result<LiquidityPool, WitnessError> {
        let underflow = |field| WitnessError::PoolUnderflow {
            pair_index: pool.pair_index,
            field,
        };
        let mut after = pool.clone();
        after.asset_a = pool
            .asset_a
            .checked_add_signed(self.asset_a)
            .ok_or_else(|| underflow("asset a"))?;
        after.asset_b = pool
            .asset_b
            .checked_add_signed(self.asset_b)
            .ok_or_else(|| underflow("asset b"))?;
        after.lp_amount = pool
            .lp_amount
            .checked_add_signed(self.lp_amount)
            .ok_or_else(|| underflow("lp amount"))?;
        if let Some(k_last) = self.k_last {
            after.k_last = k_last;
        }
        if let Some(settings) = &self.settings {
            after.asset_a_id = settings.asset_a_id;
            after.asset_b_id = settings.asset_b_id;
            after.fee_rate = settings.fee_rate;
            after.treasury_account_index = settings.treasury_account_index;
            after.treasury_rate = settings.treasury_rate;
        }
        Ok(after)
    }
}

/// Everything one transaction changes, natively.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxDelta {
    /// `[account slot][asset slot]`.
    pub assets: Vec<Vec<AccountAssetDelta>>,
    pub liquidity: LiquidityDelta,
    pub nft: Option<Nft>,
    /// New name hash and key for account slot 0 (registration).
    pub account_info: Option<(Fr, PublicKey)>,
}

impl Default for TxDelta {
    fn default() -> Self {
        Self {
            assets: vec![vec![AccountAssetDelta::default(); NUM_ASSETS_PER_ACCOUNT]; NUM_ACCOUNTS_PER_TX],
            liquidity: LiquidityDelta::default(),
            nft: None,
            account_info: None,
        }
    }
}

impl TxDelta {
    pub fn add_balance(&mut self, account: usize, asset: usize, amount: i128) {
        self.assets[account][asset].balance += amount;
    }

    pub fn add_lp(&mut self, account: usize, asset: usize, amount: i128) {
        self.assets[account][asset].lp_amount += amount;
    }
}

/// Signed conversion used by every native delta producer.
pub fn signed(amount: u128) -> Result<i128, WitnessError> {
    i128::try_from(amount).map_err(|_| WitnessError::AmountOverflow(amount))
}

#[derive(Clone, Debug)]
pub struct AccountAssetDeltaVar {
    pub balance: FpVar<Fr>,
    pub lp_amount: FpVar<Fr>,
    /// Replacement value of the offer bitmap.
    pub offer_canceled_or_finalized: FpVar<Fr>,
}

impl AccountAssetDeltaVar {
    pub fn identity(before: &AccountAssetVar) -> Self {
        Self {
            balance: FpVar::zero(),
            lp_amount: FpVar::zero(),
            offer_canceled_or_finalized: before.offer_canceled_or_finalized.clone(),
        }
    }

    pub fn apply(&self, before: &AccountAssetVar) -> AccountAssetVar {
        AccountAssetVar {
            asset_id: before.asset_id.clone(),
            balance: &before.balance + &self.balance,
            lp_amount: &before.lp_amount + &self.lp_amount,
            offer_canceled_or_finalized: self.offer_canceled_or_finalized.clone(),
        }
    }

    fn select(flag: &Boolean<Fr>, candidate: &Self, acc: &Self) -> Result<Self, SynthesisError> {
        Ok(Self {
            balance: flag.select(&candidate.balance, &acc.balance)?,
            lp_amount: flag.select(&candidate.lp_amount, &acc.lp_amount)?,
            offer_canceled_or_finalized: flag
                .select(&candidate.offer_canceled_or_finalized, &acc.offer_canceled_or_finalized)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct LiquidityDeltaVar {
    pub asset_a_id: FpVar<Fr>,
    pub asset_b_id: FpVar<Fr>,
    pub asset_a: FpVar<Fr>,
    pub asset_b: FpVar<Fr>,
    pub lp_amount: FpVar<Fr>,
    pub k_last: FpVar<Fr>,
    pub fee_rate: FpVar<Fr>,
    pub treasury_account_index: FpVar<Fr>,
    pub treasury_rate: FpVar<Fr>,
}

impl LiquidityDeltaVar {
    pub fn identity(before: &LiquidityPoolVar) -> Self {
        Self {
            asset_a_id: before.asset_a_id.clone(),
            asset_b_id: before.asset_b_id.clone(),
            asset_a: FpVar::zero(),
            asset_b: FpVar::zero(),
            lp_amount: FpVar::zero(),
            k_last: before.k_last.clone(),
            fee_rate: before.fee_rate.clone(),
            treasury_account_index: before.treasury_account_index.clone(),
            treasury_rate: before.treasury_rate.clone(),
        }
    }

    pub fn apply(&self, before: &LiquidityPoolVar) -> LiquidityPoolVar {
        LiquidityPoolVar {
            pair_index: before.pair_index.clone(),
            asset_a_id: self.asset_a_id.clone(),
            asset_a: &before.asset_a + &self.asset_a,
            asset_b_id: self.asset_b_id.clone(),
            asset_b: &before.asset_b + &self.asset_b,
            lp_amount: &before.lp_amount + &self.lp_amount,
            k_last: self.k_last.clone(),
            fee_rate: self.fee_rate.clone(),
            treasury_account_index: self.treasury_account_index.clone(),
            treasury_rate: self.treasury_rate.clone(),
        }
    }

    fn select(flag: &Boolean<Fr>, candidate: &Self, acc: &Self) -> Result<Self, SynthesisError> {
        Ok(Self {
            asset_a_id: flag.select(&candidate.asset_a_id, &acc.asset_a_id)?,
            asset_b_id: flag.select(&candidate.asset_b_id, &acc.asset_b_id)?,
            asset_a: flag.select(&candidate.asset_a, &acc.asset_a)?,
            asset_b: flag.select(&candidate.asset_b, &acc.asset_b)?,
            lp_amount: flag.select(&candidate.lp_amount, &acc.lp_amount)?,
            k_last: flag.select(&candidate.k_last, &acc.k_last)?,
            fee_rate: flag.select(&candidate.fee_rate, &acc.fee_rate)?,
            treasury_account_index: flag
                .select(&candidate.treasury_account_index, &acc.treasury_account_index)?,
            treasury_rate: flag.select(&candidate.treasury_rate, &acc.treasury_rate)?,
        })
    }
}

fn select_nft(flag: &Boolean<Fr>, candidate: &NftVar, acc: &NftVar) -> Result<NftVar, SynthesisError> {
    Ok(NftVar {
        nft_index: acc.nft_index.clone(),
        creator_account_index: flag
            .select(&candidate.creator_account_index, &acc.creator_account_index)?,
        owner_account_index: flag.select(&candidate.owner_account_index, &acc.owner_account_index)?,
        content_hash: flag.select(&candidate.content_hash, &acc.content_hash)?,
        l1_address: flag.select(&candidate.l1_address, &acc.l1_address)?,
        l1_token_id: flag.select(&candidate.l1_token_id, &acc.l1_token_id)?,
        creator_treasury_rate: flag
            .select(&candidate.creator_treasury_rate, &acc.creator_treasury_rate)?,
        collection_id: flag.select(&candidate.collection_id, &acc.collection_id)?,
    })
}

/// In-circuit delta of one transaction type.
#[derive(Clone, Debug)]
pub struct TxDeltaVar {
    pub assets: Vec<Vec<AccountAssetDeltaVar>>,
    pub liquidity: LiquidityDeltaVar,
    /// Replacement NFT.
    pub nft: NftVar,
    /// Replacement name hash of account slot 0.
    pub name_hash: FpVar<Fr>,
    /// Replacement key bytes of account slot 0.
    pub public_key: Vec<FpVar<Fr>>,
}

impl TxDeltaVar {
    /// The delta that leaves every touched entity unchanged.
    pub fn identity(
        accounts: &[AccountVar],
        assets: &[Vec<AccountAssetVar>],
        pool: &LiquidityPoolVar,
        nft: &NftVar,
    ) -> Self {
        Self {
            assets: assets
                .iter()
                .map(|slot| slot.iter().map(AccountAssetDeltaVar::identity).collect())
                .collect(),
            liquidity: LiquidityDeltaVar::identity(pool),
            nft: nft.clone(),
            name_hash: accounts[0].name_hash.clone(),
            public_key: accounts[0].public_key.clone(),
        }
    }

    pub fn add_balance(&mut self, account: usize, asset: usize, amount: &FpVar<Fr>) {
        let entry = &mut self.assets[account][asset];
        entry.balance = &entry.balance + amount;
    }

    pub fn sub_balance(&mut self, account: usize, asset: usize, amount: &FpVar<Fr>) {
        let entry = &mut self.assets[account][asset];
        entry.balance = &entry.balance - amount;
    }

    pub fn add_lp(&mut self, account: usize, asset: usize, amount: &FpVar<Fr>) {
        let entry = &mut self.assets[account][asset];
        entry.lp_amount = &entry.lp_amount + amount;
    }

    pub fn sub_lp(&mut self, account: usize, asset: usize, amount: &FpVar<Fr>) {
        let entry = &mut self.assets[account][asset];
        entry.lp_amount = &entry.lp_amount - amount;
    }

    /// `candidate` when `flag`, `acc` otherwise, field by field.
    pub fn select(flag: &Boolean<Fr>, candidate: &Self, acc: &Self) -> Result<Self, SynthesisError> {
        let assets = candidate
            .assets
            .iter()
            .zip(&acc.assets)
            .map(|(c_slot, a_slot)| {
                c_slot
                    .iter()
                    .zip(a_slot)
                    .map(|(c, a)| AccountAssetDeltaVar::select(flag, c, a))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        let public_key = candidate
            .public_key
            .iter()
            .zip(&acc.public_key)
            .map(|(c, a)| flag.select(c, a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            assets,
            liquidity: LiquidityDeltaVar::select(flag, &candidate.liquidity, &acc.liquidity)?,
            nft: select_nft(flag, &candidate.nft, &acc.nft)?,
            name_hash: flag.select(&candidate.name_hash, &acc.name_hash)?,
            public_key,
        })
    }

    /// Fold flag-tagged candidates over the identity. With one-hot flags the
    /// result is exactly the active candidate, whatever the others contain.
    pub fn aggregate(identity: Self, candidates: &[(Boolean<Fr>, Self)]) -> Result<Self, SynthesisError> {
        candidates
            .iter()
            .try_fold(identity, |acc, (flag, candidate)| Self::select(flag, candidate, &acc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::witness;
    use ark_relations::r1cs::ConstraintSystem;

    fn asset() -> AccountAsset {
        AccountAsset {
            asset_id: 5,
            balance: 1000,
            lp_amount: 30,
            offer_canceled_or_finalized: 0b1010,
        }
    }

    #[test]
    fn test_native_identity_law() {
        let asset = asset();
        assert_eq!(AccountAssetDelta::default().apply(1, &asset).unwrap(), asset);

        let pool = LiquidityPool {
            pair_index: 2,
            asset_a_id: 1,
            asset_a: 500,
            asset_b_id: 3,
            asset_b: 700,
            lp_amount: 90,
            k_last: LiquidityPool::product(500, 700),
            fee_rate: 30,
            treasury_account_index: 4,
            treasury_rate: 5,
        };
        assert_eq!(LiquidityDelta::default().apply(&pool).unwrap(), pool);
    }

    #[test]
    fn test_native_offer_bit_is_idempotent() {
        let delta = AccountAssetDelta {
            set_offer_slot: Some(3),
            ..Default::default()
        };
        let once = delta.apply(1, &asset()).unwrap();
        let twice = delta.apply(1, &once).unwrap();
        assert_eq!(once.offer_canceled_or_finalized, 0b1010);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_native_underflow_reported() {
        let delta = AccountAssetDelta {
            balance: -1001,
            ..Default::default()
        };
        assert!(matches!(
            delta.apply(7, &asset()),
            Err(WitnessError::BalanceUnderflow { account: 7, asset_id: 5, .. })
        ));
    }

    #[test]
    fn test_gadget_identity_law() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let before = AccountAssetVar::new_witness(&cs, &asset()).unwrap();
        let after = AccountAssetDeltaVar::identity(&before).apply(&before);
        after.balance.enforce_equal(&before.balance).unwrap();
        after.lp_amount.enforce_equal(&before.lp_amount).unwrap();
        after
            .offer_canceled_or_finalized
            .enforce_equal(&before.offer_canceled_or_finalized)
            .unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_aggregate_picks_active_candidate() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let before = AccountAssetVar::new_witness(&cs, &asset()).unwrap();
        let identity = AccountAssetDeltaVar::identity(&before);

        let mut active = identity.clone();
        active.balance = witness(&cs, Fr::from(40u64)).unwrap();
        let mut adversarial = identity.clone();
        adversarial.balance = witness(&cs, Fr::from(999_999u64)).unwrap();
        adversarial.offer_canceled_or_finalized = witness(&cs, Fr::from(u64::MAX)).unwrap();

        let on = Boolean::new_witness(cs.clone(), || Ok(true)).unwrap();
        let off = Boolean::new_witness(cs.clone(), || Ok(false)).unwrap();
        let mut acc = identity;
        for (flag, candidate) in [(&off, &adversarial), (&on, &active), (&off, &adversarial)] {
            acc = AccountAssetDeltaVar::select(flag, candidate, &acc).unwrap();
        }

        assert_eq!(acc.balance.value().unwrap(), Fr::from(40u64));
        assert_eq!(acc.offer_canceled_or_finalized.value().unwrap(), Fr::from(0b1010u64));
        assert!(cs.is_satisfied().unwrap());
    }
}
