//! Settlement of a matching buy and sell offer for one NFT.
//!
//! Slots: account 0 submitter (pays gas), 1 buyer, 2 seller, 3 NFT creator,
//! 4 gas account (also receives the treasury fee). Buyer and seller carry the
//! offer asset on asset slot 0 and their offer bitmap leaf on asset slot 1;
//! creator and gas account carry the offer asset on asset slot 0.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::add_liquidity::treasury_share;
use super::gas::GAS_ACCOUNT_SLOT;
use super::{
    assert_rate_if_active, mark_offer_slot, GasFee, GasFeeVar, NativeTx, OfferSlotVar, StateView, TxContextVar,
    TxGadget, TxSlots, TxType,
};
use crate::comparators::{
    assert_equal_if_active, assert_floor_div_if_active, assert_less_or_equal_if_active, enforce_range_if_active,
};
use crate::config::{
    ACCOUNT_INDEX_BITS, ASSET_ID_BITS, BALANCE_BITS, NFT_INDEX_BITS, OFFER_ID_BITS, PACKED_AMOUNT_BITS, RATE_BASE,
    RATE_BITS, TIMESTAMP_BITS,
};
use crate::delta::{signed, TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::witness;
use crate::model::{Offer, OfferType, OfferVar};
use crate::packed::{unpack_amount, unpack_amount_var};
use crate::pubdata::PubdataField::{self, Bits};

const BUYER_SLOT: usize = 1;
const SELLER_SLOT: usize = 2;
const CREATOR_SLOT: usize = 3;
const OFFER_ASSET_SLOT: usize = 0;
const BITMAP_ASSET_SLOT: usize = 1;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AtomicMatchTx {
    /// Submitter of the match.
    pub account_index: u32,
    pub buy_offer: Offer,
    pub sell_offer: Offer,
    /// Royalty paid to the NFT creator.
    pub creator_amount: u128,
    /// Fee paid to the gas account.
    pub treasury_amount: u128,
    pub gas: GasFee,
}

impl AtomicMatchTx {
    /// Fill in the creator and treasury amounts from the offers and the NFT.
    pub fn with_fees(mut self, creator_treasury_rate: u16) -> Result<Self, WitnessError> {
        let amount = unpack_amount(self.sell_offer.asset_amount)?;
        self.creator_amount = treasury_share(amount, creator_treasury_rate);
        self.treasury_amount = treasury_share(amount, self.sell_offer.treasury_rate);
        Ok(self)
    }
}

impl NativeTx for AtomicMatchTx {
    fn tx_type(&self) -> TxType {
        TxType::AtomicMatch
    }

    fn slots(&self, state: &dyn StateView) -> TxSlots {
        let nft = state.nft(self.buy_offer.nft_index);
        let asset = self.buy_offer.asset_id;
        let mut slots = TxSlots {
            nft_index: self.buy_offer.nft_index,
            ..Default::default()
        };
        slots.accounts[0] = self.account_index;
        slots.accounts[BUYER_SLOT] = self.buy_offer.account_index;
        slots.accounts[SELLER_SLOT] = self.sell_offer.account_index;
        slots.accounts[CREATOR_SLOT] = nft.creator_account_index;
        slots.assets[BUYER_SLOT][OFFER_ASSET_SLOT] = asset;
        slots.assets[BUYER_SLOT][BITMAP_ASSET_SLOT] = self.buy_offer.bitmap_asset_id();
        slots.assets[SELLER_SLOT][OFFER_ASSET_SLOT] = asset;
        slots.assets[SELLER_SLOT][BITMAP_ASSET_SLOT] = self.sell_offer.bitmap_asset_id();
        slots.assets[CREATOR_SLOT][OFFER_ASSET_SLOT] = asset;
        slots.assets[GAS_ACCOUNT_SLOT][OFFER_ASSET_SLOT] = asset;
        self.gas.assign_slots(&mut slots);
        slots
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        let mut fields = vec![
            Bits(Fr::from(self.account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.buy_offer.account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.buy_offer.offer_id), OFFER_ID_BITS),
            Bits(Fr::from(self.sell_offer.account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.sell_offer.offer_id), OFFER_ID_BITS),
            Bits(Fr::from(self.buy_offer.nft_index), NFT_INDEX_BITS),
            Bits(Fr::from(self.sell_offer.asset_id), ASSET_ID_BITS),
            Bits(Fr::from(self.buy_offer.asset_amount), PACKED_AMOUNT_BITS),
            Bits(Fr::from(self.creator_amount), BALANCE_BITS),
            Bits(Fr::from(self.treasury_amount), BALANCE_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields
    }

    fn hash_fields(&self) -> Vec<Fr> {
        let mut fields = vec![
            Fr::from(self.account_index),
            self.buy_offer.hash(),
            self.sell_offer.hash(),
            Fr::from(self.creator_amount),
            Fr::from(self.treasury_amount),
        ];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        let amount = signed(unpack_amount(self.buy_offer.asset_amount)?)?;
        let creator = signed(self.creator_amount)?;
        let treasury = signed(self.treasury_amount)?;

        let mut delta = TxDelta::default();
        delta.add_balance(BUYER_SLOT, OFFER_ASSET_SLOT, -amount);
        delta.assets[BUYER_SLOT][BITMAP_ASSET_SLOT].set_offer_slot = Some(self.buy_offer.slot());
        delta.add_balance(SELLER_SLOT, OFFER_ASSET_SLOT, amount - creator - treasury);
        delta.assets[SELLER_SLOT][BITMAP_ASSET_SLOT].set_offer_slot = Some(self.sell_offer.slot());
        delta.add_balance(CREATOR_SLOT, OFFER_ASSET_SLOT, creator);
        delta.add_balance(GAS_ACCOUNT_SLOT, OFFER_ASSET_SLOT, treasury);

        let mut nft = state.nft(self.buy_offer.nft_index);
        nft.owner_account_index = self.buy_offer.account_index;
        delta.nft = Some(nft);
        self.gas.apply(&mut delta)?;
        Ok(delta)
    }
}

/// One side of the match with its derived values.
#[derive(Clone, Debug)]
pub struct MatchedOfferVar {
    pub offer: OfferVar,
    pub hash: FpVar<Fr>,
    pub slot: OfferSlotVar,
}

impl MatchedOfferVar {
    fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        offer: &Offer,
        active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        let offer = OfferVar::new_witness(cs, offer)?;
        Ok(Self {
            hash: offer.hash(cs.clone())?,
            slot: OfferSlotVar::new(active, &offer.offer_id)?,
            offer,
        })
    }

    fn validate(
        &self,
        active: &Boolean<Fr>,
        ctx: &TxContextVar,
        offer_type: OfferType,
        account_slot: usize,
    ) -> Result<(), SynthesisError> {
        let offer = &self.offer;
        let assets = &ctx.assets[account_slot];
        assert_equal_if_active(active, &offer.offer_type, &FpVar::constant(Fr::from(offer_type as u8)))?;
        assert_equal_if_active(active, &offer.account_index, &ctx.accounts[account_slot].index)?;
        assert_equal_if_active(active, &offer.nft_index, &ctx.nft.nft_index)?;
        assert_equal_if_active(active, &offer.asset_id, &assets[OFFER_ASSET_SLOT].asset_id)?;
        assert_equal_if_active(active, &self.slot.bitmap_asset_id, &assets[BITMAP_ASSET_SLOT].asset_id)?;
        assert_rate_if_active(active, &offer.treasury_rate)?;

        enforce_range_if_active(active, &offer.listed_at, TIMESTAMP_BITS)?;
        enforce_range_if_active(active, &offer.expired_at, TIMESTAMP_BITS)?;
        assert_less_or_equal_if_active(active, &offer.listed_at, &ctx.block_created_at, TIMESTAMP_BITS)?;
        assert_less_or_equal_if_active(active, &ctx.block_created_at, &offer.expired_at, TIMESTAMP_BITS)
    }
}

#[derive(Clone, Debug)]
pub struct AtomicMatchTxVar {
    pub account_index: FpVar<Fr>,
    pub buy: MatchedOfferVar,
    pub sell: MatchedOfferVar,
    pub creator_amount: FpVar<Fr>,
    pub treasury_amount: FpVar<Fr>,
    /// Unpacked offer amount.
    pub amount: FpVar<Fr>,
    pub gas: GasFeeVar,
}

impl AtomicMatchTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &AtomicMatchTx,
        active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        let buy = MatchedOfferVar::new_witness(cs, &tx.buy_offer, active)?;
        let sell = MatchedOfferVar::new_witness(cs, &tx.sell_offer, active)?;
        Ok(Self {
            account_index: witness(cs, Fr::from(tx.account_index))?,
            amount: unpack_amount_var(active, &buy.offer.asset_amount)?,
            buy,
            sell,
            creator_amount: witness(cs, Fr::from(tx.creator_amount))?,
            treasury_amount: witness(cs, Fr::from(tx.treasury_amount))?,
            gas: GasFeeVar::new_witness(cs, &tx.gas, active)?,
        })
    }
}

impl TxGadget for AtomicMatchTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        assert_equal_if_active(active, &self.account_index, &ctx.accounts[0].index)?;
        self.buy.validate(active, ctx, OfferType::Buy, BUYER_SLOT)?;
        self.sell.validate(active, ctx, OfferType::Sell, SELLER_SLOT)?;

        let (buy, sell) = (&self.buy.offer, &self.sell.offer);
        assert_equal_if_active(active, &buy.asset_id, &sell.asset_id)?;
        assert_equal_if_active(active, &buy.asset_amount, &sell.asset_amount)?;
        assert_equal_if_active(active, &buy.asset_id, &ctx.assets[CREATOR_SLOT][OFFER_ASSET_SLOT].asset_id)?;
        assert_equal_if_active(
            active,
            &buy.asset_id,
            &ctx.assets[GAS_ACCOUNT_SLOT][OFFER_ASSET_SLOT].asset_id,
        )?;
        assert_equal_if_active(active, &sell.account_index, &ctx.nft.owner_account_index)?;
        assert_equal_if_active(active, &ctx.nft.creator_account_index, &ctx.accounts[CREATOR_SLOT].index)?;

        let paid = &ctx.assets[BUYER_SLOT][OFFER_ASSET_SLOT].balance;
        assert_less_or_equal_if_active(active, &self.amount, paid, BALANCE_BITS)?;

        let base = FpVar::constant(Fr::from(RATE_BASE));
        let product_bits = BALANCE_BITS + RATE_BITS + 1;
        assert_floor_div_if_active(
            active,
            &self.creator_amount,
            &(&self.amount * &ctx.nft.creator_treasury_rate),
            &base,
            product_bits,
        )?;
        assert_floor_div_if_active(
            active,
            &self.treasury_amount,
            &(&self.amount * &sell.treasury_rate),
            &base,
            product_bits,
        )?;
        let fees = &self.creator_amount + &self.treasury_amount;
        assert_less_or_equal_if_active(active, &fees, &self.amount, BALANCE_BITS + 1)?;
        self.gas.validate(active, ctx)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        let (buy, sell) = (&self.buy.offer, &self.sell.offer);
        let mut fields = vec![
            Bits(self.account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(buy.account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(buy.offer_id.clone(), OFFER_ID_BITS),
            Bits(sell.account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(sell.offer_id.clone(), OFFER_ID_BITS),
            Bits(buy.nft_index.clone(), NFT_INDEX_BITS),
            Bits(sell.asset_id.clone(), ASSET_ID_BITS),
            Bits(buy.asset_amount.clone(), PACKED_AMOUNT_BITS),
            Bits(self.creator_amount.clone(), BALANCE_BITS),
            Bits(self.treasury_amount.clone(), BALANCE_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        let mut fields = vec![
            self.account_index.clone(),
            self.buy.hash.clone(),
            self.sell.hash.clone(),
            self.creator_amount.clone(),
            self.treasury_amount.clone(),
        ];
        fields.extend(self.gas.hash_fields());
        fields
    }

    /// Marking the two offer slots also asserts that both are still unset.
    fn deltas(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        let seller_gets = &self.amount - &self.creator_amount - &self.treasury_amount;
        delta.sub_balance(BUYER_SLOT, OFFER_ASSET_SLOT, &self.amount);
        delta.add_balance(SELLER_SLOT, OFFER_ASSET_SLOT, &seller_gets);
        delta.add_balance(CREATOR_SLOT, OFFER_ASSET_SLOT, &self.creator_amount);
        delta.add_balance(GAS_ACCOUNT_SLOT, OFFER_ASSET_SLOT, &self.treasury_amount);

        for (side, slot) in [(&self.buy, BUYER_SLOT), (&self.sell, SELLER_SLOT)] {
            let bitmap = &ctx.assets[slot][BITMAP_ASSET_SLOT].offer_canceled_or_finalized;
            delta.assets[slot][BITMAP_ASSET_SLOT].offer_canceled_or_finalized =
                mark_offer_slot(active, &side.slot, bitmap)?;
        }

        delta.nft.owner_account_index = self.buy.offer.account_index.clone();
        self.gas.apply(&mut delta);
        Ok(delta)
    }
}
