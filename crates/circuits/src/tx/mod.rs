//! The 18 transaction types.
//!
//! Every type comes as a native payload implementing [`NativeTx`] (slot
//! assignment, pubdata, hash fields and deltas for the witness builder) and a
//! gadget implementing [`TxGadget`] (the same three things in-circuit, plus
//! validation). All 18 gadgets are synthesized for every transaction; each one
//! gates its checks by its own flag from [`TxTypeFlags`].

mod add_liquidity;
mod atomic_match;
mod bitmap;
mod cancel_offer;
mod create_collection;
mod create_pair;
mod deposit;
mod deposit_nft;
mod full_exit;
mod full_exit_nft;
mod gas;
mod mint_nft;
mod payload;
mod register_zns;
mod remove_liquidity;
mod swap;
mod transfer;
mod transfer_nft;
mod update_pair_rate;
mod withdraw;
mod withdraw_nft;

#[cfg(test)]
mod tests;

pub use add_liquidity::{treasury_share, AddLiquidityTx, AddLiquidityTxVar};
pub use atomic_match::{AtomicMatchTx, AtomicMatchTxVar};
pub use bitmap::{mark_offer_slot, OfferSlotVar};
pub use cancel_offer::{CancelOfferTx, CancelOfferTxVar};
pub use create_collection::{CreateCollectionTx, CreateCollectionTxVar};
pub use create_pair::{CreatePairTx, CreatePairTxVar};
pub use deposit::{DepositTx, DepositTxVar};
pub use deposit_nft::{DepositNftTx, DepositNftTxVar};
pub use full_exit::{FullExitTx, FullExitTxVar};
pub use full_exit_nft::{FullExitNftTx, FullExitNftTxVar};
pub use gas::{GasFee, GasFeeVar};
pub use mint_nft::{MintNftTx, MintNftTxVar};
pub(crate) use payload::padded;
pub use payload::{tx_hash, tx_hash_var, TxOutputVar, TxPayload, TxPayloads, TxPayloadsVar};
pub use register_zns::{RegisterZnsTx, RegisterZnsTxVar};
pub use remove_liquidity::{RemoveLiquidityTx, RemoveLiquidityTxVar};
pub use swap::{SwapTx, SwapTxVar};
pub use transfer::{TransferTx, TransferTxVar};
pub use transfer_nft::{TransferNftTx, TransferNftTxVar};
pub use update_pair_rate::{UpdatePairRateTx, UpdatePairRateTxVar};
pub use withdraw::{WithdrawTx, WithdrawTxVar};
pub use withdraw_nft::{WithdrawNftTx, WithdrawNftTxVar};

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

use crate::comparators::{assert_equal_if_active, assert_less_or_equal_if_active};
use crate::config::{NUM_ACCOUNTS_PER_TX, NUM_ASSETS_PER_ACCOUNT, RATE_BASE, RATE_BITS, TX_TYPE_BITS};
use crate::delta::{TxDelta, TxDeltaVar};
use crate::error::{BuildError, WitnessError};
use crate::model::{Account, AccountAsset, AccountAssetVar, AccountVar, LiquidityPool, LiquidityPoolVar, Nft, NftVar};
use crate::pubdata::PubdataField;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TxType {
    /// Filler used to pad a block to its fixed size.
    #[default]
    Empty = 0,
    RegisterZns = 1,
    CreatePair = 2,
    UpdatePairRate = 3,
    Deposit = 4,
    DepositNft = 5,
    Transfer = 6,
    Swap = 7,
    AddLiquidity = 8,
    RemoveLiquidity = 9,
    Withdraw = 10,
    CreateCollection = 11,
    MintNft = 12,
    TransferNft = 13,
    AtomicMatch = 14,
    CancelOffer = 15,
    WithdrawNft = 16,
    FullExit = 17,
    FullExitNft = 18,
}

impl TxType {
    pub const ALL: [TxType; 19] = [
        TxType::Empty,
        TxType::RegisterZns,
        TxType::CreatePair,
        TxType::UpdatePairRate,
        TxType::Deposit,
        TxType::DepositNft,
        TxType::Transfer,
        TxType::Swap,
        TxType::AddLiquidity,
        TxType::RemoveLiquidity,
        TxType::Withdraw,
        TxType::CreateCollection,
        TxType::MintNft,
        TxType::TransferNft,
        TxType::AtomicMatch,
        TxType::CancelOffer,
        TxType::WithdrawNft,
        TxType::FullExit,
        TxType::FullExitNft,
    ];

    /// Initiated by a layer-1 event and counted into the block commitment.
    pub fn is_on_chain_op(self) -> bool {
        matches!(
            self,
            TxType::RegisterZns
                | TxType::CreatePair
                | TxType::UpdatePairRate
                | TxType::Deposit
                | TxType::DepositNft
                | TxType::Withdraw
                | TxType::WithdrawNft
                | TxType::FullExit
                | TxType::FullExitNft
        )
    }

    /// Signed off-chain by the sender: signature, nonce, expiry and gas apply.
    pub fn is_layer2(self) -> bool {
        matches!(
            self,
            TxType::Transfer
                | TxType::Swap
                | TxType::AddLiquidity
                | TxType::RemoveLiquidity
                | TxType::Withdraw
                | TxType::CreateCollection
                | TxType::MintNft
                | TxType::TransferNft
                | TxType::AtomicMatch
                | TxType::CancelOffer
                | TxType::WithdrawNft
        )
    }

    pub fn as_fr(self) -> Fr {
        Fr::from(self as u8)
    }
}

impl TryFrom<u8> for TxType {
    type Error = BuildError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        TxType::ALL
            .get(tag as usize)
            .copied()
            .ok_or(BuildError::UnknownTxType(tag))
    }
}

/// One-hot decoding of the transaction type tag.
pub struct TxTypeFlags {
    pub tx_type: FpVar<Fr>,
    flags: Vec<Boolean<Fr>>,
}

impl TxTypeFlags {
    /// Derive one flag per type and enforce that exactly one is set, which
    /// rejects any tag outside the known range.
    pub fn new(tx_type: FpVar<Fr>) -> Result<Self, SynthesisError> {
        let flags = TxType::ALL
            .iter()
            .map(|t| tx_type.is_eq(&FpVar::constant(t.as_fr())))
            .collect::<Result<Vec<_>, _>>()?;
        flags
            .iter()
            .fold(FpVar::zero(), |acc, f| acc + FpVar::from(f.clone()))
            .enforce_equal(&FpVar::one())?;
        Ok(Self { tx_type, flags })
    }

    pub fn flag(&self, tx_type: TxType) -> &Boolean<Fr> {
        &self.flags[tx_type as usize]
    }

    pub fn is_empty(&self) -> &Boolean<Fr> {
        self.flag(TxType::Empty)
    }

    pub fn is_layer2(&self) -> Result<Boolean<Fr>, SynthesisError> {
        self.any(|t| t.is_layer2())
    }

    /// 1 for an on-chain operation, 0 otherwise.
    pub fn on_chain_op(&self) -> FpVar<Fr> {
        TxType::ALL
            .iter()
            .filter(|t| t.is_on_chain_op())
            .fold(FpVar::zero(), |acc, t| acc + FpVar::from(self.flag(*t).clone()))
    }

    fn any(&self, pred: impl Fn(TxType) -> bool) -> Result<Boolean<Fr>, SynthesisError> {
        let selected: Vec<_> = TxType::ALL
            .iter()
            .filter(|t| pred(**t))
            .map(|t| self.flag(*t).clone())
            .collect();
        Boolean::kary_or(&selected)
    }
}

/// Entities a transaction touches, in slot order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxSlots {
    pub accounts: [u32; NUM_ACCOUNTS_PER_TX],
    pub assets: [[u16; NUM_ASSETS_PER_ACCOUNT]; NUM_ACCOUNTS_PER_TX],
    pub pair_index: u16,
    pub nft_index: u64,
}

/// Read access to the pre-transaction state for the native side.
pub trait StateView {
    fn account(&self, index: u32) -> Account;
    fn asset(&self, account_index: u32, asset_id: u16) -> AccountAsset;
    fn pool(&self, pair_index: u16) -> LiquidityPool;
    fn nft(&self, nft_index: u64) -> Nft;
}

/// Native behaviour of a payload type.
pub trait NativeTx {
    fn tx_type(&self) -> TxType;

    fn slots(&self, state: &dyn StateView) -> TxSlots;

    /// Pubdata fields after the leading type tag.
    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>>;

    /// Payload fields absorbed into the transaction hash.
    fn hash_fields(&self) -> Vec<Fr>;

    fn deltas(&self, state: &dyn StateView) -> Result<TxDelta, WitnessError>;
}

/// Pre-images of everything a transaction touches, as seen by each slot.
#[derive(Clone, Debug)]
pub struct TxContextVar {
    pub accounts: Vec<AccountVar>,
    pub assets: Vec<Vec<AccountAssetVar>>,
    pub pool: LiquidityPoolVar,
    pub nft: NftVar,
    pub block_created_at: FpVar<Fr>,
    /// Assets root of an account that has never held anything.
    pub empty_assets_root: Fr,
}

impl TxContextVar {
    pub fn identity_delta(&self) -> TxDeltaVar {
        TxDeltaVar::identity(&self.accounts, &self.assets, &self.pool, &self.nft)
    }
}

/// In-circuit behaviour of a payload type. Every method is synthesized for
/// every transaction; checks only bind when `active`.
pub trait TxGadget {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError>;

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>>;

    fn hash_fields(&self) -> Vec<FpVar<Fr>>;

    fn deltas(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError>;
}

/// Prefix a type's pubdata layout with its tag.
pub fn tagged_layout<T: Clone>(tag: T, fields: Vec<PubdataField<T>>) -> Vec<PubdataField<T>> {
    std::iter::once(PubdataField::Bits(tag, TX_TYPE_BITS))
        .chain(fields)
        .collect()
}

/// Assert, when `active`, that every field of `nft` is zero.
pub(crate) fn assert_nft_empty_if_active(active: &Boolean<Fr>, nft: &NftVar) -> Result<(), SynthesisError> {
    for field in nft.leaf_fields() {
        assert_equal_if_active(active, &field, &FpVar::zero())?;
    }
    Ok(())
}

/// Assert, when `active`, that a rate does not exceed 100%.
pub(crate) fn assert_rate_if_active(active: &Boolean<Fr>, rate: &FpVar<Fr>) -> Result<(), SynthesisError> {
    let base = FpVar::constant(Fr::from(RATE_BASE));
    assert_less_or_equal_if_active(active, rate, &base, RATE_BITS)
}
