//! Payload registry: one native payload per transaction, one gadget per type.

use ark_bn254::Fr;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::*;
use crate::config::{PUBDATA_ELEMENTS, TX_HASH_FIELDS};
use crate::poseidon::{poseidon_hash_many, poseidon_hash_many_var};
use crate::pubdata::{pack_pubdata, pack_pubdata_var};

/// The payload of one transaction, tagged by its type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TxPayload {
    #[default]
    Empty,
    RegisterZns(RegisterZnsTx),
    CreatePair(CreatePairTx),
    UpdatePairRate(UpdatePairRateTx),
    Deposit(DepositTx),
    DepositNft(DepositNftTx),
    Transfer(TransferTx),
    Swap(SwapTx),
    AddLiquidity(AddLiquidityTx),
    RemoveLiquidity(RemoveLiquidityTx),
    Withdraw(WithdrawTx),
    CreateCollection(CreateCollectionTx),
    MintNft(MintNftTx),
    TransferNft(TransferNftTx),
    AtomicMatch(AtomicMatchTx),
    CancelOffer(CancelOfferTx),
    WithdrawNft(WithdrawNftTx),
    FullExit(FullExitTx),
    FullExitNft(FullExitNftTx),
}

/// Filler transaction: touches account 0 and changes nothing.
struct EmptyTx;

impl NativeTx for EmptyTx {
    fn tx_type(&self) -> TxType {
        TxType::Empty
    }

    fn slots(&self, _state: &dyn StateView) -> TxSlots {
        TxSlots::default()
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        Vec::new()
    }

    fn hash_fields(&self) -> Vec<Fr> {
        Vec::new()
    }

    fn deltas(&self, _state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        Ok(TxDelta::default())
    }
}

impl TxPayload {
    pub fn tx_type(&self) -> TxType {
        self.native().tx_type()
    }

    pub fn native(&self) -> &dyn NativeTx {
        match self {
            TxPayload::Empty => &EmptyTx,
            TxPayload::RegisterZns(tx) => tx,
            TxPayload::CreatePair(tx) => tx,
            TxPayload::UpdatePairRate(tx) => tx,
            TxPayload::Deposit(tx) => tx,
            TxPayload::DepositNft(tx) => tx,
            TxPayload::Transfer(tx) => tx,
            TxPayload::Swap(tx) => tx,
            TxPayload::AddLiquidity(tx) => tx,
            TxPayload::RemoveLiquidity(tx) => tx,
            TxPayload::Withdraw(tx) => tx,
            TxPayload::CreateCollection(tx) => tx,
            TxPayload::MintNft(tx) => tx,
            TxPayload::TransferNft(tx) => tx,
            TxPayload::AtomicMatch(tx) => tx,
            TxPayload::CancelOffer(tx) => tx,
            TxPayload::WithdrawNft(tx) => tx,
            TxPayload::FullExit(tx) => tx,
            TxPayload::FullExitNft(tx) => tx,
        }
    }

    /// The full pubdata layout including the type tag.
    pub fn pubdata_layout(&self) -> Vec<PubdataField<Fr>> {
        tagged_layout(self.tx_type().as_fr(), self.native().pubdata_fields())
    }
}

/// Every type's payload for one transaction slot. The active type carries the
/// real payload; the other 17 hold defaults, which the gated gadgets accept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxPayloads {
    pub register_zns: RegisterZnsTx,
    pub create_pair: CreatePairTx,
    pub update_pair_rate: UpdatePairRateTx,
    pub deposit: DepositTx,
    pub deposit_nft: DepositNftTx,
    pub transfer: TransferTx,
    pub swap: SwapTx,
    pub add_liquidity: AddLiquidityTx,
    pub remove_liquidity: RemoveLiquidityTx,
    pub withdraw: WithdrawTx,
    pub create_collection: CreateCollectionTx,
    pub mint_nft: MintNftTx,
    pub transfer_nft: TransferNftTx,
    pub atomic_match: AtomicMatchTx,
    pub cancel_offer: CancelOfferTx,
    pub withdraw_nft: WithdrawNftTx,
    pub full_exit: FullExitTx,
    pub full_exit_nft: FullExitNftTx,
}

impl From<&TxPayload> for TxPayloads {
    fn from(payload: &TxPayload) -> Self {
        let mut payloads = TxPayloads::default();
        match payload.clone() {
            TxPayload::Empty => {}
            TxPayload::RegisterZns(tx) => payloads.register_zns = tx,
            TxPayload::CreatePair(tx) => payloads.create_pair = tx,
            TxPayload::UpdatePairRate(tx) => payloads.update_pair_rate = tx,
            TxPayload::Deposit(tx) => payloads.deposit = tx,
            TxPayload::DepositNft(tx) => payloads.deposit_nft = tx,
            TxPayload::Transfer(tx) => payloads.transfer = tx,
            TxPayload::Swap(tx) => payloads.swap = tx,
            TxPayload::AddLiquidity(tx) => payloads.add_liquidity = tx,
            TxPayload::RemoveLiquidity(tx) => payloads.remove_liquidity = tx,
            TxPayload::Withdraw(tx) => payloads.withdraw = tx,
            TxPayload::CreateCollection(tx) => payloads.create_collection = tx,
            TxPayload::MintNft(tx) => payloads.mint_nft = tx,
            TxPayload::TransferNft(tx) => payloads.transfer_nft = tx,
            TxPayload::AtomicMatch(tx) => payloads.atomic_match = tx,
            TxPayload::CancelOffer(tx) => payloads.cancel_offer = tx,
            TxPayload::WithdrawNft(tx) => payloads.withdraw_nft = tx,
            TxPayload::FullExit(tx) => payloads.full_exit = tx,
            TxPayload::FullExitNft(tx) => payloads.full_exit_nft = tx,
        }
        payloads
    }
}

impl TxPayloads {
    /// The 18 native payloads in type id order.
    pub fn natives(&self) -> [(TxType, &dyn NativeTx); 18] {
        [
            (TxType::RegisterZns, &self.register_zns),
            (TxType::CreatePair, &self.create_pair),
            (TxType::UpdatePairRate, &self.update_pair_rate),
            (TxType::Deposit, &self.deposit),
            (TxType::DepositNft, &self.deposit_nft),
            (TxType::Transfer, &self.transfer),
            (TxType::Swap, &self.swap),
            (TxType::AddLiquidity, &self.add_liquidity),
            (TxType::RemoveLiquidity, &self.remove_liquidity),
            (TxType::Withdraw, &self.withdraw),
            (TxType::CreateCollection, &self.create_collection),
            (TxType::MintNft, &self.mint_nft),
            (TxType::TransferNft, &self.transfer_nft),
            (TxType::AtomicMatch, &self.atomic_match),
            (TxType::CancelOffer, &self.cancel_offer),
            (TxType::WithdrawNft, &self.withdraw_nft),
            (TxType::FullExit, &self.full_exit),
            (TxType::FullExitNft, &self.full_exit_nft),
        ]
    }
}

/// All 18 gadgets of one transaction, each allocated against its own flag.
pub struct TxPayloadsVar {
    pub register_zns: RegisterZnsTxVar,
    pub create_pair: CreatePairTxVar,
    pub update_pair_rate: UpdatePairRateTxVar,
    pub deposit: DepositTxVar,
    pub deposit_nft: DepositNftTxVar,
    pub transfer: TransferTxVar,
    pub swap: SwapTxVar,
    pub add_liquidity: AddLiquidityTxVar,
    pub remove_liquidity: RemoveLiquidityTxVar,
    pub withdraw: WithdrawTxVar,
    pub create_collection: CreateCollectionTxVar,
    pub mint_nft: MintNftTxVar,
    pub transfer_nft: TransferNftTxVar,
    pub atomic_match: AtomicMatchTxVar,
    pub cancel_offer: CancelOfferTxVar,
    pub withdraw_nft: WithdrawNftTxVar,
    pub full_exit: FullExitTxVar,
    pub full_exit_nft: FullExitNftTxVar,
}

impl TxPayloadsVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        payloads: &TxPayloads,
        flags: &TxTypeFlags,
    ) -> Result<Self, SynthesisError> {
        use TxType::*;
        Ok(Self {
            register_zns: RegisterZnsTxVar::new_witness(cs, &payloads.register_zns, flags.flag(RegisterZns))?,
            create_pair: CreatePairTxVar::new_witness(cs, &payloads.create_pair, flags.flag(CreatePair))?,
            update_pair_rate: UpdatePairRateTxVar::new_witness(
                cs,
                &payloads.update_pair_rate,
                flags.flag(UpdatePairRate),
            )?,
            deposit: DepositTxVar::new_witness(cs, &payloads.deposit, flags.flag(Deposit))?,
            deposit_nft: DepositNftTxVar::new_witness(cs, &payloads.deposit_nft, flags.flag(DepositNft))?,
            transfer: TransferTxVar::new_witness(cs, &payloads.transfer, flags.flag(Transfer))?,
            swap: SwapTxVar::new_witness(cs, &payloads.swap, flags.flag(Swap))?,
            add_liquidity: AddLiquidityTxVar::new_witness(cs, &payloads.add_liquidity, flags.flag(AddLiquidity))?,
            remove_liquidity: RemoveLiquidityTxVar::new_witness(
                cs,
                &payloads.remove_liquidity,
                flags.flag(RemoveLiquidity),
            )?,
            withdraw: WithdrawTxVar::new_witness(cs, &payloads.withdraw, flags.flag(Withdraw))?,
            create_collection: CreateCollectionTxVar::new_witness(
                cs,
                &payloads.create_collection,
                flags.flag(CreateCollection),
            )?,
            mint_nft: MintNftTxVar::new_witness(cs, &payloads.mint_nft, flags.flag(MintNft))?,
            transfer_nft: TransferNftTxVar::new_witness(cs, &payloads.transfer_nft, flags.flag(TransferNft))?,
            atomic_match: AtomicMatchTxVar::new_witness(cs, &payloads.atomic_match, flags.flag(AtomicMatch))?,
            cancel_offer: CancelOfferTxVar::new_witness(cs, &payloads.cancel_offer, flags.flag(CancelOffer))?,
            withdraw_nft: WithdrawNftTxVar::new_witness(cs, &payloads.withdraw_nft, flags.flag(WithdrawNft))?,
            full_exit: FullExitTxVar::new_witness(cs, &payloads.full_exit, flags.flag(FullExit))?,
            full_exit_nft: FullExitNftTxVar::new_witness(cs, &payloads.full_exit_nft, flags.flag(FullExitNft))?,
        })
    }

    /// The 18 gadgets in type id order.
    pub fn gadgets(&self) -> [(TxType, &dyn TxGadget); 18] {
        [
            (TxType::RegisterZns, &self.register_zns),
            (TxType::CreatePair, &self.create_pair),
            (TxType::UpdatePairRate, &self.update_pair_rate),
            (TxType::Deposit, &self.deposit),
            (TxType::DepositNft, &self.deposit_nft),
            (TxType::Transfer, &self.transfer),
            (TxType::Swap, &self.swap),
            (TxType::AddLiquidity, &self.add_liquidity),
            (TxType::RemoveLiquidity, &self.remove_liquidity),
            (TxType::Withdraw, &self.withdraw),
            (TxType::CreateCollection, &self.create_collection),
            (TxType::MintNft, &self.mint_nft),
            (TxType::TransferNft, &self.transfer_nft),
            (TxType::AtomicMatch, &self.atomic_match),
            (TxType::CancelOffer, &self.cancel_offer),
            (TxType::WithdrawNft, &self.withdraw_nft),
            (TxType::FullExit, &self.full_exit),
            (TxType::FullExitNft, &self.full_exit_nft),
        ]
    }
}

/// Pad a type's hash fields to the fixed hash width.
pub(crate) fn padded<T: Clone>(mut fields: Vec<T>, zero: T) -> Vec<T> {
    debug_assert!(fields.len() <= TX_HASH_FIELDS);
    fields.resize(TX_HASH_FIELDS, zero);
    fields
}

impl TxPayload {
    pub fn pubdata(&self) -> Vec<Fr> {
        pack_pubdata(&self.pubdata_layout())
    }

    /// Payload hash fields padded to `TX_HASH_FIELDS`.
    pub fn hash_fields(&self) -> Vec<Fr> {
        padded(self.native().hash_fields(), Fr::from(0u64))
    }
}

/// `Poseidon([txType, nonce, expiredAt, fields...])`, the value every
/// signature of a layer-2 transaction is bound to.
pub fn tx_hash(tx_type: TxType, nonce: u64, expired_at: u64, hash_fields: &[Fr]) -> Fr {
    let mut input = vec![tx_type.as_fr(), Fr::from(nonce), Fr::from(expired_at)];
    input.extend_from_slice(hash_fields);
    poseidon_hash_many(&input)
}

pub fn tx_hash_var(
    cs: ConstraintSystemRef<Fr>,
    tx_type: &FpVar<Fr>,
    nonce: &FpVar<Fr>,
    expired_at: &FpVar<Fr>,
    hash_fields: &[FpVar<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut input = vec![tx_type.clone(), nonce.clone(), expired_at.clone()];
    input.extend_from_slice(hash_fields);
    poseidon_hash_many_var(cs, &input)
}

/// What the active type contributes to its transaction, after flag selection.
#[derive(Clone, Debug)]
pub struct TxOutputVar {
    pub pubdata: Vec<FpVar<Fr>>,
    pub hash_fields: Vec<FpVar<Fr>>,
    pub delta: TxDeltaVar,
}

fn select_all(
    flag: &Boolean<Fr>,
    candidate: &[FpVar<Fr>],
    acc: &[FpVar<Fr>],
) -> Result<Vec<FpVar<Fr>>, SynthesisError> {
    candidate.iter().zip(acc).map(|(c, a)| flag.select(c, a)).collect()
}

impl TxPayloadsVar {
    /// Validate every type under its own flag and fold pubdata, hash fields
    /// and deltas down to the active type's. An Empty transaction yields zero
    /// pubdata, zero hash fields and the identity delta.
    pub fn synthesize(&self, flags: &TxTypeFlags, ctx: &TxContextVar) -> Result<TxOutputVar, SynthesisError> {
        let mut pubdata = vec![FpVar::zero(); PUBDATA_ELEMENTS];
        let mut hash_fields = vec![FpVar::zero(); TX_HASH_FIELDS];
        let mut candidates = Vec::with_capacity(TxType::ALL.len() - 1);
        for (tx_type, gadget) in self.gadgets() {
            let active = flags.flag(tx_type);
            gadget.validate(active, ctx)?;

            let layout = tagged_layout(FpVar::constant(tx_type.as_fr()), gadget.pubdata_fields());
            pubdata = select_all(active, &pack_pubdata_var(active, &layout)?, &pubdata)?;
            let fields = padded(gadget.hash_fields(), FpVar::zero());
            hash_fields = select_all(active, &fields, &hash_fields)?;
            candidates.push((active.clone(), gadget.deltas(active, ctx)?));
        }
        Ok(TxOutputVar {
            pubdata,
            hash_fields,
            delta: TxDeltaVar::aggregate(ctx.identity_delta(), &candidates)?,
        })
    }
}
