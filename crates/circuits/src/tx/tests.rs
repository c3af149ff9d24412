use std::collections::HashMap;

use ark_relations::r1cs::{ConstraintSystem, ConstraintSystemRef};

use super::*;
use crate::config::TreeDepths;
use crate::field::witness;
use crate::model::{empty_assets_root, Offer, OfferType};
use crate::packed::{pack_amount, pack_fee, unpack_amount, unpack_fee};
use crate::pubdata::PubdataReader;

/// In-memory state where every missing entity reads as its empty form.
#[derive(Clone, Default)]
struct Fixture {
    accounts: HashMap<u32, Account>,
    assets: HashMap<(u32, u16), AccountAsset>,
    pools: HashMap<u16, LiquidityPool>,
    nfts: HashMap<u64, Nft>,
    created_at: u64,
}

impl StateView for Fixture {
    fn account(&self, index: u32) -> Account {
        self.accounts
            .get(&index)
            .cloned()
            .unwrap_or_else(|| Account::empty(index, TreeDepths::testing().asset))
    }

    fn asset(&self, account_index: u32, asset_id: u16) -> AccountAsset {
        self.assets
            .get(&(account_index, asset_id))
            .cloned()
            .unwrap_or_else(|| AccountAsset::empty(asset_id))
    }

    fn pool(&self, pair_index: u16) -> LiquidityPool {
        self.pools
            .get(&pair_index)
            .cloned()
            .unwrap_or_else(|| LiquidityPool::empty(pair_index))
    }

    fn nft(&self, nft_index: u64) -> Nft {
        self.nfts.get(&nft_index).cloned().unwrap_or_else(|| Nft::empty(nft_index))
    }
}

impl Fixture {
    fn named(&mut self, index: u32, name_hash: u64) -> &mut Self {
        let mut account = self.account(index);
        account.name_hash = Fr::from(name_hash);
        self.accounts.insert(index, account);
        self
    }

    fn balance(&mut self, account: u32, asset_id: u16, balance: u128) -> &mut Self {
        let mut asset = self.asset(account, asset_id);
        asset.balance = balance;
        self.assets.insert((account, asset_id), asset);
        self
    }

    /// Apply a payload natively, slot by slot, each slot seeing the writes of
    /// the slots before it.
    fn apply(&mut self, payload: &TxPayload) {
        let native = payload.native();
        let slots = native.slots(self);
        let delta = native.deltas(self).unwrap();
        for (s, account) in slots.accounts.iter().enumerate() {
            for (k, asset_id) in slots.assets[s].iter().enumerate() {
                let after = delta.assets[s][k].apply(*account, &self.asset(*account, *asset_id)).unwrap();
                self.assets.insert((*account, *asset_id), after);
            }
        }
        let pool = delta.liquidity.apply(&self.pool(slots.pair_index)).unwrap();
        self.pools.insert(slots.pair_index, pool);
        if let Some(nft) = delta.nft {
            self.nfts.insert(slots.nft_index, nft);
        }
    }
}

fn gas() -> GasFee {
    GasFee {
        gas_account_index: 6,
        gas_fee_asset_id: 0,
        gas_fee_asset_amount: pack_fee(3).unwrap(),
    }
}

/// Accounts 1, 2, 4, 6, 8; pair 3 over assets 1/2; NFT 5 owned by 1.
fn rich_fixture() -> Fixture {
    let mut fx = Fixture {
        created_at: 150,
        ..Default::default()
    };
    fx.named(1, 11).named(2, 22).named(4, 44).named(6, 66).named(8, 88);
    fx.balance(1, 0, 100).balance(1, 1, 5000).balance(1, 2, 5000);
    fx.balance(2, 1, 5000).balance(8, 0, 50);
    let mut creator = fx.account(1);
    creator.collection_nonce = 2;
    fx.accounts.insert(1, creator);
    fx.assets.insert(
        (1, 3),
        AccountAsset {
            asset_id: 3,
            lp_amount: 500,
            ..Default::default()
        },
    );
    fx.pools.insert(
        3,
        LiquidityPool {
            pair_index: 3,
            asset_a_id: 1,
            asset_a: 1000,
            asset_b_id: 2,
            asset_b: 4000,
            lp_amount: 2000,
            k_last: LiquidityPool::product(1000, 4000),
            fee_rate: 30,
            treasury_account_index: 6,
            treasury_rate: 50,
        },
    );
    fx.nfts.insert(
        5,
        Nft {
            nft_index: 5,
            creator_account_index: 4,
            owner_account_index: 1,
            content_hash: Fr::from(9u64),
            l1_address: [0xaa; 20],
            l1_token_id: Fr::from(77u64),
            creator_treasury_rate: 100,
            collection_id: 1,
        },
    );
    fx
}

fn build_context(cs: &ConstraintSystemRef<Fr>, state: &Fixture, slots: &TxSlots) -> TxContextVar {
    let accounts = slots
        .accounts
        .iter()
        .map(|index| AccountVar::new_witness(cs, &state.account(*index)).unwrap())
        .collect();
    let assets = slots
        .accounts
        .iter()
        .zip(&slots.assets)
        .map(|(account, ids)| {
            ids.iter()
                .map(|id| AccountAssetVar::new_witness(cs, &state.asset(*account, *id)).unwrap())
                .collect()
        })
        .collect();
    TxContextVar {
        accounts,
        assets,
        pool: LiquidityPoolVar::new_witness(cs, &state.pool(slots.pair_index)).unwrap(),
        nft: NftVar::new_witness(cs, &state.nft(slots.nft_index)).unwrap(),
        block_created_at: witness(cs, Fr::from(state.created_at)).unwrap(),
        empty_assets_root: empty_assets_root(TreeDepths::testing().asset),
    }
}

struct Run {
    satisfied: bool,
    constraints: usize,
    pubdata: Vec<Fr>,
    hash_fields: Vec<Fr>,
    asset_leaves: Vec<Vec<Fr>>,
    pool_leaf: Fr,
    nft_leaf: Fr,
    name_hash: Fr,
}

fn values(vars: &[FpVar<Fr>]) -> Vec<Fr> {
    vars.iter().map(|v| v.value().unwrap()).collect()
}

fn synthesize(state: &Fixture, tx_type: FpVar<Fr>, payloads: &TxPayloads, slots: &TxSlots) -> Run {
    let cs = tx_type.cs();
    let ctx = build_context(&cs, state, slots);
    let flags = TxTypeFlags::new(tx_type).unwrap();
    let gadgets = TxPayloadsVar::new_witness(&cs, payloads, &flags).unwrap();
    let out = gadgets.synthesize(&flags, &ctx).unwrap();

    let asset_leaves = out
        .delta
        .assets
        .iter()
        .zip(&ctx.assets)
        .map(|(deltas, befores)| {
            deltas
                .iter()
                .zip(befores)
                .map(|(d, before)| d.apply(before).leaf_hash(cs.clone()).unwrap().value().unwrap())
                .collect()
        })
        .collect();
    let pool = out.delta.liquidity.apply(&ctx.pool);
    Run {
        satisfied: cs.is_satisfied().unwrap(),
        constraints: cs.num_constraints(),
        pubdata: values(&out.pubdata),
        hash_fields: values(&out.hash_fields),
        asset_leaves,
        pool_leaf: pool.leaf_hash(cs.clone()).unwrap().value().unwrap(),
        nft_leaf: out.delta.nft.leaf_hash(cs.clone()).unwrap().value().unwrap(),
        name_hash: out.delta.name_hash.value().unwrap(),
    }
}

fn run(state: &Fixture, payload: &TxPayload) -> Run {
    let cs = ConstraintSystem::<Fr>::new_ref();
    let tx_type = witness(&cs, payload.tx_type().as_fr()).unwrap();
    let slots = payload.native().slots(state);
    synthesize(state, tx_type, &TxPayloads::from(payload), &slots)
}

/// The circuit accepts `payload` and agrees with the native mirror on every
/// output.
fn assert_agrees(state: &Fixture, payload: &TxPayload) {
    let run = run(state, payload);
    assert!(run.satisfied, "{:?} rejected", payload.tx_type());
    assert_eq!(run.pubdata, payload.pubdata(), "{:?} pubdata", payload.tx_type());
    assert_eq!(run.hash_fields, payload.hash_fields(), "{:?} hash fields", payload.tx_type());

    let native = payload.native();
    let slots = native.slots(state);
    let delta = native.deltas(state).unwrap();
    for (s, account) in slots.accounts.iter().enumerate() {
        for (k, asset_id) in slots.assets[s].iter().enumerate() {
            let after = delta.assets[s][k].apply(*account, &state.asset(*account, *asset_id)).unwrap();
            assert_eq!(run.asset_leaves[s][k], after.leaf_hash(), "{:?} asset slot {s}/{k}", payload.tx_type());
        }
    }
    let pool = delta.liquidity.apply(&state.pool(slots.pair_index)).unwrap();
    assert_eq!(run.pool_leaf, pool.leaf_hash(), "{:?} pool", payload.tx_type());
    let nft = delta.nft.clone().unwrap_or_else(|| state.nft(slots.nft_index));
    assert_eq!(run.nft_leaf, nft.leaf_hash(), "{:?} nft", payload.tx_type());
    let name_hash = delta
        .account_info
        .map(|(name_hash, _)| name_hash)
        .unwrap_or_else(|| state.account(slots.accounts[0]).name_hash);
    assert_eq!(run.name_hash, name_hash, "{:?} name hash", payload.tx_type());
}

fn transfer(amount: u128) -> TransferTx {
    TransferTx {
        from_account_index: 1,
        to_account_index: 2,
        to_account_name_hash: Fr::from(22u64),
        asset_id: 1,
        asset_amount: pack_amount(amount).unwrap(),
        gas: gas(),
        call_data_hash: Fr::from(0u64),
    }
}

fn swap(amount_out: u128) -> SwapTx {
    SwapTx {
        from_account_index: 1,
        pair_index: 3,
        asset_a_id: 1,
        asset_a_amount: pack_amount(100).unwrap(),
        asset_b_id: 2,
        asset_b_min_amount: pack_amount(300).unwrap(),
        asset_b_amount_delta: pack_amount(amount_out).unwrap(),
        gas: gas(),
    }
}

fn offer(offer_type: OfferType, offer_id: u32, account_index: u32) -> Offer {
    Offer {
        offer_type,
        offer_id,
        account_index,
        nft_index: 5,
        asset_id: 1,
        asset_amount: pack_amount(1000).unwrap(),
        listed_at: 100,
        expired_at: 200,
        treasury_rate: 50,
        ..Default::default()
    }
}

fn atomic_match() -> AtomicMatchTx {
    AtomicMatchTx {
        account_index: 8,
        buy_offer: offer(OfferType::Buy, Offer::offer_id(2, 5), 2),
        sell_offer: offer(OfferType::Sell, Offer::offer_id(3, 9), 1),
        gas: gas(),
        ..Default::default()
    }
    .with_fees(100)
    .unwrap()
}

fn valid_payloads(fx: &Fixture) -> Vec<TxPayload> {
    let nft = fx.nft(5);
    vec![
        TxPayload::Empty,
        TxPayload::RegisterZns(RegisterZnsTx {
            account_index: 9,
            account_name: Fr::from(123u64),
            account_name_hash: Fr::from(99u64),
            public_key: [7u8; 32],
        }),
        TxPayload::CreatePair(CreatePairTx {
            pair_index: 4,
            asset_a_id: 1,
            asset_b_id: 5,
            fee_rate: 30,
            treasury_account_index: 6,
            treasury_rate: 50,
        }),
        TxPayload::UpdatePairRate(UpdatePairRateTx {
            pair_index: 3,
            fee_rate: 20,
            treasury_account_index: 6,
            treasury_rate: 10,
        }),
        TxPayload::Deposit(DepositTx {
            account_index: 2,
            account_name_hash: Fr::from(22u64),
            asset_id: 1,
            asset_amount: 300,
        }),
        TxPayload::DepositNft(DepositNftTx {
            account_index: 2,
            account_name_hash: Fr::from(22u64),
            nft_index: 7,
            creator_account_index: 4,
            creator_treasury_rate: 10,
            collection_id: 0,
            nft_content_hash: Fr::from(3u64),
            nft_l1_address: [1u8; 20],
            nft_l1_token_id: Fr::from(8u64),
        }),
        TxPayload::Transfer(transfer(250)),
        TxPayload::Swap(swap(360)),
        TxPayload::AddLiquidity(AddLiquidityTx {
            from_account_index: 1,
            pair_index: 3,
            asset_a_id: 1,
            asset_a_amount: pack_amount(100).unwrap(),
            asset_b_id: 2,
            asset_b_amount: pack_amount(400).unwrap(),
            lp_amount: pack_amount(200).unwrap(),
            treasury_amount: pack_amount(treasury_share(200, 50)).unwrap(),
            k_last: LiquidityPool::product(1100, 4400),
            gas: gas(),
        }),
        TxPayload::RemoveLiquidity(RemoveLiquidityTx {
            from_account_index: 1,
            pair_index: 3,
            asset_a_id: 1,
            asset_a_min_amount: pack_amount(90).unwrap(),
            asset_b_id: 2,
            asset_b_min_amount: pack_amount(350).unwrap(),
            lp_amount: pack_amount(200).unwrap(),
            asset_a_amount_delta: pack_amount(100).unwrap(),
            asset_b_amount_delta: pack_amount(400).unwrap(),
            treasury_amount: pack_amount(treasury_share(200, 50)).unwrap(),
            k_last: LiquidityPool::product(900, 3600),
            gas: gas(),
        }),
        TxPayload::Withdraw(WithdrawTx {
            from_account_index: 1,
            asset_id: 2,
            asset_amount: 1234,
            to_address: [3u8; 20],
            gas: gas(),
        }),
        TxPayload::CreateCollection(CreateCollectionTx {
            account_index: 1,
            collection_id: 2,
            gas: gas(),
        }),
        TxPayload::MintNft(MintNftTx {
            creator_account_index: 1,
            to_account_index: 2,
            to_account_name_hash: Fr::from(22u64),
            nft_index: 7,
            nft_content_hash: Fr::from(4u64),
            creator_treasury_rate: 25,
            collection_id: 1,
            gas: gas(),
        }),
        TxPayload::TransferNft(TransferNftTx {
            from_account_index: 1,
            to_account_index: 2,
            to_account_name_hash: Fr::from(22u64),
            nft_index: 5,
            gas: gas(),
            call_data_hash: Fr::from(0u64),
        }),
        TxPayload::AtomicMatch(atomic_match()),
        TxPayload::CancelOffer(CancelOfferTx {
            account_index: 1,
            offer_id: Offer::offer_id(2, 7),
            gas: gas(),
        }),
        TxPayload::WithdrawNft(WithdrawNftTx::for_nft(&nft, Fr::from(44u64), [5u8; 20], gas())),
        TxPayload::FullExit(FullExitTx::for_state(fx, 1, Fr::from(11u64), 2)),
        TxPayload::FullExitNft(FullExitNftTx::for_state(fx, 1, Fr::from(11u64), 5)),
    ]
}

#[test]
fn test_every_type_agrees_with_native_mirror() {
    let fx = rich_fixture();
    let payloads = valid_payloads(&fx);
    let types: Vec<TxType> = payloads.iter().map(TxPayload::tx_type).collect();
    assert_eq!(types, TxType::ALL.to_vec());
    for payload in &payloads {
        assert_agrees(&fx, payload);
    }
}

#[test]
fn test_transfer_scenario() {
    let mut fx = Fixture::default();
    fx.balance(1, 5, 1000).balance(1, 0, 1);
    fx.named(2, 22);
    let payload = TxPayload::Transfer(TransferTx {
        from_account_index: 1,
        to_account_index: 2,
        to_account_name_hash: Fr::from(22u64),
        asset_id: 5,
        asset_amount: pack_amount(100).unwrap(),
        gas: GasFee {
            gas_account_index: 3,
            gas_fee_asset_id: 0,
            gas_fee_asset_amount: pack_fee(1).unwrap(),
        },
        call_data_hash: Fr::from(0u64),
    });
    assert_agrees(&fx, &payload);

    fx.apply(&payload);
    assert_eq!(fx.asset(1, 5).balance, 900);
    assert_eq!(fx.asset(1, 0).balance, 0);
    assert_eq!(fx.asset(2, 5).balance, 100);
    assert_eq!(fx.asset(3, 0).balance, 1);
    // nothing created or destroyed
    assert_eq!(fx.asset(1, 5).balance + fx.asset(2, 5).balance, 1000);

    let pubdata = payload.pubdata();
    let mut reader = PubdataReader::new(&pubdata);
    assert_eq!(reader.read_u64(8), TxType::Transfer as u64);
    assert_eq!(reader.read_u64(32), 1);
    assert_eq!(reader.read_u64(32), 2);
    assert_eq!(reader.read_u64(16), 5);
    assert_eq!(unpack_amount(reader.read_u64(40)).unwrap(), 100);
    assert_eq!(reader.read_u64(32), 3);
    assert_eq!(reader.read_u64(16), 0);
    assert_eq!(unpack_fee(reader.read_u64(16)).unwrap(), 1);
}

#[test]
fn test_transfer_over_balance_unsatisfied() {
    let fx = rich_fixture();
    let run = run(&fx, &TxPayload::Transfer(transfer(5001)));
    assert!(!run.satisfied);
}

#[test]
fn test_transfer_to_wrong_name_unsatisfied() {
    let fx = rich_fixture();
    let mut tx = transfer(10);
    tx.to_account_name_hash = Fr::from(23u64);
    assert!(!run(&fx, &TxPayload::Transfer(tx)).satisfied);
}

#[test]
fn test_swap_invariant_boundary() {
    let mut fx = Fixture {
        created_at: 150,
        ..Default::default()
    };
    fx.balance(1, 1, 500).balance(1, 0, 10);
    fx.pools.insert(
        2,
        LiquidityPool {
            pair_index: 2,
            asset_a_id: 1,
            asset_a: 1000,
            asset_b_id: 2,
            asset_b: 1000,
            lp_amount: 1000,
            k_last: LiquidityPool::product(1000, 1000),
            fee_rate: 30,
            treasury_account_index: 6,
            treasury_rate: 0,
        },
    );
    let swap_out = |out: u128| {
        TxPayload::Swap(SwapTx {
            pair_index: 2,
            asset_b_min_amount: pack_amount(80).unwrap(),
            ..swap(out)
        })
    };
    // 1000 * 1000 <= (1000 + 100 * 0.997) * (1000 - out) holds up to out = 90
    assert_agrees(&fx, &swap_out(90));
    assert!(!run(&fx, &swap_out(91)).satisfied);
}

#[test]
fn test_swap_below_minimum_unsatisfied() {
    let fx = rich_fixture();
    let payload = TxPayload::Swap(SwapTx {
        asset_b_min_amount: pack_amount(361).unwrap(),
        ..swap(360)
    });
    assert!(!run(&fx, &payload).satisfied);
}

#[test]
fn test_add_liquidity_over_share_unsatisfied() {
    let fx = rich_fixture();
    let payload = TxPayload::AddLiquidity(AddLiquidityTx {
        from_account_index: 1,
        pair_index: 3,
        asset_a_id: 1,
        asset_a_amount: pack_amount(100).unwrap(),
        asset_b_id: 2,
        asset_b_amount: pack_amount(400).unwrap(),
        lp_amount: pack_amount(201).unwrap(),
        treasury_amount: pack_amount(treasury_share(201, 50)).unwrap(),
        k_last: LiquidityPool::product(1100, 4400),
        gas: gas(),
    });
    assert!(!run(&fx, &payload).satisfied);
}

/// Pool 3 rescaled so every reserve holds `reserve`, with the provider
/// funded to deposit `amount` on each side.
fn big_pool_fixture(reserve: u128, amount: u128) -> Fixture {
    let mut fx = rich_fixture();
    fx.balance(1, 1, amount).balance(1, 2, amount);
    let pool = fx.pools.get_mut(&3).unwrap();
    pool.asset_a = reserve;
    pool.asset_b = reserve;
    pool.lp_amount = reserve;
    pool.k_last = LiquidityPool::product(reserve, reserve);
    fx
}

fn proportional_deposit(reserve: u128, amount: u128) -> TxPayload {
    TxPayload::AddLiquidity(AddLiquidityTx {
        from_account_index: 1,
        pair_index: 3,
        asset_a_id: 1,
        asset_a_amount: pack_amount(amount).unwrap(),
        asset_b_id: 2,
        asset_b_amount: pack_amount(amount).unwrap(),
        lp_amount: pack_amount(amount).unwrap(),
        treasury_amount: pack_amount(treasury_share(amount, 50)).unwrap(),
        k_last: LiquidityPool::product(reserve + amount, reserve + amount),
        gas: gas(),
    })
}

#[test]
fn test_add_liquidity_to_large_pool() {
    let reserve = 10u128.pow(29);
    let amount = 10u128.pow(27);
    let fx = big_pool_fixture(reserve, amount);
    let payload = proportional_deposit(reserve, amount);
    assert_agrees(&fx, &payload);
    println!("large pool deposit: {} constraints", run(&fx, &payload).constraints);
}

#[test]
fn test_add_liquidity_beyond_amm_width_rejected() {
    let reserve = 10u128.pow(33);
    let amount = 10u128.pow(30);
    let fx = big_pool_fixture(reserve, amount);
    let payload = proportional_deposit(reserve, amount);
    assert_eq!(
        payload.native().deltas(&fx).err(),
        Some(WitnessError::AmmRange {
            pair_index: 3,
            field: "reserve a",
        })
    );
    assert!(!run(&fx, &payload).satisfied);
}

#[test]
fn test_atomic_match_on_used_slot_unsatisfied() {
    let mut fx = rich_fixture();
    fx.assets.insert(
        (2, 2),
        AccountAsset {
            asset_id: 2,
            offer_canceled_or_finalized: 1 << 5,
            ..Default::default()
        },
    );
    assert!(!run(&fx, &TxPayload::AtomicMatch(atomic_match())).satisfied);
}

#[test]
fn test_atomic_match_split_conserves_amount() {
    let mut fx = rich_fixture();
    let tx = atomic_match();
    assert_eq!((tx.creator_amount, tx.treasury_amount), (10, 5));
    let payload = TxPayload::AtomicMatch(tx);
    fx.apply(&payload);
    assert_eq!(fx.asset(2, 1).balance, 4000);
    assert_eq!(fx.asset(1, 1).balance, 5000 + 985);
    assert_eq!(fx.asset(4, 1).balance, 10);
    assert_eq!(fx.asset(6, 1).balance, 5);
    assert!(fx.asset(2, 2).is_offer_slot_used(5));
    assert!(fx.asset(1, 3).is_offer_slot_used(9));
    assert_eq!(fx.nft(5).owner_account_index, 2);
}

#[test]
fn test_atomic_match_expired_offer_unsatisfied() {
    let mut fx = rich_fixture();
    fx.created_at = 201;
    assert!(!run(&fx, &TxPayload::AtomicMatch(atomic_match())).satisfied);
}

#[test]
fn test_atomic_match_overstated_royalty_unsatisfied() {
    let fx = rich_fixture();
    let mut tx = atomic_match();
    tx.creator_amount += 1;
    assert!(!run(&fx, &TxPayload::AtomicMatch(tx)).satisfied);
}

#[test]
fn test_cancel_offer_twice() {
    let mut fx = rich_fixture();
    let payload = TxPayload::CancelOffer(CancelOfferTx {
        account_index: 1,
        offer_id: Offer::offer_id(2, 7),
        gas: gas(),
    });
    assert_agrees(&fx, &payload);
    fx.apply(&payload);
    assert!(fx.asset(1, 2).is_offer_slot_used(7));
    assert!(!run(&fx, &payload).satisfied);
}

#[test]
fn test_full_exit_without_ownership_exits_nothing() {
    let fx = rich_fixture();
    let stranger = FullExitTx::for_state(&fx, 1, Fr::from(12u64), 2);
    assert_eq!(stranger.asset_amount, 0);
    assert_agrees(&fx, &TxPayload::FullExit(stranger.clone()));

    let greedy = FullExitTx {
        asset_amount: 5000,
        ..stranger
    };
    assert!(!run(&fx, &TxPayload::FullExit(greedy)).satisfied);
}

#[test]
fn test_full_exit_nft_by_non_owner_leaves_nft() {
    let fx = rich_fixture();
    let request = FullExitNftTx::for_state(&fx, 2, Fr::from(22u64), 5);
    assert_eq!(request.creator_account_index, 0);
    assert_agrees(&fx, &TxPayload::FullExitNft(request.clone()));

    let forged = FullExitNftTx {
        creator_account_index: 4,
        creator_account_name_hash: Fr::from(44u64),
        ..request
    };
    assert!(!run(&fx, &TxPayload::FullExitNft(forged)).satisfied);
}

#[test]
fn test_mint_into_unopened_collection_unsatisfied() {
    let fx = rich_fixture();
    let payload = TxPayload::MintNft(MintNftTx {
        creator_account_index: 1,
        to_account_index: 2,
        to_account_name_hash: Fr::from(22u64),
        nft_index: 7,
        collection_id: 2,
        gas: gas(),
        ..Default::default()
    });
    assert!(!run(&fx, &payload).satisfied);
}

#[test]
fn test_register_taken_account_unsatisfied() {
    let fx = rich_fixture();
    let payload = TxPayload::RegisterZns(RegisterZnsTx {
        account_index: 1,
        account_name_hash: Fr::from(5u64),
        ..Default::default()
    });
    assert!(!run(&fx, &payload).satisfied);
}

#[test]
fn test_register_requires_empty_account() {
    let payload = TxPayload::RegisterZns(RegisterZnsTx {
        account_index: 9,
        account_name: Fr::from(123u64),
        account_name_hash: Fr::from(99u64),
        public_key: [7u8; 32],
    });
    let fresh = rich_fixture();
    assert!(run(&fresh, &payload).satisfied);

    // name hash cleared, but something else still marks the account as used
    let used: [fn(&mut Account); 4] = [
        |a| a.nonce = 1,
        |a| a.collection_nonce = 1,
        |a| a.public_key[31] = 1,
        |a| a.assets_root = Fr::from(5u64),
    ];
    for mark in used {
        let mut fx = rich_fixture();
        let mut account = fx.account(9);
        mark(&mut account);
        fx.accounts.insert(9, account);
        assert!(!run(&fx, &payload).satisfied);
    }
}

#[test]
fn test_inactive_adversarial_payloads_are_vacuous() {
    let fx = rich_fixture();
    let payloads = TxPayloads {
        transfer: TransferTx {
            asset_amount: (1 << 40) - 1,
            ..transfer(1)
        },
        cancel_offer: CancelOfferTx {
            offer_id: u32::MAX,
            ..Default::default()
        },
        atomic_match: atomic_match(),
        withdraw: WithdrawTx {
            asset_amount: u128::MAX,
            ..Default::default()
        },
        ..Default::default()
    };
    let cs = ConstraintSystem::<Fr>::new_ref();
    let tx_type = witness(&cs, TxType::Empty.as_fr()).unwrap();
    let run = synthesize(&fx, tx_type, &payloads, &TxSlots::default());
    assert!(run.satisfied);
    assert!(run.pubdata.iter().all(|e| *e == Fr::from(0u64)));
    println!("constraints per transaction body: {}", run.constraints);
}

#[test]
fn test_unknown_type_tag_unsatisfied() {
    let fx = rich_fixture();
    let cs = ConstraintSystem::<Fr>::new_ref();
    let tx_type = witness(&cs, Fr::from(19u64)).unwrap();
    let run = synthesize(&fx, tx_type, &TxPayloads::default(), &TxSlots::default());
    assert!(!run.satisfied);
    assert!(TxType::try_from(19u8).is_err());
}

#[test]
fn test_flag_sets() {
    let layer2: Vec<_> = TxType::ALL.iter().filter(|t| t.is_layer2()).collect();
    let on_chain: Vec<_> = TxType::ALL.iter().filter(|t| t.is_on_chain_op()).collect();
    assert_eq!(layer2.len(), 11);
    assert_eq!(on_chain.len(), 9);
    assert!(!TxType::Empty.is_layer2() && !TxType::Empty.is_on_chain_op());
}

#[test]
fn test_tx_hash_matches_gadget() {
    let payload = TxPayload::Transfer(transfer(250));
    let fields = payload.hash_fields();
    let native = tx_hash(TxType::Transfer, 4, 1000, &fields);

    let cs = ConstraintSystem::<Fr>::new_ref();
    let vars: Vec<_> = fields.iter().map(|f| witness(&cs, *f).unwrap()).collect();
    let gadget = tx_hash_var(
        cs.clone(),
        &witness(&cs, TxType::Transfer.as_fr()).unwrap(),
        &witness(&cs, Fr::from(4u64)).unwrap(),
        &witness(&cs, Fr::from(1000u64)).unwrap(),
        &vars,
    )
    .unwrap();
    assert_eq!(gadget.value().unwrap(), native);
    assert_ne!(native, tx_hash(TxType::Transfer, 5, 1000, &fields));
}
