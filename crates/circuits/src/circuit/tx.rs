//! Transaction verifier.
//!
//! Runs, unconditionally and in this order: type decoding, payload validation,
//! signature binding, pubdata collection, delta application, then the Merkle
//! updates of the five account slots (each with its four asset slots), the
//! liquidity pool and the NFT. Effects are gated by the type flags; an Empty
//! transaction authenticates nothing and asserts no root.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::comparators::{assert_equal_if_active, assert_less_or_equal_if_active, enforce_range_if_active};
use crate::config::{TreeDepths, BALANCE_BITS, TIMESTAMP_BITS};
use crate::field::witness;
use crate::merkle::{alloc_siblings, index_to_merkle_path, update_merkle_proof, verify_merkle_proof, PoseidonHasher};
use crate::model::{empty_assets_root, state_root_var, AccountAssetVar, AccountVar, LiquidityPoolVar, NftVar};
use crate::signature::SignatureHintVar;
use crate::tx::{tx_hash_var, TxContextVar, TxPayloads, TxPayloadsVar, TxType, TxTypeFlags};
use crate::witness::Transaction;

/// What one verified transaction hands to the block.
pub struct TxVerifierOutput {
    pub pubdata: Vec<FpVar<Fr>>,
    /// 1 for an on-chain operation, 0 otherwise.
    pub on_chain_op: FpVar<Fr>,
    pub is_empty: Boolean<Fr>,
    pub root_before: FpVar<Fr>,
    pub root_after: FpVar<Fr>,
}

fn alloc_context(
    cs: &ConstraintSystemRef<Fr>,
    depths: &TreeDepths,
    tx: &Transaction,
    created_at: &FpVar<Fr>,
) -> Result<TxContextVar, SynthesisError> {
    let mut accounts = Vec::with_capacity(tx.accounts.len());
    let mut assets = Vec::with_capacity(tx.accounts.len());
    for slot in &tx.accounts {
        accounts.push(AccountVar::new_witness(cs, &slot.account)?);
        assets.push(
            slot.assets
                .iter()
                .map(|a| AccountAssetVar::new_witness(cs, &a.asset))
                .collect::<Result<Vec<_>, _>>()?,
        );
    }
    Ok(TxContextVar {
        accounts,
        assets,
        pool: LiquidityPoolVar::new_witness(cs, &tx.pool)?,
        nft: NftVar::new_witness(cs, &tx.nft)?,
        block_created_at: created_at.clone(),
        empty_assets_root: empty_assets_root(depths.asset),
    })
}

/// Synthesize the constraints of one transaction.
pub fn verify_transaction(
    cs: &ConstraintSystemRef<Fr>,
    depths: &TreeDepths,
    tx: &Transaction,
    created_at: &FpVar<Fr>,
) -> Result<TxVerifierOutput, SynthesisError> {
    let hasher = PoseidonHasher;

    // type select
    let flags = TxTypeFlags::new(witness(cs, tx.tx_type().as_fr())?)?;
    let active = flags.is_empty().not();
    let layer2 = flags.is_layer2()?;

    let account_root_before = witness(cs, tx.roots_before.account)?;
    let liquidity_root_before = witness(cs, tx.roots_before.liquidity)?;
    let nft_root_before = witness(cs, tx.roots_before.nft)?;
    let root_before = state_root_var(&account_root_before, &liquidity_root_before, &nft_root_before)?;
    let claimed_root_after = witness(cs, tx.state_root_after)?;

    let ctx = alloc_context(cs, depths, tx, created_at)?;
    for account in &ctx.accounts {
        account.enforce_public_key_bytes(&active)?;
    }

    // field validation, pubdata and deltas of every type
    let payloads = TxPayloadsVar::new_witness(cs, &TxPayloads::from(&tx.payload), &flags)?;
    let out = payloads.synthesize(&flags, &ctx)?;

    // signature
    let nonce = witness(cs, Fr::from(tx.nonce))?;
    let expired_at = witness(cs, Fr::from(tx.expired_at))?;
    assert_equal_if_active(&layer2, &nonce, &ctx.accounts[0].nonce)?;
    enforce_range_if_active(&layer2, &expired_at, TIMESTAMP_BITS)?;
    assert_less_or_equal_if_active(&layer2, created_at, &expired_at, TIMESTAMP_BITS)?;
    let hash = tx_hash_var(cs.clone(), &flags.tx_type, &nonce, &expired_at, &out.hash_fields)?;
    let hint = SignatureHintVar::new_witness(cs, &tx.hint)?;
    let matched = &payloads.atomic_match;
    hint.bind(&flags, &hash, &ctx, [&matched.buy.hash, &matched.sell.hash])?;

    // accounts, each with its asset subtree
    let delta = &out.delta;
    let mut account_root = account_root_before;
    for (i, slot) in tx.accounts.iter().enumerate() {
        let account = &ctx.accounts[i];
        let siblings = alloc_siblings(cs, &slot.path)?;
        let path = index_to_merkle_path(&active, &account.index, depths.account)?;
        let leaf = account.leaf_hash(cs.clone())?;
        verify_merkle_proof(cs.clone(), &active, &hasher, &account_root, &leaf, &siblings, &path)?;

        let mut assets_root = account.assets_root.clone();
        for (j, asset_slot) in slot.assets.iter().enumerate() {
            let before = &ctx.assets[i][j];
            let asset_siblings = alloc_siblings(cs, &asset_slot.path)?;
            let asset_path = index_to_merkle_path(&active, &before.asset_id, depths.asset)?;
            let asset_leaf = before.leaf_hash(cs.clone())?;
            verify_merkle_proof(
                cs.clone(),
                &active,
                &hasher,
                &assets_root,
                &asset_leaf,
                &asset_siblings,
                &asset_path,
            )?;
            let after = delta.assets[i][j].apply(before);
            enforce_range_if_active(&active, &after.balance, BALANCE_BITS)?;
            enforce_range_if_active(&active, &after.lp_amount, BALANCE_BITS)?;
            let new_leaf = after.leaf_hash(cs.clone())?;
            assets_root = update_merkle_proof(cs.clone(), &hasher, &new_leaf, &asset_siblings, &asset_path)?;
        }

        let new_leaf = if i == 0 {
            let nonce_after = &account.nonce + FpVar::from(layer2.clone());
            let collections_after =
                &account.collection_nonce + FpVar::from(flags.flag(TxType::CreateCollection).clone());
            account.leaf_hash_with(
                cs.clone(),
                &delta.name_hash,
                &delta.public_key,
                &nonce_after,
                &collections_after,
                &assets_root,
            )?
        } else {
            account.leaf_hash_with(
                cs.clone(),
                &account.name_hash,
                &account.public_key,
                &account.nonce,
                &account.collection_nonce,
                &assets_root,
            )?
        };
        account_root = update_merkle_proof(cs.clone(), &hasher, &new_leaf, &siblings, &path)?;
    }

    // liquidity
    let pool_siblings = alloc_siblings(cs, &tx.pool_path)?;
    let pool_path = index_to_merkle_path(&active, &ctx.pool.pair_index, depths.liquidity)?;
    let pool_leaf = ctx.pool.leaf_hash(cs.clone())?;
    verify_merkle_proof(
        cs.clone(),
        &active,
        &hasher,
        &liquidity_root_before,
        &pool_leaf,
        &pool_siblings,
        &pool_path,
    )?;
    let pool_after = delta.liquidity.apply(&ctx.pool);
    for reserve in [&pool_after.asset_a, &pool_after.asset_b, &pool_after.lp_amount] {
        enforce_range_if_active(&active, reserve, BALANCE_BITS)?;
    }
    let liquidity_root = update_merkle_proof(
        cs.clone(),
        &hasher,
        &pool_after.leaf_hash(cs.clone())?,
        &pool_siblings,
        &pool_path,
    )?;

    // nft
    let nft_siblings = alloc_siblings(cs, &tx.nft_path)?;
    let nft_path = index_to_merkle_path(&active, &ctx.nft.nft_index, depths.nft)?;
    let nft_leaf = ctx.nft.leaf_hash(cs.clone())?;
    verify_merkle_proof(cs.clone(), &active, &hasher, &nft_root_before, &nft_leaf, &nft_siblings, &nft_path)?;
    let nft_root = update_merkle_proof(
        cs.clone(),
        &hasher,
        &delta.nft.leaf_hash(cs.clone())?,
        &nft_siblings,
        &nft_path,
    )?;

    let root_after = state_root_var(&account_root, &liquidity_root, &nft_root)?;
    assert_equal_if_active(&active, &root_after, &claimed_root_after)?;

    Ok(TxVerifierOutput {
        pubdata: out.pubdata,
        on_chain_op: flags.on_chain_op(),
        is_empty: flags.is_empty().clone(),
        root_before,
        root_after: claimed_root_after,
    })
}
