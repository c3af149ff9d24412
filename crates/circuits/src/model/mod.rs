//! Per-entity field layouts, their empty forms and leaf hashes.
//!
//! Each entity has a native struct (witness builder, tests) and a `*Var`
//! mirror allocated into the constraint system. Leaf hashes are Poseidon over
//! the fields in declaration order.

mod account;
mod asset;
mod liquidity;
mod nft;
mod offer;

pub use account::{Account, AccountVar, PublicKey};
pub use asset::{empty_asset_leaf, empty_assets_root, AccountAsset, AccountAssetVar};
pub use liquidity::{LiquidityPool, LiquidityPoolVar};
pub use nft::{Nft, NftVar};
pub use offer::{Offer, OfferType, OfferVar, SignatureBytes};

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::SynthesisError;

use crate::poseidon::{poseidon_hash_many, poseidon_hash_many_var};

/// State root over the three top-level trees.
pub fn state_root(account_root: Fr, liquidity_root: Fr, nft_root: Fr) -> Fr {
    poseidon_hash_many(&[account_root, liquidity_root, nft_root])
}

pub fn state_root_var(
    account_root: &FpVar<Fr>,
    liquidity_root: &FpVar<Fr>,
    nft_root: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    use ark_r1cs_std::R1CSVar;
    let cs = account_root
        .cs()
        .or(liquidity_root.cs())
        .or(nft_root.cs());
    poseidon_hash_many_var(
        cs,
        &[account_root.clone(), liquidity_root.clone(), nft_root.clone()],
    )
}
