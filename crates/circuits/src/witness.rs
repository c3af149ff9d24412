//! Fixed-shape witness records consumed by the verifiers.
//!
//! A [`Transaction`] carries every pre-image it touches in slot order, each
//! with the Merkle path valid at the moment that slot is processed. A
//! [`Block`] is a fixed number of transactions plus its header.

use ark_bn254::Fr;
use ark_ff::Zero;
use rayon::prelude::*;

use crate::config::{CircuitConfig, TreeDepths, NUM_ACCOUNTS_PER_TX, NUM_ASSETS_PER_ACCOUNT, PUBDATA_ELEMENTS};
use crate::error::BuildError;
use crate::model::{state_root, Account, AccountAsset, LiquidityPool, Nft, SignatureBytes};
use crate::poseidon::poseidon_hash_many;
use crate::signature::{SignatureHint, NUM_CANDIDATES};
use crate::tx::{TxPayload, TxType};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetSlot {
    pub asset: AccountAsset,
    /// Path in the owning account's asset subtree.
    pub path: Vec<Fr>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountSlot {
    pub account: Account,
    pub path: Vec<Fr>,
    pub assets: Vec<AssetSlot>,
}

/// Roots of the three top-level trees.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubRoots {
    pub account: Fr,
    pub liquidity: Fr,
    pub nft: Fr,
}

impl SubRoots {
    pub fn state_root(&self) -> Fr {
        state_root(self.account, self.liquidity, self.nft)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub payload: TxPayload,
    pub nonce: u64,
    pub expired_at: u64,
    pub signature: SignatureBytes,
    pub hint: SignatureHint,
    pub accounts: Vec<AccountSlot>,
    pub pool: LiquidityPool,
    pub pool_path: Vec<Fr>,
    pub nft: Nft,
    pub nft_path: Vec<Fr>,
    pub roots_before: SubRoots,
    pub state_root_after: Fr,
}

impl Transaction {
    pub fn tx_type(&self) -> TxType {
        self.payload.tx_type()
    }

    pub fn state_root_before(&self) -> Fr {
        self.roots_before.state_root()
    }

    /// Zero-valued filler of the right shape. Only useful for key generation,
    /// where values are never read.
    pub fn placeholder(depths: &TreeDepths) -> Self {
        let asset = AssetSlot {
            asset: AccountAsset::default(),
            path: vec![Fr::zero(); depths.asset],
        };
        let account = AccountSlot {
            account: Account::empty(0, depths.asset),
            path: vec![Fr::zero(); depths.account],
            assets: vec![asset; NUM_ASSETS_PER_ACCOUNT],
        };
        let roots = SubRoots {
            account: Fr::zero(),
            liquidity: Fr::zero(),
            nft: Fr::zero(),
        };
        Self {
            payload: TxPayload::Empty,
            nonce: 0,
            expired_at: 0,
            signature: SignatureBytes::default(),
            hint: SignatureHint::default(),
            accounts: vec![account; NUM_ACCOUNTS_PER_TX],
            pool: LiquidityPool::empty(0),
            pool_path: vec![Fr::zero(); depths.liquidity],
            nft: Nft::empty(0),
            nft_path: vec![Fr::zero(); depths.nft],
            state_root_after: roots.state_root(),
            roots_before: roots,
        }
    }

    /// Pubdata of the active type; all zero for Empty.
    pub fn pubdata(&self) -> Vec<Fr> {
        self.payload.pubdata()
    }

    pub fn validate(&self, depths: &TreeDepths) -> Result<(), BuildError> {
        BuildError::check_len("account slots", NUM_ACCOUNTS_PER_TX, self.accounts.len())?;
        for slot in &self.accounts {
            BuildError::check_len("account path", depths.account, slot.path.len())?;
            BuildError::check_len("asset slots", NUM_ASSETS_PER_ACCOUNT, slot.assets.len())?;
            for asset in &slot.assets {
                BuildError::check_len("asset path", depths.asset, asset.path.len())?;
            }
        }
        BuildError::check_len("liquidity path", depths.liquidity, self.pool_path.len())?;
        BuildError::check_len("nft path", depths.nft, self.nft_path.len())?;
        BuildError::check_len("candidate digests", NUM_CANDIDATES, self.hint.candidates.len())?;
        BuildError::check_len("pubdata", PUBDATA_ELEMENTS, self.pubdata().len())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub block_number: u64,
    pub created_at: u64,
    pub old_state_root: Fr,
    pub new_state_root: Fr,
    pub txs: Vec<Transaction>,
    pub commitment: Fr,
}

impl Block {
    /// A block of Empty placeholders, for key generation.
    pub fn placeholder(config: &CircuitConfig) -> Self {
        let filler = Transaction::placeholder(&config.depths);
        let root = filler.state_root_before();
        let txs = vec![filler; config.block_size];
        let mut block = Self {
            block_number: 0,
            created_at: 0,
            old_state_root: root,
            new_state_root: root,
            txs,
            commitment: Fr::zero(),
        };
        block.commitment = block.compute_commitment();
        block
    }

    pub fn on_chain_ops(&self) -> u64 {
        self.txs.iter().filter(|tx| tx.tx_type().is_on_chain_op()).count() as u64
    }

    /// `Poseidon([blockNumber, createdAt, oldRoot, newRoot, pubdata..., onChainOps])`.
    pub fn compute_commitment(&self) -> Fr {
        let mut input = vec![
            Fr::from(self.block_number),
            Fr::from(self.created_at),
            self.old_state_root,
            self.new_state_root,
        ];
        let pubdata: Vec<Vec<Fr>> = self.txs.par_iter().map(Transaction::pubdata).collect();
        input.extend(pubdata.into_iter().flatten());
        input.push(Fr::from(self.on_chain_ops()));
        poseidon_hash_many(&input)
    }

    pub fn validate(&self, config: &CircuitConfig) -> Result<(), BuildError> {
        config.validate()?;
        BuildError::check_len("block transactions", config.block_size, self.txs.len())?;
        self.txs.iter().try_for_each(|tx| tx.validate(&config.depths))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_block_is_well_formed() {
        let config = CircuitConfig::testing(3);
        let block = Block::placeholder(&config);
        assert!(block.validate(&config).is_ok());
        assert_eq!(block.on_chain_ops(), 0);
        assert_eq!(block.commitment, block.compute_commitment());
    }

    #[test]
    fn test_short_path_rejected() {
        let config = CircuitConfig::testing(1);
        let mut block = Block::placeholder(&config);
        block.txs[0].accounts[2].assets[1].path.pop();
        assert_eq!(
            block.validate(&config),
            Err(BuildError::ArrayLength {
                what: "asset path",
                expected: 3,
                actual: 2,
            })
        );
    }

    #[test]
    fn test_block_size_mismatch_rejected() {
        let block = Block::placeholder(&CircuitConfig::testing(2));
        assert!(matches!(
            block.validate(&CircuitConfig::testing(3)),
            Err(BuildError::ArrayLength { what: "block transactions", .. })
        ));
    }

    #[test]
    fn test_commitment_depends_on_header() {
        let config = CircuitConfig::testing(1);
        let block = Block::placeholder(&config);
        let later = Block {
            block_number: 1,
            ..block.clone()
        };
        assert_ne!(block.compute_commitment(), later.compute_commitment());
    }
}
