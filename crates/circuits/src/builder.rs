//! Native rollup state and witness builder.
//!
//! [`RollupState`] holds the four trees in memory, applies transactions with
//! the same sequential slot semantics the circuit enforces, and records every
//! pre-image and path along the way. A request or block that fails leaves the
//! state as it was.

use std::collections::HashMap;

use ark_bn254::Fr;
use tracing::{debug, info};

use crate::config::{CircuitConfig, TreeDepths};
use crate::error::{BuildError, WitnessError};
use crate::delta::TxDelta;
use crate::merkle::{check_capacity, SparseMerkleTree};
use crate::model::{empty_asset_leaf, Account, AccountAsset, LiquidityPool, Nft, SignatureBytes};
use crate::signature::{SignatureHint, SignatureOracle, SignatureRequest, SigningDomain};
use crate::tx::{StateView, TxPayload, TxPayloads, TxSlots, TxType};
use crate::witness::{AccountSlot, AssetSlot, Block, SubRoots, Transaction};

/// A transaction as submitted, before any witness is attached.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxRequest {
    pub payload: TxPayload,
    pub nonce: u64,
    pub expired_at: u64,
    pub signature: SignatureBytes,
}

impl TxRequest {
    pub fn new(payload: TxPayload) -> Self {
        Self {
            payload,
            ..Default::default()
        }
    }
}

#[derive(Clone)]
pub struct RollupState {
    config: CircuitConfig,
    domain: SigningDomain,
    accounts: HashMap<u32, Account>,
    account_tree: SparseMerkleTree,
    assets: HashMap<(u32, u16), AccountAsset>,
    asset_trees: HashMap<u32, SparseMerkleTree>,
    pools: HashMap<u16, LiquidityPool>,
    liquidity_tree: SparseMerkleTree,
    nfts: HashMap<u64, Nft>,
    nft_tree: SparseMerkleTree,
}

impl RollupState {
    pub fn new(config: CircuitConfig) -> Result<Self, BuildError> {
        config.validate()?;
        let depths = config.depths;
        Ok(Self {
            domain: SigningDomain::new(&config.domain),
            accounts: HashMap::new(),
            account_tree: SparseMerkleTree::new(
                "account",
                depths.account,
                Account::empty(0, depths.asset).leaf_hash(),
            ),
            assets: HashMap::new(),
            asset_trees: HashMap::new(),
            pools: HashMap::new(),
            liquidity_tree: SparseMerkleTree::new("liquidity", depths.liquidity, LiquidityPool::empty(0).leaf_hash()),
            nfts: HashMap::new(),
            nft_tree: SparseMerkleTree::new("nft", depths.nft, Nft::empty(0).leaf_hash()),
            config,
        })
    }

    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    fn depths(&self) -> TreeDepths {
        self.config.depths
    }

    pub fn sub_roots(&self) -> SubRoots {
        SubRoots {
            account: self.account_tree.root(),
            liquidity: self.liquidity_tree.root(),
            nft: self.nft_tree.root(),
        }
    }

    pub fn state_root(&self) -> Fr {
        self.sub_roots().state_root()
    }

    fn asset_tree(&mut self, account_index: u32) -> &mut SparseMerkleTree {
        let depth = self.config.depths.asset;
        self.asset_trees
            .entry(account_index)
            .or_insert_with(|| SparseMerkleTree::new("asset", depth, empty_asset_leaf()))
    }

    /// Write an account leaf. Its assets root is taken from the asset subtree.
    pub fn set_account(&mut self, mut account: Account) -> Result<(), WitnessError> {
        account.assets_root = self.asset_tree(account.index).root();
        self.account_tree.update(account.index as u64, account.leaf_hash())?;
        self.accounts.insert(account.index, account);
        Ok(())
    }

    pub fn set_asset(&mut self, account_index: u32, asset: AccountAsset) -> Result<(), WitnessError> {
        let assets_root = self.asset_tree(account_index).update(asset.asset_id as u64, asset.leaf_hash())?;
        self.assets.insert((account_index, asset.asset_id), asset);
        let account = Account {
            assets_root,
            ..self.account(account_index)
        };
        self.account_tree.update(account_index as u64, account.leaf_hash())?;
        self.accounts.insert(account_index, account);
        Ok(())
    }

    pub fn set_pool(&mut self, pool: LiquidityPool) -> Result<(), WitnessError> {
        self.liquidity_tree.update(pool.pair_index as u64, pool.leaf_hash())?;
        self.pools.insert(pool.pair_index, pool);
        Ok(())
    }

    pub fn set_nft(&mut self, nft: Nft) -> Result<(), WitnessError> {
        self.nft_tree.update(nft.nft_index, nft.leaf_hash())?;
        self.nfts.insert(nft.nft_index, nft);
        Ok(())
    }

    /// Apply one transaction natively and return its witness.
    ///
    /// Fails on malformed input (bad signature bytes, an index beyond a tree,
    /// an amount that underflows), in which case nothing is written. A
    /// well-formed but invalid transaction is still applied; the circuit is
    /// what rejects it.
    pub fn apply_transaction(
        &mut self,
        oracle: &dyn SignatureOracle,
        request: &TxRequest,
    ) -> Result<Transaction, WitnessError> {
        let native = request.payload.native();
        let tx_type = native.tx_type();
        let slots = native.slots(&*self);
        let delta = native.deltas(&*self)?;
        let roots_before = self.sub_roots();

        let payloads = TxPayloads::from(&request.payload);
        let hint = SignatureHint::evaluate(
            oracle,
            &self.domain,
            &SignatureRequest {
                tx_type,
                payloads: &payloads,
                nonce: request.nonce,
                expired_at: request.expired_at,
                signature: request.signature,
                signer: self.account(slots.accounts[0]).public_key,
                offer_signers: [
                    self.account(slots.accounts[1]).public_key,
                    self.account(slots.accounts[2]).public_key,
                ],
            },
        )?;

        self.check_writes(&slots, &delta)?;

        let mut accounts = Vec::with_capacity(slots.accounts.len());
        for (i, (&index, asset_ids)) in slots.accounts.iter().zip(&slots.assets).enumerate() {
            let path = self.account_tree.proof(index as u64)?.into_siblings();
            let before = self.account(index);

            let mut assets = Vec::with_capacity(asset_ids.len());
            let mut assets_root = before.assets_root;
            for (j, &asset_id) in asset_ids.iter().enumerate() {
                let asset_path = self.asset_tree(index).proof(asset_id as u64)?.into_siblings();
                let asset_before = self.asset(index, asset_id);
                let asset_after = delta.assets[i][j].apply(index, &asset_before)?;
                assets_root = self.asset_tree(index).update(asset_id as u64, asset_after.leaf_hash())?;
                self.assets.insert((index, asset_id), asset_after);
                assets.push(AssetSlot {
                    asset: asset_before,
                    path: asset_path,
                });
            }

            let mut after = Account {
                assets_root,
                ..before.clone()
            };
            if i == 0 {
                if tx_type.is_layer2() {
                    after.nonce += 1;
                }
                if tx_type == TxType::CreateCollection {
                    after.collection_nonce += 1;
                }
                if let Some((name_hash, public_key)) = delta.account_info {
                    after.name_hash = name_hash;
                    after.public_key = public_key;
                }
            }
            self.account_tree.update(index as u64, after.leaf_hash())?;
            self.accounts.insert(index, after);
            accounts.push(AccountSlot {
                account: before,
                path,
                assets,
            });
        }

        let pool = self.pool(slots.pair_index);
        let pool_path = self.liquidity_tree.proof(slots.pair_index as u64)?.into_siblings();
        self.set_pool(delta.liquidity.apply(&pool)?)?;

        let nft = self.nft(slots.nft_index);
        let nft_path = self.nft_tree.proof(slots.nft_index)?.into_siblings();
        if let Some(replacement) = delta.nft {
            self.set_nft(replacement)?;
        }

        let state_root_after = self.state_root();
        debug!(?tx_type, nonce = request.nonce, root = %state_root_after, "transaction applied");
        Ok(Transaction {
            payload: request.payload.clone(),
            nonce: request.nonce,
            expired_at: request.expired_at,
            signature: request.signature,
            hint,
            accounts,
            pool,
            pool_path,
            nft,
            nft_path,
            roots_before,
            state_root_after,
        })
    }

    /// Dry run of every write `apply_transaction` makes for `delta`, in slot
    /// order, so the writes themselves cannot fail halfway.
    fn check_writes(&self, slots: &TxSlots, delta: &TxDelta) -> Result<(), WitnessError> {
        let depths = self.depths();
        let mut written: HashMap<(u32, u16), AccountAsset> = HashMap::new();
        for (i, (&index, asset_ids)) in slots.accounts.iter().zip(&slots.assets).enumerate() {
            check_capacity("account", depths.account, index as u64)?;
            for (j, &asset_id) in asset_ids.iter().enumerate() {
                check_capacity("asset", depths.asset, asset_id as u64)?;
                let before = written
                    .get(&(index, asset_id))
                    .cloned()
                    .unwrap_or_else(|| self.asset(index, asset_id));
                let after = delta.assets[i][j].apply(index, &before)?;
                written.insert((index, asset_id), after);
            }
        }
        check_capacity("liquidity", depths.liquidity, slots.pair_index as u64)?;
        delta.liquidity.apply(&self.pool(slots.pair_index))?;
        check_capacity("nft", depths.nft, slots.nft_index)?;
        Ok(())
    }

    /// Apply `requests` in order and pad with Empty filler up to the
    /// configured block size. On error the state is restored to what it was
    /// before the block.
    pub fn build_block(
        &mut self,
        oracle: &dyn SignatureOracle,
        block_number: u64,
        created_at: u64,
        requests: &[TxRequest],
    ) -> Result<Block, WitnessError> {
        let block_size = self.config.block_size;
        if requests.len() > block_size {
            return Err(BuildError::ArrayLength {
                what: "block transactions",
                expected: block_size,
                actual: requests.len(),
            }
            .into());
        }
        let old_state_root = self.state_root();
        let snapshot = self.clone();
        let filler = TxRequest::default();
        let txs = match requests
            .iter()
            .chain(std::iter::repeat(&filler).take(block_size - requests.len()))
            .map(|request| self.apply_transaction(oracle, request))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(txs) => txs,
            Err(e) => {
                *self = snapshot;
                return Err(e);
            }
        };

        let mut block = Block {
            block_number,
            created_at,
            old_state_root,
            new_state_root: self.state_root(),
            txs,
            commitment: Fr::from(0u64),
        };
        block.commitment = block.compute_commitment();
        info!(
            block_number,
            txs = requests.len(),
            on_chain_ops = block.on_chain_ops(),
            commitment = %block.commitment,
            "block assembled"
        );
        Ok(block)
    }
}

impl StateView for RollupState {
    fn account(&self, index: u32) -> Account {
        self.accounts
            .get(&index)
            .cloned()
            .unwrap_or_else(|| Account::empty(index, self.depths().asset))
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
        self.nfts
            .get(&nft_index)
            .cloned()
            .unwrap_or_else(|| Nft::empty(nft_index))
    }
}
