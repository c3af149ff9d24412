//! Block-level scenarios: native state, witness builder and block circuit.

use ark_bn254::{Bn254, Fr};
use ark_ff::One;
use ark_groth16::Groth16;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use ark_snark::SNARK;
use ark_std::rand::thread_rng;
use k256::ecdsa::SigningKey;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::builder::{RollupState, TxRequest};
use crate::circuit::BlockCircuit;
use crate::config::CircuitConfig;
use crate::error::WitnessError;
use crate::model::{PublicKey, SignatureBytes};
use crate::packed::{pack_amount, pack_fee};
use crate::signature::{public_key_of, sign_digest, EcdsaOracle, SigningDomain};
use crate::tx::{DepositTx, GasFee, NativeTx, RegisterZnsTx, StateView, TransferTx, TxPayload, WithdrawTx};
use crate::witness::Block;

const ALICE: u32 = 1;
const BOB: u32 = 2;
const TREASURY: u32 = 6;
const CREATED_AT: u64 = 100;
const EXPIRED_AT: u64 = 1000;

fn signing_key(seed: u64) -> SigningKey {
    SigningKey::random(&mut StdRng::seed_from_u64(seed))
}

struct Rollup {
    config: CircuitConfig,
    state: RollupState,
    alice: SigningKey,
    bob: SigningKey,
}

impl Rollup {
    /// Alice, Bob and the treasury registered; Alice holds 10000 of asset 0.
    fn new(block_size: usize) -> Self {
        let config = CircuitConfig::testing(block_size);
        let mut rollup = Self {
            state: RollupState::new(config.clone()).unwrap(),
            config,
            alice: signing_key(1),
            bob: signing_key(2),
        };
        let requests = vec![
            register(ALICE, 11, public_key_of(rollup.alice.verifying_key())),
            register(BOB, 22, public_key_of(rollup.bob.verifying_key())),
            register(TREASURY, 66, [6u8; 32]),
            TxRequest::new(TxPayload::Deposit(DepositTx {
                account_index: ALICE,
                account_name_hash: Fr::from(11u64),
                asset_id: 0,
                asset_amount: 10_000,
            })),
        ];
        for chunk in requests.chunks(block_size) {
            rollup.build(chunk);
        }
        rollup
    }

    fn build(&mut self, requests: &[TxRequest]) -> Block {
        self.state
            .build_block(&EcdsaOracle, 1, CREATED_AT, requests)
            .unwrap()
    }

    fn sign(&self, key: &SigningKey, mut request: TxRequest) -> TxRequest {
        let payload = &request.payload;
        let digest = SigningDomain::new(&self.config.domain)
            .tx_digest(
                payload.tx_type(),
                &payload.native().hash_fields(),
                request.nonce,
                request.expired_at,
            )
            .unwrap();
        request.signature = sign_digest(key, &digest).unwrap();
        request
    }

    fn satisfied(&self, block: Block) -> bool {
        let cs = ConstraintSystem::<Fr>::new_ref();
        BlockCircuit::new(self.config.clone(), block)
            .generate_constraints(cs.clone())
            .unwrap();
        cs.is_satisfied().unwrap()
    }
}

fn register(account_index: u32, name: u64, public_key: PublicKey) -> TxRequest {
    TxRequest::new(TxPayload::RegisterZns(RegisterZnsTx {
        account_index,
        account_name: Fr::from(name * 1000),
        account_name_hash: Fr::from(name),
        public_key,
    }))
}

fn gas() -> GasFee {
    GasFee {
        gas_account_index: TREASURY,
        gas_fee_asset_id: 0,
        gas_fee_asset_amount: pack_fee(3).unwrap(),
    }
}

fn transfer(amount: u128, nonce: u64) -> TxRequest {
    TxRequest {
        payload: TxPayload::Transfer(TransferTx {
            from_account_index: ALICE,
            to_account_index: BOB,
            to_account_name_hash: Fr::from(22u64),
            asset_id: 0,
            asset_amount: pack_amount(amount).unwrap(),
            gas: gas(),
            call_data_hash: Fr::from(5u64),
        }),
        nonce,
        expired_at: EXPIRED_AT,
        signature: SignatureBytes::default(),
    }
}

#[test]
fn test_genesis_blocks_satisfied() {
    let config = CircuitConfig::testing(4);
    let mut state = RollupState::new(config.clone()).unwrap();
    let alice = signing_key(1);
    let requests = vec![
        register(ALICE, 11, public_key_of(alice.verifying_key())),
        TxRequest::new(TxPayload::Deposit(DepositTx {
            account_index: ALICE,
            account_name_hash: Fr::from(11u64),
            asset_id: 0,
            asset_amount: 500,
        })),
    ];
    let block = state.build_block(&EcdsaOracle, 1, CREATED_AT, &requests).unwrap();

    assert_eq!(block.on_chain_ops(), 2);
    assert_eq!(state.asset(ALICE, 0).balance, 500);
    assert_eq!(state.account(ALICE).name_hash, Fr::from(11u64));

    let cs = ConstraintSystem::<Fr>::new_ref();
    BlockCircuit::new(config, block).generate_constraints(cs.clone()).unwrap();
    println!("block of 4 transactions: {} constraints", cs.num_constraints());
    assert!(cs.is_satisfied().unwrap());
}

#[test]
fn test_signed_transfer_block_satisfied() {
    let mut rollup = Rollup::new(4);
    let request = rollup.sign(&rollup.alice, transfer(1000, 0));
    let block = rollup.build(&[request]);

    assert_eq!(block.on_chain_ops(), 0);
    assert_eq!(rollup.state.asset(ALICE, 0).balance, 10_000 - 1000 - 3);
    assert_eq!(rollup.state.asset(BOB, 0).balance, 1000);
    assert_eq!(rollup.state.asset(TREASURY, 0).balance, 3);
    assert_eq!(rollup.state.account(ALICE).nonce, 1);
    assert!(rollup.satisfied(block));
}

#[test]
fn test_transfer_then_withdraw_in_one_block() {
    let mut rollup = Rollup::new(2);
    let alice = rollup.alice.clone();
    let first = rollup.sign(&alice, transfer(1000, 0));
    let second = rollup.sign(
        &alice,
        TxRequest {
            payload: TxPayload::Withdraw(WithdrawTx {
                from_account_index: ALICE,
                asset_id: 0,
                asset_amount: 2000,
                to_address: [0x11; 20],
                gas: gas(),
            }),
            nonce: 1,
            expired_at: EXPIRED_AT,
            signature: SignatureBytes::default(),
        },
    );
    let block = rollup.build(&[first, second]);

    assert_eq!(block.on_chain_ops(), 1);
    assert_eq!(rollup.state.asset(ALICE, 0).balance, 10_000 - 1000 - 2000 - 6);
    assert!(rollup.satisfied(block));
}

#[test]
fn test_foreign_signature_unsatisfied() {
    let mut rollup = Rollup::new(1);
    let request = rollup.sign(&rollup.bob, transfer(1000, 0));
    let block = rollup.build(&[request]);
    assert!(!block.txs[0].hint.valid);
    assert!(!rollup.satisfied(block));
}

#[test]
fn test_stale_nonce_unsatisfied() {
    let mut rollup = Rollup::new(1);
    let request = rollup.sign(&rollup.alice, transfer(1000, 7));
    let block = rollup.build(&[request]);
    assert!(!rollup.satisfied(block));
}

#[test]
fn test_expired_transaction_unsatisfied() {
    let mut rollup = Rollup::new(1);
    let mut request = transfer(1000, 0);
    request.expired_at = CREATED_AT - 1;
    let request = rollup.sign(&rollup.alice, request);
    let block = rollup.build(&[request]);
    assert!(!rollup.satisfied(block));
}

#[test]
fn test_overdraft_rejected_by_builder() {
    let mut rollup = Rollup::new(1);
    let request = rollup.sign(&rollup.alice, transfer(20_000, 0));
    let result = rollup.state.build_block(&EcdsaOracle, 2, CREATED_AT, &[request]);
    assert!(matches!(
        result,
        Err(WitnessError::BalanceUnderflow { account: ALICE, asset_id: 0, .. })
    ));
}

#[test]
fn test_wrong_commitment_unsatisfied() {
    let mut rollup = Rollup::new(2);
    let request = rollup.sign(&rollup.alice, transfer(1000, 0));
    let mut block = rollup.build(&[request]);
    block.commitment += Fr::one();
    assert!(!rollup.satisfied(block));
}

#[test]
fn test_inconsistent_new_root_unsatisfied() {
    let mut rollup = Rollup::new(2);
    let request = rollup.sign(&rollup.alice, transfer(1000, 0));
    let mut block = rollup.build(&[request]);
    block.new_state_root = block.old_state_root;
    block.commitment = block.compute_commitment();
    assert!(!rollup.satisfied(block));
}

#[test]
fn test_broken_root_chain_unsatisfied() {
    let mut rollup = Rollup::new(2);
    let alice = rollup.alice.clone();
    let first = rollup.sign(&alice, transfer(1000, 0));
    let second = rollup.sign(&alice, transfer(500, 1));
    let mut block = rollup.build(&[first, second]);
    // tx1 claims to start from the state before tx0
    assert_ne!(block.txs[1].roots_before, block.txs[0].roots_before);
    block.txs[1].roots_before = block.txs[0].roots_before;
    block.commitment = block.compute_commitment();
    assert!(!rollup.satisfied(block));
}

#[test]
fn test_rejected_request_leaves_state_untouched() {
    let mut rollup = Rollup::new(2);
    let root = rollup.state.state_root();
    // the amount fits the balance but the gas fee on the same asset does not
    let request = rollup.sign(&rollup.alice, transfer(9_998, 0));
    let result = rollup.state.apply_transaction(&EcdsaOracle, &request);
    assert!(matches!(
        result,
        Err(WitnessError::BalanceUnderflow { account: ALICE, asset_id: 0, .. })
    ));
    assert_eq!(rollup.state.state_root(), root);
    assert_eq!(rollup.state.asset(ALICE, 0).balance, 10_000);
    assert_eq!(rollup.state.asset(BOB, 0).balance, 0);
    assert_eq!(rollup.state.account(ALICE).nonce, 0);

    let request = rollup.sign(&rollup.alice, transfer(10, 0));
    let block = rollup.build(&[request]);
    assert_eq!(rollup.state.asset(ALICE, 0).balance, 10_000 - 10 - 3);
    assert!(rollup.satisfied(block));
}

#[test]
fn test_rejected_block_leaves_state_untouched() {
    let mut rollup = Rollup::new(2);
    let root = rollup.state.state_root();
    let alice = rollup.alice.clone();
    let first = rollup.sign(&alice, transfer(1000, 0));
    let second = rollup.sign(&alice, transfer(9_000, 1));
    let result = rollup
        .state
        .build_block(&EcdsaOracle, 2, CREATED_AT, &[first.clone(), second]);
    assert!(matches!(result, Err(WitnessError::BalanceUnderflow { .. })));
    assert_eq!(rollup.state.state_root(), root);
    assert_eq!(rollup.state.asset(ALICE, 0).balance, 10_000);
    assert_eq!(rollup.state.account(ALICE).nonce, 0);

    let block = rollup.build(&[first]);
    assert_eq!(block.old_state_root, root);
    assert!(rollup.satisfied(block));
}

#[test]
fn test_register_over_live_account_unsatisfied() {
    let mut rollup = Rollup::new(1);
    let request = rollup.sign(&rollup.alice, transfer(1000, 0));
    rollup.build(&[request]);

    // a cleared name does not make the account free again
    let mut alice = rollup.state.account(ALICE);
    alice.name_hash = Fr::from(0u64);
    rollup.state.set_account(alice).unwrap();
    let block = rollup.build(&[register(ALICE, 77, [7u8; 32])]);
    assert!(!rollup.satisfied(block));
}

#[test]
fn test_reordered_transactions_unsatisfied() {
    let mut rollup = Rollup::new(2);
    let alice = rollup.alice.clone();
    let first = rollup.sign(&alice, transfer(1000, 0));
    let second = rollup.sign(&alice, transfer(500, 1));
    let mut block = rollup.build(&[first, second]);
    block.txs.swap(0, 1);
    block.commitment = block.compute_commitment();
    assert!(!rollup.satisfied(block));
}

#[test]
fn test_padding_only_block_keeps_root() {
    let mut rollup = Rollup::new(3);
    let root = rollup.state.state_root();
    let block = rollup.build(&[]);
    assert_eq!(block.old_state_root, root);
    assert_eq!(block.new_state_root, root);
    assert_eq!(block.on_chain_ops(), 0);
    assert!(rollup.satisfied(block));
}

#[test]
fn test_overfull_block_rejected() {
    let mut rollup = Rollup::new(1);
    let requests = vec![TxRequest::default(), TxRequest::default()];
    let result = rollup.state.build_block(&EcdsaOracle, 2, CREATED_AT, &requests);
    assert!(matches!(
        result,
        Err(WitnessError::Build(crate::error::BuildError::ArrayLength {
            what: "block transactions",
            expected: 1,
            actual: 2,
        }))
    ));
}

#[test]
fn test_placeholder_circuit_matches_real_shape() {
    let config = CircuitConfig::testing(1);
    let setup = ConstraintSystem::<Fr>::new_ref();
    BlockCircuit::empty(config.clone())
        .generate_constraints(setup.clone())
        .unwrap();

    let mut rollup = Rollup::new(1);
    let request = rollup.sign(&rollup.alice, transfer(1000, 0));
    let block = rollup.build(&[request]);
    let real = ConstraintSystem::<Fr>::new_ref();
    BlockCircuit::new(config, block).generate_constraints(real.clone()).unwrap();

    assert_eq!(setup.num_constraints(), real.num_constraints());
    assert_eq!(setup.num_instance_variables(), real.num_instance_variables());
}

/// Full Groth16 round trip over a one-transaction block.
#[test]
#[ignore = "slow: runs a full trusted setup"]
fn test_block_full_proof() {
    let mut rng = thread_rng();
    let config = CircuitConfig::testing(1);
    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(BlockCircuit::empty(config.clone()), &mut rng).unwrap();

    let mut rollup = Rollup::new(1);
    let request = rollup.sign(&rollup.alice, transfer(1000, 0));
    let circuit = BlockCircuit::new(config, rollup.build(&[request]));
    let public_inputs = circuit.public_inputs();

    let proof = Groth16::<Bn254>::prove(&pk, circuit, &mut rng).unwrap();
    assert!(Groth16::<Bn254>::verify(&vk, &public_inputs, &proof).unwrap());
    assert!(!Groth16::<Bn254>::verify(&vk, &[Fr::one()], &proof).unwrap());
}
