//! Registration of a name and public key on an unused account.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{NativeTx, StateView, TxContextVar, TxGadget, TxSlots, TxType};
use crate::comparators::{assert_equal_if_active, enforce_range_if_active};
use crate::config::ACCOUNT_INDEX_BITS;
use crate::delta::{TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::{bytes32_to_halves, witness};
use crate::model::{AccountVar, PublicKey};
use crate::pubdata::PubdataField::{self, Bits, Element};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterZnsTx {
    pub account_index: u32,
    /// Name bytes packed big-endian into one element.
    pub account_name: Fr,
    pub account_name_hash: Fr,
    pub public_key: PublicKey,
}

impl NativeTx for RegisterZnsTx {
    fn tx_type(&self) -> TxType {
        TxType::RegisterZns
    }

    fn slots(&self, _state: &dyn StateView) -> TxSlots {
        let mut slots = TxSlots::default();
        slots.accounts[0] = self.account_index;
        slots
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        let (pk_hi, pk_lo) = bytes32_to_halves(&self.public_key);
        vec![
            Bits(Fr::from(self.account_index), ACCOUNT_INDEX_BITS),
            Element(self.account_name),
            Element(self.account_name_hash),
            Element(pk_hi),
            Element(pk_lo),
        ]
    }

    fn hash_fields(&self) -> Vec<Fr> {
        let (pk_hi, pk_lo) = bytes32_to_halves(&self.public_key);
        vec![
            Fr::from(self.account_index),
            self.account_name,
            self.account_name_hash,
            pk_hi,
            pk_lo,
        ]
    }

    fn deltas(&self, _state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        Ok(TxDelta {
            account_info: Some((self.account_name_hash, self.public_key)),
            ..Default::default()
        })
    }
}

#[derive(Clone, Debug)]
pub struct RegisterZnsTxVar {
    pub account_index: FpVar<Fr>,
    pub account_name: FpVar<Fr>,
    pub account_name_hash: FpVar<Fr>,
    pub public_key: Vec<FpVar<Fr>>,
}

impl RegisterZnsTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &RegisterZnsTx,
        _active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        Ok(Self {
            account_index: witness(cs, Fr::from(tx.account_index))?,
            account_name: witness(cs, tx.account_name)?,
            account_name_hash: witness(cs, tx.account_name_hash)?,
            public_key: tx
                .public_key
                .iter()
                .map(|b| witness(cs, Fr::from(*b)))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl TxGadget for RegisterZnsTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        let account = &ctx.accounts[0];
        assert_equal_if_active(active, &self.account_index, &account.index)?;
        // only a never-used account can take a name
        let zero = FpVar::zero();
        assert_equal_if_active(active, &account.name_hash, &zero)?;
        assert_equal_if_active(active, &account.nonce, &zero)?;
        assert_equal_if_active(active, &account.collection_nonce, &zero)?;
        for byte in &account.public_key {
            assert_equal_if_active(active, byte, &zero)?;
        }
        assert_equal_if_active(
            active,
            &account.assets_root,
            &FpVar::constant(ctx.empty_assets_root),
        )?;
        for byte in &self.public_key {
            enforce_range_if_active(active, byte, 8)?;
        }
        Ok(())
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        let (pk_hi, pk_lo) = AccountVar::public_key_halves(&self.public_key);
        vec![
            Bits(self.account_index.clone(), ACCOUNT_INDEX_BITS),
            Element(self.account_name.clone()),
            Element(self.account_name_hash.clone()),
            Element(pk_hi),
            Element(pk_lo),
        ]
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        let (pk_hi, pk_lo) = AccountVar::public_key_halves(&self.public_key);
        vec![
            self.account_index.clone(),
            self.account_name.clone(),
            self.account_name_hash.clone(),
            pk_hi,
            pk_lo,
        ]
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        delta.name_hash = self.account_name_hash.clone();
        delta.public_key = self.public_key.clone();
        Ok(delta)
    }
}
