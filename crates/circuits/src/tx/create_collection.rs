//! Creation of an NFT collection under the sender's next collection id.
//!
//! The collection nonce increment itself is applied by the transaction
//! verifier on account slot 0.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{GasFee, GasFeeVar, NativeTx, StateView, TxContextVar, TxGadget, TxSlots, TxType};
use crate::comparators::assert_equal_if_active;
use crate::config::{ACCOUNT_INDEX_BITS, COLLECTION_ID_BITS};
use crate::delta::{TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::witness;
use crate::pubdata::PubdataField::{self, Bits};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateCollectionTx {
    pub account_index: u32,
    pub collection_id: u16,
    pub gas: GasFee,
}

impl NativeTx for CreateCollectionTx {
    fn tx_type(&self) -> TxType {
        TxType::CreateCollection
    }

    fn slots(&self, _state: &dyn StateView) -> TxSlots {
        let mut slots = TxSlots::default();
        slots.accounts[0] = self.account_index;
        self.gas.assign_slots(&mut slots);
        slots
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        let mut fields = vec![
            Bits(Fr::from(self.account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.collection_id), COLLECTION_ID_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields
    }

    fn hash_fields(&self) -> Vec<Fr> {
        let mut fields = vec![Fr::from(self.account_index), Fr::from(self.collection_id)];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, _state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        let mut delta = TxDelta::default();
        self.gas.apply(&mut delta)?;
        Ok(delta)
    }
}

#[derive(Clone, Debug)]
pub struct CreateCollectionTxVar {
    pub account_index: FpVar<Fr>,
    pub collection_id: FpVar<Fr>,
    pub gas: GasFeeVar,
}

impl CreateCollectionTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &CreateCollectionTx,
        active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        Ok(Self {
            account_index: witness(cs, Fr::from(tx.account_index))?,
            collection_id: witness(cs, Fr::from(tx.collection_id))?,
            gas: GasFeeVar::new_witness(cs, &tx.gas, active)?,
        })
    }
}

impl TxGadget for CreateCollectionTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        let account = &ctx.accounts[0];
        assert_equal_if_active(active, &self.account_index, &account.index)?;
        assert_equal_if_active(active, &self.collection_id, &account.collection_nonce)?;
        self.gas.validate(active, ctx)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        let mut fields = vec![
            Bits(self.account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.collection_id.clone(), COLLECTION_ID_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        let mut fields = vec![self.account_index.clone(), self.collection_id.clone()];
        fields.extend(self.gas.hash_fields());
        fields
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        self.gas.apply(&mut delta);
        Ok(delta)
    }
}
