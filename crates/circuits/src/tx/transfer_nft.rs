//! Layer-2 transfer of NFT ownership.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::{GasFee, GasFeeVar, NativeTx, StateView, TxContextVar, TxGadget, TxSlots, TxType};
use crate::comparators::assert_equal_if_active;
use crate::config::{ACCOUNT_INDEX_BITS, NFT_INDEX_BITS};
use crate::delta::{TxDelta, TxDeltaVar};
use crate::error::WitnessError;
use crate::field::witness;
use crate::pubdata::PubdataField::{self, Bits, Element};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferNftTx {
    pub from_account_index: u32,
    pub to_account_index: u32,
    pub to_account_name_hash: Fr,
    pub nft_index: u64,
    pub gas: GasFee,
    pub call_data_hash: Fr,
}

impl NativeTx for TransferNftTx {
    fn tx_type(&self) -> TxType {
        TxType::TransferNft
    }

    fn slots(&self, _state: &dyn StateView) -> TxSlots {
        let mut slots = TxSlots {
            nft_index: self.nft_index,
            ..Default::default()
        };
        slots.accounts[0] = self.from_account_index;
        slots.accounts[1] = self.to_account_index;
        self.gas.assign_slots(&mut slots);
        slots
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<Fr>> {
        let mut fields = vec![
            Bits(Fr::from(self.from_account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.to_account_index), ACCOUNT_INDEX_BITS),
            Bits(Fr::from(self.nft_index), NFT_INDEX_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields.push(Element(self.call_data_hash));
        fields
    }

    fn hash_fields(&self) -> Vec<Fr> {
        let mut fields = vec![
            Fr::from(self.from_account_index),
            Fr::from(self.to_account_index),
            self.to_account_name_hash,
            Fr::from(self.nft_index),
        ];
        fields.extend(self.gas.hash_fields());
        fields.push(self.call_data_hash);
        fields
    }

    fn deltas(&self, state: &dyn StateView) -> Result<TxDelta, WitnessError> {
        let mut nft = state.nft(self.nft_index);
        nft.owner_account_index = self.to_account_index;
        let mut delta = TxDelta {
            nft: Some(nft),
            ..Default::default()
        };
        self.gas.apply(&mut delta)?;
        Ok(delta)
    }
}

#[derive(Clone, Debug)]
pub struct TransferNftTxVar {
    pub from_account_index: FpVar<Fr>,
    pub to_account_index: FpVar<Fr>,
    pub to_account_name_hash: FpVar<Fr>,
    pub nft_index: FpVar<Fr>,
    pub gas: GasFeeVar,
    pub call_data_hash: FpVar<Fr>,
}

impl TransferNftTxVar {
    pub fn new_witness(
        cs: &ConstraintSystemRef<Fr>,
        tx: &TransferNftTx,
        active: &Boolean<Fr>,
    ) -> Result<Self, SynthesisError> {
        Ok(Self {
            from_account_index: witness(cs, Fr::from(tx.from_account_index))?,
            to_account_index: witness(cs, Fr::from(tx.to_account_index))?,
            to_account_name_hash: witness(cs, tx.to_account_name_hash)?,
            nft_index: witness(cs, Fr::from(tx.nft_index))?,
            gas: GasFeeVar::new_witness(cs, &tx.gas, active)?,
            call_data_hash: witness(cs, tx.call_data_hash)?,
        })
    }
}

impl TxGadget for TransferNftTxVar {
    fn validate(&self, active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<(), SynthesisError> {
        assert_equal_if_active(active, &self.from_account_index, &ctx.accounts[0].index)?;
        assert_equal_if_active(active, &self.to_account_index, &ctx.accounts[1].index)?;
        assert_equal_if_active(active, &self.to_account_name_hash, &ctx.accounts[1].name_hash)?;
        assert_equal_if_active(active, &self.nft_index, &ctx.nft.nft_index)?;
        assert_equal_if_active(active, &self.from_account_index, &ctx.nft.owner_account_index)?;
        self.gas.validate(active, ctx)
    }

    fn pubdata_fields(&self) -> Vec<PubdataField<FpVar<Fr>>> {
        let mut fields = vec![
            Bits(self.from_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.to_account_index.clone(), ACCOUNT_INDEX_BITS),
            Bits(self.nft_index.clone(), NFT_INDEX_BITS),
        ];
        fields.extend(self.gas.pubdata_fields());
        fields.push(Element(self.call_data_hash.clone()));
        fields
    }

    fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        let mut fields = vec![
            self.from_account_index.clone(),
            self.to_account_index.clone(),
            self.to_account_name_hash.clone(),
            self.nft_index.clone(),
        ];
        fields.extend(self.gas.hash_fields());
        fields.push(self.call_data_hash.clone());
        fields
    }

    fn deltas(&self, _active: &Boolean<Fr>, ctx: &TxContextVar) -> Result<TxDeltaVar, SynthesisError> {
        let mut delta = ctx.identity_delta();
        delta.nft.owner_account_index = self.to_account_index.clone();
        self.gas.apply(&mut delta);
        Ok(delta)
    }
}
