use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::hint::{OfferHint, SignatureHint, NUM_CANDIDATES};
use crate::comparators::{assert_equal_if_active, assert_true_if_active};
use crate::field::{bytes32_to_halves, witness};
use crate::model::{AccountVar, PublicKey};
use crate::tx::{TxContextVar, TxType, TxTypeFlags};

const OFFER_ACCOUNT_SLOTS: [usize; 2] = [1, 2];

fn key_halves(cs: &ConstraintSystemRef<Fr>, key: &PublicKey) -> Result<(FpVar<Fr>, FpVar<Fr>), SynthesisError> {
    let (hi, lo) = bytes32_to_halves(key);
    Ok((witness(cs, hi)?, witness(cs, lo)?))
}

fn assert_key_if_active(
    active: &Boolean<Fr>,
    claimed: &(FpVar<Fr>, FpVar<Fr>),
    account: &AccountVar,
) -> Result<(), SynthesisError> {
    let (hi, lo) = AccountVar::public_key_halves(&account.public_key);
    assert_equal_if_active(active, &claimed.0, &hi)?;
    assert_equal_if_active(active, &claimed.1, &lo)
}

#[derive(Clone, Debug)]
pub struct OfferHintVar {
    pub hash: FpVar<Fr>,
    pub signer: (FpVar<Fr>, FpVar<Fr>),
    pub valid: Boolean<Fr>,
}

impl OfferHintVar {
    fn new_witness(cs: &ConstraintSystemRef<Fr>, hint: &OfferHint) -> Result<Self, SynthesisError> {
        Ok(Self {
            hash: witness(cs, hint.hash)?,
            signer: key_halves(cs, &hint.signer)?,
            valid: Boolean::new_witness(cs.clone(), || Ok(hint.valid))?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct SignatureHintVar {
    pub candidates: Vec<FpVar<Fr>>,
    pub digest: FpVar<Fr>,
    pub encoded_hash: FpVar<Fr>,
    pub signer: (FpVar<Fr>, FpVar<Fr>),
    pub valid: Boolean<Fr>,
    pub offers: Vec<OfferHintVar>,
}

impl SignatureHintVar {
    pub fn new_witness(cs: &ConstraintSystemRef<Fr>, hint: &SignatureHint) -> Result<Self, SynthesisError> {
        let candidates = (0..NUM_CANDIDATES)
            .map(|i| {
                let value = hint.candidates.get(i).copied().ok_or(SynthesisError::AssignmentMissing)?;
                witness(cs, value)
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            candidates,
            digest: witness(cs, hint.digest)?,
            encoded_hash: witness(cs, hint.encoded_hash)?,
            signer: key_halves(cs, &hint.signer)?,
            valid: Boolean::new_witness(cs.clone(), || Ok(hint.valid))?,
            offers: hint
                .offers
                .iter()
                .map(|offer| OfferHintVar::new_witness(cs, offer))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Tie the hint to the transaction being proved.
    ///
    /// For a layer-2 transaction: the flag-selected candidate is the verified
    /// digest, the encoded fields hash to `tx_hash`, the signer is the stored
    /// key of account slot 0, and the oracle said yes. For AtomicMatch the
    /// same holds for both offers against account slots 1 and 2.
    pub fn bind(
        &self,
        flags: &TxTypeFlags,
        tx_hash: &FpVar<Fr>,
        ctx: &TxContextVar,
        offer_hashes: [&FpVar<Fr>; 2],
    ) -> Result<(), SynthesisError> {
        let layer2 = flags.is_layer2()?;
        let selected = TxType::ALL[1..]
            .iter()
            .zip(&self.candidates)
            .fold(FpVar::zero(), |acc, (t, candidate)| {
                acc + FpVar::from(flags.flag(*t).clone()) * candidate
            });
        assert_equal_if_active(&layer2, &selected, &self.digest)?;
        assert_equal_if_active(&layer2, &self.encoded_hash, tx_hash)?;
        assert_key_if_active(&layer2, &self.signer, &ctx.accounts[0])?;
        assert_true_if_active(&layer2, &self.valid)?;

        let matched = flags.flag(TxType::AtomicMatch);
        for ((offer, hash), slot) in self.offers.iter().zip(offer_hashes).zip(OFFER_ACCOUNT_SLOTS) {
            assert_equal_if_active(matched, &offer.hash, hash)?;
            assert_key_if_active(matched, &offer.signer, &ctx.accounts[slot])?;
            assert_true_if_active(matched, &offer.valid)?;
        }
        Ok(())
    }
}
