//! Hint evaluation: everything about a signature the circuit cannot compute.

use ark_bn254::Fr;
use ark_ff::Zero;
use tracing::warn;

use super::eip712::{digest_to_fr, SigningDomain};
use super::oracle::SignatureOracle;
use crate::error::HintError;
use crate::model::{PublicKey, SignatureBytes};
use crate::tx::{padded, tx_hash, TxPayloads, TxType};

/// Number of per-type candidate digests, one per non-empty type.
pub const NUM_CANDIDATES: usize = 18;

/// Oracle answer for one side of an AtomicMatch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OfferHint {
    /// Poseidon hash of the offer the signature was checked for.
    pub hash: Fr,
    pub signer: PublicKey,
    pub valid: bool,
}

/// Untrusted auxiliary values for one transaction.
///
/// For a non-layer-2 transaction only `candidates` is populated and none of
/// it is checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureHint {
    /// Signed digest every type's encoder produces from its payload slot.
    pub candidates: Vec<Fr>,
    /// The digest the signature was verified against.
    pub digest: Fr,
    /// Poseidon transaction hash of the fields that were encoded.
    pub encoded_hash: Fr,
    pub signer: PublicKey,
    pub valid: bool,
    /// Buy then sell.
    pub offers: [OfferHint; 2],
}

impl Default for SignatureHint {
    fn default() -> Self {
        Self {
            candidates: vec![Fr::zero(); NUM_CANDIDATES],
            digest: Fr::zero(),
            encoded_hash: Fr::zero(),
            signer: PublicKey::default(),
            valid: false,
            offers: Default::default(),
        }
    }
}

/// What a hint is evaluated over.
#[derive(Clone, Debug)]
pub struct SignatureRequest<'a> {
    pub tx_type: TxType,
    pub payloads: &'a TxPayloads,
    pub nonce: u64,
    pub expired_at: u64,
    pub signature: SignatureBytes,
    /// Stored key of the sender (account slot 0).
    pub signer: PublicKey,
    /// Stored keys of buyer and seller, used by AtomicMatch only.
    pub offer_signers: [PublicKey; 2],
}

impl SignatureHint {
    pub fn evaluate(
        oracle: &dyn SignatureOracle,
        domain: &SigningDomain,
        request: &SignatureRequest<'_>,
    ) -> Result<Self, HintError> {
        let mut hint = Self::default();
        let mut active = None;
        for (slot, (tx_type, native)) in request.payloads.natives().into_iter().enumerate() {
            let fields = native.hash_fields();
            let digest = domain.tx_digest(tx_type, &fields, request.nonce, request.expired_at)?;
            hint.candidates[slot] = digest_to_fr(&digest);
            if tx_type == request.tx_type {
                active = Some((digest, fields));
            }
        }

        let Some((digest, fields)) = active.filter(|_| request.tx_type.is_layer2()) else {
            return Ok(hint);
        };
        hint.digest = digest_to_fr(&digest);
        hint.encoded_hash = tx_hash(
            request.tx_type,
            request.nonce,
            request.expired_at,
            &padded(fields, Fr::zero()),
        );
        hint.signer = request.signer;
        hint.valid = oracle.verify(&digest, &request.signature, &request.signer)?;
        if !hint.valid {
            warn!(tx_type = ?request.tx_type, nonce = request.nonce, "signature does not match sender key");
        }

        if request.tx_type == TxType::AtomicMatch {
            let matched = &request.payloads.atomic_match;
            let sides = [&matched.buy_offer, &matched.sell_offer];
            for ((offer, signer), out) in sides.into_iter().zip(request.offer_signers).zip(&mut hint.offers) {
                let digest = domain.offer_digest(offer)?;
                let valid = oracle.verify(&digest, &offer.signature, &signer)?;
                if !valid {
                    warn!(offer_id = offer.offer_id, account = offer.account_index, "offer signature invalid");
                }
                *out = OfferHint {
                    hash: offer.hash(),
                    signer,
                    valid,
                };
            }
        }
        Ok(hint)
    }
}
