use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::config::{OFFER_SLOT_BITS, SIGNATURE_BYTES};
use crate::field::witness;
use crate::poseidon::{poseidon_hash_many, poseidon_hash_many_var};

/// Recoverable ECDSA signature `r || s || v`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SignatureBytes(pub [u8; SIGNATURE_BYTES]);

impl Default for SignatureBytes {
    fn default() -> Self {
        Self([0u8; SIGNATURE_BYTES])
    }
}

impl std::fmt::Debug for SignatureBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum OfferType {
    #[default]
    Buy = 0,
    Sell = 1,
}

/// A signed buy or sell order for one NFT.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Offer {
    pub offer_type: OfferType,
    /// High bits: asset id of the bitmap leaf. Low 7 bits: slot in that bitmap.
    pub offer_id: u32,
    pub account_index: u32,
    pub nft_index: u64,
    pub asset_id: u16,
    /// Packed amount.
    pub asset_amount: u64,
    pub listed_at: u64,
    pub expired_at: u64,
    pub treasury_rate: u16,
    pub signature: SignatureBytes,
}

impl Offer {
    pub fn offer_id(bitmap_asset_id: u16, slot: u32) -> u32 {
        ((bitmap_asset_id as u32) << OFFER_SLOT_BITS) | slot
    }

    pub fn slot(&self) -> u32 {
        self.offer_id & ((1 << OFFER_SLOT_BITS) - 1)
    }

    pub fn bitmap_asset_id(&self) -> u16 {
        (self.offer_id >> OFFER_SLOT_BITS) as u16
    }

    pub fn hash_fields(&self) -> Vec<Fr> {
        vec![
            Fr::from(self.offer_type as u8),
            Fr::from(self.offer_id),
            Fr::from(self.account_index),
            Fr::from(self.nft_index),
            Fr::from(self.asset_id),
            Fr::from(self.asset_amount),
            Fr::from(self.listed_at),
            Fr::from(self.expired_at),
            Fr::from(self.treasury_rate),
        ]
    }

    pub fn hash(&self) -> Fr {
        poseidon_hash_many(&self.hash_fields())
    }
}

#[derive(Clone, Debug)]
pub struct OfferVar {
    pub offer_type: FpVar<Fr>,
    pub offer_id: FpVar<Fr>,
    pub account_index: FpVar<Fr>,
    pub nft_index: FpVar<Fr>,
    pub asset_id: FpVar<Fr>,
    pub asset_amount: FpVar<Fr>,
    pub listed_at: FpVar<Fr>,
    pub expired_at: FpVar<Fr>,
    pub treasury_rate: FpVar<Fr>,
}

impl OfferVar {
    pub fn new_witness(cs: &ConstraintSystemRef<Fr>, offer: &Offer) -> Result<Self, SynthesisError> {
        Ok(Self {
            offer_type: witness(cs, Fr::from(offer.offer_type as u8))?,
            offer_id: witness(cs, Fr::from(offer.offer_id))?,
            account_index: witness(cs, Fr::from(offer.account_index))?,
            nft_index: witness(cs, Fr::from(offer.nft_index))?,
            asset_id: witness(cs, Fr::from(offer.asset_id))?,
            asset_amount: witness(cs, Fr::from(offer.asset_amount))?,
            listed_at: witness(cs, Fr::from(offer.listed_at))?,
            expired_at: witness(cs, Fr::from(offer.expired_at))?,
            treasury_rate: witness(cs, Fr::from(offer.treasury_rate))?,
        })
    }

    pub fn hash_fields(&self) -> Vec<FpVar<Fr>> {
        vec![
            self.offer_type.clone(),
            self.offer_id.clone(),
            self.account_index.clone(),
            self.nft_index.clone(),
            self.asset_id.clone(),
            self.asset_amount.clone(),
            self.listed_at.clone(),
            self.expired_at.clone(),
            self.treasury_rate.clone(),
        ]
    }

    pub fn hash(&self, cs: ConstraintSystemRef<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
        poseidon_hash_many_var(cs, &self.hash_fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_id_layout() {
        let offer = Offer {
            offer_id: Offer::offer_id(9, 5),
            ..Default::default()
        };
        assert_eq!(offer.offer_id, 9 * 128 + 5);
        assert_eq!(offer.slot(), 5);
        assert_eq!(offer.bitmap_asset_id(), 9);
    }

    #[test]
    fn test_signature_debug_is_hex() {
        let sig = SignatureBytes([0xab; SIGNATURE_BYTES]);
        assert!(format!("{:?}", sig).starts_with("0xabab"));
    }
}
