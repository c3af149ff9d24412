//! Offer bitmap: one bit per offer slot of an asset leaf, set once the offer
//! is cancelled or filled.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

use crate::comparators::{enforce_bit_length, gate};
use crate::config::{OFFER_ID_BITS, OFFER_SLOTS, OFFER_SLOT_BITS};

/// An offer id split into its bitmap asset id and slot.
#[derive(Clone, Debug)]
pub struct OfferSlotVar {
    pub bitmap_asset_id: FpVar<Fr>,
    pub slot: FpVar<Fr>,
}

impl OfferSlotVar {
    /// Decompose the gated offer id. Zero in both parts when inactive.
    pub fn new(active: &Boolean<Fr>, offer_id: &FpVar<Fr>) -> Result<Self, SynthesisError> {
        let bits = enforce_bit_length(&gate(active, offer_id)?, OFFER_ID_BITS)?;
        Ok(Self {
            slot: Boolean::le_bits_to_fp_var(&bits[..OFFER_SLOT_BITS])?,
            bitmap_asset_id: Boolean::le_bits_to_fp_var(&bits[OFFER_SLOT_BITS..])?,
        })
    }
}

/// Assert, when `active`, that the slot's bit of `bitmap` is unset and return
/// the bitmap with it set.
///
/// Scans all 128 positions so the circuit shape does not depend on the slot.
pub fn mark_offer_slot(
    active: &Boolean<Fr>,
    offer: &OfferSlotVar,
    bitmap: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    let current = enforce_bit_length(&gate(active, bitmap)?, OFFER_SLOTS)?;
    let mut updated = Vec::with_capacity(OFFER_SLOTS);
    for (position, bit) in current.iter().enumerate() {
        let hit = offer
            .slot
            .is_eq(&FpVar::constant(Fr::from(position as u64)))?
            .and(active)?;
        hit.and(bit)?.enforce_equal(&Boolean::FALSE)?;
        updated.push(bit.or(&hit)?);
    }
    Boolean::le_bits_to_fp_var(&updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::witness;
    use crate::model::Offer;
    use ark_relations::r1cs::ConstraintSystem;

    fn run(active: bool, offer_id: u32, bitmap: u128) -> (bool, Fr, Fr) {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let flag = Boolean::new_witness(cs.clone(), || Ok(active)).unwrap();
        let id = witness(&cs, Fr::from(offer_id)).unwrap();
        let before = witness(&cs, Fr::from(bitmap)).unwrap();
        let offer = OfferSlotVar::new(&flag, &id).unwrap();
        let after = mark_offer_slot(&flag, &offer, &before).unwrap();
        (
            cs.is_satisfied().unwrap(),
            after.value().unwrap(),
            offer.bitmap_asset_id.value().unwrap(),
        )
    }

    #[test]
    fn test_sets_free_slot() {
        let (ok, after, asset) = run(true, Offer::offer_id(9, 5), 0b1);
        assert!(ok);
        assert_eq!(after, Fr::from(0b10_0001u64));
        assert_eq!(asset, Fr::from(9u64));
    }

    #[test]
    fn test_highest_slot() {
        let (ok, after, _) = run(true, Offer::offer_id(1, 127), 0);
        assert!(ok);
        assert_eq!(after, Fr::from(1u128 << 127));
    }

    #[test]
    fn test_used_slot_unsatisfied() {
        let (ok, _, _) = run(true, Offer::offer_id(9, 5), 1 << 5);
        assert!(!ok);
    }

    #[test]
    fn test_second_mark_of_same_slot_unsatisfied() {
        let (ok, once, _) = run(true, Offer::offer_id(2, 40), 0);
        assert!(ok);
        let once = crate::field::fr_to_u128(&once).unwrap();
        let (ok, _, _) = run(true, Offer::offer_id(2, 40), once);
        assert!(!ok);
    }

    #[test]
    fn test_inactive_used_slot_is_vacuous() {
        let (ok, _, _) = run(false, Offer::offer_id(9, 5), 1 << 5);
        assert!(ok);
    }
}
