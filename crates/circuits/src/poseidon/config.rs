//! Poseidon parameters for the BN254 scalar field.
//!
//! Width 3 (rate 2, capacity 1), x^5 S-box, 8 full and 57 partial rounds.
//! The table is built once per process and shared read-only.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_ff::MontFp;
use lazy_static::lazy_static;

const FULL_ROUNDS: usize = 8;
const PARTIAL_ROUNDS: usize = 57;
const ALPHA: u64 = 5;

/// Seed of the round-constant chain, ASCII "ZKROLLUP".
const ROUND_CONSTANT_SEED: u64 = 0x5a4b_524f_4c4c_5550;

lazy_static! {
    static ref POSEIDON_CONFIG: PoseidonConfig<Fr> = build_config();
}

/// Shared Poseidon configuration.
pub fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    &POSEIDON_CONFIG
}

fn build_config() -> PoseidonConfig<Fr> {
    let mds = vec![
        vec![
            MontFp!("7511745149465107256748700652201246547602992235352608707588321460060273774987"),
            MontFp!("10370080108974718697676803824769673834027675643658433702224577712625900127200"),
            MontFp!("19705173408229649878903981084052839426532978878058043055305024233888854471533"),
        ],
        vec![
            MontFp!("18732019378264290557468133440468564866454307626475683536618613112504878618481"),
            MontFp!("20870176810702568768751421378473869562658540583882454726129544628203806653987"),
            MontFp!("7266061498423634438932006217945904744987532209093972706694887950396501989428"),
        ],
        vec![
            MontFp!("9131299761947733513298312097611845208338517739621853568979632113419485819303"),
            MontFp!("10595341252162738537912664445405114076324478519622938027420701542910180337937"),
            MontFp!("11597556804922396090267472882856054602429588299176362916247939723151043581408"),
        ],
    ];

    PoseidonConfig {
        full_rounds: FULL_ROUNDS,
        partial_rounds: PARTIAL_ROUNDS,
        alpha: ALPHA,
        ark: round_constants(),
        mds,
        rate: 2,
        capacity: 1,
    }
}

/// Deterministic round constants: a squaring chain `s <- s^2 + 7` from the seed.
fn round_constants() -> Vec<Vec<Fr>> {
    let mut state = Fr::from(ROUND_CONSTANT_SEED);
    (0..FULL_ROUNDS + PARTIAL_ROUNDS)
        .map(|_| {
            (0..3)
                .map(|_| {
                    state = state * state + Fr::from(7u64);
                    state
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_shape() {
        let config = poseidon_config();
        assert_eq!(config.full_rounds, FULL_ROUNDS);
        assert_eq!(config.partial_rounds, PARTIAL_ROUNDS);
        assert_eq!(config.rate, 2);
        assert_eq!(config.capacity, 1);
        assert_eq!(config.mds.len(), 3);
        assert_eq!(config.ark.len(), FULL_ROUNDS + PARTIAL_ROUNDS);
        assert!(config.ark.iter().all(|round| round.len() == 3));
    }

    #[test]
    fn test_config_is_shared() {
        assert!(std::ptr::eq(poseidon_config(), poseidon_config()));
    }
}
