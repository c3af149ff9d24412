//! Circuit statistics utility - reports constraint counts and proof timing
//!
//! Usage:
//!   cargo run --release --bin circuit-stats -- --testing                # constraint counts
//!   cargo run --release --bin circuit-stats -- --testing --time         # plus setup/prove timing

use std::path::PathBuf;
use std::time::Instant;

use ark_bn254::Fr;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rollup_circuits::{BlockCircuit, CircuitConfig, EcdsaOracle, RollupState};
use rollup_prover::{load_config, prove_block, setup_with_seed, verify_proof};

#[derive(Parser, Debug)]
#[command(author, version, about = "Constraint counts of the rollup block circuit")]
struct Args {
    /// JSON circuit config (depths and signing domain)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the shallow tree depths of the test suite
    #[arg(long)]
    testing: bool,

    /// Block sizes to measure
    #[arg(long, value_delimiter = ',', default_values_t = vec![1usize, 2, 4])]
    block_sizes: Vec<usize>,

    /// Also run setup, prove and verify for a padding block of each size
    #[arg(long)]
    time: bool,
}

fn count_constraints(config: &CircuitConfig) -> Result<(usize, usize), Box<dyn std::error::Error>> {
    let cs = ConstraintSystem::<Fr>::new_ref();
    // placeholder values leave the system unsatisfied; the shape is what counts
    BlockCircuit::empty(config.clone()).generate_constraints(cs.clone())?;
    Ok((cs.num_constraints(), cs.num_witness_variables()))
}

fn time_block(config: &CircuitConfig) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    let keys = setup_with_seed(config, 42)?;
    let setup_ms = start.elapsed().as_millis();

    let block = RollupState::new(config.clone())?.build_block(&EcdsaOracle, 1, 0, &[])?;
    let start = Instant::now();
    let proof = prove_block(&keys.keys.proving_key, config, &block)?;
    let prove_ms = start.elapsed().as_millis();

    let start = Instant::now();
    let valid = verify_proof(&keys.keys.verifying_key, &proof)?;
    let verify_ms = start.elapsed().as_millis();

    println!(
        "  setup {:>8}ms   prove {:>8}ms   verify {:>5}ms   valid: {}",
        setup_ms, prove_ms, verify_ms, valid
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let base = match (&args.config, args.testing) {
        (Some(path), _) => load_config(path)?,
        (None, true) => CircuitConfig::testing(1),
        (None, false) => CircuitConfig::default(),
    };
    let depths = base.depths;

    println!(
        "Tree depths: account {} / asset {} / liquidity {} / nft {}\n",
        depths.account, depths.asset, depths.liquidity, depths.nft
    );
    println!("Block size   Constraints   Witnesses   Per tx");
    println!("──────────────────────────────────────────────────");

    for &block_size in &args.block_sizes {
        let config = CircuitConfig {
            block_size,
            ..base.clone()
        };
        config.validate()?;
        let (constraints, witnesses) = count_constraints(&config)?;
        println!(
            "{:>10}   {:>11}   {:>9}   {:>6}",
            block_size,
            constraints,
            witnesses,
            constraints / block_size
        );
        if args.time {
            time_block(&config)?;
        }
    }

    if !args.time {
        println!("\n(Run with --time to include setup and proof timing)");
    }
    Ok(())
}
