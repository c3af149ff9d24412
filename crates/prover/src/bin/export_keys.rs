//! Export the block circuit verifying key.
//!
//! Loads keys from the keys directory, or runs setup and saves them there
//! first, then prints the verifying key and writes it as JSON for scripting.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rollup_circuits::CircuitConfig;
use rollup_prover::{load_config, setup_with_seed, BlockKeys};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate or load block circuit keys and export the verifying key")]
struct Args {
    #[arg(long, default_value = "keys")]
    keys_dir: PathBuf,

    /// JSON circuit config used when no keys exist yet
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the shallow tree depths of the test suite
    #[arg(long)]
    testing: bool,

    #[arg(long)]
    block_size: Option<usize>,

    /// Setup seed. Deterministic keys are only fit for local deployments.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let keys = if args.keys_dir.join("block.vk").exists() {
        info!(dir = ?args.keys_dir, "loading existing keys");
        BlockKeys::load_from_directory(&args.keys_dir)?
    } else {
        let mut config = match (&args.config, args.testing) {
            (Some(path), _) => load_config(path)?,
            (None, true) => CircuitConfig::testing(1),
            (None, false) => CircuitConfig::default(),
        };
        if let Some(block_size) = args.block_size {
            config.block_size = block_size;
        }
        info!(block_size = config.block_size, "running trusted setup (this may take a while)");
        let keys = setup_with_seed(&config, args.seed)?;
        keys.save_to_directory(&args.keys_dir)?;
        info!(dir = ?args.keys_dir, "keys saved");
        keys
    };

    let vk = keys.keys.serialize_vk()?;
    println!("Block VK ({} bytes, block size {}):", vk.len(), keys.config.block_size);
    println!("0x{}\n", hex::encode(&vk));

    let json = serde_json::json!({
        "config": keys.config,
        "public_inputs": ["block_commitment"],
        "verifying_key": format!("0x{}", hex::encode(&vk)),
    });
    let json_path = args.keys_dir.join("verifying_key.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&json)?)?;
    println!("JSON exported to {:?}", json_path);
    Ok(())
}
