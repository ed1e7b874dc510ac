//! `twemctl`: inspect and exercise twemproxy-style shard routing.
//!
//! # Usage
//!
//! ```text
//! twemctl shard friend_request:{123456}     # where does this key live?
//! twemctl key friend_request 123456         # build a hash-tagged key
//! twemctl key canceled 123456 --canonical   # same shard, canonical id
//! twemctl canonical-keys                    # one identifier per shard
//! twemctl shards                            # list shard names
//! twemctl benchmark -n 10000                # SET/GET/MGET, in-memory
//! twemctl --num-shards 32 canonical-keys    # override the shard count
//! twemctl -c cluster.toml shard foo         # with a config file
//! ```

mod config;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use twem_hashkit::Keyspace;
use tracing::info;
use twem_router::{MemoryConnector, TwemRouter};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "twemctl",
    version,
    about = "Shard routing toolbox for twemproxy-partitioned clusters"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true, env = "TWEMCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured shard count.
    #[arg(long, global = true)]
    num_shards: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which shard a key routes to.
    Shard {
        /// Full key, e.g. `friend_request:{123456}`.
        key: String,
    },

    /// Build a hash-tagged key from a type and an identifier.
    Key {
        /// Key type prefix, e.g. `friend_request`.
        key_type: String,

        /// Key identifier, e.g. `123456`.
        key_id: String,

        /// Substitute the canonical identifier of the owning shard.
        #[arg(long)]
        canonical: bool,
    },

    /// Print the canonical key identifier of every shard.
    CanonicalKeys {
        /// Override the search amplifier.
        #[arg(short, long)]
        amplifier: Option<u64>,
    },

    /// List every shard with its name.
    Shards,

    /// Run SET/GET/MGET through the router against an in-memory cluster.
    Benchmark {
        /// Number of keys to write and read.
        #[arg(short = 'n', long, default_value = "1000")]
        count: usize,

        /// Size of each value in bytes.
        #[arg(short, long, default_value = "64")]
        size: usize,
    },
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(n) = cli.num_shards {
        config.cluster.num_shards = n;
    }

    setup_tracing(&config.log.level);

    match cli.command {
        Commands::Shard { key } => cmd_shard(&config, &key),
        Commands::Key {
            key_type,
            key_id,
            canonical,
        } => cmd_key(&config, &key_type, &key_id, canonical),
        Commands::CanonicalKeys { amplifier } => {
            if let Some(a) = amplifier {
                config.cluster.search_amplifier = a;
            }
            cmd_canonical_keys(&config)
        }
        Commands::Shards => cmd_shards(&config),
        Commands::Benchmark { count, size } => cmd_benchmark(&config, count, size).await,
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the keyspace described by the `[cluster]` section.
fn keyspace(config: &CliConfig) -> Result<Keyspace> {
    let cluster = &config.cluster;
    cluster.validate().context("invalid [cluster] section")?;
    let keyspace = Keyspace::new(
        cluster.num_shards,
        cluster.hash_tag()?,
        cluster.search_amplifier,
    )
    .context("failed to compute canonical keys")?;
    Ok(keyspace)
}

// -----------------------------------------------------------------------
// Routing inspection
// -----------------------------------------------------------------------

fn cmd_shard(config: &CliConfig, key: &str) -> Result<()> {
    let keyspace = keyspace(config)?;
    let names = config.cluster.shard_names()?;

    let key_id = keyspace.codec().key_id(key);
    let shard_num = keyspace.shard_num_by_key(key);
    println!("key:          {key}");
    println!("key id:       {key_id}");
    println!("shard:        {shard_num}");
    println!("shard name:   {}", names.format(shard_num));
    println!("canonical id: {}", keyspace.canonical_key_id(key_id));
    Ok(())
}

fn cmd_key(config: &CliConfig, key_type: &str, key_id: &str, canonical: bool) -> Result<()> {
    let keyspace = keyspace(config)?;
    let key = if canonical {
        keyspace.canonical_key(key_type, key_id)
    } else {
        keyspace.build_key(key_type, key_id)
    };
    println!("{key}");
    Ok(())
}

fn cmd_canonical_keys(config: &CliConfig) -> Result<()> {
    let keyspace = keyspace(config)?;
    let names = config.cluster.shard_names()?;

    println!(
        "{} shards, amplifier {}",
        keyspace.num_shards(),
        config.cluster.search_amplifier
    );
    for (shard_num, key_id) in keyspace.canonical_keys().iter().enumerate() {
        println!("  {shard_num:>4}  {:<12} {key_id}", names.format(shard_num));
    }
    Ok(())
}

fn cmd_shards(config: &CliConfig) -> Result<()> {
    let cluster = &config.cluster;
    cluster.validate().context("invalid [cluster] section")?;
    let names = cluster.shard_names()?;

    for shard_num in 0..cluster.num_shards {
        println!("{shard_num:>4}  {}", names.format(shard_num));
    }
    let sentinels = cluster.sentinel_addrs();
    if !sentinels.is_empty() {
        println!("sentinels: {}", sentinels.join(", "));
    }
    Ok(())
}

// -----------------------------------------------------------------------
// twemctl benchmark
// -----------------------------------------------------------------------

/// Number of keys per MGET call during the benchmark.
const MGET_BATCH: usize = 100;

async fn cmd_benchmark(config: &CliConfig, count: usize, size: usize) -> Result<()> {
    let router = TwemRouter::connect(&config.cluster, &MemoryConnector)
        .await
        .context("failed to build in-memory cluster")?;
    info!(count, size, num_shards = router.num_shards(), "starting benchmark");

    println!("twemctl benchmark");
    println!("  keys:   {count}");
    println!("  size:   {size} bytes each");
    println!("  shards: {}", router.num_shards());
    println!();

    let value = generate_bench_data(size);
    let keys: Vec<String> = (0..count)
        .map(|i| router.key("bench", &i.to_string()))
        .collect();

    // --- SET ---
    print!("SET {count} keys... ");
    let start = Instant::now();
    for key in &keys {
        router.set(key, &value).await?;
    }
    report(start, count);

    // --- GET ---
    print!("GET {count} keys... ");
    let start = Instant::now();
    let mut missing = 0usize;
    for key in &keys {
        if router.get(key).await?.is_none() {
            missing += 1;
        }
    }
    report(start, count);

    // --- MGET ---
    print!("MGET {count} keys in batches of {MGET_BATCH}... ");
    let start = Instant::now();
    for batch in keys.chunks(MGET_BATCH) {
        let grouped = router.mget(batch).await?;
        missing += grouped.values().flatten().filter(|v| v.is_none()).count();
    }
    report(start, count);

    let mut distribution: BTreeMap<usize, usize> = BTreeMap::new();
    for key in &keys {
        *distribution.entry(router.shard_num_by_key(key)).or_default() += 1;
    }

    println!();
    println!("Distribution:");
    for shard_num in 0..router.num_shards() {
        let n = distribution.get(&shard_num).copied().unwrap_or(0);
        let pct = if count == 0 {
            0.0
        } else {
            n as f64 * 100.0 / count as f64
        };
        println!("  {:<12} {n:>8} ({pct:.1}%)", router.shard_name(shard_num));
    }
    if missing > 0 {
        anyhow::bail!("{missing} reads came back empty");
    }

    Ok(())
}

fn report(start: Instant, count: usize) {
    let dur = start.elapsed().as_secs_f64();
    let rate = if dur > 0.0 { count as f64 / dur } else { 0.0 };
    println!("{dur:.3}s ({rate:.0} ops/s)");
}

/// Generate deterministic value bytes for benchmarking.
fn generate_bench_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = 0xDEAD_BEEF;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
