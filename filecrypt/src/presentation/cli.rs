use clap::{Parser, Subcommand};
use filecrypt_core::DEFAULT_CHUNK_SIZE;
use filecrypt_core::keystore_fs::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "filecrypt: batch Triple-DES file encryption", long_about = None)]
pub struct Cli {
    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Print the stored key
    Show {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Store a key without running a batch
    Set {
        key: String,
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
    /// Check that a key has the required length
    Check { key: String },
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt plain files and decrypt `.enc` files, one job per file
    Run {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// 24-character key; falls back to the stored key
        #[arg(long)]
        key: Option<String>,

        /// 24-byte key as 48 hex chars
        #[arg(long = "key-hex", conflicts_with = "key")]
        key_hex: Option<String>,

        /// where the key is remembered between runs
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// queue jobs on a pool of N threads instead of one thread per file
        #[arg(long)]
        workers: Option<usize>,

        /// queue jobs on a pool sized to available parallelism
        #[arg(long)]
        pool: bool,

        /// bytes per write and per progress update
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// no live progress line
        #[arg(long)]
        quiet: bool,
    },

    #[command(subcommand)]
    /// Inspect or change the stored key
    Key(KeyCommands),
}
