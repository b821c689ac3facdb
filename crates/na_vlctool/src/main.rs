use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use na_bitstream::{build_code, BitstreamError, HuffmanFlags};

use config::{TableConfig, ToolConfig};

mod config;
mod decode;
mod render;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Tool configuration with a `[logger]` section
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log table construction and decoding at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a Huffman code from per-symbol frequencies
    Huffman {
        #[arg(required = true)]
        freqs: Vec<u32>,

        /// Place merged nodes before leaves of equal frequency
        #[arg(long)]
        hnode_first: bool,

        /// Also code zero-frequency symbols
        #[arg(long)]
        zero_count: bool,
    },
    /// Print the lookup table built from a table file
    Dump { table: PathBuf },
    /// Decode a hex bitstream with the table from a table file
    Decode {
        table: PathBuf,
        hex: String,

        /// Stop after this many symbols
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ToolConfig::new(path)?,
        None => ToolConfig::default(),
    };
    config.logger.init(args.verbose);

    match args.command {
        Command::Huffman { freqs, hnode_first, zero_count } => {
            let mut flags = HuffmanFlags::empty();
            flags.set(HuffmanFlags::HNODE_FIRST, hnode_first);
            flags.set(HuffmanFlags::ZERO_COUNT, zero_count);
            let code = build_code(&freqs, flags).context("building huffman code")?;
            println!("{}", render::render_huffman(&freqs, &code));
        }
        Command::Dump { table } => {
            let vlc = TableConfig::new(&table)?.build()?;
            println!("{}", render::render_table(&vlc));
        }
        Command::Decode { table, hex, limit } => {
            let vlc = TableConfig::new(&table)?.build()?;
            let data = hex::decode(hex.trim()).context("invalid hex input")?;
            let outcome = decode::decode_all(&vlc, &data, limit);
            println!("{}", outcome.symbols.iter().join(" "));
            if let Some(e @ BitstreamError::Overread { .. }) = outcome.error {
                bail!("{e} after {} symbols", outcome.symbols.len());
            }
        }
    }
    Ok(())
}
