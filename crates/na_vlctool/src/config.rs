use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::LevelFilter;
use na_bitstream::{BitOrder, CodeEntry, Vlc, VlcFlags};
use serde::{Deserialize, Serialize};

/// Logger levels: `app_level_filter` for our own crates, `level_filter`
/// for everything else.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoggerConfig {
    pub app_level_filter: LevelFilter,
    pub level_filter: LevelFilter,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self { app_level_filter: LevelFilter::Info, level_filter: LevelFilter::Warn }
    }
}

impl LoggerConfig {
    /// Install the global logger. `RUST_LOG` still overrides these levels.
    pub fn init(&self, verbose: bool) {
        let app = if verbose { LevelFilter::Debug } else { self.app_level_filter };
        env_logger::Builder::new()
            .filter_level(self.level_filter)
            .filter_module("na_bitstream", app)
            .filter_module("vlctool", app)
            .parse_default_env()
            .init();
    }
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct ToolConfig {
    #[serde(default)]
    pub logger: LoggerConfig,
}

impl ToolConfig {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let config_file = PathBuf::from(path.as_ref());
        let config_str = std::fs::read_to_string(&config_file)
            .with_context(|| format!("reading {}", config_file.display()))?;
        let config: ToolConfig = toml::from_str(&config_str)?;
        Ok(config)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Msb,
    Lsb,
}

impl From<Order> for BitOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Msb => BitOrder::Msb,
            Order::Lsb => BitOrder::Lsb,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CodeConfig {
    pub code: u32,
    pub len: u8,
    /// Defaults to the position in `codes`.
    pub symbol: Option<i32>,
}

/// A code table file.
///
/// ```toml
/// bits = 5
/// order = "msb"
/// codes = [
///     { code = 0, len = 1 },
///     { code = 2, len = 2, symbol = 7 },
/// ]
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub bits: u32,
    #[serde(default)]
    pub order: Order,
    /// Codes are written LSB-first.
    #[serde(default)]
    pub input_le: bool,
    pub codes: Vec<CodeConfig>,
}

impl TableConfig {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let table_file = PathBuf::from(path.as_ref());
        let table_str = std::fs::read_to_string(&table_file)
            .with_context(|| format!("reading {}", table_file.display()))?;
        Self::parse(&table_str).with_context(|| format!("parsing {}", table_file.display()))
    }

    pub fn parse(table_str: &str) -> Result<Self> {
        let table: TableConfig = toml::from_str(table_str)?;
        Ok(table)
    }

    pub fn flags(&self) -> VlcFlags {
        let mut flags = VlcFlags::empty();
        flags.set(VlcFlags::INPUT_LE, self.input_le);
        flags.set(VlcFlags::OUTPUT_LE, self.order == Order::Lsb);
        flags
    }

    pub fn entries(&self) -> Vec<CodeEntry> {
        self.codes
            .iter()
            .enumerate()
            .map(|(i, c)| CodeEntry::new(c.code, c.len, c.symbol.unwrap_or(i as i32)))
            .collect()
    }

    pub fn build(&self) -> Result<Vlc> {
        let vlc = Vlc::build(self.bits, &self.entries(), self.flags())
            .context("building lookup table")?;
        Ok(vlc)
    }
}
