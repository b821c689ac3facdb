//! VLC (Huffman) table builder and decoder.
//!
//! A table is a flat vector of [`VlcEntry`] values: the root table of
//! `2^bits` entries comes first and every subtable for codes longer than
//! `bits` is appended behind it. Decoding peeks `bits` bits, and either
//! finds the symbol directly or follows a [`VlcEntry::Subtable`] for the
//! next few bits.

mod build;
mod shared;

use bitflags::bitflags;
use log::{debug, warn};

use crate::bitreader::{BitOrder, BitReader};
use crate::error::{BitstreamError, Result};

use build::{TableBuilder, VlcCode};

pub use shared::SharedVlc;

/// Widest lookup level.
pub const MAX_VLC_BITS: u32 = 30;

/// Longest code any table accepts.
pub const MAX_CODE_LENGTH: u32 = 32;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct VlcFlags: u32 {
        /// Input codes are LSB-first: the first bit to read is bit 0.
        const INPUT_LE = 1 << 2;
        /// The table is looked up through an LSB-first reader.
        const OUTPUT_LE = 1 << 3;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VlcEntry {
    /// No code maps here.
    #[default]
    Invalid,
    /// `len` is the number of bits consumed at this level.
    Leaf { symbol: i32, len: u8 },
    /// Next level lives at `offset` and is indexed by the next `bits` bits.
    Subtable { offset: u32, bits: u8 },
}

/// One input code: `len` bits of `code` (right-aligned) decode to `symbol`.
/// A zero `len` marks an unused entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodeEntry {
    pub code: u32,
    pub len: u8,
    pub symbol: i32,
}

impl CodeEntry {
    pub const fn new(code: u32, len: u8, symbol: i32) -> Self {
        Self { code, len, symbol }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Vlc {
    bits: u8,
    max_depth: u8,
    order: BitOrder,
    table: Vec<VlcEntry>,
}

fn check_table_bits(bits: u32) -> Result<()> {
    if bits == 0 || bits > MAX_VLC_BITS {
        return Err(BitstreamError::BuildFailure(format!(
            "table width {bits} outside 1..={MAX_VLC_BITS}"
        )));
    }
    Ok(())
}

impl Vlc {
    /// Build from explicit `(code, len, symbol)` entries.
    pub fn build(bits: u32, entries: &[CodeEntry], flags: VlcFlags) -> Result<Self> {
        check_table_bits(bits)?;
        let len_max = MAX_CODE_LENGTH.min(3 * bits);

        let mut long = Vec::new();
        let mut short = Vec::new();
        for (i, e) in entries.iter().enumerate() {
            let len = e.len as u32;
            if len == 0 {
                continue;
            }
            if len > len_max {
                return Err(BitstreamError::BuildFailure(format!(
                    "too long VLC ({len}) for entry {i}"
                )));
            }
            if (e.code as u64) >> len != 0 {
                return Err(BitstreamError::BuildFailure(format!(
                    "invalid code {:#x} for entry {i}",
                    e.code
                )));
            }
            let code = if flags.contains(VlcFlags::INPUT_LE) {
                e.code.reverse_bits()
            } else {
                e.code << (32 - len)
            };
            let c = VlcCode {
                bits: len as u8,
                symbol: e.symbol,
                code,
            };
            if len > bits {
                long.push(c);
            } else {
                short.push(c);
            }
        }

        // Codes sharing a subtable prefix have to be adjacent.
        long.sort_by_key(|c| c.code);
        long.extend(short);
        Self::finish(bits, long, flags)
    }

    /// Build from parallel length/code arrays. Without `symbols`, entry `i`
    /// decodes to `i`.
    pub fn from_codes(
        bits: u32,
        lens: &[u8],
        codes: &[u32],
        symbols: Option<&[i32]>,
        flags: VlcFlags,
    ) -> Result<Self> {
        if codes.len() != lens.len() || symbols.is_some_and(|s| s.len() != lens.len()) {
            return Err(BitstreamError::BuildFailure(format!(
                "mismatched table sizes: {} lengths, {} codes",
                lens.len(),
                codes.len()
            )));
        }
        let entries: Vec<CodeEntry> = lens
            .iter()
            .zip(codes)
            .enumerate()
            .map(|(i, (&len, &code))| {
                let symbol = symbols.map_or(i as i32, |s| s[i]);
                CodeEntry::new(code, len, symbol)
            })
            .collect();
        Self::build(bits, &entries, flags)
    }

    /// Build a canonical code from lengths alone.
    ///
    /// Codes are handed out in order: each entry gets the next free code of
    /// its length, so the lengths must be listed in tree order. A zero length
    /// skips the entry, a negative one reserves `|len|` bits of code space
    /// without a symbol, leaving a hole.
    pub fn from_lengths(
        bits: u32,
        lens: &[i8],
        symbols: Option<&[i32]>,
        offset: i32,
        flags: VlcFlags,
    ) -> Result<Self> {
        check_table_bits(bits)?;
        if symbols.is_some_and(|s| s.len() != lens.len()) {
            return Err(BitstreamError::BuildFailure(format!(
                "{} lengths but {} symbols",
                lens.len(),
                symbols.map_or(0, |s| s.len())
            )));
        }
        let len_max = MAX_CODE_LENGTH.min(3 * bits);

        let mut codes = Vec::with_capacity(lens.len());
        let mut code: u64 = 0;
        for (i, &len) in lens.iter().enumerate() {
            if len == 0 {
                continue;
            }
            let abs_len = len.unsigned_abs() as u32;
            if abs_len > len_max || (code & ((1u64 << (32 - abs_len)) - 1)) != 0 {
                return Err(BitstreamError::BuildFailure(format!(
                    "invalid VLC (length {abs_len}) at entry {i}"
                )));
            }
            if len > 0 {
                let symbol = symbols
                    .map_or(i as i32, |s| s[i])
                    .checked_add(offset)
                    .ok_or_else(|| {
                        BitstreamError::BuildFailure(format!("symbol overflow at entry {i}"))
                    })?;
                codes.push(VlcCode {
                    bits: abs_len as u8,
                    symbol,
                    code: code as u32,
                });
            }
            code += 1u64 << (32 - abs_len);
            if code > 1u64 << 32 {
                return Err(BitstreamError::BuildFailure(
                    "overdetermined VLC tree".into(),
                ));
            }
        }
        Self::finish(bits, codes, flags)
    }

    fn finish(bits: u32, mut codes: Vec<VlcCode>, flags: VlcFlags) -> Result<Self> {
        let mut builder = TableBuilder::new(flags.contains(VlcFlags::OUTPUT_LE));
        builder.build_table(bits, &mut codes, 1)?;
        let (table, max_depth) = builder.finish();
        debug!(
            "built VLC: {} bits, {} codes, {} entries, depth {}",
            bits,
            codes.len(),
            table.len(),
            max_depth
        );
        Ok(Self {
            bits: bits as u8,
            max_depth,
            order: if flags.contains(VlcFlags::OUTPUT_LE) {
                BitOrder::Lsb
            } else {
                BitOrder::Msb
            },
            table,
        })
    }

    /// Root table width.
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits as u32
    }

    /// Number of lookup levels the longest code needs.
    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth as u32
    }

    /// Bit order of the reader this table expects.
    #[inline]
    pub fn order(&self) -> BitOrder {
        self.order
    }

    #[inline]
    pub fn entries(&self) -> &[VlcEntry] {
        &self.table
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Decode one symbol, descending as deep as the table needs.
    #[inline]
    pub fn decode(&self, br: &mut BitReader<'_>) -> Result<i32> {
        self.decode_bounded(br, self.max_depth as u32)
    }

    /// Decode one symbol through at most `max_depth` lookup levels.
    ///
    /// On a hole (or a code deeper than `max_depth`) only the bits of the
    /// levels already walked are consumed and `InvalidCode` is returned.
    pub fn decode_bounded(&self, br: &mut BitReader<'_>, max_depth: u32) -> Result<i32> {
        debug_assert_eq!(br.order(), self.order, "reader/table bit order mismatch");
        let start = br.position();
        let mut offset = 0usize;
        let mut bits = self.bits as u32;
        let mut depth = 1;
        loop {
            let index = offset + br.peek_bits(bits)? as usize;
            match self.table.get(index).copied().unwrap_or_default() {
                VlcEntry::Leaf { symbol, len } => {
                    br.skip_bits(len as usize)?;
                    return Ok(symbol);
                }
                VlcEntry::Subtable {
                    offset: sub,
                    bits: sub_bits,
                } if depth < max_depth => {
                    br.skip_bits(bits as usize)?;
                    offset = sub as usize;
                    bits = sub_bits as u32;
                    depth += 1;
                }
                _ => {
                    warn!("invalid VLC code at bit {start}");
                    return Err(BitstreamError::InvalidCode { position: start });
                }
            }
        }
    }
}
