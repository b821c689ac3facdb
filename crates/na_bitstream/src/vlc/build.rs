use log::trace;

use super::{VlcEntry, MAX_VLC_BITS};
use crate::error::{BitstreamError, Result};

/// Build-time code: `code` is left-aligned, MSB-first.
#[derive(Clone, Copy, Debug)]
pub(super) struct VlcCode {
    pub bits: u8,
    pub symbol: i32,
    pub code: u32,
}

pub(super) struct TableBuilder {
    table: Vec<VlcEntry>,
    output_le: bool,
    max_depth: u8,
}

impl TableBuilder {
    pub fn new(output_le: bool) -> Self {
        Self {
            table: Vec::new(),
            output_le,
            max_depth: 0,
        }
    }

    pub fn finish(self) -> (Vec<VlcEntry>, u8) {
        (self.table, self.max_depth)
    }

    fn alloc_table(&mut self, size: usize) -> Result<usize> {
        let index = self.table.len();
        self.table.try_reserve(size).map_err(|e| {
            BitstreamError::BuildFailure(format!("cannot allocate {size} table entries: {e}"))
        })?;
        self.table.resize(index + size, VlcEntry::Invalid);
        Ok(index)
    }

    fn put_leaf(&mut self, slot: usize, symbol: i32, len: u32) -> Result<()> {
        match self.table[slot] {
            VlcEntry::Invalid => {}
            VlcEntry::Leaf { symbol: s, len: l } if s == symbol && l as u32 == len => {}
            _ => return Err(BitstreamError::OverlappingCodes { slot }),
        }
        self.table[slot] = VlcEntry::Leaf {
            symbol,
            len: len as u8,
        };
        Ok(())
    }

    /// Build one level of `2^table_nb_bits` entries for `codes` and return
    /// its offset. Codes sharing a prefix longer than the level must be
    /// adjacent; they are shifted in place and handed to the subtable.
    pub fn build_table(
        &mut self,
        table_nb_bits: u32,
        codes: &mut [VlcCode],
        depth: u8,
    ) -> Result<usize> {
        if table_nb_bits > MAX_VLC_BITS {
            return Err(BitstreamError::BuildFailure(format!(
                "table width {table_nb_bits} too large"
            )));
        }
        self.max_depth = self.max_depth.max(depth);
        let table_index = self.alloc_table(1 << table_nb_bits)?;
        if depth > 1 {
            trace!(
                "subtable of {} bits at {} (depth {})",
                table_nb_bits,
                table_index,
                depth
            );
        }

        let mut i = 0;
        while i < codes.len() {
            let n = codes[i].bits as u32;
            let code = codes[i].code;
            let symbol = codes[i].symbol;

            if n <= table_nb_bits {
                // short code: fill every slot it prefixes
                let (mut j, inc) = if self.output_le {
                    (code.reverse_bits() as usize, 1usize << n)
                } else {
                    ((code >> (32 - table_nb_bits)) as usize, 1)
                };
                for _ in 0..1usize << (table_nb_bits - n) {
                    self.put_leaf(table_index + j, symbol, n)?;
                    j += inc;
                }
                i += 1;
                continue;
            }

            // long code: collect everything with the same prefix
            let prefix = code >> (32 - table_nb_bits);
            let mut subtable_bits = n - table_nb_bits;
            codes[i].bits = subtable_bits as u8;
            codes[i].code = code << table_nb_bits;
            let mut k = i + 1;
            while k < codes.len() {
                let rest = codes[k].bits as i32 - table_nb_bits as i32;
                if rest <= 0 || codes[k].code >> (32 - table_nb_bits) != prefix {
                    break;
                }
                codes[k].bits = rest as u8;
                codes[k].code <<= table_nb_bits;
                subtable_bits = subtable_bits.max(rest as u32);
                k += 1;
            }
            let subtable_bits = subtable_bits.min(table_nb_bits);

            let j = if self.output_le {
                (prefix.reverse_bits() >> (32 - table_nb_bits)) as usize
            } else {
                prefix as usize
            };
            let slot = table_index + j;
            if self.table[slot] != VlcEntry::Invalid {
                return Err(BitstreamError::OverlappingCodes { slot });
            }
            let offset = self.build_table(subtable_bits, &mut codes[i..k], depth + 1)?;
            self.table[slot] = VlcEntry::Subtable {
                offset: offset as u32,
                bits: subtable_bits as u8,
            };
            i = k;
        }
        Ok(table_index)
    }
}
