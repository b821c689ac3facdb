//! Bitstream writer, the counterpart of [`crate::bitreader::BitReader`].
//!
//! Writes into a caller-owned buffer whose length is the hard capacity.
//! A write that would not fit fails up front and leaves the writer untouched.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::bitreader::BitOrder;
use crate::error::{BitstreamError, Result};

/// Buffer size that covers any re-encoding of `decomp_size` bytes by a
/// lossless coder that may expand its input.
pub fn worst_case_size(decomp_size: usize) -> usize {
    decomp_size + decomp_size.div_ceil(8) + decomp_size.div_ceil(64) + 16
}

pub struct BitWriter<'a> {
    buf: &'a mut [u8],
    order: BitOrder,
    /// Pending bits: right-aligned for MSB order, low bits first for LSB.
    bit_buf: u64,
    bit_count: u32,
    byte_pos: usize,
}

impl<'a> BitWriter<'a> {
    pub fn new(buf: &'a mut [u8], order: BitOrder) -> Self {
        Self {
            buf,
            order,
            bit_buf: 0,
            bit_count: 0,
            byte_pos: 0,
        }
    }

    #[inline]
    pub fn order(&self) -> BitOrder {
        self.order
    }

    #[inline]
    pub fn capacity_bits(&self) -> usize {
        self.buf.len() * 8
    }

    #[inline]
    pub fn bits_written(&self) -> usize {
        self.byte_pos * 8 + self.bit_count as usize
    }

    /// Bytes committed to the buffer so far. Call [`Self::flush`] first to
    /// include a trailing partial byte.
    #[inline]
    pub fn bytes_written(&self) -> usize {
        self.byte_pos
    }

    /// Committed bytes.
    pub fn data(&self) -> &[u8] {
        &self.buf[..self.byte_pos]
    }

    fn reserve(&self, n: usize) -> Result<()> {
        let requested = self.bits_written() + n;
        if requested > self.capacity_bits() {
            return Err(BitstreamError::BufferFull {
                requested,
                capacity: self.capacity_bits(),
            });
        }
        Ok(())
    }

    /// Append `n <= 32` bits; capacity and width already checked.
    fn put(&mut self, n: u32, value: u32) {
        if n == 0 {
            return;
        }
        match self.order {
            BitOrder::Msb => {
                self.bit_buf = (self.bit_buf << n) | value as u64;
                self.bit_count += n;
                if self.bit_count >= 32 {
                    let rest = self.bit_count - 32;
                    let word = (self.bit_buf >> rest) as u32;
                    BigEndian::write_u32(&mut self.buf[self.byte_pos..self.byte_pos + 4], word);
                    self.byte_pos += 4;
                    self.bit_count = rest;
                    self.bit_buf &= (1u64 << rest) - 1;
                }
            }
            BitOrder::Lsb => {
                self.bit_buf |= (value as u64) << self.bit_count;
                self.bit_count += n;
                if self.bit_count >= 32 {
                    let word = self.bit_buf as u32;
                    LittleEndian::write_u32(&mut self.buf[self.byte_pos..self.byte_pos + 4], word);
                    self.byte_pos += 4;
                    self.bit_count -= 32;
                    self.bit_buf >>= 32;
                }
            }
        }
    }

    /// Write the low `n` bits of `value`. Every bit above `n` must be clear.
    pub fn write_bits(&mut self, n: u32, value: u32) -> Result<()> {
        if n > 32 {
            return Err(BitstreamError::InvalidWidth { width: n, max: 32 });
        }
        if n < 32 && (value >> n) != 0 {
            return Err(BitstreamError::ValueOverflow {
                value: value as u64,
                width: n,
            });
        }
        self.reserve(n as usize)?;
        self.put(n, value);
        Ok(())
    }

    #[inline]
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.write_bits(1, bit as u32)
    }

    pub fn write_bits64(&mut self, n: u32, value: u64) -> Result<()> {
        if n > 64 {
            return Err(BitstreamError::InvalidWidth { width: n, max: 64 });
        }
        if n <= 32 {
            if value >> 32 != 0 {
                return Err(BitstreamError::ValueOverflow { value, width: n });
            }
            return self.write_bits(n, value as u32);
        }
        if n < 64 && (value >> n) != 0 {
            return Err(BitstreamError::ValueOverflow { value, width: n });
        }
        self.reserve(n as usize)?;
        let lo = value as u32;
        let hi = (value >> 32) as u32;
        match self.order {
            BitOrder::Msb => {
                self.put(n - 32, hi);
                self.put(32, lo);
            }
            BitOrder::Lsb => {
                self.put(32, lo);
                self.put(n - 32, hi);
            }
        }
        Ok(())
    }

    /// Two's-complement field, the dual of `BitReader::read_sbits`.
    pub fn write_sbits(&mut self, n: u32, value: i32) -> Result<()> {
        if n == 0 || n > 32 {
            return Err(BitstreamError::InvalidWidth { width: n, max: 32 });
        }
        let half = 1i64 << (n - 1);
        let v = value as i64;
        if v < -half || v >= half {
            return Err(BitstreamError::ValueOverflow {
                value: value as u32 as u64,
                width: n,
            });
        }
        let raw = (v & ((1i64 << n) - 1)) as u32;
        self.write_bits(n, raw)
    }

    /// Sign-in-MSB field, the dual of `BitReader::read_signed_bits`.
    ///
    /// Only values with `2^(n-1) <= |value| < 2^n` have an `n`-bit encoding.
    pub fn write_signed_bits(&mut self, n: u32, value: i64) -> Result<()> {
        if n == 0 || n > 32 {
            return Err(BitstreamError::InvalidWidth { width: n, max: 32 });
        }
        let full = (1i64 << n) - 1;
        let raw = if value > 0 { value } else { value + full };
        let valid = if value > 0 {
            raw >> (n - 1) == 1
        } else {
            raw >= 0 && raw >> (n - 1) == 0
        };
        if !valid {
            return Err(BitstreamError::ValueOverflow {
                value: value as u64,
                width: n,
            });
        }
        self.write_bits(n, raw as u32)
    }

    /// Pad with zero bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) -> Result<()> {
        let pad = (8 - (self.bit_count & 7)) & 7;
        self.write_bits(pad, 0)
    }

    /// Commit all pending bits, zero-padding the last byte.
    /// Returns the number of bytes written.
    pub fn flush(&mut self) -> usize {
        let pad = (8 - (self.bit_count & 7)) & 7;
        match self.order {
            BitOrder::Msb => {
                self.bit_buf <<= pad;
                let bytes = (self.bit_count + pad) / 8;
                for i in (0..bytes).rev() {
                    self.buf[self.byte_pos] = (self.bit_buf >> (i * 8)) as u8;
                    self.byte_pos += 1;
                }
            }
            BitOrder::Lsb => {
                let bytes = (self.bit_count + pad) / 8;
                for _ in 0..bytes {
                    self.buf[self.byte_pos] = self.bit_buf as u8;
                    self.bit_buf >>= 8;
                    self.byte_pos += 1;
                }
            }
        }
        self.bit_buf = 0;
        self.bit_count = 0;
        self.byte_pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitreader::BitReader;

    #[test]
    fn msb_layout() {
        let mut buf = [0u8; 4];
        let mut bw = BitWriter::new(&mut buf, BitOrder::Msb);
        bw.write_bits(3, 0b101).unwrap();
        bw.write_bits(7, 0b0110001).unwrap();
        bw.write_bits(6, 0b010011).unwrap();
        assert_eq!(bw.bits_written(), 16);
        assert_eq!(bw.flush(), 2);
        assert_eq!(&buf[..2], &[0b1010_1100, 0b0101_0011]);
    }

    #[test]
    fn lsb_layout() {
        let mut buf = [0u8; 4];
        let mut bw = BitWriter::new(&mut buf, BitOrder::Lsb);
        bw.write_bits(3, 0b100).unwrap();
        bw.write_bits(7, 0b1110101).unwrap();
        bw.write_bits(6, 0b010100).unwrap();
        assert_eq!(bw.flush(), 2);
        assert_eq!(&buf[..2], &[0b1010_1100, 0b0101_0011]);
    }

    #[test]
    fn full_words_and_tail() {
        let mut buf = [0u8; 6];
        let mut bw = BitWriter::new(&mut buf, BitOrder::Msb);
        bw.write_bits(32, 0xdead_beef).unwrap();
        bw.write_bits(4, 0xa).unwrap();
        assert_eq!(bw.bytes_written(), 4);
        assert_eq!(bw.flush(), 5);
        assert_eq!(bw.data(), &[0xde, 0xad, 0xbe, 0xef, 0xa0]);
    }

    #[test]
    fn value_must_fit() {
        let mut buf = [0u8; 4];
        let mut bw = BitWriter::new(&mut buf, BitOrder::Msb);
        assert_eq!(
            bw.write_bits(4, 0x10),
            Err(BitstreamError::ValueOverflow { value: 0x10, width: 4 })
        );
        assert!(bw.write_bits(0, 1).is_err());
        assert!(bw.write_bits(32, u32::MAX).is_ok());
        assert_eq!(bw.bits_written(), 32);
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let mut buf = [0u8; 2];
        let mut bw = BitWriter::new(&mut buf, BitOrder::Msb);
        bw.write_bits(12, 0xabc).unwrap();
        assert_eq!(
            bw.write_bits(5, 0),
            Err(BitstreamError::BufferFull { requested: 17, capacity: 16 })
        );
        bw.write_bits(4, 0xd).unwrap();
        assert_eq!(bw.flush(), 2);
        assert_eq!(bw.data(), &[0xab, 0xcd]);
    }

    #[test]
    fn signed_fields_round_trip() {
        let mut buf = [0u8; 16];
        let mut bw = BitWriter::new(&mut buf, BitOrder::Msb);
        bw.write_signed_bits(3, 7).unwrap();
        bw.write_signed_bits(3, -4).unwrap();
        bw.write_signed_bits(1, -1).unwrap();
        bw.write_sbits(5, -16).unwrap();
        bw.write_sbits(5, 15).unwrap();
        assert!(bw.write_signed_bits(3, 3).is_err());
        assert!(bw.write_signed_bits(3, 0).is_err());
        assert!(bw.write_sbits(5, 16).is_err());
        bw.flush();

        let mut br = BitReader::new(&buf);
        assert_eq!(br.read_signed_bits(3).unwrap(), 7);
        assert_eq!(br.read_signed_bits(3).unwrap(), -4);
        assert_eq!(br.read_signed_bits(1).unwrap(), -1);
        assert_eq!(br.read_sbits(5).unwrap(), -16);
        assert_eq!(br.read_sbits(5).unwrap(), 15);
    }

    #[test]
    fn wide_values() {
        for order in [BitOrder::Msb, BitOrder::Lsb] {
            let mut buf = [0u8; 16];
            let mut bw = BitWriter::new(&mut buf, order);
            bw.write_bits(3, 5).unwrap();
            bw.write_bits64(61, 0x1234_5678_9abc_def0 & ((1 << 61) - 1)).unwrap();
            bw.write_bits64(64, u64::MAX - 1).unwrap();
            assert_eq!(bw.flush(), 16);

            let mut br = BitReader::with_order(&buf, order);
            assert_eq!(br.read_bits(3).unwrap(), 5);
            assert_eq!(
                br.read_bits64(61).unwrap(),
                0x1234_5678_9abc_def0 & ((1 << 61) - 1)
            );
            assert_eq!(br.read_bits64(64).unwrap(), u64::MAX - 1);
        }
    }

    #[test]
    fn worst_case_expansion() {
        assert_eq!(worst_case_size(0), 16);
        assert_eq!(worst_case_size(64), 64 + 8 + 1 + 16);
        assert_eq!(worst_case_size(65), 65 + 9 + 2 + 16);
    }
}
