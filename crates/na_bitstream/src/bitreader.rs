//! Bitstream reader.
//!
//! A cursor over a borrowed byte buffer with an explicit bit length. Reads
//! past the nominal end are served from `PADDING_BYTES` of virtual zero
//! padding, so a decoder that runs slightly off the end of a corrupt unit
//! gets garbage instead of a fault. Whether that happened is the caller's
//! business: see [`BitReader::check_overread`].

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{BitstreamError, Result};

/// Virtual zero bytes readable past the end of every buffer.
pub const PADDING_BYTES: usize = 64;

const PADDING_BITS: usize = PADDING_BYTES * 8;

/// Widest field served from a single cache window. Wider reads are split.
pub const MIN_CACHE_BITS: u32 = 25;

/// Largest accepted bit length, so that `bits + 7` still fits an `i32`.
const MAX_BIT_LENGTH: i64 = i32::MAX as i64 - 7;

/// Order in which bits are taken out of each byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BitOrder {
    /// First bit is the MSB of the byte and ends up as the MSB of the field.
    #[default]
    Msb,
    /// First bit is the LSB of the byte and ends up as the LSB of the field.
    Lsb,
}

#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    buf: &'a [u8],
    size_in_bits: usize,
    bit_pos: usize,
    order: BitOrder,
}

impl<'a> BitReader<'a> {
    /// MSB-first reader over the whole buffer.
    ///
    /// Like [`with_order`](Self::with_order), any buffer length is accepted.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_order(data, BitOrder::Msb)
    }

    /// Reader over the whole buffer.
    ///
    /// The bit length is always `data.len() * 8`, so no bound applies. Use
    /// [`with_bit_length`](Self::with_bit_length) when the length comes from
    /// the stream and must be checked.
    pub fn with_order(data: &'a [u8], order: BitOrder) -> Self {
        Self {
            buf: data,
            size_in_bits: data.len() * 8,
            bit_pos: 0,
            order,
        }
    }

    /// Reader over the first `bit_length` bits of `data`.
    ///
    /// Stream headers that claim more bits than the buffer holds are
    /// rejected here; after construction the reader cannot tell.
    pub fn with_bit_length(data: &'a [u8], bit_length: i64, order: BitOrder) -> Result<Self> {
        let available = data.len() * 8;
        if bit_length < 0 || bit_length >= MAX_BIT_LENGTH || bit_length as usize > available {
            return Err(BitstreamError::InvalidLength {
                bits: bit_length,
                available,
            });
        }
        Ok(Self {
            buf: data,
            size_in_bits: bit_length as usize,
            bit_pos: 0,
            order,
        })
    }

    /// Zero-length reader. Every read returns padding.
    pub fn empty() -> Self {
        Self::new(&[])
    }

    #[inline]
    pub fn order(&self) -> BitOrder {
        self.order
    }

    /// Current bit offset from the start of the stream.
    #[inline]
    pub fn position(&self) -> usize {
        self.bit_pos
    }

    #[inline]
    pub fn bit_length(&self) -> usize {
        self.size_in_bits
    }

    /// Bits left before the declared end; negative once reads ran into padding.
    #[inline]
    pub fn bits_left(&self) -> isize {
        self.size_in_bits as isize - self.bit_pos as isize
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.bit_pos >= self.size_in_bits
    }

    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.buf
    }

    #[inline]
    fn limit(&self) -> usize {
        self.size_in_bits + PADDING_BITS
    }

    #[inline]
    fn advance(&mut self, n: usize) -> Result<()> {
        let end = self.bit_pos.saturating_add(n);
        if end > self.limit() {
            return Err(BitstreamError::Overread {
                consumed: end,
                available: self.size_in_bits,
            });
        }
        self.bit_pos = end;
        Ok(())
    }

    /// Eight bytes starting at the byte holding `pos`, zero past the buffer.
    #[inline]
    fn window(&self, pos: usize) -> u64 {
        let start = pos >> 3;
        let mut tmp = [0u8; 8];
        if start < self.buf.len() {
            let end = (start + 8).min(self.buf.len());
            tmp[..end - start].copy_from_slice(&self.buf[start..end]);
        }
        match self.order {
            BitOrder::Msb => BigEndian::read_u64(&tmp),
            BitOrder::Lsb => LittleEndian::read_u64(&tmp),
        }
    }

    /// `n` in `1..=32`; at most 7 + 32 bits of the window are needed.
    #[inline]
    fn show_raw(&self, pos: usize, n: u32) -> u32 {
        let w = self.window(pos);
        let shift = (pos & 7) as u32;
        match self.order {
            BitOrder::Msb => ((w << shift) >> (64 - n)) as u32,
            BitOrder::Lsb => ((w >> shift) & ((1u64 << n) - 1)) as u32,
        }
    }

    #[inline]
    fn check_width(n: u32, max: u32) -> Result<()> {
        if n > max {
            return Err(BitstreamError::InvalidWidth { width: n, max });
        }
        Ok(())
    }

    /// Read up to 32 bits. `n == 0` reads nothing and yields 0.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        Self::check_width(n, 32)?;
        if n == 0 {
            return Ok(0);
        }
        if n <= MIN_CACHE_BITS {
            let v = self.show_raw(self.bit_pos, n);
            self.advance(n as usize)?;
            return Ok(v);
        }

        // Too wide for one cache window: two sub-reads.
        if self.bit_pos.saturating_add(n as usize) > self.limit() {
            return Err(BitstreamError::Overread {
                consumed: self.bit_pos.saturating_add(n as usize),
                available: self.size_in_bits,
            });
        }
        let first = self.read_bits(16)?;
        let second = self.read_bits(n - 16)?;
        Ok(match self.order {
            BitOrder::Msb => (first << (n - 16)) | second,
            BitOrder::Lsb => first | (second << 16),
        })
    }

    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Read up to 64 bits as two 32-bit halves.
    pub fn read_bits64(&mut self, n: u32) -> Result<u64> {
        Self::check_width(n, 64)?;
        if n <= 32 {
            return Ok(self.read_bits(n)? as u64);
        }
        if self.bit_pos.saturating_add(n as usize) > self.limit() {
            return Err(BitstreamError::Overread {
                consumed: self.bit_pos.saturating_add(n as usize),
                available: self.size_in_bits,
            });
        }
        let first = self.read_bits(32)? as u64;
        let second = self.read_bits(n - 32)? as u64;
        Ok(match self.order {
            BitOrder::Msb => (first << (n - 32)) | second,
            BitOrder::Lsb => first | (second << 32),
        })
    }

    /// Read an `n`-bit field whose most significant bit is the sign.
    ///
    /// A set sign bit means the raw field is the (positive) value; a clear
    /// one means the value is `raw - (2^n - 1)`. This is the magnitude-class
    /// coding used for DC differentials, not two's complement.
    pub fn read_signed_bits(&mut self, n: u32) -> Result<i64> {
        Self::check_width(n, 32)?;
        if n == 0 {
            return Ok(0);
        }
        let raw = self.read_bits(n)? as i64;
        if (raw >> (n - 1)) & 1 != 0 {
            Ok(raw)
        } else {
            Ok(raw - ((1i64 << n) - 1))
        }
    }

    /// Read an `n`-bit two's-complement field.
    pub fn read_sbits(&mut self, n: u32) -> Result<i32> {
        Self::check_width(n, 32)?;
        if n == 0 {
            return Ok(0);
        }
        let raw = self.read_bits(n)? as i64;
        let sign = 1i64 << (n - 1);
        let v = if raw & sign != 0 { raw - (sign << 1) } else { raw };
        Ok(v as i32)
    }

    /// Look at the next `n` bits (up to 32) without consuming them.
    pub fn peek_bits(&self, n: u32) -> Result<u32> {
        Self::check_width(n, 32)?;
        if n == 0 {
            return Ok(0);
        }
        if n <= MIN_CACHE_BITS {
            return Ok(self.show_raw(self.bit_pos, n));
        }
        let mut tmp = self.clone();
        tmp.read_bits(n)
    }

    pub fn peek_bits64(&self, n: u32) -> Result<u64> {
        let mut tmp = self.clone();
        tmp.read_bits64(n)
    }

    #[inline]
    pub fn skip_bits(&mut self, n: usize) -> Result<()> {
        self.advance(n)
    }

    #[inline]
    pub fn is_byte_aligned(&self) -> bool {
        self.bit_pos & 7 == 0
    }

    pub fn align_to_byte(&mut self) {
        self.bit_pos = ((self.bit_pos + 7) & !7).min(self.limit());
    }

    /// Fails with `Overread` once reads went past the declared bit length.
    pub fn check_overread(&self) -> Result<()> {
        if self.bit_pos > self.size_in_bits {
            return Err(BitstreamError::Overread {
                consumed: self.bit_pos,
                available: self.size_in_bits,
            });
        }
        Ok(())
    }

    /// Fails with `Overread` if more than `unit_bits` bits were consumed
    /// since `start` (a position previously returned by [`Self::position`]).
    pub fn ensure_consumed_within(&self, start: usize, unit_bits: usize) -> Result<()> {
        let consumed = self.bit_pos.saturating_sub(start);
        if consumed > unit_bits {
            return Err(BitstreamError::Overread {
                consumed,
                available: unit_bits,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msb_first_fields() {
        let data = [0b1010_1100, 0b0101_0011];
        let mut br = BitReader::new(&data);
        assert_eq!(br.read_bits(3).unwrap(), 0b101);
        assert_eq!(br.read_bits(7).unwrap(), 0b01100_01);
        assert_eq!(br.position(), 10);
        assert_eq!(br.read_bits(6).unwrap(), 0b010011);
        assert_eq!(br.bits_left(), 0);
    }

    #[test]
    fn lsb_first_fields() {
        let data = [0b1010_1100, 0b0101_0011];
        let mut br = BitReader::with_order(&data, BitOrder::Lsb);
        assert_eq!(br.read_bits(3).unwrap(), 0b100);
        assert_eq!(br.read_bits(7).unwrap(), 0b11_10101);
        assert_eq!(br.read_bits(6).unwrap(), 0b010100);
    }

    #[test]
    fn whole_buffer_constructors() {
        let data = [0u8; 300];
        let checked = BitReader::with_bit_length(&data, 2400, BitOrder::Msb).unwrap();
        assert_eq!(BitReader::new(&data).bit_length(), 2400);
        assert_eq!(BitReader::new(&data).bit_length(), checked.bit_length());
        let br = BitReader::with_order(&data, BitOrder::Lsb);
        assert_eq!(br.bit_length(), data.len() * 8);
        assert_eq!(br.bits_left(), 2400);

        assert_eq!(BitReader::new(&[]).bit_length(), 0);
        assert!(BitReader::new(&[]).is_exhausted());
    }

    #[test]
    fn wide_reads_compose() {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0, 0x11];
        let mut br = BitReader::new(&data);
        br.skip_bits(4).unwrap();
        assert_eq!(br.read_bits(32).unwrap(), 0x2345_6789);
        assert_eq!(br.read_bits(28).unwrap(), 0xabc_def0);

        let mut br = BitReader::with_order(&data, BitOrder::Lsb);
        assert_eq!(br.read_bits(32).unwrap(), 0x7856_3412);
        assert_eq!(br.read_bits64(40).unwrap(), 0x11_f0de_bc9a);
    }

    #[test]
    fn zero_width_and_too_wide() {
        let mut br = BitReader::new(&[0xff]);
        assert_eq!(br.read_bits(0).unwrap(), 0);
        assert_eq!(br.position(), 0);
        assert_eq!(
            br.read_bits(33),
            Err(BitstreamError::InvalidWidth { width: 33, max: 32 })
        );
        assert!(br.peek_bits64(65).is_err());
    }

    #[test]
    fn peek_does_not_advance() {
        let data = [0xc3, 0x5a, 0x00, 0xff];
        let mut br = BitReader::new(&data);
        br.skip_bits(3).unwrap();
        let a = br.peek_bits(27).unwrap();
        let b = br.peek_bits(27).unwrap();
        assert_eq!(a, b);
        assert_eq!(br.position(), 3);
        assert_eq!(br.read_bits(27).unwrap(), a);
    }

    #[test]
    fn signed_fields() {
        // 3-bit magnitude classes: 111 -> 7, 100 -> 4, 011 -> -4, 000 -> -7
        let data = [0b111_100_01, 0b1_000_0000];
        let mut br = BitReader::new(&data);
        assert_eq!(br.read_signed_bits(3).unwrap(), 7);
        assert_eq!(br.read_signed_bits(3).unwrap(), 4);
        assert_eq!(br.read_signed_bits(3).unwrap(), -4);
        assert_eq!(br.read_signed_bits(3).unwrap(), -7);

        let mut br = BitReader::new(&[0b1110_0111]);
        assert_eq!(br.read_sbits(4).unwrap(), -2);
        assert_eq!(br.read_sbits(4).unwrap(), 7);
    }

    #[test]
    fn reads_run_into_padding_then_fail() {
        let mut br = BitReader::new(&[0xff]);
        assert_eq!(br.read_bits(8).unwrap(), 0xff);
        assert_eq!(br.read_bits(16).unwrap(), 0);
        assert_eq!(br.bits_left(), -16);
        assert!(br.check_overread().is_err());

        let rest = PADDING_BITS - 16;
        br.skip_bits(rest).unwrap();
        assert!(matches!(
            br.read_bits(1),
            Err(BitstreamError::Overread { .. })
        ));
        assert_eq!(br.position(), 8 + PADDING_BITS);
    }

    #[test]
    fn bit_length_validation() {
        let data = [0u8; 4];
        assert!(BitReader::with_bit_length(&data, 32, BitOrder::Msb).is_ok());
        assert_eq!(
            BitReader::with_bit_length(&data, -1, BitOrder::Msb).unwrap_err(),
            BitstreamError::InvalidLength { bits: -1, available: 32 }
        );
        assert!(BitReader::with_bit_length(&data, 33, BitOrder::Msb).is_err());

        let br = BitReader::with_bit_length(&data, 13, BitOrder::Lsb).unwrap();
        assert_eq!(br.bit_length(), 13);
        assert_eq!(BitReader::empty().bit_length(), 0);
    }

    #[test]
    fn align() {
        let mut br = BitReader::new(&[0xff, 0x80]);
        br.align_to_byte();
        assert_eq!(br.position(), 0);
        br.skip_bits(1).unwrap();
        assert!(!br.is_byte_aligned());
        br.align_to_byte();
        assert_eq!(br.position(), 8);
        assert!(br.read_bit().unwrap());
    }

    #[test]
    fn unit_overread_check() {
        let data = [0u8; 8];
        let mut br = BitReader::new(&data);
        br.skip_bits(10).unwrap();
        let start = br.position();
        br.read_bits(12).unwrap();
        assert!(br.ensure_consumed_within(start, 12).is_ok());
        br.read_bits(1).unwrap();
        assert_eq!(
            br.ensure_consumed_within(start, 12),
            Err(BitstreamError::Overread { consumed: 13, available: 12 })
        );
    }
}
