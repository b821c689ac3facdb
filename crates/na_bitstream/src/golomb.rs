//! Unary, Rice and Exp-Golomb codes.
//!
//! Stateless helpers over [`BitReader`]/[`BitWriter`]; they honour the bit
//! order the reader or writer was created with.

use crate::bitreader::{BitOrder, BitReader};
use crate::bitwriter::BitWriter;
use crate::error::{BitstreamError, Result};

#[inline]
fn low_mask(n: u32) -> u32 {
    if n >= 32 {
        u32::MAX
    } else {
        (1u32 << n) - 1
    }
}

/// Number of bits before the first set bit of an `n`-bit window, in reading order.
#[inline]
fn run_before_set(w: u32, n: u32, order: BitOrder) -> u32 {
    if w == 0 {
        return n;
    }
    match order {
        BitOrder::Msb => w.leading_zeros() - (32 - n),
        BitOrder::Lsb => w.trailing_zeros(),
    }
}

/// Count bits different from `stop`, up to `limit` of them.
///
/// The terminating `stop` bit is consumed. If `limit` non-stop bits are seen
/// first, `limit` is returned and no terminator is consumed.
pub fn read_unary(br: &mut BitReader<'_>, stop: bool, limit: u32) -> Result<u32> {
    let mut count = 0u32;
    while count < limit {
        let n = (limit - count).min(32);
        let mut w = br.peek_bits(n)?;
        if !stop {
            w = !w & low_mask(n);
        }
        let run = run_before_set(w, n, br.order());
        if run < n {
            br.skip_bits(run as usize + 1)?;
            return Ok(count + run);
        }
        br.skip_bits(n as usize)?;
        count += n;
    }
    Ok(limit)
}

/// Write `value` bits different from `stop`, then one `stop` bit.
pub fn write_unary(bw: &mut BitWriter<'_>, value: u32, stop: bool) -> Result<()> {
    let fill = if stop { 0 } else { u32::MAX };
    let mut left = value;
    while left > 0 {
        let n = left.min(32);
        bw.write_bits(n, fill & low_mask(n))?;
        left -= n;
    }
    bw.write_bit(stop)
}

/// Rice code with parameter `k`: a run of zeros terminated by a one gives
/// the quotient, followed by `k` literal low bits.
pub fn read_rice(br: &mut BitReader<'_>, k: u32) -> Result<u32> {
    if k > 32 {
        return Err(BitstreamError::InvalidWidth { width: k, max: 32 });
    }
    let start = br.position();
    let q = read_unary(br, true, u32::MAX)?;
    let r = br.read_bits(k)?;
    let value = ((q as u64) << k) | r as u64;
    if value > u32::MAX as u64 {
        return Err(BitstreamError::InvalidCode { position: start });
    }
    Ok(value as u32)
}

pub fn write_rice(bw: &mut BitWriter<'_>, value: u32, k: u32) -> Result<()> {
    if k > 32 {
        return Err(BitstreamError::InvalidWidth { width: k, max: 32 });
    }
    let q = ((value as u64) >> k) as u32;
    write_unary(bw, q, true)?;
    bw.write_bits(k, value & low_mask(k))
}

/// Signed Rice code with zig-zag folding (`0, -1, 1, -2, ...`).
pub fn read_signed_rice(br: &mut BitReader<'_>, k: u32) -> Result<i32> {
    let u = read_rice(br, k)?;
    Ok((u >> 1) as i32 ^ -((u & 1) as i32))
}

pub fn write_signed_rice(bw: &mut BitWriter<'_>, value: i32, k: u32) -> Result<()> {
    let u = ((value as u32) << 1) ^ ((value >> 31) as u32);
    write_rice(bw, u, k)
}

/// Unsigned Exp-Golomb code.
pub fn read_ue(br: &mut BitReader<'_>) -> Result<u32> {
    let start = br.position();
    let zeros = read_unary(br, true, 32)?;
    if zeros > 31 {
        return Err(BitstreamError::InvalidCode { position: start });
    }
    let suffix = br.read_bits(zeros)?;
    Ok((1u32 << zeros) - 1 + suffix)
}

/// Signed Exp-Golomb code (`1, -1, 2, -2, ...` for code numbers `1, 2, 3, 4, ...`).
pub fn read_se(br: &mut BitReader<'_>) -> Result<i32> {
    let ue = read_ue(br)? as i64;
    let v = (ue + 1) >> 1;
    let v = if ue & 1 == 0 { -v } else { v };
    Ok(v as i32)
}

pub fn write_ue(bw: &mut BitWriter<'_>, value: u32) -> Result<()> {
    let x = value as u64 + 1;
    let len = 64 - x.leading_zeros();
    if len > 32 {
        return Err(BitstreamError::ValueOverflow {
            value: value as u64,
            width: 32,
        });
    }
    bw.write_bits(len - 1, 0)?;
    bw.write_bits(len, x as u32)
}

pub fn write_se(bw: &mut BitWriter<'_>, value: i32) -> Result<()> {
    let v = value as i64;
    let ue = if v > 0 { 2 * v - 1 } else { -2 * v };
    if ue > u32::MAX as i64 {
        return Err(BitstreamError::ValueOverflow {
            value: value as u32 as u64,
            width: 32,
        });
    }
    write_ue(bw, ue as u32)
}
