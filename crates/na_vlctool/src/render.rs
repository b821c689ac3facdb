use itertools::Itertools;
use na_bitstream::{HuffmanCode, Vlc, VlcEntry};

fn code_string(code: u32, len: u8) -> String {
    format!("{:0width$b}", code, width = len as usize)
}

/// One row per coded symbol, in symbol order.
pub fn render_huffman(freqs: &[u32], code: &HuffmanCode) -> String {
    let header = format!("{:<6} {:>6} {:>4}  {}", "symbol", "count", "len", "code");
    let rows = code.entries().iter().sorted_by_key(|e| e.symbol).map(|e| {
        let count = freqs.get(e.symbol as usize).copied().unwrap_or(0);
        format!(
            "{:<6} {:>6} {:>4}  {}",
            e.symbol,
            count,
            e.len,
            code_string(e.code, e.len)
        )
    });
    std::iter::once(header).chain(rows).join("\n")
}

fn render_entry(entry: &VlcEntry) -> String {
    match *entry {
        VlcEntry::Invalid => "-".to_string(),
        VlcEntry::Leaf { symbol, len } => format!("sym {symbol} len {len}"),
        VlcEntry::Subtable { offset, bits } => format!("sub @{offset} bits {bits}"),
    }
}

/// Flattened lookup table, one line per slot.
pub fn render_table(vlc: &Vlc) -> String {
    let header = format!(
        "bits {} depth {} order {:?} entries {}",
        vlc.bits(),
        vlc.max_depth(),
        vlc.order(),
        vlc.len()
    );
    let rows = vlc
        .entries()
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{:<5} {}", i, render_entry(e)));
    std::iter::once(header).chain(rows).join("\n")
}
