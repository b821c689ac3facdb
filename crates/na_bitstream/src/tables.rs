//! Static code tables shared by decoders.

use crate::error::{BitstreamError, Result};
use crate::vlc::{SharedVlc, Vlc, VlcFlags};

pub const BLOCK_TYPE_VLC_BITS: u32 = 5;

/// 4X Movie block type codes as `(code, len)`, indexed by
/// `[version][table][block type]`. A zero length marks a block type the
/// table cannot produce.
pub static BLOCK_TYPE_TAB: [[[(u8, u8); 7]; 4]; 2] = [
    [
        [(0, 1), (2, 2), (6, 3), (14, 4), (30, 5), (31, 5), (0, 0)],
        [(0, 1), (0, 0), (2, 2), (6, 3), (14, 4), (15, 4), (0, 0)],
        [(0, 1), (2, 2), (0, 0), (6, 3), (14, 4), (15, 4), (0, 0)],
        [(0, 1), (0, 0), (0, 0), (2, 2), (6, 3), (14, 4), (15, 4)],
    ],
    [
        [(1, 2), (4, 3), (5, 3), (0, 2), (6, 3), (7, 3), (0, 0)],
        [(1, 2), (0, 0), (2, 2), (0, 2), (6, 3), (7, 3), (0, 0)],
        [(1, 2), (2, 2), (0, 0), (0, 2), (6, 3), (7, 3), (0, 0)],
        [(1, 2), (0, 0), (0, 0), (0, 2), (2, 2), (6, 3), (7, 3)],
    ],
];

static BLOCK_TYPE_VLC: [SharedVlc; 8] = [SharedVlc::UNINIT; 8];

fn build_block_type_vlc(version: usize, index: usize) -> Result<Vlc> {
    let tab = &BLOCK_TYPE_TAB[version][index];
    let codes: Vec<u32> = tab.iter().map(|&(code, _)| code as u32).collect();
    let lens: Vec<u8> = tab.iter().map(|&(_, len)| len).collect();
    Vlc::from_codes(BLOCK_TYPE_VLC_BITS, &lens, &codes, None, VlcFlags::empty())
}

/// Block type table `index` (0..4) of code set `version` (0 or 1), built on
/// first use. Every symbol is reachable in one lookup.
pub fn block_type_vlc(version: usize, index: usize) -> Result<&'static Vlc> {
    if version >= BLOCK_TYPE_TAB.len() || index >= BLOCK_TYPE_TAB[0].len() {
        return Err(BitstreamError::BuildFailure(format!(
            "no block type table {version}/{index}"
        )));
    }
    BLOCK_TYPE_VLC[version * 4 + index].get_or_build(|| build_block_type_vlc(version, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitreader::BitReader;

    #[test]
    fn all_tables_build_in_one_level() {
        for version in 0..2 {
            for index in 0..4 {
                let vlc = block_type_vlc(version, index).unwrap();
                assert_eq!(vlc.max_depth(), 1);
                assert_eq!(vlc.len(), 32);
            }
        }
        assert!(block_type_vlc(2, 0).is_err());
        assert!(block_type_vlc(0, 4).is_err());
    }

    #[test]
    fn same_table_is_returned() {
        let a = block_type_vlc(1, 2).unwrap();
        let b = block_type_vlc(1, 2).unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn version_one_codes() {
        let vlc = block_type_vlc(1, 0).unwrap();
        // 01 -> 0, 100 -> 1, 00 -> 3, 111 -> 5
        let data = [0b0110_0001, 0b1100_0000];
        let mut br = BitReader::new(&data);
        assert_eq!(vlc.decode(&mut br).unwrap(), 0);
        assert_eq!(vlc.decode(&mut br).unwrap(), 1);
        assert_eq!(vlc.decode(&mut br).unwrap(), 3);
        assert_eq!(vlc.decode(&mut br).unwrap(), 5);
        assert_eq!(br.position(), 10);
    }
}
