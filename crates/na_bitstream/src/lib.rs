//! Bitstream primitives for the codec decoders: an MSB/LSB-first bit reader
//! and writer, Golomb-family codes, canonical VLC lookup tables and Huffman
//! tree construction.

pub mod bitreader;
pub mod bitwriter;
pub mod error;
pub mod golomb;
pub mod huffman;
pub mod tables;
pub mod vlc;

pub use bitreader::{BitOrder, BitReader};
pub use bitwriter::BitWriter;
pub use error::{BitstreamError, Result};
pub use huffman::{build_code, build_tree, HuffmanCode, HuffmanFlags, HuffmanTree};
pub use vlc::{CodeEntry, SharedVlc, Vlc, VlcEntry, VlcFlags};
