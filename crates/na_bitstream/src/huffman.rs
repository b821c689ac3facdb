//! Huffman tree construction from symbol frequencies.
//!
//! Nodes live in one arena: the sorted leaves first, then the internal nodes
//! in merge order, so the root is always the last node. Codes are assigned by
//! walking the tree with `0` for the left child and `1` for the right one.

use bitflags::bitflags;
use log::{debug, error};

use crate::error::{BitstreamError, Result};
use crate::vlc::{CodeEntry, Vlc, VlcFlags};

/// Longest code the tree may produce.
pub const MAX_HUFFMAN_CODE_LENGTH: u32 = 31;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct HuffmanFlags: u32 {
        /// Give a code to zero-frequency symbols as well.
        const ZERO_COUNT = 0x1;
        /// A new internal node is placed before existing nodes of equal
        /// frequency instead of after them.
        const HNODE_FIRST = 0x2;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Leaf(usize),
    /// Children are arena indices.
    Internal { left: usize, right: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HuffmanNode {
    pub kind: NodeKind,
    pub count: u32,
}

#[derive(Clone, Debug)]
pub struct HuffmanTree {
    nodes: Vec<HuffmanNode>,
    root: usize,
}

/// Build the tree for `freqs`, where `freqs[i]` is the count of symbol `i`.
///
/// Without `ZERO_COUNT`, symbols with a zero count are left out of the tree
/// and get no code. Set the flag to give every symbol a code.
pub fn build_tree(freqs: &[u32], flags: HuffmanFlags) -> Result<HuffmanTree> {
    let sum: u64 = freqs.iter().map(|&c| c as u64).sum();
    if sum >> 31 != 0 {
        error!("too high symbol frequencies ({sum}), tree construction is not possible");
        return Err(BitstreamError::FrequencyOverflow { sum });
    }

    let zero_count = flags.contains(HuffmanFlags::ZERO_COUNT);
    let hnode_first = flags.contains(HuffmanFlags::HNODE_FIRST);

    let mut nodes: Vec<HuffmanNode> = Vec::with_capacity(freqs.len() * 2);
    nodes.extend(
        freqs
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0 || zero_count)
            .map(|(symbol, &count)| HuffmanNode {
                kind: NodeKind::Leaf(symbol),
                count,
            }),
    );
    let n = nodes.len();
    if n == 0 {
        return Err(BitstreamError::BuildFailure("no symbols to code".into()));
    }
    // stable: equal counts stay in symbol order
    nodes.sort_by_key(|node| node.count);
    if n == 1 {
        return Ok(HuffmanTree { nodes, root: 0 });
    }

    nodes.resize(2 * n - 1, nodes[0]);
    let mut cur_node = n;
    for i in (0..2 * n - 2).step_by(2) {
        let cur_count = nodes[i].count + nodes[i + 1].count;
        let mut j = cur_node;
        while j > i + 2 {
            let prev = nodes[j - 1].count;
            if cur_count > prev || (cur_count == prev && !hnode_first) {
                break;
            }
            nodes[j] = nodes[j - 1];
            j -= 1;
        }
        nodes[j] = HuffmanNode {
            kind: NodeKind::Internal {
                left: i,
                right: i + 1,
            },
            count: cur_count,
        };
        cur_node += 1;
    }
    debug!("huffman tree: {} symbols, {} nodes", n, nodes.len());
    Ok(HuffmanTree {
        root: nodes.len() - 1,
        nodes,
    })
}

/// Build the tree and read its codes in one go.
pub fn build_code(freqs: &[u32], flags: HuffmanFlags) -> Result<HuffmanCode> {
    build_tree(freqs, flags)?.codes()
}

impl HuffmanTree {
    pub fn nodes(&self) -> &[HuffmanNode] {
        &self.nodes
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn node(&self, index: usize) -> Option<&HuffmanNode> {
        self.nodes.get(index)
    }

    fn leftmost_leaf(&self, mut index: usize, mut len: u32) -> (usize, u32) {
        loop {
            match self.nodes[index].kind {
                NodeKind::Leaf(symbol) => return (symbol, len),
                NodeKind::Internal { left, .. } => {
                    index = left;
                    len += 1;
                }
            }
        }
    }

    /// Assign codes, left subtree first.
    ///
    /// A tree holding a single symbol gives it the one-bit code `0`.
    pub fn codes(&self) -> Result<HuffmanCode> {
        let mut entries = Vec::with_capacity(self.nodes.len() / 2 + 1);
        if let NodeKind::Leaf(symbol) = self.nodes[self.root].kind {
            entries.push(CodeEntry::new(0, 1, symbol as i32));
            return Ok(HuffmanCode { entries });
        }

        let mut stack = vec![(self.root, 0u32, 0u32)];
        while let Some((index, code, len)) = stack.pop() {
            match self.nodes[index].kind {
                NodeKind::Leaf(symbol) => {
                    entries.push(CodeEntry::new(code, len as u8, symbol as i32));
                }
                NodeKind::Internal { .. } if len >= MAX_HUFFMAN_CODE_LENGTH => {
                    let (symbol, len) = self.leftmost_leaf(index, len);
                    return Err(BitstreamError::CodeLengthOverflow { symbol, len });
                }
                NodeKind::Internal { left, right } => {
                    stack.push((right, (code << 1) | 1, len + 1));
                    stack.push((left, code << 1, len + 1));
                }
            }
        }
        Ok(HuffmanCode { entries })
    }
}

/// Codes in tree order (left to right).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuffmanCode {
    entries: Vec<CodeEntry>,
}

impl HuffmanCode {
    pub fn entries(&self) -> &[CodeEntry] {
        &self.entries
    }

    pub fn get(&self, symbol: usize) -> Option<&CodeEntry> {
        self.entries.iter().find(|e| e.symbol == symbol as i32)
    }

    pub fn length_of(&self, symbol: usize) -> Option<u8> {
        self.get(symbol).map(|e| e.len)
    }

    pub fn max_length(&self) -> u32 {
        self.entries.iter().map(|e| e.len as u32).max().unwrap_or(0)
    }

    pub fn is_prefix_free(&self) -> bool {
        self.entries.iter().enumerate().all(|(i, a)| {
            self.entries.iter().skip(i + 1).all(|b| {
                let n = a.len.min(b.len) as u32;
                (a.code >> (a.len as u32 - n)) != (b.code >> (b.len as u32 - n))
            })
        })
    }

    /// Lookup table for these codes, `bits` wide at the root.
    pub fn to_vlc(&self, bits: u32, flags: VlcFlags) -> Result<Vlc> {
        Vlc::build(bits, &self.entries, flags)
    }
}
