//! Building blocks for the static Huffman pipeline.

pub mod freq_table;
pub mod static_huff;
