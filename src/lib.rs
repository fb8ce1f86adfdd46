//! # huffcompress
//!
//! File compression with static Huffman coding over single bytes.
//!
//! * `huff` contains the compress/expand pipeline for streams, slices, and files
//! * `container` describes the fixed layout of the compressed file
//!
//! The frequency table and Huffman tree live in the internal `tools` module,
//! the parts that are useful on their own are re-exported here.

mod tools;
pub mod container;
pub mod huff;

pub use tools::freq_table::FrequencyTable;
pub use tools::static_huff::StaticHuffman;

type DYNERR = Box<dyn std::error::Error>;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// Compression Errors
#[derive(thiserror::Error,Debug)]
pub enum Error {
    #[error("file format mismatch")]
    FileFormatMismatch,
    #[error("file too large")]
    FileTooLarge,
    #[error("count of symbol {0} overflows 32 bit counter")]
    FrequencyOverflow(u8),
    #[error("compressed data is truncated")]
    Truncated,
    #[error("bit stream ends in the middle of a code")]
    IncompleteCode,
    #[error("frequency table is inconsistent with bit stream")]
    InconsistentTable
}

/// Options controlling compression
#[derive(Clone)]
pub struct Options {
    /// starting position in the input file
    pub in_offset: u64,
    /// starting position in the output file
    pub out_offset: u64,
    /// return error if input is larger
    pub max_file_size: u64
}

pub const STD_OPTIONS: Options = Options {
    in_offset: 0,
    out_offset: 0,
    max_file_size: u32::MAX as u64
};
