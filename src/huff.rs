//! Static Huffman Compression
//!
//! Each byte is replaced by a code derived from the byte counts of the whole input.
//! The counts are stored in front of the payload, see the `container` module.
//!
//! * This transforms buffers, the whole input is read before anything is written
//! * Counts are limited to 32 bits, as is the length of the payload in bits

use bit_vec::BitVec;
use std::io::{Cursor,Read,Write,Seek,SeekFrom,BufWriter};
use std::path::Path;
use crate::container::{self,Header,HEADER_LEN};
use crate::tools::freq_table::FrequencyTable;
use crate::tools::static_huff::StaticHuffman;
use crate::{DYNERR,Options,STD_OPTIONS};

/// Main compression function.
/// `expanded_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `compressed_out` is an object with `Write` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.
pub fn compress<R,W>(expanded_in: &mut R, compressed_out: &mut W, opt: &Options) -> Result<(u64,u64),DYNERR>
where R: Read + Seek, W: Write + Seek {
    let mut expanded_length = expanded_in.seek(SeekFrom::End(0))?;
    if opt.in_offset > expanded_length {
        return Err(Box::new(crate::Error::FileFormatMismatch));
    }
    expanded_length -= opt.in_offset;
    if expanded_length > opt.max_file_size {
        return Err(Box::new(crate::Error::FileTooLarge));
    }
    expanded_in.seek(SeekFrom::Start(opt.in_offset))?;
    let mut ibuf = Vec::new();
    expanded_in.read_to_end(&mut ibuf)?;

    log::debug!("counting {} bytes",ibuf.len());
    let freq = FrequencyTable::from_bytes(&ibuf)?;
    let huff = StaticHuffman::create(&freq);
    let bit_count = match u32::try_from(huff.encoded_bits()) {
        Ok(n) => n,
        Err(_) => {
            log::error!("{} bits will not fit in the length marker",huff.encoded_bits());
            return Err(Box::new(crate::Error::FileTooLarge));
        }
    };
    let mut bits = BitVec::new();
    huff.encode(&ibuf,&mut bits)?;
    log::debug!("encoded {} bytes into {} bits",ibuf.len(),bits.len());

    let header = Header {
        freq,
        bit_count
    };
    let mut writer = BufWriter::new(compressed_out);
    writer.seek(SeekFrom::Start(opt.out_offset))?;
    container::write_header(&header,&mut writer)?;
    writer.write_all(&bits.to_bytes())?;
    writer.flush()?;
    Ok((expanded_length,HEADER_LEN as u64 + header.payload_len()))
}

/// Main decompression function.
/// `compressed_in` is an object with `Read` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<&[u8]>`.
/// `expanded_out` is an object with `Write` and `Seek` traits, usually `std::fs::File`, or `std::io::Cursor<Vec<u8>>`.
/// Returns (in_size,out_size) or error.  Nothing is written unless the whole container decodes.
pub fn expand<R,W>(compressed_in: &mut R, expanded_out: &mut W, opt: &Options) -> Result<(u64,u64),DYNERR>
where R: Read + Seek, W: Write + Seek {
    let mut compressed_size = compressed_in.seek(SeekFrom::End(0))?;
    if opt.in_offset > compressed_size {
        return Err(Box::new(crate::Error::FileFormatMismatch));
    }
    compressed_size -= opt.in_offset;
    compressed_in.seek(SeekFrom::Start(opt.in_offset))?;

    let header = container::read_header(compressed_in)?;
    let expanded_length = header.freq.total();
    if expanded_length > opt.max_file_size {
        return Err(Box::new(crate::Error::FileTooLarge));
    }
    let payload_len = compressed_size - HEADER_LEN as u64;
    if payload_len < header.payload_len() {
        log::error!("payload has {} bytes, {} bits need {}",payload_len,header.bit_count,header.payload_len());
        return Err(Box::new(crate::Error::Truncated));
    }
    if payload_len > header.payload_len() {
        log::error!("payload has {} bytes, {} bits need {}",payload_len,header.bit_count,header.payload_len());
        return Err(Box::new(crate::Error::FileFormatMismatch));
    }

    let huff = StaticHuffman::create(&header.freq);
    if huff.encoded_bits() != header.bit_count as u64 {
        log::error!("table implies {} bits, header has {}",huff.encoded_bits(),header.bit_count);
        return Err(Box::new(crate::Error::InconsistentTable));
    }
    let mut payload = Vec::new();
    compressed_in.read_to_end(&mut payload)?;
    let bits = BitVec::from_bytes(&payload);
    let obuf = huff.decode(&bits,header.bit_count as usize)?;
    if FrequencyTable::from_bytes(&obuf)? != header.freq {
        log::error!("decoded symbols do not match the table");
        return Err(Box::new(crate::Error::InconsistentTable));
    }
    log::debug!("decoded {} bits into {} bytes",header.bit_count,obuf.len());

    let mut writer = BufWriter::new(expanded_out);
    writer.seek(SeekFrom::Start(opt.out_offset))?;
    writer.write_all(&obuf)?;
    writer.flush()?;
    Ok((compressed_size,expanded_length))
}

/// Convenience function, calls `compress` with a slice returning a Vec
pub fn compress_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    compress(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

/// Convenience function, calls `expand` with a slice returning a Vec
pub fn expand_slice(slice: &[u8],opt: &Options) -> Result<Vec<u8>,DYNERR> {
    let mut src = Cursor::new(slice);
    let mut ans: Cursor<Vec<u8>> = Cursor::new(Vec::new());
    expand(&mut src,&mut ans,opt)?;
    Ok(ans.into_inner())
}

type Transform = fn(&mut std::fs::File,&mut std::fs::File,&Options) -> Result<(u64,u64),DYNERR>;

/// Run `transform` into a temporary file next to `path_out`, which replaces
/// `path_out` only if the transform succeeds.
fn transform_file(path_in: &Path,path_out: &Path,transform: Transform) -> Result<(u64,u64),DYNERR> {
    let mut in_file = std::fs::File::open(path_in)?;
    let dir = match path_out.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new(".")
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    let sizes = transform(&mut in_file,tmp.as_file_mut(),&STD_OPTIONS)?;
    tmp.persist(path_out)?;
    Ok(sizes)
}

/// Compress the file at `path_in` into a new file at `path_out`.
pub fn compress_file<P: AsRef<Path>,Q: AsRef<Path>>(path_in: P,path_out: Q) -> Result<(u64,u64),DYNERR> {
    transform_file(path_in.as_ref(),path_out.as_ref(),compress::<std::fs::File,std::fs::File>)
}

/// Expand the file at `path_in` into a new file at `path_out`.
pub fn expand_file<P: AsRef<Path>,Q: AsRef<Path>>(path_in: P,path_out: Q) -> Result<(u64,u64),DYNERR> {
    transform_file(path_in.as_ref(),path_out.as_ref(),expand::<std::fs::File,std::fs::File>)
}

// *************** TESTS *****************

#[cfg(test)]
fn is_err(res: Result<Vec<u8>,DYNERR>,expected: fn(&crate::Error) -> bool) -> bool {
    match res {
        Err(e) => e.downcast_ref::<crate::Error>().map_or(false,expected),
        Ok(_) => false
    }
}

#[test]
fn compression_works() {
    let test_data = "aaaabbbccd".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed.len(),HEADER_LEN + 3);
    let mut expected = vec![0;1024];
    for (s,c) in [(b'a',4),(b'b',3),(b'c',2),(b'd',1)] {
        expected[4*s as usize + 3] = c;
    }
    expected.append(&mut hex::decode("00000013 0ABFC0".replace(" ","")).unwrap());
    assert_eq!(compressed,expected);
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data.to_vec(),expanded);

    let test_data: Vec<u8> = (0..=255).chain((0..4096).map(|i: u32| (i*i % 251) as u8)).collect();
    let compressed = compress_slice(&test_data,&STD_OPTIONS).expect("compression failed");
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data,expanded);
}

#[test]
fn determinism() {
    let test_data = "the quick brown fox jumps over the lazy dog".as_bytes();
    let c1 = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let c2 = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    assert_eq!(c1,c2);
}

#[test]
fn counts_sum_to_length() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let header = container::read_header(&mut Cursor::new(&compressed)).expect("bad header");
    assert_eq!(header.freq.total(),test_data.len() as u64);
}

#[test]
fn empty_input() {
    let compressed = compress_slice(&[],&STD_OPTIONS).expect("compression failed");
    assert_eq!(compressed,vec![0;HEADER_LEN]);
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert!(expanded.is_empty());
}

#[test]
fn single_symbol() {
    let test_data = vec![0x41;1000];
    let compressed = compress_slice(&test_data,&STD_OPTIONS).expect("compression failed");
    // one bit per symbol
    assert_eq!(compressed.len(),HEADER_LEN + 125);
    assert_eq!(compressed[1024..1028],[0,0,0x03,0xe8]);
    let expanded = expand_slice(&compressed,&STD_OPTIONS).expect("expansion failed");
    assert_eq!(test_data,expanded);
}

#[test]
fn truncation_is_detected() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    let res = expand_slice(&compressed[0..compressed.len()-1],&STD_OPTIONS);
    assert!(is_err(res,|e| matches!(e,crate::Error::Truncated)));
    let res = expand_slice(&compressed[0..HEADER_LEN-2],&STD_OPTIONS);
    assert!(is_err(res,|e| matches!(e,crate::Error::Truncated)));
    let mut extended = compressed.clone();
    extended.push(0);
    let res = expand_slice(&extended,&STD_OPTIONS);
    assert!(is_err(res,|e| matches!(e,crate::Error::FileFormatMismatch)));
}

#[test]
fn inconsistent_table() {
    let test_data = "aaaabbbccd".as_bytes();
    let compressed = compress_slice(test_data,&STD_OPTIONS).expect("compression failed");
    // bump the count of `a`, the table now implies 20 bits
    let mut bad = compressed.clone();
    bad[4*0x61 + 3] = 5;
    let res = expand_slice(&bad,&STD_OPTIONS);
    assert!(is_err(res,|e| matches!(e,crate::Error::InconsistentTable)));
    // empty table with non-zero length
    let mut bad = vec![0;HEADER_LEN];
    bad[HEADER_LEN-1] = 8;
    bad.push(0);
    let res = expand_slice(&bad,&STD_OPTIONS);
    assert!(is_err(res,|e| matches!(e,crate::Error::InconsistentTable)));
}

#[test]
fn offsets() {
    let mut opt = STD_OPTIONS;
    opt.in_offset = 4;
    opt.out_offset = 2;
    let test_data = "SKIPaaaabbbccd".as_bytes();
    let compressed = compress_slice(test_data,&opt).expect("compression failed");
    assert_eq!(compressed.len(),2 + HEADER_LEN + 3);
    assert_eq!(compressed[0..2],[0,0]);
    let mut opt = STD_OPTIONS;
    opt.in_offset = 2;
    let expanded = expand_slice(&compressed,&opt).expect("expansion failed");
    assert_eq!(expanded,"aaaabbbccd".as_bytes().to_vec());
}

#[test]
fn size_limit() {
    let mut opt = STD_OPTIONS;
    opt.max_file_size = 5;
    let res = compress_slice("aaaabbbccd".as_bytes(),&opt);
    assert!(is_err(res,|e| matches!(e,crate::Error::FileTooLarge)));
}
