//! Layout of the compressed file
//!
//! | offset | size | content |
//! |--------|------|---------|
//! | 0      | 1024 | count of each byte value 0..255, 4 bytes each |
//! | 1024   | 4    | number of meaningful bits in the payload |
//! | 1028   | rest | Huffman codes, MSB first, zero padded to a byte |
//!
//! * All integers are big endian
//! * The Huffman tree is not stored, it is rebuilt from the counts
//! * The payload length in bytes must be exactly the bit count rounded up

use std::io::{Read,Write,ErrorKind};
use crate::tools::freq_table::{FrequencyTable,NUM_SYMB,COUNT_BYTES};
use crate::{DYNERR,STDRESULT};

/// length of the frequency section
pub const FREQ_SECTION_LEN: usize = NUM_SYMB * COUNT_BYTES;
/// length of the section holding the bit count
pub const LENGTH_MARKER_LEN: usize = 4;
/// offset of the payload from the start of the container
pub const HEADER_LEN: usize = FREQ_SECTION_LEN + LENGTH_MARKER_LEN;

/// Everything in front of the payload
#[derive(Clone,Debug,PartialEq)]
pub struct Header {
    pub freq: FrequencyTable,
    /// logical length of the payload in bits, padding excluded
    pub bit_count: u32
}

impl Header {
    /// number of payload bytes that must follow this header
    pub fn payload_len(&self) -> u64 {
        (self.bit_count as u64 + 7) / 8
    }
}

/// Write the frequency section, then the length marker.
pub fn write_header<W: Write>(header: &Header,writer: &mut W) -> STDRESULT {
    writer.write_all(&header.freq.to_bytes())?;
    writer.write_all(&u32::to_be_bytes(header.bit_count))?;
    Ok(())
}

/// Read the frequency section, then the length marker.
/// A short read is reported as `Error::Truncated`.
pub fn read_header<R: Read>(reader: &mut R) -> Result<Header,DYNERR> {
    let mut buf: [u8;HEADER_LEN] = [0;HEADER_LEN];
    match reader.read_exact(&mut buf) {
        Ok(()) => {},
        Err(e) if e.kind()==ErrorKind::UnexpectedEof => {
            log::error!("container is shorter than its {} byte header",HEADER_LEN);
            return Err(Box::new(crate::Error::Truncated));
        },
        Err(e) => return Err(Box::new(e))
    }
    let freq = match FrequencyTable::from_bytes_be(&buf[0..FREQ_SECTION_LEN]) {
        Some(tab) => tab,
        None => return Err(Box::new(crate::Error::FileFormatMismatch))
    };
    let m = &buf[FREQ_SECTION_LEN..HEADER_LEN];
    let bit_count = u32::from_be_bytes([m[0],m[1],m[2],m[3]]);
    log::debug!("header: {} symbols, {} bits",freq.total(),bit_count);
    Ok(Header {
        freq,
        bit_count
    })
}

#[test]
fn header_layout() {
    let header = Header {
        freq: FrequencyTable::from_bytes("aaaabbbccd".as_bytes()).expect("counting failed"),
        bit_count: 19
    };
    let mut buf = Vec::new();
    write_header(&header,&mut buf).expect("write failed");
    assert_eq!(buf.len(),HEADER_LEN);
    assert_eq!(buf[4*0x61..4*0x65],hex::decode("00000004000000030000000200000001").unwrap());
    assert_eq!(buf[1024..1028],[0,0,0,19]);
    assert_eq!(header.payload_len(),3);
    let mut src = std::io::Cursor::new(buf);
    assert_eq!(read_header(&mut src).expect("read failed"),header);
}

#[test]
fn short_header() {
    let buf = vec![0;HEADER_LEN-1];
    let mut src = std::io::Cursor::new(buf);
    match read_header(&mut src) {
        Err(e) => assert!(matches!(e.downcast_ref::<crate::Error>(),Some(crate::Error::Truncated))),
        Ok(_) => panic!("short header was accepted")
    }
}
