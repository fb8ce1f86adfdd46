//! Byte frequency table.
//! The counts are what the container stores, the decoder rebuilds
//! the Huffman tree from them, so the table is persisted verbatim.

use crate::Error;

/// number of symbols in the alphabet
pub const NUM_SYMB: usize = 256;
/// bytes used to store one count
pub const COUNT_BYTES: usize = 4;

/// Occurrence count of every byte value, indexed by the byte value.
#[derive(Clone,Debug,PartialEq)]
pub struct FrequencyTable {
    freq: [u32;NUM_SYMB]
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self {
            freq: [0;NUM_SYMB]
        }
    }
    /// Count every byte in `dat`.
    /// A count that would not fit in 32 bits is an error rather than wrapping.
    pub fn from_bytes(dat: &[u8]) -> Result<Self,Error> {
        let mut ans = Self::new();
        for b in dat {
            ans.increment(*b)?;
        }
        Ok(ans)
    }
    /// add one occurrence of `symbol`
    pub fn increment(&mut self,symbol: u8) -> Result<(),Error> {
        let c = &mut self.freq[symbol as usize];
        *c = c.checked_add(1).ok_or(Error::FrequencyOverflow(symbol))?;
        Ok(())
    }
    /// Parse the table as stored in the container, 256 big endian u32.
    /// Returns None if the slice has the wrong length.
    pub fn from_bytes_be(buf: &[u8]) -> Option<Self> {
        if buf.len() != NUM_SYMB * COUNT_BYTES {
            return None;
        }
        let mut ans = Self::new();
        for (i,chunk) in buf.chunks_exact(COUNT_BYTES).enumerate() {
            ans.freq[i] = u32::from_be_bytes([chunk[0],chunk[1],chunk[2],chunk[3]]);
        }
        Some(ans)
    }
    /// Serialize as 256 big endian u32
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut ans = Vec::with_capacity(NUM_SYMB * COUNT_BYTES);
        for c in self.freq.iter() {
            ans.extend_from_slice(&c.to_be_bytes());
        }
        ans
    }
    pub fn count(&self,symbol: u8) -> u32 {
        self.freq[symbol as usize]
    }
    pub fn set(&mut self,symbol: u8,count: u32) {
        self.freq[symbol as usize] = count;
    }
    /// sum of all counts, equals the length of the data that was counted
    pub fn total(&self) -> u64 {
        self.freq.iter().map(|c| *c as u64).sum()
    }
    /// number of symbols with a non-zero count
    pub fn distinct(&self) -> usize {
        self.freq.iter().filter(|c| **c > 0).count()
    }
    /// iterate over (symbol,count) for symbols that appear, in increasing symbol order
    pub fn present(&self) -> impl Iterator<Item=(u8,u32)> + '_ {
        self.freq.iter().enumerate().filter(|(_,c)| **c > 0).map(|(s,c)| (s as u8,*c))
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

#[test]
fn counting() {
    let tab = FrequencyTable::from_bytes("aaaabbbccd".as_bytes()).expect("counting failed");
    assert_eq!(tab.count(b'a'),4);
    assert_eq!(tab.count(b'b'),3);
    assert_eq!(tab.count(b'c'),2);
    assert_eq!(tab.count(b'd'),1);
    assert_eq!(tab.count(b'e'),0);
    assert_eq!(tab.total(),10);
    assert_eq!(tab.distinct(),4);
    let present: Vec<(u8,u32)> = tab.present().collect();
    assert_eq!(present,vec![(b'a',4),(b'b',3),(b'c',2),(b'd',1)]);
}

#[test]
fn empty_input() {
    let tab = FrequencyTable::from_bytes(&[]).expect("counting failed");
    assert_eq!(tab.total(),0);
    assert_eq!(tab.distinct(),0);
    assert_eq!(tab.to_bytes(),vec![0;1024]);
}

#[test]
fn serialization() {
    let mut tab = FrequencyTable::new();
    tab.set(0,0x01020304);
    tab.set(255,7);
    let buf = tab.to_bytes();
    assert_eq!(buf.len(),1024);
    assert_eq!(buf[0..4],[1,2,3,4]);
    assert_eq!(buf[1020..1024],[0,0,0,7]);
    assert_eq!(FrequencyTable::from_bytes_be(&buf),Some(tab));
    assert_eq!(FrequencyTable::from_bytes_be(&buf[0..1020]),None);
}

#[test]
fn overflow_is_reported() {
    let mut tab = FrequencyTable::new();
    tab.set(b'x',u32::MAX - 1);
    tab.increment(b'x').expect("last count should fit");
    match tab.increment(b'x') {
        Err(e) => assert_eq!(e.to_string(),"count of symbol 120 overflows 32 bit counter"),
        Ok(()) => panic!("overflow was not reported")
    }
    assert_eq!(tab.count(b'x'),u32::MAX);
}
