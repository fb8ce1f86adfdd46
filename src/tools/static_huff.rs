//! Module to perform the static Huffman coding.
//! This is used by the `huff` module.
//!
//! The tree is built from a frequency table with the greedy algorithm, and is never
//! stored: the decoder rebuilds the identical tree from the same table.  For this to
//! work the order in which nodes are merged has to be fully determined by the table.
//!
//! * Leaves are created in increasing symbol order and get sequence numbers 0,1,2,...
//! * Each new branch gets the next sequence number
//! * The heap pops the lowest frequency, ties go to the lowest sequence number
//! * The first node popped becomes son 0 (bit 0), the second son 1 (bit 1)
//!
//! Bits are packed MSB first, the final byte is padded with zeros.

use bit_vec::BitVec;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use crate::tools::freq_table::{FrequencyTable,NUM_SYMB};
use crate::Error;

/// Node in the pool, leaves have a symbol and no sons, branches the opposite.
#[derive(Clone,Debug)]
struct Node {
    freq: u64,
    symbol: Option<u8>,
    son: [usize;2]
}

/// Components for static Huffman coding.
/// Nodes are stored in a pool, leaves first, then branches in order of creation,
/// so the root, if any, is always the last node.
pub struct StaticHuffman {
    nodes: Vec<Node>,
    /// map from symbols (index) to codes
    codes: Vec<Option<BitVec>>
}

impl StaticHuffman {
    /// Build the tree and the code table from the frequencies.
    pub fn create(tab: &FrequencyTable) -> Self {
        let mut ans = Self {
            nodes: Vec::new(),
            codes: vec![None;NUM_SYMB]
        };
        // min-heap keyed on (frequency,sequence), sequence is the node index
        let mut heap = BinaryHeap::new();
        for (symbol,count) in tab.present() {
            heap.push(Reverse((count as u64,ans.nodes.len())));
            ans.nodes.push(Node {
                freq: count as u64,
                symbol: Some(symbol),
                son: [0,0]
            });
        }
        log::debug!("building tree with {} leaves",ans.nodes.len());
        while heap.len() > 1 {
            // cannot panic, the heap has at least 2 nodes
            let Reverse((f0,n0)) = heap.pop().unwrap();
            let Reverse((f1,n1)) = heap.pop().unwrap();
            let freq = f0 + f1;
            heap.push(Reverse((freq,ans.nodes.len())));
            ans.nodes.push(Node {
                freq,
                symbol: None,
                son: [n0,n1]
            });
        }
        ans.assign_codes();
        ans
    }
    fn root(&self) -> Option<usize> {
        match self.nodes.len() {
            0 => None,
            n => Some(n - 1)
        }
    }
    /// Walk the tree and record the path to each leaf.
    fn assign_codes(&mut self) {
        let root = match self.root() {
            Some(r) => r,
            None => return
        };
        if let Some(symbol) = self.nodes[root].symbol {
            // lone leaf still needs one bit per symbol
            self.codes[symbol as usize] = Some(BitVec::from_elem(1,false));
            return;
        }
        let mut stack = vec![(root,BitVec::new())];
        while let Some((curs,path)) = stack.pop() {
            match self.nodes[curs].symbol {
                Some(symbol) => {
                    log::trace!("symbol {} gets code {:?}",symbol,path);
                    self.codes[symbol as usize] = Some(path);
                },
                None => {
                    for bit in [true,false] {
                        let mut next = path.clone();
                        next.push(bit);
                        stack.push((self.nodes[curs].son[bit as usize],next));
                    }
                }
            }
        }
    }
    /// code of `symbol`, None if the symbol does not appear
    pub fn code(&self,symbol: u8) -> Option<&BitVec> {
        self.codes[symbol as usize].as_ref()
    }
    /// code length of every symbol, 0 if the symbol does not appear
    pub fn code_lengths(&self) -> Vec<usize> {
        self.codes.iter().map(|c| c.as_ref().map_or(0,|v| v.len())).collect()
    }
    /// number of bits the encoding of data matching the table will occupy
    pub fn encoded_bits(&self) -> u64 {
        self.nodes.iter()
            .filter_map(|n| n.symbol.map(|s| n.freq * self.codes[s as usize].as_ref().map_or(0,|c| c.len()) as u64))
            .sum()
    }
    /// total frequency at the root, i.e., the number of symbols the tree accounts for
    pub fn total(&self) -> u64 {
        self.root().map_or(0,|r| self.nodes[r].freq)
    }
    /// Append the code of every byte to `obuf`.
    /// Returns error if a byte has no code, i.e., the tree was built from a different table.
    pub fn encode(&self,ibuf: &[u8],obuf: &mut BitVec) -> Result<(),Error> {
        for b in ibuf {
            match &self.codes[*b as usize] {
                Some(code) => obuf.extend(code.iter()),
                None => {
                    log::error!("symbol {} is missing from the table",b);
                    return Err(Error::InconsistentTable);
                }
            }
        }
        Ok(())
    }
    /// Decode exactly `bit_count` bits of `ibuf`, anything after is padding.
    pub fn decode(&self,ibuf: &BitVec,bit_count: usize) -> Result<Vec<u8>,Error> {
        let mut ans = Vec::new();
        if bit_count > ibuf.len() {
            return Err(Error::Truncated);
        }
        let root = match self.root() {
            Some(r) => r,
            None if bit_count == 0 => return Ok(ans),
            None => {
                log::error!("empty tree but {} bits to decode",bit_count);
                return Err(Error::InconsistentTable);
            }
        };
        if let Some(symbol) = self.nodes[root].symbol {
            for bit in ibuf.iter().take(bit_count) {
                if bit {
                    log::error!("single symbol tree has no code starting with 1");
                    return Err(Error::InconsistentTable);
                }
                ans.push(symbol);
            }
            return Ok(ans);
        }
        let mut curs = root;
        for bit in ibuf.iter().take(bit_count) {
            curs = self.nodes[curs].son[bit as usize];
            if let Some(symbol) = self.nodes[curs].symbol {
                ans.push(symbol);
                curs = root;
            }
        }
        if curs != root {
            return Err(Error::IncompleteCode);
        }
        Ok(ans)
    }
}

#[cfg(test)]
fn code_str(huff: &StaticHuffman,symbol: u8) -> String {
    huff.code(symbol).expect("missing code").iter().map(|b| if b {'1'} else {'0'}).collect()
}

#[test]
fn tree_is_deterministic() {
    let tab = FrequencyTable::from_bytes("aaaabbbccd".as_bytes()).expect("counting failed");
    let huff = StaticHuffman::create(&tab);
    // d+c merge first, then b with (dc) since b is older, then a with the rest
    assert_eq!(code_str(&huff,b'a'),"0");
    assert_eq!(code_str(&huff,b'b'),"10");
    assert_eq!(code_str(&huff,b'd'),"110");
    assert_eq!(code_str(&huff,b'c'),"111");
    assert_eq!(huff.code(b'e'),None);
    assert_eq!(huff.encoded_bits(),19);
    assert_eq!(huff.total(),10);
}

#[test]
fn packing_works() {
    let test_data = "aaaabbbccd".as_bytes();
    let tab = FrequencyTable::from_bytes(test_data).expect("counting failed");
    let huff = StaticHuffman::create(&tab);
    let mut bits = BitVec::new();
    huff.encode(test_data,&mut bits).expect("encoding failed");
    assert_eq!(bits.len(),19);
    assert_eq!(bits.to_bytes(),vec![0x0a,0xbf,0xc0]);
}

#[test]
fn prefix_free() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let tab = FrequencyTable::from_bytes(test_data).expect("counting failed");
    let huff = StaticHuffman::create(&tab);
    let codes: Vec<&BitVec> = (0..=255).filter_map(|s| huff.code(s)).collect();
    assert_eq!(codes.len(),tab.distinct());
    for (i,c1) in codes.iter().enumerate() {
        for (j,c2) in codes.iter().enumerate() {
            if i != j && c1.len() <= c2.len() {
                assert!(c1.iter().zip(c2.iter()).any(|(x,y)| x != y),"code {} is a prefix of code {}",i,j);
            }
        }
    }
}

#[test]
fn frequent_symbols_get_short_codes() {
    let mut tab = FrequencyTable::new();
    for (s,c) in [(0,1),(1,2),(2,4),(3,8),(4,16),(5,32)] {
        tab.set(s,c);
    }
    let huff = StaticHuffman::create(&tab);
    let lens = huff.code_lengths();
    assert_eq!(lens[0..6],[5,5,4,3,2,1]);
    assert!(lens[6..].iter().all(|l| *l == 0));
}

#[test]
fn single_symbol() {
    let test_data = vec![0x41;1000];
    let tab = FrequencyTable::from_bytes(&test_data).expect("counting failed");
    let huff = StaticHuffman::create(&tab);
    assert_eq!(code_str(&huff,0x41),"0");
    let mut bits = BitVec::new();
    huff.encode(&test_data,&mut bits).expect("encoding failed");
    assert_eq!(bits.len(),1000);
    assert_eq!(huff.decode(&bits,1000).expect("decoding failed"),test_data);
    bits.set(10,true);
    assert!(huff.decode(&bits,1000).is_err());
}

#[test]
fn empty_tree() {
    let huff = StaticHuffman::create(&FrequencyTable::new());
    assert_eq!(huff.encoded_bits(),0);
    assert!(huff.decode(&BitVec::new(),0).expect("decoding failed").is_empty());
    assert!(matches!(huff.decode(&BitVec::from_elem(8,false),3),Err(Error::InconsistentTable)));
}

#[test]
fn invertibility() {
    let test_data = "I am Sam. Sam I am. I do not like this Sam I am.\n".as_bytes();
    let tab = FrequencyTable::from_bytes(test_data).expect("counting failed");
    let huff = StaticHuffman::create(&tab);
    let mut bits = BitVec::new();
    huff.encode(test_data,&mut bits).expect("encoding failed");
    let bit_count = bits.len();
    assert_eq!(bit_count as u64,huff.encoded_bits());
    let padded = BitVec::from_bytes(&bits.to_bytes());
    let expanded = huff.decode(&padded,bit_count).expect("decoding failed");
    assert_eq!(test_data.to_vec(),expanded);
}

#[test]
fn stops_mid_code() {
    let test_data = "aaaabbbccd".as_bytes();
    let tab = FrequencyTable::from_bytes(test_data).expect("counting failed");
    let huff = StaticHuffman::create(&tab);
    let bits = BitVec::from_bytes(&[0x0a,0xbf,0xc0]);
    // the last code `110` is cut after 2 bits
    assert!(matches!(huff.decode(&bits,18),Err(Error::IncompleteCode)));
    assert!(matches!(huff.decode(&bits,25),Err(Error::Truncated)));
}
