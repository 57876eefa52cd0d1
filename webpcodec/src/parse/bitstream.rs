#![allow(missing_docs)]

use std::io::Cursor;
use std::num::NonZeroU32;

use bitstream_io::huffman::{compile_read_tree, ReadHuffmanTree};
use bitstream_io::{BitRead, BitReader, HuffmanRead, Numeric, LE};
use derive_more::Display;
use webpcodec_common::util::IoResultExt;
use webpcodec_common::{bail_attach, report_attach};

use crate::huffman::HuffmanTable;
use crate::{CodecError, Error};

/// An LSB-first bit reader over an in-memory VP8L bitstream.
pub struct BitBufReader<'a> {
    reader: BitReader<Cursor<&'a [u8]>, LE>,
    len_in_bits: u64,
}

/// A prefix code compiled into a tree for decoding.
pub struct CanonicalHuffmanTree {
    read_tree: Box<[ReadHuffmanTree<LE, u16>]>,
    single_symbol: Option<u16>,
    longest_code_len: u8,
}

#[derive(Display)]
#[display(fmt = "invalid lz77 prefix code `{}`", _0)]
struct InvalidLz77PrefixCode(u16);

#[derive(Display)]
#[display(fmt = "read of {} bits exceeds 32", _0)]
struct ReadTooWide(u32);

//
// BitBufReader impls
//

impl<'a> BitBufReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self { reader: BitReader::new(Cursor::new(input)), len_in_bits: input.len() as u64 * 8 }
    }

    pub fn read_bit(&mut self) -> Result<bool, Error> {
        self.reader.read_bit().map_eof(|_| truncated())
    }

    /// Read `bits` bits as an unsigned integer, the first bit read being the least significant.
    pub fn read<T: Numeric>(&mut self, bits: u32) -> Result<T, Error> {
        if bits == 0 {
            return Ok(T::default());
        }
        if bits > 32 {
            bail_attach!(CodecError::TruncatedStream, ReadTooWide(bits));
        }
        self.reader.read(bits).map_eof(|_| truncated())
    }

    pub fn read_huffman(&mut self, tree: &CanonicalHuffmanTree) -> Result<u16, Error> {
        // A lone symbol has a zero-length code.
        if let Some(symbol) = tree.single_symbol {
            return Ok(symbol);
        }
        self.reader.read_huffman(&tree.read_tree).map_eof(|_| truncated())
    }

    /// Read the value of an LZ77 length or distance whose prefix code is `prefix_code`, consuming its extra bits.
    pub fn read_lz77(&mut self, prefix_code: u16) -> Result<NonZeroU32, Error> {
        match prefix_code {
            0..=3 => Ok(NonZeroU32::MIN.saturating_add(prefix_code.into())),
            4..=39 => {
                let extra_bits = (u32::from(prefix_code) - 2) >> 1;
                let offset = (2 + (u32::from(prefix_code) & 1)) << extra_bits;
                Ok(NonZeroU32::MIN.saturating_add(offset + self.read::<u32>(extra_bits)?))
            }
            _ => bail_attach!(CodecError::InvalidBackReference, InvalidLz77PrefixCode(prefix_code)),
        }
    }

    /// The number of bits not yet consumed.
    pub fn remaining_bits(&mut self) -> u64 {
        let position = self.reader.position_in_bits().unwrap_or(self.len_in_bits);
        self.len_in_bits.saturating_sub(position)
    }
}

fn truncated() -> Error {
    Error::Codec(report_attach!(CodecError::TruncatedStream))
}

//
// CanonicalHuffmanTree impls
//

impl CanonicalHuffmanTree {
    pub fn new(table: &HuffmanTable) -> Result<Self, Error> {
        let symbols = match table.single_symbol() {
            Some(symbol) => vec![(symbol, vec![])],
            None => table
                .symbols()
                .map(|(symbol, code)| {
                    let bits = (0..code.len).rev().map(|bit| (code.code >> bit) as u8 & 1).collect();
                    (symbol, bits)
                })
                .collect(),
        };
        let read_tree =
            compile_read_tree(symbols).map_err(|err| report_attach!(CodecError::InvalidHuffmanTable, err))?;
        Ok(Self { read_tree, single_symbol: table.single_symbol(), longest_code_len: table.longest_code_len() })
    }

    pub fn from_code_lengths(code_lengths: &[u8]) -> Result<Self, Error> {
        Self::new(&HuffmanTable::from_code_lengths(code_lengths)?)
    }

    pub fn longest_code_len(&self) -> u8 {
        self.longest_code_len
    }
}
