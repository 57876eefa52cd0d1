#![allow(missing_docs)]

use bitstream_io::{BitWrite, BitWriter, LE};
use derive_more::Display;
use webpcodec_common::ensure_matches_attach;

use crate::huffman::HuffmanTable;
use crate::{CodecError, Error};

/// An LSB-first bit writer into an in-memory VP8L bitstream.
pub struct BitBufWriter {
    writer: BitWriter<Vec<u8>, LE>,
}

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "symbol `{}` has no code", _0)]
struct UnknownSymbol(u16);

//
// BitBufWriter impls
//

impl BitBufWriter {
    pub fn new() -> Self {
        Self { writer: BitWriter::new(Vec::new()) }
    }

    pub fn write_bit(&mut self, bit: bool) -> Result<(), Error> {
        Ok(self.writer.write_bit(bit)?)
    }

    /// Write the low `bits` bits of `value`, least significant bit first.
    pub fn write(&mut self, bits: u32, value: u32) -> Result<(), Error> {
        if bits == 0 {
            return Ok(());
        }
        Ok(self.writer.write(bits, value)?)
    }

    /// Write the code of `symbol` in `table`, first code bit first.
    pub fn write_huffman(&mut self, table: &HuffmanTable, symbol: u16) -> Result<(), Error> {
        ensure_matches_attach!(
            table.code(symbol),
            Some(code),
            CodecError::UnknownSymbol,
            UnknownSymbol(symbol),
        );
        if code.len == 0 {
            return Ok(());
        }
        let reversed = code.code.reverse_bits() >> (16 - u32::from(code.len));
        self.write(code.len.into(), reversed.into())
    }

    /// Pad to a byte boundary with zero bits and return the written bytes.
    pub fn into_bytes(mut self) -> Result<Vec<u8>, Error> {
        self.writer.byte_align()?;
        Ok(self.writer.into_writer())
    }
}

impl Default for BitBufWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use assert_matches::assert_matches;

    use super::*;
    use crate::parse::bitstream::{BitBufReader, CanonicalHuffmanTree};

    #[test]
    fn write_lsb_first() {
        let mut writer = BitBufWriter::new();
        writer.write_bit(true).unwrap();
        writer.write(3, 0b010).unwrap();
        writer.write(0, 0).unwrap();
        writer.write(6, 0b11_1010).unwrap();
        assert_eq!(writer.into_bytes().unwrap(), [0b1010_0101, 0b0000_0011]);
    }

    #[test]
    fn write_huffman_first_bit_first() {
        let table = HuffmanTable::from_code_lengths(&[1, 2, 2]).unwrap();
        let mut writer = BitBufWriter::new();
        for symbol in [2, 0, 1] {
            writer.write_huffman(&table, symbol).unwrap();
        }
        assert_eq!(writer.into_bytes().unwrap(), [0b0000_1011]);
    }

    #[test]
    fn write_huffman_single_symbol() {
        let table = HuffmanTable::from_code_lengths(&[0, 3]).unwrap();
        let mut writer = BitBufWriter::new();
        writer.write_huffman(&table, 1).unwrap();
        assert!(writer.into_bytes().unwrap().is_empty());
    }

    #[test]
    fn unknown_symbol() {
        let table = HuffmanTable::from_code_lengths(&[1, 0, 1]).unwrap();
        let mut writer = BitBufWriter::new();
        let err = writer.write_huffman(&table, 1).unwrap_err();
        assert_matches!(err, Error::Codec(err) => {
            assert_matches!(err.get_ref(), CodecError::UnknownSymbol, "{err:?}");
        });
    }

    #[test]
    fn huffman_round_trip() {
        let lengths = [3, 3, 3, 3, 3, 2, 4, 4];
        let table = HuffmanTable::from_code_lengths(&lengths).unwrap();
        let symbols = [5, 7, 0, 6, 3, 3, 1, 4, 2, 5];
        let mut writer = BitBufWriter::new();
        for symbol in symbols {
            writer.write_huffman(&table, symbol).unwrap();
        }
        writer.write(7, 0x55).unwrap();
        let data = writer.into_bytes().unwrap();

        let tree = CanonicalHuffmanTree::new(&table).unwrap();
        let mut reader = BitBufReader::new(&data);
        for symbol in symbols {
            assert_eq!(reader.read_huffman(&tree).unwrap(), symbol);
        }
        assert_eq!(reader.read::<u8>(7).unwrap(), 0x55);
    }
}
