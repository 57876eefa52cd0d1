//! Canonical prefix codes.
//!
//! A [`HuffmanTable`] is derived solely from an array of code lengths: symbols are ordered by `(length, symbol)` and
//! assigned consecutive codes, with the running code left-shifted whenever the length grows. The same table is used
//! by the decoder (to build a read tree) and by the encoder (to look up the code of each symbol).

use derive_more::Display;
use webpcodec_common::{bail_attach, ensure_attach, Result};

use crate::CodecError;

/// The longest code length allowed in a VP8L prefix code.
pub const MAX_CODE_LENGTH: u8 = 15;

/// A canonical prefix code, mapping symbols to [`HuffmanCode`]s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuffmanTable {
    code_lengths: Box<[u8]>,
    codes: Box<[HuffmanCode]>,
    single_symbol: Option<u16>,
}

/// The code assigned to a single symbol of a [`HuffmanTable`].
///
/// `code` holds the `len` code bits with the first bit transmitted in its most significant position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HuffmanCode {
    /// The code bits, most significant bit first.
    pub code: u16,

    /// The number of bits in the code.
    pub len: u8,
}

//
// private types
//

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "code length `{}` of symbol `{}` exceeds {}", _1, _0, MAX_CODE_LENGTH)]
struct CodeLengthTooLong(usize, u8);

#[derive(Clone, Copy, Debug, Display)]
#[display(fmt = "code space {} of {} used", _0, _1)]
struct CodeSpaceMismatch(u32, u32);

//
// HuffmanTable impls
//

impl HuffmanTable {
    /// Build the canonical prefix code described by `code_lengths`, where `code_lengths[symbol]` is the length of the
    /// code for `symbol`, or zero if `symbol` is unused.
    ///
    /// A single used symbol is assigned a zero-length code, and is thus encoded using no bits at all. Otherwise, the
    /// lengths must describe a complete prefix code: an over-subscribed or incomplete set of lengths is rejected with
    /// [`CodecError::InvalidHuffmanTable`], as is a set with no used symbols.
    pub fn from_code_lengths(code_lengths: &[u8]) -> Result<Self, CodecError> {
        let mut length_counts = [0u32; MAX_CODE_LENGTH as usize + 1];
        let mut last_symbol = None;
        for (symbol, &len) in code_lengths.iter().enumerate() {
            if len > MAX_CODE_LENGTH {
                bail_attach!(CodecError::InvalidHuffmanTable, CodeLengthTooLong(symbol, len));
            }
            if len != 0 {
                length_counts[len as usize] += 1;
                last_symbol = Some(symbol);
            }
        }
        let used_symbols: u32 = length_counts.iter().sum();

        let Some(last_symbol) = last_symbol else {
            bail_attach!(CodecError::InvalidHuffmanTable, "no symbols have a code");
        };

        let mut codes = vec![HuffmanCode::default(); code_lengths.len()].into_boxed_slice();
        if used_symbols == 1 {
            let single_symbol = Some(last_symbol as u16);
            return Ok(Self { code_lengths: code_lengths.into(), codes, single_symbol });
        }

        // Kraft sum, in units of the longest code length.
        let code_space = 1u32 << MAX_CODE_LENGTH;
        let used_space = (1..=MAX_CODE_LENGTH)
            .map(|len| length_counts[len as usize] << (MAX_CODE_LENGTH - len))
            .sum::<u32>();
        ensure_attach!(
            used_space == code_space,
            CodecError::InvalidHuffmanTable,
            CodeSpaceMismatch(used_space, code_space),
        );

        let mut next_code = [0u32; MAX_CODE_LENGTH as usize + 1];
        let mut code = 0;
        for len in 1..=MAX_CODE_LENGTH as usize {
            next_code[len] = code;
            code = (code + length_counts[len]) << 1;
        }

        for (symbol, &len) in code_lengths.iter().enumerate() {
            if len != 0 {
                let assigned = &mut next_code[len as usize];
                codes[symbol] = HuffmanCode { code: *assigned as u16, len };
                *assigned += 1;
            }
        }

        Ok(Self { code_lengths: code_lengths.into(), codes, single_symbol: None })
    }

    /// The number of symbols in the alphabet of this code, used or not.
    pub fn alphabet_size(&self) -> usize {
        self.code_lengths.len()
    }

    /// The code lengths this table was built from.
    pub fn code_lengths(&self) -> &[u8] {
        &self.code_lengths
    }

    /// The code of `symbol`, or `None` if `symbol` is unused.
    pub fn code(&self, symbol: u16) -> Option<HuffmanCode> {
        match self.code_lengths.get(symbol as usize) {
            Some(0) | None => None,
            Some(_) => Some(self.codes[symbol as usize]),
        }
    }

    /// If exactly one symbol is used, that symbol; its code is zero bits long.
    pub fn single_symbol(&self) -> Option<u16> {
        self.single_symbol
    }

    /// The length of the longest code in this table.
    pub fn longest_code_len(&self) -> u8 {
        self.symbols().map(|(_, code)| code.len).max().unwrap_or(0)
    }

    /// Iterate over all used symbols and their codes, in ascending symbol order.
    pub fn symbols(&self) -> impl Iterator<Item = (u16, HuffmanCode)> + '_ {
        self.code_lengths
            .iter()
            .zip(self.codes.iter())
            .enumerate()
            .filter(|(_, (&len, _))| len != 0)
            .map(|(symbol, (_, &code))| (symbol as u16, code))
    }
}
