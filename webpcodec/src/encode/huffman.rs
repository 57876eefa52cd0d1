#![allow(missing_docs)]

//! Building and writing length-limited prefix codes from symbol histograms.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::huffman::{HuffmanTable, MAX_CODE_LENGTH};
use crate::parse::lossless::{CODE_LENGTH_CODE_ORDER, NUM_CODE_LENGTH_CODES};
use crate::Error;

use super::bitstream::BitBufWriter;

/// The longest code length allowed in the code length code.
pub const MAX_CODE_LENGTH_CODE_LENGTH: u8 = 7;

/// Code length symbols which repeat the previous non-zero length, or zero.
const REPEAT_PREVIOUS: u8 = 16;
const REPEAT_ZERO_SHORT: u8 = 17;
const REPEAT_ZERO_LONG: u8 = 18;

/// The code length implicitly preceding the first code length token.
const INITIAL_PREVIOUS_CODE_LENGTH: u8 = 8;

/// One token of a run-length coded code length array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CodeLengthToken {
    symbol: u8,
    extra_value: u8,
}

//
// public functions
//

/// Compute code lengths of at most `max_len` bits for the symbols of `histogram`.
///
/// Unused symbols get length zero. A histogram with one or two used symbols gets codes of length one, and an empty
/// histogram gets all-zero lengths.
pub fn code_lengths(histogram: &[u32], max_len: u8) -> Vec<u8> {
    let mut lengths = vec![0; histogram.len()];

    let mut counts = histogram.to_vec();
    optimize_for_rle(&mut counts);

    let symbols: Vec<(usize, u32)> =
        counts.iter().enumerate().filter(|(_, &count)| count != 0).map(|(symbol, &count)| (symbol, count)).collect();
    match symbols.len() {
        0 => return lengths,
        1 | 2 => {
            for &(symbol, _) in &symbols {
                lengths[symbol] = 1;
            }
            return lengths;
        }
        _ => {}
    }

    // Flatten the tree by raising the smallest counts until it fits in `max_len` bits.
    let mut count_min = 1;
    while tree_depths(&symbols, count_min, &mut lengths) > max_len {
        count_min *= 2;
    }
    lengths
}

/// Write the prefix code for `histogram` and return the table used to write its symbols.
pub fn write_prefix_code(writer: &mut BitBufWriter, histogram: &[u32]) -> Result<HuffmanTable, Error> {
    let mut lengths = code_lengths(histogram, MAX_CODE_LENGTH);
    if lengths.iter().all(|&len| len == 0) {
        // Nothing is ever written with this code, but the bitstream still needs one.
        lengths[0] = 1;
    }

    let used_symbols: Vec<usize> =
        lengths.iter().enumerate().filter(|(_, &len)| len != 0).map(|(symbol, _)| symbol).collect();
    if used_symbols.len() <= 2 && used_symbols.iter().all(|&symbol| symbol < 256) {
        write_simple_code(writer, &used_symbols)?;
    } else {
        write_normal_code(writer, &lengths)?;
    }
    Ok(HuffmanTable::from_code_lengths(&lengths)?)
}

//
// private functions
//

/// Smooth `counts` so that the resulting code lengths contain longer runs, which code more compactly.
///
/// Runs of similar counts are replaced by their average. A used symbol is never made unused.
fn optimize_for_rle(counts: &mut [u32]) {
    let Some(len) = counts.iter().rposition(|&count| count != 0).map(|last| last + 1) else {
        return;
    };

    // Mark the counts which already form a long enough run to be coded as repetitions.
    let mut good_for_rle = vec![false; len];
    let mut symbol = counts[0];
    let mut stride = 0;
    for index in 0..=len {
        if index == len || counts[index] != symbol {
            if (symbol == 0 && stride >= 5) || (symbol != 0 && stride >= 7) {
                good_for_rle[index - stride..index].fill(true);
            }
            stride = 1;
            if index != len {
                symbol = counts[index];
            }
        } else {
            stride += 1;
        }
    }

    let mut stride = 0u32;
    let mut limit = counts[0];
    let mut sum = 0u32;
    for index in 0..=len {
        let run_ends = index == len
            || good_for_rle[index]
            || (index != 0 && good_for_rle[index - 1])
            || counts[index].abs_diff(limit) >= 4;
        if run_ends {
            if stride >= 4 || (stride >= 3 && sum == 0) {
                let count = match sum {
                    0 => 0,
                    _ => ((sum + stride / 2) / stride).max(1),
                };
                counts[index - stride as usize..index].fill(count);
            }
            stride = 0;
            sum = 0;
            limit = if index + 3 < len {
                (counts[index] + counts[index + 1] + counts[index + 2] + counts[index + 3] + 2) / 4
            } else if index < len {
                counts[index]
            } else {
                0
            };
        }
        stride += 1;
        if index != len {
            sum += counts[index];
            if stride >= 4 {
                limit = (sum + stride / 2) / stride;
            }
        }
    }
}

/// Build a Huffman tree over `symbols`, with every count raised to at least `count_min`, storing each symbol's depth
/// in `lengths`. Returns the maximum depth.
fn tree_depths(symbols: &[(usize, u32)], count_min: u32, lengths: &mut [u8]) -> u8 {
    let leaf_count = symbols.len();

    // Lowest weight first; among equal weights leaves with higher symbols first, then older internal nodes.
    let mut heap: BinaryHeap<_> = symbols
        .iter()
        .enumerate()
        .map(|(node, &(symbol, count))| Reverse((u64::from(count.max(count_min)), Reverse(symbol as i32), node)))
        .collect();
    let mut children = Vec::with_capacity(leaf_count);
    while let Some(Reverse((first_weight, _, first))) = heap.pop() {
        let Some(Reverse((second_weight, _, second))) = heap.pop() else {
            break;
        };
        children.push((first, second));
        heap.push(Reverse((first_weight + second_weight, Reverse(-1), leaf_count + children.len() - 1)));
    }

    // Internal nodes are created after their children, so walking them backwards visits parents first.
    let mut depths = vec![0u8; leaf_count + children.len()];
    for (internal, &(left, right)) in children.iter().enumerate().rev() {
        let depth = depths[leaf_count + internal].saturating_add(1);
        depths[left] = depth;
        depths[right] = depth;
    }

    let mut max_depth = 0;
    for (&(symbol, _), &depth) in symbols.iter().zip(&depths) {
        lengths[symbol] = depth;
        max_depth = max_depth.max(depth);
    }
    max_depth
}

fn write_simple_code(writer: &mut BitBufWriter, symbols: &[usize]) -> Result<(), Error> {
    writer.write_bit(true)?;
    writer.write_bit(symbols.len() == 2)?;
    let first_symbol = symbols.first().copied().unwrap_or(0) as u32;
    if first_symbol <= 1 {
        writer.write_bit(false)?;
        writer.write(1, first_symbol)?;
    } else {
        writer.write_bit(true)?;
        writer.write(8, first_symbol)?;
    }
    if let Some(&second_symbol) = symbols.get(1) {
        writer.write(8, second_symbol as u32)?;
    }
    Ok(())
}

fn write_normal_code(writer: &mut BitBufWriter, lengths: &[u8]) -> Result<(), Error> {
    let tokens = code_length_tokens(lengths);

    let mut token_histogram = [0u32; NUM_CODE_LENGTH_CODES];
    for token in &tokens {
        token_histogram[usize::from(token.symbol)] += 1;
    }
    let token_lengths = code_lengths(&token_histogram, MAX_CODE_LENGTH_CODE_LENGTH);
    let token_table = HuffmanTable::from_code_lengths(&token_lengths)?;
    log::debug!("code length code lengths: {token_lengths:?}");

    writer.write_bit(false)?;
    let stored_count = CODE_LENGTH_CODE_ORDER
        .iter()
        .rposition(|&symbol| token_lengths[usize::from(symbol)] != 0)
        .map_or(4, |last| (last + 1).max(4));
    writer.write(4, stored_count as u32 - 4)?;
    for &symbol in &CODE_LENGTH_CODE_ORDER[..stored_count] {
        writer.write(3, token_lengths[usize::from(symbol)].into())?;
    }

    // Trailing zero-length tokens may be left implicit by giving an explicit token count.
    let token_bits = |token: &CodeLengthToken| token_table.code(token.symbol.into()).map_or(0, |code| code.len);
    let trailing_zero_bits: u32 = tokens
        .iter()
        .rev()
        .take_while(|token| matches!(token.symbol, 0 | REPEAT_ZERO_SHORT | REPEAT_ZERO_LONG))
        .map(|token| u32::from(token_bits(token)) + u32::from(extra_bits(token.symbol)))
        .sum();
    let trailing_zero_tokens =
        tokens.iter().rev().take_while(|token| matches!(token.symbol, 0 | REPEAT_ZERO_SHORT | REPEAT_ZERO_LONG)).count();
    let trimmed_len = tokens.len() - trailing_zero_tokens;

    let write_token_count = trimmed_len > 1 && trailing_zero_bits > 12;
    let written_tokens = if write_token_count { trimmed_len } else { tokens.len() };
    writer.write_bit(write_token_count)?;
    if write_token_count {
        let max_tokens = (trimmed_len - 2) as u32;
        if max_tokens == 0 {
            writer.write(3, 0)?;
            writer.write(2, 0)?;
        } else {
            let bits = 32 - max_tokens.leading_zeros();
            let bit_pairs = (bits + 1) / 2;
            writer.write(3, bit_pairs - 1)?;
            writer.write(2 * bit_pairs, max_tokens)?;
        }
    }

    for token in &tokens[..written_tokens] {
        writer.write_huffman(&token_table, token.symbol.into())?;
        writer.write(extra_bits(token.symbol).into(), token.extra_value.into())?;
    }
    Ok(())
}

fn extra_bits(symbol: u8) -> u8 {
    match symbol {
        REPEAT_PREVIOUS => 2,
        REPEAT_ZERO_SHORT => 3,
        REPEAT_ZERO_LONG => 7,
        _ => 0,
    }
}

/// Run-length code `lengths` with the repeat symbols of the code length alphabet.
fn code_length_tokens(lengths: &[u8]) -> Vec<CodeLengthToken> {
    let mut tokens = Vec::with_capacity(lengths.len());
    let mut previous = INITIAL_PREVIOUS_CODE_LENGTH;
    let mut index = 0;
    while index < lengths.len() {
        let value = lengths[index];
        let run = lengths[index..].iter().take_while(|&&len| len == value).count();
        if value == 0 {
            push_zero_run(&mut tokens, run);
        } else {
            push_value_run(&mut tokens, value, previous, run);
            previous = value;
        }
        index += run;
    }
    tokens
}

fn push_zero_run(tokens: &mut Vec<CodeLengthToken>, mut run: usize) {
    while run >= 1 {
        match run {
            0..=2 => {
                tokens.extend((0..run).map(|_| CodeLengthToken { symbol: 0, extra_value: 0 }));
                return;
            }
            3..=10 => {
                tokens.push(CodeLengthToken { symbol: REPEAT_ZERO_SHORT, extra_value: (run - 3) as u8 });
                return;
            }
            11..=138 => {
                tokens.push(CodeLengthToken { symbol: REPEAT_ZERO_LONG, extra_value: (run - 11) as u8 });
                return;
            }
            _ => {
                tokens.push(CodeLengthToken { symbol: REPEAT_ZERO_LONG, extra_value: 0x7f });
                run -= 138;
            }
        }
    }
}

fn push_value_run(tokens: &mut Vec<CodeLengthToken>, value: u8, previous: u8, mut run: usize) {
    if value != previous {
        tokens.push(CodeLengthToken { symbol: value, extra_value: 0 });
        run -= 1;
    }
    while run >= 1 {
        match run {
            0..=2 => {
                tokens.extend((0..run).map(|_| CodeLengthToken { symbol: value, extra_value: 0 }));
                return;
            }
            3..=6 => {
                tokens.push(CodeLengthToken { symbol: REPEAT_PREVIOUS, extra_value: (run - 3) as u8 });
                return;
            }
            _ => {
                tokens.push(CodeLengthToken { symbol: REPEAT_PREVIOUS, extra_value: 3 });
                run -= 6;
            }
        }
    }
}
