#![allow(missing_docs)]

//! Entropy estimates used to compare coding choices.

use crate::context::CodecContext;

/// The Shannon entropy of `counts` in bits, summed over all counted symbols.
pub fn shannon_bits(context: &CodecContext, counts: &[u32]) -> f64 {
    let mut total = 0;
    let mut sum = 0.0;
    for &count in counts.iter().filter(|&&count| count != 0) {
        total += count;
        sum += context.n_log2_n(count);
    }
    context.n_log2_n(total) - sum
}

/// The estimated size in bits of coding `counts` with a prefix code, including the code itself.
///
/// A code needs at least one bit per used symbol unless only one symbol is used, and storing the code costs a few bits
/// per used symbol.
pub fn prefix_coded_bits(context: &CodecContext, counts: &[u32]) -> f64 {
    let used_symbols = counts.iter().filter(|&&count| count != 0).count();
    match used_symbols {
        0 => 0.0,
        1 => 12.0,
        _ => {
            let total: u32 = counts.iter().sum();
            shannon_bits(context, counts).max(f64::from(total)) + 4.0 * used_symbols as f64 + 20.0
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn uniform() {
        let context = CodecContext::new();
        assert!((shannon_bits(&context, &[5, 5, 5, 5]) - 40.0).abs() < 1e-9);
        assert!((shannon_bits(&context, &[0, 7, 0]) - 0.0).abs() < 1e-9);
        assert_eq!(shannon_bits(&context, &[]), 0.0);
    }

    #[test]
    fn skewed_is_cheaper() {
        let context = CodecContext::new();
        let skewed = shannon_bits(&context, &[97, 1, 1, 1]);
        let uniform = shannon_bits(&context, &[25, 25, 25, 25]);
        assert!(skewed < uniform, "{skewed} >= {uniform}");
    }

    #[test]
    fn prefix_coded_single_symbol() {
        let context = CodecContext::new();
        assert_eq!(prefix_coded_bits(&context, &[0, 1000, 0]), 12.0);
        assert!(prefix_coded_bits(&context, &[1000, 1]) > 1001.0);
    }
}
