#![allow(missing_docs)]

//! Longest-match search over previously coded pixels.

use crate::lz77;

const MAX_LENGTH: usize = lz77::MAX_LENGTH as usize;

/// The best backward match found at each pixel position.
pub struct HashChain {
    matches: Vec<Match>,
}

/// A backward match `len` pixels long, `distance` pixels back. A zero `len` means no match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Match {
    pub distance: u32,
    pub len: u32,
}

/// The largest distance searched, leaving room for the plane codes below it.
pub const MAX_WINDOW_SIZE: usize = (1 << 20) - 120;

const HASH_BITS: u32 = 18;
const HASH_MULTIPLIER_HI: u32 = 0xc6a4a793;
const HASH_MULTIPLIER_LO: u32 = 0x5bd1e996;

const NO_POSITION: u32 = u32::MAX;

/// Matches at least this long end the chain walk early.
const GOOD_ENOUGH_LENGTH: usize = 256;

//
// HashChain impls
//

impl HashChain {
    /// Find the best match at every position of `pixels`, searching harder for higher `quality`.
    pub fn new(pixels: &[u32], width: u32, quality: u8) -> Self {
        let size = pixels.len();
        let mut matches = vec![Match::default(); size];
        if size <= 2 {
            return Self { matches };
        }

        // Link each position to the previous one whose pixel pair hashes the same.
        let mut chain = vec![NO_POSITION; size];
        let mut heads = vec![NO_POSITION; 1 << HASH_BITS];
        for (pos, pair) in pixels.windows(2).enumerate() {
            let head = &mut heads[hash_pair(pair[0], pair[1])];
            chain[pos] = *head;
            *head = pos as u32;
        }
        drop(heads);

        let width = width as usize;
        let iterations = 8 + usize::from(quality) * usize::from(quality) / 128;
        let window_size = window_size(quality, width);

        let mut base = size - 2;
        while base > 0 {
            let max_len = (size - 1 - base).min(MAX_LENGTH);
            let min_pos = base.saturating_sub(window_size);
            let good_enough_len = max_len.min(GOOD_ENOUGH_LENGTH);
            let mut remaining = iterations;
            let (mut best_len, mut best_distance) = (0, 0);

            // The pixels directly above and to the left are likely matches; try them first.
            for distance in [width, 1] {
                if distance <= base {
                    let len = match_len(pixels, base - distance, base, max_len);
                    if len > best_len {
                        best_len = len;
                        best_distance = distance;
                    }
                }
                remaining -= 1;
            }

            let mut pos = chain[base];
            if best_len == MAX_LENGTH {
                pos = NO_POSITION;
            }
            while pos != NO_POSITION && pos as usize >= min_pos && remaining > 1 {
                remaining -= 1;
                let candidate = pos as usize;
                if pixels[candidate + best_len] == pixels[base + best_len] {
                    let len = match_len(pixels, candidate, base, max_len);
                    if len > best_len {
                        best_len = len;
                        best_distance = base - candidate;
                        if best_len >= good_enough_len {
                            break;
                        }
                    }
                }
                pos = chain[candidate];
            }

            // While the matched intervals keep matching to the left, the same distance is the best match there too.
            let mut max_base = base;
            loop {
                matches[base] = Match { distance: best_distance as u32, len: best_len as u32 };
                base -= 1;
                if best_distance == 0 || base == 0 {
                    break;
                }
                if base < best_distance || pixels[base - best_distance] != pixels[base] {
                    break;
                }
                // A match at the length limit may have a closer equally long match.
                if best_len == MAX_LENGTH && best_distance != 1 && base + MAX_LENGTH < max_base {
                    break;
                }
                if best_len < MAX_LENGTH {
                    best_len += 1;
                    max_base = base;
                }
            }
        }
        Self { matches }
    }

    /// The best match at `pos`.
    pub fn best_match(&self, pos: usize) -> Match {
        self.matches.get(pos).copied().unwrap_or_default()
    }
}

fn hash_pair(first: u32, second: u32) -> usize {
    let key = second.wrapping_mul(HASH_MULTIPLIER_HI).wrapping_add(first.wrapping_mul(HASH_MULTIPLIER_LO));
    (key >> (32 - HASH_BITS)) as usize
}

fn window_size(quality: u8, width: usize) -> usize {
    let window_size = match quality {
        76.. => MAX_WINDOW_SIZE,
        51..=75 => width << 8,
        26..=50 => width << 6,
        _ => width << 4,
    };
    window_size.min(MAX_WINDOW_SIZE)
}

fn match_len(pixels: &[u32], source: usize, target: usize, max_len: usize) -> usize {
    pixels[source..].iter().zip(&pixels[target..]).take(max_len).take_while(|(source, target)| source == target).count()
}

#[cfg(test)]
mod test {
    use super::*;

    fn assert_matches_valid(pixels: &[u32], chain: &HashChain) {
        for pos in 0..pixels.len() {
            let Match { distance, len } = chain.best_match(pos);
            if len == 0 {
                continue;
            }
            let (distance, len) = (distance as usize, len as usize);
            assert!(distance >= 1 && distance <= pos, "distance {distance} at {pos}");
            assert!(pos + len <= pixels.len(), "length {len} at {pos}");
            assert_eq!(pixels[pos - distance..pos - distance + len], pixels[pos..pos + len], "at {pos}");
        }
    }

    #[test]
    fn repeated_rows() {
        let width = 7;
        let row = [1, 2, 3, 4, 5, 6, 7];
        let pixels: Vec<u32> = row.iter().cycle().take(width * 5).copied().collect();
        let chain = HashChain::new(&pixels, width as u32, 100);
        assert_matches_valid(&pixels, &chain);
        assert_eq!(chain.best_match(width), Match { distance: width as u32, len: (width * 4 - 1) as u32 });
    }

    #[test]
    fn solid_run() {
        let pixels = vec![9; 10_000];
        let chain = HashChain::new(&pixels, 100, 50);
        assert_matches_valid(&pixels, &chain);
        assert_eq!(chain.best_match(0).len, 0);
        assert_eq!(chain.best_match(1), Match { distance: 1, len: MAX_LENGTH as u32 });
    }

    #[test]
    fn no_repeats() {
        let pixels: Vec<u32> = (0..500).collect();
        let chain = HashChain::new(&pixels, 10, 100);
        assert!((0..pixels.len()).all(|pos| chain.best_match(pos).len == 0));
    }

    #[test]
    fn scattered_matches() {
        let pixels: Vec<u32> = (0..3000u32).map(|index| (index * 7919 % 13) ^ (index / 97)).collect();
        for quality in [0, 30, 60, 100] {
            let chain = HashChain::new(&pixels, 37, quality);
            assert_matches_valid(&pixels, &chain);
        }
    }
}
