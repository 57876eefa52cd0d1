#![allow(missing_docs)]

//! Near-lossless pre-quantization.
//!
//! Pixels which differ noticeably from one of their four neighbors have each channel rounded to a multiple of a power
//! of two, which makes them more likely to repeat. Smooth areas and the image border are left untouched.

/// Images smaller than this in both dimensions are left exact.
const MIN_DIMENSION: u32 = 64;

/// Quantize `pixels` in place for a near-lossless `level` below 100; lower levels quantize more.
pub fn apply(pixels: &mut [u32], width: u32, height: u32, level: u8) {
    if level >= 100 || (width < MIN_DIMENSION && height < MIN_DIMENSION) || height < 3 {
        return;
    }
    let max_bits = 5 - level / 20;
    log::debug!("near-lossless level {level}: quantizing up to {max_bits} bits");

    let width = width as usize;
    let mut source = pixels.to_vec();
    for bits in (1..=max_bits).rev() {
        source.copy_from_slice(pixels);
        quantize_pass(&source, pixels, width, bits);
    }
}

fn quantize_pass(source: &[u32], target: &mut [u32], width: usize, bits: u8) {
    let limit = 1 << bits;
    let rows: Vec<&[u32]> = source.chunks(width).collect();
    for (y, target_row) in target.chunks_mut(width).enumerate().skip(1).take(rows.len().saturating_sub(2)) {
        let (above, row, below) = (rows[y - 1], rows[y], rows[y + 1]);
        for x in 1..width.saturating_sub(1) {
            let pixel = row[x];
            let smooth = [row[x - 1], row[x + 1], above[x], below[x]]
                .into_iter()
                .all(|neighbor| is_near(pixel, neighbor, limit));
            if !smooth {
                target_row[x] = quantize_argb(pixel, bits);
            }
        }
    }
}

fn is_near(pixel: u32, neighbor: u32, limit: i32) -> bool {
    (0..4).all(|channel| {
        let shift = channel * 8;
        let delta = ((pixel >> shift) & 0xff) as i32 - ((neighbor >> shift) & 0xff) as i32;
        delta.abs() < limit
    })
}

fn quantize_argb(argb: u32, bits: u8) -> u32 {
    (0..4).fold(0, |quantized, channel| {
        let shift = channel * 8;
        quantized | u32::from(quantize(((argb >> shift) & 0xff) as u8, bits)) << shift
    })
}

/// Round `value` to the nearest multiple of `1 << bits`, ties to the even multiple, saturating at 255.
fn quantize(value: u8, bits: u8) -> u8 {
    let value = u32::from(value);
    let mask = (1 << bits) - 1;
    let biased = value + (mask >> 1) + ((value >> bits) & 1);
    match biased {
        0..=0xff => (biased & !mask) as u8,
        _ => 0xff,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quantize_rounding() {
        assert_eq!(quantize(1, 1), 0);
        assert_eq!(quantize(2, 1), 2);
        assert_eq!(quantize(3, 1), 4);
        assert_eq!(quantize(255, 1), 255);
        assert_eq!(quantize(2, 2), 0);
        assert_eq!(quantize(3, 2), 4);
        assert_eq!(quantize(253, 2), 252);
        assert_eq!(quantize(255, 2), 255);
        assert_eq!(quantize(0x37, 5), 0x40);
    }

    #[test]
    fn exact_levels_untouched() {
        let (width, height) = (80, 80);
        let original: Vec<u32> = (0..width * height).map(|index: u32| index.wrapping_mul(0x9e3779b9)).collect();
        for (level, width, height) in [(100, width, height), (0, 63, 63), (0, 3000, 2)] {
            let mut pixels = original[..(width * height) as usize].to_vec();
            apply(&mut pixels, width, height, level);
            assert_eq!(pixels, original[..(width * height) as usize], "level {level} {width}x{height}");
        }
    }

    #[test]
    fn noise_quantized_borders_kept() {
        let (width, height) = (64, 8);
        let original: Vec<u32> = (0..width * height).map(|index: u32| index.wrapping_mul(0x9e3779b9)).collect();
        let mut pixels = original.clone();
        apply(&mut pixels, width, height, 0);
        assert_ne!(pixels, original);
        let width = width as usize;
        assert_eq!(pixels[..width], original[..width]);
        assert_eq!(pixels[pixels.len() - width..], original[original.len() - width..]);
        for row in 1..height as usize - 1 {
            assert_eq!(pixels[row * width], original[row * width]);
            assert_eq!(pixels[row * width + width - 1], original[row * width + width - 1]);
        }
    }

    #[test]
    fn smooth_areas_kept() {
        let (width, height) = (64, 64);
        let original: Vec<u32> = (0..width * height).map(|index| 0xff000000 | (index % width) << 8).collect();
        let mut pixels = original.clone();
        apply(&mut pixels, width, height, 40);
        assert_eq!(pixels, original);
    }
}
