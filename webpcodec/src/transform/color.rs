//! The color transform.
//!
//! Each `1 << bits` square tile carries a [`ColorTransformElement`] of three signed multipliers, used to decorrelate
//! the red and blue channels from green (and blue from red).

use super::{alpha, argb, blue, green, red, subsample_size};

/// The multipliers of one color transform tile, in units of 1/32.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ColorTransformElement {
    /// Scales green into red.
    pub green_to_red: i8,
    /// Scales green into blue.
    pub green_to_blue: i8,
    /// Scales red into blue.
    pub red_to_blue: i8,
}

/// Multiplier search steps, coarse to fine.
const SEARCH_STEPS: [i8; 6] = [32, 16, 8, 4, 2, 1];

//
// ColorTransformElement impls
//

impl ColorTransformElement {
    /// Decode an element from a color transform sub-image pixel.
    ///
    /// `green_to_red` is stored in the blue channel, `green_to_blue` in the green channel, and `red_to_blue` in the
    /// red channel.
    pub fn from_argb(argb: u32) -> Self {
        Self { green_to_red: blue(argb) as i8, green_to_blue: green(argb) as i8, red_to_blue: red(argb) as i8 }
    }

    /// Encode this element as a color transform sub-image pixel.
    pub fn to_argb(self) -> u32 {
        argb(0xff, self.red_to_blue as u8, self.green_to_blue as u8, self.green_to_red as u8)
    }

    fn forward(self, pixel: u32) -> u32 {
        let (pixel_red, pixel_green) = (red(pixel), green(pixel));
        let new_red = i32::from(pixel_red) - delta(self.green_to_red, pixel_green);
        let new_blue =
            i32::from(blue(pixel)) - delta(self.green_to_blue, pixel_green) - delta(self.red_to_blue, pixel_red);
        argb(alpha(pixel), new_red as u8, pixel_green, new_blue as u8)
    }

    fn inverse(self, pixel: u32) -> u32 {
        let pixel_green = green(pixel);
        let new_red = (i32::from(red(pixel)) + delta(self.green_to_red, pixel_green)) as u8;
        let new_blue =
            i32::from(blue(pixel)) + delta(self.green_to_blue, pixel_green) + delta(self.red_to_blue, new_red);
        argb(alpha(pixel), new_red, pixel_green, new_blue as u8)
    }
}

fn delta(multiplier: i8, channel: u8) -> i32 {
    (i32::from(multiplier) * i32::from(channel as i8)) >> 5
}

/// Decorrelate the channels of every pixel using the element of its tile.
pub fn apply(pixels: &mut [u32], width: u32, bits: u8, elements: &[ColorTransformElement]) {
    for_each_tile_pixel(pixels, width, bits, elements, ColorTransformElement::forward)
}

/// Undo [`apply`].
pub fn inverse(pixels: &mut [u32], width: u32, bits: u8, elements: &[ColorTransformElement]) {
    for_each_tile_pixel(pixels, width, bits, elements, ColorTransformElement::inverse)
}

fn for_each_tile_pixel<F>(pixels: &mut [u32], width: u32, bits: u8, elements: &[ColorTransformElement], mut fun: F)
where
    F: FnMut(ColorTransformElement, u32) -> u32,
{
    let width = width as usize;
    let tiles_per_row = subsample_size(width as u32, bits) as usize;
    for (y, row) in pixels.chunks_mut(width).enumerate() {
        let tile_row = &elements[(y >> bits) * tiles_per_row..];
        for (x, pixel) in row.iter_mut().enumerate() {
            *pixel = fun(tile_row[x >> bits], *pixel);
        }
    }
}

/// Choose an element for each tile of size `1 << bits`, minimizing the entropy of the transformed red and blue
/// channels within the tile.
pub fn choose_elements(pixels: &[u32], width: u32, height: u32, bits: u8) -> Vec<ColorTransformElement> {
    let tiles_x = subsample_size(width, bits);
    let tiles_y = subsample_size(height, bits);
    let tile_size = 1u32 << bits;

    let mut elements = Vec::with_capacity((tiles_x * tiles_y) as usize);
    let mut tile_pixels = Vec::with_capacity((tile_size * tile_size) as usize);
    for tile_y in 0..tiles_y {
        for tile_x in 0..tiles_x {
            tile_pixels.clear();
            for y in tile_y * tile_size..((tile_y + 1) * tile_size).min(height) {
                let row_start = (y * width) as usize;
                let x_range = (tile_x * tile_size) as usize..((tile_x + 1) * tile_size).min(width) as usize;
                tile_pixels.extend_from_slice(&pixels[row_start + x_range.start..row_start + x_range.end]);
            }

            let mut element = ColorTransformElement::default();
            element.green_to_red = search(|green_to_red| {
                channel_cost(tile_pixels.iter().map(|&pixel| {
                    let pixel_red = i32::from(red(pixel)) - delta(green_to_red, green(pixel));
                    pixel_red as u8
                }))
            });
            element.green_to_blue = search(|green_to_blue| {
                channel_cost(tile_pixels.iter().map(|&pixel| {
                    let pixel_blue = i32::from(blue(pixel)) - delta(green_to_blue, green(pixel));
                    pixel_blue as u8
                }))
            });
            let green_to_blue = element.green_to_blue;
            element.red_to_blue = search(|red_to_blue| {
                channel_cost(tile_pixels.iter().map(|&pixel| {
                    let pixel_blue = i32::from(blue(pixel))
                        - delta(green_to_blue, green(pixel))
                        - delta(red_to_blue, red(pixel));
                    pixel_blue as u8
                }))
            });
            elements.push(element);
        }
    }
    elements
}

/// Find the multiplier minimizing `cost`, refining around the best candidate with shrinking steps.
fn search<F: FnMut(i8) -> f64>(mut cost: F) -> i8 {
    let mut best = 0i8;
    let mut best_cost = cost(best);
    for step in SEARCH_STEPS {
        let center = best;
        for candidate in [center.saturating_sub(step), center.saturating_add(step)] {
            if candidate != center {
                let candidate_cost = cost(candidate);
                if candidate_cost < best_cost {
                    best_cost = candidate_cost;
                    best = candidate;
                }
            }
        }
    }
    best
}

/// The Shannon entropy in bits of a channel's values, plus a small penalty for large values.
fn channel_cost<I: Iterator<Item = u8>>(values: I) -> f64 {
    let mut histogram = [0u32; 256];
    let mut total = 0u32;
    let mut magnitude = 0u64;
    for value in values {
        histogram[value as usize] += 1;
        total += 1;
        magnitude += u64::from(value.min(value.wrapping_neg()));
    }
    if total == 0 {
        return 0.0;
    }
    let total_f = f64::from(total);
    let entropy = histogram
        .iter()
        .filter(|&&count| count != 0)
        .map(|&count| {
            let count = f64::from(count);
            count * (total_f / count).log2()
        })
        .sum::<f64>();
    entropy + magnitude as f64 / 1024.0
}
