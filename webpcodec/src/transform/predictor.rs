//! The predictor transform.
//!
//! The image is divided into `1 << bits` square tiles, each of which selects one [`PredictorMode`]. Every pixel is
//! stored as the channel-wise difference between its value and the value predicted from its already-coded
//! neighbours.

use derive_more::Display;

use super::{add_pixels, alpha, argb, blue, green, red, sub_pixels, subsample_size};

/// The prediction modes of the predictor transform.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum PredictorMode {
    #[display(fmt = "black")]
    Black = 0,
    #[display(fmt = "L")]
    Left = 1,
    #[display(fmt = "T")]
    Top = 2,
    #[display(fmt = "TR")]
    TopRight = 3,
    #[display(fmt = "TL")]
    TopLeft = 4,
    #[display(fmt = "avg(avg(L, TR), T)")]
    AverageLeftTopRightTop = 5,
    #[display(fmt = "avg(L, TL)")]
    AverageLeftTopLeft = 6,
    #[display(fmt = "avg(L, T)")]
    AverageLeftTop = 7,
    #[display(fmt = "avg(TL, T)")]
    AverageTopLeftTop = 8,
    #[display(fmt = "avg(T, TR)")]
    AverageTopTopRight = 9,
    #[display(fmt = "avg(avg(L, TL), avg(T, TR))")]
    AverageLeftTopLeftTopTopRight = 10,
    #[display(fmt = "select")]
    Select = 11,
    #[display(fmt = "clamp add subtract full")]
    ClampAddSubtractFull = 12,
    #[display(fmt = "clamp add subtract half")]
    ClampAddSubtractHalf = 13,
}

/// A predictor mode value outside of `0..=13`.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[display(fmt = "invalid predictor mode `{}`", _0)]
pub struct InvalidPredictorMode(pub u8);

/// The neighbours of a pixel used for prediction.
#[derive(Clone, Copy, Debug)]
struct Neighbors {
    left: u32,
    top: u32,
    top_right: u32,
    top_left: u32,
}

const ARGB_BLACK: u32 = 0xff000000;

//
// PredictorMode impls
//

impl PredictorMode {
    /// All predictor modes, in coded order.
    pub const ALL: [Self; 14] = [
        Self::Black,
        Self::Left,
        Self::Top,
        Self::TopRight,
        Self::TopLeft,
        Self::AverageLeftTopRightTop,
        Self::AverageLeftTopLeft,
        Self::AverageLeftTop,
        Self::AverageTopLeftTop,
        Self::AverageTopTopRight,
        Self::AverageLeftTopLeftTopTopRight,
        Self::Select,
        Self::ClampAddSubtractFull,
        Self::ClampAddSubtractHalf,
    ];

    /// The mode stored in the green channel of a predictor sub-image pixel.
    pub fn from_argb(argb: u32) -> Result<Self, InvalidPredictorMode> {
        Self::try_from(green(argb))
    }

    /// The predictor sub-image pixel storing this mode.
    pub fn to_argb(self) -> u32 {
        ARGB_BLACK | (self as u32) << 8
    }

    fn predict(self, neighbors: Neighbors) -> u32 {
        let Neighbors { left, top, top_right, top_left } = neighbors;
        match self {
            Self::Black => ARGB_BLACK,
            Self::Left => left,
            Self::Top => top,
            Self::TopRight => top_right,
            Self::TopLeft => top_left,
            Self::AverageLeftTopRightTop => average2(average2(left, top_right), top),
            Self::AverageLeftTopLeft => average2(left, top_left),
            Self::AverageLeftTop => average2(left, top),
            Self::AverageTopLeftTop => average2(top_left, top),
            Self::AverageTopTopRight => average2(top, top_right),
            Self::AverageLeftTopLeftTopTopRight => average2(average2(left, top_left), average2(top, top_right)),
            Self::Select => select(left, top, top_left),
            Self::ClampAddSubtractFull => clamp_add_subtract_full(left, top, top_left),
            Self::ClampAddSubtractHalf => clamp_add_subtract_half(average2(left, top), top_left),
        }
    }
}

impl TryFrom<u8> for PredictorMode {
    type Error = InvalidPredictorMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL.get(usize::from(value)).copied().ok_or(InvalidPredictorMode(value))
    }
}

/// Replace every pixel with its residual against the prediction of its tile's mode.
///
/// `modes` holds one mode per tile, row-major, for tiles of size `1 << bits`.
pub fn apply(pixels: &mut [u32], width: u32, bits: u8, modes: &[PredictorMode]) {
    let width = width as usize;
    // Residuals are computed against original neighbours, all of which precede the pixel in raster order (the top
    // right pixel of the last column wraps to the start of the current row). Working backwards keeps them intact.
    for index in (0..pixels.len()).rev() {
        let prediction = prediction(pixels, width, index, bits, modes);
        pixels[index] = sub_pixels(pixels[index], prediction);
    }
}

/// Reconstruct every pixel from its residual, undoing [`apply`].
pub fn inverse(pixels: &mut [u32], width: u32, bits: u8, modes: &[PredictorMode]) {
    let width = width as usize;
    for index in 0..pixels.len() {
        let prediction = prediction(pixels, width, index, bits, modes);
        pixels[index] = add_pixels(pixels[index], prediction);
    }
}

/// Choose a mode for each tile of size `1 << bits`, minimizing the magnitude of the tile's residuals.
pub fn choose_modes(pixels: &[u32], width: u32, height: u32, bits: u8) -> Vec<PredictorMode> {
    let tiles_x = subsample_size(width, bits);
    let tiles_y = subsample_size(height, bits);
    let tile_size = 1u32 << bits;
    let width_usize = width as usize;

    let mut modes = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for tile_y in 0..tiles_y {
        for tile_x in 0..tiles_x {
            let x_range = tile_x * tile_size..((tile_x + 1) * tile_size).min(width);
            let y_range = tile_y * tile_size..((tile_y + 1) * tile_size).min(height);

            let mut best_mode = PredictorMode::Black;
            let mut best_cost = u64::MAX;
            for mode in PredictorMode::ALL {
                let mut cost = 0;
                for y in y_range.clone().filter(|&y| y > 0) {
                    for x in x_range.clone().filter(|&x| x > 0) {
                        let index = y as usize * width_usize + x as usize;
                        let neighbors = neighbors(pixels, width_usize, index);
                        cost += residual_cost(sub_pixels(pixels[index], mode.predict(neighbors)));
                    }
                    if cost >= best_cost {
                        break;
                    }
                }
                if cost < best_cost {
                    best_cost = cost;
                    best_mode = mode;
                }
            }
            modes.push(best_mode);
        }
    }
    modes
}

fn prediction(pixels: &[u32], width: usize, index: usize, bits: u8, modes: &[PredictorMode]) -> u32 {
    let (x, y) = (index % width, index / width);
    match (x, y) {
        (0, 0) => ARGB_BLACK,
        (_, 0) => pixels[index - 1],
        (0, _) => pixels[index - width],
        _ => {
            let tiles_per_row = (width + (1 << bits) - 1) >> bits;
            let mode = modes[(y >> bits) * tiles_per_row + (x >> bits)];
            mode.predict(neighbors(pixels, width, index))
        }
    }
}

/// The neighbours of a pixel not in the first row or column.
fn neighbors(pixels: &[u32], width: usize, index: usize) -> Neighbors {
    Neighbors {
        left: pixels[index - 1],
        top: pixels[index - width],
        top_right: pixels[index - width + 1],
        top_left: pixels[index - width - 1],
    }
}

fn residual_cost(residual: u32) -> u64 {
    residual
        .to_le_bytes()
        .iter()
        .map(|&byte| u64::from(byte.min(byte.wrapping_neg())))
        .sum()
}

fn average2(a: u32, b: u32) -> u32 {
    (((a ^ b) & 0xfefefefe) >> 1) + (a & b)
}

fn select(left: u32, top: u32, top_left: u32) -> u32 {
    let channels = |pixel| [alpha(pixel), red(pixel), green(pixel), blue(pixel)];
    let (left_channels, top_channels, top_left_channels) = (channels(left), channels(top), channels(top_left));
    let mut top_distance = 0;
    let mut left_distance = 0;
    for channel in 0..4 {
        let top_left_channel = i32::from(top_left_channels[channel]);
        left_distance += (i32::from(left_channels[channel]) - top_left_channel).abs();
        top_distance += (i32::from(top_channels[channel]) - top_left_channel).abs();
    }
    if left_distance <= top_distance {
        top
    } else {
        left
    }
}

fn clamp_add_subtract_full(left: u32, top: u32, top_left: u32) -> u32 {
    let channel = |shift: u32| {
        let [left, top, top_left] = [left, top, top_left].map(|pixel| ((pixel >> shift) & 0xff) as i32);
        (left + top - top_left).clamp(0, 255) as u8
    };
    argb(channel(24), channel(16), channel(8), channel(0))
}

fn clamp_add_subtract_half(average: u32, top_left: u32) -> u32 {
    let channel = |shift: u32| {
        let average = ((average >> shift) & 0xff) as i32;
        let top_left = ((top_left >> shift) & 0xff) as i32;
        (average + (average - top_left) / 2).clamp(0, 255) as u8
    };
    argb(channel(24), channel(16), channel(8), channel(0))
}
