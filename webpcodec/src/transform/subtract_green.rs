//! The subtract-green transform.

/// Subtract the green channel from the red and blue channels of every pixel, modulo 256.
pub fn apply(pixels: &mut [u32]) {
    for pixel in pixels {
        let green = (*pixel >> 8) & 0xff;
        let red_blue = (*pixel & 0x00ff00ff)
            .wrapping_add(0xff00ff00)
            .wrapping_sub(green << 16 | green);
        *pixel = (*pixel & 0xff00ff00) | (red_blue & 0x00ff00ff);
    }
}

/// Add the green channel back to the red and blue channels of every pixel, modulo 256.
pub fn inverse(pixels: &mut [u32]) {
    for pixel in pixels {
        let green = (*pixel >> 8) & 0xff;
        let red_blue = (*pixel & 0x00ff00ff).wrapping_add(green << 16 | green);
        *pixel = (*pixel & 0xff00ff00) | (red_blue & 0x00ff00ff);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transform::test::test_pixels;

    #[test]
    fn apply_wraps() {
        let mut pixels = [0x80_10_40_ff, 0xff_00_01_00];
        apply(&mut pixels);
        assert_eq!(pixels, [0x80_d0_40_bf, 0xff_ff_01_ff]);
    }

    #[test]
    fn invertible() {
        let original = test_pixels(13, 7);
        let mut pixels = original.clone();
        apply(&mut pixels);
        assert_ne!(pixels, original);
        inverse(&mut pixels);
        assert_eq!(pixels, original);
    }
}
