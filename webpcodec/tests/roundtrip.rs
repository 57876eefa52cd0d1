use webpcodec::{decode, encode, Config, Image};
use webpcodec_common_test::{gradient_image, init_logger, noise_image, palette_image, TestImage};
use webpcodec_test::{libwebp_assert_decodes_to, libwebp_encode};

fn image(test_image: TestImage) -> Image {
    let TestImage { width, height, data } = test_image;
    Image::new(width, height, data).unwrap()
}

fn exact() -> Config {
    Config::builder().exact(true).build()
}

fn assert_round_trip(image: &Image, config: &Config) -> Vec<u8> {
    let output = encode(image, config).unwrap();
    let decoded = decode(&output).unwrap();
    assert!(decoded == *image, "round trip mismatch for {image:?}");
    libwebp_assert_decodes_to(&output, image.width, image.height, &image.data);
    output
}

#[test]
fn single_red_pixel() {
    init_logger();
    let red = Image::new(1, 1, vec![255, 0, 0, 255]).unwrap();
    let output = encode(&red, &Config::default()).unwrap();
    assert_eq!(decode(&output).unwrap().data, [255, 0, 0, 255]);
}

#[test]
fn gradients() {
    init_logger();
    for (width, height) in [(1, 1), (1, 37), (37, 1), (16, 16), (63, 17), (130, 70)] {
        for alpha in [false, true] {
            assert_round_trip(&image(gradient_image(width, height, alpha)), &exact());
        }
    }
}

#[test]
fn noise() {
    init_logger();
    for seed in 1..4 {
        assert_round_trip(&image(noise_image(29, 31, seed)), &exact());
    }
}

#[test]
fn palettes() {
    init_logger();
    for colors in [1, 2, 3, 4, 5, 16, 17, 255, 256, 257] {
        assert_round_trip(&image(palette_image(64, 20, colors)), &exact());
    }
}

#[test]
fn exactly_256_colors() {
    init_logger();
    let image = image(palette_image(32, 32, 256));
    for method in 0..=6 {
        assert_round_trip(&image, &Config::builder().method(method).exact(true).build());
    }
}

#[test]
fn every_effort() {
    init_logger();
    let image = image(gradient_image(50, 40, true));
    for quality in [0, 25, 26, 50, 75, 100] {
        for method in 0..=6 {
            assert_round_trip(&image, &Config::builder().quality(quality).method(method).exact(true).build());
        }
    }
}

#[test]
fn out_of_range_options_clamped() {
    init_logger();
    let image = image(noise_image(9, 9, 7));
    let config = Config::builder().quality(255).method(200).exact(true).build();
    assert_round_trip(&image, &config);
}

#[test]
fn deterministic() {
    init_logger();
    let image = image(gradient_image(40, 40, true));
    let config = Config::builder().method(6).build();
    assert_eq!(encode(&image, &config).unwrap(), encode(&image, &config).unwrap());
}

#[test]
fn near_lossless_preserves_dimensions() {
    init_logger();
    let original = image(noise_image(70, 70, 3));
    for level in [0, 40, 80] {
        let config = Config::builder().near_lossless(level).exact(true).build();
        let output = encode(&original, &config).unwrap();
        let decoded = decode(&output).unwrap();
        assert_eq!((decoded.width, decoded.height), (original.width, original.height));
        assert_eq!(decoded.data.len(), original.data.len());
    }
}

#[test]
fn near_lossless_exact_at_100() {
    init_logger();
    let original = image(noise_image(70, 70, 5));
    assert_round_trip(&original, &Config::builder().near_lossless(100).exact(true).build());
}

#[test]
fn opaque_images_exact_by_default() {
    init_logger();
    let original = image(gradient_image(33, 12, false));
    assert_round_trip(&original, &Config::default());
}

#[test]
fn decode_libwebp_output() {
    init_logger();
    let original = image(gradient_image(45, 23, false));
    if let Some(webp) = libwebp_encode(original.width, original.height, &original.data) {
        assert_eq!(decode(&webp).unwrap(), original);
    }
}

#[test]
fn maximum_dimension() {
    init_logger();
    let original = image(gradient_image(Image::MAX_DIMENSION, 1, false));
    assert_round_trip(&original, &Config::builder().method(0).quality(0).build());
}
