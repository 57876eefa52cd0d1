#![no_main]

use libfuzzer_sys::fuzz_target;
use webpcodec::{decode, encode, Config, Image};

fuzz_target!(|data: &[u8]| {
    let [width, quality, method, ref pixels @ ..] = *data else {
        return;
    };
    let width = u32::from(width % 64) + 1;
    let height = ((pixels.len() / 4) as u32 / width).min(Image::MAX_DIMENSION);
    if height == 0 {
        return;
    }
    let len = (width * height * 4) as usize;
    let image = Image::new(width, height, pixels[..len].to_vec()).unwrap();

    let config = Config::builder().quality(quality % 101).method(method % 7).exact(true).build();
    let output = encode(&image, &config).unwrap();
    assert_eq!(decode(&output).unwrap(), image);
});
