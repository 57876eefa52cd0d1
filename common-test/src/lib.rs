//! Test helpers shared by the `webpcodec` crates.

use std::fs;
use std::io;

//
// public types
//

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TestType {
    Valid,
    Invalid,
}

/// An RGBA image generated for tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

//
// private types
//

struct TestDirSpec {
    path: &'static str,
    test_type: TestType,
}

macro_rules! test_dir {
    ($name:literal, $test_type:ident) => {
        $crate::TestDirSpec {
            path: concat!(env!("CARGO_MANIFEST_DIR"), "/../test-data/", $name),
            test_type: TestType::$test_type,
        }
    };
}

const TEST_DATA_DIRS: &[TestDirSpec] = &[test_dir!("valid", Valid), test_dir!("invalid", Invalid)];

//
// public functions
//

pub fn init_logger() {
    // Ignore errors initializing the logger if tests race to configure it
    let _ignore = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .is_test(true)
        .try_init();
}

/// Call `test` with every file ending in `ext` found in the on-disk test corpus, if present.
pub fn test_data<F: FnMut(TestType, &[u8])>(ext: &str, mut test: F) {
    init_logger();
    for dir_spec in TEST_DATA_DIRS {
        let dir_entries = match fs::read_dir(dir_spec.path) {
            Ok(dir_entries) => dir_entries,
            Err(err) => match err.kind() {
                io::ErrorKind::NotFound => continue,
                _ => panic!("could not read test data directory: {err}"),
            },
        };

        for dir_entry in dir_entries.map(Result::unwrap) {
            let file_name = dir_entry.file_name();
            if !file_name.to_string_lossy().ends_with(ext) {
                continue;
            }
            let data = fs::read(dir_entry.path()).unwrap();
            match dir_spec.test_type {
                TestType::Valid => log::info!("running test on valid input: {file_name:?}"),
                TestType::Invalid => log::info!("running test on invalid input: {file_name:?}"),
            }
            test(dir_spec.test_type, &data[..]);
        }
    }
}

/// A smooth gradient, with an alpha ramp if `alpha` is set.
pub fn gradient_image(width: u32, height: u32, alpha: bool) -> TestImage {
    let data = pixel_coords(width, height)
        .flat_map(|(x, y)| {
            let a = if alpha { (x * 255 / width.max(1)) as u8 } else { 255 };
            [(x * 3) as u8, (y * 5) as u8, ((x + y) * 2) as u8, a]
        })
        .collect();
    TestImage { width, height, data }
}

/// Pseudo-random pixels, deterministic for a given `seed`.
pub fn noise_image(width: u32, height: u32, seed: u32) -> TestImage {
    let mut state = seed | 1;
    let data = (0..u64::from(width) * u64::from(height) * 4)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect();
    TestImage { width, height, data }
}

/// An image using exactly `colors` distinct opaque colors, repeated in stripes.
pub fn palette_image(width: u32, height: u32, colors: u32) -> TestImage {
    assert!(colors > 0 && colors <= 1 << 24 && u64::from(colors) <= u64::from(width) * u64::from(height));
    let data = pixel_coords(width, height)
        .flat_map(|(x, y)| {
            let index = (y * width + x) % colors;
            let low = index as u8;
            [low.wrapping_mul(37), (index >> 8) as u8 ^ low, (index >> 16) as u8, 255]
        })
        .collect();
    TestImage { width, height, data }
}

//
// private functions
//

fn pixel_coords(width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    (0..height).flat_map(move |y| (0..width).map(move |x| (x, y)))
}
