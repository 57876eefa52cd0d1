use bytes::BufMut;
use derive_builder::Builder;
use webpcodec_common::parse::FourCC;
use webpcodec_common_test::init_logger;

use crate::parse::chunk_type::{ALPH, ANIM, ANMF, EXIF, ICCP, VP8, VP8L, VP8X, XMP};
use crate::parse::Vp8xFlags;

use super::{write_test_chunk, write_test_vp8x};

#[derive(Builder)]
#[builder(name = "TestWebpBuilder", build_fn(name = "build_spec"))]
pub struct TestWebpSpec {
    #[builder(default)]
    vp8x: TestVp8xSpecBuilder,

    #[builder(default = "DEFAULT_VP8L_DATA.to_vec()")]
    #[builder(setter(into, each(name = "add_vp8l_data", into)))]
    vp8l_data: Vec<u8>,

    #[builder(default = "vec![VP8L]")]
    #[builder(setter(into, each(name = "add_chunk")))]
    chunks: Vec<FourCC>,
}

#[derive(Clone)]
pub struct TestWebp {
    pub data: Vec<u8>,
}

#[derive(Builder)]
pub struct TestVp8xSpec {
    #[builder(default)]
    pub flags: Option<Vp8xFlags>,

    /// The canvas width, minus one.
    #[builder(default)]
    pub width: u32,

    /// The canvas height, minus one.
    #[builder(default)]
    pub height: u32,
}

/// Bytes standing in for a lossy VP8 bitstream; never decoded.
const DEFAULT_VP8_DATA: &[u8] = &[
    18, 1, 0, 157, 1, 42, 1, 0, 1, 0, 18, 0, 52, 0, 0, 13, 192, 0, 254, 251, 253, 80, 0, 0,
];

/// A transparent black 1x1 image.
const DEFAULT_VP8L_DATA: &[u8] = &[
    // image-header: signature image-size alpha-is-used version
    0x2f,
    0b0000_0000,
    0b0000_0000,
    0b0000_0000,
    0b0000_0000,
    // image-stream: optional-transform color-cache-info meta-prefix 5prefix-code
    0b1000_1000,
    0b1000_1000,
    0b0000_1000,
];

impl TestWebpBuilder {
    pub fn build(&self) -> TestWebp {
        self.build_spec().unwrap().build()
    }
}

impl TestWebpSpec {
    pub fn build(&self) -> TestWebp {
        init_logger();

        let mut data = vec![];
        data.extend_from_slice(b"RIFF\0\0\0\0WEBP");

        for chunk_type in &self.chunks {
            match *chunk_type {
                VP8L => write_test_chunk(&mut data, *chunk_type, &self.vp8l_data),
                VP8 => write_test_chunk(&mut data, *chunk_type, DEFAULT_VP8_DATA),
                VP8X => {
                    let spec = self.vp8x.build().unwrap();
                    let flags = spec.flags.unwrap_or_else(|| {
                        let mut flags = Vp8xFlags::empty();
                        let chunk_flags = [
                            (ICCP, Vp8xFlags::HAS_ICCP_CHUNK),
                            (ANIM, Vp8xFlags::IS_ANIMATED),
                            (ALPH, Vp8xFlags::HAS_ALPH_CHUNK),
                            (EXIF, Vp8xFlags::HAS_EXIF_CHUNK),
                            (XMP, Vp8xFlags::HAS_XMP_CHUNK),
                        ];
                        for (name, flag) in chunk_flags {
                            flags.set(flag, self.chunks.contains(&name));
                        }
                        flags
                    });
                    write_test_vp8x(&mut data, flags, spec.width, spec.height);
                }
                ALPH => write_test_chunk(&mut data, *chunk_type, b"\x01dummy ALPH data"),
                ANIM => write_test_chunk(&mut data, *chunk_type, b"\xfe\xc4\xce\xfa\x0f\xf0"),
                ANMF => write_test_chunk(&mut data, *chunk_type, &[0; 16]),
                ICCP => write_test_chunk(&mut data, *chunk_type, b"dummy ICCP profile"),
                EXIF => write_test_chunk(&mut data, *chunk_type, b"dummy EXIF data"),
                XMP => write_test_chunk(&mut data, *chunk_type, b"dummy XMP data"),
                _ => panic!("invalid chunk type for test {chunk_type}"),
            }
        }

        let len = data.len() as u32 - 8;
        (&mut data[4..]).put_u32_le(len);

        TestWebp { data }
    }
}
