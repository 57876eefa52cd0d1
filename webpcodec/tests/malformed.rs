use std::num::NonZeroU32;

use assert_matches::assert_matches;
use webpcodec::encode::bitstream::BitBufWriter;
use webpcodec::parse::{ParsedChunk, Vp8lChunk};
use webpcodec::{decode, encode, write_container, CodecError, Config, Error, Image};
use webpcodec_common_test::init_logger;
use webpcodec_test::libwebp_assert_invalid;

fn codec_error<T: std::fmt::Debug>(result: Result<T, Error>) -> CodecError {
    match result {
        Err(Error::Codec(report)) => {
            log::info!("rejected: {report}\n{report:?}");
            report.into_inner()
        }
        other => panic!("expected codec error, got {other:?}"),
    }
}

/// A 1x1 VP8L file whose bitstream after the header is written by `write`.
fn vp8l_file(write: impl FnOnce(&mut BitBufWriter)) -> Vec<u8> {
    let header = Vp8lChunk::new(NonZeroU32::MIN, NonZeroU32::MIN, false).unwrap();
    let mut writer = BitBufWriter::new();
    write(&mut writer);
    let mut payload = Vec::new();
    header.put_buf(&mut payload);
    payload.extend_from_slice(&writer.into_bytes().unwrap());
    write_container(&payload).unwrap()
}

#[test]
fn empty_buffer() {
    init_logger();
    assert_matches!(codec_error(decode(b"")), CodecError::MalformedContainer);
}

#[test]
fn avif_form_type() {
    init_logger();
    let input = b"RIFF\x0c\0\0\0AVIFmeta\0\0\0\0";
    assert_matches!(codec_error(decode(input)), CodecError::UnsupportedFormat);
    libwebp_assert_invalid(input);
}

#[test]
fn declared_size_past_end() {
    init_logger();
    let mut input = encode(&Image::new(1, 1, vec![1, 2, 3, 4]).unwrap(), &Config::default()).unwrap();
    input.truncate(input.len() - 2);
    assert_matches!(codec_error(decode(&input)), CodecError::MalformedContainer);
}

#[test]
fn over_subscribed_code_length_code() {
    init_logger();
    let input = vp8l_file(|writer| {
        // No transform, no color cache, no meta prefix codes.
        writer.write(3, 0).unwrap();
        // A normal green prefix code whose code length code gives four symbols one bit each.
        writer.write_bit(false).unwrap();
        writer.write(4, 0).unwrap();
        for _ in 0..4 {
            writer.write(3, 1).unwrap();
        }
        writer.write(32, 0).unwrap();
    });
    assert_matches!(codec_error(decode(&input)), CodecError::InvalidHuffmanTable);
    libwebp_assert_invalid(&input);
}

#[test]
fn truncated_bitstream() {
    init_logger();
    let input = vp8l_file(|writer| {
        writer.write(3, 0).unwrap();
    });
    assert_matches!(codec_error(decode(&input)), CodecError::TruncatedStream);
}

#[test]
fn duplicate_transform() {
    init_logger();
    let input = vp8l_file(|writer| {
        // Subtract green, twice.
        for _ in 0..2 {
            writer.write_bit(true).unwrap();
            writer.write(2, 2).unwrap();
        }
        writer.write(32, 0).unwrap();
    });
    assert_matches!(codec_error(decode(&input)), CodecError::TransformDecode);
    libwebp_assert_invalid(&input);
}

#[test]
fn unsupported_version() {
    init_logger();
    let input = write_container(b"\x2f\0\0\0\x20\x88\x88\x08").unwrap();
    assert_matches!(codec_error(decode(&input)), CodecError::UnsupportedFormat);
}

#[test]
fn bad_signature() {
    init_logger();
    let input = write_container(b"\x2e\0\0\0\0\x88\x88\x08").unwrap();
    assert_matches!(codec_error(decode(&input)), CodecError::MalformedContainer);
}

#[test]
fn short_header() {
    init_logger();
    let input = write_container(b"\x2f\0\0").unwrap();
    assert_matches!(codec_error(decode(&input)), CodecError::TruncatedStream);
}

#[test]
fn invalid_images() {
    init_logger();
    let config = Config::default();
    let width = Image::MAX_DIMENSION + 1;
    let too_wide = Image { width, height: 1, data: vec![0; 4 * width as usize] };
    assert_matches!(codec_error(encode(&too_wide, &config)), CodecError::InvalidImage);
    let short = Image { width: 3, height: 3, data: vec![0; 35] };
    assert_matches!(codec_error(encode(&short, &config)), CodecError::InvalidImage);
    let empty = Image { width: 0, height: 0, data: vec![] };
    assert_matches!(codec_error(encode(&empty, &config)), CodecError::InvalidImage);
}
