use webpcodec::{decode, encode, Config};
use webpcodec_common_test::{init_logger, TestType};
use webpcodec_test::libwebp_assert_decodes_to;

#[test]
fn test_data() {
    init_logger();
    webpcodec_common_test::test_data(".webp", |test_type, data| match test_type {
        TestType::Valid => {
            let image = decode(data).unwrap();
            let config = Config::builder().exact(true).build();
            let output = encode(&image, &config).unwrap();
            assert_eq!(decode(&output).unwrap(), image);
            libwebp_assert_decodes_to(&output, image.width, image.height, &image.data);
        }
        TestType::Invalid => {
            dbg!(decode(data).unwrap_err());
        }
    });
}
