#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    #[cfg_attr(not(fuzzing_repro), allow(unused))]
    match webpcodec::decode(data) {
        Ok(image) => {
            assert_eq!(image.data.len(), image.width as usize * image.height as usize * 4);
            #[cfg(fuzzing_repro)]
            eprintln!("webpcodec decoded a {}x{} image", image.width, image.height);
        }
        Err(error) => match error {
            webpcodec::Error::Io(_) => panic!("io error decoding from memory"),
            webpcodec::Error::Codec(error) => {
                #[cfg(fuzzing_repro)]
                eprintln!("webpcodec returned a codec error: {error}\n{error:?}");
            }
        },
    }
});
