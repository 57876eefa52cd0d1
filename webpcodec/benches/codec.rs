use criterion::async_executor::FuturesExecutor;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use futures_util::io::Cursor;
use webpcodec::{decode, decode_async, encode, Config, Image};

criterion_group!(benches, codec);
criterion_main!(benches);

fn test_image() -> Image {
    let (width, height) = (256, 256);
    let data = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .flat_map(|(x, y): (u32, u32)| [x as u8, y as u8, (x ^ y) as u8, 255])
        .collect();
    Image::new(width, height, data).unwrap()
}

pub fn codec(c: &mut Criterion) {
    let image = test_image();

    let mut encode_group = c.benchmark_group("encode");
    encode_group.sample_size(10);
    for method in [0, 4, 6] {
        let config = Config::builder().method(method).build();
        encode_group.bench_function(format!("method {method}"), |b| {
            b.iter(|| encode(black_box(&image), &config).unwrap())
        });
    }
    encode_group.finish();

    let webp = encode(&image, &Config::default()).unwrap();
    let mut decode_group = c.benchmark_group("decode");
    decode_group.bench_function("sync", |b| b.iter(|| decode(black_box(&webp)).unwrap()));
    decode_group.bench_function("async", |b| {
        b.to_async(FuturesExecutor)
            .iter(|| async { decode_async(Cursor::new(black_box(&webp[..]))).await.unwrap() })
    });
    decode_group.finish();
}
