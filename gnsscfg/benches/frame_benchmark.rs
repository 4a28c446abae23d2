use criterion::{criterion_group, criterion_main, Criterion};
use gnsscfg::*;
use std::hint::black_box;

pub fn criterion_benchmark(c: &mut Criterion) {
    let body = SentenceBody::new("$PUBX,41,1,3,3,115200,0*").unwrap();
    c.bench_function("nmea_checksum", |b| {
        b.iter(|| compute_checksum(black_box(body.as_bytes())))
    });
    c.bench_function("nmea_compile", |b| {
        b.iter(|| Frame::from_body(black_box(&body)))
    });

    for len in &[0usize, 20, 100, 512] {
        let payload = vec![0x5a; *len];
        let frame = UbxFrame::new(0x06, 0x00, &payload).unwrap();
        c.bench_function(&format!("ubx_validate_{}", len), |b| {
            b.iter(|| validate_ubx_frame(black_box(frame.as_bytes())))
        });
    }

    c.bench_function("standard_catalog_compile", |b| {
        let catalog = Catalog::standard().unwrap();
        b.iter(|| catalog.iter().map(|c| c.compile().as_bytes().len()).sum::<usize>())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
