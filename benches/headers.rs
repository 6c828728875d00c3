use criterion::{black_box, criterion_group, criterion_main, Criterion};
use socksfetch::{decode_chunked, HeaderMap};

fn benchmark_header_insert_and_lookup(c: &mut Criterion) {
    c.bench_function("headers_set_and_get", |b| {
        b.iter(|| {
            let mut headers = HeaderMap::new();
            headers.set("Accept", "text/html").unwrap();
            headers.set("Accept-Encoding", "gzip, deflate, br, zstd").unwrap();
            headers.set("Accept-Language", "en-GB,en;q=0.9").unwrap();
            headers.set("Cache-Control", "max-age=0").unwrap();
            headers
                .set(
                    "User-Agent",
                    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)",
                )
                .unwrap();
            headers.set("X-Trace", "0123456789abcdef").unwrap();
            black_box(headers.get("user-agent"));
            black_box(headers)
        })
    });
}

fn benchmark_chunked_decode(c: &mut Criterion) {
    let payload: Vec<u8> = (0u8..=255).cycle().take(64 * 1024).collect();
    let mut encoded = Vec::new();
    for chunk in payload.chunks(1024) {
        encoded.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        encoded.extend_from_slice(chunk);
        encoded.extend_from_slice(b"\r\n");
    }
    encoded.extend_from_slice(b"0\r\n\r\n");

    c.bench_function("decode_chunked_64k", |b| {
        b.iter(|| black_box(decode_chunked(black_box(&encoded))))
    });
}

criterion_group!(
    benches,
    benchmark_header_insert_and_lookup,
    benchmark_chunked_decode
);
criterion_main!(benches);
