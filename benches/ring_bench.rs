//! Performance benchmarks for the receive ring and record parser.
//!
//! The receive path runs once per byte, so push and front comparison must
//! stay cheap even on slow targets.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench ring_bench
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use smslink_protocol::{ByteRing, RecordParser, StagingBuffer};
use std::hint::black_box;

const RECORD: &[u8] = b"+CMT: \"+33612345671\",,\"24/05/10,12:46:06+08\"\r\nmessage 2\nfd\r\n";

/// Benchmark pushing a full record byte by byte and draining it.
fn bench_push_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_push_drain");
    group.throughput(Throughput::Bytes(RECORD.len() as u64));

    group.bench_function("push_then_drain_record", |b| {
        let mut ring = ByteRing::<256>::new();
        let mut dest = [0u8; 256];
        b.iter(|| {
            for &byte in RECORD {
                ring.push(black_box(byte)).unwrap();
            }
            let n = ring.len();
            ring.drain_into(&mut dest, n).unwrap();
            black_box(&dest);
        });
    });

    group.finish();
}

/// Benchmark front comparison with patterns of increasing length.
fn bench_compare_front(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_compare_front");

    let mut ring = ByteRing::<256>::new();
    for &byte in RECORD {
        ring.push(byte).unwrap();
    }

    for pattern in [&b"OK"[..], b"ERROR", b"+CMT: \""] {
        group.bench_with_input(
            BenchmarkId::from_parameter(String::from_utf8_lossy(pattern)),
            pattern,
            |b, pattern| b.iter(|| black_box(ring.compare_front(black_box(pattern)))),
        );
    }

    group.finish();
}

/// Benchmark parsing chunks holding several records.
fn bench_parse_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_parse");

    for count in [1usize, 2, 4] {
        let mut staging = StagingBuffer::<512>::new();
        for _ in 0..count {
            staging.extend_from_slice(RECORD).unwrap();
        }

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let summary = RecordParser::parse(&staging, staging.view(), |sender, payload| {
                    black_box((sender, payload));
                });
                black_box(summary);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_push_drain,
    bench_compare_front,
    bench_parse_records
);
criterion_main!(benches);
