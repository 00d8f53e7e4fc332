use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use tempfile::tempdir;

use mlog::{log_info, Level, Logger, RingBuffer};

/// Producer-side cost of a log call: render + ring put + ordered enqueue.
/// The ring is large enough that the writer never causes drops.
fn bench_log_call(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let logger = Logger::init(Level::Info, dir.path().join("bench.log"), 1 << 24).unwrap();

    let mut group = c.benchmark_group("producer");
    group.throughput(Throughput::Elements(1));
    group.bench_function("log_info", |b| {
        b.iter(|| log_info!(logger, "bench message {}", 42))
    });
    group.finish();
}

fn bench_ring_put_get(c: &mut Criterion) {
    let ring = RingBuffer::new(1 << 16);
    let payload = [0x5au8; 128];
    let mut out = [0u8; 128];

    let mut group = c.benchmark_group("ring");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("put_get_128", |b| {
        b.iter(|| {
            ring.put(&payload);
            ring.get(&mut out)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_log_call, bench_ring_put_get);
criterion_main!(benches);
