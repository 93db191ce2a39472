//! Benchmarks for the logging hot paths.
//!
//! - disabled: level gate and discarded output, which must not allocate
//! - enabled: full rendering into an in-memory sink
//!
//! Run with: `cargo bench --bench logger`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use linelog::{args, int, string, Level, Logger, LoggerOptions, NoopSink, SharedBuffer};
use std::sync::Arc;

fn quiet_logger(level: Level) -> Logger {
    Logger::new(LoggerOptions {
        level,
        no_color: true,
        output: Some(Arc::new(SharedBuffer::new())),
        ..Default::default()
    })
}

fn bench_disabled(c: &mut Criterion) {
    let mut group = c.benchmark_group("disabled");

    let gated = quiet_logger(Level::WARN);
    group.bench_function("below_level", |b| {
        b.iter(|| {
            gated.debug(
                black_box("debug message"),
                args!["key", "value", "n", 42, string("k2", "v2")],
            )
        })
    });

    let discarded = Logger::with_output(Arc::new(NoopSink));
    group.bench_function("discarded_output", |b| {
        b.iter(|| discarded.error(black_box("error message"), args!["key", "value"]))
    });

    group.finish();
}

fn bench_enabled(c: &mut Criterion) {
    let mut group = c.benchmark_group("enabled");

    let out = SharedBuffer::new();
    let log = Logger::new(LoggerOptions {
        no_color: true,
        output: Some(Arc::new(out.clone())),
        ..Default::default()
    });
    group.bench_function("five_attrs", |b| {
        b.iter(|| {
            out.clear();
            log.info(
                black_box("request completed"),
                args![
                    "method", "GET", "path", "/api/v1/orders", int("status", 200),
                    "bytes", 5120, "cached", false
                ],
            )
        })
    });

    let colored = Logger::new(LoggerOptions {
        output: Some(Arc::new(out.clone())),
        ..Default::default()
    })
    .with_attrs(args!["service", "orders"])
    .with_group("req");
    group.bench_function("colored_with_context", |b| {
        b.iter(|| {
            out.clear();
            colored.warn(black_box("slow"), args!["elapsed_ms", 870])
        })
    });

    group.bench_function("formatted", |b| {
        b.iter(|| {
            out.clear();
            log.infof(black_box("user {} from {}"), args!["alice", "10.0.0.1"])
        })
    });

    group.finish();
}

criterion_group!(benches, bench_disabled, bench_enabled);
criterion_main!(benches);
