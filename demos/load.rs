use linelog::{args, int, Level, Logger, LoggerOptions, NoopSink, SharedBuffer};
use std::sync::Arc;
use std::time::Instant;

fn run(name: &str, log: &Logger, n: u64) {
    let start = Instant::now();
    for i in 0..n {
        log.info("load test event", args!["iteration", i, int("worker", 1)]);
    }
    let elapsed = start.elapsed();
    println!(
        "{name}: {n} events in {elapsed:?} (~{:.0} ev/s)",
        n as f64 / elapsed.as_secs_f64()
    );
}

fn main() {
    let n: u64 = 100_000;

    let discard = Logger::with_output(Arc::new(NoopSink));
    run("discarded output", &discard, n);

    let gated = Logger::new(LoggerOptions {
        level: Level::ERROR,
        output: Some(Arc::new(SharedBuffer::new())),
        ..Default::default()
    });
    run("below level", &gated, n);

    let out = SharedBuffer::new();
    let enabled = Logger::new(LoggerOptions {
        no_color: true,
        output: Some(Arc::new(out.clone())),
        ..Default::default()
    });
    run("rendered", &enabled, n);
    println!("rendered {} bytes", out.len());
}
