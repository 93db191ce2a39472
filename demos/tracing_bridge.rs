use linelog::init::{init_tracing_with_config, BridgeConfig};
use linelog::{Level, Logger, LoggerOptions};
use std::time::Instant;
use tracing::{error, info, warn};

fn main() {
    let logger = Logger::new(LoggerOptions {
        level: Level::INFO,
        ..Default::default()
    });

    let config = BridgeConfig {
        target_prefix: true,
        enable_fmt: false,
    };
    if let Err(e) = init_tracing_with_config(logger, config) {
        eprintln!("{e}");
        return;
    }

    info!("starting service");
    warn!(retries = 3, "upstream flaky");
    error!(user_id = 42, reason = "invalid password", "authentication failed");

    let n: u64 = 10_000;
    let start = Instant::now();
    for i in 0..n {
        tracing::debug!(iteration = i, "filtered load event");
    }
    let elapsed = start.elapsed();
    info!(
        events = n,
        elapsed_us = elapsed.as_micros() as u64,
        "disabled events done"
    );
}
