use linelog::{args, color, duration, err, group, int, string, Level, Logger, LoggerOptions};
use std::io;
use std::time::Duration;

fn main() {
    let log = Logger::new(LoggerOptions {
        prefix: "demo".to_string(),
        level: Level::DEBUG,
        ..Default::default()
    });

    log.info("starting service", args!["version", "1.4.2", "pid", std::process::id()]);
    log.debug("config loaded", args![group("db", args!["host", "localhost", "port", 5432])]);

    log.infof(
        "user {} signed in from {}",
        args!["alice", "10.0.0.7", duration("took", Duration::from_millis(42))],
    );

    log.warn(
        "slow request",
        args![color(13, string("path", "/api/orders")), int("status", 200)],
    );

    let failure = io::Error::new(io::ErrorKind::PermissionDenied, "invalid password");
    log.error("authentication failed", args!["user_id", 42, err(failure)]);

    let request = log.with_prefix("http:").with_group("req");
    request.info("handled", args!["method", "GET", "id", 7]);

    log.set_level(Level::WARN);
    log.info("not shown", args![]);
}
