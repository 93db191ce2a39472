use crate::attr::{parse_args, split_attrs, Arg, Attr, Value};
use crate::error::LogError;
use crate::handler::{new_text_handler, Handler, HandlerOptions, LevelFormat, ReplaceAttr};
use crate::level::{Level, LevelVar};
use crate::record::Record;
use crate::sink::{OutputVar, Sink};
use crate::util::{fallback_error, format_message};
use chrono::{DateTime, FixedOffset, Local};
use serde_json::Map;
use std::io;
use std::sync::Arc;

/// Source of record timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<FixedOffset> + Send + Sync>;

/// Called with exit code 1 after a fatal-tier event has been written.
pub type ExitFn = Arc<dyn Fn(i32) + Send + Sync>;

/// Builds the handler of a new [`Logger`] from the options it assembled.
pub type NewHandlerFn = Arc<dyn Fn(HandlerOptions) -> Arc<dyn Handler> + Send + Sync>;

/// Construction options for [`Logger::new`]. Every field has a usable
/// default.
#[derive(Clone, Default)]
pub struct LoggerOptions {
    pub prefix: String,

    /// Initial minimum level.
    pub level: Level,

    /// Use this handler as is. The logger's level and output then only gate
    /// events; they are not wired into the handler.
    pub handler: Option<Arc<dyn Handler>>,

    /// Factory for the handler when `handler` is unset. Defaults to
    /// [`TextHandler`](crate::handler::TextHandler).
    pub new_handler: Option<NewHandlerFn>,

    pub replace_attr: Option<ReplaceAttr>,
    pub time_format: String,
    pub level_format: Option<LevelFormat>,
    pub no_color: bool,

    /// Defaults to stderr.
    pub output: Option<Arc<dyn Sink>>,

    /// Defaults to [`std::process::exit`].
    pub exit: Option<ExitFn>,

    /// Defaults to the local wall clock.
    pub clock: Option<Clock>,
}

/// Front end that gates, builds and dispatches records.
///
/// Cloning is cheap and clones share the level and output cells, so
/// `set_level` on one is seen by all of them and by every logger derived
/// through `with_*`.
#[derive(Clone)]
pub struct Logger {
    level: Arc<LevelVar>,
    output: Arc<OutputVar>,
    handler: Arc<dyn Handler>,
    exit: ExitFn,
    clock: Clock,
}

impl Default for Logger {
    fn default() -> Self {
        Logger::new(LoggerOptions::default())
    }
}

impl Logger {
    /// Create a logger from `opts`.
    ///
    /// **Parameters**
    /// - `opts`: [`LoggerOptions`]; unset fields take their defaults
    ///   (stderr, [`Level::INFO`], a colored
    ///   [`TextHandler`](crate::handler::TextHandler)).
    ///
    /// **Behavior**
    ///
    /// Unless `opts.handler` is given, the handler is built with this
    /// logger's level and output cells, so [`set_level`](Self::set_level)
    /// and [`set_output`](Self::set_output) take effect on it immediately.
    /// `opts.prefix` is applied last.
    pub fn new(opts: LoggerOptions) -> Self {
        let level = Arc::new(LevelVar::new(opts.level));
        let output = Arc::new(OutputVar::new(
            opts.output.unwrap_or_else(|| Arc::new(io::stderr())),
        ));

        let handler = match opts.handler {
            Some(h) => h,
            None => {
                let handler_opts = HandlerOptions {
                    level: Some(level.clone()),
                    replace_attr: opts.replace_attr,
                    time_format: opts.time_format,
                    level_format: opts.level_format,
                    no_color: opts.no_color,
                    output: output.clone(),
                };
                match opts.new_handler {
                    Some(f) => f(handler_opts),
                    None => new_text_handler(handler_opts),
                }
            }
        };

        let exit: ExitFn = match opts.exit {
            Some(exit) => exit,
            None => Arc::new(|code: i32| std::process::exit(code)),
        };
        let clock: Clock = match opts.clock {
            Some(clock) => clock,
            None => Arc::new(|| Local::now().fixed_offset()),
        };

        Logger {
            level,
            output,
            handler: handler.with_prefix(&opts.prefix),
            exit,
            clock,
        }
    }

    /// Logger writing to `output` with every other option at its default.
    pub fn with_output(output: Arc<dyn Sink>) -> Self {
        Logger::new(LoggerOptions {
            output: Some(output),
            ..Default::default()
        })
    }

    /// Current minimum level.
    pub fn level(&self) -> Level {
        self.level.get()
    }

    /// Replace the minimum level. Seen by every clone and every logger
    /// derived from this one, including calls already racing on other
    /// threads.
    pub fn set_level(&self, level: Level) {
        self.level.set(level);
    }

    /// Current output; a [`NoopSink`](crate::noop_sink::NoopSink) while
    /// output is discarded.
    pub fn output(&self) -> Arc<dyn Sink> {
        self.output.get()
    }

    /// Swap the output for this logger, its clones and derived loggers.
    ///
    /// **Parameters**
    /// - `output`: the new [`Sink`]. Passing a
    ///   [`NoopSink`](crate::noop_sink::NoopSink) turns every call into an
    ///   early return.
    ///
    /// A line being written during the swap goes entirely to the old or the
    /// new sink.
    pub fn set_output(&self, output: Arc<dyn Sink>) {
        self.output.set(output);
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Reports whether an event at `level` would reach the handler.
    ///
    /// **Returns**
    /// - `true` when `level` is at or above the current minimum.
    /// - `false` otherwise; logging at that level does no work at all.
    pub fn enabled(&self, level: Level) -> bool {
        self.handler.enabled(level)
    }

    fn disabled(&self, level: Level) -> bool {
        self.output.is_discard() || !self.handler.enabled(level)
    }

    fn derive(&self, handler: Arc<dyn Handler>) -> Logger {
        Logger {
            level: Arc::clone(&self.level),
            output: Arc::clone(&self.output),
            handler,
            exit: Arc::clone(&self.exit),
            clock: Arc::clone(&self.clock),
        }
    }

    /// Logger that adds `args` to every event. An empty list returns a logger
    /// sharing this one's handler.
    pub fn with_attrs(&self, args: impl IntoIterator<Item = Arg>) -> Logger {
        let attrs = parse_args(args);
        self.derive(Arc::clone(&self.handler).with_attrs(attrs))
    }

    /// Logger that nests all later attributes under `name`; keys render as
    /// `name.key`. An empty name returns an equivalent logger.
    pub fn with_group(&self, name: &str) -> Logger {
        self.derive(Arc::clone(&self.handler).with_group(name))
    }

    /// Logger whose prefix is `prefix` followed by the current one.
    pub fn with_prefix(&self, prefix: &str) -> Logger {
        self.derive(Arc::clone(&self.handler).with_prefix(prefix))
    }

    fn dispatch(&self, record: &Record) {
        if let Err(e) = self.handler.handle(record) {
            fallback_error(e);
        }
    }

    /// Reads the logger's clock.
    pub fn now(&self) -> DateTime<FixedOffset> {
        (self.clock)()
    }

    /// Dispatches a record built elsewhere, gated like every other entry
    /// point.
    pub fn log_record(&self, record: &Record) {
        if self.disabled(record.level) {
            return;
        }
        self.dispatch(record);
    }

    /// Logs `msg` with a flexible argument list and reports write failures
    /// to the caller instead of stderr.
    pub fn try_log(
        &self,
        level: Level,
        msg: &str,
        args: impl IntoIterator<Item = Arg>,
    ) -> Result<(), LogError> {
        if self.disabled(level) {
            return Ok(());
        }
        let mut r = Record::new(Some(self.now()), level, msg);
        r.add(args);
        self.handler.handle(&r)
    }

    /// Logs `msg` with a flexible argument list (see
    /// [`ArgParser`](crate::attr::ArgParser)).
    pub fn log(&self, level: Level, msg: &str, args: impl IntoIterator<Item = Arg>) {
        if self.disabled(level) {
            return;
        }
        let mut r = Record::new(Some(self.now()), level, msg);
        r.add(args);
        self.dispatch(&r);
    }

    /// Logs `msg` with ready-made attributes, skipping argument parsing.
    pub fn log_attrs(&self, level: Level, msg: &str, attrs: impl IntoIterator<Item = Attr>) {
        if self.disabled(level) {
            return;
        }
        let mut r = Record::new(Some(self.now()), level, msg);
        r.add_attrs(attrs);
        self.dispatch(&r);
    }

    /// Logs a message built from `format`. Bare values fill `{}`
    /// placeholders in order; attributes are attached as structured data.
    pub fn logf(&self, level: Level, format: &str, args: impl IntoIterator<Item = Arg>) {
        if self.disabled(level) {
            return;
        }
        let (attrs, values) = split_attrs(args);
        let mut r = Record::new(Some(self.now()), level, render(format, &values));
        r.add_attrs(attrs);
        self.dispatch(&r);
    }

    /// Logs every map entry as an attribute, with an empty message.
    pub fn logj(&self, level: Level, map: &Map<String, serde_json::Value>) {
        if self.disabled(level) {
            return;
        }
        let mut r = Record::new(Some(self.now()), level, String::new());
        r.add_attrs(
            map.iter()
                .map(|(k, v)| Attr::new(k.clone(), Value::from(v.clone()))),
        );
        self.dispatch(&r);
    }

    /// Logs at [`Level::PANIC`], then panics with `msg`.
    pub fn panic(&self, msg: &str, args: impl IntoIterator<Item = Arg>) -> ! {
        self.log(Level::PANIC, msg, args);
        panic!("{msg}");
    }

    pub fn panicf(&self, format: &str, args: impl IntoIterator<Item = Arg>) -> ! {
        let args: Vec<Arg> = args.into_iter().collect();
        self.logf(Level::PANIC, format, args.clone());
        let (_, values) = split_attrs(args);
        panic!("{}", render(format, &values));
    }

    pub fn panicj(&self, map: &Map<String, serde_json::Value>) -> ! {
        self.logj(Level::PANIC, map);
        panic!("{}", serde_json::Value::Object(map.clone()));
    }

    /// Logs at [`Level::FATAL`], then calls the exit hook with code 1.
    pub fn fatal(&self, msg: &str, args: impl IntoIterator<Item = Arg>) {
        self.log(Level::FATAL, msg, args);
        (self.exit)(1);
    }

    pub fn fatalf(&self, format: &str, args: impl IntoIterator<Item = Arg>) {
        self.logf(Level::FATAL, format, args);
        (self.exit)(1);
    }

    pub fn fatalj(&self, map: &Map<String, serde_json::Value>) {
        self.logj(Level::FATAL, map);
        (self.exit)(1);
    }
}

fn render(format: &str, values: &[Value]) -> String {
    if values.is_empty() {
        format.to_string()
    } else {
        format_message(format, values)
    }
}

macro_rules! leveled {
    ($($level:ident => $plain:ident, $fmt:ident, $map:ident;)*) => {
        impl Logger {
            $(
                #[doc = concat!("Logs `msg` at [`Level::", stringify!($level), "`].")]
                pub fn $plain(&self, msg: &str, args: impl IntoIterator<Item = Arg>) {
                    self.log(Level::$level, msg, args);
                }

                #[doc = concat!("Formatted form of [`Logger::", stringify!($plain), "`].")]
                pub fn $fmt(&self, format: &str, args: impl IntoIterator<Item = Arg>) {
                    self.logf(Level::$level, format, args);
                }

                #[doc = concat!("Map form of [`Logger::", stringify!($plain), "`].")]
                pub fn $map(&self, map: &Map<String, serde_json::Value>) {
                    self.logj(Level::$level, map);
                }
            )*
        }
    };
}

leveled! {
    TRACE => trace, tracef, tracej;
    DEBUG => debug, debugf, debugj;
    INFO => info, infof, infoj;
    WARN => warn, warnf, warnj;
    ERROR => error, errorf, errorj;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::attr::{int, string};
    use crate::handler::{drop_time, TextHandler};
    use crate::noop_sink::NoopSink;
    use crate::sink::SharedBuffer;
    use chrono::TimeZone;
    use serde_json::json;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicI32, Ordering};

    fn logger(out: &SharedBuffer) -> Logger {
        Logger::new(LoggerOptions {
            level: Level::TRACE,
            no_color: true,
            output: Some(Arc::new(out.clone())),
            replace_attr: Some(drop_time()),
            ..Default::default()
        })
    }

    fn lines(out: &SharedBuffer) -> Vec<String> {
        out.contents().lines().map(str::to_string).collect()
    }

    #[test]
    fn info_writes_one_line() {
        let out = SharedBuffer::new();
        logger(&out).info("request completed", args!["method", "GET", int("status", 200)]);
        assert_eq!(lines(&out), ["INFO request completed method=GET status=200"]);
    }

    #[test]
    fn every_tier_uses_its_level() {
        let out = SharedBuffer::new();
        let log = logger(&out);
        log.trace("t", args![]);
        log.debug("d", args![]);
        log.info("i", args![]);
        log.warn("w", args![]);
        log.error("e", args![]);
        assert_eq!(lines(&out), ["TRACE t", "DEBUG d", "INFO i", "WARN w", "ERROR e"]);
    }

    #[test]
    fn level_gate_drops_lower_events() {
        let out = SharedBuffer::new();
        let log = logger(&out);
        log.set_level(Level::WARN);
        assert_eq!(log.level(), Level::WARN);
        log.debug("hidden", args!["k", 1]);
        log.info("hidden", args![]);
        assert!(out.is_empty());
        log.warn("shown", args![]);
        assert_eq!(lines(&out), ["WARN shown"]);
    }

    #[test]
    fn discarded_output_skips_everything() {
        let out = SharedBuffer::new();
        let log = logger(&out);
        log.set_output(Arc::new(NoopSink));
        log.error("nobody hears", args![]);
        assert!(out.is_empty());
        assert!(log.output().is_discard());

        log.set_output(Arc::new(out.clone()));
        log.error("back", args![]);
        assert_eq!(lines(&out), ["ERROR back"]);
    }

    #[test]
    fn formatted_messages() {
        let out = SharedBuffer::new();
        let log = logger(&out);
        log.infof("user {} logged in from {}", args!["alice", "10.0.0.1", int("attempt", 2)]);
        log.warnf("no args {}", args![]);
        log.errorf("{} and {}", args![1]);
        log.debugf("{}", args![1, 2, 3]);
        assert_eq!(
            lines(&out),
            [
                "INFO user alice logged in from 10.0.0.1 attempt=2",
                "WARN no args {}",
                "ERROR 1 and {!MISSING}",
                "DEBUG 1{!EXTRA 2, 3}",
            ]
        );
    }

    #[test]
    fn map_form_logs_entries_with_empty_message() {
        let out = SharedBuffer::new();
        let log = logger(&out);
        let map = json!({"user": "alice", "count": 3, "meta": {"ok": true}});
        let serde_json::Value::Object(map) = map else {
            unreachable!()
        };
        log.infoj(&map);
        assert_eq!(lines(&out), ["INFO count=3 meta.ok=true user=alice"]);
    }

    #[test]
    fn with_methods_bind_context() {
        let out = SharedBuffer::new();
        let log = logger(&out)
            .with_prefix("api")
            .with_attrs(args!["app", "test"])
            .with_group("req");
        log.info("handled", args!["id", 7]);
        assert_eq!(lines(&out), ["INFO [api] handled app=test req.id=7"]);
    }

    #[test]
    fn empty_with_calls_share_the_handler() {
        let out = SharedBuffer::new();
        let log = logger(&out);
        assert!(Arc::ptr_eq(log.with_prefix("").handler(), log.handler()));
        assert!(Arc::ptr_eq(log.with_group("").handler(), log.handler()));
        assert!(Arc::ptr_eq(log.with_attrs(args![]).handler(), log.handler()));
        assert!(!Arc::ptr_eq(log.with_prefix("x").handler(), log.handler()));
    }

    #[test]
    fn derived_loggers_share_level_and_output() {
        let out = SharedBuffer::new();
        let log = logger(&out);
        let child = log.with_prefix("child");
        log.set_level(Level::ERROR);
        child.info("hidden", args![]);
        assert!(out.is_empty());
        assert_eq!(child.level(), Level::ERROR);
    }

    #[test]
    fn prefix_option_is_applied() {
        let out = SharedBuffer::new();
        let log = Logger::new(LoggerOptions {
            prefix: "myapp".to_string(),
            no_color: true,
            output: Some(Arc::new(out.clone())),
            replace_attr: Some(drop_time()),
            ..Default::default()
        });
        log.info("test message", args![]);
        assert_eq!(lines(&out), ["INFO [myapp] test message"]);
    }

    #[test]
    fn clock_stamps_records() {
        let out = SharedBuffer::new();
        let log = Logger::new(LoggerOptions {
            no_color: true,
            output: Some(Arc::new(out.clone())),
            clock: Some(Arc::new(|| {
                FixedOffset::east_opt(0)
                    .unwrap()
                    .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
                    .unwrap()
            })),
            ..Default::default()
        });
        log.info("tick", args![]);
        assert_eq!(out.contents(), "INFO Jan  2 03:04:05.000 tick\n");
    }

    #[test]
    fn fatal_logs_then_calls_exit_hook() {
        let out = SharedBuffer::new();
        let code = Arc::new(AtomicI32::new(-1));
        let seen = Arc::clone(&code);
        let log = Logger::new(LoggerOptions {
            no_color: true,
            output: Some(Arc::new(out.clone())),
            replace_attr: Some(drop_time()),
            exit: Some(Arc::new(move |c| seen.store(c, Ordering::SeqCst))),
            ..Default::default()
        });
        log.fatal("giving up", args!["reason", "disk"]);
        assert_eq!(code.load(Ordering::SeqCst), 1);
        assert_eq!(lines(&out), ["FATAL giving up reason=disk"]);

        code.store(-1, Ordering::SeqCst);
        log.fatalf("code {}", args![7]);
        assert_eq!(code.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panic_logs_then_panics() {
        let out = SharedBuffer::new();
        let log = logger(&out);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            log.panicf("bad state {}", args![42, string("k", "v")]);
        }));
        let payload = result.unwrap_err();
        assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("bad state 42"));
        assert_eq!(lines(&out), ["PANIC bad state 42 k=v"]);
    }

    #[test]
    fn try_log_reports_write_errors() {
        struct Broken;
        impl Sink for Broken {
            fn write(&self, _: &[u8]) -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::Other, "gone"))
            }
        }
        let log = Logger::with_output(Arc::new(Broken));
        assert!(log.try_log(Level::INFO, "x", args![]).is_err());
        assert!(log.try_log(Level::DEBUG, "gated", args![]).is_ok());
        // Convenience methods swallow the error after reporting it.
        log.info("x", args![]);
    }

    #[test]
    fn custom_handler_factory_receives_options() {
        let out = SharedBuffer::new();
        let log = Logger::new(LoggerOptions {
            output: Some(Arc::new(out.clone())),
            new_handler: Some(Arc::new(|mut opts: HandlerOptions| {
                opts.no_color = true;
                opts.replace_attr = Some(drop_time());
                Arc::new(TextHandler::new(opts)) as Arc<dyn Handler>
            })),
            ..Default::default()
        });
        log.info("from factory", args![]);
        assert_eq!(lines(&out), ["INFO from factory"]);
    }
}
