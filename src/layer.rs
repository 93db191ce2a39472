use crate::attr::{self, Attr};
use crate::level::Level;
use crate::logger::Logger;
use crate::record::Record;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that renders `tracing` events through a
/// [`Logger`].
///
/// The `message` field becomes the record message and every other field an
/// attribute. Events below the logger's level are dropped before any field
/// is visited.
pub struct LoggerLayer {
    logger: Logger,
    target_prefix: bool,
}

impl LoggerLayer {
    pub fn new(logger: Logger) -> Self {
        LoggerLayer {
            logger,
            target_prefix: false,
        }
    }

    /// Use the event target (usually the module path) as the record prefix.
    pub fn with_target_prefix(mut self, enabled: bool) -> Self {
        self.target_prefix = enabled;
        self
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

/// Maps a `tracing` level onto the matching tier.
pub fn from_tracing_level(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::TRACE => Level::TRACE,
        tracing::Level::DEBUG => Level::DEBUG,
        tracing::Level::INFO => Level::INFO,
        tracing::Level::WARN => Level::WARN,
        tracing::Level::ERROR => Level::ERROR,
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let level = from_tracing_level(meta.level());
        if !self.logger.enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut record = Record::new(
            Some(self.logger.now()),
            level,
            visitor.message.unwrap_or_default(),
        );
        if self.target_prefix {
            record.prefix = meta.target().to_string();
        }
        record.add_attrs(visitor.attrs);
        self.logger.log_record(&record);
    }
}

#[derive(Default)]
struct FieldVisitor {
    attrs: Vec<Attr>,
    message: Option<String>,
}

impl FieldVisitor {
    fn push(&mut self, field: &Field, attr: Attr) {
        if field.name() == "message" {
            self.message = Some(attr.value.to_string());
        } else {
            self.attrs.push(attr);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, attr::string(field.name(), value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, attr::int(field.name(), value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, attr::uint(field.name(), value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, attr::float(field.name(), value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, attr::boolean(field.name(), value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        let attr = attr::string(field.name(), value.to_string());
        self.push(field, attr::color(attr::COLOR_BRIGHT_RED, attr));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, attr::string(field.name(), format!("{value:?}")));
    }
}
