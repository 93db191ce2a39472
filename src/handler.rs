use crate::attr::{self, AnyValue, Attr, Value};
use crate::buffer::Buffer;
use crate::error::LogError;
use crate::level::{Level, Leveler};
use crate::record::Record;
use crate::sink::Sink;
use crate::util::{
    append_ansi, append_string, format_rfc3339_millis, ANSI_BRIGHT_CYAN, ANSI_BRIGHT_GREEN,
    ANSI_BRIGHT_RED, ANSI_BRIGHT_YELLOW, ANSI_FAINT, ANSI_GRAY, ANSI_RESET, ANSI_RESET_FAINT,
    ANSI_WHITE,
};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset};
use std::borrow::Cow;
use std::io::{self, Write as _};
use std::sync::Arc;

/// Key under which the record time is offered to [`HandlerOptions::replace_attr`].
pub const TIME_KEY: &str = "time";
/// Key under which the record level is offered to [`HandlerOptions::replace_attr`].
pub const LEVEL_KEY: &str = "level";
/// Key under which the record message is offered to [`HandlerOptions::replace_attr`].
pub const MESSAGE_KEY: &str = "msg";
/// Key under which the line prefix is offered to [`HandlerOptions::replace_attr`].
pub const PREFIX_KEY: &str = "prefix";

/// Default `strftime` layout for the record time, e.g. `Mar  9 10:20:30.123`.
pub const DEFAULT_TIME_FORMAT: &str = "%b %e %H:%M:%S%.3f";

/// Rewrites one non-group attribute before it is rendered. Receives the
/// enclosing group names, outermost first. Returning an attribute with an
/// empty key and nil value drops it.
pub type ReplaceAttr = Arc<dyn Fn(&[String], Attr) -> Attr + Send + Sync>;

/// Renders a level label in place of the default `INFO`, `WARN+1`, ...
pub type LevelFormat = Arc<dyn Fn(Level) -> String + Send + Sync>;

/// Turns [`Record`]s into output.
///
/// Every method may be called concurrently. Derivation (`with_*`) never
/// mutates the receiver: it returns a new handler, or the receiver itself
/// when there is nothing to add.
pub trait Handler: Send + Sync {
    /// Reports whether records at `level` would be handled. Called before any
    /// argument processing so that disabled events cost nothing.
    fn enabled(&self, level: Level) -> bool;

    /// Render one record and write it to the output.
    ///
    /// **Parameters**
    /// - `record`: the event; only called when [`enabled`](Self::enabled)
    ///   is true for its level.
    ///
    /// **Returns**
    /// - `Ok(())` once the whole line has been handed to the sink.
    /// - `Err(LogError::Write)` if the sink failed. The line is not retried.
    fn handle(&self, record: &Record) -> Result<(), LogError>;

    /// Handler whose output includes `attrs` on every line.
    fn with_attrs(self: Arc<Self>, attrs: Vec<Attr>) -> Arc<dyn Handler>;

    /// Handler that qualifies all later attribute keys with `name`.
    fn with_group(self: Arc<Self>, name: &str) -> Arc<dyn Handler>;

    /// Handler whose prefix is `prefix` followed by the current one.
    fn with_prefix(self: Arc<Self>, prefix: &str) -> Arc<dyn Handler>;
}

/// Options for a [`TextHandler`].
#[derive(Clone)]
pub struct HandlerOptions {
    /// Minimum level handled. `None` means [`Level::INFO`]. Pass a shared
    /// [`LevelVar`](crate::level::LevelVar) to change it at runtime.
    pub level: Option<Arc<dyn Leveler>>,

    pub replace_attr: Option<ReplaceAttr>,

    /// `strftime` layout for the record time. Empty or invalid means
    /// [`DEFAULT_TIME_FORMAT`].
    pub time_format: String,

    pub level_format: Option<LevelFormat>,

    /// Disable ANSI colors.
    pub no_color: bool,

    /// Destination of rendered lines.
    pub output: Arc<dyn Sink>,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        HandlerOptions {
            level: None,
            replace_attr: None,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            level_format: None,
            no_color: false,
            output: Arc::new(io::stderr()),
        }
    }
}

/// Renders each record as one line of space-separated fields:
///
/// ```text
/// <level> <time> [<prefix>] <message> <key>=<value> <group>.<key>=<value>
/// ```
///
/// Colorized for terminals unless [`HandlerOptions::no_color`] is set.
#[derive(Clone)]
pub struct TextHandler {
    attrs_prefix: Vec<u8>,
    group_prefix: String,
    groups: Vec<String>,
    prefix: String,
    opts: Arc<HandlerOptions>,
}

impl TextHandler {
    /// Create a handler with no bound attributes, groups or prefix.
    ///
    /// **Parameters**
    /// - `opts`: [`HandlerOptions`]. An empty or unparsable `time_format`
    ///   is replaced by [`DEFAULT_TIME_FORMAT`] here, so rendering never
    ///   fails on the layout.
    pub fn new(mut opts: HandlerOptions) -> Self {
        if !valid_time_format(&opts.time_format) {
            opts.time_format = DEFAULT_TIME_FORMAT.to_string();
        }
        TextHandler {
            attrs_prefix: Vec::new(),
            group_prefix: String::new(),
            groups: Vec::new(),
            prefix: String::new(),
            opts: Arc::new(opts),
        }
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.opts
    }

    /// Prefix added through [`Handler::with_prefix`].
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Group names added through [`Handler::with_group`], outermost first.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    fn color(&self) -> bool {
        !self.opts.no_color
    }

    /// Resolves `v` and, when colors are on, picks up the palette color of a
    /// color-tagged valuer.
    fn resolve<'v>(&self, v: &'v Value) -> (Cow<'v, Value>, Option<u8>) {
        match v {
            Value::LogValuer(valuer) => {
                if self.color() {
                    if let Some(c) = valuer.color() {
                        return (Cow::Owned(v.clone().resolve()), Some(c));
                    }
                }
                (Cow::Owned(v.clone().resolve()), None)
            }
            _ => (Cow::Borrowed(v), None),
        }
    }

    fn replace(&self, key: &'static str, value: Value) -> Option<(Value, Option<u8>)> {
        let rep = self.opts.replace_attr.as_ref()?;
        let a = rep(&[], Attr::new(key, value));
        if a.key.is_empty() {
            return None;
        }
        let (v, c) = self.resolve(&a.value);
        Some((v.into_owned(), c))
    }

    fn append_level(&self, buf: &mut Vec<u8>, level: Level, color: Option<u8>) {
        if self.color() {
            match color {
                Some(c) => append_ansi(buf, c, false),
                None => buf.extend_from_slice(level_color(level).as_bytes()),
            }
        }
        match &self.opts.level_format {
            Some(f) => buf.extend_from_slice(f(level).as_bytes()),
            None => {
                let _ = write!(buf, "{level}");
            }
        }
        if self.color() {
            buf.extend_from_slice(ANSI_RESET.as_bytes());
        }
    }

    fn append_time(&self, buf: &mut Vec<u8>, t: &DateTime<FixedOffset>, color: Option<u8>) {
        if self.color() {
            match color {
                Some(c) => append_ansi(buf, c, true),
                None => buf.extend_from_slice(ANSI_FAINT.as_bytes()),
            }
        }
        let _ = write!(buf, "{}", t.format(&self.opts.time_format));
        if self.color() {
            buf.extend_from_slice(ANSI_RESET.as_bytes());
        }
    }

    fn append_attr(&self, buf: &mut Vec<u8>, attr: &Attr, groups_prefix: &str, groups: &[String]) {
        let (value, mut color) = self.resolve(&attr.value);
        if let Some(rep) = &self.opts.replace_attr {
            if !matches!(*value, Value::Group(_)) {
                let replaced = rep(
                    groups,
                    Attr {
                        key: attr.key.clone(),
                        value: value.into_owned(),
                    },
                );
                let (value, replaced_color) = self.resolve(&replaced.value);
                if replaced_color.is_some() {
                    color = replaced_color;
                }
                self.append_resolved(buf, &replaced.key, &value, color, groups_prefix, groups);
                return;
            }
        }
        self.append_resolved(buf, &attr.key, &value, color, groups_prefix, groups);
    }

    fn append_resolved(
        &self,
        buf: &mut Vec<u8>,
        key: &str,
        value: &Value,
        color: Option<u8>,
        groups_prefix: &str,
        groups: &[String],
    ) {
        if key.is_empty() && value.is_nil() {
            return;
        }

        if let Value::Group(members) = value {
            if key.is_empty() {
                for m in members.iter() {
                    self.append_attr(buf, m, groups_prefix, groups);
                }
            } else {
                let nested_prefix = format!("{groups_prefix}{key}.");
                let mut nested = groups.to_vec();
                nested.push(key.to_string());
                for m in members.iter() {
                    self.append_attr(buf, m, &nested_prefix, &nested);
                }
            }
            return;
        }

        if !self.color() {
            self.append_key(buf, key, groups_prefix);
            self.append_value(buf, value, true);
        } else if let Some(c) = color {
            append_ansi(buf, c, true);
            self.append_key(buf, key, groups_prefix);
            buf.extend_from_slice(ANSI_RESET_FAINT.as_bytes());
            self.append_value(buf, value, true);
            buf.extend_from_slice(ANSI_RESET.as_bytes());
        } else {
            buf.extend_from_slice(ANSI_FAINT.as_bytes());
            self.append_key(buf, key, groups_prefix);
            buf.extend_from_slice(ANSI_RESET.as_bytes());
            self.append_value(buf, value, true);
        }
        buf.push(b' ');
    }

    fn append_key(&self, buf: &mut Vec<u8>, key: &str, groups_prefix: &str) {
        if groups_prefix.is_empty() {
            append_string(buf, key, true, self.color());
        } else {
            append_string(buf, &format!("{groups_prefix}{key}"), true, self.color());
        }
        buf.push(b'=');
    }

    fn append_value(&self, buf: &mut Vec<u8>, value: &Value, quote: bool) {
        let color = self.color();
        match value {
            Value::String(s) => append_string(buf, s, quote, color),
            Value::Int64(v) => {
                let _ = write!(buf, "{v}");
            }
            Value::Uint64(v) => {
                let _ = write!(buf, "{v}");
            }
            Value::Float64(v) => {
                let _ = write!(buf, "{v}");
            }
            Value::Bool(v) => {
                let _ = write!(buf, "{v}");
            }
            Value::Duration(d) => {
                append_string(buf, &crate::util::format_duration(*d), quote, color)
            }
            Value::Time(t) => buf.extend_from_slice(format_rfc3339_millis(t).as_bytes()),
            Value::Any(AnyValue::Source(src)) => {
                let _ = write!(buf, "{src}");
            }
            Value::Any(any) => match any.to_text() {
                Ok(text) => append_string(buf, &text, quote, color),
                Err(placeholder) => append_string(buf, &placeholder, true, color),
            },
            Value::Group(members) => {
                buf.push(b'{');
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    buf.extend_from_slice(m.key.as_bytes());
                    buf.push(b':');
                    self.append_value(buf, &m.value, true);
                }
                buf.push(b'}');
            }
            Value::LogValuer(_) => self.append_value(buf, &value.clone().resolve(), quote),
        }
    }

    fn append_tint_value(
        &self,
        buf: &mut Vec<u8>,
        value: &Value,
        quote: bool,
        color: Option<u8>,
        faint: bool,
    ) {
        if !self.color() {
            self.append_value(buf, value, quote);
            return;
        }
        match color {
            Some(c) => append_ansi(buf, c, faint),
            None if faint => buf.extend_from_slice(ANSI_FAINT.as_bytes()),
            None => {}
        }
        self.append_value(buf, value, quote);
        if color.is_some() || faint {
            buf.extend_from_slice(ANSI_RESET.as_bytes());
        }
    }

    fn derive(&self) -> TextHandler {
        self.clone()
    }
}

fn valid_time_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

fn level_color(level: Level) -> &'static str {
    match level {
        Level::TRACE => ANSI_GRAY,
        Level::DEBUG => ANSI_BRIGHT_CYAN,
        Level::INFO => ANSI_WHITE,
        Level::WARN => ANSI_BRIGHT_GREEN,
        Level::ERROR => ANSI_BRIGHT_YELLOW,
        Level::PANIC => ANSI_BRIGHT_RED,
        l if l <= Level::TRACE => ANSI_GRAY,
        _ => ANSI_BRIGHT_RED,
    }
}

impl Handler for TextHandler {
    fn enabled(&self, level: Level) -> bool {
        let min = self
            .opts
            .level
            .as_ref()
            .map_or(Level::INFO, |l| l.level());
        level >= min
    }

    fn handle(&self, record: &Record) -> Result<(), LogError> {
        let mut buf = Buffer::get();
        let rep = self.opts.replace_attr.is_some();

        if !rep {
            self.append_level(&mut buf, record.level, None);
            buf.push(b' ');
        } else if let Some((value, color)) = self.replace(LEVEL_KEY, record.level.into()) {
            match value {
                Value::Any(AnyValue::Level(l)) => self.append_level(&mut buf, l, color),
                other => self.append_tint_value(&mut buf, &other, false, color, false),
            }
            buf.push(b' ');
        }

        if let Some(t) = &record.time {
            if !rep {
                self.append_time(&mut buf, t, None);
                buf.push(b' ');
            } else if let Some((value, color)) = self.replace(TIME_KEY, Value::Time(*t)) {
                match value {
                    Value::Time(t) => self.append_time(&mut buf, &t, color),
                    other => self.append_tint_value(&mut buf, &other, false, color, true),
                }
                buf.push(b' ');
            }
        }

        let prefix: Cow<'_, str> = match (self.prefix.is_empty(), record.prefix.is_empty()) {
            (true, _) => Cow::Borrowed(&record.prefix),
            (false, true) => Cow::Borrowed(&self.prefix),
            (false, false) => Cow::Owned(format!("{}{}", self.prefix, record.prefix)),
        };
        if !prefix.is_empty() {
            if !rep {
                buf.push(b'[');
                buf.extend_from_slice(prefix.as_bytes());
                buf.extend_from_slice(b"] ");
            } else if let Some((value, color)) =
                self.replace(PREFIX_KEY, Value::String(prefix.into_owned().into()))
            {
                buf.push(b'[');
                self.append_tint_value(&mut buf, &value, false, color, true);
                buf.extend_from_slice(b"] ");
            }
        }

        if !rep {
            if !record.message.is_empty() {
                buf.extend_from_slice(record.message.as_bytes());
                buf.push(b' ');
            }
        } else if let Some((value, color)) =
            self.replace(MESSAGE_KEY, Value::String(record.message.clone().into()))
        {
            self.append_tint_value(&mut buf, &value, false, color, false);
            buf.push(b' ');
        }

        buf.extend_from_slice(&self.attrs_prefix);

        for a in record {
            self.append_attr(&mut buf, a, &self.group_prefix, &self.groups);
        }

        match buf.last_mut() {
            Some(last) if *last == b' ' => *last = b'\n',
            _ => buf.push(b'\n'),
        }

        self.opts.output.write(&buf)?;
        Ok(())
    }

    fn with_attrs(self: Arc<Self>, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        if attrs.is_empty() {
            return self;
        }
        let mut buf = Buffer::get();
        for a in &attrs {
            self.append_attr(&mut buf, a, &self.group_prefix, &self.groups);
        }
        let mut h = self.derive();
        h.attrs_prefix.extend_from_slice(&buf);
        Arc::new(h)
    }

    fn with_group(self: Arc<Self>, name: &str) -> Arc<dyn Handler> {
        if name.is_empty() {
            return self;
        }
        let mut h = self.derive();
        h.group_prefix.push_str(name);
        h.group_prefix.push('.');
        h.groups.push(name.to_string());
        Arc::new(h)
    }

    fn with_prefix(self: Arc<Self>, prefix: &str) -> Arc<dyn Handler> {
        if prefix.is_empty() {
            return self;
        }
        let mut h = self.derive();
        h.prefix = format!("{prefix}{}", self.prefix);
        Arc::new(h)
    }
}

/// Builds a [`TextHandler`] behind the trait object loggers store.
pub fn new_text_handler(opts: HandlerOptions) -> Arc<dyn Handler> {
    Arc::new(TextHandler::new(opts))
}

/// Drops the built-in time field; a ready-made `replace_attr` for
/// deterministic output.
pub fn drop_time() -> ReplaceAttr {
    Arc::new(|groups: &[String], a: Attr| {
        if groups.is_empty() && a.key == TIME_KEY && a.value.as_time().is_some() {
            Attr::default()
        } else {
            a
        }
    })
}

/// Wraps the value of every attribute named `key` in `color`.
pub fn color_key(key: &'static str, color: u8) -> ReplaceAttr {
    Arc::new(move |_: &[String], a: Attr| {
        if a.key == key {
            attr::color(color, a)
        } else {
            a
        }
    })
}
