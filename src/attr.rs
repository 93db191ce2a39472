use crate::level::Level;
use crate::util::panic_message;
use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Key used for values that arrive without a usable key.
pub const BAD_KEY: &str = "!BADKEY";

/// Palette index of bright red, used by [`err`].
pub const COLOR_BRIGHT_RED: u8 = 9;

const MAX_RESOLVE_DEPTH: usize = 100;

/// A key paired with a typed [`Value`]; the atomic unit of structured data.
///
/// `Attr::default()` is the empty attribute (empty key, nil value). Handlers
/// treat it as absent, and a replace callback returns it to drop an attribute.
#[derive(Clone, Debug, Default)]
pub struct Attr {
    pub key: Cow<'static, str>,
    pub value: Value,
}

impl Attr {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Attr {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Reports whether this is the empty attribute: empty key and nil value.
    ///
    /// An attribute with an empty key but a real value (an inlined group, an
    /// empty-string value) is not empty.
    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && self.value.is_nil()
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Discriminant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Int64,
    Uint64,
    Float64,
    Bool,
    Duration,
    Time,
    Group,
    Any,
    LogValuer,
}

/// Typed payload of an [`Attr`].
#[derive(Clone, Debug)]
pub enum Value {
    String(Cow<'static, str>),
    Int64(i64),
    Uint64(u64),
    Float64(f64),
    Bool(bool),
    Duration(Duration),
    Time(DateTime<FixedOffset>),
    /// Immutable once built. A group with no members counts as absent.
    Group(Arc<[Attr]>),
    /// Opaque value interpreted at render time.
    Any(AnyValue),
    /// Value produced lazily by [`LogValuer::log_value`].
    LogValuer(Arc<dyn LogValuer>),
}

impl Default for Value {
    fn default() -> Self {
        Value::Any(AnyValue::Nil)
    }
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::String(_) => Kind::String,
            Value::Int64(_) => Kind::Int64,
            Value::Uint64(_) => Kind::Uint64,
            Value::Float64(_) => Kind::Float64,
            Value::Bool(_) => Kind::Bool,
            Value::Duration(_) => Kind::Duration,
            Value::Time(_) => Kind::Time,
            Value::Group(_) => Kind::Group,
            Value::Any(_) => Kind::Any,
            Value::LogValuer(_) => Kind::LogValuer,
        }
    }

    /// Builds a group value, dropping members that are themselves empty groups.
    pub fn group(attrs: impl IntoIterator<Item = Attr>) -> Self {
        let attrs: Vec<Attr> = attrs
            .into_iter()
            .filter(|a| !a.value.is_empty_group())
            .collect();
        Value::Group(attrs.into())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Any(AnyValue::Nil))
    }

    pub fn is_empty_group(&self) -> bool {
        matches!(self, Value::Group(attrs) if attrs.is_empty())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Value::Duration(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Value::Time(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&[Attr]> {
        match self {
            Value::Group(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub fn as_any(&self) -> Option<&AnyValue> {
        match self {
            Value::Any(v) => Some(v),
            _ => None,
        }
    }

    /// Follows [`LogValuer`]s until a concrete value is reached.
    ///
    /// A valuer that panics, or a chain longer than 100 hops, resolves to a
    /// diagnostic string instead of propagating.
    pub fn resolve(self) -> Value {
        let mut v = self;
        for _ in 0..MAX_RESOLVE_DEPTH {
            let valuer = match &v {
                Value::LogValuer(valuer) => Arc::clone(valuer),
                _ => return v,
            };
            v = match panic::catch_unwind(AssertUnwindSafe(|| valuer.log_value())) {
                Ok(next) => next,
                Err(payload) => {
                    return Value::String(
                        format!("!PANIC: LogValue panicked: {}", panic_message(&*payload)).into(),
                    )
                }
            };
        }
        Value::String("!ERROR: LogValue called too many times".into())
    }
}

/// Plain textual form, used by the `{}` formatter and diagnostics. Handlers
/// render values themselves and do not go through this.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Uint64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Duration(d) => f.write_str(&crate::util::format_duration(*d)),
            Value::Time(t) => f.write_str(&crate::util::format_rfc3339_millis(t)),
            Value::Group(attrs) => {
                f.write_str("[")?;
                for (i, a) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{a}")?;
                }
                f.write_str("]")
            }
            Value::Any(v) => f.write_str(&v.to_text().unwrap_or_else(|e| e)),
            Value::LogValuer(_) => write!(f, "{}", self.clone().resolve()),
        }
    }
}

/// Capability for values that know their own textual form.
pub trait TextMarshaler: Send + Sync {
    fn marshal_text(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

/// A value that produces another [`Value`] when rendered.
pub trait LogValuer: Send + Sync + fmt::Debug {
    fn log_value(&self) -> Value;

    /// Palette color a capable handler should render this value with.
    fn color(&self) -> Option<u8> {
        None
    }
}

/// Wraps a value with an 8-bit palette color.
///
/// Resolves transparently to the wrapped value, so handlers without color
/// support render it like any other value.
#[derive(Debug, Clone)]
pub struct ColorValue {
    pub value: Value,
    pub color: u8,
}

impl LogValuer for ColorValue {
    fn log_value(&self) -> Value {
        self.value.clone()
    }

    fn color(&self) -> Option<u8> {
        Some(self.color)
    }
}

/// A source-code location, rendered as `dir/file:line`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub function: Cow<'static, str>,
    pub file: Cow<'static, str>,
    pub line: u32,
}

impl Source {
    /// Location of the caller of the `#[track_caller]` chain ending here.
    #[track_caller]
    pub fn caller() -> Self {
        let loc = std::panic::Location::caller();
        Source {
            function: Cow::Borrowed(""),
            file: Cow::Borrowed(loc.file()),
            line: loc.line(),
        }
    }

    /// Last directory component joined with the file name.
    pub fn short_file(&self) -> String {
        let path = Path::new(self.file.as_ref());
        let file = path
            .file_name()
            .map(|f| f.to_string_lossy())
            .unwrap_or_default();
        match path
            .parent()
            .and_then(|p| p.file_name())
            .map(|d| d.to_string_lossy())
        {
            Some(dir) => format!("{dir}/{file}"),
            None => file.into_owned(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.short_file(), self.line)
    }
}

/// Opaque payload of [`Value::Any`], tagged with the capability the renderer
/// uses to turn it into text.
#[derive(Clone)]
pub enum AnyValue {
    Nil,
    Level(Level),
    Source(Source),
    Text(Arc<dyn TextMarshaler>),
    Error(Arc<dyn std::error::Error + Send + Sync>),
    Display(Arc<dyn fmt::Display + Send + Sync>),
    Debug(Arc<dyn fmt::Debug + Send + Sync>),
    Json(serde_json::Value),
}

impl AnyValue {
    /// Text for this value, or a diagnostic placeholder in `Err`.
    ///
    /// User formatting code runs under `catch_unwind`; a panic yields
    /// `Err("!PANIC: <message>")`, and a failed text marshal yields
    /// `Err("!ERROR: <message>")`.
    pub fn to_text(&self) -> Result<String, String> {
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| match self {
            AnyValue::Nil => Ok("<nil>".to_string()),
            AnyValue::Level(l) => Ok(l.to_string()),
            AnyValue::Source(s) => Ok(s.to_string()),
            AnyValue::Text(t) => t.marshal_text().map_err(|e| format!("!ERROR: {e}")),
            AnyValue::Error(e) => Ok(e.to_string()),
            AnyValue::Display(d) => Ok(d.to_string()),
            AnyValue::Debug(d) => Ok(format!("{d:?}")),
            AnyValue::Json(j) => Ok(j.to_string()),
        }));
        match rendered {
            Ok(result) => result,
            Err(payload) => Err(format!("!PANIC: {}", panic_message(&*payload))),
        }
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyValue::Nil => f.write_str("Nil"),
            AnyValue::Level(l) => f.debug_tuple("Level").field(l).finish(),
            AnyValue::Source(s) => f.debug_tuple("Source").field(s).finish(),
            AnyValue::Text(_) => f.write_str("Text(..)"),
            AnyValue::Error(e) => f.debug_tuple("Error").field(e).finish(),
            AnyValue::Display(_) => f.write_str("Display(..)"),
            AnyValue::Debug(d) => f.debug_tuple("Debug").field(d).finish(),
            AnyValue::Json(j) => f.debug_tuple("Json").field(j).finish(),
        }
    }
}

macro_rules! value_from {
    ($($t:ty => |$v:ident| $e:expr;)*) => {
        $(
            impl From<$t> for Value {
                fn from($v: $t) -> Self {
                    $e
                }
            }
        )*
    };
}

value_from! {
    &'static str => |v| Value::String(Cow::Borrowed(v));
    String => |v| Value::String(Cow::Owned(v));
    Cow<'static, str> => |v| Value::String(v);
    i8 => |v| Value::Int64(v.into());
    i16 => |v| Value::Int64(v.into());
    i32 => |v| Value::Int64(v.into());
    i64 => |v| Value::Int64(v);
    isize => |v| Value::Int64(v as i64);
    u8 => |v| Value::Uint64(v.into());
    u16 => |v| Value::Uint64(v.into());
    u32 => |v| Value::Uint64(v.into());
    u64 => |v| Value::Uint64(v);
    usize => |v| Value::Uint64(v as u64);
    f32 => |v| Value::Float64(v.into());
    f64 => |v| Value::Float64(v);
    bool => |v| Value::Bool(v);
    Duration => |v| Value::Duration(v);
    DateTime<FixedOffset> => |v| Value::Time(v);
    DateTime<Utc> => |v| Value::Time(v.fixed_offset());
    DateTime<Local> => |v| Value::Time(v.fixed_offset());
    Level => |v| Value::Any(AnyValue::Level(v));
    Source => |v| Value::Any(AnyValue::Source(v));
    AnyValue => |v| Value::Any(v);
}

/// JSON objects become groups; arrays and `null` stay opaque.
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Any(AnyValue::Nil),
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint64(u)
                } else {
                    Value::Float64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(Cow::Owned(s)),
            serde_json::Value::Object(map) => {
                Value::group(map.into_iter().map(|(k, v)| Attr::new(k, v)))
            }
            array @ serde_json::Value::Array(_) => Value::Any(AnyValue::Json(array)),
        }
    }
}

/// Attribute with a string value.
pub fn string(key: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Attr {
    Attr {
        key: key.into(),
        value: Value::String(value.into()),
    }
}

/// Attribute with a signed integer, widened to `i64`.
pub fn int(key: impl Into<Cow<'static, str>>, value: impl Into<i64>) -> Attr {
    Attr {
        key: key.into(),
        value: Value::Int64(value.into()),
    }
}

/// Attribute with an unsigned integer, widened to `u64`.
pub fn uint(key: impl Into<Cow<'static, str>>, value: impl Into<u64>) -> Attr {
    Attr {
        key: key.into(),
        value: Value::Uint64(value.into()),
    }
}

/// Attribute with a float, widened to `f64`.
pub fn float(key: impl Into<Cow<'static, str>>, value: impl Into<f64>) -> Attr {
    Attr {
        key: key.into(),
        value: Value::Float64(value.into()),
    }
}

pub fn boolean(key: impl Into<Cow<'static, str>>, value: impl Into<bool>) -> Attr {
    Attr {
        key: key.into(),
        value: Value::Bool(value.into()),
    }
}

pub fn time<Tz: TimeZone>(key: impl Into<Cow<'static, str>>, value: DateTime<Tz>) -> Attr {
    Attr {
        key: key.into(),
        value: Value::Time(value.fixed_offset()),
    }
}

pub fn duration(key: impl Into<Cow<'static, str>>, value: Duration) -> Attr {
    Attr {
        key: key.into(),
        value: Value::Duration(value),
    }
}

/// Group built from a flexible argument list (see [`parse_args`]).
///
/// No members gives the empty group, which records and handlers skip.
pub fn group<I>(key: impl Into<Cow<'static, str>>, args: I) -> Attr
where
    I: IntoIterator<Item = Arg>,
{
    Attr {
        key: key.into(),
        value: Value::group(ArgParser::new(args)),
    }
}

/// Group built from ready-made attributes.
pub fn group_attrs<I>(key: impl Into<Cow<'static, str>>, attrs: I) -> Attr
where
    I: IntoIterator<Item = Attr>,
{
    Attr {
        key: key.into(),
        value: Value::group(attrs),
    }
}

/// Opaque value rendered through its `Debug` implementation.
pub fn any<T>(key: impl Into<Cow<'static, str>>, value: T) -> Attr
where
    T: fmt::Debug + Send + Sync + 'static,
{
    Attr {
        key: key.into(),
        value: Value::Any(AnyValue::Debug(Arc::new(value))),
    }
}

/// Opaque value rendered through its `Display` implementation.
pub fn display<T>(key: impl Into<Cow<'static, str>>, value: T) -> Attr
where
    T: fmt::Display + Send + Sync + 'static,
{
    Attr {
        key: key.into(),
        value: Value::Any(AnyValue::Display(Arc::new(value))),
    }
}

/// Opaque value rendered through [`TextMarshaler::marshal_text`].
pub fn text<T>(key: impl Into<Cow<'static, str>>, value: T) -> Attr
where
    T: TextMarshaler + 'static,
{
    Attr {
        key: key.into(),
        value: Value::Any(AnyValue::Text(Arc::new(value))),
    }
}

pub fn any_error<E>(key: impl Into<Cow<'static, str>>, err: E) -> Attr
where
    E: std::error::Error + Send + Sync + 'static,
{
    Attr {
        key: key.into(),
        value: Value::Any(AnyValue::Error(Arc::new(err))),
    }
}

/// Lazily evaluated attribute.
pub fn lazy<V>(key: impl Into<Cow<'static, str>>, valuer: V) -> Attr
where
    V: LogValuer + 'static,
{
    Attr {
        key: key.into(),
        value: Value::LogValuer(Arc::new(valuer)),
    }
}

/// Re-wraps `attr` so that a color-capable handler renders it in `color`.
///
/// `color` indexes the 8-bit ANSI palette: 0-7 standard, 8-15 bright,
/// 16-231 a 6x6x6 cube, 232-255 grayscale.
pub fn color(color: u8, attr: Attr) -> Attr {
    Attr {
        key: attr.key,
        value: Value::LogValuer(Arc::new(ColorValue {
            value: attr.value,
            color,
        })),
    }
}

/// `error=<err>` rendered in bright red.
pub fn err<E>(err: E) -> Attr
where
    E: std::error::Error + Send + Sync + 'static,
{
    color(COLOR_BRIGHT_RED, any_error("error", err))
}

/// One item of a flexible argument list: a ready-made attribute, or a bare
/// value that pairs with its neighbour.
#[derive(Clone, Debug)]
pub enum Arg {
    Attr(Attr),
    Value(Value),
}

impl Arg {
    fn into_value(self) -> Value {
        match self {
            Arg::Value(v) => v,
            Arg::Attr(a) => Value::group([a]),
        }
    }
}

impl From<Attr> for Arg {
    fn from(a: Attr) -> Self {
        Arg::Attr(a)
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Value(v)
    }
}

macro_rules! arg_from_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Arg::Value(v.into())
                }
            }
        )*
    };
}

arg_from_value!(
    &'static str,
    String,
    Cow<'static, str>,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    bool,
    Duration,
    DateTime<FixedOffset>,
    DateTime<Utc>,
    DateTime<Local>,
    Level,
    Source,
    AnyValue,
    serde_json::Value,
);

/// Builds an array of [`Arg`]s from mixed attributes and key/value items.
///
/// ```
/// use linelog::{args, string};
/// let list = args!["method", "GET", string("path", "/"), "status", 200];
/// assert_eq!(list.len(), 5);
/// ```
#[macro_export]
macro_rules! args {
    () => {{
        let empty: [$crate::Arg; 0] = [];
        empty
    }};
    ($($arg:expr),+ $(,)?) => {
        [$($crate::Arg::from($arg)),+]
    };
}

/// Turns a flexible argument list into attributes, one per step.
///
/// - an [`Arg::Attr`] is taken as-is;
/// - a string value is a key for the following item; a trailing string with
///   nothing after it becomes `!BADKEY=<string>`;
/// - any other value becomes `!BADKEY=<value>`.
///
/// Never fails: malformed input degrades to `!BADKEY` attributes.
pub struct ArgParser<I: Iterator<Item = Arg>> {
    args: I,
}

impl<I: Iterator<Item = Arg>> ArgParser<I> {
    pub fn new(args: impl IntoIterator<Item = Arg, IntoIter = I>) -> Self {
        ArgParser {
            args: args.into_iter(),
        }
    }
}

impl<I: Iterator<Item = Arg>> Iterator for ArgParser<I> {
    type Item = Attr;

    fn next(&mut self) -> Option<Attr> {
        match self.args.next()? {
            Arg::Attr(a) => Some(a),
            Arg::Value(Value::String(key)) => match self.args.next() {
                Some(value) => Some(Attr {
                    key,
                    value: value.into_value(),
                }),
                None => Some(Attr {
                    key: Cow::Borrowed(BAD_KEY),
                    value: Value::String(key),
                }),
            },
            Arg::Value(value) => Some(Attr {
                key: Cow::Borrowed(BAD_KEY),
                value,
            }),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo, hi) = self.args.size_hint();
        ((lo + 1) / 2, hi)
    }
}

/// Collects a flexible argument list into attributes.
pub fn parse_args<I>(args: I) -> Vec<Attr>
where
    I: IntoIterator<Item = Arg>,
{
    ArgParser::new(args).collect()
}

/// Separates ready-made attributes from everything else, keeping the
/// relative order of each side.
pub fn split_attrs<I>(args: I) -> (Vec<Attr>, Vec<Value>)
where
    I: IntoIterator<Item = Arg>,
{
    let iter = args.into_iter();
    let (lo, _) = iter.size_hint();
    let mut attrs = Vec::with_capacity(lo);
    let mut rest = Vec::with_capacity(lo);
    for arg in iter {
        match arg {
            Arg::Attr(a) => attrs.push(a),
            Arg::Value(v) => rest.push(v),
        }
    }
    (attrs, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MyInt8(i8);

    impl From<MyInt8> for i64 {
        fn from(v: MyInt8) -> i64 {
            v.0.into()
        }
    }

    struct MyUint16(u16);

    impl From<MyUint16> for u64 {
        fn from(v: MyUint16) -> u64 {
            v.0.into()
        }
    }

    #[derive(Debug)]
    struct Fails;

    impl fmt::Display for Fails {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("boom")
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn integer_constructors_normalize_to_i64() {
        assert_eq!(int("k", 8i8).value.as_i64(), Some(8));
        assert_eq!(int("k", 16i16).value.as_i64(), Some(16));
        assert_eq!(int("k", 32i32).value.as_i64(), Some(32));
        assert_eq!(int("k", MyInt8(8)).value.as_i64(), int("k", 8i64).value.as_i64());
        assert_eq!(int("status", 200).key, "status");
    }

    #[test]
    fn unsigned_and_float_constructors_normalize() {
        assert_eq!(uint("k", 8u8).value.as_u64(), Some(8));
        assert_eq!(uint("k", MyUint16(64)).value.as_u64(), Some(64));
        assert_eq!(float("k", 1.25f32).value.as_f64(), Some(1.25));
        assert_eq!(float("k", 2.5f64).value.as_f64(), Some(2.5));
        assert_eq!(boolean("k", true).value.as_bool(), Some(true));
    }

    #[test]
    fn time_and_duration_constructors() {
        let now = Utc::now();
        let a = time("time", now);
        assert_eq!(a.value.as_time().map(|t| t.timestamp_nanos_opt()), Some(now.timestamp_nanos_opt()));
        let d = duration("elapsed", Duration::from_millis(1500));
        assert_eq!(d.value.as_duration(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn group_from_args_and_empty_group() {
        let g = group("req", args!["method", "GET", int("status", 200)]);
        assert_eq!(g.value.kind(), Kind::Group);
        let members = g.value.as_group().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].key, "method");
        assert_eq!(members[1].key, "status");

        let empty = group("nothing", args![]);
        assert!(empty.value.is_empty_group());
    }

    #[test]
    fn group_drops_nested_empty_groups() {
        let g = group_attrs("outer", [group_attrs("inner", []), string("a", "b")]);
        assert_eq!(g.value.as_group().unwrap().len(), 1);
    }

    #[test]
    fn empty_attr_sentinel() {
        assert!(Attr::default().is_empty());
        assert!(!string("", "").is_empty());
        assert!(!Attr::new("k", AnyValue::Nil).is_empty());
    }

    #[test]
    fn color_wraps_and_resolves_transparently() {
        let a = color(42, string("key", "value"));
        assert_eq!(a.key, "key");
        assert_eq!(a.value.kind(), Kind::LogValuer);
        match &a.value {
            Value::LogValuer(v) => assert_eq!(v.color(), Some(42)),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(a.value.resolve().as_str(), Some("value"));
    }

    #[test]
    fn err_is_bright_red_error_attr() {
        let a = err(DiskFull);
        assert_eq!(a.key, "error");
        match &a.value {
            Value::LogValuer(v) => assert_eq!(v.color(), Some(COLOR_BRIGHT_RED)),
            other => panic!("unexpected {other:?}"),
        }
        let resolved = a.value.resolve();
        assert_eq!(resolved.as_any().unwrap().to_text(), Ok("disk full".to_string()));
    }

    #[test]
    fn any_text_catches_panics() {
        let a = display("bad", Fails);
        let text = a.value.as_any().unwrap().to_text();
        assert_eq!(text, Err("!PANIC: boom".to_string()));
        assert_eq!(AnyValue::Nil.to_text(), Ok("<nil>".to_string()));
    }

    #[test]
    fn parse_args_rules() {
        let attrs = parse_args(args!["a", 1, string("b", "x"), 7, "dangling"]);
        assert_eq!(attrs.len(), 4);
        assert_eq!(attrs[0].key, "a");
        assert_eq!(attrs[0].value.as_i64(), Some(1));
        assert_eq!(attrs[1].key, "b");
        assert_eq!(attrs[2].key, BAD_KEY);
        assert_eq!(attrs[2].value.as_i64(), Some(7));
        assert_eq!(attrs[3].key, BAD_KEY);
        assert_eq!(attrs[3].value.as_str(), Some("dangling"));
        assert!(parse_args(args![]).is_empty());
    }

    #[test]
    fn parse_args_string_key_followed_by_attr_nests_it() {
        let attrs = parse_args(args!["wrap", string("inner", "v")]);
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].key, "wrap");
        assert_eq!(attrs[0].value.as_group().unwrap()[0].key, "inner");
    }

    #[test]
    fn split_attrs_partitions() {
        let (attrs, rest) = split_attrs(args![string("a", "1"), 5, "x", int("b", 2)]);
        assert_eq!(attrs.len(), 2);
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].as_i64(), Some(5));
        assert_eq!(rest[1].as_str(), Some("x"));
    }

    #[test]
    fn json_values_convert() {
        let v: Value = serde_json::json!({"user": {"id": 7}, "tags": ["a"]}).into();
        let members = v.as_group().unwrap();
        assert_eq!(members[0].key, "tags");
        assert_eq!(members[0].value.kind(), Kind::Any);
        assert_eq!(members[1].key, "user");
        assert_eq!(members[1].value.as_group().unwrap()[0].value.as_i64(), Some(7));
    }

    #[test]
    fn source_short_file() {
        let src = Source {
            function: "main".into(),
            file: "/home/me/project/src/main.rs".into(),
            line: 42,
        };
        assert_eq!(src.to_string(), "src/main.rs:42");
    }
}
