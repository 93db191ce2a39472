pub mod attr;
pub mod buffer;
pub mod config;
pub mod env;
pub mod error;
pub mod handler;
#[cfg(feature = "tracing-bridge")]
pub mod init;
#[cfg(feature = "tracing-bridge")]
pub mod layer;
pub mod level;
pub mod logger;
pub mod noop_sink;
pub mod record;
pub mod registry;
pub mod sink;
pub mod util;

pub use attr::{
    any, any_error, boolean, color, display, duration, err, float, group, group_attrs, int, lazy,
    string, text, time, uint, AnyValue, Arg, Attr, ColorValue, Kind, LogValuer, Source,
    TextMarshaler, Value,
};
pub use config::{LoggerConfig, OutputKind};
pub use error::{ConfigError, InitError, LogError, ParseLevelError};
pub use handler::{Handler, HandlerOptions, TextHandler};
#[cfg(feature = "tracing-bridge")]
pub use layer::LoggerLayer;
pub use level::{Level, LevelVar, Leveler};
pub use logger::{Logger, LoggerOptions};
pub use noop_sink::NoopSink;
pub use record::Record;
pub use registry::LoggerRegistry;
pub use sink::{OutputVar, SharedBuffer, Sink, WriterSink};
pub use util::fallback_error;
