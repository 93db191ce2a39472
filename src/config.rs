use crate::env::{
    parse_flag, LINELOG_LEVEL_ENV, LINELOG_NO_COLOR_ENV, LINELOG_OUTPUT_ENV, LINELOG_PREFIX_ENV,
    LINELOG_TIME_FORMAT_ENV, NO_COLOR_ENV,
};
use crate::error::ConfigError;
use crate::level::Level;
use crate::logger::{Logger, LoggerOptions};
use crate::noop_sink::NoopSink;
use crate::sink::Sink;
use serde::{Deserialize, Serialize};
use std::io;
use std::str::FromStr;
use std::sync::Arc;

/// Where a configured logger writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Stderr,
    Stdout,
    Discard,
}

impl OutputKind {
    pub fn sink(self) -> Arc<dyn Sink> {
        match self {
            OutputKind::Stderr => Arc::new(io::stderr()),
            OutputKind::Stdout => Arc::new(io::stdout()),
            OutputKind::Discard => Arc::new(NoopSink),
        }
    }
}

impl FromStr for OutputKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stderr" => Ok(OutputKind::Stderr),
            "stdout" => Ok(OutputKind::Stdout),
            "discard" | "none" => Ok(OutputKind::Discard),
            _ => Err(()),
        }
    }
}

/// Serializable logger settings.
///
/// ```json
/// { "level": "debug", "prefix": "api", "no_color": true, "output": "stdout" }
/// ```
///
/// Missing fields take their defaults: `INFO`, no prefix, the default time
/// layout, colors on, stderr.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    pub level: Level,
    pub prefix: String,
    pub time_format: String,
    pub no_color: bool,
    pub output: OutputKind,
}

impl LoggerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults overridden by the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = LoggerConfig::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overrides fields from the `LINELOG_*` and `NO_COLOR` variables that
    /// are set.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Like [`apply_env`](Self::apply_env) with an explicit variable lookup.
    pub fn apply_vars(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(level) = lookup(LINELOG_LEVEL_ENV) {
            self.level = level.parse().map_err(|source| ConfigError::Level {
                var: LINELOG_LEVEL_ENV,
                source,
            })?;
        }
        if let Some(prefix) = lookup(LINELOG_PREFIX_ENV) {
            self.prefix = prefix;
        }
        if let Some(format) = lookup(LINELOG_TIME_FORMAT_ENV) {
            self.time_format = format;
        }
        if let Some(flag) = lookup(LINELOG_NO_COLOR_ENV) {
            self.no_color = parse_flag(&flag);
        }
        if lookup(NO_COLOR_ENV).is_some_and(|v| !v.is_empty()) {
            self.no_color = true;
        }
        if let Some(output) = lookup(LINELOG_OUTPUT_ENV) {
            self.output = output.parse().map_err(|()| ConfigError::Output {
                var: LINELOG_OUTPUT_ENV,
                value: output.clone(),
            })?;
        }
        Ok(())
    }

    pub fn options(&self) -> LoggerOptions {
        LoggerOptions {
            prefix: self.prefix.clone(),
            level: self.level,
            time_format: self.time_format.clone(),
            no_color: self.no_color,
            output: Some(self.output.sink()),
            ..Default::default()
        }
    }

    pub fn build(&self) -> Logger {
        Logger::new(self.options())
    }
}
