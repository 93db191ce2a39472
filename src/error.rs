use std::io;

/// Error returned when a rendered line could not be delivered.
#[derive(thiserror::Error, Debug)]
pub enum LogError {
    #[error("unable to write log message: {0}")]
    Write(#[from] io::Error),
}

/// Error returned when parsing a [`Level`](crate::level::Level) name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseLevelError {
    #[error("level string {0:?}: unknown name")]
    UnknownName(String),

    #[error("level string {0:?}: invalid offset")]
    InvalidOffset(String),
}

/// Error returned when loading a [`LoggerConfig`](crate::config::LoggerConfig).
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid logger config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for {var}: {source}")]
    Level {
        var: &'static str,
        #[source]
        source: ParseLevelError,
    },

    #[error("invalid value for {var}: unknown output {value:?}")]
    Output { var: &'static str, value: String },
}

/// Error returned by the [`init`](crate::init) helpers.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unable to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}
