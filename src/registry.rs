use crate::logger::{Logger, LoggerOptions};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};

/// Builds the logger for a channel the first time it is requested.
pub type LoggerFactory = Box<dyn Fn(&str) -> Logger + Send + Sync>;

/// Owner of a default logger and a set of named channel loggers.
///
/// Normally created once by the application and passed to whoever needs it;
/// [`LoggerRegistry::global`] exists for code that cannot be handed one.
pub struct LoggerRegistry {
    default: ArcSwap<Logger>,
    channels: DashMap<String, Logger>,
    factory: ArcSwap<LoggerFactory>,
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        LoggerRegistry::new(Logger::default())
    }
}

impl LoggerRegistry {
    pub fn new(default: Logger) -> Self {
        LoggerRegistry {
            default: ArcSwap::from_pointee(default),
            channels: DashMap::new(),
            factory: ArcSwap::from_pointee(Box::new(stderr_channel) as LoggerFactory),
        }
    }

    /// Process-wide registry, created on first use with stderr loggers.
    pub fn global() -> &'static LoggerRegistry {
        static GLOBAL: OnceLock<LoggerRegistry> = OnceLock::new();
        GLOBAL.get_or_init(LoggerRegistry::default)
    }

    pub fn default_logger(&self) -> Arc<Logger> {
        self.default.load_full()
    }

    pub fn set_default(&self, logger: Logger) {
        self.default.store(Arc::new(logger));
    }

    /// Logger for `name`, created through the factory on first request.
    /// Later calls return the same logger until it is removed.
    ///
    /// **Parameters**
    /// - `name`: channel name; the default factory also uses it as the
    ///   line prefix.
    ///
    /// **Returns**
    /// - A clone of the channel's logger. Level and output changes made
    ///   through it apply to the channel.
    ///
    /// The factory runs while the channel map is locked for `name` and must
    /// not call back into `channel`.
    pub fn channel(&self, name: &str) -> Logger {
        if let Some(logger) = self.channels.get(name) {
            return logger.clone();
        }
        let factory = self.factory.load_full();
        self.channels
            .entry(name.to_string())
            .or_insert_with(|| (**factory)(name))
            .clone()
    }

    /// Replaces the factory used for channels created from now on.
    pub fn set_factory(&self, factory: impl Fn(&str) -> Logger + Send + Sync + 'static) {
        self.factory.store(Arc::new(Box::new(factory)));
    }

    /// Forgets `name`; the next [`channel`](Self::channel) call creates it anew.
    pub fn remove_channel(&self, name: &str) -> Option<Logger> {
        self.channels.remove(name).map(|(_, logger)| logger)
    }

    pub fn channel_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

fn stderr_channel(name: &str) -> Logger {
    Logger::new(LoggerOptions {
        prefix: name.to_string(),
        ..Default::default()
    })
}
