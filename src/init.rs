use crate::config::LoggerConfig;
use crate::error::InitError;
use crate::layer::LoggerLayer;
use crate::logger::Logger;
use crate::registry::LoggerRegistry;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;

/// Settings for routing `tracing` events into a [`Logger`].
///
/// - `target_prefix`: show the event target as the line prefix.
/// - `enable_fmt`: additionally attach `tracing_subscriber`'s own `fmt`
///   layer, e.g. while comparing output.
#[derive(Clone, Debug, Default)]
pub struct BridgeConfig {
    pub target_prefix: bool,
    pub enable_fmt: bool,
}

/// Install a [`Registry`] with a [`LoggerLayer`] for `logger` as the global
/// default `tracing` subscriber.
///
/// **Parameters**
/// - `logger`: receives every `tracing` event at or above its level.
/// - `config`: [`BridgeConfig`] controlling the prefix and the extra `fmt`
///   layer.
///
/// **Returns**
/// - `Err(InitError::Subscriber)` if a global subscriber is already
///   installed.
pub fn init_tracing_with_config(logger: Logger, config: BridgeConfig) -> Result<(), InitError> {
    let layer = LoggerLayer::new(logger).with_target_prefix(config.target_prefix);

    // The two stacks have different types, so each is installed on its own.
    if config.enable_fmt {
        let subscriber = Registry::default()
            .with(layer)
            .with(tracing_subscriber::fmt::layer());
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// [`init_tracing_with_config`] with the default [`BridgeConfig`].
pub fn init_tracing(logger: Logger) -> Result<(), InitError> {
    init_tracing_with_config(logger, BridgeConfig::default())
}

/// Builds a logger from the environment, makes it the default of
/// [`LoggerRegistry::global`] and routes `tracing` events into it.
pub fn init_from_env() -> Result<Logger, InitError> {
    let logger = LoggerConfig::from_env()?.build();
    LoggerRegistry::global().set_default(logger.clone());
    init_tracing(logger.clone())?;
    Ok(logger)
}
