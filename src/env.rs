//! Environment variable names read by [`LoggerConfig::apply_env`].
//!
//! [`LoggerConfig::apply_env`]: crate::config::LoggerConfig::apply_env

/// Minimum level, e.g. `debug` or `WARN+2`.
pub const LINELOG_LEVEL_ENV: &str = "LINELOG_LEVEL";

/// Prefix shown in brackets on every line.
pub const LINELOG_PREFIX_ENV: &str = "LINELOG_PREFIX";

/// `strftime` layout for the record time.
pub const LINELOG_TIME_FORMAT_ENV: &str = "LINELOG_TIME_FORMAT";

/// `1`/`true` disables colors, `0`/`false` enables them.
pub const LINELOG_NO_COLOR_ENV: &str = "LINELOG_NO_COLOR";

/// Any non-empty value disables colors (<https://no-color.org>).
pub const NO_COLOR_ENV: &str = "NO_COLOR";

/// `stderr`, `stdout` or `discard`.
pub const LINELOG_OUTPUT_ENV: &str = "LINELOG_OUTPUT";

/// Interprets a boolean flag value. Empty, `0`, `false`, `no` and `off` are
/// false; anything else is true.
pub fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        for v in ["1", "true", "YES", "on", "anything"] {
            assert!(parse_flag(v), "{v}");
        }
        for v in ["", "0", "false", "No", " off "] {
            assert!(!parse_flag(v), "{v:?}");
        }
    }
}
