use crate::error::ParseLevelError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI32, Ordering};

/// Importance or severity of a log event.
///
/// Named levels are spaced four apart so that callers can define
/// intermediate levels (`Level::INFO + 2`) that still order correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Level(i32);

impl Level {
    pub const TRACE: Level = Level(-8);
    pub const DEBUG: Level = Level(-4);
    pub const INFO: Level = Level(0);
    pub const WARN: Level = Level(4);
    pub const ERROR: Level = Level(8);
    pub const PANIC: Level = Level(12);
    pub const FATAL: Level = Level(16);

    pub const fn new(value: i32) -> Self {
        Level(value)
    }

    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

/// Saturates at the bounds of `i32`.
impl std::ops::Add<i32> for Level {
    type Output = Level;

    fn add(self, rhs: i32) -> Level {
        Level(self.0.saturating_add(rhs))
    }
}

/// Saturates at the bounds of `i32`.
impl std::ops::Sub<i32> for Level {
    type Output = Level;

    fn sub(self, rhs: i32) -> Level {
        Level(self.0.saturating_sub(rhs))
    }
}

/// Uppercase name of the nearest named level at or below `self`, with the
/// signed distance appended when it is not exact (`INFO+2`, `TRACE-1`).
impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (base, name) = match *self {
            l if l < Level::DEBUG => (Level::TRACE, "TRACE"),
            l if l < Level::INFO => (Level::DEBUG, "DEBUG"),
            l if l < Level::WARN => (Level::INFO, "INFO"),
            l if l < Level::ERROR => (Level::WARN, "WARN"),
            l if l < Level::PANIC => (Level::ERROR, "ERROR"),
            l if l < Level::FATAL => (Level::PANIC, "PANIC"),
            _ => (Level::FATAL, "FATAL"),
        };
        let offset = self.0 - base.0;
        if offset == 0 {
            f.write_str(name)
        } else {
            write!(f, "{name}{offset:+}")
        }
    }
}

/// Accepts any string produced by `Display`, ignoring case. Offsets may move
/// the level past its base name: `"ERROR-8"` parses as [`Level::INFO`].
impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, offset) = match s.find(['+', '-']) {
            Some(i) => {
                let offset = s[i..]
                    .parse::<i32>()
                    .map_err(|_| ParseLevelError::InvalidOffset(s.to_string()))?;
                (&s[..i], offset)
            }
            None => (s, 0),
        };
        let base = match name.to_ascii_uppercase().as_str() {
            "TRACE" => Level::TRACE,
            "DEBUG" => Level::DEBUG,
            "INFO" => Level::INFO,
            "WARN" => Level::WARN,
            "ERROR" => Level::ERROR,
            "PANIC" => Level::PANIC,
            "FATAL" => Level::FATAL,
            _ => return Err(ParseLevelError::UnknownName(s.to_string())),
        };
        base.0
            .checked_add(offset)
            .map(Level)
            .ok_or_else(|| ParseLevelError::InvalidOffset(s.to_string()))
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Anything that can report a minimum [`Level`].
///
/// `Level` itself is a `Leveler`; use [`LevelVar`] when the threshold has to
/// change while loggers are in use.
pub trait Leveler: Send + Sync {
    fn level(&self) -> Level;
}

impl Leveler for Level {
    fn level(&self) -> Level {
        *self
    }
}

/// A [`Level`] cell that can be read and replaced concurrently.
///
/// The default `LevelVar` holds [`Level::INFO`].
#[derive(Debug, Default)]
pub struct LevelVar {
    val: AtomicI32,
}

impl LevelVar {
    pub fn new(level: Level) -> Self {
        LevelVar {
            val: AtomicI32::new(level.0),
        }
    }

    pub fn get(&self) -> Level {
        Level(self.val.load(Ordering::Relaxed))
    }

    pub fn set(&self, level: Level) {
        self.val.store(level.0, Ordering::Relaxed);
    }
}

impl Leveler for LevelVar {
    fn level(&self) -> Level {
        self.get()
    }
}

impl fmt::Display for LevelVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LevelVar({})", self.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn display_names_and_offsets() {
        assert_eq!(Level::TRACE.to_string(), "TRACE");
        assert_eq!(Level::INFO.to_string(), "INFO");
        assert_eq!((Level::INFO + 2).to_string(), "INFO+2");
        assert_eq!((Level::TRACE - 1).to_string(), "TRACE-1");
        assert_eq!((Level::FATAL + 4).to_string(), "FATAL+4");
        assert_eq!((Level::ERROR - 1).to_string(), "WARN+3");
    }

    #[test]
    fn parse_is_case_insensitive_and_applies_offsets() {
        assert_eq!("warn".parse::<Level>(), Ok(Level::WARN));
        assert_eq!("Info+2".parse::<Level>(), Ok(Level::INFO + 2));
        assert_eq!("ERROR-8".parse::<Level>(), Ok(Level::INFO));
        assert!(matches!(
            "loud".parse::<Level>(),
            Err(ParseLevelError::UnknownName(_))
        ));
        assert!(matches!(
            "info+x".parse::<Level>(),
            Err(ParseLevelError::InvalidOffset(_))
        ));
    }

    #[test]
    fn offsets_past_i32_are_rejected() {
        assert!(matches!(
            "fatal+2147483647".parse::<Level>(),
            Err(ParseLevelError::InvalidOffset(_))
        ));
        assert!(matches!(
            "TRACE-2147483647".parse::<Level>(),
            Err(ParseLevelError::InvalidOffset(_))
        ));
        assert_eq!(
            "debug+2147483647".parse::<Level>(),
            Ok(Level::new(i32::MAX - 4))
        );
    }

    #[test]
    fn arithmetic_saturates() {
        assert_eq!(Level::FATAL + i32::MAX, Level::new(i32::MAX));
        assert_eq!(Level::TRACE - i32::MAX, Level::new(i32::MIN));
    }

    #[test]
    fn serde_uses_names() {
        let json = serde_json::to_string(&Level::DEBUG).unwrap();
        assert_eq!(json, "\"DEBUG\"");
        let level: Level = serde_json::from_str("\"panic\"").unwrap();
        assert_eq!(level, Level::PANIC);
    }

    #[test]
    fn level_var_defaults_to_info() {
        let v = LevelVar::default();
        assert_eq!(v.level(), Level::INFO);
        v.set(Level::ERROR);
        assert_eq!(v.level(), Level::ERROR);
        assert_eq!(v.to_string(), "LevelVar(ERROR)");
    }

    #[test]
    fn level_var_concurrent_set_get() {
        let v = Arc::new(LevelVar::new(Level::INFO));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let v = Arc::clone(&v);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        v.set(if i % 2 == 0 { Level::DEBUG } else { Level::WARN });
                        let _ = v.get();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let last = v.get();
        assert!(last == Level::DEBUG || last == Level::WARN);
    }
}
