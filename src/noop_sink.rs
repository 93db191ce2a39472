use crate::sink::Sink;
use std::io;

/// A sink that simply drops all lines.
///
/// Loggers recognize it through [`Sink::is_discard`] and skip formatting
/// entirely, which makes it the cheapest way to silence a logger.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl Sink for NoopSink {
    fn write(&self, _line: &[u8]) -> io::Result<()> {
        Ok(())
    }

    fn is_discard(&self) -> bool {
        true
    }
}
