use crate::noop_sink::NoopSink;
use arc_swap::ArcSwap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Destination for rendered log lines.
///
/// Handlers call `write` once per event with the complete line, newline
/// included, so a sink that forwards each call as one write never tears a
/// line. Calls may come from many threads at once.
pub trait Sink: Send + Sync {
    /// Write one complete line.
    ///
    /// **Parameters**
    /// - `line`: a fully rendered line ending in `\n`.
    ///
    /// **Returns**
    /// - `Ok(())` if the line was accepted.
    /// - `Err(..)` on I/O failure. The logger reports it through
    ///   [`fallback_error`](crate::util::fallback_error) or returns it from
    ///   [`Logger::try_log`](crate::logger::Logger::try_log).
    ///
    /// May block on the underlying I/O.
    fn write(&self, line: &[u8]) -> io::Result<()>;

    /// Flush any buffered output. Default implementation is a no-op.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }

    /// Reports whether everything written here is thrown away. Loggers use
    /// this to skip all formatting work.
    fn is_discard(&self) -> bool {
        false
    }
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn write(&self, line: &[u8]) -> io::Result<()> {
        (**self).write(line)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }

    fn is_discard(&self) -> bool {
        (**self).is_discard()
    }
}

impl Sink for io::Stderr {
    fn write(&self, line: &[u8]) -> io::Result<()> {
        self.lock().write_all(line)
    }

    fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }
}

impl Sink for io::Stdout {
    fn write(&self, line: &[u8]) -> io::Result<()> {
        self.lock().write_all(line)
    }

    fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }
}

/// Adapts any [`Write`] into a [`Sink`] by serializing writes.
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        WriterSink {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write(&self, line: &[u8]) -> io::Result<()> {
        self.writer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?
            .write_all(line)
    }

    fn flush(&self) -> io::Result<()> {
        self.writer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?
            .flush()
    }
}

/// In-memory sink whose clones share one buffer. Handy for tests and for
/// capturing output.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        match self.bytes.lock() {
            Ok(b) => String::from_utf8_lossy(&b).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut b) = self.bytes.lock() {
            b.clear();
        }
    }
}

impl Sink for SharedBuffer {
    fn write(&self, line: &[u8]) -> io::Result<()> {
        self.bytes
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log buffer lock poisoned"))?
            .extend_from_slice(line);
        Ok(())
    }
}

/// A swappable sink cell.
///
/// Reads never block writers and vice versa. `is_discard` is a single atomic
/// load, so a logger pointed at a [`NoopSink`] can bail out before doing any
/// work.
pub struct OutputVar {
    ready: AtomicBool,
    sink: ArcSwap<Arc<dyn Sink>>,
}

impl OutputVar {
    pub fn new(sink: Arc<dyn Sink>) -> Self {
        OutputVar {
            ready: AtomicBool::new(!sink.is_discard()),
            sink: ArcSwap::from_pointee(sink),
        }
    }

    /// Replaces the destination for all subsequent writes.
    pub fn set(&self, sink: Arc<dyn Sink>) {
        self.ready.store(!sink.is_discard(), Ordering::Release);
        self.sink.store(Arc::new(sink));
    }

    /// Current destination; a [`NoopSink`] when output is discarded.
    pub fn get(&self) -> Arc<dyn Sink> {
        if self.is_discard() {
            return Arc::new(NoopSink);
        }
        Arc::clone(&self.sink.load())
    }
}

impl Sink for OutputVar {
    fn write(&self, line: &[u8]) -> io::Result<()> {
        if self.is_discard() {
            return Ok(());
        }
        self.sink.load().write(line)
    }

    fn flush(&self) -> io::Result<()> {
        self.sink.load().flush()
    }

    fn is_discard(&self) -> bool {
        !self.ready.load(Ordering::Acquire)
    }
}
