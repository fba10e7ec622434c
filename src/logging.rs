//! Logging setup.
//!
//! Log lines are abstracted before they reach the terminal, so secrets and
//! personal paths that end up in messages are not written out verbatim.

use crate::core::abstraction::AbstractionEngine;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// A [`MakeWriter`] that abstracts every formatted line.
#[derive(Clone)]
pub struct RedactingMakeWriter<M> {
    inner: M,
    engine: Arc<AbstractionEngine>,
}

impl<M> RedactingMakeWriter<M> {
    pub fn new(inner: M, engine: AbstractionEngine) -> Self {
        Self {
            inner,
            engine: Arc::new(engine),
        }
    }
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for RedactingMakeWriter<M> {
    type Writer = RedactingWriter<'a, M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
            engine: &self.engine,
        }
    }
}

/// Writer produced by [`RedactingMakeWriter`].
pub struct RedactingWriter<'a, W> {
    inner: W,
    engine: &'a AbstractionEngine,
}

impl<W: io::Write> io::Write for RedactingWriter<'_, W> {
    // The fmt layer hands over each event as one complete buffer.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let result = self.engine.process(&text);
        self.inner.write_all(result.content.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Initialize the logging system.
pub fn init_logging(verbose: bool, engine: AbstractionEngine) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("cognitive_partner=debug")
    } else {
        EnvFilter::new("cognitive_partner=info")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(RedactingMakeWriter::new(io::stderr, engine)),
        )
        .with(filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_log_lines_are_abstracted() {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(RedactingMakeWriter::new(buffer.clone(), AbstractionEngine::default()))
            .with_ansi(false)
            .without_time()
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Connecting with password=hunter2 as ops@example.com");
        });

        let logged = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("password=<credential>"));
        assert!(logged.contains("<email>"));
        assert!(!logged.contains("hunter2"));
    }
}
