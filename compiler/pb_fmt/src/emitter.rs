//! Output Emitters
//!
//! The formatter writes through an [`Emitter`] so the same rendering code
//! can target an in-memory string, an arbitrary byte sink, or the scratch
//! buffer used for speculative layout (save/merge).

use std::io;

/// Byte sink for formatted output.
///
/// Emission is fallible so `io::Write`-backed sinks can surface errors;
/// the formatter accumulates them and keeps going best-effort.
pub trait Emitter {
    fn emit(&mut self, text: &str) -> io::Result<()>;
}

/// String-backed emitter; never fails. The primary sink, and the scratch
/// sink for speculative rendering.
#[derive(Debug, Default)]
pub struct StringEmitter {
    buffer: String,
}

impl StringEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: String::with_capacity(capacity),
        }
    }

    pub fn output(self) -> String {
        self.buffer
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Drain the buffer, keeping the emitter usable. Used by the column
    /// aligner to slice a speculative rendering into cells.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

impl Emitter for StringEmitter {
    fn emit(&mut self, text: &str) -> io::Result<()> {
        self.buffer.push_str(text);
        Ok(())
    }
}

/// Emitter over any `io::Write` sink.
#[derive(Debug)]
pub struct WriteEmitter<W: io::Write> {
    inner: W,
}

impl<W: io::Write> WriteEmitter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> Emitter for WriteEmitter<W> {
    fn emit(&mut self, text: &str) -> io::Result<()> {
        self.inner.write_all(text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_emitter_accumulates() {
        let mut e = StringEmitter::new();
        e.emit("hello").unwrap();
        e.emit(" world").unwrap();
        assert_eq!(e.output(), "hello world");
    }

    #[test]
    fn string_emitter_take_drains() {
        let mut e = StringEmitter::new();
        e.emit("one").unwrap();
        assert_eq!(e.take(), "one");
        e.emit("two").unwrap();
        assert_eq!(e.as_str(), "two");
    }

    #[test]
    fn write_emitter_forwards() {
        let mut e = WriteEmitter::new(Vec::new());
        e.emit("bytes").unwrap();
        assert_eq!(e.into_inner(), b"bytes");
    }
}
