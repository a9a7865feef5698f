//! Output multiplexer: prefixes every line of remote output with its host.

use std::io::{self, Write};

/// Longest line accepted, matching a line scanner's default token limit.
pub const MAX_LINE: usize = 64 * 1024;

/// A `Write` adapter that rewrites each line as `[<host>] <line>\n`.
///
/// Every `write` call is scanned on its own: complete lines are forwarded,
/// and a trailing fragment without a newline is forwarded as a line of its
/// own when the scan of that call ends. Nothing is carried between calls.
///
/// `write` reports the full input length as consumed even though more bytes
/// reach the inner sink because of the prefix.
pub struct RemoteWriter<W: Write> {
    host: String,
    inner: W,
}

impl<W: Write> RemoteWriter<W> {
    pub fn new(host: impl Into<String>, inner: W) -> Self {
        Self {
            host: host.into(),
            inner,
        }
    }

    /// Unwrap the inner sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for RemoteWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut first_err = None;

        for line in scan_lines(buf) {
            let line = match line {
                Ok(line) => line,
                Err(e) => return Err(first_err.unwrap_or(e)),
            };
            let mut out = Vec::with_capacity(self.host.len() + line.len() + 4);
            out.push(b'[');
            out.extend_from_slice(self.host.as_bytes());
            out.extend_from_slice(b"] ");
            out.extend_from_slice(line);
            out.push(b'\n');
            if let Err(e) = self.inner.write_all(&out) {
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Splits `buf` into lines without terminators, dropping one trailing `\r`
/// per line. A final fragment without `\n` is yielded as a line; an empty
/// tail is not. Lines over `MAX_LINE` end the scan with `InvalidData`.
fn scan_lines(buf: &[u8]) -> impl Iterator<Item = io::Result<&[u8]>> {
    let mut rest = buf;
    let mut done = false;
    std::iter::from_fn(move || {
        if done || rest.is_empty() {
            return None;
        }
        let (line, next) = match rest.iter().position(|&b| b == b'\n') {
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => (rest, &rest[rest.len()..]),
        };
        if line.len() > MAX_LINE {
            done = true;
            return Some(Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "remote output line too long",
            )));
        }
        rest = next;
        Some(Ok(line.strip_suffix(b"\r").unwrap_or(line)))
    })
}
