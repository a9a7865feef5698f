//! Binds remote output to the local process streams.

use std::io::Write;

use crate::application::ports::OutputStreams;
use crate::output::remote_writer::RemoteWriter;

/// `OutputStreams` writing `[host]`-prefixed lines to this process's stdout
/// and stderr. Remote stdout stays stdout; remote stderr stays stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessStreams;

impl OutputStreams for ProcessStreams {
    fn stdout(&self, host: &str) -> Box<dyn Write + Send> {
        Box::new(RemoteWriter::new(host, std::io::stdout()))
    }

    fn stderr(&self, host: &str) -> Box<dyn Write + Send> {
        Box::new(RemoteWriter::new(host, std::io::stderr()))
    }
}
