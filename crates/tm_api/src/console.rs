//! Line-oriented build console the service reports its outcomes to.

use std::io::{self, Write};
use std::sync::Mutex;

/// Represents the build log sink. Every line is also emitted as a `tracing` event.
pub struct BuildConsole {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl BuildConsole {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Mutex::new(Box::new(sink)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn println(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        tracing::debug!(target: "tm_api::console", "{}", line);
        if let Ok(mut sink) = self.sink.lock() {
            // A broken build log must not fail the publish.
            let _ = writeln!(sink, "{}", line);
            let _ = sink.flush();
        }
    }
}

impl Default for BuildConsole {
    fn default() -> Self {
        Self::stdout()
    }
}

impl std::fmt::Debug for BuildConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildConsole").finish_non_exhaustive()
    }
}

/// Cloneable in-memory sink, handy for capturing console output.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "console buffer poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BuildConsole, SharedBuffer};

    #[test]
    fn lines_are_written_in_order() {
        let buffer = SharedBuffer::default();
        let console = BuildConsole::new(buffer.clone());
        console.println("first");
        console.println(String::from("second"));
        assert_eq!(buffer.lines(), vec!["first", "second"]);
    }
}
