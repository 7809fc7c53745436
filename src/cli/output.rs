//! User-facing output channels.
//!
//! All harness output flows through [`OutputSink`] so tests can capture it.
//! `StdoutSink` is the runner's channel; `OutputBuffer` collects into a
//! string for assertions and embedding.

/// A line-oriented output channel.
pub trait OutputSink {
    fn emit(&mut self, text: &str);
}

/// Collects output into a String for testing or programmatic capture.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    pub buffer: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl OutputSink for OutputBuffer {
    fn emit(&mut self, text: &str) {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(text);
    }
}

/// Writes output to stdout for CLI use.
#[derive(Debug)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, text: &str) {
        println!("{}", text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_joins_emissions_with_newlines() {
        let mut sink = OutputBuffer::new();
        sink.emit("one");
        sink.emit("two");
        assert_eq!(sink.as_str(), "one\ntwo");
    }
}
