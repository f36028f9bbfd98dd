//! Console implementations for hosts without a line editor.

use msh_sdk::{Console, ReadLine};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Plain stdin/stdout console. End of input on stdin is reported as
/// [`ReadLine::Eof`].
#[derive(Debug, Default)]
pub struct StdConsole;

impl StdConsole {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Console for StdConsole {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{line}")
    }

    fn write_raw(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<ReadLine> {
        self.write_raw(prompt)?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(ReadLine::Eof);
        }
        let trimmed = line.strip_suffix('\n').unwrap_or(&line);
        let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
        Ok(ReadLine::Line(trimmed.to_string()))
    }
}

/// Console fed from a queue of scripted inputs that records everything
/// written to it. Once the queue is empty every read returns
/// [`ReadLine::Eof`].
#[derive(Debug, Default)]
pub struct CapturedConsole {
    inputs: VecDeque<ReadLine>,
    output: String,
}

impl CapturedConsole {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Console that will answer reads with `lines`, in order.
    #[must_use]
    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut console = Self::new();
        for line in lines {
            console.push_line(line);
        }
        console
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.inputs.push_back(ReadLine::Line(line.into()));
    }

    pub fn push_interrupt(&mut self) {
        self.inputs.push_back(ReadLine::Interrupted);
    }

    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Output written so far, split into lines.
    #[must_use]
    pub fn lines(&self) -> Vec<&str> {
        self.output.lines().collect()
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    #[must_use]
    pub fn pending_inputs(&self) -> usize {
        self.inputs.len()
    }
}

impl Console for CapturedConsole {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.output.push_str(line);
        self.output.push('\n');
        Ok(())
    }

    fn write_raw(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        Ok(())
    }

    /// Prompts are not recorded so captured output only holds command output.
    fn read_line(&mut self, _prompt: &str) -> io::Result<ReadLine> {
        Ok(self.inputs.pop_front().unwrap_or(ReadLine::Eof))
    }
}
