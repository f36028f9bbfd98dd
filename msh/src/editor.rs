//! Line-oriented text editor.
//!
//! [`EditorBuffer`] and [`EditCommand`] hold the pure state machine;
//! [`LineEditor`] drives it from a console and persists the result.

use msh_config::EditorConfig;
use msh_core::ops::{read_to_string, write_file_atomic};
use msh_sdk::{Console, Filesystem, ReadLine};
use tracing::debug;

use crate::error::{MshError, MshResult};

pub const EDIT_PROMPT: &str = "EDIT>> ";

/// One classified line of editor input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    Save,
    Abort,
    Append(String),
    /// `L<N> text`: replace line N (1-based).
    Replace { line: usize, text: String },
    /// `D<N>`: delete line N (1-based).
    Delete { line: usize },
    /// Looked like a line command but cannot be carried out.
    Invalid(String),
}

impl EditCommand {
    /// Classifies raw input. Sentinels must match exactly. A first word of
    /// the form `L<digits>` or `D<digits>` (either case) is a line command;
    /// anything else, including empty input, is appended verbatim.
    #[must_use]
    pub fn parse(input: &str, config: &EditorConfig) -> Self {
        if input == config.save_sentinel {
            return Self::Save;
        }
        if input == config.abort_sentinel {
            return Self::Abort;
        }

        let (word, rest) = match input.split_once(' ') {
            Some((word, rest)) => (word, Some(rest)),
            None => (input, None),
        };
        let mut chars = word.chars();
        let action = chars.next().map(|c| c.to_ascii_uppercase());
        let digits = chars.as_str();
        let is_line_command = matches!(action, Some('L' | 'D'))
            && !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit());
        if !is_line_command {
            return Self::Append(input.to_string());
        }

        let Ok(line) = digits.parse::<usize>() else {
            return Self::Invalid(format!("Line number {digits} is out of range."));
        };
        if action == Some('L') {
            return Self::Replace {
                line,
                text: rest.unwrap_or_default().to_string(),
            };
        }
        if rest.is_some_and(|r| !r.trim().is_empty()) {
            return Self::Invalid("Invalid command format. Use L<N> <text> or D<N>.".to_string());
        }
        Self::Delete { line }
    }
}

/// In-memory lines of the file being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorBuffer {
    lines: Vec<String>,
}

impl EditorBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the 1-based number of the new line.
    pub fn append(&mut self, text: impl Into<String>) -> usize {
        self.lines.push(text.into());
        self.lines.len()
    }

    pub fn replace(&mut self, line: usize, text: impl Into<String>) -> MshResult<()> {
        let idx = self.index(line)?;
        self.lines[idx] = text.into();
        Ok(())
    }

    pub fn delete(&mut self, line: usize) -> MshResult<String> {
        let idx = self.index(line)?;
        Ok(self.lines.remove(idx))
    }

    /// Lines joined with `\n`, with a single trailing newline unless empty.
    #[must_use]
    pub fn to_text(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    fn index(&self, line: usize) -> MshResult<usize> {
        if line == 0 || line > self.lines.len() {
            return Err(MshError::invalid(format!(
                "Line number {line} is out of range."
            )));
        }
        Ok(line - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Saved { lines: usize },
    Aborted,
}

pub struct LineEditor<'a> {
    config: &'a EditorConfig,
}

impl<'a> LineEditor<'a> {
    #[must_use]
    pub const fn new(config: &'a EditorConfig) -> Self {
        Self { config }
    }

    /// Edits `path` until a sentinel, end of input or an interrupt. The file
    /// is only written on save, and then atomically.
    pub fn run<F, C>(&self, fs: &mut F, console: &mut C, path: &str) -> MshResult<EditOutcome>
    where
        F: Filesystem + ?Sized,
        C: Console + ?Sized,
    {
        let mut buffer = match read_to_string(fs, path) {
            Ok(text) => {
                let buffer = EditorBuffer::from_text(&text);
                console.write_line(&format!(
                    "--- Editing existing file: {path} ({} lines) ---",
                    buffer.len()
                ))?;
                buffer
            }
            Err(e) if e.is_not_found() => {
                console.write_line(&format!("--- Creating new file: {path} ---"))?;
                EditorBuffer::new()
            }
            Err(e) => return Err(e.into()),
        };

        console.write_line("Commands: L<N> <new text> (Replace line N), D<N> (Delete line N)")?;
        console.write_line(&format!(
            "Type '{}' to save and exit, '{}' to exit without saving.",
            self.config.save_sentinel, self.config.abort_sentinel
        ))?;

        loop {
            if self.config.show_buffer {
                for (i, line) in buffer.lines().iter().enumerate() {
                    console.write_line(&format!("{:02}: {line}", i + 1))?;
                }
            }

            let input = match console.read_line(EDIT_PROMPT)? {
                ReadLine::Line(input) => input,
                ReadLine::Interrupted | ReadLine::Eof => {
                    console.write_line("Exiting editor (unsaved).")?;
                    return Ok(EditOutcome::Aborted);
                }
            };

            match EditCommand::parse(&input, self.config) {
                EditCommand::Save => {
                    write_file_atomic(fs, path, buffer.to_text().as_bytes())?;
                    debug!(path, lines = buffer.len(), "editor saved");
                    console.write_line(&format!("File saved successfully to {path}."))?;
                    return Ok(EditOutcome::Saved {
                        lines: buffer.len(),
                    });
                }
                EditCommand::Abort => {
                    console.write_line("Exiting editor without saving changes.")?;
                    return Ok(EditOutcome::Aborted);
                }
                EditCommand::Append(text) => {
                    let line = buffer.append(text);
                    console.write_line(&format!("Appended as line {line}."))?;
                }
                EditCommand::Replace { line, text } => match buffer.replace(line, text) {
                    Ok(()) => console.write_line(&format!("Line {line} replaced."))?,
                    Err(e) => console.write_line(&format!("Error: {e}"))?,
                },
                EditCommand::Delete { line } => match buffer.delete(line) {
                    Ok(_) => console.write_line(&format!("Line {line} deleted."))?,
                    Err(e) => console.write_line(&format!("Error: {e}"))?,
                },
                EditCommand::Invalid(msg) => console.write_line(&format!("Error: {msg}"))?,
            }
        }
    }
}
