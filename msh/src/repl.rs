use msh::Builtin;
use msh_config::HistoryConfig;
use msh_sdk::{Console, ReadLine};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, Editor, Helper};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Completes builtin names in command position.
pub struct MshHelper;

impl Completer for MshHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_cursor = &line[..pos];
        let (start, word) = find_word_start(line_to_cursor);
        let is_first_word = line_to_cursor[..start].trim().is_empty();
        if word.is_empty() || !is_first_word {
            return Ok((pos, Vec::new()));
        }

        let word = word.to_lowercase();
        let completions = Builtin::ALL
            .iter()
            .map(|b| b.name())
            .filter(|name| name.starts_with(&word))
            .map(|name| Pair {
                display: name.to_string(),
                replacement: name.to_string(),
            })
            .collect();
        Ok((start, completions))
    }
}

fn find_word_start(line: &str) -> (usize, &str) {
    let mut start = line.len();
    for (i, c) in line.char_indices().rev() {
        if c.is_whitespace() {
            break;
        }
        start = i;
    }
    (start, &line[start..])
}

impl Hinter for MshHelper {
    type Hint = String;
}

impl Highlighter for MshHelper {}

impl Validator for MshHelper {}

impl Helper for MshHelper {}

/// Interactive console backed by rustyline, with optional persistent
/// history.
pub struct ReplConsole {
    editor: Editor<MshHelper, DefaultHistory>,
    history_file: Option<PathBuf>,
}

impl ReplConsole {
    pub fn new(history: &HistoryConfig) -> rustyline::Result<Self> {
        let rl_config = Config::builder()
            .completion_type(CompletionType::List)
            .max_history_size(history.max_entries)?
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .build();

        let mut editor = Editor::with_config(rl_config)?;
        editor.set_helper(Some(MshHelper));

        let history_file = history.enabled.then(|| history.file_path());
        if let Some(path) = &history_file {
            if let Err(e) = editor.load_history(path) {
                debug!(path = %path.display(), error = %e, "no history loaded");
            }
        }

        Ok(Self {
            editor,
            history_file,
        })
    }

    pub fn save_history(&mut self) {
        let Some(path) = &self.history_file else {
            return;
        };
        if let Err(e) = self.editor.save_history(path) {
            warn!(path = %path.display(), error = %e, "failed to save history");
        }
    }
}

impl Console for ReplConsole {
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
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = self.editor.add_history_entry(line.as_str()) {
                        debug!(error = %e, "history entry dropped");
                    }
                }
                Ok(ReadLine::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(ReadLine::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadLine::Eof),
            Err(ReadlineError::Io(e)) => Err(e),
            Err(e) => Err(io::Error::other(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_start_finds_last_word() {
        assert_eq!(find_word_start("ls /da"), (3, "/da"));
        assert_eq!(find_word_start("mk"), (0, "mk"));
        assert_eq!(find_word_start("cd "), (3, ""));
    }
}
