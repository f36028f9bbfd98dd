//! Shell state and execution engine

use msh_config::MshConfig;
use msh_core::ops::LineReader;
use msh_sdk::{Console, Filesystem, ReadLine};
use tracing::{debug, info, warn};

use crate::commands::Builtin;
use crate::error::{MshError, MshResult};
use crate::expansion::{expand_alias, expand_variables};
use crate::help::{format_help, get_help, wants_help};
use crate::lexer::tokenize;
use crate::path;
use crate::vars::{AliasTable, VariableStore};

/// Interpreter session: the filesystem and console it drives plus the
/// working directory, variables and aliases. All state lives here and is
/// mutated only between commands.
pub struct Shell<F: Filesystem, C: Console> {
    pub(crate) fs: F,
    pub(crate) console: C,
    pub(crate) config: MshConfig,
    pub(crate) cwd: String,
    pub(crate) vars: VariableStore,
    pub(crate) aliases: AliasTable,
    pub(crate) running: bool,
    pub(crate) script_depth: usize,
}

impl<F: Filesystem, C: Console> Shell<F, C> {
    pub fn new(fs: F, console: C, config: MshConfig) -> Self {
        Self {
            fs,
            console,
            config,
            cwd: "/".to_string(),
            vars: VariableStore::new(),
            aliases: AliasTable::new(),
            running: true,
            script_depth: 0,
        }
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn fs_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    pub fn config(&self) -> &MshConfig {
        &self.config
    }

    pub fn vars(&self) -> &VariableStore {
        &self.vars
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn set_var(&mut self, name: &str, value: &str) -> MshResult<()> {
        self.vars.set(name, value)
    }

    /// Variable value as expansion sees it, `PWD` included.
    pub fn get_var(&self, name: &str) -> Option<&str> {
        self.vars.lookup(name, &self.cwd)
    }

    pub fn set_alias(&mut self, name: &str, command: &str) -> MshResult<()> {
        self.aliases.set(name, command)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_scripting(&self) -> bool {
        self.script_depth > 0
    }

    pub fn into_parts(self) -> (F, C) {
        (self.fs, self.console)
    }

    /// Resolves a path token against the working directory.
    pub fn resolve(&self, token: &str) -> String {
        path::resolve(token, &self.cwd, &self.vars)
    }

    pub fn prompt(&self) -> String {
        self.config.shell.render_prompt(&self.cwd)
    }

    /// Runs one input line and reports any failure on the console. Returns
    /// `false` if the command failed.
    pub fn execute_line(&mut self, raw: &str) -> bool {
        let Err((command, e)) = self.try_execute_line(raw) else {
            return true;
        };
        let message = match (&e, command) {
            (MshError::Usage(_), _) => e.to_string(),
            (_, Some(command)) => format!("{command}: {e}"),
            (_, None) => format!("msh: {e}"),
        };
        if let Err(e) = self.console.write_line(&message) {
            warn!(error = %e, "failed to report command error");
        }
        false
    }

    fn try_execute_line(&mut self, raw: &str) -> Result<(), (Option<String>, MshError)> {
        let line = expand_variables(raw.trim(), &self.cwd, &self.vars);
        let mut tokens = tokenize(&line);

        let line = match expand_alias(&line, &tokens, &self.aliases) {
            Some(expanded) => {
                debug!(from = %line, to = %expanded, "alias expanded");
                tokens = tokenize(&expanded);
                expanded
            }
            None => line,
        };

        let Some(first) = tokens.first() else {
            return Ok(());
        };
        let name = first.text.to_lowercase();
        let builtin = Builtin::from_name(&name)
            .ok_or_else(|| (None, MshError::CommandNotFound(name.clone())))?;

        let args: Vec<String> = tokens.into_iter().map(|t| t.text).collect();
        debug!(command = builtin.name(), line = %line, "dispatch");

        let result = if wants_help(&args) {
            self.print_help(builtin.name())
        } else {
            builtin.handler()(self, &args)
        };
        result.map_err(|e| (Some(builtin.name().to_string()), e))
    }

    pub(crate) fn print_help(&mut self, name: &str) -> MshResult<()> {
        let help = get_help(name).ok_or_else(|| MshError::invalid(format!("no help for '{name}'")))?;
        self.console.write_raw(&format_help(help))?;
        Ok(())
    }

    /// Interactive loop: prompt, read, execute until `exit` or end of input.
    /// An interrupt at the prompt only redisplays it.
    pub fn run(&mut self) -> MshResult<()> {
        info!(cwd = %self.cwd, "session started");
        if !self.config.shell.banner.is_empty() {
            let rule = "-".repeat(50);
            self.console.write_line(&rule)?;
            self.console.write_line(&self.config.shell.banner)?;
            self.console.write_line(&rule)?;
        }

        while self.running {
            let prompt = self.prompt();
            let input = match self.console.read_line(&prompt) {
                Ok(input) => input,
                Err(e) => {
                    warn!(error = %e, "console read failed, ending session");
                    let _ = self.console.write_line(&format!("msh: input error: {e}"));
                    ReadLine::Eof
                }
            };
            match input {
                ReadLine::Line(line) => {
                    self.execute_line(&line);
                }
                ReadLine::Interrupted => {
                    self.console
                        .write_line("Shell interrupted. Type 'exit' to quit.")?;
                }
                ReadLine::Eof => {
                    if let Err(e) = self.cmd_exit(&["exit".to_string()]) {
                        debug!(error = %e, "exit message not written");
                    }
                }
            }
        }

        info!("session ended");
        Ok(())
    }

    /// Executes a script file: one command per line, blank lines and `#`
    /// comments skipped. A failing command is reported and the script goes
    /// on; a read failure aborts it. `exit` is refused while any script runs.
    pub fn exec_script(&mut self, token: &str) -> MshResult<()> {
        let path = self.resolve(token);
        let max_depth = self.config.shell.max_script_depth;
        if self.script_depth >= max_depth {
            return Err(MshError::Script(format!(
                "maximum script nesting depth ({max_depth}) reached, not running '{path}'"
            )));
        }

        let mut reader = LineReader::open(&mut self.fs, &path).map_err(|e| {
            MshError::Script(format!(
                "Script file '{path}' not found or inaccessible: {e}"
            ))
        })?;

        self.console
            .write_line(&format!("--- Executing script: {path} ---"))?;
        self.script_depth += 1;
        let result = self.run_script_lines(&mut reader);
        self.script_depth -= 1;
        let closed = reader.close(&mut self.fs);

        if let Err(e) = result {
            return Err(MshError::Script(format!(
                "Script execution aborted due to error: {e}"
            )));
        }
        closed?;
        self.console
            .write_line(&format!("--- Script {path} finished ---"))?;
        Ok(())
    }

    fn run_script_lines(&mut self, reader: &mut LineReader) -> MshResult<()> {
        while let Some(line) = reader.next_line(&mut self.fs)? {
            let command = line.trim();
            if command.is_empty() || command.starts_with('#') {
                continue;
            }
            self.console.write_line(&format!("[RUN] {command}"))?;
            self.execute_line(command);
        }
        Ok(())
    }

    /// Writes one line of command output.
    pub(crate) fn say(&mut self, line: &str) -> MshResult<()> {
        self.console.write_line(line)?;
        Ok(())
    }
}

/// Assembles a [`Shell`] with initial configuration and state.
pub struct ShellBuilder<F: Filesystem, C: Console> {
    fs: F,
    console: C,
    config: MshConfig,
    cwd: Option<String>,
    vars: Vec<(String, String)>,
    aliases: Vec<(String, String)>,
}

impl<F: Filesystem, C: Console> ShellBuilder<F, C> {
    pub fn new(fs: F, console: C) -> Self {
        Self {
            fs,
            console,
            config: MshConfig::default(),
            cwd: None,
            vars: Vec::new(),
            aliases: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: MshConfig) -> Self {
        self.config = config;
        self
    }

    /// Starting directory; must exist when the shell is built.
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    #[must_use]
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn alias(mut self, name: impl Into<String>, command: impl Into<String>) -> Self {
        self.aliases.push((name.into(), command.into()));
        self
    }

    pub fn build(self) -> MshResult<Shell<F, C>> {
        let mut shell = Shell::new(self.fs, self.console, self.config);
        for (name, value) in &self.vars {
            shell.set_var(name, value)?;
        }
        for (name, command) in &self.aliases {
            shell.set_alias(name, command)?;
        }
        if let Some(cwd) = self.cwd {
            let cwd = shell.resolve(&cwd);
            if !shell.fs.stat(&cwd)?.is_dir() {
                return Err(MshError::invalid(format!("'{cwd}' is not a directory")));
            }
            shell.cwd = cwd;
        }
        Ok(shell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::CapturedConsole;
    use msh_core::MemoryFs;

    fn shell() -> Shell<MemoryFs, CapturedConsole> {
        ShellBuilder::new(MemoryFs::new(), CapturedConsole::new())
            .build()
            .unwrap()
    }

    struct BrokenConsole {
        reads: usize,
    }

    impl Console for BrokenConsole {
        fn write_line(&mut self, _line: &str) -> std::io::Result<()> {
            Err(std::io::Error::other("device gone"))
        }

        fn write_raw(&mut self, _text: &str) -> std::io::Result<()> {
            Err(std::io::Error::other("device gone"))
        }

        fn read_line(&mut self, _prompt: &str) -> std::io::Result<ReadLine> {
            self.reads += 1;
            Err(std::io::Error::other("device gone"))
        }
    }

    #[test]
    fn console_read_error_ends_session() {
        let mut shell = ShellBuilder::new(MemoryFs::new(), BrokenConsole { reads: 0 })
            .config(MshConfig {
                shell: msh_config::ShellConfig {
                    banner: String::new(),
                    ..Default::default()
                },
                ..Default::default()
            })
            .build()
            .unwrap();

        shell.run().unwrap();

        assert!(!shell.is_running());
        let (_, console) = shell.into_parts();
        assert_eq!(console.reads, 1);
    }

    #[test]
    fn shell_creation() {
        let shell = shell();
        assert_eq!(shell.cwd(), "/");
        assert!(shell.is_running());
        assert!(!shell.is_scripting());
        assert_eq!(shell.prompt(), "msh:/$ ");
    }

    #[test]
    fn variable_operations() {
        let mut shell = shell();
        shell.set_var("FOO", "bar").unwrap();
        assert_eq!(shell.get_var("FOO"), Some("bar"));
        assert_eq!(shell.get_var("PWD"), Some("/"));
        assert_eq!(shell.get_var("NONEXISTENT"), None);
    }

    #[test]
    fn unknown_command_is_reported() {
        let mut shell = shell();
        assert!(!shell.execute_line("frobnicate now"));
        assert_eq!(shell.console().lines(), vec!["msh: command not found: frobnicate"]);
    }

    #[test]
    fn command_names_are_case_insensitive() {
        let mut shell = shell();
        assert!(shell.execute_line("PWD"));
        assert_eq!(shell.console().lines(), vec!["/"]);
    }

    #[test]
    fn blank_lines_do_nothing() {
        let mut shell = shell();
        assert!(shell.execute_line("   "));
        assert!(shell.console().output().is_empty());
    }

    #[test]
    fn stray_apostrophes_are_plain_text() {
        let mut shell = shell();
        assert!(shell.execute_line("echo don't panic"));
        assert!(shell.execute_line("echo 'unterminated"));
        assert_eq!(
            shell.console().lines(),
            vec!["don't panic", "'unterminated"]
        );
    }

    #[test]
    fn usage_errors_print_usage_only() {
        let mut shell = shell();
        assert!(!shell.execute_line("mkdir"));
        assert_eq!(shell.console().lines(), vec!["Usage: mkdir <DIR>"]);
    }

    #[test]
    fn handler_errors_carry_command_name() {
        let mut shell = shell();
        assert!(!shell.execute_line("cat /missing.txt"));
        assert_eq!(shell.console().lines(), vec!["cat: not found: /missing.txt"]);
    }

    #[test]
    fn alias_then_dispatch() {
        let mut shell = ShellBuilder::new(MemoryFs::new(), CapturedConsole::new())
            .alias("say", "echo hello")
            .build()
            .unwrap();
        assert!(shell.execute_line("say world"));
        assert_eq!(shell.console().lines(), vec!["hello world"]);
    }

    #[test]
    fn help_flag_prints_command_help() {
        let mut shell = shell();
        assert!(shell.execute_line("cp --help"));
        assert!(shell.console().output().contains("Usage: cp <SOURCE> <DEST>"));
    }

    #[test]
    fn builder_rejects_missing_cwd() {
        let result = ShellBuilder::new(MemoryFs::new(), CapturedConsole::new())
            .cwd("/nowhere")
            .build();
        assert!(matches!(result, Err(MshError::Fs(_))));
    }

    #[test]
    fn run_handles_interrupt_and_eof() {
        let mut console = CapturedConsole::with_input(["pwd"]);
        console.push_interrupt();
        let mut shell = ShellBuilder::new(MemoryFs::new(), console).build().unwrap();

        shell.run().unwrap();

        assert!(!shell.is_running());
        let out = shell.console().output();
        assert!(out.contains("Shell interrupted. Type 'exit' to quit."));
        assert!(out.ends_with("Exiting msh.\n"));
    }
}
