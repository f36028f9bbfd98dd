use msh_sdk::{Console, Filesystem};

use super::Builtin;
use crate::error::{MshError, MshResult};
use crate::help::{format_help_list, get_help};
use crate::shell::Shell;
use crate::vars::parse_assignment;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Builtins that may be shadowed by an alias without a warning.
const QUIET_SHADOWS: &[Builtin] = &[Builtin::Exit, Builtin::Help, Builtin::Clear];

impl<F: Filesystem, C: Console> Shell<F, C> {
    pub(crate) fn cmd_help(&mut self, args: &[String]) -> MshResult<()> {
        match args {
            [_] => {
                self.console.write_raw(&format_help_list())?;
                Ok(())
            }
            [_, name] => {
                let name = name.to_lowercase();
                if get_help(&name).is_none() {
                    return Err(MshError::invalid(format!(
                        "No help available for '{name}'."
                    )));
                }
                self.print_help(&name)
            }
            _ => Err(Builtin::Help.usage_error()),
        }
    }

    pub(crate) fn cmd_clear(&mut self, _args: &[String]) -> MshResult<()> {
        self.console.write_raw(CLEAR_SCREEN)?;
        Ok(())
    }

    pub(crate) fn cmd_exec(&mut self, args: &[String]) -> MshResult<()> {
        let [_, script] = args else {
            return Err(Builtin::Exec.usage_error());
        };
        self.exec_script(script)
    }

    pub(crate) fn cmd_alias(&mut self, args: &[String]) -> MshResult<()> {
        match args {
            [_] => return self.list_aliases(),
            [_, flag, name] if flag == "-u" || flag == "--unset" => {
                return self.remove_alias(name);
            }
            [_, flag] if flag == "-u" || flag == "--unset" => {
                return Err(Builtin::Alias.usage_error());
            }
            _ => {}
        }

        let definition = args[1..].join(" ");
        let Some((name, command)) = parse_assignment(&definition) else {
            let name = definition.trim();
            let Some(command) = self.aliases.get(name) else {
                return Err(MshError::invalid(format!("Alias '{name}' not found.")));
            };
            let line = format!("alias {name}='{command}'");
            return self.say(&line);
        };

        let name = name.trim();
        if Builtin::from_name(&name.to_lowercase()).is_some_and(|b| !QUIET_SHADOWS.contains(&b)) {
            self.say(&format!("Warning: Aliasing reserved command '{name}'."))?;
        }
        self.aliases.set(name, command)?;
        let stored = self.aliases.get(name).unwrap_or_default().to_string();
        self.say(&format!("Alias set: {name} -> '{stored}'"))
    }

    pub(crate) fn cmd_unalias(&mut self, args: &[String]) -> MshResult<()> {
        let [_, name] = args else {
            return Err(Builtin::Unalias.usage_error());
        };
        self.remove_alias(name)
    }

    fn list_aliases(&mut self) -> MshResult<()> {
        if self.aliases.is_empty() {
            return self.say("No aliases defined.");
        }
        let lines: Vec<String> = self
            .aliases
            .list()
            .map(|(name, command)| format!("alias {name}='{command}'"))
            .collect();
        self.say("--- Current Aliases ---")?;
        for line in &lines {
            self.say(line)?;
        }
        self.say("-----------------------")
    }

    fn remove_alias(&mut self, name: &str) -> MshResult<()> {
        if self.aliases.unset(name) {
            self.say(&format!("Alias '{name}' removed."))
        } else {
            Err(MshError::invalid(format!("Alias '{name}' not found.")))
        }
    }

    pub(crate) fn cmd_export(&mut self, args: &[String]) -> MshResult<()> {
        if args.len() == 1 {
            return self.list_vars();
        }
        let assignment = args[1..].join(" ");
        let Some((name, value)) = parse_assignment(&assignment) else {
            return Err(Builtin::Export.usage_error());
        };
        let name = name.trim();
        self.vars.set(name, value)?;
        let stored = self.vars.get(name).unwrap_or_default().to_string();
        self.say(&format!("Exported {name}={stored}"))
    }

    pub(crate) fn cmd_unset(&mut self, args: &[String]) -> MshResult<()> {
        let [_, name] = args else {
            return Err(Builtin::Unset.usage_error());
        };
        if self.vars.unset(name)? {
            self.say(&format!("Variable '{name}' removed."))
        } else {
            Err(MshError::invalid(format!("Variable '{name}' not found.")))
        }
    }

    pub(crate) fn cmd_env(&mut self, args: &[String]) -> MshResult<()> {
        if args.len() > 1 {
            return Err(Builtin::Env.usage_error());
        }
        self.list_vars()
    }

    fn list_vars(&mut self) -> MshResult<()> {
        for (name, value) in self.vars.list(&self.cwd) {
            self.say(&format!("{name}={value}"))?;
        }
        Ok(())
    }

    /// Ends the session, unless a script is running.
    pub(crate) fn cmd_exit(&mut self, _args: &[String]) -> MshResult<()> {
        if self.is_scripting() {
            return self.say("Warning: Command 'exit' ignored inside script execution.");
        }
        self.running = false;
        self.say("Exiting msh.")
    }
}

#[cfg(test)]
mod tests {
    use crate::console::CapturedConsole;
    use crate::shell::{Shell, ShellBuilder};
    use msh_core::MemoryFs;

    fn shell() -> Shell<MemoryFs, CapturedConsole> {
        ShellBuilder::new(MemoryFs::new(), CapturedConsole::new())
            .build()
            .unwrap()
    }

    #[test]
    fn alias_lifecycle() {
        let mut shell = shell();
        assert!(shell.execute_line("alias"));
        assert!(shell.execute_line("alias ll=ls -l"));
        assert!(shell.execute_line("alias ll"));
        assert!(shell.execute_line("alias -u ll"));
        assert!(!shell.execute_line("unalias ll"));

        assert_eq!(
            shell.console().lines(),
            vec![
                "No aliases defined.",
                "Alias set: ll -> 'ls -l'",
                "alias ll='ls -l'",
                "Alias 'll' removed.",
                "unalias: Alias 'll' not found.",
            ]
        );
    }

    #[test]
    fn alias_listing_is_sorted() {
        let mut shell = shell();
        shell.set_alias("zz", "pwd").unwrap();
        shell.set_alias("aa", "env").unwrap();
        assert!(shell.execute_line("alias"));
        assert_eq!(
            shell.console().lines(),
            vec![
                "--- Current Aliases ---",
                "alias aa='env'",
                "alias zz='pwd'",
                "-----------------------",
            ]
        );
    }

    #[test]
    fn alias_over_builtin_warns() {
        let mut shell = shell();
        assert!(shell.execute_line("alias ls='ls -l'"));
        assert!(shell.execute_line("alias exit=pwd"));
        let out = shell.console().output();
        assert!(out.contains("Warning: Aliasing reserved command 'ls'."));
        assert!(!out.contains("reserved command 'exit'"));
    }

    #[test]
    fn alias_with_empty_value_is_rejected() {
        let mut shell = shell();
        assert!(!shell.execute_line("alias x="));
        assert!(shell.aliases().is_empty());
    }

    #[test]
    fn export_and_env_list_sorted_with_pwd() {
        let mut shell = shell();
        assert!(shell.execute_line("export ZED=1"));
        assert!(shell.execute_line("export ALPHA=\"two words\""));
        shell.console_mut().take_output();

        assert!(shell.execute_line("env"));
        assert_eq!(
            shell.console().lines(),
            vec!["ALPHA=two words", "PWD=/", "ZED=1"]
        );
    }

    #[test]
    fn export_rejects_pwd_and_bad_syntax() {
        let mut shell = shell();
        assert!(!shell.execute_line("export PWD=/tmp"));
        assert!(!shell.execute_line("export NOVALUE"));
        assert_eq!(
            shell.console().lines(),
            vec!["export: PWD is read-only", "Usage: export [NAME=VALUE]"]
        );
    }

    #[test]
    fn unset_reports_missing() {
        let mut shell = shell();
        shell.set_var("A", "1").unwrap();
        assert!(shell.execute_line("unset A"));
        assert!(!shell.execute_line("unset A"));
        assert_eq!(shell.get_var("A"), None);
        assert_eq!(
            shell.console().lines(),
            vec!["Variable 'A' removed.", "unset: Variable 'A' not found."]
        );
    }

    #[test]
    fn help_lists_and_describes() {
        let mut shell = shell();
        assert!(shell.execute_line("help"));
        assert!(shell.console().output().contains("msh Commands:"));
        shell.console_mut().take_output();

        assert!(shell.execute_line("help MKDIR"));
        assert!(shell.console().output().starts_with("mkdir - Create directory"));
        assert!(!shell.execute_line("help wifi"));
    }

    #[test]
    fn clear_writes_escape_sequence() {
        let mut shell = shell();
        assert!(shell.execute_line("clear"));
        assert_eq!(shell.console().output(), "\x1b[2J\x1b[H");
    }

    #[test]
    fn exit_stops_session() {
        let mut shell = shell();
        assert!(shell.execute_line("exit"));
        assert!(!shell.is_running());
        assert_eq!(shell.console().lines(), vec!["Exiting msh."]);
    }
}
