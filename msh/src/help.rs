pub struct CommandHelp {
    pub name: &'static str,
    pub summary: &'static str,
    pub usage: &'static str,
    pub options: &'static [(&'static str, &'static str)],
}

pub const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "help",
        summary: "Display this list or help for one command",
        usage: "help [COMMAND]",
        options: &[],
    },
    CommandHelp {
        name: "clear",
        summary: "Clear the terminal screen",
        usage: "clear",
        options: &[],
    },
    CommandHelp {
        name: "ls",
        summary: "List directory contents",
        usage: "ls [-l] [PATH]",
        options: &[("-l", "Show entry type and size")],
    },
    CommandHelp {
        name: "cd",
        summary: "Change directory, or show the current one",
        usage: "cd [DIR]",
        options: &[],
    },
    CommandHelp {
        name: "pwd",
        summary: "Print working directory",
        usage: "pwd",
        options: &[],
    },
    CommandHelp {
        name: "cat",
        summary: "Display file content",
        usage: "cat <FILE>",
        options: &[],
    },
    CommandHelp {
        name: "echo",
        summary: "Print text, or write it to a file",
        usage: "echo <TEXT> [> FILE | >> FILE]",
        options: &[("> FILE", "Overwrite FILE"), (">> FILE", "Append to FILE")],
    },
    CommandHelp {
        name: "mkdir",
        summary: "Create directory",
        usage: "mkdir <DIR>",
        options: &[],
    },
    CommandHelp {
        name: "rm",
        summary: "Remove file or empty directory",
        usage: "rm [-rf] <PATH>",
        options: &[("-rf, -fr", "Remove directory recursively (USE WITH CAUTION)")],
    },
    CommandHelp {
        name: "mv",
        summary: "Move/rename file or directory",
        usage: "mv <SOURCE> <DEST>",
        options: &[],
    },
    CommandHelp {
        name: "cp",
        summary: "Copy file or directory (recursively)",
        usage: "cp <SOURCE> <DEST>",
        options: &[],
    },
    CommandHelp {
        name: "du",
        summary: "Summarize disk usage of a directory or file",
        usage: "du [PATH]",
        options: &[],
    },
    CommandHelp {
        name: "df",
        summary: "Display disk free space (total, used, free)",
        usage: "df [PATH]",
        options: &[],
    },
    CommandHelp {
        name: "touch",
        summary: "Create empty file if it doesn't exist",
        usage: "touch <FILE>",
        options: &[],
    },
    CommandHelp {
        name: "edit",
        summary: "Open minimal line-based text editor",
        usage: "edit <FILE>",
        options: &[],
    },
    CommandHelp {
        name: "exec",
        summary: "Execute commands from a script file",
        usage: "exec <SCRIPT>",
        options: &[],
    },
    CommandHelp {
        name: "alias",
        summary: "Define, view, or remove command aliases",
        usage: "alias [NAME=COMMAND | NAME | -u NAME]",
        options: &[("-u, --unset NAME", "Remove alias NAME")],
    },
    CommandHelp {
        name: "unalias",
        summary: "Remove a command alias",
        usage: "unalias <NAME>",
        options: &[],
    },
    CommandHelp {
        name: "export",
        summary: "Set a variable, or list all variables",
        usage: "export [NAME=VALUE]",
        options: &[],
    },
    CommandHelp {
        name: "unset",
        summary: "Remove a variable",
        usage: "unset <NAME>",
        options: &[],
    },
    CommandHelp {
        name: "env",
        summary: "List variables",
        usage: "env",
        options: &[],
    },
    CommandHelp {
        name: "exit",
        summary: "Exit the shell",
        usage: "exit",
        options: &[],
    },
];

pub fn get_help(name: &str) -> Option<&'static CommandHelp> {
    COMMANDS.iter().find(|c| c.name == name)
}

pub fn format_help(cmd: &CommandHelp) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} - {}\n\n", cmd.name, cmd.summary));
    out.push_str(&format!("Usage: {}\n", cmd.usage));
    if !cmd.options.is_empty() {
        out.push_str("\nOptions:\n");
        for (opt, desc) in cmd.options {
            out.push_str(&format!("  {opt:18} {desc}\n"));
        }
    }
    out
}

pub fn format_help_list() -> String {
    let mut out = String::new();
    out.push_str("--------------------------------------------------\n");
    out.push_str("msh Commands:\n");

    for cmd in COMMANDS {
        out.push_str(&format!("  {:<40} - {}\n", cmd.usage, cmd.summary));
    }

    out.push_str("--------------------------------------------------\n");
    out.push_str("Use 'help COMMAND' or 'COMMAND --help' for more information.\n");
    out
}

pub fn wants_help(args: &[String]) -> bool {
    args.iter().skip(1).any(|a| a == "--help" || a == "-h")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_has_usage() {
        for cmd in COMMANDS {
            assert!(!cmd.usage.is_empty(), "{}", cmd.name);
            assert!(cmd.usage.starts_with(cmd.name), "{}", cmd.name);
        }
    }

    #[test]
    fn format_help_includes_options() {
        let text = format_help(get_help("rm").unwrap());
        assert!(text.starts_with("rm - "));
        assert!(text.contains("Usage: rm [-rf] <PATH>"));
        assert!(text.contains("-rf, -fr"));
    }

    #[test]
    fn wants_help_ignores_command_name() {
        let args: Vec<String> = ["ls", "--help"].iter().map(|s| (*s).to_string()).collect();
        assert!(wants_help(&args));
        let args: Vec<String> = ["-h"].iter().map(|s| (*s).to_string()).collect();
        assert!(!wants_help(&args));
    }
}
