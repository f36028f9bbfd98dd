//! Builtin command table.
//!
//! Every command is a [`Builtin`] variant mapped to a handler taking the full
//! token list (index 0 is the command name).

mod fs;
mod session;

use msh_sdk::{Console, Filesystem};

use crate::error::{MshError, MshResult};
use crate::help::get_help;
use crate::shell::Shell;

pub type Handler<F, C> = fn(&mut Shell<F, C>, &[String]) -> MshResult<()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Help,
    Clear,
    Ls,
    Cd,
    Pwd,
    Cat,
    Echo,
    Mkdir,
    Rm,
    Mv,
    Cp,
    Du,
    Df,
    Touch,
    Edit,
    Exec,
    Alias,
    Unalias,
    Export,
    Unset,
    Env,
    Exit,
}

impl Builtin {
    pub const ALL: &'static [Self] = &[
        Self::Help,
        Self::Clear,
        Self::Ls,
        Self::Cd,
        Self::Pwd,
        Self::Cat,
        Self::Echo,
        Self::Mkdir,
        Self::Rm,
        Self::Mv,
        Self::Cp,
        Self::Du,
        Self::Df,
        Self::Touch,
        Self::Edit,
        Self::Exec,
        Self::Alias,
        Self::Unalias,
        Self::Export,
        Self::Unset,
        Self::Env,
        Self::Exit,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Clear => "clear",
            Self::Ls => "ls",
            Self::Cd => "cd",
            Self::Pwd => "pwd",
            Self::Cat => "cat",
            Self::Echo => "echo",
            Self::Mkdir => "mkdir",
            Self::Rm => "rm",
            Self::Mv => "mv",
            Self::Cp => "cp",
            Self::Du => "du",
            Self::Df => "df",
            Self::Touch => "touch",
            Self::Edit => "edit",
            Self::Exec => "exec",
            Self::Alias => "alias",
            Self::Unalias => "unalias",
            Self::Export => "export",
            Self::Unset => "unset",
            Self::Env => "env",
            Self::Exit => "exit",
        }
    }

    /// Exact, already case-normalized lookup.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.name() == name)
    }

    #[must_use]
    pub fn handler<F: Filesystem, C: Console>(self) -> Handler<F, C> {
        match self {
            Self::Help => Shell::cmd_help,
            Self::Clear => Shell::cmd_clear,
            Self::Ls => Shell::cmd_ls,
            Self::Cd => Shell::cmd_cd,
            Self::Pwd => Shell::cmd_pwd,
            Self::Cat => Shell::cmd_cat,
            Self::Echo => Shell::cmd_echo,
            Self::Mkdir => Shell::cmd_mkdir,
            Self::Rm => Shell::cmd_rm,
            Self::Mv => Shell::cmd_mv,
            Self::Cp => Shell::cmd_cp,
            Self::Du => Shell::cmd_du,
            Self::Df => Shell::cmd_df,
            Self::Touch => Shell::cmd_touch,
            Self::Edit => Shell::cmd_edit,
            Self::Exec => Shell::cmd_exec,
            Self::Alias => Shell::cmd_alias,
            Self::Unalias => Shell::cmd_unalias,
            Self::Export => Shell::cmd_export,
            Self::Unset => Shell::cmd_unset,
            Self::Env => Shell::cmd_env,
            Self::Exit => Shell::cmd_exit,
        }
    }

    /// Usage error for this command, using its help entry.
    #[must_use]
    pub fn usage_error(self) -> MshError {
        let usage = get_help(self.name()).map_or(self.name(), |h| h.usage);
        MshError::usage(usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_has_help() {
        for builtin in Builtin::ALL {
            assert!(get_help(builtin.name()).is_some(), "{}", builtin.name());
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(Builtin::from_name("ls"), Some(Builtin::Ls));
        assert_eq!(Builtin::from_name("unalias"), Some(Builtin::Unalias));
        assert_eq!(Builtin::from_name("LS"), None);
        assert_eq!(Builtin::from_name("wifi"), None);
    }

    #[test]
    fn usage_error_uses_help_text() {
        assert_eq!(
            Builtin::Cp.usage_error().to_string(),
            "Usage: cp <SOURCE> <DEST>"
        );
    }
}
