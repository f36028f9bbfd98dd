//! msh - line-oriented command interpreter for small-device filesystems
//!
//! This crate provides:
//! - Path resolution against a working directory, with `$VAR` prefixes
//! - Variable and alias expansion ahead of a fixed builtin command table
//! - A line-based text editor and script execution
//! - Consoles for interactive use and for capturing output in tests
//!
//! All file access goes through [`msh_sdk::Filesystem`]; the interpreter
//! itself never touches the host filesystem.

pub mod commands;
pub mod console;
pub mod editor;
pub mod error;
pub mod expansion;
pub mod help;
pub mod lexer;
pub mod path;
pub mod shell;
pub mod vars;

pub use commands::{Builtin, Handler};
pub use console::{CapturedConsole, StdConsole};
pub use editor::{EditCommand, EditOutcome, EditorBuffer, LineEditor};
pub use error::{MshError, MshResult};
pub use shell::{Shell, ShellBuilder};
pub use vars::{AliasTable, VariableStore};
