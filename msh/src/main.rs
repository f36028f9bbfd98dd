use clap::Parser;
use msh::{Shell, ShellBuilder, StdConsole};
use msh_config::{ConfigLoader, LogFormat, MshConfig};
use msh_core::{LocalFs, MemoryFs};
use msh_sdk::{Console, Filesystem};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod repl;

/// msh - line-oriented command interpreter for small-device filesystems
#[derive(Parser, Debug)]
#[command(name = "msh", version, about)]
struct Args {
    /// Host directory used as the device root; without one the session runs
    /// on a volatile in-memory filesystem
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Execute command and exit
    #[arg(short = 'c')]
    command: Option<String>,

    /// Script file on the device filesystem to execute
    script: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    let config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("msh: failed to load config: {e}");
            return ExitCode::from(2);
        }
    };

    init_logging(&config);

    let root = args.root.clone().or_else(|| config.shell.root_path());
    let fs: Box<dyn Filesystem> = match root {
        Some(root) => match LocalFs::new(&root) {
            Ok(fs) => {
                info!(root = %root.display(), "using host directory as device root");
                Box::new(fs)
            }
            Err(e) => {
                eprintln!("msh: cannot use '{}' as root: {e}", root.display());
                return ExitCode::from(2);
            }
        },
        None => {
            info!("using in-memory filesystem");
            Box::new(MemoryFs::new())
        }
    };

    if let Some(command) = &args.command {
        let Some(mut shell) = build_shell(fs, StdConsole::new(), config) else {
            return ExitCode::FAILURE;
        };
        return exit_code(shell.execute_line(command));
    }

    if let Some(script) = &args.script {
        let Some(mut shell) = build_shell(fs, StdConsole::new(), config) else {
            return ExitCode::FAILURE;
        };
        return match shell.exec_script(script) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("msh: {e}");
                ExitCode::FAILURE
            }
        };
    }

    run_repl(fs, config)
}

fn run_repl(fs: Box<dyn Filesystem>, config: MshConfig) -> ExitCode {
    let console = match repl::ReplConsole::new(&config.shell.history) {
        Ok(console) => console,
        Err(e) => {
            eprintln!("msh: cannot start line editor: {e}");
            return ExitCode::FAILURE;
        }
    };
    let Some(mut shell) = build_shell(fs, console, config) else {
        return ExitCode::FAILURE;
    };

    let result = shell.run();
    let (_, mut console) = shell.into_parts();
    console.save_history();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("msh: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build_shell<C: Console>(
    fs: Box<dyn Filesystem>,
    console: C,
    config: MshConfig,
) -> Option<Shell<Box<dyn Filesystem>, C>> {
    match ShellBuilder::new(fs, console).config(config).build() {
        Ok(shell) => Some(shell),
        Err(e) => {
            eprintln!("msh: {e}");
            None
        }
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// `RUST_LOG` wins over the configured filter, which wins over the level.
fn init_logging(config: &MshConfig) {
    let fallback = if config.logging.filter.is_empty() {
        config.logging.level.as_str().to_string()
    } else {
        config.logging.filter.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    match config.logging.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(layer.pretty())
            .with(filter)
            .init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(layer.compact())
            .with(filter)
            .init(),
    }
}
