//! Embed msh as a command engine in your Rust application.
//!
//! Run:  cargo run -p msh --example embed

use msh::{CapturedConsole, MshResult, ShellBuilder};
use msh_core::MemoryFs;

fn print_capture(label: &str, console: &mut CapturedConsole) {
    println!("\n== {label} ==");
    let output = console.take_output();
    if output.is_empty() {
        println!("<empty>");
    } else {
        print!("{output}");
    }
}

fn main() -> MshResult<()> {
    let mut shell = ShellBuilder::new(MemoryFs::new(), CapturedConsole::new())
        .var("APP_NAME", "embed-demo")
        .alias("ll", "ls -l")
        .build()?;

    println!("msh embedded demo");
    println!("APP_NAME from builder: {:?}", shell.get_var("APP_NAME"));

    shell.execute_line("mkdir /data");
    shell.execute_line("echo hello from $APP_NAME > /data/greeting.txt");
    print_capture("write a file", shell.console_mut());

    shell.execute_line("cd /data");
    shell.execute_line("ll");
    shell.execute_line("cat greeting.txt");
    print_capture("alias and relative paths", shell.console_mut());

    let ok = shell.execute_line("cat missing.txt");
    println!("\ncat missing.txt succeeded: {ok}");
    print_capture("errors are reported, not raised", shell.console_mut());

    shell.execute_line("echo pwd > /data/run.msh");
    shell.execute_line("echo exit >> /data/run.msh");
    shell.console_mut().take_output();
    shell.exec_script("run.msh")?;
    print_capture("script execution", shell.console_mut());
    println!("still running after script exit: {}", shell.is_running());

    Ok(())
}
