use msh_core::ops::{
    copy_recursive, disk_usage, is_within, join_path, move_entry, remove_recursive,
    resolve_destination, LineReader,
};
use msh_sdk::{Console, Filesystem, OpenFlags};
use tracing::debug;

use super::Builtin;
use crate::editor::LineEditor;
use crate::error::{MshError, MshResult};
use crate::path::parent;
use crate::shell::Shell;

/// Human-readable size: bytes below 1 KiB, otherwise K or M with two
/// decimals.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < MIB {
        format!("{:.2} K", bytes as f64 / KIB as f64)
    } else {
        format!("{:.2} M", bytes as f64 / MIB as f64)
    }
}

impl<F: Filesystem, C: Console> Shell<F, C> {
    pub(crate) fn cmd_ls(&mut self, args: &[String]) -> MshResult<()> {
        let mut long_format = false;
        let mut target: Option<&str> = None;
        for arg in &args[1..] {
            match arg.as_str() {
                "-l" | "-la" | "-al" => long_format = true,
                flag if flag.starts_with('-') => return Err(Builtin::Ls.usage_error()),
                path => {
                    if target.replace(path).is_some() {
                        return Err(Builtin::Ls.usage_error());
                    }
                }
            }
        }

        let path = self.resolve(target.unwrap_or("."));
        let info = self.fs.stat(&path)?;
        if !info.is_dir() {
            let line = format_entry(&path, info.size, false, long_format);
            return self.say(&line);
        }

        let mut names = self.fs.list_dir(&path)?;
        names.sort();
        for name in names {
            let info = match self.fs.stat(&join_path(&path, &name)) {
                Ok(info) => info,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            };
            let line = format_entry(&name, info.size, info.is_dir(), long_format);
            self.say(&line)?;
        }
        Ok(())
    }

    pub(crate) fn cmd_cd(&mut self, args: &[String]) -> MshResult<()> {
        let target = match args {
            [_] => {
                let line = format!("Current directory: {}", self.cwd);
                return self.say(&line);
            }
            [_, target] => target,
            _ => return Err(Builtin::Cd.usage_error()),
        };

        let path = self.resolve(target);
        match self.fs.stat(&path) {
            Ok(info) if info.is_dir() => {
                self.cwd = path;
                let line = format!("Changed directory to {}", self.cwd);
                self.say(&line)
            }
            Ok(_) => Err(MshError::invalid(format!("'{target}' is not a directory."))),
            Err(e) if e.is_not_found() => Err(MshError::invalid(format!(
                "Directory '{target}' not found."
            ))),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn cmd_pwd(&mut self, _args: &[String]) -> MshResult<()> {
        let cwd = self.cwd.clone();
        self.say(&cwd)
    }

    pub(crate) fn cmd_cat(&mut self, args: &[String]) -> MshResult<()> {
        let [_, target] = args else {
            return Err(Builtin::Cat.usage_error());
        };
        let path = self.resolve(target);

        let mut reader = LineReader::open(&mut self.fs, &path)?;
        let result = self.print_lines(&mut reader);
        let closed = reader.close(&mut self.fs);
        result?;
        closed?;
        Ok(())
    }

    fn print_lines(&mut self, reader: &mut LineReader) -> MshResult<()> {
        while let Some(line) = reader.next_line(&mut self.fs)? {
            self.console.write_line(&line)?;
        }
        Ok(())
    }

    pub(crate) fn cmd_echo(&mut self, args: &[String]) -> MshResult<()> {
        let Some(idx) = args.iter().position(|a| a == ">" || a == ">>") else {
            return self.say(&args[1..].join(" "));
        };
        if args.len() != idx + 2 {
            return Err(Builtin::Echo.usage_error());
        }

        let append = args[idx] == ">>";
        let content = format!("{}\n", args[1..idx].join(" "));
        let path = self.resolve(&args[idx + 1]);
        let flags = if append {
            OpenFlags::append()
        } else {
            OpenFlags::create_truncate()
        };

        let handle = self.fs.open(&path, flags)?;
        let written = self.fs.write(&handle, 0, content.as_bytes());
        let closed = self.fs.close(handle);
        written?;
        closed?;

        let verb = if append { "appended to" } else { "written to" };
        self.say(&format!("Content {verb} '{path}'."))
    }

    pub(crate) fn cmd_mkdir(&mut self, args: &[String]) -> MshResult<()> {
        let [_, target] = args else {
            return Err(Builtin::Mkdir.usage_error());
        };
        let path = self.resolve(target);
        self.fs.mkdir(&path)?;
        self.say(&format!("Directory '{path}' created."))
    }

    pub(crate) fn cmd_rm(&mut self, args: &[String]) -> MshResult<()> {
        let is_force = |a: &String| a == "-rf" || a == "-fr";
        let recursive = args[1..].iter().any(is_force);
        let targets: Vec<&String> = args[1..].iter().filter(|a| !is_force(a)).collect();
        let [target] = targets.as_slice() else {
            return Err(Builtin::Rm.usage_error());
        };

        let path = self.resolve(target);
        if path == "/" {
            return Err(MshError::invalid("Refusing to remove the root directory."));
        }

        let info = self.fs.stat(&path)?;
        let result = if !info.is_dir() {
            self.fs
                .remove_file(&path)
                .map(|()| format!("Removed file: {path}"))
                .map_err(MshError::from)
        } else if recursive {
            remove_recursive(&mut self.fs, &path)
                .map(|count| format!("Removed directory (recursive): {path} ({count} entries)"))
                .map_err(MshError::from)
        } else {
            match self.fs.remove_dir(&path) {
                Ok(()) => Ok(format!("Removed empty directory: {path}")),
                Err(e) if e.is_directory_not_empty() => Err(MshError::invalid(format!(
                    "Directory '{path}' is not empty. Use 'rm -rf' to force removal."
                ))),
                Err(e) => Err(e.into()),
            }
        };

        if is_within(&self.cwd, &path) {
            self.recover_cwd();
        }
        let line = result?;
        self.say(&line)
    }

    /// Moves the working directory up until it names an existing directory.
    fn recover_cwd(&mut self) {
        while self.cwd != "/" && !self.fs.stat(&self.cwd).is_ok_and(|info| info.is_dir()) {
            self.cwd = parent(&self.cwd);
        }
    }

    pub(crate) fn cmd_mv(&mut self, args: &[String]) -> MshResult<()> {
        let [_, src, dest] = args else {
            return Err(Builtin::Mv.usage_error());
        };
        let src = self.resolve(src);
        let dest = self.resolve(dest);
        self.require_source(&src)?;

        let target = move_entry(&mut self.fs, &src, &dest)?;
        if is_within(&self.cwd, &src) {
            self.cwd = format!("{target}{}", &self.cwd[src.len()..]);
        }
        self.say(&format!("Moved/Renamed '{src}' to '{target}'."))
    }

    pub(crate) fn cmd_cp(&mut self, args: &[String]) -> MshResult<()> {
        let [_, src, dest] = args else {
            return Err(Builtin::Cp.usage_error());
        };
        let src = self.resolve(src);
        let dest = self.resolve(dest);
        self.require_source(&src)?;

        let target = resolve_destination(&self.fs, &src, &dest)
            .map_err(|_| MshError::invalid("Cannot copy root directory."))?;
        self.say(&format!("Copying '{src}' to '{target}'..."))?;

        let summary = copy_recursive(&mut self.fs, &src, &target)
            .map_err(|e| MshError::invalid(format!("Copy failed: {e}")))?;
        debug!(
            files = summary.files,
            directories = summary.directories,
            bytes = summary.bytes,
            "copy finished"
        );
        self.say("Copy successful.")
    }

    fn require_source(&self, src: &str) -> MshResult<()> {
        match self.fs.stat(src) {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_found() => {
                Err(MshError::invalid(format!("Source '{src}' not found.")))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn cmd_du(&mut self, args: &[String]) -> MshResult<()> {
        let path = match args {
            [_] => self.cwd.clone(),
            [_, target] => self.resolve(target),
            _ => return Err(Builtin::Du.usage_error()),
        };
        self.say(&format!("Calculating disk usage for '{path}'..."))?;
        let size = disk_usage(&self.fs, &path);
        self.say(&format!("{:>6}\t{path}", format_size(size)))
    }

    pub(crate) fn cmd_df(&mut self, args: &[String]) -> MshResult<()> {
        let path = match args {
            [_] => "/".to_string(),
            [_, target] => self.resolve(target),
            _ => return Err(Builtin::Df.usage_error()),
        };
        let stats = self.fs.statfs(&path)?;
        self.say("Filesystem        Size    Used   Avail  Use%")?;
        self.say(&format!(
            "{path:<18} {:>6} {:>6} {:>6} {:>4}%",
            format_size(stats.total_bytes),
            format_size(stats.used_bytes()),
            format_size(stats.free_bytes),
            stats.usage_percent()
        ))
    }

    pub(crate) fn cmd_touch(&mut self, args: &[String]) -> MshResult<()> {
        let [_, target] = args else {
            return Err(Builtin::Touch.usage_error());
        };
        let path = self.resolve(target);
        match self.fs.stat(&path) {
            Ok(_) => self.say(&format!("File '{path}' already exists.")),
            Err(e) if e.is_not_found() => {
                let handle = self.fs.open(&path, OpenFlags::append())?;
                self.fs.close(handle)?;
                self.say(&format!("File '{path}' created."))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn cmd_edit(&mut self, args: &[String]) -> MshResult<()> {
        let [_, target] = args else {
            return Err(Builtin::Edit.usage_error());
        };
        let path = self.resolve(target);
        LineEditor::new(&self.config.editor).run(&mut self.fs, &mut self.console, &path)?;
        Ok(())
    }
}

fn format_entry(name: &str, size: u64, is_dir: bool, long_format: bool) -> String {
    let suffix = if is_dir { "/" } else { "" };
    if long_format {
        let kind = if is_dir { 'd' } else { '-' };
        format!("  {kind} {size:>8}  {name}{suffix}")
    } else {
        format!("  {name}{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.00 K");
        assert_eq!(format_size(1536), "1.50 K");
        assert_eq!(format_size(2 * 1024 * 1024), "2.00 M");
    }

    #[test]
    fn format_entry_marks_directories() {
        assert_eq!(format_entry("sub", 0, true, false), "  sub/");
        assert_eq!(format_entry("a.txt", 12, false, false), "  a.txt");
        assert_eq!(format_entry("a.txt", 12, false, true), "  -       12  a.txt");
    }
}
