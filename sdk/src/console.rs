use std::io;

/// Outcome of a blocking line read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadLine {
    /// A line of input without its terminator. May be empty.
    Line(String),
    /// The user interrupted the read (Ctrl-C).
    Interrupted,
    /// End of input (Ctrl-D, closed stream).
    Eof,
}

pub trait Console {
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    fn write_raw(&mut self, text: &str) -> io::Result<()>;

    fn read_line(&mut self, prompt: &str) -> io::Result<ReadLine>;
}

impl<C: Console + ?Sized> Console for Box<C> {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        (**self).write_line(line)
    }

    fn write_raw(&mut self, text: &str) -> io::Result<()> {
        (**self).write_raw(text)
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<ReadLine> {
        (**self).read_line(prompt)
    }
}
