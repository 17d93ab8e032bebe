use std::fmt::Arguments;
use std::io::{self, Write};

/// Sink for the execution trace.
///
/// Every line goes to the backing writer; with `echo` set it is also
/// mirrored to the console. Which writer backs the sink has no bearing on
/// execution semantics, so tests run against `Vec<u8>` or `io::sink()`.
pub struct Tracer<W: Write> {
    out: W,
    echo: bool,
}

impl<W: Write> Tracer<W> {
    pub fn new(out: W, echo: bool) -> Self {
        Tracer { out, echo }
    }

    /// Write one trace line, echoing when enabled.
    pub fn line(&mut self, args: Arguments<'_>) -> io::Result<()> {
        self.out.write_fmt(args)?;
        self.out.write_all(b"\n")?;
        if self.echo {
            println!("{args}");
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Flush and hand back the writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
