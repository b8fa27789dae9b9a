//! Process-wide logging setup for the sweeper binary.
//!
//! Records go to stderr and, when a log file is configured, to that file as
//! well. Both sinks receive the same bytes in the form
//! `<timestamp>  <LEVEL>: <message>`.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target, WriteStyle};
use log::LevelFilter;

/// Writes every buffer to both inner writers.
#[derive(Debug)]
struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> Tee<A, B> {
    fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    #[cfg(test)]
    fn into_inner(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.first.write_all(buf)?;
        self.second.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}

/// Install the global logger. `RUST_LOG` overrides `level`.
pub fn init(log_file: Option<&Path>, level: LevelFilter) -> Result<()> {
    let env = Env::default().default_filter_or(level.as_str());
    let mut builder = Builder::from_env(env);
    builder
        .write_style(WriteStyle::Never)
        .format(|buf, record| {
            writeln!(
                buf,
                "{}  {}: {}",
                buf.timestamp_seconds(),
                record.level(),
                record.args()
            )
        });

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            builder.target(Target::Pipe(Box::new(Tee::new(file, io::stderr()))));
        }
        None => {
            builder.target(Target::Stderr);
        }
    }

    builder.try_init().context("install logger")?;
    Ok(())
}

/// Flush buffered records before the process exits.
pub fn flush() {
    log::logger().flush();
}
