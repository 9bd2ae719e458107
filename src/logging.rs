/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::FailResult;

use gridmat_config::LoggingSettings;

use log::{Level, LevelFilter};

use std::fmt;
use std::path::{Path, PathBuf};

/// Builder-style setup for logging.
#[derive(Debug, Clone, Default)]
pub struct GlobalLogger {
    path: Option<PathBuf>,
    verbosity: Verbosity,
    rank: Option<usize>,
}

impl GlobalLogger {
    pub fn from_settings(settings: &LoggingSettings) -> Self
    {
        let mut logger = GlobalLogger::default();
        logger.verbosity(settings.verbosity);
        if let Some(path) = &settings.file {
            logger.path(path);
        }
        logger
    }

    /// Relative paths are resolved when `apply` is called.
    pub fn path<P: AsRef<Path>>(&mut self, path: P) -> &mut Self
    { self.path = Some(path.as_ref().to_owned()); self }

    /// Positive values turn on trace output from the redistribution engine.
    pub fn verbosity(&mut self, level: i32) -> &mut Self
    {
        self.verbosity = match level > 0 {
            true => Verbosity::Loud,
            false => Verbosity::Default,
        };
        self
    }

    /// Prefixes every message with this world rank.
    pub fn rank(&mut self, rank: usize) -> &mut Self
    { self.rank = Some(rank); self }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Verbosity { Default, Loud }

impl Default for Verbosity {
    fn default() -> Self { Verbosity::Default }
}

impl GlobalLogger {
    /// Installs the logger.  Only the first call in a process can succeed.
    pub fn apply(&mut self) -> FailResult<()>
    {Ok({
        use std::time::Instant;

        let start = Instant::now();
        let rank = self.rank;
        let mut fern = ::fern::Dispatch::new();
        fern = fern.format(move |out, message, record| {
                let t = start.elapsed();
                let rank = match rank {
                    Some(rank) => format!("[rank {}]", rank),
                    None => String::new(),
                };
                out.finish(format_args!("[{:>4}.{:03}s]{}[{}][{}] {}",
                    t.as_secs(),
                    t.subsec_millis(),
                    rank,
                    record.target(),
                    ColorizedLevel(record.level()),
                    message))
            })
            .level(LevelFilter::Info)
            .level_for("gridmat_grid", LevelFilter::Debug)
            .level_for("gridmat", match self.verbosity {
                Verbosity::Default => LevelFilter::Debug,
                Verbosity::Loud => LevelFilter::Trace,
            })
            .level_for("gridmat_transport", match self.verbosity {
                Verbosity::Default => LevelFilter::Info,
                Verbosity::Loud => LevelFilter::Trace,
            })
            .chain(std::io::stdout());

        if let Some(path) = self.path.as_ref() {
            fern = fern.chain(::fern::log_file(path)?);
        }

        fern.apply().map_err(|e| format_err!("could not install the logger: {}", e))?;
    })}
}

#[derive(Debug, Copy, Clone)]
pub struct ColorizedLevel(pub Level);

impl fmt::Display for ColorizedLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let style = match self.0 {
            Level::Error => ansi_term::Colour::Red.bold(),
            Level::Warn  => ansi_term::Colour::Red.normal(),
            Level::Info  => ansi_term::Colour::Cyan.bold(),
            Level::Debug => ansi_term::Colour::Yellow.dimmed(),
            Level::Trace => ansi_term::Colour::Cyan.normal(),
        };
        write!(f, "{}", style.paint(self.0.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_reads_settings() {
        let settings = LoggingSettings { verbosity: 2, file: Some(PathBuf::from("out.log")) };
        let logger = GlobalLogger::from_settings(&settings);
        assert_eq!(logger.verbosity, Verbosity::Loud);
        assert_eq!(logger.path, Some(PathBuf::from("out.log")));
        assert_eq!(logger.rank, None);
    }
}
