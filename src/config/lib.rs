/* ************************************************************************ **
** This file is part of gridmat, and is licensed under EITHER the MIT       **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Settings shared by every process of a gridmat computation.
//!
//! Every process must end up with an identical `Settings`; the usual pattern
//! is for each process to read the same file.

#[macro_use] extern crate failure;
#[macro_use] extern crate serde;
#[macro_use] extern crate log;

pub use self::yaml::YamlRead;
#[macro_use]
mod yaml;

#[doc(hidden)] // used by derive_yaml_read!
pub mod reexports {
    pub use serde_ignored;
    pub use serde_yaml;
}

use std::path::PathBuf;
use std::time::Duration;

pub type FailResult<T> = Result<T, failure::Error>;

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    #[serde(default)]
    pub grid: GridSettings,
    #[serde(default)]
    pub transport: TransportSettings,
    #[serde(default)]
    pub redistribution: RedistributionSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}
derive_yaml_read!{Settings}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct GridSettings {
    /// Number of process rows.  The width is implied by the number of processes.
    ///
    /// When absent, the squarest grid is used: the height is the largest
    /// divisor of the process count that does not exceed its square root.
    #[serde(default)]
    pub height: Option<usize>,
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct TransportSettings {
    /// Seconds the in-process backend waits on a receive before reporting a
    /// stall.  `null` waits forever, like a real deadlock would.
    #[serde(default)]
    pub stall_timeout: Option<f64>,
}

impl TransportSettings {
    pub fn stall_timeout(&self) -> FailResult<Option<Duration>>
    {Ok({
        match self.stall_timeout {
            None => None,
            Some(secs) => {
                ensure!(secs.is_finite() && secs > 0.0, "stall-timeout must be a positive number of seconds, not {}", secs);
                Some(Duration::from_millis((secs * 1000.0).ceil() as u64))
            },
        }
    })}
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct RedistributionSettings {
    /// Whether pairs with no dedicated route may go through a single-owner
    /// staging matrix.  When false, such a request is a configuration error.
    #[serde(default = "_default_redistribution_allow_general_purpose")]
    pub allow_general_purpose: bool,
}
fn _default_redistribution_allow_general_purpose() -> bool { true }

impl Default for RedistributionSettings {
    fn default() -> Self
    { RedistributionSettings { allow_general_purpose: _default_redistribution_allow_general_purpose() } }
}

#[derive(Serialize, Deserialize)]
#[derive(Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub struct LoggingSettings {
    /// Positive values enable trace output from the redistribution engine.
    #[serde(default)]
    pub verbosity: i32,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let settings = Settings::from_reader("{}".as_bytes()).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.redistribution.allow_general_purpose);
        assert_eq!(settings.transport.stall_timeout().unwrap(), None);
    }

    #[test]
    fn kebab_case_keys() {
        let text = "
grid:
  height: 2
transport:
  stall-timeout: 1.5
redistribution:
  allow-general-purpose: false
logging:
  verbosity: 1
  file: run.log
";
        let settings = Settings::from_reader(text.as_bytes()).unwrap();
        assert_eq!(settings.grid.height, Some(2));
        assert_eq!(settings.transport.stall_timeout().unwrap(), Some(Duration::from_millis(1500)));
        assert!(!settings.redistribution.allow_general_purpose);
        assert_eq!(settings.logging.verbosity, 1);
        assert_eq!(settings.logging.file, Some(PathBuf::from("run.log")));
    }

    #[test]
    fn unknown_keys_are_tolerated() {
        // (they only produce a warning)
        let settings = Settings::from_reader("grid: { hieght: 3 }".as_bytes()).unwrap();
        assert_eq!(settings.grid.height, None);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(Settings::from_reader("grid: { height: -1 }".as_bytes()).is_err());

        let settings = Settings::from_reader("transport: { stall-timeout: 0 }".as_bytes()).unwrap();
        assert!(settings.transport.stall_timeout().is_err());
    }
}
