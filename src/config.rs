use std::env;
use std::path::PathBuf;

pub const DATA_DIR_VAR: &str = "FRIENDTRACKER_DIR";
pub const LOG_VAR: &str = "FRIENDTRACKER_LOG";
pub const DEFAULT_LOG_FILTER: &str = "friendtracker=warn";
const DEFAULT_DIR_NAME: &str = ".friendtracker";

/// Runtime settings for the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the event log and view snapshots.
    pub data_dir: PathBuf,
    /// `env_logger`-style filter directive.
    pub log_filter: String,
}

impl Config {
    /// Resolve settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolve settings from `lookup`, falling back to
    /// `$HOME/.friendtracker` and [`DEFAULT_LOG_FILTER`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup(DATA_DIR_VAR)
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let home = lookup("HOME").filter(|home| !home.is_empty());
                home.map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(DEFAULT_DIR_NAME)
            });
        let log_filter = lookup(LOG_VAR).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Config {
            data_dir,
            log_filter,
        }
    }

    /// Override the data directory, e.g. from a command-line flag.
    pub fn with_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.data_dir = dir;
        }
        self
    }
}
