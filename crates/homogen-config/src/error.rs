use homogen_core::HomogenError;
use thiserror::Error;

use crate::options::OptionInfo;

/// Errors that can occur while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    /// The configuration file is not valid TOML, JSON or YAML, or does not
    /// have the expected structure.
    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },

    /// Required options are absent. All of them are listed, each with its
    /// description.
    #[error("missing required options: {}{}", .0.join(", "), describe_options(.0))]
    MissingOptions(Vec<String>),

    /// An option value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// An invalid value. Keys of the option table get its description
    /// appended to the reason.
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        let key = key.into();
        let mut reason = reason.into();
        if let Some(info) = OptionInfo::find(&key) {
            reason = format!("{} ({})", reason, info.describe());
        }
        Self::InvalidValue { key, reason }
    }

    pub(crate) fn parse(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

fn describe_options(names: &[String]) -> String {
    names
        .iter()
        .filter_map(|name| OptionInfo::find(name))
        .map(|info| format!("\n  {}", info.describe()))
        .collect()
}

impl From<ConfigError> for HomogenError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Read(io) => HomogenError::Io(io),
            other => HomogenError::Configuration(other.to_string()),
        }
    }
}
