//! Configuration for homogen runs.
//!
//! A configuration file has an `options` section (validated into
//! [`HomogenOptions`]), an optional `problem` section describing the sampled
//! FE problem, and optional `[[parametric]]` variants. Files are TOML, JSON or
//! YAML; see [`load_conf`].

pub mod conf;
pub mod error;
pub mod options;

pub use conf::{ProblemConf, VariantSpec, load_conf, parse_json, parse_toml, parse_yaml};
pub use error::{ConfigError, Result};
pub use options::{HomogenOptions, OPTIONS, OptionInfo, RawOptions};
