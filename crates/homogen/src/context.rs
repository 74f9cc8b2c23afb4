//! Runtime context for a `homogen` invocation.

use std::path::{Path, PathBuf};

use crate::cli::Cli;

/// Resolved command-line state, built once in `main`.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    /// The configuration file.
    pub filename_in: PathBuf,

    /// Trunk of the `--all` dependencies file name.
    pub output_trunk: String,

    /// Keep and save every evaluated value, not just the coefficients.
    pub ret_all: bool,

    /// Produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,
}

impl RuntimeContext {
    pub fn from_cli(cli: &Cli, filename_in: &Path) -> Self {
        let output_trunk = cli
            .output_trunk
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| default_trunk(filename_in));
        Self {
            filename_in: filename_in.to_path_buf(),
            output_trunk,
            ret_all: cli.all,
            json: cli.json,
            verbose: cli.verbose,
        }
    }
}

/// Stem of the input file name, e.g. `cases/elastic.toml` -> `elastic`.
fn default_trunk(filename_in: &Path) -> String {
    filename_in
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "homogen".to_string())
}
