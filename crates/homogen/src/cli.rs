//! Clap CLI definition for the `homogen` command.

use std::path::PathBuf;

use clap::Parser;

/// homogen -- homogenized coefficients of periodic microstructures.
#[derive(Parser, Debug)]
#[command(
    name = "homogen",
    about = "Compute homogenized material coefficients",
    long_about = "Evaluates the requirements and coefficients declared in a configuration file \
                  in dependency order, prints the coefficients and saves them to \
                  <output_dir>/<coef_save_name>.h5, a .bin snapshot and a .txt table.",
    version
)]
pub struct Cli {
    /// Trunk of the `<OUTPUT_TRUNK>_dependencies.txt` file written with
    /// `--all` (default: stem of FILENAME_IN). Coefficient files are named
    /// by the `coef_save_name` option.
    #[arg(short = 'o', long = "output", value_name = "OUTPUT_TRUNK")]
    pub output_trunk: Option<String>,

    /// Also report and save every requirement value.
    #[arg(long)]
    pub all: bool,

    /// Print the coefficients as JSON instead of the text report.
    #[arg(long)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Configuration file (TOML, JSON or YAML). Exactly one is expected.
    #[arg(value_name = "FILENAME_IN")]
    pub filenames: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn parses_single_file() {
        let cli = Cli::try_parse_from(["homogen", "case.toml"]).unwrap();
        assert_eq!(cli.filenames, vec![PathBuf::from("case.toml")]);
        assert_eq!(cli.output_trunk, None);
    }

    #[test]
    fn parses_flags() {
        let cli =
            Cli::try_parse_from(["homogen", "-o", "run1", "--all", "--json", "-v", "case.toml"])
                .unwrap();
        assert_eq!(cli.output_trunk.as_deref(), Some("run1"));
        assert!(cli.all && cli.json && cli.verbose);
    }

    #[test]
    fn help_explains_output_trunk() {
        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("<OUTPUT_TRUNK>_dependencies.txt"), "{help}");
        assert!(help.contains("coef_save_name"), "{help}");
    }

    #[test]
    fn arity_is_checked_by_the_caller() {
        let none = Cli::try_parse_from(["homogen"]).unwrap();
        assert!(none.filenames.is_empty());
        let two = Cli::try_parse_from(["homogen", "a.toml", "b.toml"]).unwrap();
        assert_eq!(two.filenames.len(), 2);
    }
}
