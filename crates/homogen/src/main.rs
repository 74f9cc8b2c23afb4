//! `homogen` -- homogenized coefficients of periodic microstructures.
//!
//! Parses the command line, loads the configuration, builds the
//! homogenization application and runs it, printing a report and saving the
//! coefficients.

mod app;
mod cli;
mod context;
mod lifecycle;
mod output;
mod parametric;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use app::HomogenizationApp;
use cli::Cli;
use context::RuntimeContext;
use parametric::ConfigVariants;

fn main() {
    let cli = Cli::parse();

    // Exactly one input file; anything else only prints usage.
    let [filename_in] = cli.filenames.as_slice() else {
        Cli::command().print_help().ok();
        println!();
        return;
    };

    let ctx = RuntimeContext::from_cli(&cli, filename_in);
    init_logging(ctx.verbose);

    if let Err(e) = run(&ctx) {
        if ctx.json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

/// Log to stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "homogen=debug" } else { "homogen=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(ctx: &RuntimeContext) -> Result<()> {
    let conf = homogen_config::load_conf(&ctx.filename_in)
        .with_context(|| format!("cannot load {}", ctx.filename_in.display()))?;

    let app = HomogenizationApp::new(conf, ctx)?;
    debug!(order = ?app.engine().order(), trunk = %ctx.output_trunk, "starting");

    // Reports are printed per case as it finishes; JSON needs the whole run.
    let outcomes = app.run(&mut ConfigVariants)?;
    if ctx.json {
        output::output_json(&output::outcomes_json(&outcomes))?;
    }
    Ok(())
}
