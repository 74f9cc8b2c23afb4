//! The homogenization application: engine plus output lifecycle.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use homogen_coefs::Coefficients;
use homogen_config::ProblemConf;
use homogen_engine::{Engine, ResultStore, Volume};
use homogen_problem::SampledProblem;

use crate::context::RuntimeContext;
use crate::lifecycle::{OutputLifecycle, SavedFiles};
use crate::output;
use crate::parametric::{Case, ParametricHook};

/// Result of one computed and saved case.
#[derive(Debug)]
pub struct CaseOutcome {
    pub label: Option<String>,
    pub print_digits: usize,
    pub coefs: Coefficients,
    /// The full result store, with `--all`.
    pub dependencies: Option<ResultStore>,
    pub files: SavedFiles,
    pub unmatched_tex_names: Vec<String>,
}

impl CaseOutcome {
    pub fn output_dir(&self) -> Option<PathBuf> {
        self.files.structured.parent().map(PathBuf::from)
    }
}

pub struct HomogenizationApp {
    conf: ProblemConf,
    engine: Engine,
    output: OutputLifecycle,
    /// Print each case's report to stdout once it is saved.
    report: bool,
}

impl HomogenizationApp {
    /// Validate the mini-app graph. Nothing is evaluated or written yet.
    pub fn new(conf: ProblemConf, ctx: &RuntimeContext) -> Result<Self> {
        let engine = Engine::new(&conf.options.requirements, &conf.options.coefs)
            .with_context(|| format!("invalid mini-app graph in {}", conf.filename.display()))?;
        Ok(Self {
            conf,
            engine,
            output: OutputLifecycle::new(ctx),
            report: !ctx.json,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Run every case the hook asks for, stopping at the first failure.
    pub fn run(&self, hook: &mut dyn ParametricHook) -> Result<Vec<CaseOutcome>> {
        let cases = hook.cases(&self.conf)?;
        self.output.setup(&self.conf)?;
        cases.iter().map(|case| self.run_case(case)).collect()
    }

    /// Compute one case, save its artifacts and print its report.
    ///
    /// Files are only written once every mini-app of the case succeeded.
    pub fn run_case(&self, case: &Case) -> Result<CaseOutcome> {
        let opts = &case.conf.options;
        let label = case.label.as_deref().unwrap_or("base");

        let mut problem = SampledProblem::from_spec(&case.conf.problem)
            .with_context(|| format!("invalid problem definition for case '{}'", label))?;
        let volume = Volume::new(opts.volume.clone()).resolve(&mut problem)?;
        let result = self
            .engine
            .call(&mut problem, volume, self.output.ret_all())?;

        let mut coefs = Coefficients::new(result.coefs)
            .with_tex_names(opts.tex_names.clone())
            .with_float_format(opts.float_format.clone());
        coefs.set_volume(volume);

        let (files, unmatched_tex_names) =
            self.output.save(case, &coefs, result.dependencies.as_ref())?;
        info!(case = label, coefs = coefs.len(), "case finished");

        let outcome = CaseOutcome {
            label: case.label.clone(),
            print_digits: opts.print_digits,
            coefs,
            dependencies: result.dependencies,
            files,
            unmatched_tex_names,
        };
        if self.report {
            output::print_report(&outcome);
        }
        Ok(outcome)
    }
}
