//! Output lifecycle of an application run: directory setup, provenance and
//! artifact files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use homogen_coefs::{Coefficients, snapshot, store, text};
use homogen_config::ProblemConf;
use homogen_engine::ResultStore;

use crate::context::RuntimeContext;
use crate::parametric::Case;

/// File name of a variant's resolved configuration.
pub const RESOLVED_CONF: &str = "resolved.yaml";

/// Files written for one case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SavedFiles {
    pub structured: PathBuf,
    pub snapshot: PathBuf,
    pub table: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_conf: Option<PathBuf>,
}

/// Decides where output goes and writes it.
#[derive(Debug, Clone)]
pub struct OutputLifecycle {
    trunk: String,
    ret_all: bool,
}

impl OutputLifecycle {
    pub fn new(ctx: &RuntimeContext) -> Self {
        Self {
            trunk: ctx.output_trunk.clone(),
            ret_all: ctx.ret_all,
        }
    }

    pub fn ret_all(&self) -> bool {
        self.ret_all
    }

    /// Create the output directory and copy the configuration file into it.
    pub fn setup(&self, conf: &ProblemConf) -> Result<()> {
        let out = &conf.options.output_dir;
        fs::create_dir_all(out)
            .with_context(|| format!("cannot create output directory {}", out.display()))?;

        let source = &conf.filename;
        let Some(name) = source.file_name() else {
            return Ok(());
        };
        let dest = out.join(name);
        if same_file(source, &dest) {
            debug!(path = %source.display(), "configuration already in output directory");
            return Ok(());
        }
        fs::copy(source, &dest).with_context(|| {
            format!("cannot copy {} to {}", source.display(), dest.display())
        })?;
        debug!(from = %source.display(), to = %dest.display(), "copied configuration");
        Ok(())
    }

    /// Write the artifacts of one successfully computed case.
    ///
    /// Returns the written files and the tex names that matched no
    /// coefficient.
    pub fn save(
        &self,
        case: &Case,
        coefs: &Coefficients,
        dependencies: Option<&ResultStore>,
    ) -> Result<(SavedFiles, Vec<String>)> {
        let opts = &case.conf.options;
        let out = &opts.output_dir;
        fs::create_dir_all(out)
            .with_context(|| format!("cannot create output directory {}", out.display()))?;

        let mut files = SavedFiles {
            structured: out.join(format!("{}.{}", opts.coef_save_name, store::EXTENSION)),
            snapshot: out.join(format!("{}.{}", opts.coef_save_name, snapshot::EXTENSION)),
            table: out.join(format!("{}.{}", opts.coef_save_name, text::EXTENSION)),
            ..SavedFiles::default()
        };
        store::save_structured(&files.structured, coefs)
            .with_context(|| format!("cannot save {}", files.structured.display()))?;
        snapshot::save_snapshot(&files.snapshot, coefs)
            .with_context(|| format!("cannot save {}", files.snapshot.display()))?;
        let unmatched = text::save_text(&files.table, coefs)
            .with_context(|| format!("cannot save {}", files.table.display()))?;

        if let Some(deps) = dependencies.filter(|_| self.ret_all) {
            let path = out.join(format!("{}_dependencies.{}", self.trunk, text::EXTENSION));
            let table = text::render_entries(
                deps.iter().map(|(name, value)| (name.as_str(), value)),
                &opts.float_format,
            );
            fs::write(&path, table).with_context(|| format!("cannot save {}", path.display()))?;
            files.dependencies = Some(path);
        }

        if case.label.is_some() {
            let path = out.join(RESOLVED_CONF);
            fs::write(&path, case.conf.to_yaml()?)
                .with_context(|| format!("cannot save {}", path.display()))?;
            files.resolved_conf = Some(path);
        }

        info!(dir = %out.display(), name = %opts.coef_save_name, "saved coefficients");
        Ok((files, unmatched))
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
