//! Parse configuration files (TOML, JSON and YAML).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use homogen_core::VolumeSpec;
use homogen_problem::{PointValue, ProblemSpec};

use crate::error::{ConfigError, Result};
use crate::options::{HomogenOptions, RawOptions};

/// One case of a parametric study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantSpec {
    /// Names the variant's output subdirectory.
    pub label: String,

    /// Per-point field data replacing (or extending) the base problem's.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, Vec<PointValue>>,

    /// Explicit volume used instead of the base case's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConf {
    options: Option<RawOptions>,
    #[serde(default)]
    problem: ProblemSpec,
    #[serde(default)]
    parametric: Vec<VariantSpec>,
}

/// A fully validated configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemConf {
    /// File the configuration was loaded from; empty for in-memory sources.
    #[serde(skip)]
    pub filename: PathBuf,

    pub options: HomogenOptions,

    pub problem: ProblemSpec,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parametric: Vec<VariantSpec>,
}

impl ProblemConf {
    fn from_raw(raw: RawConf) -> Result<Self> {
        let options = HomogenOptions::from_raw(raw.options.unwrap_or_default())?;

        let mut labels = HashSet::new();
        for variant in &raw.parametric {
            let label = variant.label.trim();
            if label.is_empty() || label.contains(['/', '\\']) || label == "." || label == ".." {
                return Err(ConfigError::invalid(
                    "parametric.label",
                    format!("'{}' is not a plain directory name", variant.label),
                ));
            }
            if !labels.insert(label) {
                return Err(ConfigError::invalid(
                    "parametric.label",
                    format!("duplicate label '{}'", variant.label),
                ));
            }
            if let Some(v) = variant.volume {
                if !(v.is_finite() && v > 0.0) {
                    return Err(ConfigError::invalid(
                        format!("parametric.{}.volume", variant.label),
                        format!("{} is not a positive number", v),
                    ));
                }
            }
        }

        Ok(Self {
            filename: PathBuf::new(),
            options,
            problem: raw.problem,
            parametric: raw.parametric,
        })
    }

    /// The configuration of a single parametric variant.
    ///
    /// The result has the variant's overrides applied, no variants of its
    /// own, and writes into `<output_dir>/<label>`.
    pub fn variant(&self, variant: &VariantSpec) -> ProblemConf {
        let mut conf = self.clone();
        conf.parametric.clear();
        conf.problem.override_fields(&variant.fields);
        if let Some(value) = variant.volume {
            conf.options.volume = VolumeSpec::Explicit { value };
        }
        conf.options.output_dir = self.options.output_dir.join(&variant.label);
        conf
    }

    /// Serialize the resolved configuration as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::parse(self.source(), e))
    }

    fn source(&self) -> String {
        self.filename.display().to_string()
    }
}

/// Parse a configuration from a TOML string.
pub fn parse_toml(content: &str) -> Result<ProblemConf> {
    let raw: RawConf = toml::from_str(content).map_err(|e| ConfigError::parse("<toml>", e))?;
    ProblemConf::from_raw(raw)
}

/// Parse a configuration from a JSON string.
pub fn parse_json(content: &str) -> Result<ProblemConf> {
    let raw: RawConf =
        serde_json::from_str(content).map_err(|e| ConfigError::parse("<json>", e))?;
    ProblemConf::from_raw(raw)
}

/// Parse a configuration from a YAML string.
pub fn parse_yaml(content: &str) -> Result<ProblemConf> {
    let raw: RawConf =
        serde_yaml::from_str(content).map_err(|e| ConfigError::parse("<yaml>", e))?;
    ProblemConf::from_raw(raw)
}

/// Load a configuration file, picking the format by extension.
///
/// Unknown extensions are tried as JSON, then TOML, then YAML. Syntax
/// errors are reported against the file path; validation errors
/// (missing or invalid options) are returned as they are.
pub fn load_conf(path: &Path) -> Result<ProblemConf> {
    let content = std::fs::read_to_string(path)?;
    let source = path.display().to_string();
    let relabel = |err: ConfigError| match err {
        ConfigError::Parse { reason, .. } => ConfigError::parse(source.clone(), reason),
        other => other,
    };

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let mut conf = match ext.as_deref() {
        Some("toml") => parse_toml(&content).map_err(relabel)?,
        Some("json") => parse_json(&content).map_err(relabel)?,
        Some("yaml" | "yml") => parse_yaml(&content).map_err(relabel)?,
        _ => parse_json(&content)
            .or_else(|e| retry_on_syntax(e, || parse_toml(&content)))
            .or_else(|e| retry_on_syntax(e, || parse_yaml(&content)))
            .map_err(relabel)?,
    };

    debug!(
        path = %source,
        requirements = conf.options.requirements.len(),
        coefs = conf.options.coefs.len(),
        variants = conf.parametric.len(),
        "loaded configuration"
    );
    conf.filename = path.to_path_buf();
    Ok(conf)
}

/// Only syntax errors mean "try the next format"; a parsed file with bad
/// options is reported directly.
fn retry_on_syntax(
    err: ConfigError,
    next: impl FnOnce() -> Result<ProblemConf>,
) -> Result<ProblemConf> {
    match err {
        ConfigError::Parse { .. } => next(),
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const TOML_CONF: &str = r#"
[options]
volume = { value = 1.0 }
coef_save_name = "out"
print_digits = 5

[options.requirements.corr_1]
expression = "integrate(u)"
variables = ["u"]

[options.coefs.A]
expression = "corr_1 / volume"
requires = ["corr_1"]

[options.coefs.B]
expression = "2 * A"
requires = ["A"]

[problem]
weights = [0.5, 0.5]

[problem.fields]
u = [1.0, 3.0]

[[parametric]]
label = "soft"
volume = 2.0

[parametric.fields]
u = [0.5, 0.5]
"#;

    #[test]
    fn parse_toml_full() {
        let conf = parse_toml(TOML_CONF).unwrap();
        assert_eq!(conf.options.coef_save_name, "out");
        assert_eq!(conf.options.print_digits, 5);
        let coefs: Vec<&String> = conf.options.coefs.keys().collect();
        assert_eq!(coefs, vec!["A", "B"]);
        assert_eq!(conf.problem.weights, vec![0.5, 0.5]);
        assert_eq!(conf.parametric.len(), 1);
        assert_eq!(conf.parametric[0].volume, Some(2.0));
    }

    #[test]
    fn parse_json_minimal() {
        let json = r#"{
            "options": {
                "volume": {"value": 2},
                "requirements": {},
                "coefs": {"V": {"expression": "volume"}}
            }
        }"#;
        let conf = parse_json(json).unwrap();
        assert_eq!(conf.options.volume, VolumeSpec::Explicit { value: 2.0 });
        assert!(conf.problem.weights.is_empty());
        assert!(conf.parametric.is_empty());
    }

    #[test]
    fn parse_yaml_minimal() {
        let yaml = "options:\n  volume:\n    value: 1.5\n  requirements: {}\n  coefs:\n    V:\n      expression: volume\n";
        let conf = parse_yaml(yaml).unwrap();
        assert_eq!(conf.options.volume, VolumeSpec::Explicit { value: 1.5 });
    }

    #[test]
    fn missing_options_section_lists_all_required() {
        let err = parse_toml("[problem]\nweights = [1.0]\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingOptions(keys) if keys.len() == 3));
    }

    #[test]
    fn variant_applies_overrides() {
        let conf = parse_toml(TOML_CONF).unwrap();
        let variant = conf.variant(&conf.parametric[0]);
        assert_eq!(variant.options.volume, VolumeSpec::Explicit { value: 2.0 });
        assert_eq!(variant.options.output_dir, PathBuf::from("./soft"));
        assert_eq!(
            variant.problem.fields["u"],
            vec![PointValue::Scalar(0.5), PointValue::Scalar(0.5)]
        );
        assert!(variant.parametric.is_empty());
        // The base configuration is untouched.
        assert_eq!(conf.problem.fields["u"][1], PointValue::Scalar(3.0));
    }

    #[test]
    fn duplicate_labels_rejected() {
        let text = format!("{}\n[[parametric]]\nlabel = \"soft\"\n", TOML_CONF);
        let err = parse_toml(&text).unwrap_err();
        assert!(err.to_string().contains("duplicate label"));
    }

    #[test]
    fn resolved_yaml_reloads() {
        let conf = parse_toml(TOML_CONF).unwrap();
        let variant = conf.variant(&conf.parametric[0]);
        let yaml = variant.to_yaml().unwrap();
        let back = parse_yaml(&yaml).unwrap();
        assert_eq!(back.options, variant.options);
        assert_eq!(back.problem, variant.problem);
    }

    #[test]
    fn load_detects_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.toml");
        std::fs::write(&path, TOML_CONF).unwrap();
        let conf = load_conf(&path).unwrap();
        assert_eq!(conf.filename, path);
        assert_eq!(conf.options.requirements.len(), 1);
    }

    #[test]
    fn load_falls_back_for_unknown_extension() {
        let mut file = tempfile::Builder::new().suffix(".conf").tempfile().unwrap();
        file.write_all(TOML_CONF.as_bytes()).unwrap();
        let conf = load_conf(file.path()).unwrap();
        assert_eq!(conf.options.coefs.len(), 2);
    }

    #[test]
    fn load_reports_path_on_syntax_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[options\n").unwrap();
        let err = load_conf(&path).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn load_missing_file() {
        let err = load_conf(Path::new("/nonexistent/case.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }
}
