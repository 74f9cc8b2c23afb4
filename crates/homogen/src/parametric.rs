//! Parametric studies: which cases an application run consists of.

use homogen_config::ProblemConf;

/// One engine invocation: a resolved configuration and an optional label.
#[derive(Debug, Clone)]
pub struct Case {
    /// `None` for the base case.
    pub label: Option<String>,
    pub conf: ProblemConf,
}

impl Case {
    pub fn base(conf: &ProblemConf) -> Self {
        Self {
            label: None,
            conf: conf.clone(),
        }
    }
}

/// Supplies the cases of a run. Every case gets a fresh problem and result
/// store; nothing is shared between them.
pub trait ParametricHook {
    fn cases(&mut self, base: &ProblemConf) -> anyhow::Result<Vec<Case>>;
}

/// Runs the `[[parametric]]` variants of the configuration, or the base case
/// when there are none.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigVariants;

impl ParametricHook for ConfigVariants {
    fn cases(&mut self, base: &ProblemConf) -> anyhow::Result<Vec<Case>> {
        if base.parametric.is_empty() {
            return Ok(vec![Case::base(base)]);
        }
        Ok(base
            .parametric
            .iter()
            .map(|variant| Case {
                label: Some(variant.label.clone()),
                conf: base.variant(variant),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homogen_config::parse_toml;
    use homogen_core::VolumeSpec;
    use std::path::PathBuf;

    const BASE: &str = r#"
[options]
volume = { value = 1.0 }
requirements = {}
output_dir = "out"

[options.coefs.V]
expression = "volume"
"#;

    #[test]
    fn base_case_without_variants() {
        let conf = parse_toml(BASE).unwrap();
        let cases = ConfigVariants.cases(&conf).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].label, None);
        assert_eq!(cases[0].conf, conf);
    }

    #[test]
    fn one_case_per_variant() {
        let text = format!(
            "{}\n[[parametric]]\nlabel = \"a\"\nvolume = 2.0\n\n[[parametric]]\nlabel = \"b\"\n",
            BASE
        );
        let conf = parse_toml(&text).unwrap();
        let cases = ConfigVariants.cases(&conf).unwrap();
        let labels: Vec<_> = cases.iter().map(|c| c.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("a"), Some("b")]);
        assert_eq!(
            cases[0].conf.options.volume,
            VolumeSpec::Explicit { value: 2.0 }
        );
        assert_eq!(cases[1].conf.options.output_dir, PathBuf::from("out/b"));
    }
}
