//! The `options` section and its validation.

use std::collections::HashSet;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use homogen_core::miniapp::DEFAULT_VOLUME_EXPRESSION;
use homogen_core::{FloatFormat, MiniAppSpec, VolumeSpec};

use crate::error::{ConfigError, Result};

/// Largest `print_digits` accepted; f64 carries 17 significant digits.
pub const MAX_PRINT_DIGITS: usize = 17;

/// Name reserved for the domain volume inside term expressions.
pub const RESERVED_NAME: &str = "volume";

/// One entry of the option table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionInfo {
    pub name: &'static str,
    pub required: bool,
    /// Default value as written in a config file, when optional.
    pub default: Option<&'static str>,
    pub help: &'static str,
}

impl OptionInfo {
    pub fn find(name: &str) -> Option<&'static OptionInfo> {
        OPTIONS.iter().find(|o| o.name == name)
    }

    /// `name: help`, plus the default when there is one.
    pub fn describe(&self) -> String {
        match self.default {
            Some(default) => format!("{}: {} (default: {})", self.name, self.help, default),
            None => format!("{}: {}", self.name, self.help),
        }
    }
}

/// Every option the application understands.
pub const OPTIONS: &[OptionInfo] = &[
    OptionInfo {
        name: "volume",
        required: true,
        default: None,
        help: "domain volume: { value = <float> } or a mini-app",
    },
    OptionInfo {
        name: "requirements",
        required: true,
        default: None,
        help: "intermediate mini-apps, by name",
    },
    OptionInfo {
        name: "coefs",
        required: true,
        default: None,
        help: "coefficient mini-apps, by name",
    },
    OptionInfo {
        name: "print_digits",
        required: false,
        default: Some("3"),
        help: "digits used by the console report",
    },
    OptionInfo {
        name: "float_format",
        required: false,
        default: Some("%8.3e"),
        help: "printf-style format of the text table",
    },
    OptionInfo {
        name: "coef_save_name",
        required: false,
        default: Some("coefs"),
        help: "file name trunk of the saved coefficients",
    },
    OptionInfo {
        name: "tex_names",
        required: false,
        default: None,
        help: "display names used in the text table",
    },
    OptionInfo {
        name: "output_dir",
        required: false,
        default: Some("."),
        help: "directory receiving all output files",
    },
];

/// The `options` section as written, before defaults and validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOptions {
    pub volume: Option<VolumeSpec>,
    pub requirements: Option<IndexMap<String, MiniAppSpec>>,
    pub coefs: Option<IndexMap<String, MiniAppSpec>>,
    pub print_digits: Option<usize>,
    pub float_format: Option<String>,
    pub coef_save_name: Option<String>,
    pub tex_names: Option<IndexMap<String, String>>,
    pub output_dir: Option<PathBuf>,
}

impl RawOptions {
    fn is_set(&self, name: &str) -> bool {
        match name {
            "volume" => self.volume.is_some(),
            "requirements" => self.requirements.is_some(),
            "coefs" => self.coefs.is_some(),
            "print_digits" => self.print_digits.is_some(),
            "float_format" => self.float_format.is_some(),
            "coef_save_name" => self.coef_save_name.is_some(),
            "tex_names" => self.tex_names.is_some(),
            "output_dir" => self.output_dir.is_some(),
            _ => false,
        }
    }
}

/// Validated application options with every default applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomogenOptions {
    pub volume: VolumeSpec,
    pub requirements: IndexMap<String, MiniAppSpec>,
    pub coefs: IndexMap<String, MiniAppSpec>,
    pub print_digits: usize,
    pub float_format: FloatFormat,
    pub coef_save_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tex_names: Option<IndexMap<String, String>>,
    pub output_dir: PathBuf,
}

impl HomogenOptions {
    /// Apply defaults and validate.
    ///
    /// Every missing required option is reported in a single
    /// [`ConfigError::MissingOptions`].
    pub fn from_raw(raw: RawOptions) -> Result<Self> {
        let missing: Vec<String> = OPTIONS
            .iter()
            .filter(|o| o.required && !raw.is_set(o.name))
            .map(|o| o.name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingOptions(missing));
        }

        let (Some(volume), Some(requirements), Some(coefs)) =
            (raw.volume, raw.requirements, raw.coefs)
        else {
            return Err(ConfigError::MissingOptions(Vec::new()));
        };

        let print_digits = raw.print_digits.unwrap_or(3);
        if print_digits > MAX_PRINT_DIGITS {
            return Err(ConfigError::invalid(
                "print_digits",
                format!("{} exceeds the maximum of {}", print_digits, MAX_PRINT_DIGITS),
            ));
        }

        let float_format = match raw.float_format {
            Some(spec) => FloatFormat::parse(&spec)
                .map_err(|e| ConfigError::invalid("float_format", e.to_string()))?,
            None => FloatFormat::default(),
        };

        let coef_save_name = raw.coef_save_name.unwrap_or_else(|| "coefs".to_string());
        if coef_save_name.trim().is_empty() || coef_save_name.contains(['/', '\\']) {
            return Err(ConfigError::invalid(
                "coef_save_name",
                format!("'{}' is not a plain file name", coef_save_name),
            ));
        }

        let opts = Self {
            volume: normalize_volume(volume)?,
            requirements,
            coefs,
            print_digits,
            float_format,
            coef_save_name,
            tex_names: raw.tex_names,
            output_dir: raw.output_dir.unwrap_or_else(|| PathBuf::from(".")),
        };
        opts.check_mini_apps()?;
        Ok(opts)
    }

    /// All declared mini-app names: requirements first, then coefficients.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.requirements
            .keys()
            .chain(self.coefs.keys())
            .map(String::as_str)
    }

    fn check_mini_apps(&self) -> Result<()> {
        let sections = [("requirements", &self.requirements), ("coefs", &self.coefs)];
        let mut seen = HashSet::new();
        for (section, apps) in sections {
            for (name, spec) in apps {
                let key = format!("{}.{}", section, name);
                if name.trim().is_empty() {
                    return Err(ConfigError::invalid(section, "empty mini-app name"));
                }
                if name == RESERVED_NAME {
                    return Err(ConfigError::invalid(key, "'volume' is a reserved name"));
                }
                if !seen.insert(name.as_str()) {
                    return Err(ConfigError::invalid(
                        key,
                        "declared both as a requirement and as a coefficient",
                    ));
                }
                if spec.expression.trim().is_empty() {
                    return Err(ConfigError::invalid(key, "missing expression"));
                }
            }
        }
        Ok(())
    }
}

fn normalize_volume(volume: VolumeSpec) -> Result<VolumeSpec> {
    match volume {
        VolumeSpec::Explicit { value } if !(value.is_finite() && value > 0.0) => Err(
            ConfigError::invalid("volume", format!("{} is not a positive number", value)),
        ),
        VolumeSpec::Computed(mut spec) => {
            if spec.expression.trim().is_empty() {
                spec.expression = DEFAULT_VOLUME_EXPRESSION.to_string();
            }
            Ok(VolumeSpec::Computed(spec))
        }
        explicit => Ok(explicit),
    }
}
