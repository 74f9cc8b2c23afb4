//! Declarative mini-app descriptions as written in the configuration.

use serde::{Deserialize, Serialize};

/// Expression used by a computed volume that does not name one.
pub const DEFAULT_VOLUME_EXPRESSION: &str = "integrate(1)";

/// One named numeric sub-computation: a term expression evaluated on the FE
/// problem after selecting `variables`, consuming the values of `requires`.
///
/// The name is not part of the struct; it is the key under which it is
/// declared in `requirements` or `coefs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MiniAppSpec {
    /// Term expression, e.g. `integrate(stress) / volume`.
    #[serde(default)]
    pub expression: String,

    /// Field variables activated on the problem before evaluating.
    #[serde(default)]
    pub variables: Vec<String>,

    /// Names of requirements or coefficients whose values are consumed.
    #[serde(default)]
    pub requires: Vec<String>,

    /// Free-form note, shown in debug logs.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl MiniAppSpec {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            ..Self::default()
        }
    }

    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = variables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = requires.into_iter().map(Into::into).collect();
        self
    }
}

/// How the domain volume is obtained.
///
/// A table with a `value` key is always explicit, whatever else it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VolumeSpec {
    Explicit { value: f64 },
    Computed(MiniAppSpec),
}

impl VolumeSpec {
    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit { .. })
    }
}

impl Default for VolumeSpec {
    fn default() -> Self {
        Self::Computed(MiniAppSpec::new(DEFAULT_VOLUME_EXPRESSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn explicit_volume_wins() {
        let v: VolumeSpec =
            serde_json::from_str(r#"{"value": 2.5, "expression": "integrate(1)"}"#).unwrap();
        assert_eq!(v, VolumeSpec::Explicit { value: 2.5 });
    }

    #[test]
    fn computed_volume() {
        let v: VolumeSpec =
            serde_json::from_str(r#"{"expression": "integrate(1)", "variables": ["u"]}"#).unwrap();
        assert_eq!(
            v,
            VolumeSpec::Computed(MiniAppSpec::new("integrate(1)").with_variables(["u"]))
        );
        assert!(!v.is_explicit());
    }

    #[test]
    fn unknown_keys_rejected() {
        let res = serde_json::from_str::<MiniAppSpec>(r#"{"expresion": "x"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn defaults_are_empty() {
        let spec: MiniAppSpec = serde_json::from_str(r#"{"expression": "1"}"#).unwrap();
        assert!(spec.variables.is_empty());
        assert!(spec.requires.is_empty());
    }
}
