//! The mini-app contract and its concrete variants.

use std::fmt;

use homogen_core::{
    CoefValue, FeProblem, HomogenError, MiniAppSpec, Result, TermError, TermInputs, VolumeSpec,
};
use indexmap::IndexMap;
use tracing::info;

/// Name under which the volume mini-app reports errors.
pub const VOLUME_NAME: &str = "volume";

/// A single named numeric sub-computation.
///
/// Implementations select the problem variables they need, then evaluate.
/// That mutates the problem's active selection, so mini-apps sharing a
/// problem must run one after another.
pub trait MiniApp {
    fn name(&self) -> &str;

    /// Names whose values must be computed before this one.
    fn requires(&self) -> &[String];

    /// Compute the value. `inputs.dependencies` holds exactly the values of
    /// [`MiniApp::requires`].
    fn evaluate(
        &self,
        problem: &mut dyn FeProblem,
        inputs: TermInputs<'_>,
    ) -> std::result::Result<CoefValue, TermError>;
}

/// Whether a term feeds other mini-apps or is a final coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Requirement,
    Coefficient,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requirement => f.write_str("requirement"),
            Self::Coefficient => f.write_str("coefficient"),
        }
    }
}

/// A requirement or coefficient defined by a term expression.
#[derive(Debug, Clone, PartialEq)]
pub struct TermApp {
    name: String,
    role: Role,
    spec: MiniAppSpec,
}

impl TermApp {
    pub fn new(name: impl Into<String>, role: Role, spec: MiniAppSpec) -> Self {
        Self {
            name: name.into(),
            role,
            spec,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn spec(&self) -> &MiniAppSpec {
        &self.spec
    }
}

impl MiniApp for TermApp {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires(&self) -> &[String] {
        &self.spec.requires
    }

    fn evaluate(
        &self,
        problem: &mut dyn FeProblem,
        inputs: TermInputs<'_>,
    ) -> std::result::Result<CoefValue, TermError> {
        problem.select_variables(&self.spec.variables)?;
        problem.evaluate(&self.spec.expression, inputs)
    }
}

/// The domain-volume mini-app.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    spec: VolumeSpec,
}

impl Volume {
    pub fn new(spec: VolumeSpec) -> Self {
        Self { spec }
    }

    pub fn is_explicit(&self) -> bool {
        self.spec.is_explicit()
    }

    /// Resolve the volume once, before any coefficient is evaluated.
    ///
    /// An explicit value never touches the problem. The result must be a
    /// finite, strictly positive scalar.
    pub fn resolve(&self, problem: &mut dyn FeProblem) -> Result<f64> {
        let no_dependencies = IndexMap::new();
        let inputs = TermInputs {
            dependencies: &no_dependencies,
            volume: None,
        };
        let value = self
            .evaluate(problem, inputs)
            .map_err(|e| HomogenError::evaluation(VOLUME_NAME, e))?;
        let Some(volume) = value.as_scalar() else {
            return Err(HomogenError::evaluation(
                VOLUME_NAME,
                TermError::unsupported(format!(
                    "volume must be a scalar, got a {} of shape {:?}",
                    value.kind(),
                    value.shape()
                )),
            ));
        };
        if !(volume.is_finite() && volume > 0.0) {
            return Err(HomogenError::configuration(format!(
                "volume must be finite and positive, got {}",
                volume
            )));
        }
        info!(volume, explicit = self.is_explicit(), "resolved domain volume");
        Ok(volume)
    }
}

impl MiniApp for Volume {
    fn name(&self) -> &str {
        VOLUME_NAME
    }

    fn requires(&self) -> &[String] {
        &[]
    }

    fn evaluate(
        &self,
        problem: &mut dyn FeProblem,
        inputs: TermInputs<'_>,
    ) -> std::result::Result<CoefValue, TermError> {
        match &self.spec {
            VolumeSpec::Explicit { value } => Ok(CoefValue::scalar(*value)),
            VolumeSpec::Computed(spec) => {
                problem.select_variables(&spec.variables)?;
                problem.evaluate(&spec.expression, inputs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homogen_problem::{ProblemSpec, SampledProblem};
    use pretty_assertions::assert_eq;

    fn problem(weights: &str) -> SampledProblem {
        let spec: ProblemSpec = serde_json::from_str(&format!(
            r#"{{"weights": {weights}, "fields": {{"u": [[1.0, 2.0], [3.0, 4.0]]}}}}"#
        ))
        .unwrap();
        SampledProblem::from_spec(&spec).unwrap()
    }

    #[test]
    fn explicit_volume_never_evaluates() {
        let mut p = problem("[0.5, 0.5]");
        let v = Volume::new(VolumeSpec::Explicit { value: 2.5 });
        assert_eq!(v.resolve(&mut p).unwrap(), 2.5);
        assert_eq!(p.evaluation_count(), 0);
    }

    #[test]
    fn computed_volume_evaluates_once() {
        let mut p = problem("[0.25, 0.5]");
        let v = Volume::new(VolumeSpec::default());
        assert_eq!(v.resolve(&mut p).unwrap(), 0.75);
        assert_eq!(p.evaluation_count(), 1);
    }

    #[test]
    fn non_scalar_volume_names_volume() {
        let mut p = problem("[0.5, 0.5]");
        let v = Volume::new(VolumeSpec::Computed(
            MiniAppSpec::new("integrate(u)").with_variables(["u"]),
        ));
        let err = v.resolve(&mut p).unwrap_err();
        assert_eq!(err.mini_app(), Some(VOLUME_NAME));
        assert!(matches!(err, HomogenError::Evaluation { .. }));
    }

    #[test]
    fn zero_volume_is_configuration_error() {
        let mut p = SampledProblem::from_spec(&ProblemSpec::default()).unwrap();
        let v = Volume::new(VolumeSpec::default());
        let err = v.resolve(&mut p).unwrap_err();
        assert!(matches!(err, HomogenError::Configuration(_)));

        let v = Volume::new(VolumeSpec::Explicit { value: -1.0 });
        assert!(matches!(
            v.resolve(&mut p),
            Err(HomogenError::Configuration(_))
        ));
    }

    #[test]
    fn term_app_selects_variables() {
        let mut p = problem("[0.5, 0.5]");
        let app = TermApp::new(
            "m",
            Role::Coefficient,
            MiniAppSpec::new("integrate(u)").with_variables(["u"]),
        );
        let deps = IndexMap::new();
        let value = app
            .evaluate(
                &mut p,
                TermInputs {
                    dependencies: &deps,
                    volume: Some(1.0),
                },
            )
            .unwrap();
        assert_eq!(value, CoefValue::vector(vec![2.0, 3.0]));
        assert_eq!(p.selected_variables(), &["u".to_string()]);
        assert_eq!(app.role(), Role::Coefficient);
    }
}
