//! [`SampledProblem`]: fields sampled at weighted quadrature points.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use homogen_core::value::ShapeError;
use homogen_core::{CoefValue, FeProblem, TermError, TermInputs};

use crate::expr::{self, Expr};
use crate::ops;

/// Identifier that resolves to the domain volume inside expressions.
pub const VOLUME_IDENT: &str = "volume";

/// A field value at one quadrature point as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointValue {
    Scalar(f64),
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

impl PointValue {
    pub fn to_value(&self) -> Result<CoefValue, ShapeError> {
        match self {
            Self::Scalar(v) => Ok(CoefValue::scalar(*v)),
            Self::Vector(v) => Ok(CoefValue::vector(v.clone())),
            Self::Matrix(rows) => CoefValue::from_rows(rows),
        }
    }
}

/// The `problem` section of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProblemSpec {
    /// Quadrature weight (measure) of every point.
    #[serde(default)]
    pub weights: Vec<f64>,

    /// Field name -> one value per point.
    #[serde(default)]
    pub fields: IndexMap<String, Vec<PointValue>>,
}

impl ProblemSpec {
    /// Replace the sampled data of the given fields, adding new ones.
    pub fn override_fields(&mut self, overrides: &IndexMap<String, Vec<PointValue>>) {
        for (name, values) in overrides {
            self.fields.insert(name.clone(), values.clone());
        }
    }
}

/// Errors building a [`SampledProblem`] from its configuration.
#[derive(Debug, thiserror::Error)]
pub enum ProblemError {
    #[error("weight {index} is {value}; weights must be finite and non-negative")]
    InvalidWeight { index: usize, value: f64 },

    #[error("field '{field}' has {found} values for {expected} points")]
    FieldLength {
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("field '{field}' changes shape at point {point}")]
    InconsistentShape { field: String, point: usize },

    #[error("field '{field}': {source}")]
    Shape {
        field: String,
        #[source]
        source: ShapeError,
    },
}

/// A problem whose fields are known at a fixed set of weighted points.
#[derive(Debug, Clone, Default)]
pub struct SampledProblem {
    weights: Vec<f64>,
    fields: IndexMap<String, Vec<CoefValue>>,
    selected: Vec<String>,
    evaluations: usize,
}

impl SampledProblem {
    pub fn from_spec(spec: &ProblemSpec) -> Result<Self, ProblemError> {
        for (index, &value) in spec.weights.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ProblemError::InvalidWeight { index, value });
            }
        }

        let points = spec.weights.len();
        let mut fields = IndexMap::with_capacity(spec.fields.len());
        for (name, samples) in &spec.fields {
            if samples.len() != points {
                return Err(ProblemError::FieldLength {
                    field: name.clone(),
                    expected: points,
                    found: samples.len(),
                });
            }
            let values = samples
                .iter()
                .map(PointValue::to_value)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| ProblemError::Shape {
                    field: name.clone(),
                    source,
                })?;
            if let Some(first) = values.first() {
                if let Some(point) = values.iter().position(|v| v.shape() != first.shape()) {
                    return Err(ProblemError::InconsistentShape {
                        field: name.clone(),
                        point,
                    });
                }
            }
            fields.insert(name.clone(), values);
        }

        Ok(Self {
            weights: spec.weights.clone(),
            fields,
            selected: Vec::new(),
            evaluations: 0,
        })
    }

    /// Total measure of the domain (sum of weights).
    pub fn measure(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Number of `evaluate` calls made on this problem.
    pub fn evaluation_count(&self) -> usize {
        self.evaluations
    }

    fn eval(
        &self,
        expr: &Expr,
        inputs: &TermInputs<'_>,
        point: Option<usize>,
    ) -> Result<CoefValue, TermError> {
        match expr {
            Expr::Number(v) => Ok(CoefValue::scalar(*v)),
            Expr::Ident(name) => self.resolve(name, inputs, point),
            Expr::Neg(inner) => Ok(self.eval(inner, inputs, point)?.map(|v| -v)),
            Expr::Binary { op, lhs, rhs } => {
                let a = self.eval(lhs, inputs, point)?;
                let b = self.eval(rhs, inputs, point)?;
                Ok(a.zip_with(&b, |x, y| op.apply(x, y))?)
            }
            Expr::Call { function, args } => self.call(function, args, inputs, point),
        }
    }

    fn resolve(
        &self,
        name: &str,
        inputs: &TermInputs<'_>,
        point: Option<usize>,
    ) -> Result<CoefValue, TermError> {
        if let Some(value) = inputs.dependencies.get(name) {
            return Ok(value.clone());
        }
        if name == VOLUME_IDENT {
            return inputs
                .volume
                .map(CoefValue::scalar)
                .ok_or_else(|| TermError::unsupported("volume is not resolved yet"));
        }
        let Some(samples) = self.fields.get(name) else {
            return Err(TermError::UnknownVariable(name.to_string()));
        };
        if !self.selected.iter().any(|s| s == name) {
            return Err(TermError::UnselectedVariable(name.to_string()));
        }
        match point {
            Some(p) => Ok(samples[p].clone()),
            None => Err(TermError::FieldOutsideIntegral(name.to_string())),
        }
    }

    fn call(
        &self,
        function: &str,
        args: &[Expr],
        inputs: &TermInputs<'_>,
        point: Option<usize>,
    ) -> Result<CoefValue, TermError> {
        let expected = match function {
            "dot" | "outer" => 2,
            "integrate" | "mean" | "trace" | "transpose" | "sym" | "norm" => 1,
            _ => return Err(TermError::UnknownFunction(function.to_string())),
        };
        if args.len() != expected {
            return Err(TermError::Arity {
                function: function.to_string(),
                expected,
                found: args.len(),
            });
        }

        if function == "integrate" || function == "mean" {
            if point.is_some() {
                return Err(TermError::unsupported(format!(
                    "{}() cannot be nested inside another integral",
                    function
                )));
            }
            let integral = self.integrate(&args[0], inputs)?;
            if function == "integrate" {
                return Ok(integral);
            }
            let measure = self.measure();
            if measure == 0.0 {
                return Err(TermError::unsupported("mean() over a domain of zero measure"));
            }
            return Ok(integral.map(|v| v / measure));
        }

        let a = self.eval(&args[0], inputs, point)?;
        match function {
            "dot" => ops::dot(&a, &self.eval(&args[1], inputs, point)?),
            "outer" => ops::outer(&a, &self.eval(&args[1], inputs, point)?),
            "trace" => ops::trace(&a),
            "transpose" => ops::transpose(&a),
            "sym" => ops::sym(&a),
            _ => Ok(ops::norm(&a)),
        }
    }

    /// Weighted sum of `expr` over all points.
    fn integrate(&self, expr: &Expr, inputs: &TermInputs<'_>) -> Result<CoefValue, TermError> {
        let mut total: Option<CoefValue> = None;
        for (p, &weight) in self.weights.iter().enumerate() {
            let term = self.eval(expr, inputs, Some(p))?.map(|v| v * weight);
            total = Some(match total {
                None => term,
                Some(acc) => acc.zip_with(&term, |a, b| a + b)?,
            });
        }
        Ok(total.unwrap_or(CoefValue::scalar(0.0)))
    }
}

impl FeProblem for SampledProblem {
    fn select_variables(&mut self, names: &[String]) -> Result<(), TermError> {
        if let Some(unknown) = names.iter().find(|n| !self.fields.contains_key(n.as_str())) {
            return Err(TermError::UnknownVariable(unknown.clone()));
        }
        self.selected = names.to_vec();
        Ok(())
    }

    fn selected_variables(&self) -> &[String] {
        &self.selected
    }

    fn evaluate(
        &mut self,
        expression: &str,
        inputs: TermInputs<'_>,
    ) -> Result<CoefValue, TermError> {
        self.evaluations += 1;
        let parsed = expr::parse(expression)?;
        trace!(expression, selected = ?self.selected, "evaluating term");
        self.eval(&parsed, &inputs, None)
    }
}
