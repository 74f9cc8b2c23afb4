//! Boundary to the external finite-element problem.
//!
//! Mini-apps never touch meshes or solvers directly. They select the field
//! variables they need and ask the problem to evaluate a term expression,
//! handing over the values of their dependencies.

use indexmap::IndexMap;

use crate::value::{CoefValue, ShapeError};

/// Values made available to a term besides the problem's own fields.
#[derive(Debug, Clone, Copy)]
pub struct TermInputs<'a> {
    /// Already computed values of the mini-app's declared dependencies.
    pub dependencies: &'a IndexMap<String, CoefValue>,

    /// The resolved domain volume, once known.
    pub volume: Option<f64>,
}

/// An FE problem a mini-app can evaluate terms on.
///
/// `select_variables` changes shared state that later evaluations observe,
/// so one problem instance must not be driven by two mini-apps at once.
pub trait FeProblem {
    /// Make `names` the active variable selection.
    fn select_variables(&mut self, names: &[String]) -> Result<(), TermError>;

    /// The current active variable selection.
    fn selected_variables(&self) -> &[String];

    /// Evaluate a term expression against the active selection.
    fn evaluate(&mut self, expression: &str, inputs: TermInputs<'_>)
    -> Result<CoefValue, TermError>;
}

/// Errors raised while evaluating a term.
#[derive(Debug, thiserror::Error)]
pub enum TermError {
    #[error("cannot parse expression '{expression}': {reason}")]
    Parse { expression: String, reason: String },

    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    #[error("variable '{0}' is not in the active selection")]
    UnselectedVariable(String),

    #[error("field '{0}' can only be used inside integrate() or mean()")]
    FieldOutsideIntegral(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function}() expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("{0}")]
    Unsupported(String),
}

impl TermError {
    pub fn parse(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }
}
