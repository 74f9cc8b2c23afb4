//! Error taxonomy of an engine run.
//!
//! Every variant is fatal to the run that raised it. Graph errors
//! (`CyclicDependency`, `MissingDependency`) are raised before any mini-app
//! is evaluated.

use crate::problem::TermError;

#[derive(Debug, thiserror::Error)]
pub enum HomogenError {
    /// A required option is missing or an option value is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The dependency graph has a cycle, listed in traversal order.
    #[error("cyclic dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// A mini-app requires a name that is neither a requirement nor a
    /// coefficient.
    #[error("'{name}' requires undeclared '{dependency}'")]
    MissingDependency { name: String, dependency: String },

    /// A mini-app's numeric evaluation failed.
    #[error("evaluation of '{name}' failed: {source}")]
    Evaluation {
        name: String,
        #[source]
        source: TermError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the homogen crates.
pub type Result<T> = std::result::Result<T, HomogenError>;

impl HomogenError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn evaluation(name: impl Into<String>, source: TermError) -> Self {
        Self::Evaluation {
            name: name.into(),
            source,
        }
    }

    pub fn missing(name: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self::MissingDependency {
            name: name.into(),
            dependency: dependency.into(),
        }
    }

    /// Returns `true` for errors detected from the graph structure alone.
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            Self::CyclicDependency { .. } | Self::MissingDependency { .. }
        )
    }

    /// The mini-app this error is about, when there is one.
    pub fn mini_app(&self) -> Option<&str> {
        match self {
            Self::MissingDependency { name, .. } | Self::Evaluation { name, .. } => Some(name),
            Self::CyclicDependency { cycle } => cycle.first().map(String::as_str),
            Self::Configuration(_) | Self::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_lists_path() {
        let err = HomogenError::CyclicDependency {
            cycle: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "cyclic dependency: A -> B -> A");
        assert!(err.is_graph_error());
        assert_eq!(err.mini_app(), Some("A"));
    }

    #[test]
    fn evaluation_names_mini_app() {
        let err = HomogenError::evaluation("corr_1", TermError::UnknownVariable("u".into()));
        assert_eq!(
            err.to_string(),
            "evaluation of 'corr_1' failed: unknown variable: u"
        );
        assert_eq!(err.mini_app(), Some("corr_1"));
        assert!(!err.is_graph_error());
    }
}
