//! Core types for the homogen system.
//!
//! Everything the other crates agree on lives here: the numeric value type
//! produced by mini-apps, printf-style float formats, the declarative mini-app
//! descriptions read from configuration, the boundary trait to the external FE
//! problem, and the error taxonomy of an engine run.

pub mod error;
pub mod format;
pub mod miniapp;
pub mod problem;
pub mod value;

pub use error::{HomogenError, Result};
pub use format::FloatFormat;
pub use miniapp::{MiniAppSpec, VolumeSpec};
pub use problem::{FeProblem, TermError, TermInputs};
pub use value::{CoefValue, ShapeError, ValueKind};
