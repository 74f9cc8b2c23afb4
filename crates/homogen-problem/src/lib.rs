//! A reference FE problem for the homogen engine.
//!
//! The domain is a set of quadrature points with weights; fields are values
//! sampled at those points. Term expressions integrate pointwise expressions
//! over the domain and combine dependency values with small tensor algebra.

pub mod expr;
pub mod ops;
pub mod sampled;

pub use sampled::{PointValue, ProblemError, ProblemSpec, SampledProblem};
