//! Dependency-driven evaluation of homogenization mini-apps.
//!
//! An [`Engine`] is built once from the declared requirements and
//! coefficients. Construction validates the dependency graph (unique names,
//! no undeclared references, no cycles) so a run never starts on a broken
//! graph. A run then evaluates every mini-app exactly once, in a topological
//! order that prefers declaration order among ready nodes, memoizing values
//! in a [`ResultStore`].

pub mod engine;
pub mod graph;
pub mod miniapp;
pub mod store;

pub use engine::{Engine, HomogenizationResult};
pub use graph::DependencyGraph;
pub use miniapp::{MiniApp, Role, TermApp, VOLUME_NAME, Volume};
pub use store::ResultStore;
