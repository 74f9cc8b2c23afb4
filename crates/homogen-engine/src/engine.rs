//! The homogenization engine: validated graph plus ordered evaluation.

use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

use indexmap::IndexMap;
use tracing::{debug, info};

use homogen_core::{CoefValue, FeProblem, HomogenError, MiniAppSpec, Result, TermInputs};

use crate::graph::DependencyGraph;
use crate::miniapp::{MiniApp, Role, TermApp};
use crate::store::ResultStore;

/// Output of one engine run.
#[derive(Debug, Clone, PartialEq)]
pub struct HomogenizationResult {
    /// Final coefficients, in declaration order.
    pub coefs: IndexMap<String, CoefValue>,

    /// Every evaluated value, requirements included; only with `ret_all`.
    pub dependencies: Option<ResultStore>,
}

/// Evaluates requirements and coefficients in dependency order.
///
/// The engine holds no per-run state; each [`Engine::call`] starts from an
/// empty [`ResultStore`].
pub struct Engine {
    apps: Vec<Box<dyn MiniApp>>,
    roles: Vec<Role>,
    graph: DependencyGraph,
    order: Vec<usize>,
}

impl Engine {
    /// Build an engine from declared term mini-apps.
    pub fn new(
        requirements: &IndexMap<String, MiniAppSpec>,
        coefs: &IndexMap<String, MiniAppSpec>,
    ) -> Result<Self> {
        let terms = |apps: &IndexMap<String, MiniAppSpec>, role| -> Vec<Box<dyn MiniApp>> {
            apps.iter()
                .map(|(name, spec)| {
                    Box::new(TermApp::new(name.clone(), role, spec.clone())) as Box<dyn MiniApp>
                })
                .collect()
        };
        Self::from_apps(
            terms(requirements, Role::Requirement),
            terms(coefs, Role::Coefficient),
        )
    }

    /// Build an engine from arbitrary mini-apps.
    ///
    /// All graph errors are raised here, before anything is evaluated.
    pub fn from_apps(
        requirements: Vec<Box<dyn MiniApp>>,
        coefs: Vec<Box<dyn MiniApp>>,
    ) -> Result<Self> {
        let requirement_names: HashSet<&str> = requirements.iter().map(|a| a.name()).collect();
        if let Some(clash) = coefs.iter().find(|a| requirement_names.contains(a.name())) {
            return Err(HomogenError::configuration(format!(
                "'{}' is declared both as a requirement and as a coefficient",
                clash.name()
            )));
        }

        let roles: Vec<Role> = std::iter::repeat_n(Role::Requirement, requirements.len())
            .chain(std::iter::repeat_n(Role::Coefficient, coefs.len()))
            .collect();
        let apps: Vec<Box<dyn MiniApp>> = requirements.into_iter().chain(coefs).collect();

        let graph = DependencyGraph::build(apps.iter().map(|a| (a.name(), a.requires())))?;
        let order = graph.topological_order();
        debug!(
            order = ?order.iter().map(|&i| graph.name(i)).collect::<Vec<_>>(),
            "planned evaluation order"
        );

        Ok(Self {
            apps,
            roles,
            graph,
            order,
        })
    }

    /// Names in evaluation order.
    pub fn order(&self) -> Vec<&str> {
        self.order.iter().map(|&i| self.graph.name(i)).collect()
    }

    pub fn role(&self, name: &str) -> Option<Role> {
        self.graph.index_of(name).map(|i| self.roles[i])
    }

    /// Coefficient names in declaration order.
    pub fn coef_names(&self) -> impl Iterator<Item = &str> {
        self.names_with(Role::Coefficient)
    }

    /// Requirement names in declaration order.
    pub fn requirement_names(&self) -> impl Iterator<Item = &str> {
        self.names_with(Role::Requirement)
    }

    fn names_with(&self, role: Role) -> impl Iterator<Item = &str> {
        self.apps
            .iter()
            .zip(&self.roles)
            .filter(move |(_, r)| **r == role)
            .map(|(a, _)| a.name())
    }

    /// Run every mini-app once and collect the coefficients.
    ///
    /// With `ret_all` the full result store is returned as well. Any failure
    /// aborts the run and no result is produced.
    pub fn call(
        &self,
        problem: &mut dyn FeProblem,
        volume: f64,
        ret_all: bool,
    ) -> Result<HomogenizationResult> {
        let store = self.evaluate(problem, volume)?;
        let coefs = store.gather(self.coef_names())?;
        Ok(HomogenizationResult {
            coefs,
            dependencies: ret_all.then_some(store),
        })
    }

    /// Run every mini-app once, returning the full result store.
    pub fn evaluate(&self, problem: &mut dyn FeProblem, volume: f64) -> Result<ResultStore> {
        let started = Instant::now();
        let mut store = ResultStore::new();
        for &node in &self.order {
            self.evaluate_node(node, &mut store, problem, volume)?;
        }
        info!(
            evaluated = store.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "homogenization run finished"
        );
        Ok(store)
    }

    /// Invalidate `name` and everything depending on it, then evaluate
    /// exactly those again. Returns the recomputed names in order.
    pub fn recompute(
        &self,
        store: &mut ResultStore,
        problem: &mut dyn FeProblem,
        volume: f64,
        name: &str,
    ) -> Result<Vec<String>> {
        let Some(node) = self.graph.index_of(name) else {
            return Err(HomogenError::missing("recompute", name));
        };
        let nodes = self.graph.invalidation_set(node);
        for &n in &nodes {
            store.invalidate(self.graph.name(n));
        }
        debug!(
            name,
            invalidated = nodes.len(),
            "recomputing invalidated mini-apps"
        );
        for &n in &nodes {
            self.evaluate_node(n, store, problem, volume)?;
        }
        Ok(nodes.iter().map(|&n| self.graph.name(n).to_string()).collect())
    }

    fn evaluate_node(
        &self,
        node: usize,
        store: &mut ResultStore,
        problem: &mut dyn FeProblem,
        volume: f64,
    ) -> Result<()> {
        let app = &self.apps[node];
        let dependencies = store.gather(app.requires().iter().map(String::as_str))?;
        let started = Instant::now();
        let value = app
            .evaluate(
                problem,
                TermInputs {
                    dependencies: &dependencies,
                    volume: Some(volume),
                },
            )
            .map_err(|e| HomogenError::evaluation(app.name(), e))?;
        debug!(
            name = app.name(),
            role = %self.roles[node],
            kind = %value.kind(),
            shape = ?value.shape(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "evaluated mini-app"
        );
        store.insert(app.name(), value)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("order", &self.order())
            .finish_non_exhaustive()
    }
}
