//! Session driver: extract, diff, persist, mutate, repeat.
use irgraph::{graph::IrGraph, icfg::Icfg};
use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use strum::EnumIs;

use crate::{
    database::FactStore,
    diff::compute_diff,
    extractor::extract,
    mutation::{Mutation, MutationSearch},
    sink::{DiffSink, DirectorySink},
    utils::{
        conf::{PersistenceFailurePolicy, SessionConfig},
        error::{FactError, FactResult},
    },
};

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIs)]
pub enum Termination {
    /// No rewrite rule applied anymore.
    Exhausted,
    /// The iteration budget was used up.
    BudgetReached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Number of extracted (and persisted) iterations.
    pub iterations: usize,
    /// Applied rewrites, in order.
    pub mutations: Vec<Mutation>,
    pub persistence_failures: usize,
    pub termination: Termination,
}

pub struct Session {
    config: SessionConfig,
    search: MutationSearch,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let search = MutationSearch::new(config.identity_policy);
        Self { config, search }
    }

    /// Use a custom rule set instead of the built-in rules.
    pub fn with_search(config: SessionConfig, search: MutationSearch) -> Self {
        Self { config, search }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Directory sink rooted at the configured output directory, if any.
    pub fn directory_sink(&self) -> Option<DirectorySink> {
        self.config.output_dir.as_ref().map(DirectorySink::new)
    }

    /// Run the session until no rewrite applies or the iteration budget is
    /// used up.
    ///
    /// Iteration `i` extracts the current program, persists the diff against
    /// iteration `i - 1` (the first diff inserts everything) and then, unless
    /// `i` was the last iteration of the budget, applies one rewrite. Errors
    /// from extraction or mutation end the session; sink errors follow the
    /// configured [`PersistenceFailurePolicy`].
    pub fn run<S: DiffSink + ?Sized>(
        &self,
        graph: &mut IrGraph,
        icfg: &Icfg,
        sink: &mut S,
    ) -> FactResult<SessionReport> {
        let mut rng = ChaCha20Rng::seed_from_u64(self.config.seed);
        let mut persistence_failures = 0;
        let mut mutations = Vec::new();

        if let Err(error) = sink.reset() {
            self.on_persistence_failure(error, &mut persistence_failures)?;
        }

        let mut previous: Option<FactStore> = None;
        let mut iteration = 0;
        let termination = loop {
            let current = extract(graph, icfg)?;
            let diff = compute_diff(previous.as_ref(), Some(&current));
            info!(
                "Iteration {}: {} tuples, {} changed relations",
                iteration,
                current.tuple_count(),
                diff.len()
            );
            if let Err(error) = sink.persist(iteration, &diff) {
                self.on_persistence_failure(error, &mut persistence_failures)?;
            }

            previous = Some(current);
            iteration += 1;
            if iteration > self.config.iteration_budget {
                break Termination::BudgetReached;
            }

            match self.search.try_mutate(graph, icfg, &mut rng)? {
                Some(mutation) => mutations.push(mutation),
                None => break Termination::Exhausted,
            }
        };

        info!(
            "Session finished after {} iterations ({:?}), {} mutations applied",
            iteration,
            termination,
            mutations.len()
        );
        Ok(SessionReport {
            iterations: iteration,
            mutations,
            persistence_failures,
            termination,
        })
    }

    fn on_persistence_failure(
        &self,
        error: FactError,
        failures: &mut usize,
    ) -> FactResult<()> {
        match self.config.persistence_failure {
            PersistenceFailurePolicy::Abort => Err(error),
            PersistenceFailurePolicy::Continue => {
                warn!("Ignoring persistence failure: {}", error);
                *failures += 1;
                Ok(())
            }
        }
    }
}
