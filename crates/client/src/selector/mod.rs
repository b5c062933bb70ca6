//! Node selection.

mod filter;
mod state;
mod strategy;

pub use filter::{FailedNodes, SelectFilter};
pub use state::SelectorState;
pub use strategy::{Strategy, StrategyKind};

use std::sync::Arc;

use courier_registry::{Node, Registry, RegistryError, RegistryErrorKind};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::SelectError;

/// Per-selection options.
#[derive(Clone, Debug, Default)]
pub struct SelectOptions {
    /// Filters applied in order before the strategy runs
    pub filters: Vec<SelectFilter>,
    /// How to pick among the remaining nodes
    pub strategy: Strategy,
    /// Restrict candidates to these versions; `None` uses every version
    pub versions: Option<Vec<String>>,
}

impl SelectOptions {
    /// Default options: every version, no filters, random strategy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter.
    #[must_use]
    pub fn with_filter(mut self, filter: SelectFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set the strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Only consider nodes of the given versions.
    #[must_use]
    pub fn with_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.versions = Some(versions.into_iter().map(Into::into).collect());
        self
    }

    fn allows_version(&self, version: &str) -> bool {
        self.versions
            .as_ref()
            .is_none_or(|versions| versions.iter().any(|v| v == version))
    }
}

/// Picks one node of a service per attempt.
///
/// Round-robin counters live in a [`SelectorState`] owned by the selector;
/// selectors built with [`Selector::with_state`] can share one.
#[derive(Clone, Debug)]
pub struct Selector<R> {
    registry: R,
    state: Arc<SelectorState>,
    rng: Arc<Mutex<StdRng>>,
}

impl<R: Registry> Selector<R> {
    /// Create a selector with its own round-robin state and an entropy-seeded RNG.
    pub fn new(registry: R) -> Self {
        Self::with_state(registry, Arc::new(SelectorState::new()))
    }

    /// Create a selector over existing round-robin state.
    pub fn with_state(registry: R, state: Arc<SelectorState>) -> Self {
        Self {
            registry,
            state,
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
        }
    }

    /// Seed the random strategy, for reproducible picks.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        self.reseed(seed);
        self
    }

    /// Reseed the random strategy.
    pub fn reseed(&self, seed: u64) {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
    }

    /// The registry lookups go through.
    pub const fn registry(&self) -> &R {
        &self.registry
    }

    /// Round-robin state.
    pub const fn state(&self) -> &Arc<SelectorState> {
        &self.state
    }

    /// Pick one node of `service`.
    ///
    /// # Errors
    ///
    /// - [`SelectError::NotFound`] if the service is not registered or has no nodes
    ///   in the allowed versions
    /// - [`SelectError::NoAvailableNodes`] if the filters removed every node
    /// - [`SelectError::Registry`] if the lookup failed for another reason
    pub async fn select(
        &self,
        service: &str,
        options: &SelectOptions,
    ) -> Result<Node, SelectError> {
        let versions = self.registry.lookup(service).await.map_err(|e| match e.kind() {
            RegistryErrorKind::NotFound => SelectError::NotFound(service.to_string()),
            kind => SelectError::Registry {
                service: service.to_string(),
                kind,
                message: e.to_string(),
            },
        })?;

        let nodes: Vec<Node> = versions
            .into_iter()
            .filter(|version| options.allows_version(&version.version))
            .flat_map(|version| version.nodes)
            .collect();

        if nodes.is_empty() {
            return Err(SelectError::NotFound(service.to_string()));
        }

        let total = nodes.len();
        let candidates: Vec<Node> = nodes
            .into_iter()
            .filter(|node| options.filters.iter().all(|filter| filter.allows(node)))
            .collect();

        if candidates.is_empty() {
            debug!("Filters excluded all {} nodes of {}", total, service);
            return Err(SelectError::NoAvailableNodes(service.to_string()));
        }

        let node = self.pick(service, &options.strategy, candidates)?;
        debug!("Selected {} for {}", node, service);
        Ok(node)
    }

    fn pick(
        &self,
        service: &str,
        strategy: &Strategy,
        mut candidates: Vec<Node>,
    ) -> Result<Node, SelectError> {
        let index = match strategy {
            Strategy::Random => self.rng.lock().gen_range(0..candidates.len()),
            Strategy::RoundRobin => self
                .state
                .next_index(service, candidates.len())
                .ok_or_else(|| SelectError::NoAvailableNodes(service.to_string()))?,
            Strategy::Custom(pick) => {
                return pick(candidates.as_slice())
                    .cloned()
                    .ok_or_else(|| SelectError::NoAvailableNodes(service.to_string()));
            }
        };

        Ok(candidates.swap_remove(index))
    }
}
