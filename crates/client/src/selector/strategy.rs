use std::fmt;
use std::sync::Arc;

use courier_registry::Node;
use serde::{Deserialize, Serialize};

/// How a node is picked from the filtered candidates.
#[derive(Clone, Default)]
pub enum Strategy {
    /// Uniform pick from a seedable source.
    #[default]
    Random,

    /// Rotate through candidates with a per-service counter.
    RoundRobin,

    /// Caller-supplied pick; `None` means no candidate is acceptable.
    Custom(Arc<dyn Fn(&[Node]) -> Option<&Node> + Send + Sync>),
}

impl Strategy {
    /// Wrap a custom pick.
    pub fn custom(pick: impl Fn(&[Node]) -> Option<&Node> + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(pick))
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => f.write_str("Random"),
            Self::RoundRobin => f.write_str("RoundRobin"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Strategies that can be named in configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// [`Strategy::Random`]
    #[default]
    Random,
    /// [`Strategy::RoundRobin`]
    RoundRobin,
}

impl From<StrategyKind> for Strategy {
    fn from(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Random => Self::Random,
            StrategyKind::RoundRobin => Self::RoundRobin,
        }
    }
}
