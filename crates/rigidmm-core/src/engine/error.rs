use thiserror::Error;

use crate::core::forcefield::catalog::CatalogError;
use crate::core::models::system::TopologyError;

/// Errors surfaced by the subsystem's definition and realization surface.
///
/// Definition-phase errors carry enough context to identify the offending
/// ids; the evaluator itself never fails.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("force field definition failed: {source}")]
    Catalog {
        #[from]
        source: CatalogError,
    },

    #[error("molecular topology is invalid: {source}")]
    Topology {
        #[from]
        source: TopologyError,
    },

    #[error("internal logic error: {0}")]
    Internal(String),
}
