//! CouplingError: Unified error type for nek-coupler public APIs
//!
//! Every fallible operation returns `Result<_, CouplingError>`. Nothing is
//! retried or recovered internally; errors surface to the immediate caller.

use crate::locality::ElemRef;
use crate::solver::SolverStatus;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Per-element quantity requested from the external solver.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ElementQuery {
    Centroid,
    Volume,
    Temperature,
    FluidMembership,
    GlobalIndex,
}

impl fmt::Display for ElementQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElementQuery::Centroid => "centroid",
            ElementQuery::Volume => "volume",
            ElementQuery::Temperature => "temperature",
            ElementQuery::FluidMembership => "fluid membership",
            ElementQuery::GlobalIndex => "global index",
        })
    }
}

/// Unified error type for coupling operations.
#[derive(Debug, Error)]
pub enum CouplingError {
    /// The configured pressure must be strictly positive.
    #[error("pressure must be strictly positive, got {0}")]
    InvalidPressure(f64),
    /// Active ranks need a case name for the session marker.
    #[error("configuration is missing a case name")]
    MissingCaseName,
    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// The configuration file could not be read.
    #[error("could not read configuration `{path}`: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Writing or reading `SESSION.NAME` failed.
    #[error("error writing session marker `{path}`: {source}")]
    SessionMarker {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The session marker did not have the two expected lines.
    #[error("malformed session marker `{0}`")]
    MalformedSessionMarker(PathBuf),
    /// The external solver failed to answer a per-element query.
    #[error("could not find {query} of {elem}")]
    ElementQuery {
        query: ElementQuery,
        elem: ElemRef,
        #[source]
        source: SolverStatus,
    },
    /// The external solver rejected a heat source.
    #[error("could not set heat source of local element {local}")]
    HeatSource {
        local: usize,
        #[source]
        source: SolverStatus,
    },
    /// Gathered per-rank counts disagree with the solver's global count.
    #[error("per-rank element counts sum to {sum}, solver reports {nelgt} global elements")]
    GlobalCountMismatch { sum: usize, nelgt: usize },
    /// This rank was fine but another rank of the group failed to start.
    #[error("session construction failed on another rank")]
    PeerFailed,
    /// A local-to-global mapping pointed outside `[1, nelgt]`.
    #[error("global element index {index} outside [1, {nelgt}]")]
    InvalidGlobalIndex { index: usize, nelgt: usize },
    /// Two local elements claimed the same global index.
    #[error("global element index {0} claimed more than once")]
    DuplicateGlobalIndex(usize),
}
