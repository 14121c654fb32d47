#![cfg_attr(docsrs, feature(doc_cfg))]
//! # nek-coupler
//!
//! Distributed bookkeeping and collective field exchange for coupling a
//! partitioned spectral-element solver (Nek5000) to another code.
//!
//! ## Features
//! - Partition layout: per-rank element counts and displacements from one all-gather
//! - Field gather onto rank 0, rank-major or in true global element order
//! - Scatter of per-element heat sources back into the solver
//! - Element locality queries (owning rank, fluid sub-domain)
//! - A driver with an explicit construct → step → finalize lifecycle
//! - Pluggable communication backends (serial, threads, MPI)
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! nek-coupler = "0.3"
//! # features = ["mpi-support", "nek5000"]
//! ```
//!
//! Single-rank run against the in-memory solver:
//! ```
//! use nek_coupler::prelude::*;
//!
//! let world = NoComm;
//! let solver = FakeNek::rank_major(0, &[4]);
//! let config = NekConfig::new(1.0e5, "demo").with_workdir(std::env::temp_dir());
//! let mut driver = NekDriver::new(&world, Some(NoComm), solver, config)?;
//!
//! let nek = driver.active_mut().unwrap();
//! nek.solve_step();
//! let t = nek.temperature(FieldOrdering::RankMajor)?.unwrap();
//! assert_eq!(t, vec![0.0, 1.0, 2.0, 3.0]);
//! driver.finalize();
//! # Ok::<(), CouplingError>(())
//! ```
//!
//! ## Collective discipline
//! Layout construction, gathers, scatters and the driver's barriers are
//! collective. Every participating rank must make the same collective calls
//! in the same order; there is no timeout or recovery if one does not.

pub mod algs;
pub mod coupling_error;
pub mod driver;
pub mod geometry;
pub mod locality;
pub mod solver;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{Communicator, NoComm, ROOT, ThreadComm};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::field_gather::{
        FieldOrdering, gather_field, gather_rank_major, scatter_rank_major,
    };
    pub use crate::algs::layout::PartitionLayout;
    pub use crate::coupling_error::{CouplingError, ElementQuery};
    pub use crate::driver::{ActiveNek, NekConfig, NekDriver, Role};
    pub use crate::geometry::Position;
    pub use crate::locality::{ElemRef, ElementLocality};
    pub use crate::solver::{FakeNek, NekSolver, SizeLimits, SolverStatus};
    #[cfg(feature = "nek5000")]
    pub use crate::solver::Nek5000;
}
