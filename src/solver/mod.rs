//! The external solver as seen by the coupling layer.
//!
//! [`NekSolver`] mirrors the solver's C entry points: a one-time `init`, a
//! per-step `reset_counters` + `solve`, a final `end`, and stateless
//! per-element queries. Element indices are **1-based**, as the solver
//! numbers them. Out-of-range indices are the solver's business; the
//! coupling layer does not re-check them.
//!
//! Implementations:
//! - [`FakeNek`]: in-memory stand-in that records every lifecycle call.
//! - `Nek5000` (feature `nek5000`): FFI binding to the real library.

pub mod fake;
#[cfg(feature = "nek5000")]
pub mod ffi;

pub use fake::{FakeElement, FakeNek, SolverCall};
#[cfg(feature = "nek5000")]
pub use ffi::Nek5000;

use crate::algs::communicator::NativeComm;
use crate::geometry::Position;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Non-zero return code from a solver entry point.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("solver returned status {0}")]
pub struct SolverStatus(pub i32);

impl SolverStatus {
    /// Map a C-style return code (0 = success) to a `Result`.
    pub fn check(code: i32) -> Result<(), SolverStatus> {
        if code == 0 { Ok(()) } else { Err(SolverStatus(code)) }
    }
}

/// Sizes compiled into the solver.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeLimits {
    /// Maximum number of global elements.
    pub lelg: usize,
    /// Maximum number of elements per rank.
    pub lelt: usize,
    /// Polynomial points per direction on the velocity mesh.
    pub lx1: usize,
}

/// Query/command interface of the external solver.
pub trait NekSolver {
    fn size_limits(&self) -> SizeLimits;

    /// One-time initialization on the active communicator.
    fn init(&mut self, comm: NativeComm);
    /// Global element count; meaningful after `init`.
    fn nelgt(&self) -> usize;
    /// Local element count; meaningful after `init`.
    fn nelt(&self) -> usize;

    fn reset_counters(&mut self);
    /// Advance one step.
    fn solve(&mut self);
    fn end(&mut self);

    fn global_elem_centroid(&self, global_elem: usize) -> Result<Position, SolverStatus>;
    fn local_elem_centroid(&self, local_elem: usize) -> Result<Position, SolverStatus>;
    fn local_elem_volume(&self, local_elem: usize) -> Result<f64, SolverStatus>;
    fn local_elem_temperature(&self, local_elem: usize) -> Result<f64, SolverStatus>;

    /// Whether `global_elem` lives on `rank`.
    fn global_elem_is_in_rank(&self, global_elem: usize, rank: usize) -> bool;
    fn global_elem_is_in_fluid(&self, global_elem: usize) -> Result<bool, SolverStatus>;
    fn local_elem_is_in_fluid(&self, local_elem: usize) -> Result<bool, SolverStatus>;
    /// Solver's 1-based global index of a local element.
    fn global_elem(&self, local_elem: usize) -> Result<usize, SolverStatus>;

    fn set_heat_source(&mut self, local_elem: usize, heat: f64) -> Result<(), SolverStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_zero_is_success() {
        assert_eq!(SolverStatus::check(0), Ok(()));
        assert_eq!(SolverStatus::check(-3), Err(SolverStatus(-3)));
        assert_eq!(SolverStatus(7).to_string(), "solver returned status 7");
    }
}
