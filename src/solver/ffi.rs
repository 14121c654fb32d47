//! Binding to the Nek5000 C interface (`nek_interface.h`).
//!
//! Nek5000 keeps its state in Fortran common blocks, so there is exactly one
//! solver per process. [`Nek5000::acquire`] hands out that single handle.

use super::{NekSolver, SizeLimits, SolverStatus};
use crate::algs::communicator::NativeComm;
use crate::geometry::Position;
use std::ffi::c_int;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

unsafe extern "C" {
    fn nek_get_lelg() -> c_int;
    fn nek_get_lelt() -> c_int;
    fn nek_get_lx1() -> c_int;
    fn nek_get_nelgt() -> c_int;
    fn nek_get_nelt() -> c_int;

    fn C2F_nek_init(comm: *const c_int);
    fn C2F_nek_solve();
    fn C2F_nek_end();
    fn nek_reset_counters();

    fn nek_get_global_elem_centroid(
        global_elem: c_int,
        x: *mut f64,
        y: *mut f64,
        z: *mut f64,
    ) -> c_int;
    fn nek_get_local_elem_centroid(
        local_elem: c_int,
        x: *mut f64,
        y: *mut f64,
        z: *mut f64,
    ) -> c_int;
    fn nek_get_local_elem_volume(local_elem: c_int, volume: *mut f64) -> c_int;
    fn nek_get_local_elem_temperature(local_elem: c_int, temperature: *mut f64) -> c_int;
    fn nek_get_global_elem(local_elem: c_int) -> c_int;

    fn nek_global_elem_is_in_rank(global_elem: c_int, rank: c_int) -> c_int;
    fn nek_global_elem_is_in_fluid(global_elem: c_int) -> c_int;
    fn nek_local_elem_is_in_fluid(local_elem: c_int) -> c_int;
    fn nek_set_heat_source(local_elem: c_int, heat: f64) -> c_int;
}

static ACQUIRED: AtomicBool = AtomicBool::new(false);

/// The process-wide Nek5000 instance.
pub struct Nek5000 {
    // Fortran state is not thread safe.
    _not_send: PhantomData<*const ()>,
}

impl Nek5000 {
    /// Returns `None` if the handle was already taken in this process.
    pub fn acquire() -> Option<Self> {
        if ACQUIRED.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self {
                _not_send: PhantomData,
            })
        }
    }
}

fn count(n: c_int) -> usize {
    usize::try_from(n).unwrap_or(0)
}

impl NekSolver for Nek5000 {
    fn size_limits(&self) -> SizeLimits {
        // SAFETY: plain getters of compile-time parameters.
        unsafe {
            SizeLimits {
                lelg: count(nek_get_lelg()),
                lelt: count(nek_get_lelt()),
                lx1: count(nek_get_lx1()),
            }
        }
    }

    fn init(&mut self, comm: NativeComm) {
        let comm: c_int = comm;
        // SAFETY: the pointer is valid for the duration of the call.
        unsafe { C2F_nek_init(&comm) }
    }

    fn nelgt(&self) -> usize {
        count(unsafe { nek_get_nelgt() })
    }

    fn nelt(&self) -> usize {
        count(unsafe { nek_get_nelt() })
    }

    fn reset_counters(&mut self) {
        unsafe { nek_reset_counters() }
    }

    fn solve(&mut self) {
        unsafe { C2F_nek_solve() }
    }

    fn end(&mut self) {
        unsafe { C2F_nek_end() }
    }

    fn global_elem_centroid(&self, global_elem: usize) -> Result<Position, SolverStatus> {
        let mut p = Position::default();
        SolverStatus::check(unsafe {
            nek_get_global_elem_centroid(global_elem as c_int, &mut p.x, &mut p.y, &mut p.z)
        })?;
        Ok(p)
    }

    fn local_elem_centroid(&self, local_elem: usize) -> Result<Position, SolverStatus> {
        let mut p = Position::default();
        SolverStatus::check(unsafe {
            nek_get_local_elem_centroid(local_elem as c_int, &mut p.x, &mut p.y, &mut p.z)
        })?;
        Ok(p)
    }

    fn local_elem_volume(&self, local_elem: usize) -> Result<f64, SolverStatus> {
        let mut volume = 0.0;
        SolverStatus::check(unsafe { nek_get_local_elem_volume(local_elem as c_int, &mut volume) })?;
        Ok(volume)
    }

    fn local_elem_temperature(&self, local_elem: usize) -> Result<f64, SolverStatus> {
        let mut temperature = 0.0;
        SolverStatus::check(unsafe {
            nek_get_local_elem_temperature(local_elem as c_int, &mut temperature)
        })?;
        Ok(temperature)
    }

    fn global_elem_is_in_rank(&self, global_elem: usize, rank: usize) -> bool {
        unsafe { nek_global_elem_is_in_rank(global_elem as c_int, rank as c_int) == 1 }
    }

    fn global_elem_is_in_fluid(&self, global_elem: usize) -> Result<bool, SolverStatus> {
        Ok(unsafe { nek_global_elem_is_in_fluid(global_elem as c_int) } == 1)
    }

    fn local_elem_is_in_fluid(&self, local_elem: usize) -> Result<bool, SolverStatus> {
        Ok(unsafe { nek_local_elem_is_in_fluid(local_elem as c_int) } == 1)
    }

    fn global_elem(&self, local_elem: usize) -> Result<usize, SolverStatus> {
        let g = unsafe { nek_get_global_elem(local_elem as c_int) };
        usize::try_from(g)
            .ok()
            .filter(|&g| g > 0)
            .ok_or(SolverStatus(g))
    }

    fn set_heat_source(&mut self, local_elem: usize, heat: f64) -> Result<(), SolverStatus> {
        SolverStatus::check(unsafe { nek_set_heat_source(local_elem as c_int, heat) })
    }
}
