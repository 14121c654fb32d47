//! Element-level operations, available only on active ranks.

use crate::algs::communicator::{Communicator, all_ok};
use crate::algs::field_gather::{FieldOrdering, gather_field, scatter_rank_major};
use crate::algs::layout::PartitionLayout;
use crate::coupling_error::{CouplingError, ElementQuery};
use crate::driver::config::NekConfig;
use crate::driver::session::write_session_marker;
use crate::geometry::Position;
use crate::locality::{ElemRef, ElementLocality};
use crate::solver::{NekSolver, SolverStatus};
use bytemuck::Pod;

fn query<T>(query: ElementQuery, elem: ElemRef, r: Result<T, SolverStatus>) -> Result<T, CouplingError> {
    r.map_err(|source| CouplingError::ElementQuery { query, elem, source })
}

/// Casename check, plus the session marker on the root.
fn prepare_session<'c, C: Communicator>(comm: &C, config: &'c NekConfig) -> Result<&'c str, CouplingError> {
    let casename = config.casename()?;
    if comm.is_root() {
        write_session_marker(&config.session_dir()?, casename)?;
    }
    Ok(casename)
}

/// An initialized solver on a rank that holds mesh elements.
pub struct ActiveNek<C, S> {
    comm: C,
    pub(crate) solver: S,
    nelgt: usize,
    nelt: usize,
    layout: PartitionLayout,
    steps: u64,
}

impl<C: Communicator, S: NekSolver> ActiveNek<C, S> {
    /// Session marker (root only), solver init, counts, layout.
    ///
    /// Collective over `comm`. A failure on any rank fails every rank, and
    /// a solver that was already initialized is ended before returning.
    pub(crate) fn initialize(comm: C, mut solver: S, config: &NekConfig) -> Result<Self, CouplingError> {
        let prepared = prepare_session(&comm, config);
        let peers_ok = all_ok(&comm, prepared.is_ok());
        let casename = prepared?;
        if !peers_ok {
            return Err(CouplingError::PeerFailed);
        }

        solver.init(comm.native_handle());
        let nelgt = solver.nelgt();
        let nelt = solver.nelt();
        log::info!(
            "rank {}/{}: solver initialized for `{casename}` with {nelt} of {nelgt} elements",
            comm.rank(),
            comm.size()
        );

        let layout = PartitionLayout::all_gather(&comm, nelt);
        if let Err(e) = layout.check_total(nelgt) {
            log::warn!("rank {}: {e}; ending solver", comm.rank());
            solver.end();
            return Err(e);
        }

        Ok(Self {
            comm,
            solver,
            nelgt,
            nelt,
            layout,
            steps: 0,
        })
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }

    pub fn nelgt(&self) -> usize {
        self.nelgt
    }

    pub fn nelt(&self) -> usize {
        self.nelt
    }

    pub fn layout(&self) -> &PartitionLayout {
        &self.layout
    }

    /// Number of completed solve steps.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn locality(&self) -> ElementLocality<'_, S> {
        ElementLocality::new(&self.solver, self.comm.rank())
    }

    /// Reset the per-step counters and advance the solver one step.
    ///
    /// Convergence is not checked here; a failed step shows up in later
    /// field queries.
    pub fn solve_step(&mut self) {
        self.solver.reset_counters();
        self.solver.solve();
        self.steps += 1;
        log::debug!("rank {}: solve step {} done", self.comm.rank(), self.steps);
    }

    pub fn global_elem_centroid(&self, global_elem: usize) -> Result<Position, CouplingError> {
        query(
            ElementQuery::Centroid,
            ElemRef::Global(global_elem),
            self.solver.global_elem_centroid(global_elem),
        )
    }

    pub fn local_elem_centroid(&self, local_elem: usize) -> Result<Position, CouplingError> {
        query(
            ElementQuery::Centroid,
            ElemRef::Local(local_elem),
            self.solver.local_elem_centroid(local_elem),
        )
    }

    pub fn local_elem_volume(&self, local_elem: usize) -> Result<f64, CouplingError> {
        query(
            ElementQuery::Volume,
            ElemRef::Local(local_elem),
            self.solver.local_elem_volume(local_elem),
        )
    }

    pub fn local_elem_temperature(&self, local_elem: usize) -> Result<f64, CouplingError> {
        query(
            ElementQuery::Temperature,
            ElemRef::Local(local_elem),
            self.solver.local_elem_temperature(local_elem),
        )
    }

    pub fn global_elem_is_in_rank(&self, global_elem: usize) -> bool {
        self.locality().owns_global(global_elem)
    }

    pub fn global_elem_is_in_fluid(&self, global_elem: usize) -> Result<bool, CouplingError> {
        self.locality().in_fluid(ElemRef::Global(global_elem))
    }

    pub fn local_elem_is_in_fluid(&self, local_elem: usize) -> Result<bool, CouplingError> {
        self.locality().in_fluid(ElemRef::Local(local_elem))
    }

    pub fn set_heat_source(&mut self, local_elem: usize, heat: f64) -> Result<(), CouplingError> {
        self.solver
            .set_heat_source(local_elem, heat)
            .map_err(|source| CouplingError::HeatSource {
                local: local_elem,
                source,
            })
    }

    /// Collective: evaluate `value` for local elements `1..=nelt` and gather
    /// the results on rank 0 (`None` elsewhere).
    pub fn gather_local<T, F>(&self, ordering: FieldOrdering, value: F) -> Result<Option<Vec<T>>, CouplingError>
    where
        T: Pod,
        F: FnMut(usize) -> Result<T, CouplingError>,
    {
        let local = (1..=self.nelt).map(value).collect::<Result<Vec<T>, _>>()?;
        gather_field(
            &self.comm,
            &self.layout,
            &local,
            || self.locality().local_to_global_map(self.nelt),
            ordering,
        )
    }

    /// Collective: element temperatures on rank 0.
    pub fn temperature(&self, ordering: FieldOrdering) -> Result<Option<Vec<f64>>, CouplingError> {
        self.gather_local(ordering, |l| self.local_elem_temperature(l))
    }

    /// Collective: element volumes on rank 0.
    pub fn volume(&self, ordering: FieldOrdering) -> Result<Option<Vec<f64>>, CouplingError> {
        self.gather_local(ordering, |l| self.local_elem_volume(l))
    }

    /// Collective: 1 for fluid elements, 0 otherwise, on rank 0.
    pub fn fluid_mask(&self, ordering: FieldOrdering) -> Result<Option<Vec<i32>>, CouplingError> {
        self.gather_local(ordering, |l| self.local_elem_is_in_fluid(l).map(i32::from))
    }

    /// Collective: rank 0 supplies one heat source per element in rank-major
    /// order; every rank stores its share into the solver. Other ranks may
    /// pass an empty slice.
    pub fn set_heat_sources(&mut self, global: &[f64]) -> Result<(), CouplingError> {
        let local = scatter_rank_major(&self.comm, &self.layout, global);
        for (i, &q) in local.iter().enumerate() {
            self.set_heat_source(i + 1, q)?;
        }
        Ok(())
    }
}
