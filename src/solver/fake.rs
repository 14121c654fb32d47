//! In-memory solver double for serial and threaded tests.

use super::{NekSolver, SizeLimits, SolverStatus};
use crate::algs::communicator::NativeComm;
use crate::geometry::Position;

/// Status returned for an index this rank does not hold.
const NOT_FOUND: SolverStatus = SolverStatus(-1);

/// Lifecycle calls recorded by [`FakeNek`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SolverCall {
    Init(NativeComm),
    ResetCounters,
    Solve,
    End,
}

/// One element held by a [`FakeNek`] rank.
#[derive(Clone, Debug, PartialEq)]
pub struct FakeElement {
    /// 1-based global index.
    pub global: usize,
    pub centroid: Position,
    pub volume: f64,
    pub temperature: f64,
    pub fluid: bool,
}

/// Fake solver holding one rank's partition.
///
/// Counts read as zero until `init` has been called. Each `solve` adds the
/// element's heat source to its temperature.
#[derive(Clone, Debug)]
pub struct FakeNek {
    limits: SizeLimits,
    rank: usize,
    nelgt: usize,
    elements: Vec<FakeElement>,
    heat_sources: Vec<f64>,
    calls: Vec<SolverCall>,
    initialized: bool,
}

impl FakeNek {
    /// `elements[i]` becomes local element `i + 1`.
    pub fn new(rank: usize, nelgt: usize, elements: Vec<FakeElement>) -> Self {
        let heat_sources = vec![0.0; elements.len()];
        Self {
            limits: SizeLimits {
                lelg: nelgt.max(1),
                lelt: elements.len().max(1),
                lx1: 2,
            },
            rank,
            nelgt,
            elements,
            heat_sources,
            calls: Vec::new(),
            initialized: false,
        }
    }

    /// Rank `rank` of a contiguously numbered partition with per-rank
    /// `counts`. Element `g` sits at `(g, 0, 0)`, has unit volume,
    /// temperature `g - 1` and is fluid when `g` is odd.
    pub fn rank_major(rank: usize, counts: &[usize]) -> Self {
        let first: usize = counts[..rank].iter().sum();
        let elements = (first + 1..=first + counts[rank])
            .map(|g| FakeElement {
                global: g,
                centroid: Position::new(g as f64, 0.0, 0.0),
                volume: 1.0,
                temperature: (g - 1) as f64,
                fluid: g % 2 == 1,
            })
            .collect();
        Self::new(rank, counts.iter().sum(), elements)
    }

    pub fn with_limits(mut self, limits: SizeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Renumber local elements with the given 1-based global indices.
    pub fn with_global_indices(mut self, globals: &[usize]) -> Self {
        for (e, &g) in self.elements.iter_mut().zip(globals) {
            e.global = g;
        }
        self
    }

    pub fn calls(&self) -> &[SolverCall] {
        &self.calls
    }

    pub fn heat_sources(&self) -> &[f64] {
        &self.heat_sources
    }

    pub fn elements(&self) -> &[FakeElement] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut [FakeElement] {
        &mut self.elements
    }

    fn local(&self, local_elem: usize) -> Result<&FakeElement, SolverStatus> {
        local_elem
            .checked_sub(1)
            .and_then(|i| self.elements.get(i))
            .ok_or(NOT_FOUND)
    }

    fn by_global(&self, global_elem: usize) -> Result<&FakeElement, SolverStatus> {
        self.elements
            .iter()
            .find(|e| e.global == global_elem)
            .ok_or(NOT_FOUND)
    }
}

impl NekSolver for FakeNek {
    fn size_limits(&self) -> SizeLimits {
        self.limits
    }

    fn init(&mut self, comm: NativeComm) {
        self.calls.push(SolverCall::Init(comm));
        self.initialized = true;
    }

    fn nelgt(&self) -> usize {
        if self.initialized { self.nelgt } else { 0 }
    }

    fn nelt(&self) -> usize {
        if self.initialized { self.elements.len() } else { 0 }
    }

    fn reset_counters(&mut self) {
        self.calls.push(SolverCall::ResetCounters);
    }

    fn solve(&mut self) {
        self.calls.push(SolverCall::Solve);
        for (e, q) in self.elements.iter_mut().zip(&self.heat_sources) {
            e.temperature += q;
        }
    }

    fn end(&mut self) {
        self.calls.push(SolverCall::End);
    }

    fn global_elem_centroid(&self, global_elem: usize) -> Result<Position, SolverStatus> {
        self.by_global(global_elem).map(|e| e.centroid)
    }

    fn local_elem_centroid(&self, local_elem: usize) -> Result<Position, SolverStatus> {
        self.local(local_elem).map(|e| e.centroid)
    }

    fn local_elem_volume(&self, local_elem: usize) -> Result<f64, SolverStatus> {
        self.local(local_elem).map(|e| e.volume)
    }

    fn local_elem_temperature(&self, local_elem: usize) -> Result<f64, SolverStatus> {
        self.local(local_elem).map(|e| e.temperature)
    }

    fn global_elem_is_in_rank(&self, global_elem: usize, rank: usize) -> bool {
        rank == self.rank && self.by_global(global_elem).is_ok()
    }

    fn global_elem_is_in_fluid(&self, global_elem: usize) -> Result<bool, SolverStatus> {
        self.by_global(global_elem).map(|e| e.fluid)
    }

    fn local_elem_is_in_fluid(&self, local_elem: usize) -> Result<bool, SolverStatus> {
        self.local(local_elem).map(|e| e.fluid)
    }

    fn global_elem(&self, local_elem: usize) -> Result<usize, SolverStatus> {
        self.local(local_elem).map(|e| e.global)
    }

    fn set_heat_source(&mut self, local_elem: usize, heat: f64) -> Result<(), SolverStatus> {
        let slot = local_elem
            .checked_sub(1)
            .and_then(|i| self.heat_sources.get_mut(i))
            .ok_or(NOT_FOUND)?;
        *slot = heat;
        Ok(())
    }
}
