//! Element locality queries answered by the solver.
//!
//! The solver owns the authoritative partition and sub-domain
//! classification; [`ElementLocality`] keeps no copy of either and asks the
//! solver on every call.

use crate::coupling_error::{CouplingError, ElementQuery};
use crate::solver::NekSolver;
use std::fmt;

/// A 1-based element index and the numbering it belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElemRef {
    Global(usize),
    Local(usize),
}

impl fmt::Display for ElemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElemRef::Global(i) => write!(f, "global element {i}"),
            ElemRef::Local(i) => write!(f, "local element {i}"),
        }
    }
}

/// Locality oracle for one rank.
pub struct ElementLocality<'a, S> {
    solver: &'a S,
    rank: usize,
}

impl<'a, S: NekSolver> ElementLocality<'a, S> {
    pub fn new(solver: &'a S, rank: usize) -> Self {
        Self { solver, rank }
    }

    /// True iff `global_elem` belongs to this rank's partition.
    pub fn owns_global(&self, global_elem: usize) -> bool {
        self.solver.global_elem_is_in_rank(global_elem, self.rank)
    }

    /// Whether the element is part of the fluid sub-domain.
    pub fn in_fluid(&self, elem: ElemRef) -> Result<bool, CouplingError> {
        let answer = match elem {
            ElemRef::Global(g) => self.solver.global_elem_is_in_fluid(g),
            ElemRef::Local(l) => self.solver.local_elem_is_in_fluid(l),
        };
        answer.map_err(|source| CouplingError::ElementQuery {
            query: ElementQuery::FluidMembership,
            elem,
            source,
        })
    }

    /// Global index of a local element.
    pub fn local_to_global(&self, local_elem: usize) -> Result<usize, CouplingError> {
        self.solver
            .global_elem(local_elem)
            .map_err(|source| CouplingError::ElementQuery {
                query: ElementQuery::GlobalIndex,
                elem: ElemRef::Local(local_elem),
                source,
            })
    }

    /// Global indices of local elements `1..=nelt`, in local order.
    pub fn local_to_global_map(&self, nelt: usize) -> Result<Vec<usize>, CouplingError> {
        (1..=nelt).map(|l| self.local_to_global(l)).collect()
    }
}
