//! Gather per-element fields onto the coordinating rank, and scatter them back.
//!
//! The base gather is **rank-major**: rank 0's elements first, in local index
//! order, then rank 1's, and so on. That is the solver's global numbering
//! only when the solver numbers elements contiguously by rank. Callers that
//! need true global order use [`gather_global_order`], which ships the
//! local-to-global map alongside the values and permutes on the root.
//!
//! Every function here is collective over the active group: all ranks must
//! call it, the same number of times, in the same order.

use crate::algs::communicator::{Communicator, ROOT, VarBuf, VarBufMut};
use crate::algs::layout::PartitionLayout;
use crate::algs::wire::{WireIndex, cast_slice, cast_slice_mut};
use crate::coupling_error::CouplingError;
use bytemuck::Pod;
use serde::{Deserialize, Serialize};

/// Ordering of a gathered field on the coordinating rank.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldOrdering {
    /// Concatenation of each rank's local elements, by rank.
    #[default]
    RankMajor,
    /// Position `k` holds global element `k + 1`.
    Global,
}

/// Gather `local` from every rank into one array of `layout.total()` values.
///
/// Returns `Some` on [`ROOT`] and `None` everywhere else.
///
/// # Panics
/// If `local.len() != layout.count(comm.rank())`.
pub fn gather_rank_major<C, T>(comm: &C, layout: &PartitionLayout, local: &[T]) -> Option<Vec<T>>
where
    C: Communicator + ?Sized,
    T: Pod,
{
    assert_eq!(
        local.len(),
        layout.count(comm.rank()),
        "rank {}: local field length does not match the layout",
        comm.rank()
    );
    log::trace!("rank {}: gathering {} values", comm.rank(), local.len());

    if comm.rank() == ROOT {
        let mut global = vec![T::zeroed(); layout.total()];
        let (counts, displs) = layout.byte_layout::<T>();
        comm.gather_varcount_bytes(
            ROOT,
            cast_slice(local),
            Some(VarBufMut {
                buf: cast_slice_mut(&mut global),
                counts: &counts,
                displs: &displs,
            }),
        );
        Some(global)
    } else {
        comm.gather_varcount_bytes(ROOT, cast_slice(local), None);
        None
    }
}

/// Gather `local` and reorder it on the root by the 1-based global index
/// each rank reports for its local elements.
///
/// Two collectives are issued (indices, then values). The permutation is
/// validated on the root only, after both collectives have completed.
pub fn gather_global_order<C, T>(
    comm: &C,
    layout: &PartitionLayout,
    local: &[T],
    local_to_global: &[usize],
) -> Result<Option<Vec<T>>, CouplingError>
where
    C: Communicator + ?Sized,
    T: Pod,
{
    let ids: Vec<WireIndex> = local_to_global.iter().copied().map(WireIndex::new).collect();
    let ids = gather_rank_major(comm, layout, &ids);
    let values = gather_rank_major(comm, layout, local);
    match (ids, values) {
        (Some(ids), Some(values)) => permute_to_global(&ids, values).map(Some),
        _ => Ok(None),
    }
}

/// Gather with an explicit ordering choice.
pub fn gather_field<C, T>(
    comm: &C,
    layout: &PartitionLayout,
    local: &[T],
    local_to_global: impl FnOnce() -> Result<Vec<usize>, CouplingError>,
    ordering: FieldOrdering,
) -> Result<Option<Vec<T>>, CouplingError>
where
    C: Communicator + ?Sized,
    T: Pod,
{
    match ordering {
        FieldOrdering::RankMajor => Ok(gather_rank_major(comm, layout, local)),
        FieldOrdering::Global => gather_global_order(comm, layout, local, &local_to_global()?),
    }
}

fn permute_to_global<T: Pod>(ids: &[WireIndex], values: Vec<T>) -> Result<Vec<T>, CouplingError> {
    let nelgt = values.len();
    let mut slots: Vec<Option<T>> = vec![None; nelgt];
    for (id, value) in ids.iter().zip(values) {
        let index = id.get();
        let slot = index
            .checked_sub(1)
            .filter(|&i| i < nelgt)
            .ok_or(CouplingError::InvalidGlobalIndex { index, nelgt })?;
        if slots[slot].replace(value).is_some() {
            return Err(CouplingError::DuplicateGlobalIndex(index));
        }
    }
    // nelgt distinct in-range indices fill every slot
    Ok(slots.into_iter().flatten().collect())
}

/// Inverse of [`gather_rank_major`]: the root splits a rank-major array and
/// every rank receives its own `layout.count(rank)` values.
///
/// Only the root's `global` is read; other ranks may pass an empty slice.
///
/// # Panics
/// On the root, if `global.len() != layout.total()`.
pub fn scatter_rank_major<C, T>(comm: &C, layout: &PartitionLayout, global: &[T]) -> Vec<T>
where
    C: Communicator + ?Sized,
    T: Pod,
{
    let mut local = vec![T::zeroed(); layout.count(comm.rank())];
    log::trace!("rank {}: scattering into {} values", comm.rank(), local.len());

    if comm.rank() == ROOT {
        assert_eq!(
            global.len(),
            layout.total(),
            "scatter source must cover every global element"
        );
        let (counts, displs) = layout.byte_layout::<T>();
        comm.scatter_varcount_bytes(
            ROOT,
            Some(VarBuf {
                buf: cast_slice(global),
                counts: &counts,
                displs: &displs,
            }),
            cast_slice_mut(&mut local),
        );
    } else {
        comm.scatter_varcount_bytes(ROOT, None, cast_slice_mut(&mut local));
    }
    local
}
