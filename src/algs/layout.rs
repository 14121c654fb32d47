//! Per-rank element counts and displacements for variable-length collectives.
//!
//! A [`PartitionLayout`] is built once per session by an all-gather of every
//! active rank's local element count. Every rank ends up holding an identical
//! copy, so checks against it fail (or pass) identically everywhere and never
//! leave one rank waiting in a collective the others skipped.

use crate::algs::communicator::Communicator;
use crate::algs::wire::{WireCount, byte_extents, cast_slice, cast_slice_mut};
use crate::coupling_error::CouplingError;
use bytemuck::Pod;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Ordered per-rank counts and their prefix-sum displacements.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionLayout {
    counts: Vec<usize>,
    displs: Vec<usize>,
}

impl PartitionLayout {
    /// Derive displacements from a count table.
    pub fn from_counts(counts: Vec<usize>) -> Self {
        let displs = counts
            .iter()
            .scan(0usize, |acc, &n| {
                let d = *acc;
                *acc += n;
                Some(d)
            })
            .collect_vec();
        Self { counts, displs }
    }

    /// Collective: every rank contributes `nelt` and receives the full table.
    pub fn all_gather<C: Communicator + ?Sized>(comm: &C, nelt: usize) -> Self {
        let send = WireCount::new(nelt);
        let mut recv = vec![WireCount::default(); comm.size()];
        comm.all_gather_bytes(cast_slice(std::slice::from_ref(&send)), cast_slice_mut(&mut recv));
        let layout = Self::from_counts(recv.iter().map(WireCount::get).collect());
        log::debug!(
            "rank {}: partition counts {:?}, displacements {:?}",
            comm.rank(),
            layout.counts,
            layout.displs
        );
        layout
    }

    pub fn num_ranks(&self) -> usize {
        self.counts.len()
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    pub fn displacements(&self) -> &[usize] {
        &self.displs
    }

    /// Local element count of `rank`.
    pub fn count(&self, rank: usize) -> usize {
        self.counts[rank]
    }

    /// Offset of `rank`'s first element in a rank-major array.
    pub fn displacement(&self, rank: usize) -> usize {
        self.displs[rank]
    }

    /// Positions `rank` occupies in a rank-major array.
    pub fn range(&self, rank: usize) -> Range<usize> {
        self.displs[rank]..self.displs[rank] + self.counts[rank]
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        match (self.displs.last(), self.counts.last()) {
            (Some(d), Some(n)) => d + n,
            _ => 0,
        }
    }

    /// Rank whose slice contains rank-major position `pos` (0-based).
    pub fn owner_of(&self, pos: usize) -> Option<usize> {
        if pos >= self.total() {
            return None;
        }
        Some(self.displs.partition_point(|&d| d <= pos) - 1)
    }

    /// Fail unless the counts sum to the solver's global element count.
    pub fn check_total(&self, nelgt: usize) -> Result<(), CouplingError> {
        let sum = self.total();
        if sum == nelgt {
            Ok(())
        } else {
            Err(CouplingError::GlobalCountMismatch { sum, nelgt })
        }
    }

    /// Counts and displacements in bytes for a `T` payload.
    pub(crate) fn byte_layout<T: Pod>(&self) -> (Vec<usize>, Vec<usize>) {
        (byte_extents::<T>(&self.counts), byte_extents::<T>(&self.displs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;
    use proptest::prelude::*;

    #[test]
    fn three_rank_scenario() {
        let layout = PartitionLayout::from_counts(vec![2, 3, 1]);
        assert_eq!(layout.counts(), &[2, 3, 1]);
        assert_eq!(layout.displacements(), &[0, 2, 5]);
        assert_eq!(layout.total(), 6);
        assert_eq!(layout.range(1), 2..5);
        assert!(layout.check_total(6).is_ok());
    }

    #[test]
    fn single_rank_layout() {
        let layout = PartitionLayout::all_gather(&NoComm, 11);
        assert_eq!(layout.counts(), &[11]);
        assert_eq!(layout.displacements(), &[0]);
        assert_eq!(layout.total(), 11);
    }

    #[test]
    fn owner_skips_empty_ranks() {
        let layout = PartitionLayout::from_counts(vec![2, 0, 0, 3]);
        assert_eq!(layout.owner_of(0), Some(0));
        assert_eq!(layout.owner_of(1), Some(0));
        assert_eq!(layout.owner_of(2), Some(3));
        assert_eq!(layout.owner_of(4), Some(3));
        assert_eq!(layout.owner_of(5), None);
    }

    #[test]
    fn total_mismatch_is_reported() {
        let layout = PartitionLayout::from_counts(vec![4, 4]);
        match layout.check_total(9) {
            Err(CouplingError::GlobalCountMismatch { sum, nelgt }) => {
                assert_eq!((sum, nelgt), (8, 9));
            }
            other => panic!("expected GlobalCountMismatch, got {other:?}"),
        }
    }

    #[test]
    fn empty_layout_has_zero_total() {
        let layout = PartitionLayout::default();
        assert_eq!(layout.total(), 0);
        assert_eq!(layout.owner_of(0), None);
    }

    proptest! {
        #[test]
        fn displacements_are_prefix_sums(counts in prop::collection::vec(0usize..1000, 1..64)) {
            let layout = PartitionLayout::from_counts(counts.clone());
            prop_assert_eq!(layout.displacement(0), 0);
            for i in 0..counts.len() - 1 {
                prop_assert_eq!(layout.displacement(i) + layout.count(i), layout.displacement(i + 1));
            }
            prop_assert_eq!(layout.total(), counts.iter().sum::<usize>());
        }

        #[test]
        fn every_position_has_its_owner(counts in prop::collection::vec(0usize..20, 1..16)) {
            let layout = PartitionLayout::from_counts(counts);
            for pos in 0..layout.total() {
                let owner = layout.owner_of(pos).unwrap();
                prop_assert!(layout.range(owner).contains(&pos));
            }
        }
    }
}
