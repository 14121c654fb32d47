//! Fixed, little-endian wire types for the collectives.

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::size_of;

pub fn cast_slice<T: Pod>(v: &[T]) -> &[u8] {
    bytemuck::cast_slice(v)
}

pub fn cast_slice_mut<T: Pod>(v: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(v)
}

/// Scale element counts/displacements to byte counts for a `T` payload.
pub fn byte_extents<T: Pod>(extents: &[usize]) -> Vec<usize> {
    extents.iter().map(|&n| n * size_of::<T>()).collect()
}

/// An element count as exchanged between ranks.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct WireCount {
    n_le: u64,
}

impl WireCount {
    pub fn new(n: usize) -> Self {
        Self {
            n_le: (n as u64).to_le(),
        }
    }
    pub fn get(&self) -> usize {
        u64::from_le(self.n_le) as usize
    }
}

/// A 1-based global element index as exchanged between ranks.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct WireIndex {
    idx_le: u64,
}

impl WireIndex {
    pub fn new(idx: usize) -> Self {
        Self {
            idx_le: (idx as u64).to_le(),
        }
    }
    pub fn get(&self) -> usize {
        u64::from_le(self.idx_le) as usize
    }
}

const_assert_eq!(size_of::<WireCount>(), 8);
const_assert_eq!(size_of::<WireIndex>(), 8);
