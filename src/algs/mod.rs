//! Collective building blocks: communicators, wire casting, partition layout
//! and field gather/scatter.

pub mod communicator;
pub mod field_gather;
pub mod layout;
pub mod wire;

pub use field_gather::{FieldOrdering, gather_field, gather_rank_major, scatter_rank_major};
pub use layout::PartitionLayout;
