//! Thin façade over intra-process (threads) or inter-process (MPI) collectives.
//!
//! Messages are *contiguous byte slices*; typed callers cast their buffers
//! through [`crate::algs::wire`]. Every collective blocks until all ranks of
//! the group have entered the same call, and ranks must issue collectives in
//! the same order. Nothing here times out: a rank that never arrives stalls
//! the others.

use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};

/// The coordinating rank that owns gathered arrays.
pub const ROOT: usize = 0;

/// Integer handle handed to the external solver (a Fortran `MPI_Fint`).
pub type NativeComm = i32;

/// Root-side receive layout of a variable-length gather, in bytes.
pub struct VarBufMut<'a> {
    pub buf: &'a mut [u8],
    pub counts: &'a [usize],
    pub displs: &'a [usize],
}

/// Root-side send layout of a variable-length scatter, in bytes.
pub struct VarBuf<'a> {
    pub buf: &'a [u8],
    pub counts: &'a [usize],
    pub displs: &'a [usize],
}

/// Blocking collective interface over a group of ranks.
///
/// No `Send`/`Sync` bound: an rsmpi communicator wraps a raw `MPI_Comm`,
/// which is a pointer under Open MPI. `NoComm` and `ThreadComm` are
/// `Send + Sync`.
pub trait Communicator {
    /// Index of this process within the group.
    fn rank(&self) -> usize;
    /// Number of ranks in the group.
    fn size(&self) -> usize;
    /// Block until every rank has called `barrier`.
    fn barrier(&self);

    /// Every rank contributes `send.len()` bytes; `recv` must hold
    /// `size() * send.len()` bytes and is filled in rank order.
    fn all_gather_bytes(&self, send: &[u8], recv: &mut [u8]);

    /// Variable-length gather onto `root`. Only `root` passes `Some(recv)`.
    fn gather_varcount_bytes(&self, root: usize, send: &[u8], recv: Option<VarBufMut<'_>>);

    /// Variable-length scatter from `root`. Only `root` passes `Some(send)`.
    fn scatter_varcount_bytes(&self, root: usize, send: Option<VarBuf<'_>>, recv: &mut [u8]);

    /// Handle the external solver uses to build its own communicator.
    fn native_handle(&self) -> NativeComm;

    fn is_root(&self) -> bool {
        self.rank() == ROOT
    }
}

impl<C: Communicator + ?Sized> Communicator for &C {
    fn rank(&self) -> usize {
        (**self).rank()
    }
    fn size(&self) -> usize {
        (**self).size()
    }
    fn barrier(&self) {
        (**self).barrier()
    }
    fn all_gather_bytes(&self, send: &[u8], recv: &mut [u8]) {
        (**self).all_gather_bytes(send, recv)
    }
    fn gather_varcount_bytes(&self, root: usize, send: &[u8], recv: Option<VarBufMut<'_>>) {
        (**self).gather_varcount_bytes(root, send, recv)
    }
    fn scatter_varcount_bytes(&self, root: usize, send: Option<VarBuf<'_>>, recv: &mut [u8]) {
        (**self).scatter_varcount_bytes(root, send, recv)
    }
    fn native_handle(&self) -> NativeComm {
        (**self).native_handle()
    }
}

/// Collective: true on every rank iff `ok` is true on every rank.
pub fn all_ok<C: Communicator + ?Sized>(comm: &C, ok: bool) -> bool {
    let mut flags = vec![0u8; comm.size()];
    comm.all_gather_bytes(&[u8::from(ok)], &mut flags);
    flags.iter().all(|&f| f == 1)
}

/// Compile-time single-rank comm for pure serial runs and unit tests.
#[derive(Clone, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn barrier(&self) {}

    fn all_gather_bytes(&self, send: &[u8], recv: &mut [u8]) {
        recv[..send.len()].copy_from_slice(send);
    }

    fn gather_varcount_bytes(&self, _root: usize, send: &[u8], recv: Option<VarBufMut<'_>>) {
        if let Some(VarBufMut { buf, displs, .. }) = recv {
            let start = displs.first().copied().unwrap_or(0);
            buf[start..start + send.len()].copy_from_slice(send);
        }
    }

    fn scatter_varcount_bytes(&self, _root: usize, send: Option<VarBuf<'_>>, recv: &mut [u8]) {
        if let Some(VarBuf { buf, counts, displs }) = send {
            let start = displs.first().copied().unwrap_or(0);
            let len = counts.first().copied().unwrap_or(0).min(recv.len());
            recv[..len].copy_from_slice(&buf[start..start + len]);
        }
    }

    fn native_handle(&self) -> NativeComm {
        0
    }
}

// --- ThreadComm: intra-process / one thread per rank ---
type Key = (u64, usize, usize); // (collective sequence, src, dst)

static NEXT_GROUP: AtomicI32 = AtomicI32::new(1);

#[derive(Debug)]
struct ThreadGroup {
    id: NativeComm,
    size: usize,
    mailbox: DashMap<Key, Bytes>,
}

/// One rank of an in-process group; move each handle onto its own thread.
///
/// Collectives are matched by a per-rank sequence number, so a rank that
/// skips or repeats a collective blocks the group just as MPI would.
#[derive(Debug)]
pub struct ThreadComm {
    rank: usize,
    group: Arc<ThreadGroup>,
    seq: AtomicU64,
}

static_assertions::assert_impl_all!(NoComm: Send, Sync);
static_assertions::assert_impl_all!(ThreadComm: Send, Sync);

impl ThreadComm {
    /// Create the `size` ranks of a fresh group.
    pub fn group(size: usize) -> Vec<ThreadComm> {
        let group = Arc::new(ThreadGroup {
            id: NEXT_GROUP.fetch_add(1, Ordering::Relaxed),
            size,
            mailbox: DashMap::new(),
        });
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                group: Arc::clone(&group),
                seq: AtomicU64::new(0),
            })
            .collect()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn post(&self, seq: u64, dst: usize, data: &[u8]) {
        self.group
            .mailbox
            .insert((seq, self.rank, dst), Bytes::copy_from_slice(data));
    }

    fn take(&self, seq: u64, src: usize) -> Bytes {
        let key = (seq, src, self.rank);
        loop {
            if let Some((_, bytes)) = self.group.mailbox.remove(&key) {
                return bytes;
            }
            std::thread::yield_now();
        }
    }
}

fn copy_truncated(dst: &mut [u8], src: &[u8]) {
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.group.size
    }

    fn barrier(&self) {
        let seq = self.next_seq();
        log::trace!("thread comm {}: barrier #{seq} on rank {}", self.group.id, self.rank);
        for peer in (0..self.size()).filter(|&p| p != self.rank) {
            self.post(seq, peer, &[]);
        }
        for peer in (0..self.size()).filter(|&p| p != self.rank) {
            self.take(seq, peer);
        }
    }

    fn all_gather_bytes(&self, send: &[u8], recv: &mut [u8]) {
        let seq = self.next_seq();
        let chunk = send.len();
        for peer in (0..self.size()).filter(|&p| p != self.rank) {
            self.post(seq, peer, send);
        }
        for peer in 0..self.size() {
            let slot = &mut recv[peer * chunk..(peer + 1) * chunk];
            if peer == self.rank {
                slot.copy_from_slice(send);
            } else {
                copy_truncated(slot, &self.take(seq, peer));
            }
        }
    }

    fn gather_varcount_bytes(&self, root: usize, send: &[u8], recv: Option<VarBufMut<'_>>) {
        let seq = self.next_seq();
        match recv {
            Some(VarBufMut { buf, counts, displs }) => {
                for peer in 0..self.size() {
                    let slot = &mut buf[displs[peer]..displs[peer] + counts[peer]];
                    if peer == self.rank {
                        copy_truncated(slot, send);
                    } else {
                        copy_truncated(slot, &self.take(seq, peer));
                    }
                }
            }
            None => self.post(seq, root, send),
        }
    }

    fn scatter_varcount_bytes(&self, root: usize, send: Option<VarBuf<'_>>, recv: &mut [u8]) {
        let seq = self.next_seq();
        match send {
            Some(VarBuf { buf, counts, displs }) => {
                for peer in 0..self.size() {
                    let part = &buf[displs[peer]..displs[peer] + counts[peer]];
                    if peer == self.rank {
                        copy_truncated(recv, part);
                    } else {
                        self.post(seq, peer, part);
                    }
                }
            }
            None => copy_truncated(recv, &self.take(seq, root)),
        }
    }

    fn native_handle(&self) -> NativeComm {
        self.group.id
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::{Communicator, NativeComm, VarBuf, VarBufMut};
    use mpi::Count;
    use mpi::datatype::{Partition, PartitionMut};
    use mpi::raw::AsRaw;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// Communicator backed by an rsmpi [`SimpleCommunicator`].
    pub struct MpiComm {
        comm: SimpleCommunicator,
        rank: usize,
        size: usize,
    }

    impl MpiComm {
        pub fn new(comm: SimpleCommunicator) -> Self {
            let rank = comm.rank() as usize;
            let size = comm.size() as usize;
            Self { comm, rank, size }
        }

        /// Wrap `MPI_COMM_WORLD` of an initialized universe.
        pub fn world(universe: &mpi::environment::Universe) -> Self {
            Self::new(universe.world())
        }

        /// Split off the ranks for which `active` is true. Every rank of
        /// `self` must call this; inactive ranks get `None`.
        pub fn split_active(&self, active: bool) -> Option<Self> {
            let color = if active {
                mpi::topology::Color::with_value(0)
            } else {
                mpi::topology::Color::undefined()
            };
            self.comm.split_by_color(color).map(Self::new)
        }

        pub fn raw(&self) -> &SimpleCommunicator {
            &self.comm
        }
    }

    fn counts(v: &[usize]) -> Vec<Count> {
        v.iter().map(|&n| n as Count).collect()
    }

    impl Communicator for MpiComm {
        fn rank(&self) -> usize {
            self.rank
        }
        fn size(&self) -> usize {
            self.size
        }
        fn barrier(&self) {
            self.comm.barrier();
        }

        fn all_gather_bytes(&self, send: &[u8], recv: &mut [u8]) {
            self.comm.all_gather_into(send, recv);
        }

        fn gather_varcount_bytes(&self, root: usize, send: &[u8], recv: Option<VarBufMut<'_>>) {
            let root = self.comm.process_at_rank(root as i32);
            match recv {
                Some(VarBufMut { buf, counts: c, displs }) => {
                    let mut partition = PartitionMut::new(buf, counts(c), counts(displs));
                    root.gather_varcount_into_root(send, &mut partition);
                }
                None => root.gather_varcount_into(send),
            }
        }

        fn scatter_varcount_bytes(&self, root: usize, send: Option<VarBuf<'_>>, recv: &mut [u8]) {
            let root = self.comm.process_at_rank(root as i32);
            match send {
                Some(VarBuf { buf, counts: c, displs }) => {
                    let partition = Partition::new(buf, counts(c), counts(displs));
                    root.scatter_varcount_into_root(&partition, recv);
                }
                None => root.scatter_varcount_into(recv),
            }
        }

        fn native_handle(&self) -> NativeComm {
            // SAFETY: `comm` is a live communicator for the lifetime of `self`.
            unsafe { mpi::ffi::MPI_Comm_c2f(self.comm.as_raw()) }
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
