#![allow(dead_code)]
use nek_coupler::algs::communicator::{
    Communicator, NativeComm, NoComm, ThreadComm, VarBuf, VarBufMut,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Run `f` once per rank of a fresh `size`-rank group, one thread each.
/// Results come back in rank order.
pub fn run_ranks<T, F>(size: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(ThreadComm) -> T + Sync,
{
    let comms = ThreadComm::group(size);
    std::thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let f = &f;
                s.spawn(move || f(comm))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

/// Like [`run_ranks`], but only the first `active` world ranks also get a
/// rank in a second, active group.
pub fn run_world<T, F>(world_size: usize, active: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(ThreadComm, Option<ThreadComm>) -> T + Sync,
{
    let mut actives: Vec<Option<ThreadComm>> =
        ThreadComm::group(active).into_iter().map(Some).collect();
    actives.resize_with(world_size, || None);
    let worlds = ThreadComm::group(world_size);
    std::thread::scope(|s| {
        let handles: Vec<_> = worlds
            .into_iter()
            .zip(actives)
            .map(|(world, comm)| {
                let f = &f;
                s.spawn(move || f(world, comm))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nek-coupler-test-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Single-rank comm that counts every communication call.
#[derive(Default)]
pub struct CountingComm {
    calls: AtomicUsize,
}

impl CountingComm {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Communicator for CountingComm {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn barrier(&self) {
        self.hit();
    }
    fn all_gather_bytes(&self, send: &[u8], recv: &mut [u8]) {
        self.hit();
        NoComm.all_gather_bytes(send, recv);
    }
    fn gather_varcount_bytes(&self, root: usize, send: &[u8], recv: Option<VarBufMut<'_>>) {
        self.hit();
        NoComm.gather_varcount_bytes(root, send, recv);
    }
    fn scatter_varcount_bytes(&self, root: usize, send: Option<VarBuf<'_>>, recv: &mut [u8]) {
        self.hit();
        NoComm.scatter_varcount_bytes(root, send, recv);
    }
    fn native_handle(&self) -> NativeComm {
        self.hit();
        0
    }
}
