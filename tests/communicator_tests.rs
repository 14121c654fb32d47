mod util;

use nek_coupler::algs::communicator::{Communicator, ROOT, ThreadComm, VarBuf, VarBufMut};
use util::run_ranks;

#[test]
fn thread_gather_varcount_places_by_displacement() {
    // rank r sends r+1 bytes of value r
    let counts = [1usize, 2, 3];
    let displs = [0usize, 1, 3];
    let got = run_ranks(3, |comm| {
        let send = vec![comm.rank() as u8; comm.rank() + 1];
        if comm.is_root() {
            let mut buf = vec![0xFFu8; 6];
            comm.gather_varcount_bytes(
                ROOT,
                &send,
                Some(VarBufMut { buf: &mut buf, counts: &counts, displs: &displs }),
            );
            Some(buf)
        } else {
            comm.gather_varcount_bytes(ROOT, &send, None);
            None
        }
    });
    assert_eq!(got[0], Some(vec![0, 1, 1, 2, 2, 2]));
    assert!(got[1].is_none() && got[2].is_none());
}

#[test]
fn thread_scatter_varcount_splits_root_buffer() {
    let counts = [2usize, 0, 1];
    let displs = [0usize, 2, 2];
    let got = run_ranks(3, |comm| {
        let mut recv = vec![0u8; counts[comm.rank()]];
        if comm.is_root() {
            let buf = [10u8, 11, 12];
            comm.scatter_varcount_bytes(
                ROOT,
                Some(VarBuf { buf: &buf, counts: &counts, displs: &displs }),
                &mut recv,
            );
        } else {
            comm.scatter_varcount_bytes(ROOT, None, &mut recv);
        }
        recv
    });
    assert_eq!(got, vec![vec![10, 11], vec![], vec![12]]);
}

#[test]
fn thread_all_gather_in_rank_order() {
    let got = run_ranks(4, |comm| {
        let mut recv = vec![0u8; 8];
        let r = comm.rank() as u8;
        comm.all_gather_bytes(&[r, r * 10], &mut recv);
        recv
    });
    for recv in got {
        assert_eq!(recv, vec![0, 0, 1, 10, 2, 20, 3, 30]);
    }
}

#[test]
fn consecutive_collectives_do_not_mix() {
    let got = run_ranks(3, |comm| {
        let mut first = vec![0u8; 3];
        let mut second = vec![0u8; 3];
        comm.all_gather_bytes(&[comm.rank() as u8], &mut first);
        comm.barrier();
        comm.all_gather_bytes(&[100 + comm.rank() as u8], &mut second);
        (first, second)
    });
    for (first, second) in got {
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(second, vec![100, 101, 102]);
    }
}

#[test]
fn group_shares_one_native_handle() {
    let handles = run_ranks(3, |comm| comm.native_handle());
    assert!(handles.windows(2).all(|w| w[0] == w[1]));
    let other = ThreadComm::group(1);
    assert_ne!(other[0].native_handle(), handles[0]);
}
