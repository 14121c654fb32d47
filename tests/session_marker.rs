mod util;

use nek_coupler::algs::communicator::NoComm;
use nek_coupler::driver::{NekConfig, NekDriver, SESSION_FILE, read_session_marker};
use nek_coupler::solver::FakeNek;
use serial_test::serial;
use util::{run_ranks, scratch_dir};

#[test]
#[serial]
fn default_workdir_is_the_process_directory() {
    let cwd = std::env::current_dir().unwrap();
    let marker_path = cwd.join(SESSION_FILE);
    let had_marker = marker_path.exists();

    let cfg = NekConfig::from_json_str(r#"{ "pressure": 3.0, "casename": "cwd-case" }"#).unwrap();
    let driver = NekDriver::new(&NoComm, Some(NoComm), FakeNek::rank_major(0, &[1]), cfg).unwrap();
    driver.finalize();

    let marker = read_session_marker(&marker_path).unwrap();
    assert_eq!(marker.casename, "cwd-case");
    assert_eq!(marker.dir, cwd.canonicalize().unwrap());
    if !had_marker {
        std::fs::remove_file(marker_path).unwrap();
    }
}

#[test]
fn only_the_root_writes_the_marker() {
    let dirs = run_ranks(3, |comm| {
        use nek_coupler::algs::communicator::Communicator;
        // every rank points at its own directory; only rank 0 may write
        let dir = scratch_dir(&format!("root-only-{}", comm.rank()));
        let cfg = NekConfig::new(1.0, "pin").with_workdir(&dir);
        let solver = FakeNek::rank_major(comm.rank(), &[1, 1, 1]);
        let driver = NekDriver::new(&NoComm, Some(comm), solver, cfg).unwrap();
        driver.finalize();
        dir
    });
    assert!(dirs[0].join(SESSION_FILE).exists());
    assert!(!dirs[1].join(SESSION_FILE).exists());
    assert!(!dirs[2].join(SESSION_FILE).exists());
}

#[test]
fn config_file_round_trip() {
    let dir = scratch_dir("config-file");
    let path = dir.join("nek.json");
    std::fs::write(&path, r#"{ "pressure": 1.5e7, "casename": "assembly", "workdir": "/data/run" }"#)
        .unwrap();
    let cfg = NekConfig::from_json_file(&path).unwrap();
    assert_eq!(cfg.pressure, 1.5e7);
    assert_eq!(cfg.casename, "assembly");
    assert_eq!(cfg.workdir.as_deref(), Some(std::path::Path::new("/data/run")));
    assert!(NekConfig::from_json_file(&dir.join("missing.json")).is_err());
}
