//! The `SESSION.NAME` marker the solver reads at startup.
//!
//! Two lines, no escaping: the case name, then the absolute path of the
//! run directory.

use crate::coupling_error::CouplingError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const SESSION_FILE: &str = "SESSION.NAME";

/// Parsed contents of a session marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionMarker {
    pub casename: String,
    pub dir: PathBuf,
}

/// Write `dir/SESSION.NAME` and return its path.
pub fn write_session_marker(dir: &Path, casename: &str) -> Result<PathBuf, CouplingError> {
    let abs = dir.canonicalize().map_err(marker_err(dir))?;
    let path = abs.join(SESSION_FILE);

    write_lines(&path, casename, &abs).map_err(marker_err(&path))?;

    log::debug!("wrote {} for case `{casename}`", path.display());
    Ok(path)
}

fn marker_err(path: &Path) -> impl FnOnce(std::io::Error) -> CouplingError {
    let path = path.to_path_buf();
    move |source| CouplingError::SessionMarker { path, source }
}

fn write_lines(path: &Path, casename: &str, dir: &Path) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{casename}")?;
    writeln!(out, "{}", dir.display())?;
    out.flush()
}

/// Read back a marker written by [`write_session_marker`].
pub fn read_session_marker(path: &Path) -> Result<SessionMarker, CouplingError> {
    let text = std::fs::read_to_string(path).map_err(|source| CouplingError::SessionMarker {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lines = text.lines();
    match (lines.next(), lines.next()) {
        (Some(casename), Some(dir)) => Ok(SessionMarker {
            casename: casename.to_string(),
            dir: PathBuf::from(dir),
        }),
        _ => Err(CouplingError::MalformedSessionMarker(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nek-coupler-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn marker_has_two_lines() {
        let dir = scratch("marker");
        let path = write_session_marker(&dir, "pincell").unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let abs = dir.canonicalize().unwrap();
        assert_eq!(text, format!("pincell\n{}\n", abs.display()));

        let marker = read_session_marker(&path).unwrap();
        assert_eq!(marker.casename, "pincell");
        assert_eq!(marker.dir, abs);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = std::env::temp_dir().join("nek-coupler-does-not-exist/deeper");
        let err = write_session_marker(&dir, "x").unwrap_err();
        assert!(matches!(err, CouplingError::SessionMarker { .. }));
    }

    #[test]
    fn truncated_marker_is_malformed() {
        let dir = scratch("truncated");
        let path = dir.join(SESSION_FILE);
        std::fs::write(&path, "only-one-line\n").unwrap();
        assert!(matches!(
            read_session_marker(&path),
            Err(CouplingError::MalformedSessionMarker(_))
        ));
        std::fs::remove_dir_all(dir).unwrap();
    }
}
