//! Driver configuration.
//!
//! ```json
//! { "pressure": 1.0e5, "casename": "pincell", "workdir": "/scratch/run1" }
//! ```

use crate::coupling_error::CouplingError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NekConfig {
    /// System pressure; must be strictly positive.
    pub pressure: f64,
    /// Case identifier written to the session marker.
    #[serde(default)]
    pub casename: String,
    /// Directory for the session marker. Defaults to the process working
    /// directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
}

impl NekConfig {
    pub fn new(pressure: f64, casename: impl Into<String>) -> Self {
        Self {
            pressure,
            casename: casename.into(),
            workdir: None,
        }
    }

    pub fn with_workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, CouplingError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CouplingError> {
        let text = std::fs::read_to_string(path).map_err(|source| CouplingError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Pressure must be finite and `> 0`.
    pub fn validate_pressure(&self) -> Result<(), CouplingError> {
        if self.pressure.is_finite() && self.pressure > 0.0 {
            Ok(())
        } else {
            Err(CouplingError::InvalidPressure(self.pressure))
        }
    }

    /// Case name, required on active ranks.
    pub fn casename(&self) -> Result<&str, CouplingError> {
        match self.casename.trim() {
            "" => Err(CouplingError::MissingCaseName),
            name => Ok(name),
        }
    }

    /// Resolve the session directory against the process working directory.
    pub fn session_dir(&self) -> Result<PathBuf, CouplingError> {
        match &self.workdir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().map_err(|source| CouplingError::SessionMarker {
                path: PathBuf::from("."),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document() {
        let cfg = NekConfig::from_json_str(r#"{ "pressure": 2.5, "casename": "rod" }"#).unwrap();
        assert_eq!(cfg, NekConfig::new(2.5, "rod"));
        assert!(cfg.validate_pressure().is_ok());
        assert_eq!(cfg.casename().unwrap(), "rod");
    }

    #[test]
    fn rejects_non_positive_pressure() {
        for p in [0.0, -1.0, f64::NAN] {
            let cfg = NekConfig::new(p, "rod");
            assert!(matches!(cfg.validate_pressure(), Err(CouplingError::InvalidPressure(_))));
        }
    }

    #[test]
    fn missing_pressure_is_a_parse_error() {
        let err = NekConfig::from_json_str(r#"{ "casename": "rod" }"#).unwrap_err();
        assert!(matches!(err, CouplingError::Config(_)));
    }

    #[test]
    fn blank_casename_is_missing() {
        let cfg = NekConfig::new(1.0, "  ");
        assert!(matches!(cfg.casename(), Err(CouplingError::MissingCaseName)));
    }

    #[test]
    fn explicit_workdir_wins() {
        let cfg = NekConfig::new(1.0, "rod").with_workdir("/tmp/run");
        assert_eq!(cfg.session_dir().unwrap(), PathBuf::from("/tmp/run"));
    }
}
