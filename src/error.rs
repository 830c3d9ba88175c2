use std::io;

/// All error types for the GNO export pipeline.
#[derive(thiserror::Error, Debug)]
pub enum GnoError {
    #[error("Topology error: {0}")]
    Topology(String),
    #[error("Scene error: {0}")]
    Scene(String),
    #[error("Material error: {0}")]
    Material(String),
    #[error("Weight error: {0}")]
    Weight(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Rig error: {0}")]
    Rig(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Scene parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GnoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_strings() {
        let e = GnoError::Topology("edge has 3 faces".into());
        assert_eq!(e.to_string(), "Topology error: edge has 3 faces");

        let e = GnoError::Scene("no meshes".into());
        assert_eq!(e.to_string(), "Scene error: no meshes");

        let e = GnoError::Material("unassigned".into());
        assert_eq!(e.to_string(), "Material error: unassigned");

        let e = GnoError::Weight("3 influences".into());
        assert_eq!(e.to_string(), "Weight error: 3 influences");

        let e = GnoError::Encoding("index overflow".into());
        assert_eq!(e.to_string(), "Encoding error: index overflow");

        let e = GnoError::Rig("truncated".into());
        assert_eq!(e.to_string(), "Rig error: truncated");
    }

    #[test]
    fn from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file missing");
        let e: GnoError = io_err.into();
        assert!(matches!(e, GnoError::Io(_)));
        assert!(e.to_string().contains("file missing"));
    }
}
