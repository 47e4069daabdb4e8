use std::path::{Path, PathBuf};

use crate::shared::constants::ENCODER_EXECUTABLE;
use crate::shared::error::CaptureError;

/// Finds the encoder executable before anything is launched.
///
/// Resolution order:
/// 1. `explicit`, as a file path or, when it is a bare name, looked up on `PATH`
/// 2. `ffmpeg` on `PATH`
pub fn locate_encoder(explicit: Option<&Path>) -> Result<PathBuf, CaptureError> {
    match explicit {
        Some(path) => resolve_explicit(path),
        None => which::which(ENCODER_EXECUTABLE).map_err(|e| {
            CaptureError::EncoderUnavailable(format!(
                "{ENCODER_EXECUTABLE} not found on PATH ({e}); set the encoder path explicitly"
            ))
        }),
    }
}

fn resolve_explicit(path: &Path) -> Result<PathBuf, CaptureError> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if path.components().count() == 1 {
        if let Ok(found) = which::which(path) {
            return Ok(found);
        }
    }
    Err(CaptureError::EncoderUnavailable(format!(
        "encoder path {} does not exist",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_file_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("ffmpeg");
        std::fs::write(&exe, b"").unwrap();

        assert_eq!(locate_encoder(Some(exe.as_path())).unwrap(), exe);
    }

    #[test]
    fn test_missing_explicit_path_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope").join("ffmpeg");
        let err = locate_encoder(Some(missing.as_path())).unwrap_err();
        assert!(matches!(err, CaptureError::EncoderUnavailable(_)));
    }

    #[test]
    fn test_directory_is_not_an_encoder() {
        let dir = tempfile::tempdir().unwrap();
        let err = locate_encoder(Some(dir.path())).unwrap_err();
        assert!(matches!(err, CaptureError::EncoderUnavailable(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_bare_name_searched_on_path() {
        let found = locate_encoder(Some(Path::new("sh"))).unwrap();
        assert!(found.is_absolute());
    }
}
