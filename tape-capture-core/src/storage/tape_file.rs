use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;

/// Size and integrity digest of a finished tape file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapeFileInfo {
    pub size: u64,
    pub checksum: String,
}

/// Fresh tape path inside `directory`: `tape_<uuid><extension>`.
pub fn tape_path(directory: &Path, extension: &str) -> PathBuf {
    directory.join(format!("tape_{}{}", uuid::Uuid::new_v4(), extension))
}

/// Make sure the output directory exists before the recorder opens a file in it.
pub fn prepare_directory(directory: &Path) -> Result<(), CaptureError> {
    fs::create_dir_all(directory).map_err(CaptureError::system)
}

/// Read back a finished tape: byte size and SHA-256 checksum.
pub fn finalize(path: &Path) -> Result<TapeFileInfo, CaptureError> {
    let size = fs::metadata(path).map_err(CaptureError::system)?.len();
    let checksum = sha256_file(path)?;
    Ok(TapeFileInfo { size, checksum })
}

/// Remove a tape that will not be kept. A missing file is not an error.
pub fn discard(path: &Path) -> Result<(), CaptureError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CaptureError::system(e)),
    }
}

/// Compute SHA-256 hex digest of a file.
fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let mut file = File::open(path).map_err(CaptureError::system)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let read = file.read(&mut buf).map_err(CaptureError::system)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex_encode(&hasher.finalize()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tape_capture_test_{}_{}", std::process::id(), name))
    }

    #[test]
    fn tape_path_uses_extension() {
        let path = tape_path(Path::new("/var/tapes"), ".m4a");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("tape_"));
        assert!(name.ends_with(".m4a"));
        assert_eq!(path.parent(), Some(Path::new("/var/tapes")));
        assert_ne!(path, tape_path(Path::new("/var/tapes"), ".m4a"));
    }

    #[test]
    fn finalize_reports_size_and_checksum() {
        let path = temp_file_path("finalize.m4a");
        fs::write(&path, b"abc").unwrap();

        let info = finalize(&path).unwrap();
        assert_eq!(info.size, 3);
        assert_eq!(
            info.checksum,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        fs::remove_file(&path).ok();
    }

    #[test]
    fn finalize_missing_file_is_system_error() {
        let err = finalize(&temp_file_path("never_written.m4a")).unwrap_err();
        assert!(matches!(err, CaptureError::System(_)));
    }

    #[test]
    fn discard_is_idempotent() {
        let path = temp_file_path("discard.m4a");
        fs::write(&path, b"partial").unwrap();

        discard(&path).unwrap();
        assert!(!path.exists());
        discard(&path).unwrap();
    }
}
