use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::segment::Segment;

/// Sidecar location for a tape: same stem, `.metadata.json` extension.
pub fn metadata_path(tape_path: &Path) -> PathBuf {
    tape_path.with_extension("metadata.json")
}

/// Write segment metadata as a JSON sidecar file next to the tape.
pub fn write_metadata(segment: &Segment, tape_path: &Path) -> Result<(), CaptureError> {
    let json = serde_json::to_string_pretty(segment).map_err(CaptureError::system)?;
    fs::write(metadata_path(tape_path), json).map_err(CaptureError::system)?;
    Ok(())
}

/// Read segment metadata from a JSON sidecar file.
///
/// The returned segment is sealed: its info was set before it was written.
pub fn read_metadata(tape_path: &Path) -> Result<Segment, CaptureError> {
    let json = fs::read_to_string(metadata_path(tape_path)).map_err(CaptureError::system)?;
    let segment: Segment = serde_json::from_str(&json).map_err(CaptureError::system)?;
    Ok(segment.sealed())
}
