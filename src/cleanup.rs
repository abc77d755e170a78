use std::fs;
use std::path::Path;

use canonical_error::{CanonicalError, failed_precondition_error};
use glob::glob;
use log::{info, warn};

// Scratch files solve-field leaves beside the images it processes.
pub const SCRATCH_EXTENSIONS: &[&str] =
    &["axy", "corr", "xyls", "match", "new", "rdls", "solved", "wcs"];

/// Final sweep after a batch. With `overwrite` the solved copies in
/// `output_dir` are moved over the originals first; then solver scratch
/// files are deleted from `images_dir`. Safe to run repeatedly.
pub fn cleanup(images_dir: &Path, output_dir: &Path, overwrite: bool)
               -> Result<(), CanonicalError> {
    if overwrite && output_dir.is_dir() {
        relocate_outputs(images_dir, output_dir)?;
    }
    let mut removed = 0;
    for ext in SCRATCH_EXTENSIONS {
        let pattern = images_dir.join(format!("*.{}", ext));
        let paths = glob(&pattern.to_string_lossy()).map_err(
            |e| failed_precondition_error(
                format!("Bad cleanup pattern {:?}: {:?}", pattern, e).as_str()))?;
        for path in paths.flatten() {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Could not remove scratch file {:?}: {:?}",
                                path, e),
            }
        }
    }
    if removed > 0 {
        info!("Removed {} solver scratch file(s) from {:?}", removed, images_dir);
    }
    Ok(())
}

/// Deletes the scratch files of a single image, by file stem. Run right
/// after an image's solve fails so a broken attempt's leftovers do not
/// outlive the failing image's own handling.
pub fn cleanup_image(images_dir: &Path, stem: &str) {
    for ext in SCRATCH_EXTENSIONS {
        let path = images_dir.join(format!("{}.{}", stem, ext));
        if path.is_file() {
            if let Err(e) = fs::remove_file(&path) {
                warn!("Could not remove scratch file {:?}: {:?}", path, e);
            }
        }
    }
}

fn relocate_outputs(images_dir: &Path, output_dir: &Path)
                    -> Result<(), CanonicalError> {
    let entries = fs::read_dir(output_dir).map_err(
        |e| failed_precondition_error(
            format!("Could not read {:?}: {:?}", output_dir, e).as_str()))?;
    for entry in entries {
        let entry = entry.map_err(
            |e| failed_precondition_error(
                format!("Could not read {:?}: {:?}", output_dir, e).as_str()))?;
        let destination = images_dir.join(entry.file_name());
        fs::rename(entry.path(), &destination).map_err(
            |e| failed_precondition_error(
                format!("Could not move {:?} to {:?}: {:?}",
                        entry.path(), destination, e).as_str()))?;
    }
    info!("Moved solved images from {:?} over {:?}", output_dir, images_dir);
    Ok(())
}
