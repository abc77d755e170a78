use std::fs;
use std::path::{Path, PathBuf};

use canonical_error::{CanonicalError, failed_precondition_error,
                      not_found_error};
use glob::glob;
use log::{error, info, warn};

use crate::cleanup;
use crate::coordinates;
use crate::solve_command;
use crate::solver;
use crate::telescope_config::TelescopeConfig;

/// Why an image's solve was recorded as failed. Both kinds are per-image;
/// neither stops the batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    SolverNonZeroExit,
    OutputArtifactMissing,
}

#[derive(Clone, Debug)]
pub struct SolveOutcome {
    pub image: PathBuf,
    pub success: bool,
    pub output_path: PathBuf,
    pub error_kind: Option<ErrorKind>,
}

/// One batch invocation: the enumerated images of a directory, driven
/// through the per-image solve pipeline in sorted order.
pub struct BatchRun {
    images_dir: PathBuf,
    images: Vec<PathBuf>,
    overwrite: bool,
    config: TelescopeConfig,
    outcomes: Vec<SolveOutcome>,
}

impl BatchRun {
    /// Enumerates the images up front. An empty enumeration is the one
    /// batch-level abort condition and is raised here, before the output
    /// directory is created or anything else is touched.
    pub fn new(images_dir: &Path, config: TelescopeConfig, overwrite: bool)
               -> Result<Self, CanonicalError> {
        let images = enumerate_images(images_dir, &config.fits_glob_pattern)?;
        Ok(BatchRun{
            images_dir: images_dir.to_path_buf(),
            images,
            overwrite,
            config,
            outcomes: Vec::new(),
        })
    }

    pub fn output_dir(&self) -> PathBuf {
        self.images_dir.join(&self.config.output_folder_name)
    }

    pub fn outcomes(&self) -> &[SolveOutcome] {
        &self.outcomes
    }

    /// Solves every enumerated image in order. A failed solve is recorded
    /// and the batch moves on; only inability to start the solver at all
    /// aborts. The final cleanup pass runs exactly once either way.
    pub fn run(&mut self) -> Result<(), CanonicalError> {
        // Reported here rather than in new() so the line lands after the
        // binary has installed its subscriber.
        info!("{} images found in {:?}", self.images.len(), self.images_dir);
        let output_dir = self.output_dir();
        fs::create_dir_all(&output_dir).map_err(
            |e| failed_precondition_error(
                format!("Could not create {:?}: {:?}", output_dir, e).as_str()))?;

        let mut fatal: Option<CanonicalError> = None;
        let images = self.images.clone();
        for image in &images {
            match self.solve_one(image, &output_dir) {
                Ok(outcome) => {
                    if !outcome.success {
                        self.cleanup_failed(image);
                    }
                    self.outcomes.push(outcome);
                },
                Err(e) => {
                    // Solver could not be started; environment problem,
                    // no point continuing with the remaining images.
                    error!("Aborting batch at {:?}: {:?}", image, e);
                    self.cleanup_failed(image);
                    fatal = Some(e);
                    break;
                },
            }
        }

        let swept = cleanup::cleanup(&self.images_dir, &output_dir,
                                     self.overwrite);
        if let Some(e) = fatal {
            return Err(e);
        }
        swept?;

        let solved = self.outcomes.iter().filter(|o| o.success).count();
        info!("Batch complete: {} solved, {} failed",
              solved, self.outcomes.len() - solved);
        Ok(())
    }

    fn solve_one(&self, image: &Path, output_dir: &Path)
                 -> Result<SolveOutcome, CanonicalError> {
        info!("Solving {:?}", image);
        let coords = coordinates::extract(image, &self.config);
        let argv = solve_command::build(image, &coords, &self.config,
                                        output_dir);
        info!("solve command: {}", argv.join(" "));

        let invocation = solver::invoke(&argv)?;
        let output_path = solve_command::expected_output(image, output_dir);
        let (success, error_kind) = if !invocation.success {
            warn!("Solver exited with {:?} for {:?}",
                  invocation.exit_code, image);
            (false, Some(ErrorKind::SolverNonZeroExit))
        } else if !solver::verify(&output_path) {
            warn!("Solver exited 0 but {:?} was not produced", output_path);
            (false, Some(ErrorKind::OutputArtifactMissing))
        } else {
            info!("Solved {:?}", image);
            (true, None)
        };
        Ok(SolveOutcome{
            image: image.to_path_buf(),
            success,
            output_path,
            error_kind,
        })
    }

    fn cleanup_failed(&self, image: &Path) {
        if let Some(stem) = image.file_stem().and_then(|s| s.to_str()) {
            cleanup::cleanup_image(&self.images_dir, stem);
        }
    }
}

fn enumerate_images(images_dir: &Path, pattern: &str)
                    -> Result<Vec<PathBuf>, CanonicalError> {
    let full_pattern = images_dir.join(pattern);
    let mut images: Vec<PathBuf> =
        glob(&full_pattern.to_string_lossy())
        .map_err(|e| failed_precondition_error(
            format!("Bad image pattern {:?}: {:?}", full_pattern, e).as_str()))?
        .flatten()
        .collect();
    images.sort();
    if images.is_empty() {
        return Err(not_found_error(
            format!("No images matching {:?} in {:?}",
                    pattern, images_dir).as_str()));
    }
    Ok(images)
}
