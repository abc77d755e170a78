use std::path::Path;
use std::process::Command;

use canonical_error::{CanonicalError, failed_precondition_error,
                      invalid_argument_error};

/// Result of one solver run. A non-zero exit is data, not an error; only
/// failure to start the process at all is reported as an error.
#[derive(Clone, Copy, Debug)]
pub struct Invocation {
    pub exit_code: Option<i32>,
    pub success: bool,
}

/// Runs the solver synchronously to completion. Blocks for the process's
/// full duration, which may be as long as the profile's --cpulimit.
pub fn invoke(argv: &[String]) -> Result<Invocation, CanonicalError> {
    let (program, args) = argv.split_first().ok_or_else(
        || invalid_argument_error("Empty solver command"))?;
    match Command::new(program).args(args).status() {
        Err(e) => {
            Err(failed_precondition_error(
                format!("Could not start {}: {:?}", program, e).as_str()))
        },
        Ok(status) => {
            Ok(Invocation{exit_code: status.code(),
                          success: status.success()})
        },
    }
}

/// Whether the solved artifact actually exists. Checked independently of
/// the exit code; solve-field can exit 0 without writing the new FITS.
pub fn verify(expected_output: &Path) -> bool {
    expected_output.is_file()
}
