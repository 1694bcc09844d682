//! Launching the toolbox executables
//!
//! Each model is a Fortran program `<name>.exe` that takes the run title as
//! its only argument and reads `<title>.env` from its working directory.

use crate::environment::Environment;
use crate::error::{Result, ToolboxError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Executable path `<model_path>/<name>.exe`, or `<name>.exe` on the search path
pub fn executable(name: &str, model_path: Option<&Path>) -> Result<PathBuf> {
    let file = format!("{}.exe", name.to_lowercase());
    match model_path {
        // The child runs in the environment's directory, so relative
        // directories must be resolved here
        Some(dir) => {
            let dir = dir
                .canonicalize()
                .map_err(|_| ToolboxError::UnknownCommand(dir.join(&file)))?;
            Ok(dir.join(file))
        }
        None => Ok(PathBuf::from(file)),
    }
}

/// Run model `name` on an environment whose `.env` file has been written
///
/// Output is discarded. A missing executable is
/// [`ToolboxError::UnknownCommand`] and a non-zero exit status is
/// [`ToolboxError::ModelFailed`].
pub fn run_model(name: &str, model_path: Option<&Path>, environment: &Environment) -> Result<()> {
    let program = executable(name, model_path)?;
    log::debug!(
        "running {} {} in {}",
        program.display(),
        environment.title,
        environment.tmpdir.display()
    );
    let status = Command::new(&program)
        .arg(&environment.title)
        .current_dir(&environment.tmpdir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                ToolboxError::UnknownCommand(program.clone())
            }
            _ => ToolboxError::Io(e),
        })?;
    if !status.success() {
        return Err(ToolboxError::ModelFailed {
            model: name.to_lowercase(),
            status: status.code().unwrap_or(-1),
        });
    }
    log::info!("{} finished for `{}`", name.to_lowercase(), environment.title);
    Ok(())
}
