use std::ffi::OsStr;
use std::path::Path;
use std::process::ExitStatus;

use tokio::process::Command;

use crate::error::ExecutionError;

/// Spawns `program` with `args` in `working_dir` and waits for it to exit.
///
/// Standard streams are inherited, so tool output goes straight to the
/// console. There is no timeout; a hung external process blocks the calling
/// task until it terminates. A missing or non-executable program surfaces as
/// `ExecutionError::Spawn` rather than a fake success.
pub async fn run<I, S>(
    working_dir: &Path,
    program: &Path,
    args: I,
) -> Result<ExitStatus, ExecutionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    log::info!("Executing {:?} in {:?}", program, working_dir);

    let mut command = Command::new(program);
    command.args(args).current_dir(working_dir);

    let mut child = command.spawn().map_err(|source| ExecutionError::Spawn {
        program: program.to_path_buf(),
        source,
    })?;

    let status = child.wait().await.map_err(|source| ExecutionError::Wait {
        program: program.to_path_buf(),
        source,
    })?;

    log::info!("{:?} exited with {}", program, status);
    Ok(status)
}
