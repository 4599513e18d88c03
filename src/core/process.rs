//! Synchronous test-runner invocation with captured output.

use std::path::Path;
use std::process::Command;

use serde::Serialize;

use crate::error::{Error, Result, RunnerFailedDetails};

/// Captured outcome of one child process run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResult {
    pub exit_code: i32,
    #[serde(serialize_with = "lossy")]
    pub stdout: Vec<u8>,
    #[serde(serialize_with = "lossy")]
    pub stderr: Vec<u8>,
}

fn lossy<S: serde::Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(bytes))
}

/// Run `argv` in `cwd`, blocking until the child exits.
///
/// Exit 0 returns the captured result. A nonzero exit is an error carrying
/// the command line, exit code, and both output streams verbatim, so the
/// diagnostic text survives to the top of the pipeline. No retry here.
pub fn run_process(argv: &[String], cwd: &Path) -> Result<ProcessResult> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::validation_missing_argument(vec!["argv".to_string()]))?;

    log_status!("run", "Running {} in {}", argv.join(" "), cwd.display());

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| {
            Error::runner_failed(RunnerFailedDetails {
                command: argv.join(" "),
                exit_code: -1,
                stdout: String::new(),
                stderr: format!("Failed to launch {}: {}", program, e),
            })
        })?;

    let exit_code = output.status.code().unwrap_or(-1);

    if !output.status.success() {
        return Err(Error::runner_failed(RunnerFailedDetails {
            command: argv.join(" "),
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }));
    }

    Ok(ProcessResult {
        exit_code,
        stdout: output.stdout,
        stderr: output.stderr,
    })
}
