use std::fs::File;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::command::{CommandLine, LOG_FILE};
use crate::error::{BlockError, Result};

/// Runs the assembled command with `workdir` as the child's working
/// directory, blocking until it exits.
///
/// Stdout goes to the run log inside `workdir`; stderr stays attached to
/// the caller. The exit status is returned as-is: a non-zero tool exit is
/// the caller's outcome to report, not an error to reinterpret, and
/// nothing here retries or enforces a timeout.
pub fn run(command: &CommandLine, workdir: &Path) -> Result<ExitStatus> {
    let log_path = workdir.join(LOG_FILE);
    let log = File::create(&log_path).map_err(|err| BlockError::io(&log_path, err))?;
    Command::new(&command.program)
        .args(&command.args)
        .current_dir(workdir)
        .stdout(Stdio::from(log))
        .status()
        .map_err(|source| BlockError::Spawn {
            program: command.program.clone(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_in_log_file() {
        let scratch = tempfile::tempdir().unwrap();
        let command = CommandLine {
            program: "echo".to_string(),
            args: vec!["design finished".to_string()],
        };
        let status = run(&command, scratch.path()).unwrap();
        assert!(status.success());
        let contents = std::fs::read_to_string(scratch.path().join(LOG_FILE)).unwrap();
        assert_eq!(contents.trim(), "design finished");
    }

    #[test]
    fn nonzero_exit_is_reported_not_raised() {
        let scratch = tempfile::tempdir().unwrap();
        let command = CommandLine {
            program: "false".to_string(),
            args: vec![],
        };
        let status = run(&command, scratch.path()).unwrap();
        assert!(!status.success());
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let scratch = tempfile::tempdir().unwrap();
        let command = CommandLine {
            program: "definitely-not-on-path".to_string(),
            args: vec![],
        };
        let result = run(&command, scratch.path());
        assert!(matches!(result, Err(BlockError::Spawn { .. })));
    }
}
