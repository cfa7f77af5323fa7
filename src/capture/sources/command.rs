use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::capture::file::expand_tilde;
use crate::capture::types::CaptureError;

/// Arguments for the macOS interactive region capture.
pub fn screencapture_args(target: &Path) -> Vec<String> {
    vec![
        "-i".to_string(),
        "-s".to_string(),
        "-t".to_string(),
        "png".to_string(),
        target.to_string_lossy().into_owned(),
    ]
}

/// Run `program` to completion, capturing stderr for the log.
///
/// Only a failure to start the process is an error. The exit status is
/// returned for logging; whether the capture succeeded is decided by the
/// file it leaves behind.
pub fn run_tool(program: &str, args: &[String]) -> Result<ExitStatus, CaptureError> {
    log::debug!("Running screenshot tool: {} {:?}", program, args);

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| CaptureError::LaunchFailed(format!("{}: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::info!(
            "{} exited with {} {}",
            program,
            output.status,
            stderr.trim()
        );
    }

    Ok(output.status)
}

/// Run a user-configured command with the target path appended. A leading
/// `~/` in the program path is expanded.
pub fn run_override(command: &[String], target: &Path) -> Result<(), CaptureError> {
    let (program, rest) = command
        .split_first()
        .ok_or_else(|| CaptureError::LaunchFailed("capture.command is empty".to_string()))?;
    let program = expand_tilde(program);

    let mut args = rest.to_vec();
    args.push(target.to_string_lossy().into_owned());
    run_tool(&program.to_string_lossy(), &args).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn screencapture_uses_interactive_png_selection() {
        let args = screencapture_args(Path::new("/tmp/cap.png"));
        assert_eq!(args, vec!["-i", "-s", "-t", "png", "/tmp/cap.png"]);
    }

    #[test]
    fn missing_program_is_launch_failure() {
        let err = run_tool("blackshot-no-such-tool", &[]).unwrap_err();
        assert!(matches!(err, CaptureError::LaunchFailed(_)));
    }

    #[test]
    fn empty_override_is_launch_failure() {
        let err = run_override(&[], Path::new("/tmp/x.png")).unwrap_err();
        assert!(matches!(err, CaptureError::LaunchFailed(_)));
    }

    #[cfg(unix)]
    #[test]
    fn override_receives_target_as_last_argument() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source.png");
        let target = temp.path().join("target.png");
        std::fs::write(&source, b"pixels").unwrap();

        let command = vec!["cp".to_string(), source.to_string_lossy().into_owned()];
        run_override(&command, &target).unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"pixels");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_not_an_error() {
        let status = run_tool("false", &[]).unwrap();
        assert!(!status.success());
    }
}
