// dump.rs
// Phase 0: Run the external dumper that writes the offset headers

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// How to invoke the dumper.
#[derive(Debug, Clone)]
pub struct DumperConfig {
    pub path: String,
    /// Value passed to `-f`.
    pub format: String,
    /// Pause after the dumper exits before its output is read.
    pub settle_delay: Duration,
}

impl Default for DumperConfig {
    fn default() -> Self {
        Self {
            path: "cs2-dumper.exe".to_string(),
            format: "hpp".to_string(),
            settle_delay: Duration::from_millis(2000),
        }
    }
}

/// Remove `dir` if it exists and create it empty.
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}

/// Run `<path> -f <format> -o <output_dir>` and wait for it to exit.
///
/// Returns the captured stdout. A spawn failure or a non-zero exit becomes
/// [`Error::ProcessInvocation`] carrying the tool's stderr.
pub fn run_dumper(config: &DumperConfig, output_dir: &Path) -> Result<String> {
    let output = Command::new(&config.path)
        .arg("-f")
        .arg(&config.format)
        .arg("-o")
        .arg(output_dir)
        .output()
        .map_err(|e| Error::ProcessInvocation {
            tool: config.path.clone(),
            reason: format!("failed to spawn: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
        return Err(Error::ProcessInvocation {
            tool: config.path.clone(),
            reason: format!("{}: {}", output.status, stderr),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Give the dumper's writes time to land before scanning.
pub async fn settle(config: &DumperConfig) {
    if !config.settle_delay.is_zero() {
        log::debug!("Waiting {:?} for dumper output", config.settle_delay);
        tokio::time::sleep(config.settle_delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_output_dir_wipes_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("generated");
        fs::create_dir_all(out.join("old")).unwrap();
        fs::write(out.join("old/stale.hpp"), "x").unwrap();

        prepare_output_dir(&out).unwrap();
        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn prepare_output_dir_creates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("a/b");
        prepare_output_dir(&out).unwrap();
        assert!(out.is_dir());
    }

    #[test]
    fn missing_tool_is_invocation_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = DumperConfig {
            path: dir.path().join("no-such-dumper").to_string_lossy().into_owned(),
            ..DumperConfig::default()
        };
        let err = run_dumper(&config, dir.path()).unwrap_err();
        assert!(matches!(err, Error::ProcessInvocation { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_surfaces_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("dumper.sh");
        fs::write(&script, "#!/bin/sh\necho \"bad module: $2\" >&2\nexit 3\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let config = DumperConfig {
            path: script.to_string_lossy().into_owned(),
            ..DumperConfig::default()
        };
        match run_dumper(&config, dir.path()) {
            Err(Error::ProcessInvocation { reason, .. }) => {
                assert!(reason.contains("bad module: hpp"), "reason was {:?}", reason)
            }
            other => panic!("expected invocation error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn successful_run_returns_stdout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("dumper.sh");
        fs::write(
            &script,
            "#!/bin/sh\nprintf 'namespace X {\\n' > \"$4/out.hpp\"\necho dumped\n",
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let config = DumperConfig {
            path: script.to_string_lossy().into_owned(),
            ..DumperConfig::default()
        };
        let stdout = run_dumper(&config, dir.path()).unwrap();
        assert_eq!(stdout.trim(), "dumped");
        assert!(dir.path().join("out.hpp").is_file());
    }
}
