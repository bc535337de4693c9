//! Running external converter programs.
//!
//! Every converter shells out through [`ToolRun::run`], so spawn failures,
//! non-zero exits and hangs all surface as the same [`FileError`] variants
//! regardless of which program was involved.

use crate::error::FileError;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Keep at most this many characters of a tool's stderr in error messages.
const STDERR_TAIL_CHARS: usize = 2000;

/// One external program invocation on behalf of a single file.
#[derive(Debug)]
pub struct ToolRun<'a> {
    /// Short tool name used in messages (`soffice`, `pandoc`, …).
    pub tool: &'a str,
    /// Executable to spawn.
    pub program: &'a Path,
    /// The user-facing name of the file being converted.
    pub filename: &'a str,
    /// Kill the child and fail after this long.
    pub timeout: Duration,
}

impl ToolRun<'_> {
    /// Spawn the program with `args` and wait for it.
    ///
    /// stdin is closed, stdout and stderr are captured, and the child is
    /// killed if the timeout fires (`kill_on_drop`).
    pub async fn run<I, S>(&self, args: I) -> Result<(), FileError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        debug!("{}: {:?}", self.tool, cmd.as_std());

        let start = Instant::now();
        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FileError::ToolMissing {
                    filename: self.filename.to_string(),
                    tool: self.tool.to_string(),
                }
            } else {
                FileError::ToolFailed {
                    filename: self.filename.to_string(),
                    tool: self.tool.to_string(),
                    status: "not started".to_string(),
                    stderr: e.to_string(),
                }
            }
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| FileError::ToolFailed {
                filename: self.filename.to_string(),
                tool: self.tool.to_string(),
                status: "unknown".to_string(),
                stderr: e.to_string(),
            })?,
            Err(_) => {
                return Err(FileError::Timeout {
                    filename: self.filename.to_string(),
                    tool: self.tool.to_string(),
                    secs: self.timeout.as_secs(),
                })
            }
        };

        debug!(
            "{} finished for {} in {}ms ({})",
            self.tool,
            self.filename,
            start.elapsed().as_millis(),
            output.status
        );

        if !output.status.success() {
            return Err(FileError::ToolFailed {
                filename: self.filename.to_string(),
                tool: self.tool.to_string(),
                status: output.status.to_string(),
                stderr: stderr_tail(&output.stderr),
            });
        }
        Ok(())
    }

    /// Confirm the tool left its output where expected.
    pub async fn expect_output(&self, path: &Path) -> Result<(), FileError> {
        match tokio::fs::metadata(path).await {
            Ok(m) if m.is_file() => Ok(()),
            _ => Err(FileError::OutputMissing {
                filename: self.filename.to_string(),
                tool: self.tool.to_string(),
                expected: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            }),
        }
    }
}

/// The trimmed end of a tool's stderr, where the actual error usually is.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - STDERR_TAIL_CHARS).collect();
    format!("\u{2026}{tail}")
}
