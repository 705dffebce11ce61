//! External tool invocation.
//!
//! Every tool is started from an argument vector; nothing passes through a
//! shell, so URLs and paths are never interpreted.

use std::collections::VecDeque;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use clipper_models::EncodingConfig;

use crate::error::{MediaError, MediaResult};

/// Number of trailing stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set seek position (before input).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Set duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Apply a full encoding profile.
    pub fn encoding(self, encoding: &EncodingConfig) -> Self {
        self.output_args(encoding.to_ffmpeg_args())
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        // Overwrite flag
        if self.overwrite {
            args.push("-y".to_string());
        }

        // Never wait on stdin
        args.push("-nostdin".to_string());

        // Log level
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Input args
        args.extend(self.input_args.clone());

        // Input file
        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        // Output args
        args.extend(self.output_args.clone());

        // Output file
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Result of a finished tool run.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    /// Last lines the tool wrote to stderr.
    pub stderr_tail: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Captured stderr, or `None` when the tool printed nothing.
    pub fn stderr(&self) -> Option<String> {
        if self.stderr_tail.trim().is_empty() {
            None
        } else {
            Some(self.stderr_tail.clone())
        }
    }
}

/// Runner for an external program with a timeout.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    /// Program name or path
    program: PathBuf,
    /// Kill the process after this long
    timeout: Option<Duration>,
}

impl ToolRunner {
    /// Create a new runner.
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: PathBuf::from(program.as_ref()),
            timeout: None,
        }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Locate the program on PATH (or verify an explicit path).
    pub fn check(&self) -> MediaResult<PathBuf> {
        which::which(&self.program).map_err(|_| MediaError::ToolNotFound(self.tool_name()))
    }

    /// Run an FFmpeg command.
    pub async fn run_ffmpeg(&self, cmd: &FfmpegCommand) -> MediaResult<ToolOutput> {
        self.run(cmd.build_args()).await
    }

    /// Run the program with `args` and wait for it to exit.
    ///
    /// A non-zero exit status is not an error here; callers decide what a
    /// failure means for their tool.
    pub async fn run<I, S>(&self, args: I) -> MediaResult<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = self.check()?;
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        debug!(
            tool = %self.tool_name(),
            "Running {} {}",
            program.display(),
            args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" ")
        );

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("stderr not captured"))?;
        let tool = self.tool_name();

        // Drain stderr concurrently so the child never blocks on a full pipe.
        let stderr_handle = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr).lines();
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            while let Ok(Some(line)) = reader.next_line().await {
                debug!(tool = %tool, "{}", line);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Vec::from(tail).join("\n")
        });

        let status = self.wait_for_completion(&mut child).await;
        if status.is_err() {
            stderr_handle.abort();
        }
        let status = status?;
        let stderr_tail = stderr_handle.await.unwrap_or_default();

        Ok(ToolOutput {
            status,
            stderr_tail,
        })
    }

    /// Wait for child process with optional timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<ExitStatus> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait().await?);
        };

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                // Timeout - kill the process
                warn!(tool = %self.tool_name(), "Timed out after {:?}, killing process", timeout);
                let _ = child.kill().await;
                Err(MediaError::Timeout {
                    tool: self.tool_name(),
                    elapsed: timeout,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("input.mp4", "output.mp4")
            .seek(10.0)
            .duration(30.0)
            .video_filter("scale=1080:1920")
            .encoding(&EncodingConfig::default());

        let args = cmd.build_args();
        assert_eq!(&args[..4], &["-y", "-nostdin", "-v", "error"]);

        // Seek goes before the input, duration after it.
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        let t = args.iter().position(|a| a == "-t").unwrap();
        assert!(ss < input && input < t);
        assert_eq!(args[ss + 1], "10.000");
        assert_eq!(args[t + 1], "30.000");

        assert!(args.contains(&"libx264".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("output.mp4"));
    }

    #[test]
    fn test_paths_stay_single_arguments() {
        let cmd = FfmpegCommand::new("in put; rm -rf x.mp4", "out $(id).mp4");
        let args = cmd.build_args();
        assert!(args.contains(&"in put; rm -rf x.mp4".to_string()));
        assert!(args.contains(&"out $(id).mp4".to_string()));
    }

    #[tokio::test]
    async fn test_missing_tool() {
        let err = ToolRunner::new("clipper-no-such-tool-9f2c")
            .run(Vec::<String>::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::ToolNotFound(name) if name == "clipper-no-such-tool-9f2c"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_captures_stderr() {
        let output = ToolRunner::new("ls")
            .run(["/clipper-definitely-missing-dir"])
            .await
            .unwrap();
        assert!(!output.success());
        assert!(output.stderr().is_some());
    }

    #[tokio::test]
    async fn test_success() {
        let output = ToolRunner::new("true").run(Vec::<String>::new()).await.unwrap();
        assert!(output.success());
        assert!(output.stderr().is_none());
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let started = std::time::Instant::now();
        let err = ToolRunner::new("sleep")
            .with_timeout(Duration::from_millis(100))
            .run(["5"])
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
