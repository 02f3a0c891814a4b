use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: u128,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last lines of stderr, the part operators actually read.
    pub fn stderr_tail(&self, lines: usize) -> String {
        let all: Vec<_> = self.stderr.lines().collect();
        all.iter()
            .rev()
            .take(lines)
            .rev()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Stdout and stderr concatenated, for tools that split diagnostics
    /// across both streams (apache2ctl does).
    pub fn combined(&self) -> String {
        let mut text = self.stdout.trim_end().to_string();
        if !self.stderr.trim().is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(self.stderr.trim_end());
        }
        text
    }
}

/// Capability seam for everything that leaves the process. Err means the
/// command could not be run at all (spawn failure, timeout); a non-zero
/// exit is a normal Ok result the caller inspects.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;
}

/// Splits a configured tool spelling ("sudo certbot") and runs it with the
/// step's arguments appended.
pub async fn run_tool(
    runner: &dyn CommandRunner,
    command: &str,
    args: &[&str],
) -> Result<CommandOutput> {
    let mut words = shell_words::split(command)
        .with_context(|| format!("Invalid tool command: {:?}", command))?;
    if words.is_empty() {
        bail!("Empty tool command");
    }
    let program = words.remove(0);
    let mut full_args: Vec<&str> = words.iter().map(|s| s.as_str()).collect();
    full_args.extend_from_slice(args);
    runner.run(&program, &full_args).await
}

pub struct SystemRunner {
    timeout_ms: u64,
}

impl SystemRunner {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let start = Instant::now();

        tracing::debug!("Executing: {} {:?}", program, args);

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn {}", program))?;

        let stdout_handle = child.stdout.take().context("stdout not captured")?;
        let stderr_handle = child.stderr.take().context("stderr not captured")?;

        // Read outputs incrementally to avoid buffer stalls
        let stdout_reader = BufReader::new(stdout_handle);
        let stderr_reader = BufReader::new(stderr_handle);

        // The timeout covers the readers too; they only finish once the
        // child's pipes close.
        let wait_all = async {
            tokio::join!(
                read_lines(stdout_reader),
                read_lines(stderr_reader),
                child.wait()
            )
        };

        let waited = timeout(Duration::from_millis(self.timeout_ms), wait_all).await;

        let (stdout_result, stderr_result, wait_result) = match waited {
            Ok(results) => results,
            Err(_) => {
                let _ = child.kill().await;
                bail!("{} timed out after {}ms", program, self.timeout_ms);
            }
        };

        let status = wait_result.with_context(|| format!("Failed to wait for {}", program))?;

        let output = CommandOutput {
            stdout: stdout_result?,
            stderr: stderr_result?,
            exit_code: status.code().unwrap_or(-1),
            duration_ms: start.elapsed().as_millis(),
        };

        tracing::debug!(
            "{} exited with {} after {}ms",
            program,
            output.exit_code,
            output.duration_ms
        );

        Ok(output)
    }
}

async fn read_lines<R>(reader: BufReader<R>) -> Result<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = Vec::new();
    let mut reader = reader.lines();

    while let Some(line) = reader.next_line().await? {
        lines.push(line);
    }

    Ok(lines.join("\n"))
}
