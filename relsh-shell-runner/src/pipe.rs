//! Pipe-based execution of a single command line with combined output
//! capture.
//!
//! stdout and stderr are drained concurrently on the calling task and
//! appended to one buffer in arrival order. When the capability is not
//! silent each chunk is also echoed to the matching terminal stream.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::executor::{CommandOutput, ShellKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamKind {
    Stdout,
    Stderr,
}

struct OutputChunk {
    stream: StreamKind,
    bytes: Vec<u8>,
}

/// Read from an async reader and forward chunks until EOF.
async fn read_output_stream<R>(
    mut reader: R,
    stream: StreamKind,
    output_tx: mpsc::UnboundedSender<OutputChunk>,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; 8_192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let bytes = buf.get(..n).map(<[u8]>::to_vec).unwrap_or_default();
                if output_tx.send(OutputChunk { stream, bytes }).is_err() {
                    break;
                }
            }
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
}

async fn collect_output(
    mut output_rx: mpsc::UnboundedReceiver<OutputChunk>,
    silent: bool,
) -> Vec<u8> {
    let mut combined = Vec::new();
    let mut stdout = tokio::io::stdout();
    let mut stderr = tokio::io::stderr();

    while let Some(chunk) = output_rx.recv().await {
        if !silent {
            // Echo failures are not fatal; the capture still holds the bytes.
            let _ = match chunk.stream {
                StreamKind::Stdout => stdout.write_all(&chunk.bytes).await,
                StreamKind::Stderr => stderr.write_all(&chunk.bytes).await,
            };
        }
        combined.extend_from_slice(&chunk.bytes);
    }

    if !silent {
        let _ = stdout.flush().await;
        let _ = stderr.flush().await;
    }
    combined
}

/// Run `command_line` through `shell` inside `cwd` and wait for it to exit.
///
/// A non-zero exit is not an error here; it is reported through
/// [`CommandOutput::code`]. Errors are reserved for failures to spawn or
/// wait on the child. A child killed by a signal reports code `-1`.
pub(crate) async fn run_command_line(
    shell: ShellKind,
    cwd: &Path,
    command_line: &str,
    silent: bool,
) -> Result<CommandOutput> {
    let mut command = shell.command(command_line);
    command
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(command = command_line, cwd = %cwd.display(), silent, "spawning command");
    let mut child = command
        .spawn()
        .with_context(|| format!("failed to execute command: {command_line}"))?;

    let stdout = child
        .stdout
        .take()
        .context("child stdout was not captured")?;
    let stderr = child
        .stderr
        .take()
        .context("child stderr was not captured")?;

    let (output_tx, output_rx) = mpsc::unbounded_channel();
    let (_, _, combined) = tokio::join!(
        read_output_stream(stdout, StreamKind::Stdout, output_tx.clone()),
        read_output_stream(stderr, StreamKind::Stderr, output_tx),
        collect_output(output_rx, silent),
    );

    let status = child
        .wait()
        .await
        .with_context(|| format!("failed to wait for command: {command_line}"))?;

    let code = status.code().unwrap_or(-1);
    tracing::debug!(command = command_line, code, "command exited");
    Ok(CommandOutput::new(
        code,
        String::from_utf8_lossy(&combined).into_owned(),
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    #[tokio::test]
    async fn captures_stdout_and_stderr() -> Result<()> {
        let dir = TempDir::new()?;
        let output =
            run_command_line(ShellKind::Unix, dir.path(), "echo out; echo err 1>&2", true).await?;

        assert_eq!(output.code, 0);
        assert!(output.output.contains("out\n"));
        assert!(output.output.contains("err\n"));
        Ok(())
    }

    #[tokio::test]
    async fn reports_non_zero_exit_without_error() -> Result<()> {
        let dir = TempDir::new()?;
        let output = run_command_line(ShellKind::Unix, dir.path(), "echo nope; exit 2", true).await?;

        assert_eq!(output.code, 2);
        assert_eq!(output.output, "nope\n");
        Ok(())
    }

    #[tokio::test]
    async fn runs_inside_requested_directory() -> Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("marker.txt"), "here")?;
        let output = run_command_line(ShellKind::Unix, dir.path(), "cat marker.txt", true).await?;

        assert_eq!(output.output, "here");
        Ok(())
    }
}
