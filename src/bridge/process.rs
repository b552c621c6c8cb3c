//! One-shot subprocess transport: spawn the engine, write the request to its
//! stdin, enforce a hard timeout, and classify every way the exchange can
//! fail.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::CausalConfig;
use crate::errors::BridgeError;
use crate::protocol::{self, EngineRequest};

use super::EngineTransport;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Spawns the external engine once per call. No persistent server: the
/// request goes to the child's stdin, the response comes back on stdout, and
/// the process must exit within the timeout.
#[derive(Debug)]
pub struct ProcessBridge {
    engine_path: PathBuf,
    engine_args: Vec<String>,
    max_stderr_len: usize,
}

impl ProcessBridge {
    pub fn new(config: &CausalConfig) -> Self {
        Self {
            engine_path: config.engine_path.clone(),
            engine_args: config.engine_args.clone(),
            max_stderr_len: config.max_stderr_len,
        }
    }

    pub fn engine_path(&self) -> &Path {
        &self.engine_path
    }

    /// Whether the engine executable is present on disk.
    pub fn engine_available(&self) -> bool {
        self.engine_path.exists()
    }
}

impl EngineTransport for ProcessBridge {
    fn call(
        &self,
        request: &EngineRequest,
        timeout: Duration,
    ) -> Result<serde_json::Value, BridgeError> {
        if !self.engine_available() {
            return Err(BridgeError::EngineNotFound {
                path: self.engine_path.display().to_string(),
                guidance: "install the causal engine and point `engine_path` at its executable"
                    .into(),
            });
        }

        let encoded = protocol::encode_request(request)?;
        let start = Instant::now();

        let mut child = Command::new(&self.engine_path)
            .args(&self.engine_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // A write failure usually means the child died early; classification
        // by exit code below takes precedence.
        let write_result = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(encoded.as_bytes()),
            None => Err(std::io::Error::other("child stdin not captured")),
        };

        // Drain stdout/stderr on reader threads so a chatty child cannot
        // deadlock against a full pipe while we wait on it.
        let stdout_handle = spawn_reader(child.stdout.take());
        let stderr_handle = spawn_reader(child.stderr.take());

        let status = wait_with_deadline(&mut child, start, timeout)?;
        let stdout = join_capture(stdout_handle);
        let stderr = join_capture(stderr_handle);

        if !status.success() {
            let exit_code = status.code().unwrap_or(-1);
            let stderr = truncate_capture(&stderr, self.max_stderr_len);
            warn!("engine exited with code {exit_code}");
            return Err(BridgeError::Crash { exit_code, stderr });
        }

        if let Err(e) = write_result {
            return Err(BridgeError::Protocol {
                reason: format!("request write failed: {e}"),
            });
        }

        debug!(
            "engine call completed in {}ms ({} response bytes)",
            start.elapsed().as_millis(),
            stdout.len()
        );
        protocol::decode_envelope(&String::from_utf8_lossy(&stdout))
    }
}

/// Poll `try_wait` against the deadline; on timeout kill the child and
/// report elapsed vs. configured time.
fn wait_with_deadline(
    child: &mut Child,
    start: Instant,
    timeout: Duration,
) -> Result<std::process::ExitStatus, BridgeError> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(BridgeError::Timeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
                limit_ms: timeout.as_millis() as u64,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn spawn_reader<R: Read + Send + 'static>(stream: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    stream.map(|mut stream| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = stream.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_capture(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Bound captured stderr for error payloads and logs.
fn truncate_capture(bytes: &[u8], max_len: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.len() <= max_len {
        return trimmed.to_string();
    }
    let mut end = max_len;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}... ({} bytes truncated)",
        &trimmed[..end],
        trimmed.len() - end
    )
}
