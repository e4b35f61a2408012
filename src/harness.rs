//! Subprocess lifecycle for backend executions.
//!
//! One harness invocation owns exactly one external process: spawn, deliver
//! the stdin payload, stream stdout/stderr chunks to the caller as they
//! arrive, enforce a timeout, and report the outcome. Which agent tool runs
//! is the backend layer's concern; the harness is tool-agnostic.
//!
//! Both output pipes are drained by dedicated reader threads feeding a
//! channel the calling thread consumes, so a child that writes faster than
//! the caller processes can never stall on a full pipe buffer. On timeout
//! the child gets SIGTERM, a grace period, then SIGKILL, and the harness
//! waits for it: when `run` returns, the process is no longer running.
//!
//! Invocations share nothing but an immutable baseline environment snapshot,
//! captured once per process. Each child's environment is built fresh from
//! that snapshot plus the request's overrides; the live process environment
//! is never mutated.

use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::LazyLock;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Baseline environment snapshot shared by all invocations.
static BASELINE_ENV: LazyLock<Vec<(OsString, OsString)>> =
    LazyLock::new(|| std::env::vars_os().collect());

/// Grace period between SIGTERM and SIGKILL on timeout.
const TERM_GRACE: Duration = Duration::from_secs(2);

/// How often the run loop checks the deadline and exit status.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

const READ_CHUNK_BYTES: usize = 8192;

/// Which pipe a chunk arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

/// One subprocess invocation.
#[derive(Debug)]
pub struct HarnessRequest<'a> {
    /// Command name, resolved via PATH.
    pub program: &'a str,
    /// Argument vector.
    pub args: &'a [String],
    /// Working directory for the child.
    pub cwd: &'a Path,
    /// Environment overrides applied on top of the baseline snapshot.
    pub env: &'a [(String, String)],
    /// Payload written to the child's stdin, which is then closed.
    /// `None` gives the child a null stdin.
    pub stdin: Option<&'a str>,
    /// Wall-clock limit before the child is terminated.
    pub timeout: Duration,
}

/// Outcome of a completed invocation.
#[derive(Debug, Clone)]
pub struct HarnessOutcome {
    /// Exit code, when the child exited normally.
    pub exit_code: Option<i32>,
    /// Whether the child was terminated because the timeout elapsed.
    pub timed_out: bool,
    /// Wall-clock duration of the invocation.
    pub duration: Duration,
}

impl HarnessOutcome {
    /// True for a clean zero exit within the timeout.
    pub fn is_success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Errors raised before the child produced an outcome.
///
/// These are the only harness failures; once the child is running, every
/// ending (exit, timeout, kill) is reported through [`HarnessOutcome`].
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The command could not be started at all.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A pipe handle was unexpectedly unavailable.
    #[error("stream setup failed: {0}")]
    Stream(String),
}

/// Run one subprocess to completion, streaming output chunks to `on_chunk`
/// in production order as they arrive.
pub fn run(
    req: &HarnessRequest<'_>,
    on_chunk: &mut dyn FnMut(StreamSource, &str),
) -> Result<HarnessOutcome, HarnessError> {
    let start = Instant::now();
    let deadline = start + req.timeout;

    let mut cmd = Command::new(req.program);
    cmd.args(req.args)
        .current_dir(req.cwd)
        .stdin(if req.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    cmd.env_clear();
    for (key, value) in BASELINE_ENV.iter() {
        cmd.env(key, value);
    }
    for (key, value) in req.env {
        cmd.env(key, value);
    }

    let mut child = cmd.spawn().map_err(|source| HarnessError::Spawn {
        program: req.program.to_string(),
        source,
    })?;

    // Write the payload from its own thread: a large prompt can exceed the
    // pipe buffer before the child starts reading. Dropping the handle
    // closes the child's stdin. EPIPE means the child exited early; fine.
    let stdin_writer = match req.stdin {
        Some(payload) => {
            let mut pipe = child
                .stdin
                .take()
                .ok_or_else(|| HarnessError::Stream("stdin was not piped".to_string()))?;
            let payload = payload.to_string();
            Some(thread::spawn(move || {
                let _ = pipe.write_all(payload.as_bytes());
            }))
        }
        None => None,
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| HarnessError::Stream("stdout was not piped".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| HarnessError::Stream("stderr was not piped".to_string()))?;

    let (tx, rx) = mpsc::channel::<(StreamSource, String)>();
    let stderr_tx = tx.clone();
    let stdout_reader = thread::spawn(move || pump(stdout, StreamSource::Stdout, tx));
    let stderr_reader = thread::spawn(move || pump(stderr, StreamSource::Stderr, stderr_tx));

    // Stream until both pipes reach EOF or the deadline passes.
    let mut timed_out = false;
    loop {
        let now = Instant::now();
        if now >= deadline {
            timed_out = true;
            break;
        }
        match rx.recv_timeout(POLL_INTERVAL.min(deadline - now)) {
            Ok((source, chunk)) => on_chunk(source, &chunk),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let exit_code = if timed_out {
        terminate(&mut child);
        None
    } else {
        // Pipes are closed; the child has exited or is about to. A child
        // that closes its pipes and then hangs still hits the deadline.
        match wait_until(&mut child, deadline) {
            Some(status) => status.code(),
            None => {
                timed_out = true;
                terminate(&mut child);
                None
            }
        }
    };

    // The child is confirmed down. Forward whatever the readers delivered
    // after the loop broke, so no produced chunk is dropped. The bounded
    // drain only matters on the kill path; after a normal exit the channel
    // already disconnected with nothing buffered.
    if timed_out {
        drain(&rx, on_chunk);
    } else {
        for (source, chunk) in rx.try_iter() {
            on_chunk(source, &chunk);
        }
    }
    drop(stdout_reader);
    drop(stderr_reader);
    if let Some(writer) = stdin_writer {
        drop(writer);
    }

    Ok(HarnessOutcome {
        exit_code,
        timed_out,
        duration: start.elapsed(),
    })
}

/// Forward buffered chunks until the channel stays quiet or disconnects.
///
/// Bounded rather than a join: a grandchild that inherited the pipes can
/// keep a reader thread alive past the kill, and the harness must return.
fn drain(rx: &mpsc::Receiver<(StreamSource, String)>, on_chunk: &mut dyn FnMut(StreamSource, &str)) {
    let stop_at = Instant::now() + Duration::from_secs(2);
    while Instant::now() < stop_at {
        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok((source, chunk)) => on_chunk(source, &chunk),
            Err(_) => return,
        }
    }
}

/// Poll for exit until the deadline. `None` means still running.
fn wait_until(child: &mut Child, deadline: Instant) -> Option<ExitStatus> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    return None;
                }
                thread::sleep(POLL_INTERVAL);
            }
            // Status unavailable: fall through to termination, which waits.
            Err(_) => return None,
        }
    }
}

/// Stop the child and wait for it, so the process is confirmed gone before
/// the harness returns.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        // SIGTERM first so the agent CLI can flush its final output.
        unsafe {
            libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
        }
        let grace_deadline = Instant::now() + TERM_GRACE;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) => {
                    if Instant::now() >= grace_deadline {
                        break;
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(_) => break,
            }
        }
    }

    // SIGKILL on Unix; TerminateProcess on Windows.
    let _ = child.kill();
    let _ = child.wait();
}

/// Read a pipe to EOF, forwarding each chunk over the channel.
fn pump<R: Read>(mut reader: R, source: StreamSource, tx: mpsc::Sender<(StreamSource, String)>) {
    let mut buf = [0u8; READ_CHUNK_BYTES];
    loop {
        match reader.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                if tx.send((source, chunk)).is_err() {
                    break;
                }
            }
        }
    }
}
