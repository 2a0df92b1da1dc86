//! Tokenizer subprocess launcher.
//!
//! Spawns `<interpreter> <script> <text>` with the script and text as two
//! separate argv entries, then exposes stdout as an [`OutputLineStream`].
//! A reader thread drains stdout into a channel so the child never blocks on
//! a full pipe, and every read is bounded by a deadline fixed at spawn time.

use std::ffi::OsStr;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::LauncherConfig;
use crate::decoder;
use crate::error::{LaunchError, TokenizeResult};

/// How often the stream and `finish` poll the child for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long a pipe may stay quiet after the child exits before it is treated
/// as closed.
pub const EXIT_DRAIN_GRACE: Duration = Duration::from_millis(200);

/// A single tokenizer invocation. Built fresh per call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    interpreter: PathBuf,
    script_path: PathBuf,
    input_text: String,
}

impl InvocationRequest {
    pub fn new(
        interpreter: impl Into<PathBuf>,
        script_path: impl Into<PathBuf>,
        input_text: impl Into<String>,
    ) -> Self {
        Self {
            interpreter: interpreter.into(),
            script_path: script_path.into(),
            input_text: input_text.into(),
        }
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    /// Returns the argument vector passed to the interpreter.
    pub fn args(&self) -> [&OsStr; 2] {
        [self.script_path.as_os_str(), OsStr::new(&self.input_text)]
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.interpreter);
        cmd.args(self.args());
        cmd
    }
}

/// Exit status and captured stderr of a finished tokenizer process.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub status: ExitStatus,
    pub stderr: String,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or -1 when the process was killed by a signal.
    pub fn exit_code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

/// Lines written to stdout by a running tokenizer process.
///
/// Owns the child process. The child is reaped by [`finish`](Self::finish),
/// on deadline expiry, or on drop, whichever comes first.
///
/// The script may leave a background process holding stdout or stderr open
/// after it exits. Once the child has exited, a pipe that stays quiet for
/// [`EXIT_DRAIN_GRACE`] counts as closed, so the call returns without waiting
/// for that process. Its reader thread is left to end when the pipe closes.
#[derive(Debug)]
pub struct OutputLineStream {
    child: Child,
    lines: Receiver<std::io::Result<String>>,
    stderr: Option<Receiver<Vec<u8>>>,
    readers: Vec<JoinHandle<()>>,
    deadline: Option<Instant>,
    timeout: Duration,
    status: Option<ExitStatus>,
    last_activity: Instant,
    exhausted: bool,
    timed_out: bool,
    reaped: bool,
}

impl OutputLineStream {
    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn timeout_error(&self) -> LaunchError {
        LaunchError::Timeout {
            timeout_ms: self.timeout_ms(),
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Time to block on a pipe before re-checking the deadline and the child.
    fn next_wait(&self, slice: Duration) -> Duration {
        match self.deadline {
            Some(deadline) => slice.min(deadline.saturating_duration_since(Instant::now())),
            None => slice,
        }
    }

    fn kill(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.reaped = true;
    }

    /// Returns true once the child has exited, recording its status.
    fn poll_exit(&mut self) -> std::io::Result<bool> {
        if self.status.is_some() {
            return Ok(true);
        }
        match self.child.try_wait()? {
            Some(status) => {
                self.status = Some(status);
                self.reaped = true;
                self.last_activity = Instant::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Collects stderr until it closes, goes quiet for the grace period, or
    /// the deadline passes.
    fn drain_stderr(&mut self) -> String {
        let Some(rx) = self.stderr.take() else {
            return String::new();
        };

        let mut buf = Vec::new();
        loop {
            let wait = self.next_wait(EXIT_DRAIN_GRACE);
            match rx.recv_timeout(wait) {
                Ok(chunk) => buf.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    tracing::debug!("tokenizer stderr still held open after exit");
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn release_readers(&mut self) {
        for handle in self.readers.drain(..) {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                tracing::debug!("output pipe held by a background process; detaching reader");
            }
        }
    }

    /// Waits for the process to exit and reaps it.
    ///
    /// Shares the deadline with line reads; a process that outlives it is
    /// killed and reported as [`LaunchError::Timeout`].
    pub fn finish(mut self) -> Result<ProcessOutcome, LaunchError> {
        if self.timed_out {
            return Err(self.timeout_error());
        }

        loop {
            match self.poll_exit() {
                Ok(true) => break,
                Ok(false) => {
                    if self.deadline_passed() {
                        self.kill();
                        return Err(self.timeout_error());
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    self.kill();
                    return Err(LaunchError::WaitFailed(e));
                }
            }
        }
        let Some(status) = self.status else {
            return Err(LaunchError::WaitFailed(std::io::Error::other(
                "exit status missing after wait",
            )));
        };

        let stderr = self.drain_stderr();
        self.release_readers();

        tracing::debug!(code = ?status.code(), "tokenizer process exited");
        Ok(ProcessOutcome { status, stderr })
    }
}

impl Iterator for OutputLineStream {
    type Item = Result<String, LaunchError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted {
            match self.lines.recv_timeout(self.next_wait(POLL_INTERVAL)) {
                Ok(Ok(line)) => {
                    self.last_activity = Instant::now();
                    return Some(Ok(line));
                }
                Ok(Err(e)) => {
                    self.exhausted = true;
                    return Some(Err(LaunchError::ReadOutput(e)));
                }
                Err(RecvTimeoutError::Disconnected) => self.exhausted = true,
                Err(RecvTimeoutError::Timeout) => {
                    if self.deadline_passed() {
                        self.exhausted = true;
                        self.timed_out = true;
                        self.kill();
                        tracing::warn!(timeout_ms = self.timeout_ms(), "tokenizer timed out");
                        return Some(Err(self.timeout_error()));
                    }
                    match self.poll_exit() {
                        Ok(true) if self.last_activity.elapsed() >= EXIT_DRAIN_GRACE => {
                            tracing::debug!("tokenizer stdout still held open after exit");
                            self.exhausted = true;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            self.exhausted = true;
                            self.kill();
                            return Some(Err(LaunchError::WaitFailed(e)));
                        }
                    }
                }
            }
        }
        None
    }
}

impl Drop for OutputLineStream {
    fn drop(&mut self) {
        if !self.reaped {
            self.kill();
        }
    }
}

/// The tokenizer subprocess launcher.
#[derive(Debug, Clone, Default)]
pub struct Launcher {
    config: LauncherConfig,
}

impl Launcher {
    /// Creates a new launcher with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new launcher with the given configuration.
    pub fn with_config(config: LauncherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Builds a request using the configured interpreter.
    pub fn request(
        &self,
        script_path: impl Into<PathBuf>,
        input_text: impl Into<String>,
    ) -> Result<InvocationRequest, LaunchError> {
        let interpreter = self.config.resolve_interpreter()?;
        Ok(InvocationRequest::new(interpreter, script_path, input_text))
    }

    /// Starts the tokenizer process and returns its stdout lines.
    pub fn invoke(&self, request: &InvocationRequest) -> Result<OutputLineStream, LaunchError> {
        if !request.script_path().is_file() {
            return Err(LaunchError::ScriptNotFound {
                path: request.script_path().to_path_buf(),
            });
        }

        let mut cmd = request.command();
        cmd.stdin(Stdio::null()).stdout(Stdio::piped());
        if self.config.capture_stderr {
            cmd.stderr(Stdio::piped());
        } else {
            cmd.stderr(Stdio::inherit());
        }

        tracing::debug!(
            interpreter = %request.interpreter().display(),
            script = %request.script_path().display(),
            input_bytes = request.input_text().len(),
            "spawning tokenizer"
        );

        let timeout = self.config.timeout_duration();
        let mut child = cmd.spawn().map_err(LaunchError::SpawnFailed)?;
        let deadline = Instant::now().checked_add(timeout);

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(LaunchError::SpawnFailed(std::io::Error::other(
                "stdout was not captured",
            )));
        };

        let (tx, rx) = mpsc::channel();
        let stdout_reader = thread::Builder::new()
            .name("botok-stdout".to_string())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let failed = line.is_err();
                    if tx.send(line).is_err() || failed {
                        break;
                    }
                }
            });
        let mut readers = match stdout_reader {
            Ok(handle) => vec![handle],
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(LaunchError::SpawnFailed(e));
            }
        };

        let stderr = child.stderr.take().and_then(|mut pipe| {
            let (tx, rx) = mpsc::channel();
            let handle = thread::Builder::new()
                .name("botok-stderr".to_string())
                .spawn(move || {
                    let mut chunk = [0u8; 4096];
                    loop {
                        match pipe.read(&mut chunk) {
                            Ok(0) | Err(_) => break,
                            Ok(n) => {
                                if tx.send(chunk[..n].to_vec()).is_err() {
                                    break;
                                }
                            }
                        }
                    }
                })
                .ok()?;
            readers.push(handle);
            Some(rx)
        });

        Ok(OutputLineStream {
            child,
            lines: rx,
            stderr,
            readers,
            deadline,
            timeout,
            status: None,
            last_activity: Instant::now(),
            exhausted: false,
            timed_out: false,
            reaped: false,
        })
    }

    /// Runs a request to completion: spawn, decode stdout, reap.
    ///
    /// A non-zero exit takes precedence over whatever the decoder made of the
    /// output.
    pub fn run(&self, request: &InvocationRequest) -> TokenizeResult<String> {
        let mut stream = self.invoke(request)?;
        let decoded = decoder::decode_with_limit(stream.by_ref(), self.config.max_payload_bytes);
        let outcome = stream.finish()?;

        if !outcome.success() {
            tracing::warn!(
                code = outcome.exit_code(),
                stderr = %outcome.stderr.trim(),
                "tokenizer exited with failure"
            );
            return Err(LaunchError::process_failed(outcome.exit_code(), outcome.stderr).into());
        }
        if !outcome.stderr.trim().is_empty() {
            tracing::debug!(stderr = %outcome.stderr.trim(), "tokenizer stderr");
        }

        decoded
    }
}

/// Starts `script_path` with the default configuration.
pub fn invoke(
    script_path: impl Into<PathBuf>,
    input_text: impl Into<String>,
) -> Result<OutputLineStream, LaunchError> {
    let launcher = Launcher::new();
    let request = launcher.request(script_path, input_text)?;
    launcher.invoke(&request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_args_are_separate() {
        let request = InvocationRequest::new("python3", "/p/pythonScripts/temp.py", "a b; rm -rf /");
        let args = request.args();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], OsStr::new("/p/pythonScripts/temp.py"));
        assert_eq!(args[1], OsStr::new("a b; rm -rf /"));
    }

    #[test]
    fn test_command_program() {
        let request = InvocationRequest::new("python3", "tok.py", "བཀྲ་ཤིས");
        let cmd = request.command();
        assert_eq!(cmd.get_program(), OsStr::new("python3"));
        let args: Vec<&OsStr> = cmd.get_args().collect();
        assert_eq!(args, vec![OsStr::new("tok.py"), OsStr::new("བཀྲ་ཤིས")]);
    }

    #[test]
    fn test_missing_script() {
        let launcher = Launcher::new();
        let request = InvocationRequest::new("python3", "/nonexistent/botok/temp.py", "text");
        assert!(matches!(
            launcher.invoke(&request),
            Err(LaunchError::ScriptNotFound { .. })
        ));
    }
}
