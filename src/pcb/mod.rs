//! The Process Control Block: a per-child supervisor owning one spawned
//! process, its two capture files, its log read cursors, and the background
//! task that watches for natural exit.
//!
//! Grounded in the teacher's `process_manager::SupervisedChild` (lock-guarded
//! child handle, kill-then-reap sequence, background monitor) generalized to
//! the PCB state machine in `spec.md` §4.1, and in
//! `original_source/sandbox/pcb.py` for the exact cursor/tail/stats
//! semantics the distillation summarized.

pub mod stats;

use crate::error::{PcbError, PcbResult};
use crate::timestamp::current_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Graceful-termination timeout, `spec.md` §4.1.
pub const TERM_TIMEOUT: Duration = Duration::from_millis(2000);
/// Forced-termination timeout, `spec.md` §4.1.
pub const KILL_TIMEOUT: Duration = Duration::from_millis(1000);
/// Valid range for `lines` parameters, `spec.md` §4.1.
pub const MAX_LOG_LINES: usize = 100;
pub const MIN_LOG_LINES: usize = 1;
pub const DEFAULT_LOG_LINES: usize = 10;

const UNKNOWN_EXIT_CODE: i32 = -999;
const KILL_EXIT_CODE: i32 = -9;

const MONITOR_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Wire-form process status, `spec.md` §6 "Status enumeration".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Initializing,
    Running,
    FinishedOk,
    FinishedError,
    Terminating,
    Terminated,
    ErrorStart,
    ErrorTerminate,
    Unknown,
}

impl ProcessStatus {
    /// Terminal states are absorbing: once reached, no later operation
    /// mutates `status` again (`spec.md` §4.1, testable property 1).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProcessStatus::FinishedOk
                | ProcessStatus::FinishedError
                | ProcessStatus::Terminated
                | ProcessStatus::ErrorStart
                | ProcessStatus::ErrorTerminate
                | ProcessStatus::Unknown
        )
    }
}

/// Outcome of a `send_stdin` call, distinguishing "process can't take stdin
/// right now" from "the child actively closed the pipe on us" per
/// `spec.md` §7 (`StdinUnavailable` vs `StdinPipeBroken`), while still
/// surfacing both as a plain `{success, error}` pair to HTTP callers.
#[derive(Debug, Clone)]
pub struct StdinOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl StdinOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn unavailable(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
        }
    }

    fn pipe_broken(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
        }
    }
}

/// Snapshot returned by `get_stats`, `spec.md` §6 `ProcessStats`.
#[derive(Debug, Clone)]
pub struct ProcessSnapshot {
    pub identifier: String,
    pub pid: Option<u32>,
    pub status: ProcessStatus,
    pub cpu_percent: Option<f64>,
    pub memory_rss_bytes: Option<u64>,
    pub memory_vms_bytes: Option<u64>,
    pub num_threads: Option<i64>,
    pub create_time: u64,
    pub psutil_status: Option<String>,
    pub error: Option<String>,
}

/// Summary row returned by `Registry::list`, `spec.md` §6 `RunInfo`.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub identifier: String,
    pub command_str: String,
    pub env: Option<HashMap<String, String>>,
    pub start_time: u64,
    pub end_time: Option<u64>,
    pub status: ProcessStatus,
}

struct Inner {
    identifier: String,
    run_id: String,
    command_str: String,
    custom_env: Option<HashMap<String, String>>,
    cwd: Option<PathBuf>,
    status: ProcessStatus,
    pid: Option<u32>,
    exit_code: Option<i32>,
    start_time: u64,
    end_time: Option<u64>,
    stdout_log_path: Option<PathBuf>,
    stderr_log_path: Option<PathBuf>,
    stdout_offset: u64,
    stderr_offset: u64,
    child: Option<Child>,
    monitor_handle: Option<JoinHandle<()>>,
}

/// A cheaply-clonable handle to one supervised child process. Every
/// operation acquires the same internal mutex, matching the single
/// exclusion primitive per PCB instance required by `spec.md` §4.1 and §5.
#[derive(Clone)]
pub struct Pcb {
    inner: Arc<Mutex<Inner>>,
    log_dir: PathBuf,
}

impl Pcb {
    pub fn new(
        identifier: String,
        command_str: String,
        custom_env: Option<HashMap<String, String>>,
        cwd: Option<String>,
        log_dir: PathBuf,
    ) -> Self {
        let run_id = ulid::Ulid::new().to_string().to_lowercase();
        let now = current_timestamp();
        let inner = Inner {
            identifier,
            run_id,
            command_str,
            custom_env,
            cwd: cwd.map(PathBuf::from),
            status: ProcessStatus::Initializing,
            pid: None,
            exit_code: None,
            start_time: now,
            end_time: None,
            stdout_log_path: None,
            stderr_log_path: None,
            stdout_offset: 0,
            stderr_offset: 0,
            child: None,
            monitor_handle: None,
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            log_dir,
        }
    }

    pub async fn identifier(&self) -> String {
        self.inner.lock().await.identifier.clone()
    }

    pub async fn pid(&self) -> Option<u32> {
        self.inner.lock().await.pid
    }

    /// Starts the child process. A second call is a documented no-op
    /// (`spec.md` §4.1 `start()`), logged and returned without effect.
    pub async fn start(&self) -> PcbResult<()> {
        let mut guard = self.inner.lock().await;
        if guard.status != ProcessStatus::Initializing {
            tracing::warn!(
                identifier = %guard.identifier,
                status = ?guard.status,
                "start() called on a PCB that already started; ignoring"
            );
            return Ok(());
        }

        match self.do_start(&mut guard).await {
            Ok(()) => Ok(()),
            Err(e) => {
                guard.status = ProcessStatus::ErrorStart;
                guard.end_time = Some(current_timestamp());
                tracing::error!(identifier = %guard.identifier, error = %e, "process failed to start");
                Err(e)
            }
        }
    }

    async fn do_start(&self, guard: &mut Inner) -> PcbResult<()> {
        tokio::fs::create_dir_all(&self.log_dir)
            .await
            .map_err(|e| PcbError::SpawnFailed(format!("could not create log directory: {e}")))?;

        let tokens = shell_words::split(&guard.command_str)
            .map_err(|e| PcbError::SpawnFailed(format!("could not tokenize command: {e}")))?;
        let Some((program, args)) = tokens.split_first() else {
            return Err(PcbError::SpawnFailed(
                "command string resulted in an empty token list".to_string(),
            ));
        };

        let stdout_path = self.log_dir.join(format!(
            "{}_{}_stdout.log",
            guard.identifier, guard.run_id
        ));
        let stderr_path = self.log_dir.join(format!(
            "{}_{}_stderr.log",
            guard.identifier, guard.run_id
        ));
        let summary_path = self
            .log_dir
            .join(format!("{}_{}.log", guard.identifier, guard.run_id));

        let stdout_file = open_append(&stdout_path).await?;
        let stderr_file = open_append(&stderr_path).await?;

        let mut command = Command::new(program);
        command.args(args);
        command.stdin(Stdio::piped());
        command.stdout(Stdio::from(stdout_file));
        command.stderr(Stdio::from(stderr_file));
        if let Some(cwd) = &guard.cwd {
            command.current_dir(cwd);
        }
        if let Some(env) = &guard.custom_env {
            // `Command` inherits the parent environment by default; adding
            // keys here merges caller overrides onto it instead of
            // replacing it (spec.md §4.1 step 3: "caller keys win").
            command.envs(env);
        }
        command.kill_on_drop(false);

        let mut child = command
            .spawn()
            .map_err(|e| PcbError::SpawnFailed(e.to_string()))?;
        let pid = child
            .id()
            .ok_or_else(|| PcbError::SpawnFailed("spawned process has no pid".to_string()))?;

        write_summary_log(
            &summary_path,
            &guard.command_str,
            &stdout_path,
            &stderr_path,
        )
        .await
        .map_err(|e| PcbError::SpawnFailed(format!("failed writing summary log: {e}")))?;

        guard.pid = Some(pid);
        guard.start_time = current_timestamp();
        guard.stdout_log_path = Some(stdout_path);
        guard.stderr_log_path = Some(stderr_path);
        guard.stdout_offset = 0;
        guard.stderr_offset = 0;
        guard.status = ProcessStatus::Running;

        let monitor_inner = self.inner.clone();
        let handle = tokio::spawn(Self::monitor_loop(monitor_inner));
        guard.monitor_handle = Some(handle);
        guard.child = Some(child);

        tracing::info!(identifier = %guard.identifier, pid, command = %guard.command_str, "process started");
        Ok(())
    }

    /// Background task awaiting child exit, polling instead of blocking so
    /// it never starves `kill()` of the lock (`spec.md` §5: "sleeping
    /// between status polls inside composite operations" is an explicitly
    /// sanctioned suspension point).
    async fn monitor_loop(inner: Arc<Mutex<Inner>>) {
        loop {
            tokio::time::sleep(MONITOR_POLL_INTERVAL).await;
            let mut guard = inner.lock().await;
            if guard.status.is_terminal() || guard.status == ProcessStatus::Terminating {
                // A concurrent kill() already won the race; leave status alone.
                return;
            }
            let Some(child) = guard.child.as_mut() else {
                return;
            };
            match child.try_wait() {
                Ok(Some(exit_status)) => {
                    let code = exit_status.code().unwrap_or(UNKNOWN_EXIT_CODE);
                    guard.exit_code = Some(code);
                    guard.end_time = Some(current_timestamp());
                    guard.status = if code == 0 {
                        ProcessStatus::FinishedOk
                    } else {
                        ProcessStatus::FinishedError
                    };
                    guard.monitor_handle = None;
                    tracing::info!(identifier = %guard.identifier, code, "process finished naturally");
                    return;
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(identifier = %guard.identifier, error = %e, "lost track of child process");
                    guard.status = ProcessStatus::Unknown;
                    guard.end_time = Some(current_timestamp());
                    guard.monitor_handle = None;
                    return;
                }
            }
        }
    }

    /// Graceful-then-forced termination, `spec.md` §4.1 `kill()`. No-op if
    /// the PCB is already terminal. Re-syncs against a natural exit the
    /// monitor hasn't caught up to yet before doing anything else: if the
    /// child already exited, this reports the real `finished_ok`/
    /// `finished_error` status instead of clobbering it with `terminated`.
    pub async fn kill(&self) -> PcbResult<()> {
        let mut guard = self.inner.lock().await;
        sync_exit_locked(&mut guard);
        if guard.status.is_terminal() {
            return Ok(());
        }

        guard.status = ProcessStatus::Terminating;
        let pid = guard.pid;

        let exit_code = if let (Some(pid), Some(child)) = (pid, guard.child.as_mut()) {
            send_signal(pid, nix::sys::signal::Signal::SIGTERM);
            match wait_with_timeout(child, TERM_TIMEOUT).await {
                Some(code) => Some(code),
                None => {
                    send_signal(pid, nix::sys::signal::Signal::SIGKILL);
                    match wait_with_timeout(child, KILL_TIMEOUT).await {
                        Some(code) => Some(code),
                        None => Some(KILL_EXIT_CODE),
                    }
                }
            }
        } else {
            Some(UNKNOWN_EXIT_CODE)
        };

        guard.exit_code = exit_code;
        guard.end_time = Some(current_timestamp());
        guard.status = ProcessStatus::Terminated;
        if let Some(handle) = guard.monitor_handle.take() {
            handle.abort();
        }
        tracing::info!(identifier = %guard.identifier, exit_code = ?guard.exit_code, "kill sequence completed");
        Ok(())
    }

    /// Appends `data` to the child's stdin, adding a trailing newline if
    /// absent (`spec.md` §4.1 `send_stdin`).
    pub async fn send_stdin(&self, data: &str) -> StdinOutcome {
        let mut guard = self.inner.lock().await;
        if guard.status != ProcessStatus::Running {
            return StdinOutcome::unavailable(format!(
                "process is not running (status: {:?})",
                guard.status
            ));
        }
        let Some(child) = guard.child.as_mut() else {
            return StdinOutcome::unavailable("no child process to write to");
        };
        let Some(stdin) = child.stdin.as_mut() else {
            return StdinOutcome::unavailable("stdin is not available for this process");
        };

        let mut payload = data.to_string();
        if !payload.ends_with('\n') {
            payload.push('\n');
        }

        match stdin.write_all(payload.as_bytes()).await {
            Ok(()) => match stdin.flush().await {
                Ok(()) => StdinOutcome::ok(),
                Err(e) => StdinOutcome::pipe_broken(format!("failed to flush stdin: {e}")),
            },
            Err(e) => StdinOutcome::pipe_broken(format!("failed to write to stdin: {e}")),
        }
    }

    /// Returns the current status, first synchronizing against a natural
    /// exit the monitor task hasn't observed yet.
    pub async fn get_status(&self) -> ProcessStatus {
        let mut guard = self.inner.lock().await;
        sync_exit_locked(&mut guard);
        guard.status
    }

    /// `spec.md` §4.1 `get_stats()`.
    pub async fn get_stats(&self) -> ProcessSnapshot {
        let mut guard = self.inner.lock().await;
        sync_exit_locked(&mut guard);

        let mut snapshot = ProcessSnapshot {
            identifier: guard.identifier.clone(),
            pid: guard.pid,
            status: guard.status,
            cpu_percent: None,
            memory_rss_bytes: None,
            memory_vms_bytes: None,
            num_threads: None,
            create_time: guard.start_time,
            psutil_status: None,
            error: None,
        };

        if guard.status == ProcessStatus::FinishedError {
            snapshot.error = Some(format!(
                "process finished with non-zero exit code: {}",
                guard.exit_code.unwrap_or(UNKNOWN_EXIT_CODE)
            ));
        }

        if guard.status == ProcessStatus::Running {
            if let Some(pid) = guard.pid {
                let start_time = guard.start_time;
                let result =
                    tokio::task::spawn_blocking(move || stats::collect(pid as i32, start_time))
                        .await;
                match result {
                    Ok(Ok(live)) => {
                        snapshot.cpu_percent = Some(live.cpu_percent);
                        snapshot.memory_rss_bytes = Some(live.memory_rss_bytes);
                        snapshot.memory_vms_bytes = Some(live.memory_vms_bytes);
                        snapshot.num_threads = Some(live.num_threads);
                        snapshot.psutil_status = Some(live.psutil_status);
                    }
                    Ok(Err(stats::StatsError::Vanished)) => {
                        guard.status = ProcessStatus::Unknown;
                        guard.end_time = Some(current_timestamp());
                        if guard.exit_code.is_none() {
                            guard.exit_code = Some(UNKNOWN_EXIT_CODE);
                        }
                        snapshot.status = guard.status;
                        snapshot.error = Some("process not found while collecting stats".to_string());
                    }
                    Ok(Err(stats::StatsError::Other(msg))) => {
                        snapshot.error = Some(format!("error collecting stats: {msg}"));
                    }
                    Err(join_err) => {
                        snapshot.error = Some(format!("stats task failed: {join_err}"));
                    }
                }
            }
        }

        snapshot
    }

    /// `spec.md` §4.1 `read_stdout_lines(n)`.
    pub async fn read_stdout_lines(&self, n: usize) -> PcbResult<Vec<String>> {
        validate_line_count(n)?;
        let mut guard = self.inner.lock().await;
        let path = guard.stdout_log_path.clone();
        let offset = guard.stdout_offset;
        let (lines, new_offset) = read_log_lines(path.as_deref(), offset, n).await?;
        guard.stdout_offset = new_offset;
        Ok(lines)
    }

    /// `spec.md` §4.1 `read_stderr_lines(n)`.
    pub async fn read_stderr_lines(&self, n: usize) -> PcbResult<Vec<String>> {
        validate_line_count(n)?;
        let mut guard = self.inner.lock().await;
        let path = guard.stderr_log_path.clone();
        let offset = guard.stderr_offset;
        let (lines, new_offset) = read_log_lines(path.as_deref(), offset, n).await?;
        guard.stderr_offset = new_offset;
        Ok(lines)
    }

    /// `spec.md` §4.1 `tail_stdout(n)`. Does not touch the read cursor, but
    /// still holds the PCB lock for the duration of the read to observe a
    /// consistent state, matching `read_stdout_lines`.
    pub async fn tail_stdout(&self, n: usize) -> PcbResult<Vec<String>> {
        validate_line_count(n)?;
        let guard = self.inner.lock().await;
        tail_log_file(guard.stdout_log_path.as_deref(), n).await
    }

    /// `spec.md` §4.1 `tail_stderr(n)`. Does not touch the read cursor, but
    /// still holds the PCB lock for the duration of the read.
    pub async fn tail_stderr(&self, n: usize) -> PcbResult<Vec<String>> {
        validate_line_count(n)?;
        let guard = self.inner.lock().await;
        tail_log_file(guard.stderr_log_path.as_deref(), n).await
    }

    /// Reads the entire stdout capture file, independent of cursors and
    /// tails. Library-level only; `spec.md`'s endpoint table has no route
    /// for this (see `SPEC_FULL.md` §4.1).
    pub async fn get_full_stdout(&self) -> PcbResult<String> {
        let path = self.inner.lock().await.stdout_log_path.clone();
        read_full(path.as_deref()).await
    }

    /// Reads the entire stderr capture file, independent of cursors and
    /// tails.
    pub async fn get_full_stderr(&self) -> PcbResult<String> {
        let path = self.inner.lock().await.stderr_log_path.clone();
        read_full(path.as_deref()).await
    }

    pub async fn summary(&self) -> RunSummary {
        let mut guard = self.inner.lock().await;
        sync_exit_locked(&mut guard);
        RunSummary {
            identifier: guard.identifier.clone(),
            command_str: guard.command_str.clone(),
            env: guard.custom_env.clone(),
            start_time: guard.start_time,
            end_time: guard.end_time,
            status: guard.status,
        }
    }

    pub async fn start_time(&self) -> u64 {
        self.inner.lock().await.start_time
    }
}

/// Fallback sync point mirroring `pcb.py`'s `_update_on_exit_locked`: if the
/// monitor task hasn't yet observed a natural exit, catch it here instead of
/// reporting a stale `Running` status to a caller.
fn sync_exit_locked(guard: &mut Inner) {
    if guard.status != ProcessStatus::Running {
        return;
    }
    let Some(child) = guard.child.as_mut() else {
        return;
    };
    if let Ok(Some(exit_status)) = child.try_wait() {
        let code = exit_status.code().unwrap_or(UNKNOWN_EXIT_CODE);
        guard.exit_code = Some(code);
        guard.end_time = Some(current_timestamp());
        guard.status = if code == 0 {
            ProcessStatus::FinishedOk
        } else {
            ProcessStatus::FinishedError
        };
    }
}

fn send_signal(pid: u32, signal: nix::sys::signal::Signal) {
    let target = nix::unistd::Pid::from_raw(pid as i32);
    if let Err(e) = nix::sys::signal::kill(target, signal) {
        tracing::warn!(pid, %signal, error = %e, "failed to deliver signal");
    }
}

async fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Option<i32> {
    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => Some(status.code().unwrap_or(KILL_EXIT_CODE)),
        Ok(Err(_)) | Err(_) => None,
    }
}

async fn open_append(path: &std::path::Path) -> PcbResult<std::fs::File> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
    })
    .await
    .map_err(|e| PcbError::SpawnFailed(format!("log file task panicked: {e}")))?
    .map_err(|e| PcbError::SpawnFailed(format!("could not open log file: {e}")))
}

async fn write_summary_log(
    summary_path: &std::path::Path,
    command_str: &str,
    stdout_path: &std::path::Path,
    stderr_path: &std::path::Path,
) -> std::io::Result<()> {
    let contents = format!(
        "Process started: {command_str}\nStandard output and error are being written to separate files:\n  - STDOUT: {}\n  - STDERR: {}\n",
        stdout_path.display(),
        stderr_path.display(),
    );
    tokio::fs::write(summary_path, contents).await
}

fn validate_line_count(n: usize) -> PcbResult<()> {
    if (MIN_LOG_LINES..=MAX_LOG_LINES).contains(&n) {
        Ok(())
    } else {
        Err(PcbError::Validation(format!(
            "lines must be between {MIN_LOG_LINES} and {MAX_LOG_LINES}, got {n}"
        )))
    }
}

/// Reads up to `n` complete lines starting at `offset`, returning the lines
/// and the new offset. A trailing partial line at EOF is flushed as the
/// final line (`spec.md` §4.1, §9 "end-of-file flush rule").
async fn read_log_lines(
    path: Option<&std::path::Path>,
    offset: u64,
    n: usize,
) -> PcbResult<(Vec<String>, u64)> {
    let Some(path) = path else {
        return Ok((Vec::new(), offset));
    };
    if tokio::fs::metadata(path).await.is_err() {
        return Ok((Vec::new(), offset));
    }

    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| PcbError::Internal(e.to_string()))?;
    file.seek(std::io::SeekFrom::Start(offset))
        .await
        .map_err(|e| PcbError::Internal(e.to_string()))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)
        .await
        .map_err(|e| PcbError::Internal(e.to_string()))?;

    if buf.is_empty() {
        return Ok((Vec::new(), offset));
    }

    let mut lines = Vec::new();
    let mut consumed: u64 = 0;
    let mut start = 0usize;

    for (i, byte) in buf.iter().enumerate() {
        if lines.len() >= n {
            break;
        }
        if *byte == b'\n' {
            lines.push(String::from_utf8_lossy(&buf[start..i]).into_owned());
            consumed += (i - start + 1) as u64;
            start = i + 1;
        }
    }

    if lines.len() < n && start < buf.len() {
        lines.push(String::from_utf8_lossy(&buf[start..]).into_owned());
        consumed += (buf.len() - start) as u64;
    }

    Ok((lines, offset + consumed))
}

/// Returns the last `n` non-empty lines of the file at call time, ignoring
/// cursors entirely (`spec.md` §4.1 `tail_*`).
async fn tail_log_file(path: Option<&std::path::Path>, n: usize) -> PcbResult<Vec<String>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    if tokio::fs::metadata(path).await.is_err() {
        return Ok(Vec::new());
    }

    let content = tokio::fs::read(path)
        .await
        .map_err(|e| PcbError::Internal(e.to_string()))?;
    if content.is_empty() {
        return Ok(Vec::new());
    }

    let text = String::from_utf8_lossy(&content);
    let all: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    let start = all.len().saturating_sub(n);
    Ok(all[start..].iter().map(|s| s.to_string()).collect())
}

async fn read_full(path: Option<&std::path::Path>) -> PcbResult<String> {
    let Some(path) = path else {
        return Ok(String::new());
    };
    if tokio::fs::metadata(path).await.is_err() {
        return Ok(String::new());
    }
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| PcbError::Internal(e.to_string()))?;
    Ok(String::from_utf8_lossy(&content).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_log_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pcb_host_test_{}", ulid::Ulid::new()));
        dir
    }

    #[tokio::test]
    async fn echoes_hello_world_and_finishes_ok() {
        let pcb = Pcb::new(
            "e1".to_string(),
            "bash -c 'echo hello && echo world'".to_string(),
            None,
            None,
            tmp_log_dir(),
        );
        pcb.start().await.expect("start should succeed");

        for _ in 0..50 {
            if pcb.get_status().await.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(pcb.get_status().await, ProcessStatus::FinishedOk);
        let lines = pcb.tail_stdout(10).await.expect("tail should succeed");
        assert_eq!(lines, vec!["hello".to_string(), "world".to_string()]);

        let first = pcb.read_stdout_lines(10).await.expect("read should succeed");
        assert_eq!(first, vec!["hello".to_string(), "world".to_string()]);
        let second = pcb.read_stdout_lines(10).await.expect("read should succeed");
        assert!(second.is_empty(), "cursor should not return the same bytes twice");
    }

    #[tokio::test]
    async fn rejects_out_of_range_line_counts() {
        let pcb = Pcb::new(
            "e-validate".to_string(),
            "true".to_string(),
            None,
            None,
            tmp_log_dir(),
        );
        assert!(pcb.read_stdout_lines(0).await.is_err());
        assert!(pcb.read_stdout_lines(101).await.is_err());
    }

    #[tokio::test]
    async fn reading_before_start_returns_empty() {
        let pcb = Pcb::new(
            "e-unstarted".to_string(),
            "true".to_string(),
            None,
            None,
            tmp_log_dir(),
        );
        assert_eq!(pcb.tail_stdout(10).await.unwrap(), Vec::<String>::new());
        assert_eq!(pcb.read_stdout_lines(10).await.unwrap(), Vec::<String>::new());
    }

    #[tokio::test]
    async fn graceful_kill_reaches_terminated_within_budget() {
        let pcb = Pcb::new(
            "e-kill".to_string(),
            "bash -c 'trap \"echo bye; exit 0\" TERM; sleep 30'".to_string(),
            None,
            None,
            tmp_log_dir(),
        );
        pcb.start().await.expect("start should succeed");
        tokio::time::sleep(Duration::from_millis(100)).await;

        let started = std::time::Instant::now();
        pcb.kill().await.expect("kill should succeed");
        assert!(started.elapsed() <= TERM_TIMEOUT + KILL_TIMEOUT + Duration::from_millis(500));
        assert_eq!(pcb.get_status().await, ProcessStatus::Terminated);

        let lines = pcb.tail_stdout(10).await.expect("tail should succeed");
        assert!(lines.iter().any(|l| l.contains("bye")));
    }

    #[tokio::test]
    async fn send_stdin_appends_newline_and_is_read_back_uppercased() {
        let pcb = Pcb::new(
            "e-stdin".to_string(),
            "python3 -c \"import sys\nfor l in sys.stdin: print(l.strip().upper())\"".to_string(),
            None,
            None,
            tmp_log_dir(),
        );
        pcb.start().await.expect("start should succeed");
        let outcome = pcb.send_stdin("hello").await;
        assert!(outcome.success, "stdin write should succeed: {:?}", outcome.error);

        let mut saw_hello = false;
        for _ in 0..50 {
            let lines = pcb.tail_stdout(10).await.expect("tail should succeed");
            if lines.iter().any(|l| l.trim() == "HELLO") {
                saw_hello = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(saw_hello, "expected uppercased echo of stdin input");
        pcb.kill().await.ok();
    }
}
