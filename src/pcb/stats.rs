//! Live resource statistics for a running PID, read from `/proc`.
//!
//! Grounded in the teacher's `resource_monitor.rs::ResourceMonitor`
//! (utime/stime -> CPU%, `statm().resident` -> RSS) and its
//! `process_manager.rs::is_pid_active` liveness probe, generalized from a
//! fixed polling loop into a one-shot snapshot taken under the PCB lock.

use crate::timestamp::current_timestamp;
use std::io;

/// A point-in-time resource snapshot for a running child.
#[derive(Debug, Clone)]
pub struct LiveStats {
    pub cpu_percent: f64,
    pub memory_rss_bytes: u64,
    pub memory_vms_bytes: u64,
    pub num_threads: i64,
    pub psutil_status: String,
}

/// Why a stats snapshot could not be produced.
#[derive(Debug)]
pub enum StatsError {
    /// The OS reports no such PID; the caller should transition the PCB to
    /// `Unknown` (`spec.md` §4.1 `get_stats` contract).
    Vanished,
    Other(String),
}

impl std::fmt::Display for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsError::Vanished => write!(f, "process not found"),
            StatsError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

/// Checks if a PID is active on the system by sending signal 0. Lifted
/// directly from the teacher's `process_manager::is_pid_active`.
fn is_pid_active(pid: i32) -> io::Result<bool> {
    let ret = unsafe { libc::kill(pid, 0) };
    if ret == 0 {
        Ok(true)
    } else {
        match io::Error::last_os_error().raw_os_error() {
            Some(libc::ESRCH) => Ok(false),
            Some(libc::EPERM) => Ok(true),
            Some(err) => Err(io::Error::from_raw_os_error(err)),
            None => Err(io::Error::new(io::ErrorKind::Other, "unknown error probing pid")),
        }
    }
}

fn state_char_to_string(state: char) -> String {
    match state {
        'R' => "running",
        'S' => "sleeping",
        'D' => "disk_sleep",
        'Z' => "zombie",
        'T' => "stopped",
        't' => "tracing_stop",
        'X' | 'x' => "dead",
        'I' => "idle",
        _ => "unknown",
    }
    .to_string()
}

/// Collects a live resource snapshot for `pid`, computing `cpu_percent` per
/// the formula in `spec.md` §4.1: `(user+system cpu time) / (wall-uptime *
/// logical cores) * 100`, with `start_time` as the wall-uptime origin.
///
/// This call does blocking `/proc` reads; run it via `spawn_blocking`.
pub fn collect(pid: i32, start_time: u64) -> Result<LiveStats, StatsError> {
    match is_pid_active(pid) {
        Ok(true) => {}
        Ok(false) => return Err(StatsError::Vanished),
        Err(e) => return Err(StatsError::Other(e.to_string())),
    }

    let process = procfs::process::Process::new(pid).map_err(|e| StatsError::Other(e.to_string()))?;
    let stat = process.stat().map_err(|e| StatsError::Other(e.to_string()))?;
    let statm = process.statm().map_err(|e| StatsError::Other(e.to_string()))?;

    let memory_rss_bytes = statm.resident * 4096; // page size, matching the teacher's resource monitor
    let memory_vms_bytes = statm.size * 4096;

    let total_cpu_ticks = (stat.utime + stat.stime) as f64;
    let ticks_per_second = procfs::ticks_per_second() as f64;
    let wall_uptime = current_timestamp().saturating_sub(start_time) as f64;
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1) as f64;

    let cpu_percent = if wall_uptime > 0.0 {
        (total_cpu_ticks / ticks_per_second) / (wall_uptime * cores) * 100.0
    } else {
        0.0
    };

    Ok(LiveStats {
        cpu_percent,
        memory_rss_bytes,
        memory_vms_bytes,
        num_threads: stat.num_threads,
        psutil_status: state_char_to_string(stat.state),
    })
}
