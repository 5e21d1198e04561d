//! Wire DTOs for the HTTP control surface, `spec.md` §6.
//!
//! Kept separate from `pcb`/`registry`'s core types so the core never has
//! to know about JSON field naming or ISO-8601 rendering; handlers in
//! `http::handlers` do the mapping.

use crate::pcb::{ProcessSnapshot, ProcessStatus, RunSummary};
use crate::timestamp::to_iso8601;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub identifier: String,
    pub command_str: String,
    #[serde(default)]
    pub env: Option<HashMap<String, String>>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub stdin_commands: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub identifier: String,
    pub status: ProcessStatus,
    pub pid: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StdinRequest {
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct StdinResponse {
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogLinesResponse {
    pub identifier: String,
    pub lines: Vec<String>,
    pub lines_read_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct LinesQuery {
    pub lines: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TerminateResponse {
    pub identifier: String,
    pub status: ProcessStatus,
    pub pid: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ProcessStats {
    pub identifier: String,
    pub pid: Option<u32>,
    pub status: ProcessStatus,
    pub cpu_percent: Option<f64>,
    pub memory_rss_bytes: Option<u64>,
    pub memory_vms_bytes: Option<u64>,
    pub num_threads: Option<i64>,
    pub create_time: String,
    pub psutil_status: Option<String>,
    pub error: Option<String>,
}

impl From<ProcessSnapshot> for ProcessStats {
    fn from(s: ProcessSnapshot) -> Self {
        Self {
            identifier: s.identifier,
            pid: s.pid,
            status: s.status,
            cpu_percent: s.cpu_percent,
            memory_rss_bytes: s.memory_rss_bytes,
            memory_vms_bytes: s.memory_vms_bytes,
            num_threads: s.num_threads,
            create_time: to_iso8601(s.create_time),
            psutil_status: s.psutil_status,
            error: s.error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunInfo {
    pub identifier: String,
    pub command_str: String,
    pub env: Option<HashMap<String, String>>,
    pub start_time: String,
    pub end_time: Option<String>,
    pub status: ProcessStatus,
}

impl From<RunSummary> for RunInfo {
    fn from(s: RunSummary) -> Self {
        Self {
            identifier: s.identifier,
            command_str: s.command_str,
            env: s.env,
            start_time: to_iso8601(s.start_time),
            end_time: s.end_time.map(to_iso8601),
            status: s.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessListResponse {
    pub processes: Vec<RunInfo>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
}
