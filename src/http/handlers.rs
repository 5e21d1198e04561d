//! Axum handlers translating HTTP verbs into `Registry`/`Pcb` operations,
//! `spec.md` §6. Thin by design: all supervision logic lives in `pcb` and
//! `registry`.

use crate::error::{PcbError, PcbResult};
use crate::http::models::{
    HealthResponse, LinesQuery, LogLinesResponse, ProcessListResponse, ProcessStats, RunInfo,
    RunRequest, RunResponse, StdinRequest, StdinResponse, TerminateResponse,
};
use crate::pcb::DEFAULT_LOG_LINES;
use crate::registry::Registry;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

pub async fn run_process(
    State(registry): State<Registry>,
    Json(req): Json<RunRequest>,
) -> PcbResult<impl IntoResponse> {
    if req.identifier.trim().is_empty() {
        return Err(PcbError::Validation("identifier must not be empty".to_string()));
    }
    if req.command_str.trim().is_empty() {
        return Err(PcbError::Validation("command_str must not be empty".to_string()));
    }

    let (pcb, start_result) = registry
        .run(req.identifier.clone(), req.command_str, req.env, req.cwd)
        .await;

    start_result?;

    if let Some(commands) = req.stdin_commands {
        for line in commands {
            pcb.send_stdin(&line).await;
        }
    }

    let status = pcb.get_status().await;
    let pid = pcb.pid().await;
    let body = RunResponse {
        identifier: req.identifier,
        status,
        pid,
    };
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn send_stdin(
    State(registry): State<Registry>,
    Path(identifier): Path<String>,
    Json(req): Json<StdinRequest>,
) -> PcbResult<Json<StdinResponse>> {
    let pcb = registry.get(&identifier).await?;
    let outcome = pcb.send_stdin(&req.data).await;
    Ok(Json(StdinResponse {
        success: outcome.success,
        error: outcome.error,
    }))
}

pub async fn inspect(
    State(registry): State<Registry>,
    Path(identifier): Path<String>,
) -> PcbResult<Json<ProcessStats>> {
    let pcb = registry.get(&identifier).await?;
    let snapshot = pcb.get_stats().await;
    Ok(Json(snapshot.into()))
}

fn resolve_lines(query: LinesQuery) -> usize {
    query.lines.unwrap_or(DEFAULT_LOG_LINES)
}

pub async fn tail_stdout(
    State(registry): State<Registry>,
    Path(identifier): Path<String>,
    Query(query): Query<LinesQuery>,
) -> PcbResult<Json<LogLinesResponse>> {
    let pcb = registry.get(&identifier).await?;
    let lines = pcb.tail_stdout(resolve_lines(query)).await?;
    let lines_read_count = lines.len();
    Ok(Json(LogLinesResponse {
        identifier,
        lines,
        lines_read_count,
    }))
}

pub async fn tail_stderr(
    State(registry): State<Registry>,
    Path(identifier): Path<String>,
    Query(query): Query<LinesQuery>,
) -> PcbResult<Json<LogLinesResponse>> {
    let pcb = registry.get(&identifier).await?;
    let lines = pcb.tail_stderr(resolve_lines(query)).await?;
    let lines_read_count = lines.len();
    Ok(Json(LogLinesResponse {
        identifier,
        lines,
        lines_read_count,
    }))
}

pub async fn read_stdout(
    State(registry): State<Registry>,
    Path(identifier): Path<String>,
    Query(query): Query<LinesQuery>,
) -> PcbResult<Json<LogLinesResponse>> {
    let pcb = registry.get(&identifier).await?;
    let lines = pcb.read_stdout_lines(resolve_lines(query)).await?;
    let lines_read_count = lines.len();
    Ok(Json(LogLinesResponse {
        identifier,
        lines,
        lines_read_count,
    }))
}

pub async fn read_stderr(
    State(registry): State<Registry>,
    Path(identifier): Path<String>,
    Query(query): Query<LinesQuery>,
) -> PcbResult<Json<LogLinesResponse>> {
    let pcb = registry.get(&identifier).await?;
    let lines = pcb.read_stderr_lines(resolve_lines(query)).await?;
    let lines_read_count = lines.len();
    Ok(Json(LogLinesResponse {
        identifier,
        lines,
        lines_read_count,
    }))
}

pub async fn terminate(
    State(registry): State<Registry>,
    Path(identifier): Path<String>,
) -> PcbResult<Json<TerminateResponse>> {
    let (status, pid) = registry.terminate(&identifier).await?;
    Ok(Json(TerminateResponse {
        identifier,
        status,
        pid,
    }))
}

pub async fn list_processes(State(registry): State<Registry>) -> Json<ProcessListResponse> {
    let processes = registry.list().await.into_iter().map(RunInfo::from).collect();
    Json(ProcessListResponse { processes })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { message: "ok" })
}
