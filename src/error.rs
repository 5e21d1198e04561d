//! Error kinds surfaced by the PCB subsystem and their HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Closed set of error kinds the core can raise, mirroring the taxonomy in
/// the process-supervision design: transport-level faults get an HTTP
/// status, while local/recoverable conditions are reported in a response
/// body instead (see `pcb::StdinOutcome`).
#[derive(Debug, Error)]
pub enum PcbError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("no process registered under identifier '{0}'")]
    NotFound(String),

    #[error("failed to spawn process: {0}")]
    SpawnFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PcbError {
    fn status(&self) -> StatusCode {
        match self {
            PcbError::Validation(_) => StatusCode::BAD_REQUEST,
            PcbError::NotFound(_) => StatusCode::NOT_FOUND,
            PcbError::SpawnFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PcbError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for PcbError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for PcbError {
    fn from(err: std::io::Error) -> Self {
        PcbError::Internal(err.to_string())
    }
}

pub type PcbResult<T> = Result<T, PcbError>;
