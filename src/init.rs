//! One-shot default-process initialization, `spec.md` §6 "Environment &
//! process": the host reads a JSON blob from an environment variable at
//! startup and, if present, starts a process from it through the same
//! path `/run` uses.

use crate::registry::Registry;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize)]
struct InitProcessSpec {
    identifier: String,
    command_str: String,
    #[serde(default)]
    cwd: Option<String>,
}

/// Reads `env_var` and, if it names a non-empty JSON object, starts the
/// described process against `registry`. Malformed JSON is logged and
/// skipped rather than treated as a startup failure: a bad env var should
/// not stop the whole host from serving the HTTP surface.
pub async fn run_from_env(registry: &Registry, env_var: &str) {
    let Ok(raw) = env::var(env_var) else {
        return;
    };
    if raw.trim().is_empty() {
        return;
    }

    let spec: InitProcessSpec = match serde_json::from_str(&raw) {
        Ok(spec) => spec,
        Err(e) => {
            tracing::warn!(env_var, error = %e, "init process env var did not contain a valid spec; skipping");
            return;
        }
    };

    tracing::info!(
        identifier = %spec.identifier,
        command = %spec.command_str,
        "starting init process from environment"
    );

    let (_pcb, result) = registry
        .run(spec.identifier.clone(), spec.command_str, None, spec.cwd)
        .await;

    if let Err(e) = result {
        tracing::error!(identifier = %spec.identifier, error = %e, "init process failed to start");
    }
}
