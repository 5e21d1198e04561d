//! The Process Registry: the process-wide `identifier -> Pcb` map.
//!
//! Grounded in the teacher's pattern of wrapping shared mutable state in an
//! `Arc<RwLock<_>>` handle that is cheaply cloned into Axum's shared state
//! (see `process_manager::SupervisedProcess`), generalized here to the
//! single-active-per-identifier replace-on-restart rule in `spec.md` §3.

use crate::error::{PcbError, PcbResult};
use crate::pcb::{Pcb, ProcessStatus, RunSummary};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Process-wide registry of active and recently-finished supervised
/// processes. `Clone` is cheap: it shares the same underlying map.
#[derive(Clone)]
pub struct Registry {
    processes: Arc<RwLock<HashMap<String, Pcb>>>,
    log_dir: PathBuf,
}

impl Registry {
    pub fn new(log_dir: PathBuf) -> Self {
        Self {
            processes: Arc::new(RwLock::new(HashMap::new())),
            log_dir,
        }
    }

    /// Starts a new process under `identifier`. If one is already
    /// registered there, it is killed and replaced first (`spec.md` §3,
    /// "single active PCB per identifier"). The new `Pcb` is inserted
    /// into the map *before* `start()` runs, so it stays queryable (in
    /// `ErrorStart`) even if spawning fails.
    pub async fn run(
        &self,
        identifier: String,
        command_str: String,
        env: Option<HashMap<String, String>>,
        cwd: Option<String>,
    ) -> (Pcb, PcbResult<()>) {
        let previous = {
            let mut map = self.processes.write().await;
            map.remove(&identifier)
        };
        if let Some(previous) = previous {
            previous.kill().await.ok();
        }

        let pcb = Pcb::new(identifier.clone(), command_str, env, cwd, self.log_dir.clone());
        {
            let mut map = self.processes.write().await;
            map.insert(identifier, pcb.clone());
        }

        let result = pcb.start().await;
        (pcb, result)
    }

    /// Looks up the PCB registered under `identifier`.
    pub async fn get(&self, identifier: &str) -> PcbResult<Pcb> {
        let map = self.processes.read().await;
        map.get(identifier)
            .cloned()
            .ok_or_else(|| PcbError::NotFound(identifier.to_string()))
    }

    /// Kills the process registered under `identifier` and returns its
    /// post-kill status (`spec.md` §6 `DELETE /terminate/{id}`).
    pub async fn terminate(&self, identifier: &str) -> PcbResult<(ProcessStatus, Option<u32>)> {
        let pcb = self.get(identifier).await?;
        pcb.kill().await?;
        Ok((pcb.get_status().await, pcb.pid().await))
    }

    /// Lists every registered process, most recently started first
    /// (`spec.md` §6 `GET /processes`).
    pub async fn list(&self) -> Vec<RunSummary> {
        let snapshot: Vec<Pcb> = self.processes.read().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(snapshot.len());
        for pcb in snapshot {
            summaries.push(pcb.summary().await);
        }
        summaries.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        summaries
    }

    /// Registers `pcb` under `identifier` directly, without going through
    /// `run`'s spawn/kill-previous sequence. Used by the one-shot
    /// environment-variable-driven initializer in `spec.md` §6, which
    /// constructs and starts its own `Pcb` before any HTTP request has
    /// arrived.
    pub async fn insert(&self, identifier: String, pcb: Pcb) {
        // `Entry` keeps parity with `run`'s replace semantics if this is
        // ever called against a non-empty registry.
        let mut map = self.processes.write().await;
        match map.entry(identifier) {
            Entry::Occupied(mut slot) => {
                slot.insert(pcb);
            }
            Entry::Vacant(slot) => {
                slot.insert(pcb);
            }
        }
    }

    pub fn log_dir(&self) -> &std::path::Path {
        &self.log_dir
    }
}
