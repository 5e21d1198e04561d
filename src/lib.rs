//! `pcb-host`: an in-process supervisor that starts, monitors, and tears
//! down child processes on behalf of remote HTTP clients.

pub mod config;
pub mod error;
pub mod http;
pub mod init;
pub mod pcb;
pub mod registry;
pub mod timestamp;

pub use config::PcbHostConfig;
pub use error::{PcbError, PcbResult};
pub use registry::Registry;
