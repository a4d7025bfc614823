//! LocalStack test harness.
//!
//! Starts the `localstack` CLI with a set of services, waits for their ports and hands
//! out [`SessionConfig`](crate::session::SessionConfig)s pointed at them.

mod launcher;
mod service;

pub use launcher::{Localstack, LocalstackConfig, check_installed};
pub use service::{EDGE_PORT, Service};

use std::{io, process, time};

/// Errors raised while managing the LocalStack process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The program could not be run or `--version` failed.
    #[error("`{program}` is not installed: {reason}")]
    NotInstalled {
        /// Program that was checked.
        program: String,
        /// What went wrong.
        reason: String,
    },

    /// The program could not be spawned.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        /// Program that was spawned.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A service port accepted connections before LocalStack was spawned.
    #[error("port {port} of service `{service}` is already in use")]
    PortInUse {
        /// Service whose port is taken.
        service: String,
        /// Port that accepted a connection.
        port: u16,
    },

    /// The process exited before every service was ready.
    #[error("localstack exited before becoming ready ({status}){}", stderr_suffix(.stderr))]
    ExitedEarly {
        /// Exit status of the process.
        status: process::ExitStatus,
        /// Tail of the process stderr.
        stderr: String,
    },

    /// Some service port did not accept connections in time.
    #[error("localstack services [{services}] not ready after {timeout:?}{}", stderr_suffix(.stderr))]
    StartupTimeout {
        /// Services that were awaited.
        services: String,
        /// Time waited.
        timeout: time::Duration,
        /// Tail of the process stderr.
        stderr: String,
    },

    /// Polling the process state failed.
    #[error("failed to poll localstack process: {0}")]
    Process(#[source] io::Error),

    /// Stopping the process failed.
    #[error("failed to stop localstack: {0}")]
    Stop(#[source] io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}
