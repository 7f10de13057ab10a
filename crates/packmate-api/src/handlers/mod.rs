//! HTTP handlers.
//!
//! Propagation policy: no store or backend error crosses to the caller as a
//! structured error. List endpoints degrade to empty collections, action
//! endpoints to a flash-style `ActionResponse`, and the assistant to its
//! fixed fallback reply. Failures are logged here instead.

pub mod assistant;
pub mod items;
pub mod notes;
pub mod trips;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use packmate_core::Error;

/// Flash-style outcome for action endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            message: None,
        }
    }

    pub fn ok_with(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: Some(message.into()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: Some(message.into()),
        }
    }
}

/// Log a degraded store operation. Not-found is expected traffic (stale
/// links, racing deletes) and logs at debug; real backend failures at error.
pub(crate) fn log_degraded(op: &'static str, err: &Error) {
    match err {
        Error::NotFound(_) | Error::TripNotFound(_) | Error::ItemNotFound(_) => {
            debug!(subsystem = "api", op = op, error = %err, "Operation target missing");
        }
        _ => {
            error!(subsystem = "api", op = op, error = %err, "Store operation failed, degrading");
        }
    }
}
