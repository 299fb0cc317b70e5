// ── Core error types ──
//
// Configuration errors fail fast at binding construction. Remote errors are
// propagated to the `evaluate` caller unchanged in meaning -- the pagination
// store is never touched on a failed fetch.

use thiserror::Error;

/// Unified error type for the find-binding engine.
#[derive(Debug, Error)]
pub enum Error {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("the 'service' option is required and must be a non-empty string")]
    ServiceRequired,

    #[error("invalid watch entry '{entry}': expected 'params' or 'fetch_params'")]
    InvalidWatch { entry: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    // ── Remote-fetch boundary errors ─────────────────────────────────
    #[error("remote find failed: {message}")]
    Remote {
        message: String,
        /// Backend-specific error code, when the remote supplies one.
        code: Option<String>,
        /// HTTP status, when the transport is HTTP-shaped.
        status: Option<u16>,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for remote failures without code/status.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
            code: None,
            status: None,
        }
    }
}
