//! Lifecycle of an alert under test on a CommServe: build its request,
//! create it, verify its notifications, and clean it up.
mod client;
mod config;
mod session;
mod transport;

pub use client::{AlertHandle, ImportedRule, RemoteClient};
pub use config::{CommServe, Config};
pub use session::{AlertSession, CleanupFailure, CleanupReport, CleanupStep, SessionState};
pub use transport::{Endpoint, Method, Response, Transport};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("alert '{0}' already exists")]
    AlreadyExists(String),
    #[error("alert '{0}' was not found")]
    NotFound(String),
    #[error("request to {endpoint} failed")]
    Transport {
        endpoint: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("empty response from {0}")]
    EmptyResponse(String),
    #[error("malformed response from {endpoint}")]
    MalformedResponse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode request body")]
    EncodeRequest(#[source] serde_json::Error),
    #[error("alert creation failed: {0}")]
    CreationFailed(String),
    #[error("failed to {operation}: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },
    #[error("cannot {operation} while the session is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
    #[error("the session's alert was already deleted")]
    AlreadyDeleted,
    #[error("mailbox operation failed")]
    Mailbox(#[source] anyhow::Error),
    #[error("email verification requires an open mailbox")]
    MissingMailbox,
    #[error("custom alerts require an imported rule or inline query details")]
    MissingRule,
    #[error("failed to load config {path}")]
    Config {
        path: std::path::PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    Request(#[from] alert_request::Error),
    #[error(transparent)]
    Verify(#[from] alert_verify::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
