use arrbot_core::access::AccessError;
use arrbot_core::backend::BackendError;
use thiserror::Error;

/// Errors that end the active workflow.
///
/// The router turns each of them into a failure message and clears the session.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A backend call failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
    /// The chat transport failed
    #[error("Gateway error: {0}")]
    Gateway(#[from] anyhow::Error),
    /// Access lists could not be read or written
    #[error("Access list error: {0}")]
    Access(#[from] AccessError),
    /// A required choice had no options
    #[error("No {0} available")]
    NoOptions(&'static str),
    /// The selected instance is no longer configured
    #[error("Unknown instance: {0}")]
    UnknownInstance(String),
    /// The session lacks a value an earlier step should have stored
    #[error("Session is missing {0}")]
    Incomplete(&'static str),
}
