#![deny(missing_docs)]
//! Arrbot runtime.
//!
//! Transport-agnostic conversation engine: per-chat sessions, event
//! classification, option resolution, pagination and the workflow controllers.

/// Shared collaborators handed to every controller.
pub mod context;
/// Workflow error taxonomy.
pub mod error;
/// Inbound event classification.
pub mod event;
/// Outbound messaging contract.
pub mod gateway;
/// Result card pagination.
pub mod pagination;
/// "One option: take it, many: ask" policy.
pub mod resolver;
/// Routing of classified events to controllers.
pub mod router;
/// Per-chat session state.
pub mod session;
/// User-facing texts and keyboards.
pub mod views;
/// Workflow controllers.
pub mod workflows;

#[cfg(test)]
mod testing;

pub use context::WorkflowContext;
pub use error::WorkflowError;
pub use event::{Action, EntryCommand, Event, EventClassifier};
pub use gateway::{Button, Keyboard, MessageHandle, NotificationGateway};
pub use router::{DialogRouter, Inbound, InboundKind};
pub use session::{Session, SessionStore};
