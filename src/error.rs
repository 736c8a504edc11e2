//! Error types.
//!
//! Render-phase functions return [`ReconcileError`] and propagate with `?`.
//! The work loop is the only place that turns one into an abandoned render.

use thiserror::Error;

use crate::engine::NodeId;

/// Errors raised while reconciling a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// A node id no longer resolves in the arena.
    #[error("work node {0:?} is not in the arena")]
    MissingNode(NodeId),

    /// The root anchor lost its update queue.
    #[error("root anchor {0:?} has no update queue")]
    MissingUpdateQueue(NodeId),

    /// A host or component node has no element type.
    #[error("work node {0:?} has no element type")]
    MissingElementType(NodeId),

    /// A function component node carries a host element type.
    #[error("work node {0:?} is not a function component")]
    NotAComponent(NodeId),

    /// A component called a different number of hooks than last render.
    #[error("component {component} called {next} hooks, previously {previous}")]
    HookOrderChanged {
        component: String,
        previous: usize,
        next: usize,
    },

    /// A hook's state type changed between renders.
    #[error("component {component} changed the state type of hook {index}")]
    HookTypeMismatch { component: String, index: usize },

    /// A component's render function failed or panicked.
    #[error("component {component} failed to render: {message}")]
    Render { component: String, message: String },

    /// A render took more units of work than configured.
    #[error("render exceeded {limit} units of work")]
    WorkLimitExceeded { limit: usize },

    /// An update was triggered while the root was already rendering or committing.
    #[error("update triggered while the root is busy; it stays queued for the next flush")]
    Reentrant,

    /// The dispatch target or its root has been unmounted.
    #[error("update target is no longer mounted")]
    Unmounted,
}

/// Result alias used across the crate.
pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
