//! # spark-fiber
//!
//! Two-phase fiber reconciler for declarative UI trees.
//!
//! ## Architecture
//!
//! A mounted tree is a [`RootHandle`]. It owns a host renderer, the host
//! container, and an arena of work nodes. Every logical tree position is a
//! pair of nodes (current + counterpart) living in that arena, so each
//! render writes only the generation that is not on screen.
//!
//! ```text
//! update → walk to root → render (begin ↓ / complete ↑) → commit → swap
//! ```
//!
//! - **Render** diffs the next descriptor against the committed tree,
//!   creates host instances off-tree and bubbles effect flags to the root.
//! - **Commit** walks the flagged tree, applies placements, updates and
//!   deletions to the host, then installs the finished generation.
//!
//! ## Modules
//!
//! - [`types`] - View descriptors (Element, Props, Children, Component)
//! - [`primitives`] - Descriptor builders
//! - [`engine`] - Work nodes, node arena, effect flags, update queues
//! - [`reconciler`] - Begin/complete/commit phases, work loop, hooks, roots
//! - [`host`] - Host renderer interface, in-memory host, terminal output

pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod primitives;
pub mod reconciler;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::ReconcilerConfig;
pub use error::{ReconcileError, Result};

pub use engine::{
    Action, Flags, NodeArena, NodeId, NodeState, SharedQueue, Update, UpdateQueue, WorkNode,
    WorkTag,
};

pub use reconciler::{
    create_container, create_container_with_config, unmount, update_container, CommitReport,
    Dispatch, FlushOutcome, Hooks, RootHandle,
};

pub use host::{
    diff_props, Frame, HostConfig, HostId, HostNodeKind, HostOp, MemoryHost, PropChange,
    PropPatch, TerminalRenderer,
};

pub use primitives::{component, element, text, ElementBuilder};
