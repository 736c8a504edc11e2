//! Reconciler engine - work nodes and the data they carry.
//!
//! The engine manages the core data structures:
//! - NodeArena: slot storage for work nodes, counterpart recycling
//! - WorkNode: one tree position in one generation
//! - Flags: the mutation kinds a render leaves for commit
//! - UpdateQueue: single pending update per root or hook
//!
//! # Architecture
//!
//! Nodes are NOT heap objects pointing at each other. They are slots in an
//! arena, linked by id:
//!
//! ```text
//! root ─child─▶ div ─child─▶ "Hello"
//!  ▲             │  ▲            │
//!  └──parent─────┘  └──parent────┘
//! ```
//!
//! Swapping generations is an id flip on the root handle.

mod arena;
mod flags;
mod node;
mod update_queue;

pub use arena::{ChildIter, NodeArena};
pub use flags::{bubble, Flags};
pub use node::{NodeId, NodeState, WorkNode, WorkTag};
pub use update_queue::{
    create_update, create_update_queue, enqueue_update, process_update_queue, Action, Dispatch,
    SharedQueue, Update, UpdateQueue,
};

pub(crate) use update_queue::ScheduleUpdate;
