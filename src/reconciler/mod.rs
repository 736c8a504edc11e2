//! Reconciler - render and commit phases over the node arena.
//!
//! # Phases
//!
//! - **Begin** (`begin`, `child`): compute each node's next children and
//!   diff them against the committed ones.
//! - **Complete** (`complete`): create host instances off-tree, mark
//!   updates, bubble flags to the root.
//! - **Commit** (`commit`): apply flagged mutations to the host, then the
//!   root swaps generations.
//!
//! `work_loop` drives a render, `root` owns mounted trees and their flush,
//! `hooks` gives function components state.

mod begin;
mod child;
mod commit;
mod complete;
mod hooks;
mod root;
mod work_loop;

pub use commit::CommitReport;
pub use hooks::{Hook, Hooks};
pub use root::{create_container, create_container_with_config, unmount, update_container, RootHandle};
pub use work_loop::FlushOutcome;

pub use crate::engine::Dispatch;
