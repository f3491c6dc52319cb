//! Structured events emitted by the tree.
//!
//! Events fire at the points where the graph changes shape (a node gains
//! or loses root status, a stale table entry is purged, a node is
//! reclaimed) and once per child when a move is chosen. Observers must be
//! cheap; they are invoked on the search path, never while a lock is held.

use log::{debug, trace, warn};

use super::node::NodeId;

/// Something that happened to the search graph.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeEvent {
    /// A new node was created without a parent.
    Rooted(NodeId),

    /// A root gained its first parent and left the root set.
    Unrooted(NodeId),

    /// A table entry pointed at a reclaimed node and was purged.
    StaleEntry(NodeId),

    /// A node lost its last incoming edge and was reclaimed.
    Reclaimed(NodeId),

    /// One child considered by `Tree::get_move`.
    MoveEvaluated {
        /// Node whose children are being ranked.
        parent: NodeId,
        /// Index into the parent's move list.
        move_index: usize,
        /// Child visit count.
        visits: u32,
        /// Child value for the player to move at the child.
        q: f64,
    },
}

/// Receiver for `TreeEvent`s.
pub trait TreeObserver: Send + Sync {
    /// Handle one event. Called on the thread that caused it.
    fn on_event(&self, event: &TreeEvent);
}

/// Default observer forwarding events to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;

impl TreeObserver for LogObserver {
    fn on_event(&self, event: &TreeEvent) {
        match event {
            TreeEvent::Rooted(id) => trace!("rooting {id}"),
            TreeEvent::Unrooted(id) => trace!("unrooting {id}"),
            TreeEvent::StaleEntry(id) => warn!("purging stale table entry for {id}"),
            TreeEvent::Reclaimed(id) => trace!("reclaimed {id}"),
            TreeEvent::MoveEvaluated {
                parent,
                move_index,
                visits,
                q,
            } => debug!("{parent} move #{move_index}: {visits} visits, Q = {q:.4}"),
        }
    }
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl TreeObserver for NullObserver {
    fn on_event(&self, _event: &TreeEvent) {}
}
