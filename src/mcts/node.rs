//! Search graph nodes.
//!
//! Nodes live in the `Tree` arena and refer to each other through
//! generation-checked `NodeId` handles. A child slot is an owning edge; a
//! parent entry is a back-reference that may outlive its target and is
//! validated against the arena before use.

use std::fmt;

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::PlayerId;
use crate::rules::Game;

/// Handle into the `Tree` node arena.
///
/// The generation distinguishes successive occupants of the same slot, so
/// a handle to a reclaimed node never resolves to its replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Create a node ID.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Arena slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Slot generation this handle was issued for.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

/// Expansion state of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expansion {
    /// No children.
    Leaf,
    /// A thread is attaching children; the child list is still empty.
    Expanding,
    /// Child slots are populated, one per legal move.
    Expanded,
}

/// Mutable part of a node, guarded by the node lock.
#[derive(Debug)]
pub(crate) struct NodeData {
    pub visits: u32,
    pub wins: u32,
    pub ties: u32,
    pub expansion: Expansion,
    /// One slot per move once expanded. A slot is emptied when its branch
    /// is cut by ancestor pruning.
    pub children: Vec<Option<NodeId>>,
    /// One entry per incoming edge. May contain handles to reclaimed nodes.
    pub parents: SmallVec<[NodeId; 2]>,
}

impl NodeData {
    pub(crate) fn is_expanded(&self) -> bool {
        self.expansion == Expansion::Expanded
    }

    pub(crate) fn live_children(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|id| (i, id)))
    }

    /// Drop one back-reference to `parent`, if present.
    pub(crate) fn remove_parent(&mut self, parent: NodeId) -> bool {
        match self.parents.iter().position(|p| *p == parent) {
            Some(pos) => {
                self.parents.swap_remove(pos);
                true
            }
            None => false,
        }
    }
}

/// One unique game state in the search graph.
///
/// State, player and move list are fixed at construction; statistics and
/// edges sit behind the node's own lock.
pub struct Node<G: Game> {
    id: NodeId,
    state: G::State,
    player: PlayerId,
    moves: Vec<G::Move>,
    data: Mutex<NodeData>,
}

impl<G: Game> Node<G> {
    pub(crate) fn new(id: NodeId, state: G::State, player: PlayerId, moves: Vec<G::Move>) -> Self {
        Self {
            id,
            state,
            player,
            moves,
            data: Mutex::new(NodeData {
                visits: 0,
                wins: 0,
                ties: 0,
                expansion: Expansion::Leaf,
                children: Vec::new(),
                parents: SmallVec::new(),
            }),
        }
    }

    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, NodeData> {
        self.data.lock()
    }

    /// Arena handle of this node.
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The game state this node represents.
    #[must_use]
    pub fn state(&self) -> &G::State {
        &self.state
    }

    /// Player to move in this node's state.
    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Legal moves, in the order the game listed them.
    #[must_use]
    pub fn moves(&self) -> &[G::Move] {
        &self.moves
    }

    /// Snapshot of the node's statistics.
    #[must_use]
    pub fn stats(&self) -> NodeStats {
        let data = self.lock();
        NodeStats {
            visits: data.visits,
            wins: data.wins,
            ties: data.ties,
            expansion: data.expansion,
            child_slots: data.children.len(),
            live_children: data.live_children().count(),
            parents: data.parents.len(),
        }
    }

    /// Total visits, virtual ones included.
    #[must_use]
    pub fn visits(&self) -> u32 {
        self.lock().visits
    }

    /// Check if child slots have been populated.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.lock().is_expanded()
    }

    /// Live children as (move index, child id).
    #[must_use]
    pub fn children(&self) -> Vec<(usize, NodeId)> {
        self.lock().live_children().collect()
    }

    /// Parent handles as recorded. Entries may refer to reclaimed nodes
    /// until the next `Tree::u` pass drops them.
    #[must_use]
    pub fn parents(&self) -> Vec<NodeId> {
        self.lock().parents.to_vec()
    }

    /// Value of this node for its player to move:
    /// `(wins + tie_reward * ties) / (1 + visits)`.
    #[must_use]
    pub fn q(&self, tie_reward: f64) -> f64 {
        let data = self.lock();
        q_value(data.wins, data.ties, data.visits, tie_reward)
    }
}

impl<G: Game> fmt::Debug for Node<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("player", &self.player)
            .field("moves", &self.moves)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Laplace-smoothed value estimate.
#[inline]
pub(crate) fn q_value(wins: u32, ties: u32, visits: u32, tie_reward: f64) -> f64 {
    (f64::from(wins) + tie_reward * f64::from(ties)) / (1.0 + f64::from(visits))
}

/// Point-in-time copy of a node's statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    /// Visits, virtual ones included.
    pub visits: u32,
    /// Playouts won by the node's player to move.
    pub wins: u32,
    /// Playouts that ended in a tie.
    pub ties: u32,
    /// Expansion state.
    pub expansion: Expansion,
    /// Number of child slots (0 or the number of moves).
    pub child_slots: usize,
    /// Number of occupied child slots.
    pub live_children: usize,
    /// Number of recorded parent entries.
    pub parents: usize,
}

impl NodeStats {
    /// Visits that produced neither a win nor a tie. Includes visits whose
    /// playout result has not been recorded yet.
    #[must_use]
    pub fn losses(&self) -> u32 {
        self.visits - self.wins - self.ties
    }

    /// Check if child slots have been populated.
    #[must_use]
    pub fn is_expanded(&self) -> bool {
        self.expansion == Expansion::Expanded
    }
}
