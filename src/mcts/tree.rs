//! Arena-backed, transposition-deduplicated search graph.
//!
//! Nodes are stored in a slot arena and referenced by `NodeId` handles.
//! Each slot counts the edges pointing at its node; a node that loses its
//! last incoming edge and is not a root is reclaimed on the spot, its table
//! entry removed and its slot recycled under a new generation.
//!
//! ## Locking
//!
//! The arena lock guards slots, the dedup table, the root set and the
//! counters. Each node guards its own statistics and edges. No code path
//! holds two of these locks at once: nodes are shared as `Arc<Node>` so a
//! node can be locked after the arena lock has been released.

use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::PlayoutRng;
use crate::rules::Game;

use super::config::MctsConfig;
use super::error::ConfigError;
use super::node::{Expansion, Node, NodeId};
use super::observer::{LogObserver, TreeEvent, TreeObserver};
use super::policy::{PlayoutPolicy, RandomPlayout};

struct Slot<G: Game> {
    generation: u32,
    /// Number of child slots (across all parents) holding this node.
    incoming: u32,
    /// Position in `Arena::roots` while the node is a root.
    root: Option<u32>,
    node: Option<Arc<Node<G>>>,
}

/// Everything guarded by the arena lock.
struct Arena<G: Game> {
    slots: Vec<Slot<G>>,
    free: Vec<u32>,
    table: FxHashMap<G::State, NodeId>,
    roots: Vec<NodeId>,
    lookups: u64,
    hits: u64,
    destroyed: u64,
}

impl<G: Game> Arena<G> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            table: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            roots: Vec::new(),
            lookups: 0,
            hits: 0,
            destroyed: 0,
        }
    }

    fn live_slot_mut(&mut self, id: NodeId) -> Option<&mut Slot<G>> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation() && slot.node.is_some())
    }

    fn resolve(&self, id: NodeId) -> Option<&Arc<Node<G>>> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    fn insert(&mut self, game: &G, state: &G::State, incoming: u32) -> Arc<Node<G>> {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    incoming: 0,
                    root: None,
                    node: None,
                });
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        let id = NodeId::new(index, slot.generation);
        let node = Arc::new(Node::new(
            id,
            state.clone(),
            game.player_to_move(state),
            game.legal_moves(state),
        ));
        slot.incoming = incoming;
        slot.root = None;
        slot.node = Some(Arc::clone(&node));
        self.table.insert(state.clone(), id);
        node
    }

    /// Drop one incoming edge; reclaim the node if that was the last one.
    fn detach(&mut self, id: NodeId) -> Option<Arc<Node<G>>> {
        let slot = self.live_slot_mut(id)?;
        debug_assert!(slot.incoming > 0, "{id} has no incoming edge to release");
        slot.incoming = slot.incoming.saturating_sub(1);
        if slot.incoming > 0 || slot.root.is_some() {
            return None;
        }
        self.reclaim(id)
    }

    fn add_root(&mut self, id: NodeId) {
        let pos = self.roots.len() as u32;
        if let Some(slot) = self.live_slot_mut(id) {
            if slot.root.is_none() {
                slot.root = Some(pos);
                self.roots.push(id);
            }
        }
    }

    /// Take `id` out of the root set. Returns `false` if it was not a root.
    fn remove_root(&mut self, id: NodeId) -> bool {
        let Some(pos) = self.live_slot_mut(id).and_then(|slot| slot.root.take()) else {
            return false;
        };
        let pos = pos as usize;
        self.roots.swap_remove(pos);
        if let Some(&moved) = self.roots.get(pos) {
            if let Some(slot) = self.live_slot_mut(moved) {
                slot.root = Some(pos as u32);
            }
        }
        true
    }

    fn reclaim(&mut self, id: NodeId) -> Option<Arc<Node<G>>> {
        let slot = self.live_slot_mut(id)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        slot.incoming = 0;
        slot.root = None;
        self.free.push(id.index() as u32);
        if self.table.get(node.state()) == Some(&id) {
            self.table.remove(node.state());
        }
        self.destroyed += 1;
        Some(node)
    }
}

/// Shared MCTS search graph.
///
/// Generic over the game. Owns the game rules, configuration, playout
/// policy and event observer, and every node reachable from its roots.
/// All operations take `&self`, so one tree can be searched from several
/// threads at once (see `Tree::mcts_parallel`).
pub struct Tree<G: Game> {
    pub(crate) game: G,
    pub(crate) config: MctsConfig,
    arena: Mutex<Arena<G>>,
    /// Serializes `prune` passes.
    pub(crate) prune_lock: Mutex<()>,
    /// Base stream; every search forks from it.
    pub(crate) rng: Mutex<PlayoutRng>,
    pub(crate) playout: Box<dyn PlayoutPolicy<G>>,
    pub(crate) observer: Box<dyn TreeObserver>,
}

impl<G: Game> Tree<G> {
    /// Create a tree with the default configuration.
    pub fn new(game: G) -> Self {
        Self::build(game, MctsConfig::default())
    }

    /// Create a tree with a custom configuration.
    pub fn with_config(game: G, config: MctsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(game, config))
    }

    fn build(game: G, config: MctsConfig) -> Self {
        Self {
            arena: Mutex::new(Arena::with_capacity(config.initial_capacity)),
            prune_lock: Mutex::new(()),
            rng: Mutex::new(PlayoutRng::new(config.seed)),
            playout: Box::new(RandomPlayout),
            observer: Box::new(LogObserver),
            game,
            config,
        }
    }

    /// Set a custom playout policy.
    pub fn with_playout<P: PlayoutPolicy<G> + 'static>(mut self, playout: P) -> Self {
        self.playout = Box::new(playout);
        self
    }

    /// Set a custom event observer.
    pub fn with_observer<O: TreeObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// The game rules.
    #[must_use]
    pub fn game(&self) -> &G {
        &self.game
    }

    /// Search configuration.
    #[must_use]
    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Look up the node for `state`, creating it if needed.
    ///
    /// With a parent, the returned node gains an incoming edge from it (and
    /// leaves the root set if it was a root). Without one, a newly created
    /// node becomes a root; an existing node is returned unchanged.
    pub fn get_node(&self, state: &G::State, parent: Option<NodeId>) -> Arc<Node<G>> {
        let mut events: SmallVec<[TreeEvent; 2]> = SmallVec::new();

        let node = {
            let mut guard = self.arena.lock();
            let arena = &mut *guard;
            arena.lookups += 1;

            loop {
                let Some(id) = arena.table.get(state).copied() else {
                    let incoming = u32::from(parent.is_some());
                    let node = arena.insert(&self.game, state, incoming);
                    if parent.is_none() {
                        arena.add_root(node.id());
                        events.push(TreeEvent::Rooted(node.id()));
                    }
                    break node;
                };

                let Some(node) = arena.resolve(id).cloned() else {
                    arena.table.remove(state);
                    events.push(TreeEvent::StaleEntry(id));
                    continue;
                };

                arena.hits += 1;
                if parent.is_some() {
                    if arena.remove_root(id) {
                        events.push(TreeEvent::Unrooted(id));
                    }
                    if let Some(slot) = arena.live_slot_mut(id) {
                        slot.incoming += 1;
                    }
                }
                break node;
            }
        };

        if let Some(parent) = parent {
            node.lock().parents.push(parent);
        }
        for event in &events {
            self.observer.on_event(event);
        }
        node
    }

    /// Resolve a handle. `None` once the node has been reclaimed.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<Arc<Node<G>>> {
        self.arena.lock().resolve(id).cloned()
    }

    /// Node for `state`, if present. Does not count as a lookup.
    #[must_use]
    pub fn find(&self, state: &G::State) -> Option<Arc<Node<G>>> {
        let arena = self.arena.lock();
        arena.table.get(state).and_then(|id| arena.resolve(*id)).cloned()
    }

    /// Release owning edges `(parent, child)`, reclaiming every node that
    /// loses its last incoming edge and, transitively, its subtree.
    ///
    /// Returns the number of nodes reclaimed.
    pub(crate) fn release_edges(&self, edges: impl IntoIterator<Item = (NodeId, NodeId)>) -> usize {
        let mut stack: Vec<(NodeId, NodeId)> = edges.into_iter().collect();
        let mut reclaimed = 0;

        while let Some((parent, child)) = stack.pop() {
            if let Some(node) = self.node(child) {
                node.lock().remove_parent(parent);
            }

            let Some(node) = self.arena.lock().detach(child) else {
                continue;
            };
            reclaimed += 1;
            self.observer.on_event(&TreeEvent::Reclaimed(child));

            let children = {
                let mut data = node.lock();
                data.expansion = Expansion::Leaf;
                std::mem::take(&mut data.children)
            };
            stack.extend(children.into_iter().flatten().map(|grandchild| (child, grandchild)));
        }

        reclaimed
    }

    /// Remove a node from the root set. It is reclaimed, with its subtree,
    /// unless it still has a parent.
    ///
    /// Returns `false` if `id` was not a root.
    pub fn release_root(&self, id: NodeId) -> bool {
        let reclaimed = {
            let mut arena = self.arena.lock();
            if !arena.remove_root(id) {
                return false;
            }
            let orphaned = arena.live_slot_mut(id).is_some_and(|slot| slot.incoming == 0);
            if orphaned {
                arena.reclaim(id)
            } else {
                None
            }
        };

        if let Some(node) = reclaimed {
            self.observer.on_event(&TreeEvent::Reclaimed(id));
            let children = {
                let mut data = node.lock();
                data.expansion = Expansion::Leaf;
                std::mem::take(&mut data.children)
            };
            let count = self.release_edges(children.into_iter().flatten().map(|c| (id, c)));
            debug!("released root {id}, {} nodes reclaimed", count + 1);
        }
        true
    }

    /// Number of live nodes (table entries).
    #[must_use]
    pub fn size(&self) -> usize {
        self.arena.lock().table.len()
    }

    /// Fraction of `get_node` calls answered from the table.
    #[must_use]
    pub fn hitrate(&self) -> f64 {
        let arena = self.arena.lock();
        if arena.lookups == 0 {
            0.0
        } else {
            arena.hits as f64 / arena.lookups as f64
        }
    }

    /// Total number of nodes reclaimed since creation.
    #[must_use]
    pub fn purges(&self) -> u64 {
        self.arena.lock().destroyed
    }

    /// Current roots. Order is unspecified once a root has been removed.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.arena.lock().roots.clone()
    }

    /// Check if a node is currently a root.
    #[must_use]
    pub fn is_root(&self, id: NodeId) -> bool {
        self.arena
            .lock()
            .live_slot_mut(id)
            .is_some_and(|slot| slot.root.is_some())
    }

    /// Number of owning edges pointing at a live node.
    #[must_use]
    pub fn incoming_edges(&self, id: NodeId) -> Option<u32> {
        self.arena.lock().live_slot_mut(id).map(|slot| slot.incoming)
    }

    /// Snapshot of the tree counters.
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let arena = self.arena.lock();
        TreeStats {
            node_count: arena.table.len(),
            root_count: arena.roots.len(),
            arena_slots: arena.slots.len(),
            lookups: arena.lookups,
            hits: arena.hits,
            destroyed: arena.destroyed,
        }
    }
}

/// Statistics about the search graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Live nodes.
    pub node_count: usize,

    /// Nodes without a parent.
    pub root_count: usize,

    /// Allocated arena slots, free ones included.
    pub arena_slots: usize,

    /// `get_node` calls.
    pub lookups: u64,

    /// `get_node` calls that found an existing node.
    pub hits: u64,

    /// Nodes reclaimed.
    pub destroyed: u64,
}

impl TreeStats {
    /// Get the transposition hit rate.
    #[must_use]
    pub fn hitrate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }

    /// Fraction of arena slots currently occupied.
    #[must_use]
    pub fn occupancy(&self) -> f64 {
        if self.arena_slots == 0 {
            0.0
        } else {
            self.node_count as f64 / self.arena_slots as f64
        }
    }
}
