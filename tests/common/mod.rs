//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rustc_hash::{FxHashMap, FxHashSet};

use mcts_graph::mcts::{NodeId, Tree, TreeEvent, TreeObserver};
use mcts_graph::{Game, GameResult, PlayerId};

/// One-move game with a single winning reply.
///
/// The first player picks one of `WIDTH` moves. `WINNING_MOVE` wins on
/// the spot; any other move hands the second player a one-move win.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForcedWin;

pub const WIDTH: u8 = 5;
pub const WINNING_MOVE: u8 = 2;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ForcedWinState {
    Start,
    Reply(u8),
    Over(PlayerId),
}

impl Game for ForcedWin {
    type State = ForcedWinState;
    type Move = u8;

    fn legal_moves(&self, state: &ForcedWinState) -> Vec<u8> {
        match state {
            ForcedWinState::Start => (0..WIDTH).collect(),
            ForcedWinState::Reply(_) => vec![0],
            ForcedWinState::Over(_) => Vec::new(),
        }
    }

    fn apply(&self, state: &ForcedWinState, mv: &u8) -> ForcedWinState {
        match state {
            ForcedWinState::Start if *mv == WINNING_MOVE => ForcedWinState::Over(PlayerId::FIRST),
            ForcedWinState::Start => ForcedWinState::Reply(*mv),
            ForcedWinState::Reply(_) => ForcedWinState::Over(PlayerId::SECOND),
            ForcedWinState::Over(_) => panic!("no moves in a finished game"),
        }
    }

    fn result(&self, state: &ForcedWinState) -> Option<GameResult> {
        match state {
            ForcedWinState::Over(winner) => Some(GameResult::Winner(*winner)),
            _ => None,
        }
    }

    fn player_to_move(&self, state: &ForcedWinState) -> PlayerId {
        match state {
            ForcedWinState::Start => PlayerId::FIRST,
            ForcedWinState::Reply(_) => PlayerId::SECOND,
            ForcedWinState::Over(winner) => winner.opponent(),
        }
    }
}

/// Observer that keeps every event for later inspection.
#[derive(Clone, Default)]
pub struct Recorder(pub Arc<Mutex<Vec<TreeEvent>>>);

impl Recorder {
    pub fn events(&self) -> Vec<TreeEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl TreeObserver for Recorder {
    fn on_event(&self, event: &TreeEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

/// Walk the graph from its roots and check every structural invariant.
///
/// Returns the number of reachable nodes.
pub fn check_invariants<G: Game>(tree: &Tree<G>) -> usize {
    let mut seen: FxHashSet<NodeId> = FxHashSet::default();
    let mut edge_counts: FxHashMap<NodeId, u32> = FxHashMap::default();
    let mut queue: VecDeque<NodeId> = tree.roots().into();

    for root in tree.roots() {
        assert_eq!(tree.incoming_edges(root), Some(0), "root {root} has incoming edges");
    }

    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        let node = tree.node(id).unwrap_or_else(|| panic!("{id} reachable but reclaimed"));
        let stats = node.stats();

        assert!(
            stats.wins + stats.ties <= stats.visits,
            "{id}: wins {} + ties {} > visits {}",
            stats.wins,
            stats.ties,
            stats.visits
        );
        assert!(
            stats.child_slots == 0 || stats.child_slots == node.moves().len(),
            "{id}: {} slots for {} moves",
            stats.child_slots,
            node.moves().len()
        );
        if !stats.is_expanded() {
            assert_eq!(stats.child_slots, 0, "{id}: unexpanded node has children");
        }

        for (_, child) in node.children() {
            *edge_counts.entry(child).or_default() += 1;
            queue.push_back(child);
        }
    }

    for id in &seen {
        let expected = edge_counts.get(id).copied().unwrap_or(0);
        assert_eq!(tree.incoming_edges(*id), Some(expected), "{id}: incoming edge count");
        let node = tree.node(*id).unwrap();
        assert_eq!(node.parents().len() as u32, expected, "{id}: parent entries");
        if expected == 0 {
            assert!(tree.is_root(*id), "{id}: parentless node outside the root set");
        }
    }

    assert_eq!(seen.len(), tree.size(), "table holds unreachable nodes");
    seen.len()
}
