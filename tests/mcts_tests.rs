//! MCTS integration tests using tic-tac-toe and a tiny solved game.

mod common;

use common::{check_invariants, ForcedWin, ForcedWinState, Recorder, WINNING_MOVE};
use mcts_graph::games::tictactoe::{Board, TicTacToe, REACHABLE_POSITIONS};
use mcts_graph::mcts::{MctsConfig, Tree, TreeEvent};
use mcts_graph::{Game, GameResult, PlayerId, PlayoutPolicy, PlayoutRng};

fn tictactoe_tree(seed: u64) -> Tree<TicTacToe> {
    Tree::with_config(TicTacToe::new(), MctsConfig::default().with_seed(seed)).unwrap()
}

// =============================================================================
// Basic Search Tests
// =============================================================================

#[test_log::test]
fn test_search_returns_move() {
    let tree = tictactoe_tree(42);
    let mv = tree.search(&Board::new(), 200);

    assert!(mv.is_some(), "MCTS should return a move");
    assert!(mv.unwrap() < 9);
}

#[test]
fn test_search_on_terminal_state() {
    let tree = tictactoe_tree(42);
    let board = Board::from_str_grid("XXXOO....");

    let stats = tree.mcts(&board, 20);

    assert_eq!(stats.iterations, 20);
    assert_eq!(stats.expansions, 0);
    let root = tree.find(&board).unwrap();
    assert!(!root.is_expanded());
    assert_eq!(root.visits(), 20);
    // Terminal root: X won, O to move, never credited
    assert_eq!(root.stats().wins, 0);
    assert!(tree.get_move(&root).is_none());
}

#[test]
fn test_search_with_one_iteration() {
    let tree = tictactoe_tree(42);
    let stats = tree.mcts(&Board::new(), 1);

    assert_eq!(stats.iterations, 1);
    assert_eq!(stats.expansions, 1);
    let root = tree.find(&Board::new()).unwrap();
    assert!(root.is_expanded());
    // One visit from selection, one from expansion
    assert_eq!(root.visits(), 2);
}

// =============================================================================
// Solved Game Tests
// =============================================================================

#[test]
fn test_forced_win_is_found() {
    for seed in 0..5 {
        let tree = Tree::with_config(ForcedWin, MctsConfig::default().with_seed(seed)).unwrap();
        tree.mcts(&ForcedWinState::Start, 1000);

        let root = tree.find(&ForcedWinState::Start).unwrap();
        assert_eq!(tree.get_move(&root), Some(WINNING_MOVE), "seed {seed}");
    }
}

#[test]
fn test_forced_win_shares_terminal_node() {
    let tree = Tree::new(ForcedWin);
    tree.mcts(&ForcedWinState::Start, 200);

    // Every losing reply reaches the same finished position
    let lost = tree.find(&ForcedWinState::Over(PlayerId::SECOND)).unwrap();
    assert_eq!(lost.parents().len(), 4);
    assert_eq!(tree.size(), 1 + 5 + 1);
    check_invariants(&tree);
}

#[test]
fn test_tictactoe_takes_immediate_win() {
    // X to move, top row open
    let board = Board::from_str_grid("XX.OO....");
    for seed in 0..5 {
        let tree = tictactoe_tree(seed);
        assert_eq!(tree.search(&board, 1500), Some(2), "seed {seed}");
    }
}

#[test]
fn test_tictactoe_blocks_threat() {
    // X to move, O threatens the top row
    let board = Board::from_str_grid("OO..X..X.");
    for seed in 0..5 {
        let tree = tictactoe_tree(seed);
        assert_eq!(tree.search(&board, 4000), Some(2), "seed {seed}");
    }
}

// =============================================================================
// Transposition Tests
// =============================================================================

#[test_log::test]
fn test_tictactoe_transpositions() {
    let tree = tictactoe_tree(42);
    tree.mcts(&Board::new(), 1000);

    assert!(tree.size() <= REACHABLE_POSITIONS);
    assert!(tree.hitrate() > 0.0, "tic-tac-toe must produce transpositions");
    let reachable = check_invariants(&tree);
    assert_eq!(reachable, tree.size());
}

#[test]
fn test_repeated_search_reuses_tree() {
    let tree = tictactoe_tree(42);
    tree.mcts(&Board::new(), 300);
    let size = tree.size();
    let root_visits = tree.find(&Board::new()).unwrap().visits();

    tree.mcts(&Board::new(), 300);

    assert!(tree.size() >= size);
    assert!(tree.find(&Board::new()).unwrap().visits() > root_visits);
    assert_eq!(tree.roots().len(), 1);
}

#[test]
fn test_search_from_child_position_keeps_single_root() {
    let tree = tictactoe_tree(42);
    let game = TicTacToe::new();
    tree.mcts(&Board::new(), 500);

    // The position after X takes the centre is already in the graph
    let after = game.apply(&Board::new(), &4);
    assert!(tree.find(&after).is_some());
    tree.mcts(&after, 200);

    assert_eq!(tree.roots().len(), 1);
    check_invariants(&tree);
}

// =============================================================================
// Statistics Tests
// =============================================================================

#[test]
fn test_search_statistics() {
    let tree = tictactoe_tree(42);
    let stats = tree.mcts(&Board::new(), 100);

    assert_eq!(stats.iterations, 100);
    assert_eq!(stats.playouts, 100);
    assert!(stats.expansions > 0, "Should expand some nodes");
    assert!(stats.max_depth > 0);
}

#[test]
fn test_tree_stats() {
    let tree = tictactoe_tree(42);
    tree.mcts(&Board::new(), 300);

    let stats = tree.stats();
    assert_eq!(stats.node_count, tree.size());
    assert_eq!(stats.root_count, 1);
    assert!(stats.lookups > 0);
    assert!(stats.hits <= stats.lookups);
    assert_eq!(stats.destroyed, 0);
}

#[test]
fn test_child_visits_sum() {
    let tree = tictactoe_tree(42);
    tree.mcts(&Board::new(), 400);
    let root = tree.find(&Board::new()).unwrap();

    let visits = tree.child_visits(&root);
    assert_eq!(visits.len(), 9);
    let total: u32 = visits.iter().map(|(_, v)| v).sum();
    assert!(total > 0);
    // Each child's own expansion adds one visit the root never sees
    assert!(total <= root.visits() + visits.len() as u32);
    assert!(total >= root.visits() - 2);
}

#[test]
fn test_policy_grid_after_search() {
    let tree = tictactoe_tree(42);
    tree.mcts(&Board::new(), 500);
    let root = tree.find(&Board::new()).unwrap();

    let policy = tree.get_policy(&root);
    assert_eq!(policy.shape(), (3, 3));
    assert!(policy.values().iter().all(|v| *v > 0.0 && *v <= 1.0 + 1e-4));
}

// =============================================================================
// Determinism Tests
// =============================================================================

#[test]
fn test_mcts_deterministic_with_seed() {
    let run = |seed| {
        let tree = tictactoe_tree(seed);
        tree.mcts(&Board::new(), 500);
        let root = tree.find(&Board::new()).unwrap();
        (tree.child_visits(&root), tree.size(), tree.get_move(&root))
    };

    assert_eq!(run(12345), run(12345), "Same seed should produce same search");
}

// =============================================================================
// Policy and Observer Tests
// =============================================================================

/// Playout that always reports a draw.
struct AlwaysDraw;

impl<G: Game> PlayoutPolicy<G> for AlwaysDraw {
    fn playout(&self, _: &G, _: &G::State, _: &mut PlayoutRng, _: u32) -> GameResult {
        GameResult::Draw
    }
}

#[test]
fn test_custom_playout_policy() {
    let tree = Tree::new(TicTacToe::new()).with_playout(AlwaysDraw);
    tree.mcts(&Board::new(), 50);

    let root = tree.find(&Board::new()).unwrap();
    let stats = root.stats();
    assert_eq!(stats.wins, 0);
    assert_eq!(stats.ties, 50);
}

#[test]
fn test_observer_sees_root_and_moves() {
    let recorder = Recorder::default();
    let tree = Tree::new(TicTacToe::new()).with_observer(recorder.clone());

    tree.mcts(&Board::new(), 50);
    let root = tree.find(&Board::new()).unwrap();
    tree.get_move(&root);

    let events = recorder.events();
    assert_eq!(events[0], TreeEvent::Rooted(root.id()));
    let evaluated = events
        .iter()
        .filter(|e| matches!(e, TreeEvent::MoveEvaluated { .. }))
        .count();
    assert_eq!(evaluated, 9);
}

#[test]
fn test_observer_sees_unrooting() {
    let recorder = Recorder::default();
    let tree = Tree::new(TicTacToe::new()).with_observer(recorder.clone());
    let game = TicTacToe::new();

    let child_state = game.apply(&Board::new(), &0);
    let child = tree.get_node(&child_state, None);
    let root = tree.get_node(&Board::new(), None);
    tree.expand(&root);

    assert!(recorder.events().contains(&TreeEvent::Unrooted(child.id())));
    assert_eq!(tree.roots(), vec![root.id()]);
}
