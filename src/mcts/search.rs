//! Core MCTS search algorithm.
//!
//! Each iteration selects a root-to-leaf path by PUCT, plays the leaf out,
//! credits the result along the path and expands the leaf. Selection
//! counts a visit on every node it passes before the result is known, so
//! concurrent workers sharing a root spread over different lines.
//!
//! ## Value convention
//!
//! `Q` is always the value of a node for its own player to move. A parent
//! choosing among children ranks them by `1 - Q(child)`: in selection
//! (`max_puct`), pruning (`prune_children`), move choice (`get_move`,
//! lowest child Q) and `get_policy`.

use std::sync::Arc;
use std::time::Instant;

use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::PlayoutRng;
use crate::rules::{Game, GameResult, PolicyGrid};

use super::node::{q_value, Expansion, Node, NodeId};
use super::observer::TreeEvent;
use super::stats::SearchStats;
use super::tree::Tree;

/// Offset added to every legal cell of a policy grid so that a move valued
/// at zero is still distinguishable from an illegal one.
const POLICY_EPSILON: f64 = 1e-5;

impl<G: Game> Tree<G> {
    /// Value of `node` for its player to move, with the configured tie reward.
    #[must_use]
    pub fn q(&self, node: &Node<G>) -> f64 {
        node.q(self.config.tie_reward)
    }

    /// Exploration bonus `C * sqrt(Σ parent visits) / (1 + visits)`.
    ///
    /// Parents that have been reclaimed are dropped from the node's parent
    /// list here.
    pub fn u(&self, node: &Node<G>) -> f64 {
        let mut parent_visits: u64 = 0;
        let mut expired: SmallVec<[NodeId; 2]> = SmallVec::new();

        for parent in node.parents() {
            match self.node(parent) {
                Some(parent) => parent_visits += u64::from(parent.visits()),
                None => expired.push(parent),
            }
        }

        if !expired.is_empty() {
            let mut data = node.lock();
            for parent in expired {
                data.remove_parent(parent);
            }
        }

        self.config.exploration_constant * (parent_visits as f64).sqrt()
            / (1.0 + f64::from(node.visits()))
    }

    /// `Q + U` for the node's own player.
    pub fn puct(&self, node: &Node<G>) -> f64 {
        self.q(node) + self.u(node)
    }

    /// Score of `child` as seen by the player choosing it: `(1 - Q) + U`.
    pub fn selection_score(&self, child: &Node<G>) -> f64 {
        (1.0 - self.q(child)) + self.u(child)
    }

    /// Child with the highest selection score, as (move index, child).
    /// The first maximum wins. `None` if the node has no live child.
    pub fn max_puct(&self, node: &Node<G>) -> Option<(usize, Arc<Node<G>>)> {
        let mut best: Option<(usize, Arc<Node<G>>)> = None;
        let mut best_score = f64::NEG_INFINITY;

        for (move_index, id) in node.children() {
            let Some(child) = self.node(id) else {
                continue;
            };
            let score = self.selection_score(&child);
            if score > best_score {
                best_score = score;
                best = Some((move_index, child));
            }
        }

        best
    }

    /// Walk from `start` to a leaf by `max_puct`, counting a visit on every
    /// node passed, the leaf included. Returns the path, `start` first.
    pub fn select(&self, start: &Arc<Node<G>>) -> Vec<Arc<Node<G>>> {
        let mut path = Vec::with_capacity(64);
        let mut current = Arc::clone(start);

        loop {
            let next = if current.is_expanded() {
                self.max_puct(&current)
            } else {
                None
            };
            current.lock().visits += 1;
            path.push(Arc::clone(&current));

            match next {
                Some((_, child)) => current = child,
                None => break,
            }
        }

        path
    }

    /// Attach one child per legal move.
    ///
    /// Counts a visit on a live node. Returns `false` without touching the
    /// children if the node is already expanded or another thread is
    /// expanding it. The child list is published in one step, so readers
    /// never observe a partial expansion.
    ///
    /// A node that has been reclaimed is never expanded: the call returns
    /// `false`, and edges attached while the node was being reclaimed are
    /// released again.
    pub fn expand(&self, node: &Arc<Node<G>>) -> bool {
        if self.node(node.id()).is_none() {
            debug!("expand on reclaimed {}", node.id());
            return false;
        }
        {
            let mut data = node.lock();
            data.visits += 1;
            if data.expansion != Expansion::Leaf {
                return false;
            }
            data.expansion = Expansion::Expanding;
        }

        let children: Vec<Option<NodeId>> = node
            .moves()
            .iter()
            .map(|mv| {
                let state = self.game.apply(node.state(), mv);
                Some(self.get_node(&state, Some(node.id())).id())
            })
            .collect();

        {
            let mut data = node.lock();
            data.children = children;
            data.expansion = Expansion::Expanded;
        }

        if self.node(node.id()).is_some() {
            return true;
        }
        // Reclaimed meanwhile; whoever takes the child list releases it
        let orphaned = {
            let mut data = node.lock();
            data.expansion = Expansion::Leaf;
            std::mem::take(&mut data.children)
        };
        self.release_edges(orphaned.into_iter().flatten().map(|child| (node.id(), child)));
        false
    }

    /// Credit a playout result to every node on `path`.
    pub fn backpropagate(&self, result: &GameResult, path: &[Arc<Node<G>>]) {
        for node in path {
            let mut data = node.lock();
            match result {
                GameResult::Winner(winner) if *winner == node.player() => data.wins += 1,
                GameResult::Draw => data.ties += 1,
                GameResult::Winner(_) => {}
            }
            debug_assert!(
                data.wins + data.ties <= data.visits,
                "{} credited more results than visits",
                node.id()
            );
        }
    }

    /// One select / playout / backpropagate / expand cycle.
    fn iterate(&self, root: &Arc<Node<G>>, rng: &mut PlayoutRng, stats: &mut SearchStats) {
        let path = self.select(root);
        let Some(leaf) = path.last() else {
            return;
        };

        let result = self
            .playout
            .playout(&self.game, leaf.state(), rng, self.config.playout_max_depth);
        stats.playouts += 1;

        self.backpropagate(&result, &path);

        if !self.game.is_terminal(leaf.state()) && self.expand(leaf) {
            stats.expansions += 1;
        }

        stats.iterations += 1;
        stats.max_depth = stats.max_depth.max((path.len() - 1) as u16);
    }

    /// Run `iterations` MCTS iterations from `state` on the calling thread.
    pub fn mcts(&self, state: &G::State, iterations: u32) -> SearchStats {
        let start = Instant::now();
        let root = self.get_node(state, None);
        let mut rng = self.rng.lock().fork();
        let mut stats = SearchStats::new();

        for _ in 0..iterations {
            self.iterate(&root, &mut rng, &mut stats);
        }

        stats.time_us = start.elapsed().as_micros() as u64;
        debug!(
            "mcts: {} iterations in {}us, {} expansions, tree size {}",
            stats.iterations,
            stats.time_us,
            stats.expansions,
            self.size()
        );
        stats
    }

    /// Run MCTS and return the chosen move from `state`.
    pub fn search(&self, state: &G::State, iterations: u32) -> Option<G::Move> {
        self.mcts(state, iterations);
        let root = self.find(state)?;
        self.get_move(&root)
    }

    /// Move to play from `node`: the child with the lowest Q, ties broken
    /// by more visits. `None` if the node was never expanded.
    pub fn get_move(&self, node: &Node<G>) -> Option<G::Move> {
        if !node.is_expanded() {
            return None;
        }

        let mut best: Option<(usize, f64, u32)> = None;
        for (move_index, id) in node.children() {
            let Some(child) = self.node(id) else {
                continue;
            };
            let stats = child.stats();
            let q = q_value(stats.wins, stats.ties, stats.visits, self.config.tie_reward);
            self.observer.on_event(&TreeEvent::MoveEvaluated {
                parent: node.id(),
                move_index,
                visits: stats.visits,
                q,
            });

            let better = match best {
                None => true,
                Some((_, best_q, best_visits)) => {
                    q < best_q || (q == best_q && stats.visits > best_visits)
                }
            };
            if better {
                best = Some((move_index, q, stats.visits));
            }
        }

        best.map(|(move_index, _, _)| node.moves()[move_index].clone())
    }

    /// Visit counts of the node's live children, as (move index, visits).
    #[must_use]
    pub fn child_visits(&self, node: &Node<G>) -> Vec<(usize, u32)> {
        node.children()
            .into_iter()
            .filter_map(|(move_index, id)| self.node(id).map(|child| (move_index, child.visits())))
            .collect()
    }
}

impl<G: PolicyGrid> Tree<G> {
    /// Grid of `1 - Q(child)` values at each legal move's cell.
    ///
    /// All zeros if the node was never expanded.
    #[must_use]
    pub fn get_policy(&self, node: &Node<G>) -> MovePolicy {
        let (rows, cols) = self.game.policy_shape();
        let mut policy = MovePolicy::zeros(rows, cols);
        if !node.is_expanded() {
            return policy;
        }

        for (move_index, id) in node.children() {
            let Some(child) = self.node(id) else {
                continue;
            };
            let (row, col) = self.game.policy_coords(&node.moves()[move_index]);
            policy.set(row, col, 1.0 - self.q(&child) + POLICY_EPSILON);
        }
        policy
    }
}

impl<G> Tree<G>
where
    G: Game + Sync,
    G::State: Send + Sync,
    G::Move: Send + Sync,
{
    /// Run `iterations` iterations spread over `workers` threads sharing
    /// one root. Each worker owns an RNG forked from the tree's base
    /// stream. `workers == 0` is treated as one.
    pub fn mcts_parallel(&self, state: &G::State, iterations: u32, workers: usize) -> SearchStats {
        let start = Instant::now();
        let workers = workers.max(1);
        let root = self.get_node(state, None);
        let rngs: Vec<PlayoutRng> = {
            let mut base = self.rng.lock();
            (0..workers).map(|_| base.fork()).collect()
        };

        let per_worker = iterations / workers as u32;
        let remainder = iterations % workers as u32;

        let mut stats = std::thread::scope(|scope| {
            let handles: Vec<_> = rngs
                .into_iter()
                .enumerate()
                .map(|(worker, mut rng)| {
                    let quota = per_worker + u32::from((worker as u32) < remainder);
                    let root = &root;
                    scope.spawn(move || {
                        let mut stats = SearchStats::new();
                        for _ in 0..quota {
                            self.iterate(root, &mut rng, &mut stats);
                        }
                        stats
                    })
                })
                .collect();

            let mut total = SearchStats::new();
            for handle in handles {
                let worker_stats = handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                total.merge(&worker_stats);
            }
            total
        });

        stats.time_us = start.elapsed().as_micros() as u64;
        debug!(
            "mcts_parallel: {} iterations on {} workers in {}us, tree size {}",
            stats.iterations,
            workers,
            stats.time_us,
            self.size()
        );
        stats
    }
}

/// Row-major grid of move values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovePolicy {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl MovePolicy {
    /// All-zero grid.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![0.0; rows * cols],
        }
    }

    /// Grid dimensions as (rows, cols).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Value at a cell.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[self.offset(row, col)]
    }

    fn set(&mut self, row: usize, col: usize, value: f64) {
        let offset = self.offset(row, col);
        self.values[offset] = value;
    }

    fn offset(&self, row: usize, col: usize) -> usize {
        assert!(
            row < self.rows && col < self.cols,
            "cell ({row}, {col}) outside {}x{} policy grid",
            self.rows,
            self.cols
        );
        row * self.cols + col
    }

    /// Row-major values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Check if every cell is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }
}
