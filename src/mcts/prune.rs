//! Memory bounding: discarding subtrees the search no longer needs.
//!
//! - `filicide`: drop all of a node's children, keep the node
//! - `prune`: keep only the most-visited line below each root
//! - `prune_children`: filicide the children a parent would never pick
//! - `prune_ancestors`: after committing to a position, cut every branch
//!   of its ancestors that does not lead to it
//!
//! Children released by any of these are reclaimed once no other parent
//! holds them. Pruning is meant to run between searches.

use std::collections::VecDeque;
use std::sync::Arc;

use log::debug;
use rustc_hash::FxHashSet;

use crate::rules::Game;

use super::node::{Expansion, Node, NodeId};
use super::tree::Tree;

impl<G: Game> Tree<G> {
    /// Release every child edge of `node` and mark it unexpanded. The
    /// node's own statistics are untouched.
    ///
    /// Returns `false` if the node was not expanded.
    pub fn filicide(&self, node: &Node<G>) -> bool {
        let children = {
            let mut data = node.lock();
            if !data.is_expanded() {
                return false;
            }
            data.expansion = Expansion::Leaf;
            std::mem::take(&mut data.children)
        };

        self.release_edges(children.into_iter().flatten().map(|child| (node.id(), child)));
        true
    }

    /// Shrink the tree towards `max_size` nodes.
    ///
    /// Walks breadth-first from the roots. At each node, the most-visited
    /// child (first one on ties) is kept and queued; every other child is
    /// filicided. Each node is visited at most once, so a call always
    /// terminates, even if the tree cannot get below `max_size`.
    ///
    /// Returns the number of children filicided.
    pub fn prune(&self, max_size: usize) -> usize {
        let _serial = self.prune_lock.lock();
        let size_before = self.size();
        let mut frontier: VecDeque<NodeId> = self.roots().into();
        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        let mut discarded = 0;

        while self.size() > max_size {
            let Some(id) = frontier.pop_front() else {
                break;
            };
            if !seen.insert(id) {
                continue;
            }
            let Some(node) = self.node(id) else {
                continue;
            };

            let children: Vec<(Arc<Node<G>>, u32)> = node
                .children()
                .into_iter()
                .filter_map(|(_, child)| self.node(child))
                .map(|child| {
                    let visits = child.visits();
                    (child, visits)
                })
                .collect();

            let mut keep: Option<usize> = None;
            for (i, (_, visits)) in children.iter().enumerate() {
                if keep.map_or(true, |k| *visits > children[k].1) {
                    keep = Some(i);
                }
            }
            let Some(keep) = keep else {
                continue;
            };

            for (i, (child, _)) in children.iter().enumerate() {
                if i != keep && self.filicide(child) {
                    discarded += 1;
                }
            }
            frontier.push_back(children[keep].0.id());
        }

        debug!(
            "prune({max_size}): {discarded} subtrees discarded, size {size_before} -> {}",
            self.size()
        );
        discarded
    }

    /// Filicide every child whose selection score is strictly below the
    /// best child's.
    ///
    /// Returns the number of children filicided.
    pub fn prune_children(&self, node: &Node<G>) -> usize {
        let scored: Vec<(Arc<Node<G>>, f64)> = node
            .children()
            .into_iter()
            .filter_map(|(_, id)| self.node(id))
            .map(|child| {
                let score = self.selection_score(&child);
                (child, score)
            })
            .collect();

        let best = scored
            .iter()
            .map(|(_, score)| *score)
            .fold(f64::NEG_INFINITY, f64::max);

        scored
            .iter()
            .filter(|(_, score)| *score < best)
            .filter(|(child, _)| self.filicide(child))
            .count()
    }

    /// Cut every branch of `node`'s ancestors that does not lead to it.
    ///
    /// The ancestor set is every node from which `node` is reachable
    /// through parent links. In each ancestor, child slots pointing
    /// outside that set (and not at `node`) are emptied and their edges
    /// released. `node` itself is untouched.
    ///
    /// Returns the number of edges cut.
    pub fn prune_ancestors(&self, node: &Node<G>) -> usize {
        let mut on_line: FxHashSet<NodeId> = FxHashSet::default();
        on_line.insert(node.id());

        let mut ancestors: Vec<Arc<Node<G>>> = Vec::new();
        let mut queue: VecDeque<NodeId> = node.parents().into();
        while let Some(id) = queue.pop_front() {
            let Some(ancestor) = self.node(id) else {
                continue;
            };
            if on_line.insert(id) {
                queue.extend(ancestor.parents());
                ancestors.push(ancestor);
            }
        }

        let mut cut = 0;
        for ancestor in &ancestors {
            let released: Vec<NodeId> = {
                let mut data = ancestor.lock();
                data.children
                    .iter_mut()
                    .filter_map(|slot| {
                        let child = (*slot)?;
                        if on_line.contains(&child) {
                            None
                        } else {
                            slot.take()
                        }
                    })
                    .collect()
            };
            cut += released.len();
            self.release_edges(released.into_iter().map(|child| (ancestor.id(), child)));
        }

        debug!(
            "prune_ancestors({}): {} ancestors, {cut} edges cut, size {}",
            node.id(),
            ancestors.len(),
            self.size()
        );
        cut
    }
}
