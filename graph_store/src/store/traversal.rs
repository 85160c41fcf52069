//! Breadth-first traversal and shortest-path search.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::str::FromStr;

use super::{GraphStore, NodeHandle};
use crate::error::{Result, StoreError};

/// Which edges a traversal follows from each node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Follow edges from the node to its successors.
    Outgoing,
    /// Follow edges from predecessors to the node.
    Incoming,
    /// Follow both.
    #[default]
    Both,
}

impl FromStr for Direction {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "outgoing" => Ok(Direction::Outgoing),
            "incoming" => Ok(Direction::Incoming),
            "both" => Ok(Direction::Both),
            other => Err(StoreError::InvalidDirection(other.to_string())),
        }
    }
}

impl GraphStore {
    /// Find every entity reachable from `start` within `max_depth` hops.
    ///
    /// # Algorithm
    ///
    /// 1. Seed a FIFO queue with `(start, 0)` and mark `start` visited
    /// 2. Expand a dequeued node only while its depth is below `max_depth`
    /// 3. A neighbor is accepted when unvisited and, if `relation_types` is
    ///    set, some edge `current -> neighbor` has one of those types. Under
    ///    [`Direction::Both`] an edge `neighbor -> current` also counts, so an
    ///    `Incoming` walk with relation types only crosses typed edges that
    ///    point away from the current node.
    /// 4. Accepted neighbors are returned in discovery order; `start` never is
    ///
    /// An unknown `start` yields no results. An empty `relation_types` slice
    /// is treated as no restriction.
    pub fn find_connected(
        &self,
        start: &str,
        max_depth: usize,
        relation_types: Option<&[String]>,
        direction: Direction,
    ) -> Vec<String> {
        let Some(start) = self.handle(start) else {
            return Vec::new();
        };
        let relation_types = relation_types.filter(|types| !types.is_empty());

        let mut visited: HashSet<NodeHandle> = HashSet::from([start]);
        let mut queue: VecDeque<(NodeHandle, usize)> = VecDeque::from([(start, 0)]);
        let mut connected = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }

            for neighbor in self.neighbors(current, direction) {
                if visited.contains(&neighbor) {
                    continue;
                }

                let accepted = match relation_types {
                    None => true,
                    Some(types) => match direction {
                        Direction::Outgoing | Direction::Incoming => {
                            self.has_typed_edge(current, neighbor, types)
                        }
                        Direction::Both => {
                            self.has_typed_edge(current, neighbor, types)
                                || self.has_typed_edge(neighbor, current, types)
                        }
                    },
                };

                if accepted {
                    visited.insert(neighbor);
                    queue.push_back((neighbor, depth + 1));
                    connected.push(self.id_of(neighbor).to_string());
                }
            }
        }

        connected
    }

    /// All shortest directed paths from `from` to `to` using at most
    /// `max_hops` edges.
    ///
    /// Returns an empty list when no path fits the bound, and `[[from]]`
    /// when both ends are the same entity.
    pub fn shortest_paths(&self, from: &str, to: &str, max_hops: usize) -> Result<Vec<Vec<String>>> {
        let mut missing: Vec<String> = Vec::new();
        for id in [from, to] {
            if !self.contains_entity(id) && !missing.iter().any(|m| m == id) {
                missing.push(id.to_string());
            }
        }
        let (Some(source), Some(target)) = (self.handle(from), self.handle(to)) else {
            return Err(StoreError::EntityNotFound(missing));
        };

        if source == target {
            return Ok(vec![vec![from.to_string()]]);
        }

        let mut depth: HashMap<NodeHandle, usize> = HashMap::from([(source, 0)]);
        let mut parents: HashMap<NodeHandle, Vec<NodeHandle>> = HashMap::new();
        let mut frontier = vec![source];
        let mut level = 0;

        while !frontier.is_empty() && level < max_hops && !depth.contains_key(&target) {
            let mut next = Vec::new();
            for &node in &frontier {
                for neighbor in self.neighbors(node, Direction::Outgoing) {
                    match depth.get(&neighbor) {
                        None => {
                            depth.insert(neighbor, level + 1);
                            parents.entry(neighbor).or_default().push(node);
                            next.push(neighbor);
                        }
                        Some(&d) if d == level + 1 => {
                            parents.entry(neighbor).or_default().push(node);
                        }
                        Some(_) => {}
                    }
                }
            }
            frontier = next;
            level += 1;
        }

        let mut paths = Vec::new();
        if depth.contains_key(&target) {
            let mut trail = Vec::new();
            self.unwind_paths(&parents, source, target, &mut trail, &mut paths);
        }
        Ok(paths)
    }

    /// Distinct neighbors of a node, successors before predecessors.
    pub(crate) fn neighbors(&self, handle: NodeHandle, direction: Direction) -> Vec<NodeHandle> {
        let Some(slot) = self.node(handle) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut neighbors = Vec::new();

        if matches!(direction, Direction::Outgoing | Direction::Both) {
            for edge in slot.outgoing.iter().filter_map(|e| self.edge(*e)) {
                if seen.insert(edge.target) {
                    neighbors.push(edge.target);
                }
            }
        }
        if matches!(direction, Direction::Incoming | Direction::Both) {
            for edge in slot.incoming.iter().filter_map(|e| self.edge(*e)) {
                if seen.insert(edge.source) {
                    neighbors.push(edge.source);
                }
            }
        }

        neighbors
    }

    /// Whether any edge `from -> to` has a type in `types`.
    fn has_typed_edge(&self, from: NodeHandle, to: NodeHandle, types: &[String]) -> bool {
        self.node(from).is_some_and(|slot| {
            slot.outgoing
                .iter()
                .filter_map(|e| self.edge(*e))
                .any(|edge| edge.target == to && edge.relationship.has_type_in(types))
        })
    }

    fn unwind_paths(
        &self,
        parents: &HashMap<NodeHandle, Vec<NodeHandle>>,
        source: NodeHandle,
        current: NodeHandle,
        trail: &mut Vec<NodeHandle>,
        paths: &mut Vec<Vec<String>>,
    ) {
        trail.push(current);
        if current == source {
            paths.push(trail.iter().rev().map(|h| self.id_of(*h).to_string()).collect());
        } else if let Some(preds) = parents.get(&current) {
            for &pred in preds {
                self.unwind_paths(parents, source, pred, trail, paths);
            }
        }
        trail.pop();
    }
}
