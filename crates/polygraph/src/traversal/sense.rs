use std::{cmp::Ordering, collections::VecDeque};

use ahash::HashSet;

use crate::{DetailedGraph, EdgeId, NodeId};

type NodePredicate<'g> = Box<dyn Fn(NodeId) -> bool + 'g>;

/// A breadth-first walk that only moves along edges in their direction, from source to target
///
/// Each node is yielded at most once, so cycles terminate the walk instead of trapping it. The successors of a node
/// are offered to the queue in the order of an optional comparator (falling back to edge index order), and can be
/// filtered by which nodes are admitted and which edges are followed.
///
/// When [`SenseIter::one_linker_in_flight`] is set, at most one linker node may be waiting in the queue at a time.
/// Any other linkers reached in the meantime are deferred, and only offered again once the queue runs dry, so they
/// never overtake nodes that were already waiting.
pub struct SenseIter<'g> {
    graph: &'g DetailedGraph,
    start: Option<NodeId>,
    queue: VecDeque<NodeId>,
    visited: HashSet<NodeId>,
    admit: NodePredicate<'g>,
    follow: Box<dyn Fn(EdgeId) -> bool + 'g>,
    order: Option<Box<dyn Fn(NodeId, NodeId) -> Ordering + 'g>>,
    guard: Option<LinkerGuard<'g>>,
}

struct LinkerGuard<'g> {
    is_linker: NodePredicate<'g>,
    in_flight: Option<NodeId>,
    deferred: VecDeque<NodeId>,
}

impl<'g> SenseIter<'g> {
    #[must_use]
    pub fn new(graph: &'g DetailedGraph, start: NodeId) -> Self {
        Self {
            graph,
            start: Some(start),
            queue: VecDeque::new(),
            visited: HashSet::default(),
            admit: Box::new(|_| true),
            follow: Box::new(|_| true),
            order: None,
            guard: None,
        }
    }

    /// Only yields (and walks through) nodes satisfying `admit`
    #[must_use]
    pub fn admit(mut self, admit: impl Fn(NodeId) -> bool + 'g) -> Self {
        self.admit = Box::new(admit);
        self
    }

    /// Only walks along edges satisfying `follow`
    #[must_use]
    pub fn follow(mut self, follow: impl Fn(EdgeId) -> bool + 'g) -> Self {
        self.follow = Box::new(follow);
        self
    }

    /// Offers the successors of each node in the order given by `compare`
    #[must_use]
    pub fn order_by(mut self, compare: impl Fn(NodeId, NodeId) -> Ordering + 'g) -> Self {
        self.order = Some(Box::new(compare));
        self
    }

    #[must_use]
    pub fn one_linker_in_flight(mut self, is_linker: impl Fn(NodeId) -> bool + 'g) -> Self {
        self.guard = Some(LinkerGuard {
            is_linker: Box::new(is_linker),
            in_flight: None,
            deferred: VecDeque::new(),
        });
        self
    }

    fn offer(&mut self, node: NodeId) {
        if self.visited.contains(&node) || !(self.admit)(node) {
            return;
        }

        if let Some(guard) = &mut self.guard {
            if (guard.is_linker)(node) {
                if guard.in_flight.is_some() {
                    if !guard.deferred.contains(&node) {
                        guard.deferred.push_back(node);
                    }
                    return;
                }
                guard.in_flight = Some(node);
            }
        }

        self.visited.insert(node);
        self.queue.push_back(node);
    }

    // Offers deferred linkers until one of them is admitted
    fn release_deferred(&mut self) {
        loop {
            let next = self.guard.as_mut().and_then(|guard| {
                guard
                    .in_flight
                    .is_none()
                    .then(|| guard.deferred.pop_front())
                    .flatten()
            });
            let Some(node) = next else {
                break;
            };
            self.offer(node);
        }
    }
}

impl Iterator for SenseIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(start) = self.start.take() {
            if self.graph.node(start).is_ok() {
                self.offer(start);
            }
        }

        if self.queue.is_empty() {
            self.release_deferred();
        }
        let node = self.queue.pop_front()?;

        if let Some(guard) = &mut self.guard {
            if guard.in_flight == Some(node) {
                guard.in_flight = None;
            }
        }

        let mut successors: Vec<_> = self
            .graph
            .successors(node)
            .into_iter()
            .filter(|&(edge, _)| (self.follow)(edge))
            .map(|(_, target)| target)
            .collect();
        if let Some(compare) = &self.order {
            successors.sort_by(|&a, &b| compare(a, b));
        }
        for successor in successors {
            self.offer(successor);
        }

        Some(node)
    }
}
