//! The authoring-time block graph.
//!
//! Blocks are nodes with at most one successor each. The successor relation is kept as an
//! explicit `id → id` map and stays acyclic because [`BlockGraph::connect`] refuses any edge
//! whose target can already reach its source. Several independent chains may coexist, but
//! only the chain that starts at [`BEGIN_NODE`] is ever compiled.

use crate::instruction::{Condition, ConditionSlot, InstructionKind};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, trace};

/// A unique identifier for a block in the graph.
pub type NodeId = u32;

/// The id of the `Begin` block every graph is created with.
pub const BEGIN_NODE: NodeId = 0;

/// Canvas footprint of a statement block.
pub const STATEMENT_SIZE: Vec2 = Vec2::new(90.0, 30.0);

/// Canvas footprint of an `If`/`While` block, which also shows its operand slots.
pub const CONTROL_SIZE: Vec2 = Vec2::new(200.0, 30.0);

/// A single block on the canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockNode {
    pub kind: InstructionKind,

    /// Top-left corner on the editor canvas.
    pub position: Vec2,

    /// Operand slots; `Some` exactly for `If`/`While`.
    pub condition: Option<Condition>,
}

impl BlockNode {
    fn new(kind: InstructionKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            condition: kind.is_control().then(Condition::default),
        }
    }

    pub fn size(&self) -> Vec2 {
        if self.kind.is_control() {
            CONTROL_SIZE
        } else {
            STATEMENT_SIZE
        }
    }

    /// Strict point-in-rectangle test against the block's footprint.
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.position + self.size();
        point.x > self.position.x && point.x < max.x && point.y > self.position.y && point.y < max.y
    }
}

/// Reasons a serialized graph is rejected on load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("graph has no begin block")]
    MissingBegin,

    #[error("block {0} has a kind or condition it can't hold")]
    InvalidNode(NodeId),

    #[error("link {from} -> {to} names a block that doesn't exist")]
    UnknownLink { from: NodeId, to: NodeId },

    #[error("links starting at block {0} form a cycle")]
    Cycle(NodeId),

    #[error("next id {next_id} is not above existing block {id}")]
    StaleNextId { next_id: NodeId, id: NodeId },
}

/// The editable program: blocks plus their successor links.
///
/// Every mutation is total. Unknown ids, illegal kinds and cycle-forming links are ignored
/// rather than reported; the boolean results only say whether anything changed.
/// Deserialized graphs are checked for the same invariants before use.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawBlockGraph")]
pub struct BlockGraph {
    nodes: BTreeMap<NodeId, BlockNode>,
    successors: HashMap<NodeId, NodeId>,
    next_id: NodeId,
}

impl Default for BlockGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockGraph {
    /// Creates a graph holding only the `Begin` block at the origin.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(BEGIN_NODE, BlockNode::new(InstructionKind::Begin, Vec2::ZERO));
        Self {
            nodes,
            successors: HashMap::new(),
            next_id: BEGIN_NODE + 1,
        }
    }

    /// Places a new block with no successor and returns its id.
    ///
    /// Returns `None` for kinds that can't stand alone (`Begin` and the operand kinds).
    /// `If`/`While` blocks start with both operand slots `Blank`.
    pub fn add_node(&mut self, kind: InstructionKind, position: Vec2) -> Option<NodeId> {
        if !kind.is_placeable() {
            trace!(%kind, "refusing to place operand or begin block");
            return None;
        }
        let id = self.next_id;
        self.next_id = id.checked_add(1)?;
        self.nodes.insert(id, BlockNode::new(kind, position));
        debug!(id, %kind, "block added");
        Some(id)
    }

    /// Links `from → to`, replacing any previous successor of `from`.
    ///
    /// Rejected (returns `false`) when either id is unknown or when `to` already reaches
    /// `from`, since the new edge would close a cycle. Self-links fall under the latter.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> bool {
        if !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
            return false;
        }
        if self.reachable(to, from) {
            trace!(from, to, "link rejected: would form a cycle");
            return false;
        }
        self.successors.insert(from, to);
        trace!(from, to, "blocks linked");
        true
    }

    /// Clears the successor of `from`, returning the old one.
    pub fn disconnect(&mut self, from: NodeId) -> Option<NodeId> {
        self.successors.remove(&from)
    }

    /// Writes `kind` into one operand slot of an `If`/`While` block.
    ///
    /// No-op for statement blocks, unknown ids, or a kind the slot doesn't accept.
    pub fn set_condition(
        &mut self,
        id: NodeId,
        slot: ConditionSlot,
        kind: InstructionKind,
    ) -> bool {
        if !slot.accepts(kind) {
            return false;
        }
        match self.nodes.get_mut(&id).and_then(|n| n.condition.as_mut()) {
            Some(condition) => {
                *condition.slot_mut(slot) = kind;
                true
            }
            None => false,
        }
    }

    /// Drops an operand onto whichever control block lies under `point`.
    ///
    /// `ConditionNot` fills the negation slot; a `Facing*` kind fills the predicate slot.
    pub fn drop_condition(&mut self, point: Vec2, kind: InstructionKind) -> bool {
        let slot = if kind == InstructionKind::ConditionNot {
            ConditionSlot::Negation
        } else if kind.is_predicate() {
            ConditionSlot::Predicate
        } else {
            return false;
        };
        match self.node_at(point) {
            Some(id) => self.set_condition(id, slot, kind),
            None => false,
        }
    }

    /// Deletes the given blocks. `Begin` is skipped.
    ///
    /// Links pointing at a removed block are cut, not spliced: its predecessor ends up with
    /// no successor at all. Links leaving the removed block are dropped with it.
    pub fn remove(&mut self, ids: &[NodeId]) -> usize {
        let mut removed = 0;
        for &id in ids {
            if id == BEGIN_NODE || self.nodes.remove(&id).is_none() {
                continue;
            }
            self.successors.retain(|_, next| *next != id);
            self.successors.remove(&id);
            removed += 1;
            debug!(id, "block removed");
        }
        removed
    }

    /// Whether `to` is met while following successors from `from` (inclusive).
    pub fn reachable(&self, from: NodeId, to: NodeId) -> bool {
        let mut current = Some(from);
        while let Some(id) = current {
            if id == to {
                return true;
            }
            current = self.successors.get(&id).copied();
        }
        false
    }

    pub fn node(&self, id: NodeId) -> Option<&BlockNode> {
        self.nodes.get(&id)
    }

    pub fn successor(&self, id: NodeId) -> Option<NodeId> {
        self.successors.get(&id).copied()
    }

    /// All blocks in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &BlockNode)> {
        self.nodes.iter().map(|(&id, node)| (id, node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true in practice; `Begin` can't be removed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids along the compiled chain, starting at `Begin`.
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            graph: self,
            next: Some(BEGIN_NODE),
        }
    }

    // --- Canvas queries ---

    /// Moves a block's top-left corner.
    pub fn move_node(&mut self, id: NodeId, position: Vec2) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// The lowest-id block whose footprint contains `point`.
    pub fn node_at(&self, point: Vec2) -> Option<NodeId> {
        self.nodes()
            .find(|(_, node)| node.contains(point))
            .map(|(id, _)| id)
    }

    /// Blocks lying strictly inside the rectangle spanned by two corners.
    pub fn nodes_within(&self, a: Vec2, b: Vec2) -> Vec<NodeId> {
        let min = a.min(b);
        let max = a.max(b);
        self.nodes()
            .filter(|(_, node)| {
                let end = node.position + node.size();
                min.x < node.position.x && min.y < node.position.y && max.x > end.x && max.y > end.y
            })
            .map(|(id, _)| id)
            .collect()
    }
}

/// The serialized shape of a [`BlockGraph`], checked before use.
#[derive(Deserialize)]
struct RawBlockGraph {
    nodes: BTreeMap<NodeId, BlockNode>,
    successors: HashMap<NodeId, NodeId>,
    next_id: NodeId,
}

impl TryFrom<RawBlockGraph> for BlockGraph {
    type Error = GraphError;

    fn try_from(raw: RawBlockGraph) -> Result<Self, Self::Error> {
        match raw.nodes.get(&BEGIN_NODE) {
            Some(node) if node.kind == InstructionKind::Begin && node.condition.is_none() => {}
            Some(_) => return Err(GraphError::InvalidNode(BEGIN_NODE)),
            None => return Err(GraphError::MissingBegin),
        }

        for (&id, node) in raw.nodes.range(BEGIN_NODE + 1..) {
            let slots_ok = match node.condition {
                Some(condition) => {
                    node.kind.is_control()
                        && ConditionSlot::Negation.accepts(condition.negation)
                        && ConditionSlot::Predicate.accepts(condition.predicate)
                }
                None => !node.kind.is_control(),
            };
            if !node.kind.is_placeable() || !slots_ok {
                return Err(GraphError::InvalidNode(id));
            }
            if id >= raw.next_id {
                return Err(GraphError::StaleNextId {
                    next_id: raw.next_id,
                    id,
                });
            }
        }

        for (&from, &to) in &raw.successors {
            if !raw.nodes.contains_key(&from) || !raw.nodes.contains_key(&to) {
                return Err(GraphError::UnknownLink { from, to });
            }
        }

        // An acyclic walk visits each block at most once.
        for &start in raw.nodes.keys() {
            let mut current = raw.successors.get(&start).copied();
            for _ in 0..raw.nodes.len() {
                match current {
                    Some(id) => current = raw.successors.get(&id).copied(),
                    None => break,
                }
            }
            if current.is_some() {
                return Err(GraphError::Cycle(start));
            }
        }

        Ok(Self {
            nodes: raw.nodes,
            successors: raw.successors,
            next_id: raw.next_id.max(BEGIN_NODE + 1),
        })
    }
}

/// Iterator over the chain of block ids reachable from `Begin`.
pub struct Chain<'a> {
    graph: &'a BlockGraph,
    next: Option<NodeId>,
}

impl Iterator for Chain<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.graph.successor(id);
        Some(id)
    }
}
