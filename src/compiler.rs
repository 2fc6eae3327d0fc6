//! Linearizes a [`BlockGraph`] into a flat, bracket-checked [`Program`].
//!
//! The walk starts at [`BEGIN_NODE`](crate::graph::BEGIN_NODE) and follows successors to the
//! end of the chain. `If` and `While` expand into three tokens
//! (`[opener, negation, predicate]`); everything else is one token. A stack of open control
//! kinds checks nesting as the chain is emitted, so the first structural problem met is the
//! one reported.

use crate::graph::{BlockGraph, NodeId};
use crate::instruction::{Condition, InstructionKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// The structural problems a chain can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum CompileErrorKind {
    /// An `If`/`While` whose predicate slot is still `Blank`.
    #[error("incomplete condition")]
    IncompleteCondition,
    /// An `EndIf`/`EndWhile` that doesn't close the innermost open block.
    #[error("unmatched end")]
    UnmatchedEnd,
    /// An `If`/`While` left open at the end of the chain.
    #[error("missing end")]
    MissingEnd,
}

/// A structural error pinned to the block that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("block {node}: {message}")]
pub struct CompileError {
    pub node: NodeId,
    pub kind: CompileErrorKind,
    /// Text meant for display next to the offending block.
    pub message: String,
}

impl CompileError {
    fn incomplete(node: NodeId) -> Self {
        Self {
            node,
            kind: CompileErrorKind::IncompleteCondition,
            message: "Incomplete conditional statement".to_string(),
        }
    }

    fn unmatched(node: NodeId, closer: InstructionKind) -> Self {
        let opener = closer.opener().unwrap_or(InstructionKind::Blank);
        Self {
            node,
            kind: CompileErrorKind::UnmatchedEnd,
            message: format!("No matching {opener} for {closer}"),
        }
    }

    fn missing_end(node: NodeId) -> Self {
        Self {
            node,
            kind: CompileErrorKind::MissingEnd,
            message: "Needs end statement".to_string(),
        }
    }
}

/// A compiled instruction sequence.
///
/// `origins` maps each index back to the block it came from so a front end can highlight
/// the running block. Operand slots map to their control block. Programs built directly
/// with [`Program::new`] have no origins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    instructions: Vec<InstructionKind>,
    origins: Vec<NodeId>,
}

impl Program {
    /// Wraps a hand-written token sequence. Index 0 is expected to be `Begin`.
    pub fn new(instructions: Vec<InstructionKind>) -> Self {
        Self {
            instructions,
            origins: Vec::new(),
        }
    }

    pub fn instructions(&self) -> &[InstructionKind] {
        &self.instructions
    }

    pub fn get(&self, index: usize) -> Option<InstructionKind> {
        self.instructions.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The block that produced the token at `index`.
    pub fn node_for(&self, index: usize) -> Option<NodeId> {
        self.origins.get(index).copied()
    }

    fn emit(&mut self, kind: InstructionKind, node: NodeId) {
        self.instructions.push(kind);
        self.origins.push(node);
    }
}

/// Compiles the chain reachable from `Begin`. Unreachable blocks are ignored.
///
/// On failure no program is produced; the error names the block to flag. For a chain left
/// with several open blocks, the oldest one is reported.
pub fn compile(graph: &BlockGraph) -> Result<Program, CompileError> {
    let mut program = Program::default();
    // (kind, node) of each still-open control block, innermost last.
    let mut open: Vec<(InstructionKind, NodeId)> = Vec::new();

    for id in graph.chain() {
        let Some(node) = graph.node(id) else {
            break;
        };
        let kind = node.kind;

        match kind {
            InstructionKind::If | InstructionKind::While => {
                let condition = node.condition.unwrap_or_default();
                if !condition.is_complete() {
                    return Err(report(CompileError::incomplete(id)));
                }
                open.push((kind, id));
                emit_control(&mut program, kind, condition, id);
            }
            InstructionKind::EndIf | InstructionKind::EndWhile => {
                match open.last() {
                    Some(&(top, _)) if Some(top) == kind.opener() => {
                        open.pop();
                    }
                    _ => return Err(report(CompileError::unmatched(id, kind))),
                }
                program.emit(kind, id);
            }
            _ => program.emit(kind, id),
        }
    }

    if let Some(&(_, oldest)) = open.first() {
        return Err(report(CompileError::missing_end(oldest)));
    }

    debug!(tokens = program.len(), "program compiled");
    Ok(program)
}

fn emit_control(program: &mut Program, kind: InstructionKind, condition: Condition, id: NodeId) {
    program.emit(kind, id);
    program.emit(condition.negation, id);
    program.emit(condition.predicate, id);
}

fn report(err: CompileError) -> CompileError {
    debug!(node = err.node, kind = ?err.kind, "compile failed");
    err
}

impl BlockGraph {
    /// Same as [`compile`]`(self)`.
    pub fn compile(&self) -> Result<Program, CompileError> {
        compile(self)
    }
}
