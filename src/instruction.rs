//! Instruction kinds shared by the block graph, the compiler and the interpreter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every token that can appear in a block graph or a compiled program.
///
/// `ConditionNot`, the `Facing*` predicates and `Blank` never stand alone: they only fill the
/// two operand slots that follow an [`If`](Self::If) or [`While`](Self::While).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionKind {
    // --- Statements ---
    /// Entry point. Exactly one exists per graph, as node 0.
    Begin,
    /// Step into the facing cell, pushing a crate if one is there.
    MoveForward,
    /// Rotate 90 degrees counter-clockwise.
    TurnLeft,
    /// Rotate 90 degrees clockwise.
    TurnRight,
    /// Win if the robot stands on the cheese.
    EatCheese,

    // --- Control ---
    If,
    EndIf,
    While,
    EndWhile,

    // --- Operands ---
    /// Negates the predicate that follows it.
    ConditionNot,
    FacingWall,
    FacingPit,
    FacingBlock,
    FacingCheese,
    /// An empty operand slot.
    Blank,
}

impl InstructionKind {
    /// `If` or `While`: compiles to three tokens and owns a [`Condition`].
    pub fn is_control(self) -> bool {
        matches!(self, Self::If | Self::While)
    }

    /// `EndIf` or `EndWhile`.
    pub fn is_closer(self) -> bool {
        matches!(self, Self::EndIf | Self::EndWhile)
    }

    /// The closer that pairs with this opener, if it is one.
    pub fn closer(self) -> Option<InstructionKind> {
        match self {
            Self::If => Some(Self::EndIf),
            Self::While => Some(Self::EndWhile),
            _ => None,
        }
    }

    /// The opener that this closer pairs with, if it is one.
    pub fn opener(self) -> Option<InstructionKind> {
        match self {
            Self::EndIf => Some(Self::If),
            Self::EndWhile => Some(Self::While),
            _ => None,
        }
    }

    /// One of the four facing-cell sensors.
    pub fn is_predicate(self) -> bool {
        matches!(
            self,
            Self::FacingWall | Self::FacingPit | Self::FacingBlock | Self::FacingCheese
        )
    }

    /// Anything that may only sit in an operand slot.
    pub fn is_operand(self) -> bool {
        matches!(self, Self::ConditionNot | Self::Blank) || self.is_predicate()
    }

    /// Kinds a user may place as a standalone block. `Begin` is created by the graph itself.
    pub fn is_placeable(self) -> bool {
        !self.is_operand() && self != Self::Begin
    }

    /// The caption shown on the block.
    pub fn label(self) -> &'static str {
        match self {
            Self::Begin => "Begin",
            Self::MoveForward => "Move Forward",
            Self::TurnLeft => "Turn Left",
            Self::TurnRight => "Turn Right",
            Self::EatCheese => "Eat Cheese",
            Self::If => "If",
            Self::EndIf => "End If",
            Self::While => "While",
            Self::EndWhile => "End While",
            Self::ConditionNot => "Not",
            Self::FacingWall => "Facing Wall",
            Self::FacingPit => "Facing Pit",
            Self::FacingBlock => "Facing Block",
            Self::FacingCheese => "Facing Cheese",
            Self::Blank => "",
        }
    }
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which operand of a control block is being addressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionSlot {
    /// Holds `ConditionNot` or `Blank`.
    Negation,
    /// Holds one of the `Facing*` kinds or `Blank`.
    Predicate,
}

impl ConditionSlot {
    /// Whether `kind` may be written into this slot.
    pub fn accepts(self, kind: InstructionKind) -> bool {
        match self {
            Self::Negation => {
                matches!(kind, InstructionKind::ConditionNot | InstructionKind::Blank)
            }
            Self::Predicate => kind.is_predicate() || kind == InstructionKind::Blank,
        }
    }
}

/// The operand pair carried by an `If`/`While` block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub negation: InstructionKind,
    pub predicate: InstructionKind,
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            negation: InstructionKind::Blank,
            predicate: InstructionKind::Blank,
        }
    }
}

impl Condition {
    pub fn is_negated(&self) -> bool {
        self.negation == InstructionKind::ConditionNot
    }

    /// A condition is complete once its predicate slot is filled.
    pub fn is_complete(&self) -> bool {
        self.predicate != InstructionKind::Blank
    }

    pub fn slot(&self, slot: ConditionSlot) -> InstructionKind {
        match slot {
            ConditionSlot::Negation => self.negation,
            ConditionSlot::Predicate => self.predicate,
        }
    }

    pub(crate) fn slot_mut(&mut self, slot: ConditionSlot) -> &mut InstructionKind {
        match slot {
            ConditionSlot::Negation => &mut self.negation,
            ConditionSlot::Predicate => &mut self.predicate,
        }
    }
}
