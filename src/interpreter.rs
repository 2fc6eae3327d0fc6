//! Step interpreter that drives the robot through a compiled [`Program`].
//!
//! The entry point is [`Interpreter`]. Build one from a [`GridWorld`] and a [`Program`],
//! optionally with an [`InterpreterConfig`], then call [`Interpreter::step`] once per tick
//! and watch [`Interpreter::run_state`] for the outcome.

use crate::compiler::Program;
use crate::graph::NodeId;
use crate::instruction::InstructionKind;
use crate::robot::{Direction, RobotState};
use crate::world::{GridWorld, Tile};
use glam::IVec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, trace};

/// Configuration for program execution.
#[derive(Clone, Debug)]
pub struct InterpreterConfig {
    /// Heading the robot spawns with. Default: East.
    pub initial_direction: Direction,
    /// Upper bound on total ticks for [`Interpreter::run`]. `None` means unbounded, so a
    /// loop that never exits keeps `run` spinning forever. [`Interpreter::step`] ignores it.
    pub max_ticks: Option<u64>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            initial_direction: Direction::East,
            max_ticks: None,
        }
    }
}

/// Outcome of a run. `Won` and `Lost` are terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    NotEnded,
    Won,
    Lost,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        self != RunState::NotEnded
    }
}

/// Matching opener/closer indices of a program, built once with a single stack scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JumpTable {
    open_to_close: HashMap<usize, usize>,
    close_to_open: HashMap<usize, usize>,
}

impl JumpTable {
    /// Pairs every `If`/`While` with the closer that ends it.
    ///
    /// Closers with nothing open are skipped and openers never closed get no entry; compiled
    /// programs have neither.
    pub fn build(instructions: &[InstructionKind]) -> Self {
        let mut table = Self::default();
        let mut stack = Vec::new();
        for (index, kind) in instructions.iter().enumerate() {
            if kind.is_control() {
                stack.push(index);
            } else if kind.is_closer()
                && let Some(open) = stack.pop()
            {
                table.open_to_close.insert(open, index);
                table.close_to_open.insert(index, open);
            }
        }
        table
    }

    /// Index of the closer matching the opener at `open`.
    pub fn close_for(&self, open: usize) -> Option<usize> {
        self.open_to_close.get(&open).copied()
    }

    /// Index of the opener matching the closer at `close`.
    pub fn open_for(&self, close: usize) -> Option<usize> {
        self.close_to_open.get(&close).copied()
    }

    /// Number of matched pairs.
    pub fn len(&self) -> usize {
        self.open_to_close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open_to_close.is_empty()
    }

    /// All `(open, close)` pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.open_to_close.iter().map(|(&o, &c)| (o, c))
    }
}

/// Executes a program against a grid world, one instruction per [`step`](Self::step).
///
/// Illegal moves are silent no-ops; the only outcomes are reported through [`RunState`].
/// A `Lost` run is finished for good: build a fresh interpreter from the original level to
/// try again.
pub struct Interpreter {
    world: GridWorld,
    program: Program,
    jumps: JumpTable,
    robot: RobotState,
    state: RunState,
    /// Index of the instruction executed last (0 = the implicit `Begin`).
    current: usize,
    /// Index the next `step` will execute.
    next: usize,
    ticks: u64,
    config: InterpreterConfig,
}

impl Interpreter {
    /// Creates an interpreter with the default configuration.
    pub fn new(world: GridWorld, program: Program) -> Self {
        Self::with_config(world, program, InterpreterConfig::default())
    }

    /// Creates an interpreter positioned on the `Begin` slot at index 0.
    ///
    /// The robot spawns on the world's start cell facing `config.initial_direction`.
    pub fn with_config(world: GridWorld, program: Program, config: InterpreterConfig) -> Self {
        let jumps = JumpTable::build(program.instructions());
        let robot = RobotState::new(world.start(), config.initial_direction);
        debug!(
            tokens = program.len(),
            pairs = jumps.len(),
            start = %world.start(),
            "interpreter created"
        );
        Self {
            world,
            program,
            jumps,
            robot,
            state: RunState::NotEnded,
            current: 0,
            next: 1,
            ticks: 0,
            config,
        }
    }

    /// Executes exactly one instruction and returns the resulting state.
    ///
    /// Does nothing once the run is terminal.
    ///
    /// # Control flow
    ///
    /// `If`/`While` read their two operand tokens. When the condition holds, execution enters
    /// the body after the operands; otherwise it resumes after the matching closer.
    /// `EndWhile` jumps back to its `While`, which is re-evaluated on the next step.
    /// Running past the last instruction loses the game.
    ///
    /// # Movement
    ///
    /// `MoveForward` onto ground moves the robot; onto a pit loses; onto a crate pushes it
    /// one cell further when the cell beyond is ground, or drops it into a pit beyond (the
    /// pit stays). Off-grid moves and pushes into walls, crates or the edge do nothing.
    pub fn step(&mut self) -> RunState {
        if self.state.is_terminal() {
            return self.state;
        }
        self.ticks += 1;
        self.current = self.next;

        let Some(kind) = self.program.get(self.current) else {
            trace!(index = self.current, "ran off the end of the program");
            self.lose();
            return self.state;
        };
        trace!(tick = self.ticks, index = self.current, %kind, "step");

        let mut next = self.current + 1;
        match kind {
            // --- STATEMENTS ---
            InstructionKind::MoveForward => self.move_forward(),
            InstructionKind::TurnLeft => self.robot.turn_left(),
            InstructionKind::TurnRight => self.robot.turn_right(),
            InstructionKind::EatCheese => {
                if self.robot.position.is_some() && self.robot.position == self.world.cheese() {
                    self.world.take_cheese();
                    self.state = RunState::Won;
                    info!(ticks = self.ticks, "cheese eaten");
                }
            }

            // --- CONTROL ---
            InstructionKind::If | InstructionKind::While => {
                if self.check_condition() {
                    next = self.current + 3;
                } else {
                    next = match self.jumps.close_for(self.current) {
                        Some(close) => close + 1,
                        None => self.program.len(),
                    };
                }
            }
            InstructionKind::EndWhile => {
                if let Some(open) = self.jumps.open_for(self.current) {
                    next = open;
                }
            }

            // Begin, EndIf and bare operands fall through.
            InstructionKind::Begin
            | InstructionKind::EndIf
            | InstructionKind::ConditionNot
            | InstructionKind::FacingWall
            | InstructionKind::FacingPit
            | InstructionKind::FacingBlock
            | InstructionKind::FacingCheese
            | InstructionKind::Blank => {}
        }

        self.next = next;
        self.state
    }

    /// Steps until the run ends or the configured tick budget is spent.
    ///
    /// Without [`InterpreterConfig::max_ticks`] this does not return for a program that loops
    /// forever.
    pub fn run(&mut self) -> RunState {
        while !self.state.is_terminal() {
            if let Some(limit) = self.config.max_ticks
                && self.ticks >= limit
            {
                debug!(limit, "tick budget spent");
                break;
            }
            self.step();
        }
        self.state
    }

    fn move_forward(&mut self) {
        let (Some(target), Some(beyond)) = (self.robot.facing(1), self.robot.facing(2)) else {
            return;
        };
        let Some(tile) = self.world.tile(target) else {
            return;
        };

        match tile {
            Tile::Ground => self.robot.position = Some(target),
            Tile::Pit => self.lose(),
            Tile::Block => match self.world.tile(beyond) {
                Some(Tile::Ground) => {
                    self.robot.position = Some(target);
                    self.world.set_tile(target, Tile::Ground);
                    self.world.set_tile(beyond, Tile::Block);
                }
                Some(Tile::Pit) => {
                    // The crate falls in; the pit is not filled.
                    self.robot.position = Some(target);
                    self.world.set_tile(target, Tile::Ground);
                }
                _ => {}
            },
            Tile::Wall | Tile::Cheese | Tile::Start => {}
        }
    }

    /// Evaluates the condition whose operands follow the opener at `current`.
    fn check_condition(&self) -> bool {
        let negated = self.program.get(self.current + 1) == Some(InstructionKind::ConditionNot);
        let predicate = self
            .program
            .get(self.current + 2)
            .unwrap_or(InstructionKind::Blank);
        // A blank or missing sensor is false even under `Not`.
        if !predicate.is_predicate() {
            return false;
        }

        let Some(facing) = self.robot.facing(1) else {
            return false;
        };
        let Some(tile) = self.world.tile(facing) else {
            return false;
        };

        let holds = match predicate {
            InstructionKind::FacingWall => tile == Tile::Wall,
            InstructionKind::FacingPit => tile == Tile::Pit,
            InstructionKind::FacingBlock => tile == Tile::Block,
            InstructionKind::FacingCheese => self.world.cheese() == Some(facing),
            _ => false,
        };
        holds != negated
    }

    fn lose(&mut self) {
        self.state = RunState::Lost;
        self.robot.position = None;
        info!(ticks = self.ticks, index = self.current, "robot lost");
    }

    // --- Queries ---

    pub fn robot(&self) -> &RobotState {
        &self.robot
    }

    /// `None` once the robot is lost.
    pub fn robot_position(&self) -> Option<IVec2> {
        self.robot.position
    }

    pub fn robot_direction(&self) -> Direction {
        self.robot.direction
    }

    pub fn run_state(&self) -> RunState {
        self.state
    }

    /// Program index of the instruction executed last.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The block behind [`current_index`](Self::current_index), for highlighting.
    pub fn current_node(&self) -> Option<NodeId> {
        if self.state == RunState::Lost {
            return None;
        }
        self.program.node_for(self.current)
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// The live world, with pushed crates in their current cells.
    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    /// The live terrain with the cheese drawn back in.
    pub fn grid(&self) -> Vec<Vec<Tile>> {
        self.world.snapshot()
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn jump_table(&self) -> &JumpTable {
        &self.jumps
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }
}

/// Text dump of the board: the robot as an arrow, cheese as `C`, terrain as its glyph.
impl fmt::Display for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (y, row) in self.world.rows().iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                // In range: `GridWorld` rejects grids wider or taller than `i32::MAX`.
                let cell = IVec2::new(x as i32, y as i32);
                let glyph = if self.robot.position == Some(cell) {
                    self.robot.direction.glyph()
                } else if self.world.cheese() == Some(cell) {
                    Tile::Cheese.glyph()
                } else {
                    tile.glyph()
                };
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
