//! # cheese-bot
//!
//! The core of a block-programming game: a user wires instruction *blocks* into a chain
//! graph, the graph is compiled into a flat, bracket-checked program, and the program is
//! executed one instruction at a time to drive a robot across a tile grid toward the cheese.
//!
//! The pipeline is [`BlockGraph`] → [`compile`] → [`Program`] → [`Interpreter`]. Rendering,
//! level loading and the timer that calls [`Interpreter::step`] live outside this crate.

pub mod compiler;
pub mod graph;
pub mod instruction;
pub mod interpreter;
pub mod robot;
pub mod world;

pub use compiler::*;
pub use graph::*;
pub use instruction::*;
pub use interpreter::*;
pub use robot::*;
pub use world::*;
