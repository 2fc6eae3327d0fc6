//! Robot state and movement primitives.

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Compass heading. Turning left walks North → West → South → East → North.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    West,
    South,
    East,
}

impl Direction {
    /// Unit step in grid space (row 0 is north, so North is `-Y`).
    pub fn offset(self) -> IVec2 {
        match self {
            Direction::North => IVec2::NEG_Y,
            Direction::West => IVec2::NEG_X,
            Direction::South => IVec2::Y,
            Direction::East => IVec2::X,
        }
    }

    pub fn left(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
        }
    }

    pub fn right(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    /// Arrow glyph used in the debug dump.
    pub fn glyph(self) -> char {
        match self {
            Direction::North => '^',
            Direction::West => '<',
            Direction::South => 'v',
            Direction::East => '>',
        }
    }
}

/// Where the robot is and which way it faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotState {
    /// Current cell. `None` once the robot has been lost.
    pub position: Option<IVec2>,

    pub direction: Direction,
}

impl RobotState {
    pub fn new(position: IVec2, direction: Direction) -> Self {
        Self {
            position: Some(position),
            direction,
        }
    }

    /// The cell `distance` steps ahead along the current heading.
    pub fn facing(&self, distance: i32) -> Option<IVec2> {
        self.position
            .map(|pos| pos + self.direction.offset() * distance)
    }

    pub fn turn_left(&mut self) {
        self.direction = self.direction.left();
    }

    pub fn turn_right(&mut self) {
        self.direction = self.direction.right();
    }
}
