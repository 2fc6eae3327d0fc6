//! The tile grid the robot drives around on.

use glam::IVec2;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// A single cell of the level map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Ground,
    Wall,
    /// A crate the robot can push.
    Block,
    Pit,
    /// Only present in level descriptions; lifted into [`GridWorld::cheese`] on construction.
    Cheese,
    /// Only present in level descriptions; lifted into [`GridWorld::start`] on construction.
    Start,
}

impl Tile {
    /// The glyph used by the text form and by the interpreter's debug dump.
    pub fn glyph(self) -> char {
        match self {
            Tile::Ground => '*',
            Tile::Wall => '#',
            Tile::Block => '@',
            Tile::Pit => '0',
            Tile::Cheese => 'C',
            Tile::Start => 'S',
        }
    }

    pub fn from_glyph(glyph: char) -> Option<Tile> {
        match glyph {
            '*' => Some(Tile::Ground),
            '#' => Some(Tile::Wall),
            '@' => Some(Tile::Block),
            '0' => Some(Tile::Pit),
            'C' => Some(Tile::Cheese),
            'S' => Some(Tile::Start),
            _ => None,
        }
    }
}

/// Reasons a level description can't become a [`GridWorld`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("grid has no cells")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("grid has no start tile")]
    MissingStart,

    #[error("grid has more than one start tile (second at {0})")]
    MultipleStarts(IVec2),

    #[error("grid has more than one cheese tile (second at {0})")]
    MultipleCheeses(IVec2),

    #[error("unknown glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        row: usize,
        column: usize,
        glyph: char,
    },

    #[error("grid of {width}x{height} cells does not fit 32-bit coordinates")]
    TooLarge { width: usize, height: usize },

    #[error("grid of {width}x{height} cells holds {found} tiles")]
    TileCount {
        width: usize,
        height: usize,
        found: usize,
    },

    #[error("marker at {0} is off the grid or not on ground")]
    MisplacedMarker(IVec2),
}

/// Cell coordinates must fit `IVec2`.
fn check_dimensions(width: usize, height: usize) -> Result<(), WorldError> {
    if width == 0 || height == 0 {
        return Err(WorldError::Empty);
    }
    match (i32::try_from(width), i32::try_from(height)) {
        (Ok(_), Ok(_)) => Ok(()),
        _ => Err(WorldError::TooLarge { width, height }),
    }
}

/// A rectangular tile grid with the start and cheese markers extracted.
///
/// Cells are addressed with `IVec2 { x: column, y: row }`; row 0 is the northern edge.
/// After construction the grid never stores `Start` or `Cheese` tiles. Deserialized worlds
/// go through the same checks as [`GridWorld::new`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGridWorld")]
pub struct GridWorld {
    width: usize,
    height: usize,
    /// Row-major.
    tiles: Vec<Tile>,
    start: IVec2,
    cheese: Option<IVec2>,
}

impl GridWorld {
    /// Builds a world from rows of tiles, lifting out the start and cheese cells.
    pub fn new(rows: Vec<Vec<Tile>>) -> Result<Self, WorldError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        check_dimensions(width, height)?;

        let mut tiles = Vec::with_capacity(width * height);
        let mut start = None;
        let mut cheese = None;

        for (y, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(WorldError::Ragged {
                    row: y,
                    expected: width,
                    found: row.len(),
                });
            }
            for (x, tile) in row.into_iter().enumerate() {
                // In range: both dimensions passed `check_dimensions`.
                let cell = IVec2::new(x as i32, y as i32);
                match tile {
                    Tile::Start => {
                        if start.replace(cell).is_some() {
                            return Err(WorldError::MultipleStarts(cell));
                        }
                        tiles.push(Tile::Ground);
                    }
                    Tile::Cheese => {
                        if cheese.replace(cell).is_some() {
                            return Err(WorldError::MultipleCheeses(cell));
                        }
                        tiles.push(Tile::Ground);
                    }
                    other => tiles.push(other),
                }
            }
        }

        let start = start.ok_or(WorldError::MissingStart)?;

        Ok(Self {
            width,
            height,
            tiles,
            start,
            cheese,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The robot's spawn cell.
    pub fn start(&self) -> IVec2 {
        self.start
    }

    /// Where the cheese currently is; `None` once eaten or if the level has none.
    pub fn cheese(&self) -> Option<IVec2> {
        self.cheese
    }

    pub fn in_bounds(&self, cell: IVec2) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && (cell.x as usize) < self.width
            && (cell.y as usize) < self.height
    }

    fn index(&self, cell: IVec2) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| cell.y as usize * self.width + cell.x as usize)
    }

    /// The tile at `cell`, or `None` off the grid.
    pub fn tile(&self, cell: IVec2) -> Option<Tile> {
        self.index(cell).map(|i| self.tiles[i])
    }

    /// Overwrites a tile. Off-grid writes are ignored.
    pub(crate) fn set_tile(&mut self, cell: IVec2, tile: Tile) {
        if let Some(i) = self.index(cell) {
            self.tiles[i] = tile;
        }
    }

    /// Removes the cheese, returning where it was.
    pub(crate) fn take_cheese(&mut self) -> Option<IVec2> {
        self.cheese.take()
    }

    /// The terrain without any markers.
    pub fn rows(&self) -> Vec<Vec<Tile>> {
        self.tiles.chunks(self.width).map(<[Tile]>::to_vec).collect()
    }

    /// The terrain with the live cheese drawn back in, for renderers.
    pub fn snapshot(&self) -> Vec<Vec<Tile>> {
        let mut rows = self.rows();
        if let Some(cheese) = self.cheese {
            rows[cheese.y as usize][cheese.x as usize] = Tile::Cheese;
        }
        rows
    }
}

/// The serialized shape of a [`GridWorld`], checked before use.
#[derive(Deserialize)]
struct RawGridWorld {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
    start: IVec2,
    cheese: Option<IVec2>,
}

impl TryFrom<RawGridWorld> for GridWorld {
    type Error = WorldError;

    /// Puts the markers back on the terrain and rebuilds through [`GridWorld::new`].
    fn try_from(raw: RawGridWorld) -> Result<Self, Self::Error> {
        check_dimensions(raw.width, raw.height)?;
        if raw.width.checked_mul(raw.height) != Some(raw.tiles.len()) {
            return Err(WorldError::TileCount {
                width: raw.width,
                height: raw.height,
                found: raw.tiles.len(),
            });
        }

        let mut rows: Vec<Vec<Tile>> = raw
            .tiles
            .chunks(raw.width)
            .map(<[Tile]>::to_vec)
            .collect();
        let markers = [(raw.start, Tile::Start)]
            .into_iter()
            .chain(raw.cheese.map(|cell| (cell, Tile::Cheese)));
        for (cell, marker) in markers {
            let slot = usize::try_from(cell.y)
                .ok()
                .zip(usize::try_from(cell.x).ok())
                .and_then(|(y, x)| rows.get_mut(y)?.get_mut(x));
            match slot {
                Some(tile) if *tile == Tile::Ground => *tile = marker,
                _ => return Err(WorldError::MisplacedMarker(cell)),
            }
        }

        Self::new(rows)
    }
}

impl FromStr for GridWorld {
    type Err = WorldError;

    /// Parses one row per line using the [`Tile::glyph`] alphabet.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(row, line)| {
                line.chars()
                    .enumerate()
                    .map(|(column, glyph)| {
                        Tile::from_glyph(glyph).ok_or(WorldError::UnknownGlyph {
                            row,
                            column,
                            glyph,
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(rows)
    }
}
