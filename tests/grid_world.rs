// tests/grid_world.rs
use cheese_bot::{GridWorld, Tile, WorldError};
use glam::IVec2;

use Tile::*;

#[test]
fn test_markers_are_lifted_out_of_the_grid() {
    let world = GridWorld::new(vec![
        vec![Start, Ground, Wall, Cheese],
        vec![Wall, Ground, Ground, Ground],
    ])
    .unwrap();

    assert_eq!(world.width(), 4);
    assert_eq!(world.height(), 2);
    assert_eq!(world.start(), IVec2::new(0, 0));
    assert_eq!(world.cheese(), Some(IVec2::new(3, 0)));

    // Neither marker remains in the terrain.
    assert_eq!(world.tile(IVec2::new(0, 0)), Some(Ground));
    assert_eq!(world.tile(IVec2::new(3, 0)), Some(Ground));
    assert!(world.rows().iter().flatten().all(|t| !matches!(t, Start | Cheese)));

    // The snapshot draws the cheese back in.
    assert_eq!(world.snapshot()[0], vec![Ground, Ground, Wall, Cheese]);
}

#[test]
fn test_bounds() {
    let world: GridWorld = "S*\n**\n*#".parse().unwrap();
    assert!(world.in_bounds(IVec2::new(1, 2)));
    assert!(!world.in_bounds(IVec2::new(2, 0)));
    assert!(!world.in_bounds(IVec2::new(0, 3)));
    assert!(!world.in_bounds(IVec2::new(-1, 0)));
    assert_eq!(world.tile(IVec2::new(1, 2)), Some(Wall));
    assert_eq!(world.tile(IVec2::new(0, -1)), None);
}

#[test]
fn test_cheese_is_optional() {
    let world: GridWorld = "S@0#".parse().unwrap();
    assert_eq!(world.cheese(), None);
    assert_eq!(world.snapshot(), world.rows());
}

#[test]
fn test_parse_ignores_surrounding_whitespace() {
    let world: GridWorld = "
        S**
        #0C
    "
    .parse()
    .unwrap();
    assert_eq!(world.height(), 2);
    assert_eq!(world.rows()[1], vec![Wall, Pit, Ground]);
}

#[test]
fn test_invalid_levels() {
    assert_eq!(GridWorld::new(vec![]), Err(WorldError::Empty));
    assert_eq!(GridWorld::new(vec![vec![]]), Err(WorldError::Empty));
    assert_eq!("**".parse::<GridWorld>(), Err(WorldError::MissingStart));
    assert_eq!(
        "S*\nS*".parse::<GridWorld>(),
        Err(WorldError::MultipleStarts(IVec2::new(0, 1)))
    );
    assert_eq!(
        "SCC".parse::<GridWorld>(),
        Err(WorldError::MultipleCheeses(IVec2::new(2, 0)))
    );
    assert_eq!(
        "S**\n*".parse::<GridWorld>(),
        Err(WorldError::Ragged {
            row: 1,
            expected: 3,
            found: 1
        })
    );
    assert_eq!(
        "S?".parse::<GridWorld>(),
        Err(WorldError::UnknownGlyph {
            row: 0,
            column: 1,
            glyph: '?'
        })
    );
}

#[test]
fn test_error_messages() {
    let err = "S**\n*".parse::<GridWorld>().unwrap_err();
    assert_eq!(err.to_string(), "row 1 has 1 cells, expected 3");
}
