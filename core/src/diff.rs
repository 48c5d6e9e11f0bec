//! Identity-based comparison of two grids, used to animate an undo.

use std::collections::HashMap;

use serde::Serialize;

use crate::engine::Movement;
use crate::grid::{Grid, Position, Tile, TileId};

/// A tile that must be added or removed at `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TilePlacement {
    pub tile: Tile,
    pub position: Position,
}

/// What has to happen to turn `current` back into `target`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UndoDiff {
    /// Tiles present in both grids but at different cells, current → target.
    pub movements: Vec<Movement>,
    /// Tiles only in `current`: spawns and merge results to remove.
    pub disappears: Vec<TilePlacement>,
    /// Tiles only in `target`: merge inputs to reconstruct.
    pub appears: Vec<TilePlacement>,
}

impl UndoDiff {
    pub fn is_empty(&self) -> bool {
        self.movements.is_empty() && self.disappears.is_empty() && self.appears.is_empty()
    }
}

/// Compare two grids by tile id, never by cell contents.
///
/// Movements and appears follow `target` in row-major order, disappears follow
/// `current`.
pub fn undo_diff(current: &Grid, target: &Grid) -> UndoDiff {
    let current_index: HashMap<TileId, Position> =
        current.tiles().map(|(pos, tile)| (tile.id, pos)).collect();
    let target_index: HashMap<TileId, Position> =
        target.tiles().map(|(pos, tile)| (tile.id, pos)).collect();

    let mut diff = UndoDiff::default();

    for (position, tile) in target.tiles() {
        match current_index.get(&tile.id) {
            Some(&from) if from != position => diff.movements.push(Movement {
                tile_id: tile.id,
                from,
                to: position,
            }),
            Some(_) => {}
            None => diff.appears.push(TilePlacement { tile, position }),
        }
    }

    diff.disappears = current
        .tiles()
        .filter(|(_, tile)| !target_index.contains_key(&tile.id))
        .map(|(position, tile)| TilePlacement { tile, position })
        .collect();

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::move_grid;
    use crate::Direction;

    #[test]
    fn test_identical_grids_have_empty_diff() {
        let mut next_id = 0;
        let grid = Grid::from_values([[2, 4, 0, 0], [0; 4], [0; 4], [0, 0, 0, 8]], &mut next_id);
        assert!(undo_diff(&grid, &grid.clone()).is_empty());
    }

    #[test]
    fn test_reverses_a_merge() {
        let mut next_id = 0;
        let before = Grid::from_values([[0, 2, 0, 2], [0; 4], [0; 4], [0; 4]], &mut next_id);
        let after = move_grid(Direction::Left, &before, next_id).grid;

        let diff = undo_diff(&after, &before);

        assert!(diff.movements.is_empty());
        assert_eq!(diff.disappears.len(), 1);
        assert_eq!(diff.disappears[0].tile.id, 2);
        assert_eq!(diff.disappears[0].position, Position::new(0, 0));

        let appeared: Vec<(TileId, Position)> =
            diff.appears.iter().map(|p| (p.tile.id, p.position)).collect();
        assert_eq!(
            appeared,
            vec![(0, Position::new(0, 1)), (1, Position::new(0, 3))]
        );
    }

    #[test]
    fn test_reverses_a_slide() {
        let mut next_id = 0;
        let before = Grid::from_values([[0, 0, 0, 2], [0; 4], [0; 4], [0; 4]], &mut next_id);
        let after = move_grid(Direction::Left, &before, next_id).grid;

        let diff = undo_diff(&after, &before);
        assert_eq!(
            diff.movements,
            vec![Movement {
                tile_id: 0,
                from: Position::new(0, 0),
                to: Position::new(0, 3),
            }]
        );
        assert!(diff.appears.is_empty());
        assert!(diff.disappears.is_empty());
    }

    #[test]
    fn test_same_value_same_cell_different_identity() {
        let mut a_id = 0;
        let target = Grid::from_values([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]], &mut a_id);
        let mut b_id = 50;
        let current = Grid::from_values([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]], &mut b_id);

        let diff = undo_diff(&current, &target);
        assert_eq!(diff.appears.len(), 1);
        assert_eq!(diff.appears[0].tile.id, 0);
        assert_eq!(diff.disappears.len(), 1);
        assert_eq!(diff.disappears[0].tile.id, 50);
        assert!(diff.movements.is_empty());
    }
}
