//! Grid transformation: compaction, merging, scoring and spawning.
//!
//! `move_grid` is a pure function of its inputs apart from the tile-id
//! counter, which it threads through and returns advanced.

use serde::Serialize;

use crate::grid::{Grid, Position, Tile, TileId, SIZE};
use crate::rng::SpawnRng;
use crate::Direction;

/// Probability that a spawned tile is a 2 rather than a 4.
pub const SPAWN_TWO_PROBABILITY: f64 = 0.9;

/// A tile sliding from one cell to another.
///
/// Serializes flat as `{tileId, fromRow, fromCol, toRow, toCol}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "MovementFields")]
pub struct Movement {
    pub tile_id: TileId,
    pub from: Position,
    pub to: Position,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MovementFields {
    tile_id: TileId,
    from_row: usize,
    from_col: usize,
    to_row: usize,
    to_col: usize,
}

impl From<Movement> for MovementFields {
    fn from(m: Movement) -> Self {
        Self {
            tile_id: m.tile_id,
            from_row: m.from.row,
            from_col: m.from.col,
            to_row: m.to.row,
            to_col: m.to.col,
        }
    }
}

/// Two equal tiles combined into a new one at `position`.
///
/// Serializes as `{inputTileIds, resultTile, position}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "MergeFields")]
pub struct Merge {
    pub inputs: [Tile; 2],
    pub result: Tile,
    pub position: Position,
}

impl Merge {
    /// Ids of the two tiles consumed by the merge, leading edge first.
    pub fn input_ids(&self) -> [TileId; 2] {
        [self.inputs[0].id, self.inputs[1].id]
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MergeFields {
    input_tile_ids: [TileId; 2],
    result_tile: Tile,
    position: Position,
}

impl From<Merge> for MergeFields {
    fn from(m: Merge) -> Self {
        Self {
            input_tile_ids: m.input_ids(),
            result_tile: m.result,
            position: m.position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnedTile {
    pub tile_id: TileId,
    pub value: u32,
    pub position: Position,
}

/// Everything a move produced. When `moved` is false the grid is unchanged and
/// the caller must abort the turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub grid: Grid,
    pub moved: bool,
    pub movements: Vec<Movement>,
    pub merges: Vec<Merge>,
    pub score_delta: u32,
    pub next_tile_id: TileId,
}

/// Slide every line of `grid` toward `direction`.
pub fn move_grid(direction: Direction, grid: &Grid, next_tile_id: TileId) -> MoveOutcome {
    let mut outcome = MoveOutcome {
        grid: Grid::new(),
        moved: false,
        movements: Vec::new(),
        merges: Vec::new(),
        score_delta: 0,
        next_tile_id,
    };

    for index in 0..SIZE {
        let positions = line_positions(direction, index);
        let mut cells = [None; SIZE];
        for (cell, &pos) in cells.iter_mut().zip(positions.iter()) {
            *cell = grid.get(pos);
        }

        let line = process_line(cells, &positions, &mut outcome.next_tile_id);
        for (&pos, tile) in positions.iter().zip(line.cells) {
            outcome.grid.set(pos, tile);
        }

        outcome.moved |= !line.movements.is_empty() || !line.merges.is_empty();
        outcome.score_delta += line.score;
        outcome.movements.extend(line.movements);
        outcome.merges.extend(line.merges);
    }

    outcome
}

/// Whether moving in `direction` would change anything.
pub fn can_move(grid: &Grid, direction: Direction) -> bool {
    move_grid(direction, grid, 0).moved
}

/// Place a 2 (90%) or 4 in a uniformly chosen empty cell.
///
/// Draws twice from `rng` (cell, then value), or not at all when the grid is
/// full.
pub fn spawn_tile(
    grid: &mut Grid,
    rng: &mut SpawnRng,
    next_tile_id: &mut TileId,
) -> Option<SpawnedTile> {
    let empty = grid.empty_cells();
    if empty.is_empty() {
        return None;
    }

    let position = empty[rng.draw_index(empty.len())];
    let value = if rng.draw() < SPAWN_TWO_PROBABILITY { 2 } else { 4 };
    let tile = Tile::new(*next_tile_id, value);
    *next_tile_id += 1;
    grid.set(position, Some(tile));

    Some(SpawnedTile {
        tile_id: tile.id,
        value,
        position,
    })
}

// -----------------------------------------------------------------------------
// Line processing
// -----------------------------------------------------------------------------

/// Cells of line `index` ordered from the edge tiles move toward.
fn line_positions(direction: Direction, index: usize) -> [Position; SIZE] {
    let mut positions = [Position::new(0, 0); SIZE];
    for (offset, pos) in positions.iter_mut().enumerate() {
        let back = SIZE - 1 - offset;
        *pos = match direction {
            Direction::Left => Position::new(index, offset),
            Direction::Right => Position::new(index, back),
            Direction::Up => Position::new(offset, index),
            Direction::Down => Position::new(back, index),
        };
    }
    positions
}

struct LineOutcome {
    cells: [Option<Tile>; SIZE],
    movements: Vec<Movement>,
    merges: Vec<Merge>,
    score: u32,
}

/// Compact and merge one leading-edge-first line.
///
/// Merges never chain: a tile created here is written straight to the output
/// and never compared again, and each input is consumed at most once.
fn process_line(
    cells: [Option<Tile>; SIZE],
    positions: &[Position; SIZE],
    next_tile_id: &mut TileId,
) -> LineOutcome {
    let dense: Vec<(Tile, usize)> = cells
        .iter()
        .enumerate()
        .filter_map(|(index, cell)| cell.map(|tile| (tile, index)))
        .collect();

    let mut line = LineOutcome {
        cells: [None; SIZE],
        movements: Vec::new(),
        merges: Vec::new(),
        score: 0,
    };

    let mut result_index = 0;
    let mut i = 0;
    while i < dense.len() {
        let (tile, original_index) = dense[i];
        let to = positions[result_index];

        if original_index != result_index {
            line.movements.push(Movement {
                tile_id: tile.id,
                from: positions[original_index],
                to,
            });
        }

        match dense.get(i + 1) {
            Some(&(next, next_index)) if next.value == tile.value && !tile.merged_this_turn => {
                let result = Tile {
                    id: *next_tile_id,
                    value: tile.value * 2,
                    merged_this_turn: true,
                };
                *next_tile_id += 1;

                line.movements.push(Movement {
                    tile_id: next.id,
                    from: positions[next_index],
                    to,
                });
                line.merges.push(Merge {
                    inputs: [tile, next],
                    result,
                    position: to,
                });
                line.score += result.value;
                line.cells[result_index] = Some(result);
                i += 2;
            }
            _ => {
                line.cells[result_index] = Some(tile);
                i += 1;
            }
        }

        result_index += 1;
    }

    line
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(values: [[u32; SIZE]; SIZE]) -> (Grid, TileId) {
        let mut next_id = 0;
        let grid = Grid::from_values(values, &mut next_id);
        (grid, next_id)
    }

    // -------------------------------------------------------------------------
    // Single-row scenarios
    // -------------------------------------------------------------------------

    #[test]
    fn test_pair_then_four_moves_left() {
        let (g, next_id) = grid([[2, 2, 4, 0], [0; 4], [0; 4], [0; 4]]);
        let out = move_grid(Direction::Left, &g, next_id);

        assert!(out.moved);
        assert_eq!(out.grid.values()[0], [4, 4, 0, 0]);
        assert_eq!(out.score_delta, 4);
        assert_eq!(out.merges.len(), 1);

        let merge = out.merges[0];
        assert_eq!(merge.input_ids(), [0, 1]);
        assert_eq!(merge.result.id, 3);
        assert!(merge.result.merged_this_turn);
        assert_eq!(merge.position, Position::new(0, 0));
        assert_eq!(out.next_tile_id, 4);

        // The untouched 4 keeps its identity and slides one cell.
        let four = out.grid.get(Position::new(0, 1)).expect("tile at (0,1)");
        assert_eq!(four.id, 2);
    }

    #[test]
    fn test_four_equal_tiles_make_two_merges() {
        let (g, next_id) = grid([[2, 2, 2, 2], [0; 4], [0; 4], [0; 4]]);
        let out = move_grid(Direction::Left, &g, next_id);

        assert_eq!(out.grid.values()[0], [4, 4, 0, 0]);
        assert_eq!(out.score_delta, 8);
        assert_eq!(out.merges.len(), 2);
        assert_eq!(out.merges[0].position, Position::new(0, 0));
        assert_eq!(out.merges[1].position, Position::new(0, 1));
    }

    #[test]
    fn test_no_double_merge() {
        let (g, next_id) = grid([[4, 2, 2, 0], [0; 4], [0; 4], [0; 4]]);
        let out = move_grid(Direction::Left, &g, next_id);
        assert_eq!(out.grid.values()[0], [4, 4, 0, 0]);
        assert_eq!(out.score_delta, 4);
        assert_eq!(out.merges.len(), 1);
    }

    #[test]
    fn test_three_equal_tiles_merge_leading_pair() {
        let (g, next_id) = grid([[0, 2, 2, 2], [0; 4], [0; 4], [0; 4]]);
        let out = move_grid(Direction::Right, &g, next_id);
        assert_eq!(out.grid.values()[0], [0, 0, 2, 4]);
        assert_eq!(out.merges[0].input_ids(), [2, 1]);
    }

    #[test]
    fn test_merge_with_gaps() {
        let (g, next_id) = grid([[2, 0, 2, 0], [0; 4], [0; 4], [0; 4]]);
        let out = move_grid(Direction::Left, &g, next_id);
        assert_eq!(out.grid.values()[0], [4, 0, 0, 0]);
        assert_eq!(out.score_delta, 4);
    }

    #[test]
    fn test_marked_tile_does_not_merge_again() {
        let mut g = Grid::new();
        g.set(
            Position::new(0, 0),
            Some(Tile {
                id: 0,
                value: 4,
                merged_this_turn: true,
            }),
        );
        g.set(Position::new(0, 1), Some(Tile::new(1, 4)));
        let out = move_grid(Direction::Left, &g, 2);
        assert!(!out.moved);
        assert!(out.merges.is_empty());
    }

    // -------------------------------------------------------------------------
    // Movement facts
    // -------------------------------------------------------------------------

    #[test]
    fn test_movement_records_from_and_to() {
        let (g, next_id) = grid([[0, 0, 0, 0], [0, 8, 0, 8], [0; 4], [0; 4]]);
        let out = move_grid(Direction::Left, &g, next_id);

        assert_eq!(
            out.movements,
            vec![
                Movement {
                    tile_id: 0,
                    from: Position::new(1, 1),
                    to: Position::new(1, 0),
                },
                Movement {
                    tile_id: 1,
                    from: Position::new(1, 3),
                    to: Position::new(1, 0),
                },
            ]
        );
    }

    #[test]
    fn test_merge_in_place_records_only_second_tile() {
        let (g, next_id) = grid([[0; 4], [0; 4], [0; 4], [0, 0, 16, 16]]);
        let out = move_grid(Direction::Right, &g, next_id);

        assert_eq!(out.movements.len(), 1);
        assert_eq!(out.movements[0].tile_id, 0);
        assert_eq!(out.movements[0].from, Position::new(3, 2));
        assert_eq!(out.movements[0].to, Position::new(3, 3));
    }

    // -------------------------------------------------------------------------
    // Whole-board moves
    // -------------------------------------------------------------------------

    #[test]
    fn test_move_left() {
        let (g, next_id) = grid([[2, 2, 0, 0], [0, 4, 4, 0], [2, 0, 2, 0], [8, 8, 8, 8]]);
        let out = move_grid(Direction::Left, &g, next_id);
        assert_eq!(
            out.grid.values(),
            [[4, 0, 0, 0], [8, 0, 0, 0], [4, 0, 0, 0], [16, 16, 0, 0]]
        );
        assert_eq!(out.score_delta, 4 + 8 + 4 + 32);
    }

    #[test]
    fn test_move_right() {
        let (g, next_id) = grid([[2, 2, 0, 0], [0, 4, 4, 0], [2, 0, 2, 0], [8, 8, 8, 8]]);
        let out = move_grid(Direction::Right, &g, next_id);
        assert_eq!(
            out.grid.values(),
            [[0, 0, 0, 4], [0, 0, 0, 8], [0, 0, 0, 4], [0, 0, 16, 16]]
        );
        assert_eq!(out.score_delta, 4 + 8 + 4 + 32);
    }

    #[test]
    fn test_move_up() {
        let (g, next_id) = grid([[2, 0, 2, 8], [2, 4, 0, 8], [0, 4, 2, 8], [0, 0, 0, 8]]);
        let out = move_grid(Direction::Up, &g, next_id);
        assert_eq!(
            out.grid.values(),
            [[4, 8, 4, 16], [0, 0, 0, 16], [0, 0, 0, 0], [0, 0, 0, 0]]
        );
        assert_eq!(out.score_delta, 4 + 8 + 4 + 32);
    }

    #[test]
    fn test_move_down() {
        let (g, next_id) = grid([[2, 0, 2, 8], [2, 4, 0, 8], [0, 4, 2, 8], [0, 0, 0, 8]]);
        let out = move_grid(Direction::Down, &g, next_id);
        assert_eq!(
            out.grid.values(),
            [[0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 16], [4, 8, 4, 16]]
        );
        assert_eq!(out.score_delta, 4 + 8 + 4 + 32);
    }

    #[test]
    fn test_locked_grid_does_not_move() {
        let (g, next_id) = grid([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        for direction in Direction::all() {
            let out = move_grid(direction, &g, next_id);
            assert!(!out.moved, "{direction:?} should not move");
            assert_eq!(out.grid, g);
            assert_eq!(out.next_tile_id, next_id);
            assert!(out.movements.is_empty());
        }
    }

    #[test]
    fn test_compacted_row_blocked_one_way_only() {
        let (g, next_id) = grid([[2, 4, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert!(!move_grid(Direction::Left, &g, next_id).moved);
        assert!(!move_grid(Direction::Up, &g, next_id).moved);
        assert!(move_grid(Direction::Right, &g, next_id).moved);
        assert!(move_grid(Direction::Down, &g, next_id).moved);
        assert!(can_move(&g, Direction::Right));
        assert!(!can_move(&g, Direction::Left));
    }

    #[test]
    fn test_ids_never_reused_across_lines() {
        let (g, next_id) = grid([[2, 2, 0, 0], [4, 4, 0, 0], [0; 4], [0; 4]]);
        let out = move_grid(Direction::Left, &g, next_id);
        let ids: Vec<TileId> = out.merges.iter().map(|m| m.result.id).collect();
        assert_eq!(ids, vec![4, 5]);
        assert_eq!(out.next_tile_id, 6);
    }

    // -------------------------------------------------------------------------
    // Spawning
    // -------------------------------------------------------------------------

    #[test]
    fn test_initial_spawns_from_seed_one() {
        let mut g = Grid::new();
        let mut rng = SpawnRng::new(1);
        let mut next_id = 0;

        let first = spawn_tile(&mut g, &mut rng, &mut next_id).expect("first spawn");
        let second = spawn_tile(&mut g, &mut rng, &mut next_id).expect("second spawn");

        assert_eq!(
            first,
            SpawnedTile {
                tile_id: 0,
                value: 2,
                position: Position::new(1, 3),
            }
        );
        assert_eq!(
            second,
            SpawnedTile {
                tile_id: 1,
                value: 2,
                position: Position::new(0, 2),
            }
        );
        assert_eq!(rng.seed(), 1_425_571_160);
        assert_eq!(next_id, 2);
    }

    #[test]
    fn test_spawn_on_full_grid_draws_nothing() {
        let (mut g, mut next_id) =
            grid([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        let mut rng = SpawnRng::new(99);
        assert!(spawn_tile(&mut g, &mut rng, &mut next_id).is_none());
        assert_eq!(rng.seed(), 99);
        assert_eq!(next_id, 16);
    }

    #[test]
    fn test_spawn_fills_only_empty_cell() {
        let (mut g, mut next_id) =
            grid([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 0, 4], [4, 2, 4, 2]]);
        let mut rng = SpawnRng::new(12345);
        let spawned = spawn_tile(&mut g, &mut rng, &mut next_id).expect("spawn");
        assert_eq!(spawned.position, Position::new(2, 2));
        assert!(matches!(spawned.value, 2 | 4));
        assert_eq!(g.empty_count(), 0);
    }

    #[test]
    fn test_facts_serialize_flat_for_presentation() {
        let (g, next_id) = grid([[2, 2, 4, 0], [0; 4], [0; 4], [0; 4]]);
        let out = move_grid(Direction::Left, &g, next_id);

        let merge = serde_json::to_value(out.merges[0]).expect("merge serializes");
        assert_eq!(merge["inputTileIds"], serde_json::json!([0, 1]));
        assert_eq!(merge["resultTile"]["value"], 4);
        assert_eq!(merge["position"]["row"], 0);
        assert_eq!(merge["position"]["col"], 0);
        assert!(merge.get("inputs").is_none());

        let slide = out
            .movements
            .iter()
            .find(|m| m.tile_id == 2)
            .expect("the 4 slides left");
        let json = serde_json::to_value(slide).expect("movement serializes");
        assert_eq!(
            json,
            serde_json::json!({"tileId": 2, "fromRow": 0, "fromCol": 2, "toRow": 0, "toCol": 1})
        );
    }
}
