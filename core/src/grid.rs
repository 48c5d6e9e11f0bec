//! Tile and grid value types.

use serde::{Deserialize, Serialize};

/// Side length of the board.
pub const SIZE: usize = 4;

pub type TileId = u32;

/// A single tile. Identity (`id`) survives moves and snapshot copies; a merge
/// always produces a tile with a fresh id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    pub id: TileId,
    pub value: u32,
    pub merged_this_turn: bool,
}

impl Tile {
    pub fn new(id: TileId, value: u32) -> Self {
        Self {
            id,
            value,
            merged_this_turn: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A 4×4 board of optional tiles, row-major.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    cells: [[Option<Tile>; SIZE]; SIZE],
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from plain values (0 = empty), numbering tiles row-major
    /// from `next_id` and advancing it.
    pub fn from_values(values: [[u32; SIZE]; SIZE], next_id: &mut TileId) -> Self {
        let mut grid = Self::new();
        for (row, line) in values.iter().enumerate() {
            for (col, &value) in line.iter().enumerate() {
                if value != 0 {
                    grid.cells[row][col] = Some(Tile::new(*next_id, value));
                    *next_id += 1;
                }
            }
        }
        grid
    }

    /// Tile at `pos`, if any.
    pub fn get(&self, pos: Position) -> Option<Tile> {
        self.cells[pos.row][pos.col]
    }

    /// Place or clear the cell at `pos`.
    pub fn set(&mut self, pos: Position, tile: Option<Tile>) {
        self.cells[pos.row][pos.col] = tile;
    }

    /// Plain values, 0 for empty cells.
    pub fn values(&self) -> [[u32; SIZE]; SIZE] {
        let mut out = [[0; SIZE]; SIZE];
        for (pos, tile) in self.tiles() {
            out[pos.row][pos.col] = tile.value;
        }
        out
    }

    /// Occupied cells in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = (Position, Tile)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, line)| {
            line.iter()
                .enumerate()
                .filter_map(move |(col, cell)| cell.map(|tile| (Position::new(row, col), tile)))
        })
    }

    /// Empty cells in row-major order. Spawn indexing depends on this order.
    pub fn empty_cells(&self) -> Vec<Position> {
        let mut empty = Vec::with_capacity(SIZE * SIZE);
        for row in 0..SIZE {
            for col in 0..SIZE {
                if self.cells[row][col].is_none() {
                    empty.push(Position::new(row, col));
                }
            }
        }
        empty
    }

    /// Number of empty cells.
    pub fn empty_count(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_none()).count()
    }

    /// Number of occupied cells.
    pub fn tile_count(&self) -> usize {
        SIZE * SIZE - self.empty_count()
    }

    /// Largest tile value on the board, 0 when empty.
    pub fn max_tile(&self) -> u32 {
        self.tiles().map(|(_, tile)| tile.value).max().unwrap_or(0)
    }

    /// Whether any tile has exactly `value`.
    pub fn has_value(&self, value: u32) -> bool {
        self.tiles().any(|(_, tile)| tile.value == value)
    }

    /// Any two row- or column-adjacent tiles share a value.
    pub fn has_adjacent_pair(&self) -> bool {
        for row in 0..SIZE {
            for col in 0..SIZE {
                let Some(current) = self.cells[row][col] else {
                    continue;
                };
                if col + 1 < SIZE
                    && self.cells[row][col + 1].is_some_and(|right| right.value == current.value)
                {
                    return true;
                }
                if row + 1 < SIZE
                    && self.cells[row + 1][col].is_some_and(|below| below.value == current.value)
                {
                    return true;
                }
            }
        }
        false
    }

    /// Full board with no adjacent equal pair.
    pub fn is_game_over(&self) -> bool {
        self.empty_count() == 0 && !self.has_adjacent_pair()
    }

    /// Reset every tile's merged flag before the next turn.
    pub fn clear_merge_marks(&mut self) {
        for tile in self.cells.iter_mut().flatten().flatten() {
            tile.merged_this_turn = false;
        }
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Grid {{")?;
        for line in &self.cells {
            for cell in line {
                match cell {
                    Some(tile) => write!(f, " {:>5}#{:<4}", tile.value, tile.id)?,
                    None => write!(f, "     .     ")?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "+------+------+------+------+")?;
        for line in &self.cells {
            write!(f, "|")?;
            for cell in line {
                match cell {
                    Some(tile) => write!(f, "{:^6}|", tile.value)?,
                    None => write!(f, "      |")?,
                }
            }
            writeln!(f)?;
            writeln!(f, "+------+------+------+------+")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(values: [[u32; SIZE]; SIZE]) -> Grid {
        let mut next_id = 0;
        Grid::from_values(values, &mut next_id)
    }

    #[test]
    fn test_from_values_numbers_row_major() {
        let mut next_id = 10;
        let grid = Grid::from_values([[2, 0, 0, 4], [0; 4], [0; 4], [0, 0, 8, 0]], &mut next_id);
        assert_eq!(next_id, 13);
        assert_eq!(grid.get(Position::new(0, 0)).map(|t| t.id), Some(10));
        assert_eq!(grid.get(Position::new(0, 3)).map(|t| t.id), Some(11));
        assert_eq!(grid.get(Position::new(3, 2)).map(|t| t.id), Some(12));
    }

    #[test]
    fn test_empty_cells_row_major() {
        let grid = grid([[2, 0, 2, 2], [2, 2, 2, 2], [2, 2, 0, 2], [2, 2, 2, 2]]);
        assert_eq!(
            grid.empty_cells(),
            vec![Position::new(0, 1), Position::new(2, 2)]
        );
        assert_eq!(grid.empty_count(), 2);
        assert_eq!(grid.tile_count(), 14);
    }

    #[test]
    fn test_full_grid_with_pair_is_not_over() {
        let grid = grid([
            [2, 4, 8, 16],
            [32, 64, 128, 256],
            [512, 1024, 2, 4],
            [8, 16, 32, 32],
        ]);
        assert!(grid.has_adjacent_pair());
        assert!(!grid.is_game_over());
    }

    #[test]
    fn test_full_grid_without_pair_is_over() {
        let grid = grid([
            [2, 4, 8, 16],
            [32, 64, 128, 256],
            [512, 1024, 2, 4],
            [8, 16, 32, 64],
        ]);
        assert!(!grid.has_adjacent_pair());
        assert!(grid.is_game_over());
    }

    #[test]
    fn test_vertical_pair_detected() {
        let grid = grid([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [2, 8, 4, 2]]);
        assert!(grid.has_adjacent_pair());
    }

    #[test]
    fn test_gap_prevents_game_over() {
        let grid = grid([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 0]]);
        assert!(!grid.is_game_over());
    }

    #[test]
    fn test_has_value_and_max_tile() {
        let grid = grid([[2, 0, 0, 0], [0, 2048, 0, 0], [0; 4], [0; 4]]);
        assert!(grid.has_value(2048));
        assert!(!grid.has_value(1024));
        assert_eq!(grid.max_tile(), 2048);
        assert_eq!(Grid::new().max_tile(), 0);
    }

    #[test]
    fn test_clear_merge_marks() {
        let mut grid = Grid::new();
        grid.set(
            Position::new(1, 1),
            Some(Tile {
                id: 3,
                value: 8,
                merged_this_turn: true,
            }),
        );
        grid.clear_merge_marks();
        assert_eq!(
            grid.get(Position::new(1, 1)).map(|t| t.merged_this_turn),
            Some(false)
        );
    }

    #[test]
    fn test_display_format() {
        let grid = grid([[2, 0, 0, 0], [0; 4], [0; 4], [0, 0, 0, 2048]]);
        let display = format!("{}", grid);
        assert!(display.contains("+------+"));
        assert!(display.contains("2048"));
    }

    #[test]
    fn test_serializes_as_nested_rows() {
        let grid = grid([[2, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);
        let json = serde_json::to_value(&grid).expect("grid should serialize");
        assert_eq!(json[0][0]["value"], 2);
        assert_eq!(json[0][0]["mergedThisTurn"], false);
        assert!(json[0][1].is_null());
    }
}
