//! # Tile-merge puzzle engine
//!
//! A deterministic 4×4 sliding-tile merge engine with a seeded spawn
//! generator and a bounded, credit-gated undo history. Tiles carry stable ids
//! so a presentation layer can animate both moves and undos from the facts the
//! engine reports.
//!
//! ## Example
//!
//! ```rust
//! use tilemerge_core::{Direction, GameController};
//!
//! let mut game = GameController::new(42);
//! if let Ok(Some(turn)) = game.move_tiles(Direction::Left) {
//!     println!("score {} after {} merges", turn.score, turn.merges.len());
//!     // Animate, then hand the lock back.
//!     game.finish_animation();
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod controller;
pub mod diff;
pub mod engine;
pub mod error;
pub mod grid;
pub mod history;
pub mod rng;
pub mod score;

pub use config::GameConfig;
pub use controller::{GameController, GameStatus, TurnPhase, TurnReport, UndoReport};
pub use diff::{undo_diff, TilePlacement, UndoDiff};
pub use engine::{move_grid, Merge, MoveOutcome, Movement, SpawnedTile};
pub use error::GameError;
pub use grid::{Grid, Position, Tile, TileId, SIZE};
pub use history::{History, Snapshot};
pub use rng::SpawnRng;
pub use score::{BestScore, MemoryScoreStore, ScoreStore, BEST_SCORE_KEY};

/// The four slide directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Direction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Direction {
    /// Convert a u8 to a Direction (0=Up, 1=Down, 2=Left, 3=Right).
    pub fn from_u8(value: u8) -> Option<Direction> {
        match value {
            0 => Some(Direction::Up),
            1 => Some(Direction::Down),
            2 => Some(Direction::Left),
            3 => Some(Direction::Right),
            _ => None,
        }
    }

    /// All four directions in code order.
    pub fn all() -> [Direction; 4] {
        [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ]
    }

    /// Lowercase name, as accepted by `FromStr`.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(GameError::InvalidDirection(s.to_string())),
        }
    }
}
