//! # Tile-merge WebAssembly Bindings
//!
//! JavaScript-facing wrapper around the tile-merge controller. The browser
//! owns rendering, animation and best-score storage; it drives turns through
//! this class and calls `finishAnimation()` when each animation settles.

use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use tilemerge_core::{Direction, GameController, GameError, GameStatus, Grid, MemoryScoreStore};
use wasm_bindgen::prelude::*;

/// Snapshot of what the page needs to draw, serialized for JavaScript.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsState {
    /// 4×4 rows of `{ id, value, mergedThisTurn }` or `null`.
    pub grid: Grid,
    pub score: u32,
    pub best_score: u32,
    pub undo_count: u32,
    pub can_undo: bool,
    pub animating: bool,
    pub status: GameStatus,
}

/// Result of a declined request, serialized for JavaScript.
#[derive(Serialize)]
struct JsDeclined {
    declined: &'static str,
}

/// WebAssembly wrapper for one game.
#[wasm_bindgen]
pub struct WasmGame {
    game: GameController<MemoryScoreStore>,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game.
    ///
    /// `best_score` is whatever the page last persisted under the `bestScore` key;
    /// reports carry `bestScore` back so the page can write it out again.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u32, best_score: u32) -> WasmGame {
        WasmGame {
            game: GameController::new_with_store(seed, MemoryScoreStore::with_best(best_score)),
        }
    }

    /// Play a turn. `direction` is "left", "right", "up" or "down".
    ///
    /// Returns the turn report, `null` when nothing moved, or
    /// `{ declined: "busy" | "invalid_direction" }`.
    #[wasm_bindgen(js_name = "move")]
    pub fn play(&mut self, direction: &str) -> JsValue {
        match self.game.move_named(direction) {
            Ok(Some(report)) => to_js(&report),
            Ok(None) => JsValue::NULL,
            Err(err) => declined(&err),
        }
    }

    /// Play a turn by code (0=Up, 1=Down, 2=Left, 3=Right).
    #[wasm_bindgen(js_name = moveCode)]
    pub fn move_code(&mut self, code: u8) -> JsValue {
        let Some(direction) = Direction::from_u8(code) else {
            return declined(&GameError::InvalidDirection(code.to_string()));
        };
        match self.game.move_tiles(direction) {
            Ok(Some(report)) => to_js(&report),
            Ok(None) => JsValue::NULL,
            Err(err) => declined(&err),
        }
    }

    /// Roll back one turn. Returns the undo diff report or
    /// `{ declined: "busy" | "no_history" }`.
    pub fn undo(&mut self) -> JsValue {
        match self.game.undo() {
            Ok(report) => to_js(&report),
            Err(err) => declined(&err),
        }
    }

    /// Release the animation lock once the page has finished animating.
    #[wasm_bindgen(js_name = finishAnimation)]
    pub fn finish_animation(&mut self) -> bool {
        self.game.finish_animation()
    }

    /// Start a new game. Returns the two opening spawns.
    pub fn restart(&mut self, seed: u32) -> JsValue {
        let spawns = self.game.restart_with_seed(seed).to_vec();
        to_js(&spawns)
    }

    /// Opening spawns of the current game.
    #[wasm_bindgen(js_name = initialSpawns)]
    pub fn initial_spawns(&self) -> JsValue {
        to_js(&self.game.initial_spawns())
    }

    /// Everything needed to redraw from scratch.
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> JsValue {
        to_js(&JsState {
            grid: self.game.grid().clone(),
            score: self.game.score(),
            best_score: self.game.best_score(),
            undo_count: self.game.undo_count(),
            can_undo: self.game.can_undo(),
            animating: self.game.is_animating(),
            status: self.game.status(),
        })
    }

    #[wasm_bindgen(js_name = getScore)]
    pub fn get_score(&self) -> u32 {
        self.game.score()
    }

    #[wasm_bindgen(js_name = getBestScore)]
    pub fn get_best_score(&self) -> u32 {
        self.game.best_score()
    }

    #[wasm_bindgen(js_name = getUndoCount)]
    pub fn get_undo_count(&self) -> u32 {
        self.game.undo_count()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.game.can_undo()
    }

    /// Legal directions as names, for disabling controls.
    #[wasm_bindgen(js_name = getLegalDirections)]
    pub fn get_legal_directions(&self) -> Vec<String> {
        self.game
            .legal_directions()
            .into_iter()
            .map(|direction| direction.as_str().to_string())
            .collect()
    }
}

/// Serialize with plain objects and `null` for empty cells.
fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    value
        .serialize(&Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

fn declined(err: &GameError) -> JsValue {
    let declined = match err {
        GameError::Busy => "busy",
        GameError::NoHistory => "no_history",
        GameError::InvalidDirection(_) => "invalid_direction",
        GameError::InvalidConfig(_) => "invalid_config",
        GameError::Storage(_) => "storage",
    };
    to_js(&JsDeclined { declined })
}
