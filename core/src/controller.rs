//! Turn orchestration and the animation lock.
//!
//! A turn is two-phase. [`GameController::move_tiles`] and
//! [`GameController::undo`] compute and commit synchronously, then leave the
//! controller `Animating`. The presentation layer calls
//! [`GameController::finish_animation`] once its own animation settles; until
//! then every move or undo is rejected with [`GameError::Busy`] and dropped.

use serde::Serialize;

use crate::config::GameConfig;
use crate::diff::{undo_diff, UndoDiff};
use crate::engine::{self, Merge, Movement, SpawnedTile};
use crate::error::GameError;
use crate::grid::{Grid, TileId};
use crate::history::{History, Snapshot};
use crate::rng::{fresh_seed, SpawnRng};
use crate::score::{BestScore, MemoryScoreStore, ScoreStore};
use crate::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPhase {
    Idle,
    Animating,
}

/// Outcome of the last completed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    Playing,
    Won,
    /// No move is possible but undo credits remain.
    Stuck,
    GameOver,
}

/// Facts about one accepted move, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReport {
    pub direction: Direction,
    pub movements: Vec<Movement>,
    pub merges: Vec<Merge>,
    pub spawn: Option<SpawnedTile>,
    pub score_delta: u32,
    pub score: u32,
    pub best_score: u32,
    pub new_best: bool,
    /// Undo credits granted by this turn's merges.
    pub undo_rewards: u32,
    pub undo_count: u32,
    pub status: GameStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoReport {
    pub diff: UndoDiff,
    pub score: u32,
    pub undo_count: u32,
    pub can_undo: bool,
}

/// Owns one game: grid, score, spawn RNG, history and the animation lock.
pub struct GameController<S = MemoryScoreStore> {
    config: GameConfig,
    grid: Grid,
    score: u32,
    next_tile_id: TileId,
    rng: SpawnRng,
    history: History,
    phase: TurnPhase,
    status: GameStatus,
    best: BestScore<S>,
    initial_spawns: Vec<SpawnedTile>,
}

impl GameController<MemoryScoreStore> {
    /// A game with default rules, an in-memory best score and the given seed.
    pub fn new(seed: u32) -> Self {
        let config = GameConfig::default();
        Self::build(config, seed, MemoryScoreStore::new())
    }
}

impl<S: ScoreStore> GameController<S> {
    /// Default rules with a caller-supplied best-score store.
    pub fn new_with_store(seed: u32, store: S) -> Self {
        Self::build(GameConfig::default(), seed, store)
    }

    /// Validate `config`, then deal the opening tiles from `seed`.
    pub fn with_config(config: GameConfig, seed: u32, store: S) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Self::build(config, seed, store))
    }

    fn build(config: GameConfig, seed: u32, store: S) -> Self {
        let mut game = Self {
            config,
            grid: Grid::new(),
            score: 0,
            next_tile_id: 0,
            rng: SpawnRng::new(seed),
            history: History::new(&config),
            phase: TurnPhase::Idle,
            status: GameStatus::Playing,
            best: BestScore::load(store),
            initial_spawns: Vec::with_capacity(2),
        };
        game.setup();
        game
    }

    /// Two opening spawns, then the first snapshot.
    fn setup(&mut self) {
        self.initial_spawns.clear();
        for _ in 0..2 {
            let spawn =
                engine::spawn_tile(&mut self.grid, &mut self.rng, &mut self.next_tile_id);
            self.initial_spawns.extend(spawn);
        }
        let snapshot = self.snapshot();
        self.history.save(snapshot);
        tracing::debug!(seed = self.rng.seed(), "game set up");
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Play one turn: slide, merge, score, spawn, snapshot.
    ///
    /// Returns `Ok(None)` without touching any state when nothing would move.
    pub fn move_tiles(&mut self, direction: Direction) -> Result<Option<TurnReport>, GameError> {
        if self.phase == TurnPhase::Animating {
            tracing::trace!(?direction, "move dropped while animating");
            return Err(GameError::Busy);
        }

        let outcome = engine::move_grid(direction, &self.grid, self.next_tile_id);
        if !outcome.moved {
            tracing::trace!(?direction, "move changed nothing");
            return Ok(None);
        }

        self.phase = TurnPhase::Animating;
        self.grid = outcome.grid;
        self.next_tile_id = outcome.next_tile_id;
        self.score += outcome.score_delta;
        let new_best = self.best.offer(self.score);
        if new_best {
            tracing::info!(score = self.score, "new best score");
        }

        let mut undo_rewards = 0;
        for merge in &outcome.merges {
            if self.config.earns_undo_reward(merge.result.value) && self.history.earn_credit() {
                undo_rewards += 1;
                tracing::info!(
                    value = merge.result.value,
                    undo_count = self.history.undo_count(),
                    "undo credit earned"
                );
            }
        }

        let spawn = engine::spawn_tile(&mut self.grid, &mut self.rng, &mut self.next_tile_id);
        self.grid.clear_merge_marks();
        let snapshot = self.snapshot();
        self.history.save(snapshot);
        self.status = self.evaluate_status();

        tracing::debug!(
            ?direction,
            score = self.score,
            merges = outcome.merges.len(),
            status = ?self.status,
            "turn committed"
        );

        Ok(Some(TurnReport {
            direction,
            movements: outcome.movements,
            merges: outcome.merges,
            spawn,
            score_delta: outcome.score_delta,
            score: self.score,
            best_score: self.best.get(),
            new_best,
            undo_rewards,
            undo_count: self.history.undo_count(),
            status: self.status,
        }))
    }

    /// Parse a direction name and play it.
    pub fn move_named(&mut self, direction: &str) -> Result<Option<TurnReport>, GameError> {
        let direction = direction.parse::<Direction>()?;
        self.move_tiles(direction)
    }

    /// Roll back to the previous snapshot, spending one credit.
    pub fn undo(&mut self) -> Result<UndoReport, GameError> {
        if self.phase == TurnPhase::Animating {
            tracing::trace!("undo dropped while animating");
            return Err(GameError::Busy);
        }

        let target = self.history.undo()?;
        self.phase = TurnPhase::Animating;

        let diff = undo_diff(&self.grid, &target.grid);
        self.grid = target.grid;
        self.score = target.score;
        self.rng.reseed(target.rng_seed);
        self.next_tile_id = target.next_tile_id;
        self.history.spend_credit();
        self.status = GameStatus::Playing;

        tracing::debug!(
            score = self.score,
            undo_count = self.history.undo_count(),
            history = self.history.len(),
            "undo applied"
        );

        Ok(UndoReport {
            diff,
            score: self.score,
            undo_count: self.history.undo_count(),
            can_undo: self.history.can_undo(),
        })
    }

    /// Release the animation lock. Returns false if nothing was animating.
    pub fn finish_animation(&mut self) -> bool {
        let was_animating = self.phase == TurnPhase::Animating;
        self.phase = TurnPhase::Idle;
        was_animating
    }

    /// Start over with a seed from the thread RNG.
    pub fn restart(&mut self) -> &[SpawnedTile] {
        self.restart_with_seed(fresh_seed())
    }

    /// Start over from `seed`. Accepted in any phase; releases the lock.
    pub fn restart_with_seed(&mut self, seed: u32) -> &[SpawnedTile] {
        self.grid = Grid::new();
        self.score = 0;
        self.next_tile_id = 0;
        self.history.reset();
        self.rng.reseed(seed);
        self.phase = TurnPhase::Idle;
        self.status = GameStatus::Playing;
        self.setup();
        &self.initial_spawns
    }

    fn evaluate_status(&self) -> GameStatus {
        if self.grid.has_value(self.config.win_value) {
            GameStatus::Won
        } else if self.grid.is_game_over() {
            if self.history.undo_count() > 0 {
                GameStatus::Stuck
            } else {
                GameStatus::GameOver
            }
        } else {
            GameStatus::Playing
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Copy of the live state in snapshot form.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            grid: self.grid.clone(),
            score: self.score,
            undo_count: self.history.undo_count(),
            rng_seed: self.rng.seed(),
            next_tile_id: self.next_tile_id,
        }
    }

    /// Current board.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Current score.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Best score seen so far, including earlier sessions.
    pub fn best_score(&self) -> u32 {
        self.best.get()
    }

    /// Remaining undo credits.
    pub fn undo_count(&self) -> u32 {
        self.history.undo_count()
    }

    /// Whether `undo` would be accepted right now.
    pub fn can_undo(&self) -> bool {
        self.phase == TurnPhase::Idle && self.history.can_undo()
    }

    /// Snapshots currently retained.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Current turn phase.
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Whether the lock is held until `finish_animation`.
    pub fn is_animating(&self) -> bool {
        self.phase == TurnPhase::Animating
    }

    /// Outcome of the last completed turn.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Seed the next spawn will draw from.
    pub fn rng_seed(&self) -> u32 {
        self.rng.seed()
    }

    /// Id the next new tile will receive.
    pub fn next_tile_id(&self) -> TileId {
        self.next_tile_id
    }

    /// Rules this game was built with.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Spawns placed by the most recent setup or restart.
    pub fn initial_spawns(&self) -> &[SpawnedTile] {
        &self.initial_spawns
    }

    /// Directions that would change the grid, in [`Direction::all`] order.
    pub fn legal_directions(&self) -> Vec<Direction> {
        Direction::all()
            .into_iter()
            .filter(|&direction| engine::can_move(&self.grid, direction))
            .collect()
    }

    /// Backing store for the best score.
    pub fn score_store(&self) -> &S {
        self.best.store()
    }
}

// =============================================================================
// Tests
// =============================================================================
