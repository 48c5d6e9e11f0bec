//! Best-score persistence seam.
//!
//! The controller only ever talks to a [`ScoreStore`]; where the value lives
//! (a JSON file, browser storage, nowhere) is up to the presentation layer.

use std::collections::HashMap;

use crate::error::GameError;

/// Key the best score is stored under.
pub const BEST_SCORE_KEY: &str = "bestScore";

/// A minimal key-value store for scalar scores.
pub trait ScoreStore {
    fn load(&self, key: &str) -> Option<u32>;
    fn store(&mut self, key: &str, value: u32) -> Result<(), GameError>;
}

/// Process-local store; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreStore {
    values: HashMap<String, u32>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with a best score read from elsewhere.
    pub fn with_best(best: u32) -> Self {
        let mut values = HashMap::new();
        values.insert(BEST_SCORE_KEY.to_string(), best);
        Self { values }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load(&self, key: &str) -> Option<u32> {
        self.values.get(key).copied()
    }

    fn store(&mut self, key: &str, value: u32) -> Result<(), GameError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Tracks the best score and writes it through to a store whenever it is beaten.
#[derive(Debug, Clone)]
pub struct BestScore<S> {
    best: u32,
    store: S,
}

impl<S: ScoreStore> BestScore<S> {
    /// Read the persisted best from `store`, 0 when absent.
    pub fn load(store: S) -> Self {
        let best = store.load(BEST_SCORE_KEY).unwrap_or(0);
        Self { best, store }
    }

    /// Best score known so far.
    pub fn get(&self) -> u32 {
        self.best
    }

    /// Record `score`; returns true if it set a new best.
    ///
    /// A failed write keeps the in-memory best and is logged, never propagated.
    pub fn offer(&mut self, score: u32) -> bool {
        if score <= self.best {
            return false;
        }
        self.best = score;
        if let Err(err) = self.store.store(BEST_SCORE_KEY, score) {
            tracing::warn!(%err, score, "failed to persist best score");
        }
        true
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
