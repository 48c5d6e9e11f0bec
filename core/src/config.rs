use serde::{Deserialize, Serialize};

use crate::error::GameError;

pub const DEFAULT_INITIAL_UNDO_CREDITS: u32 = 3;
pub const DEFAULT_MAX_UNDO_CREDITS: u32 = 10;
pub const DEFAULT_UNDO_REWARD_STEP: u32 = 256;
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
pub const DEFAULT_WIN_VALUE: u32 = 2048;

/// Tunables for the undo economy and win condition.
///
/// Grid size and the merge rule are fixed and deliberately absent here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub initial_undo_credits: u32,
    pub max_undo_credits: u32,
    /// Merges producing a positive multiple of this value earn one undo credit.
    pub undo_reward_step: u32,
    pub history_capacity: usize,
    pub win_value: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_undo_credits: DEFAULT_INITIAL_UNDO_CREDITS,
            max_undo_credits: DEFAULT_MAX_UNDO_CREDITS,
            undo_reward_step: DEFAULT_UNDO_REWARD_STEP,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            win_value: DEFAULT_WIN_VALUE,
        }
    }
}

impl GameConfig {
    /// Reject settings the undo economy or win check cannot honour.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.initial_undo_credits > self.max_undo_credits {
            return Err(GameError::InvalidConfig(format!(
                "initial_undo_credits ({}) exceeds max_undo_credits ({})",
                self.initial_undo_credits, self.max_undo_credits
            )));
        }
        // Restoring needs the current snapshot plus one before it.
        if self.history_capacity < 2 {
            return Err(GameError::InvalidConfig(format!(
                "history_capacity must be at least 2, got {}",
                self.history_capacity
            )));
        }
        for (name, value) in [
            ("undo_reward_step", self.undo_reward_step),
            ("win_value", self.win_value),
        ] {
            if value < 4 || !value.is_power_of_two() {
                return Err(GameError::InvalidConfig(format!(
                    "{name} must be a power of two >= 4, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Whether a freshly merged tile of `value` earns an undo credit.
    pub fn earns_undo_reward(&self, value: u32) -> bool {
        value >= self.undo_reward_step && value % self.undo_reward_step == 0
    }
}
