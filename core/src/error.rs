/// Every way a request against the engine can be declined.
///
/// None of these are fatal: the controller leaves its state untouched and the
/// caller decides whether to surface the condition.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("nothing to undo")]
    NoHistory,
    #[error("invalid direction: {0:?} (expected left, right, up or down)")]
    InvalidDirection(String),
    #[error("a turn is still animating")]
    Busy,
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("score store write failed: {0}")]
    Storage(String),
}
