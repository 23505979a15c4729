use crate::battle::commands::Side;
use crate::protocol::commitment::BattleKey;

/// Main error type for the Mon Arena battle engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BattleEngineError {
    /// Commit/reveal ordering or legality was violated
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// Battle could not be created or resumed
    #[error("setup error: {0}")]
    Setup(#[from] SetupError),
    /// Timeout window misuse
    #[error("timeout error: {0}")]
    Timeout(#[from] TimeoutError),
    /// Snapshot could not be encoded or decoded
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    /// A battle lock was poisoned by a panicking thread
    #[error("battle {0} is unavailable: lock poisoned")]
    Poisoned(BattleKey),
}

/// Errors raised synchronously by `commit`, `reveal` and `execute`.
/// State is never modified when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Caller is not a participant, or is not the player allowed to act now
    #[error("player is not allowed to perform this action now")]
    PlayerNotAllowed,
    /// The committer already committed this turn
    #[error("a commitment already exists for this turn")]
    AlreadyCommitted,
    /// The player already revealed this turn
    #[error("player already revealed this turn")]
    AlreadyRevealed,
    /// The non-committer tried to reveal before the committer committed
    #[error("cannot reveal before the other player commits")]
    RevealBeforeOtherCommit,
    /// The committer tried to open their commitment before the other player revealed
    #[error("cannot reveal before the other player reveals")]
    RevealBeforeOtherReveal,
    /// The opened move does not hash to the stored commitment
    #[error("revealed move does not match the commitment")]
    WrongPreimage,
    /// The validator rejected the revealed move
    #[error("invalid move for {0}")]
    InvalidMove(Side),
    /// `execute` was called before every required reveal was in
    #[error("turn is not ready to execute")]
    NotReadyToExecute,
    /// The battle already has a winner
    #[error("battle is already over")]
    GameAlreadyOver,
}

/// Errors raised while creating a battle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("{side} brought {actual} mons, expected {expected}")]
    TeamSize {
        side: Side,
        expected: usize,
        actual: usize,
    },
    #[error("{side} mon {mon_index} has {actual} moves, at most {max} allowed")]
    TooManyMoves {
        side: Side,
        mon_index: usize,
        actual: usize,
        max: usize,
    },
    #[error("a player cannot battle themselves")]
    SamePlayer,
    #[error("unknown effect in ruleset: {0}")]
    UnknownEffect(String),
    #[error("battle {0} already exists")]
    DuplicateBattle(BattleKey),
    #[error("battle {0} does not exist")]
    UnknownBattle(BattleKey),
    #[error("snapshot does not match the supplied rosters")]
    SnapshotMismatch,
}

/// Errors raised by the forfeit-on-timeout path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeoutError {
    /// Nobody has overrun their window yet
    #[error("no player has timed out yet")]
    NotExpired,
    /// The acting player's window already closed; the battle can only be ended
    #[error("the action window for this turn has expired")]
    WindowExpired,
    #[error("battle is already over")]
    GameAlreadyOver,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to encode snapshot: {0}")]
    Encode(String),
    #[error("failed to decode snapshot: {0}")]
    Decode(String),
}

impl From<postcard::Error> for SnapshotError {
    fn from(err: postcard::Error) -> Self {
        SnapshotError::Decode(err.to_string())
    }
}

/// Errors raised while loading an `ArenaConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// Type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;
