// In: src/lib.rs

//! Mon Arena Battle Engine
//!
//! A deterministic two-player battle engine. Players hide their actions behind
//! hash commitments, the engine resolves each turn from the revealed actions
//! and a randomness stream both players contributed to, and effects hook into
//! fixed points of the turn.

// --- MODULE DECLARATIONS ---
pub mod arena;
pub mod battle;
pub mod clock;
pub mod config;
pub mod content;
pub mod errors;
pub mod mon;
pub mod moves;
pub mod observers;
pub mod player;
pub mod protocol;
pub mod randomness;
pub mod validator;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    EffectStep, MonStats, MonType, MoveClass, StatKind, DEFAULT_PRIORITY, DEFAULT_STAMINA,
    NO_OP_MOVE_INDEX, SWITCH_MOVE_INDEX, SWITCH_PRIORITY,
};

// --- From this crate's modules (`src/`) ---

// The battle store and per-battle service.
pub use arena::Arena;
pub use battle::runner::{BattleRunner, BattleSetup, BattleSnapshot, ExecutionResult};

// Core battle state and engine entry points.
pub use battle::commands::{BattleCommand, Side};
pub use battle::effects::{Effect, EffectInstance, EffectRegistry, EffectScope};
pub use battle::engine::{resolve_turn, BattleEnv};
pub use battle::state::{BattleEvent, BattleState, GameState, MonState};

// Roster and player types.
pub use mon::{Mon, Team};
pub use moves::{Ability, MoveSet};
pub use player::{PlayerAction, PlayerId};

// Crate-specific error and result types.
pub use errors::{
    BattleEngineError, BattleResult, ConfigError, ProtocolError, SetupError, SnapshotError,
    TimeoutError,
};
