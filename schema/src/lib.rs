// Mon Arena Schema - Shared type definitions
// Plain data shared between the engine crate and anything that needs to talk
// about mons, moves and effect trigger points without pulling in the engine.

pub use battle_data::*;
pub use mon_types::*;

pub mod battle_data;
pub mod mon_types;
