use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
pub enum MonType {
    Yin,
    Yang,
    Earth,
    Water,
    Fire,
    Metal,
    Ice,
    Nature,
    Lightning,
    Mythic,
    Air,
    Mind,
    Cyber,
    Wild,
    Cosmic,
    None,
}

/// How a move interacts with the attacker's and defender's stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum MoveClass {
    /// Attack vs Defense
    Physical,
    /// Special Attack vs Special Defense
    Special,
    /// Targets the user only
    #[strum(serialize = "Self")]
    SelfTarget,
    /// Anything else (hazards, field effects, fixed damage)
    Other,
}

impl MoveClass {
    /// Whether the move needs a living opposing mon to do anything.
    pub fn targets_opponent(self) -> bool {
        matches!(self, MoveClass::Physical | MoveClass::Special | MoveClass::Other)
    }
}
