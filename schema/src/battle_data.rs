use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Reserved move index meaning "switch to the mon at `extra_data`".
pub const SWITCH_MOVE_INDEX: u8 = 125;

/// Reserved move index meaning "do nothing this turn".
pub const NO_OP_MOVE_INDEX: u8 = 126;

/// Priority of a switch. A move has to declare a strictly higher priority to
/// act before an opposing switch.
pub const SWITCH_PRIORITY: i32 = 6;

/// Priority most moves declare.
pub const DEFAULT_PRIORITY: i32 = 3;

/// Stamina every mon starts with unless its roster entry says otherwise.
pub const DEFAULT_STAMINA: u32 = 5;

/// Immutable base stats of a roster entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonStats {
    pub hp: u32,
    pub stamina: u32,
    pub speed: u32,
    pub attack: u32,
    pub defense: u32,
    pub special_attack: u32,
    pub special_defense: u32,
}

impl MonStats {
    pub fn get(&self, stat: StatKind) -> u32 {
        match stat {
            StatKind::Hp => self.hp,
            StatKind::Stamina => self.stamina,
            StatKind::Speed => self.speed,
            StatKind::Attack => self.attack,
            StatKind::Defense => self.defense,
            StatKind::SpecialAttack => self.special_attack,
            StatKind::SpecialDefense => self.special_defense,
        }
    }
}

impl Default for MonStats {
    fn default() -> Self {
        Self {
            hp: 10,
            stamina: DEFAULT_STAMINA,
            speed: 1,
            attack: 1,
            defense: 1,
            special_attack: 1,
            special_defense: 1,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
pub enum StatKind {
    Hp,
    Stamina,
    Speed,
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
}

/// Trigger points an effect can hook into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum EffectStep {
    OnApply,
    OnRemove,
    RoundStart,
    RoundEnd,
    OnMonSwitchIn,
    OnMonSwitchOut,
    BeforeMove,
    AfterDamage,
}
