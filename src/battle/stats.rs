use crate::battle::commands::Side;
use crate::battle::state::{BattleState, TurnRng};
use schema::{MonType, MoveClass, StatKind};
use std::fmt;

/// Type-effectiveness collaborator. Returns a percentage multiplier.
pub trait TypeChart: Send + Sync + fmt::Debug {
    fn multiplier(&self, attack_type: MonType, defender: (MonType, MonType)) -> u32;
}

/// Every matchup is neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralTypeChart;

impl TypeChart for NeutralTypeChart {
    fn multiplier(&self, _attack_type: MonType, _defender: (MonType, MonType)) -> u32 {
        100
    }
}

/// Calculate effective speed of a side's active mon including deltas
pub fn effective_speed(state: &BattleState, side: Side) -> u32 {
    state.effective_stat(side, state.active_mon_index(side), StatKind::Speed)
}

/// Calculate effective stamina of a side's active mon including deltas
pub fn effective_stamina(state: &BattleState, side: Side) -> u32 {
    state.effective_stat(side, state.active_mon_index(side), StatKind::Stamina)
}

/// Attacking stat of the user's active mon for a move class.
/// Status-style classes have no attacking stat.
pub fn effective_attack(state: &BattleState, side: Side, class: MoveClass) -> u32 {
    let stat = match class {
        MoveClass::Physical => StatKind::Attack,
        MoveClass::Special => StatKind::SpecialAttack,
        MoveClass::SelfTarget | MoveClass::Other => return 0,
    };
    state.effective_stat(side, state.active_mon_index(side), stat)
}

/// Defending stat of the target's active mon for a move class.
pub fn effective_defense(state: &BattleState, side: Side, class: MoveClass) -> u32 {
    let stat = match class {
        MoveClass::Physical => StatKind::Defense,
        MoveClass::Special => StatKind::SpecialDefense,
        MoveClass::SelfTarget | MoveClass::Other => return 0,
    };
    state.effective_stat(side, state.active_mon_index(side), stat)
}

/// `power * attack / defense`, scaled by a percentage type multiplier.
/// A zero defense stat is treated as 1.
pub fn calculate_damage(power: u32, attack: u32, defense: u32, multiplier_percent: u32) -> u32 {
    let numerator = u64::from(power) * u64::from(attack) * u64::from(multiplier_percent);
    let denominator = u64::from(defense.max(1)) * 100;
    u32::try_from(numerator / denominator).unwrap_or(u32::MAX)
}

/// Accuracy check. Perfect accuracy never consumes randomness.
pub fn move_hits(accuracy: u32, rng: &mut TurnRng) -> bool {
    if accuracy >= 100 {
        return true;
    }
    rng.roll_percent("accuracy") <= accuracy
}
