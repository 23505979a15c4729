//! Simple decision making for bot-controlled players.

use crate::battle::commands::Side;
use crate::battle::engine::BattleEnv;
use crate::battle::state::BattleState;
use crate::battle::stats::{calculate_damage, effective_attack, effective_defense};
use crate::player::PlayerAction;
use crate::validator::{legal_actions, Validator};
use schema::{MonType, MoveClass, StatKind};

/// A trait for any system that can decide on a battle action.
pub trait Behavior: Send + Sync {
    /// Inspects the battle and picks an action the validator accepts for `side`.
    fn decide_action(
        &self,
        side: Side,
        state: &BattleState,
        env: &BattleEnv,
        validator: &dyn Validator,
    ) -> PlayerAction;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringAI;

impl ScoringAI {
    pub fn new() -> Self {
        Self
    }

    fn score_action(
        &self,
        action: &PlayerAction,
        side: Side,
        state: &BattleState,
        env: &BattleEnv,
    ) -> f32 {
        match action {
            PlayerAction::UseMove { move_index, .. } => {
                self.score_move(*move_index, side, state, env)
            }
            PlayerAction::Switch { mon_index } => self.score_switch(*mon_index, side, state),
            // Resting is only worth it when nothing else is.
            PlayerAction::NoOp => 0.1,
        }
    }

    fn score_move(
        &self,
        move_index: usize,
        side: Side,
        state: &BattleState,
        env: &BattleEnv,
    ) -> f32 {
        let Some(move_set) = env.teams[side.index()]
            .get(state.active_mon_index(side))
            .and_then(|mon| mon.move_at(move_index))
        else {
            return -1.0;
        };

        let opponent = side.opponent();
        let class = move_set.move_class();
        let power = move_set.base_power();

        let mut score = if power > 0 && class.targets_opponent() {
            let defender_types = env.teams[opponent.index()]
                .get(state.active_mon_index(opponent))
                .map_or((MonType::None, MonType::None), |mon| mon.types);
            let multiplier = env.type_chart.multiplier(move_set.move_type(), defender_types);
            if multiplier == 0 {
                return -1.0;
            }
            let damage = calculate_damage(
                power,
                effective_attack(state, side, class),
                effective_defense(state, opponent, class),
                multiplier,
            ) as f32;

            // A knockout is worth more than its raw damage.
            let remaining_hp = state
                .active_mon(opponent)
                .map_or(0, |mon| mon.effective(StatKind::Hp)) as f32;
            if damage >= remaining_hp {
                damage + 50.0
            } else {
                damage
            }
        } else if class == MoveClass::SelfTarget || class == MoveClass::Other {
            // Setup and hazards: modest, flat value.
            3.0
        } else {
            0.5
        };

        score *= move_set.accuracy().min(100) as f32 / 100.0;

        // Add a small random factor to break ties and prevent repetitive loops.
        let random_factor = 1.0 + (rand::random::<f32>() * 0.1 - 0.05);
        score * random_factor
    }

    fn score_switch(&self, mon_index: usize, side: Side, state: &BattleState) -> f32 {
        let remaining_hp = state
            .mon_state(side, mon_index)
            .map_or(0, |mon| mon.effective(StatKind::Hp)) as f32;

        // When the switch is forced, the healthiest replacement wins. Otherwise a
        // switch is a small positive baseline, below any decent attack.
        let base_score = if state.turn_id == 0 || state.active_is_knocked_out(side) {
            remaining_hp
        } else {
            1.0
        };
        base_score + rand::random::<f32>() * 0.1
    }
}

impl Behavior for ScoringAI {
    fn decide_action(
        &self,
        side: Side,
        state: &BattleState,
        env: &BattleEnv,
        validator: &dyn Validator,
    ) -> PlayerAction {
        legal_actions(validator, state, &env.teams, side)
            .into_iter()
            .map(|action| (self.score_action(&action, side, state, env), action))
            .max_by(|(a, _), (b, _)| a.total_cmp(b))
            .map_or(PlayerAction::NoOp, |(_, action)| action)
    }
}
