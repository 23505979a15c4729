//! Legality and timing policy.

use crate::battle::commands::Side;
use crate::battle::state::BattleState;
use crate::battle::stats::effective_stamina;
use crate::errors::SetupError;
use crate::mon::Team;
use crate::player::PlayerAction;
use crate::protocol::commit_manager::{committer_for, TurnCommitments};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Limits and timeouts. Timeouts are in seconds.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ValidatorConfig {
    pub mons_per_team: usize,
    pub moves_per_mon: usize,
    pub timeout_secs: u64,
    /// Stretches the window a forced-switch obligor gets to send in a replacement.
    pub prev_turn_multiplier: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            mons_per_team: 3,
            moves_per_mon: 4,
            timeout_secs: 30,
            prev_turn_multiplier: 2,
        }
    }
}

pub trait Validator: Send + Sync + fmt::Debug {
    fn config(&self) -> &ValidatorConfig;

    /// Roster size and move-count limits, checked once at battle start.
    fn validate_team(&self, side: Side, team: &Team) -> Result<(), SetupError>;

    fn validate_action(
        &self,
        state: &BattleState,
        teams: &[Team; 2],
        side: Side,
        action: &PlayerAction,
    ) -> bool;

    /// The side that has overrun its window at `now`, if any.
    fn validate_timeout(&self, state: &BattleState, turn: &TurnCommitments, now: u64)
        -> Option<Side>;
}

#[derive(Debug, Clone, Default)]
pub struct DefaultValidator {
    config: ValidatorConfig,
}

impl DefaultValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    fn valid_switch_target(&self, state: &BattleState, side: Side, mon_index: usize) -> bool {
        let Some(mon) = state.mon_state(side, mon_index) else {
            return false;
        };
        // On the lead selection turn any living slot is fine, even slot 0.
        !mon.is_knocked_out && (state.turn_id == 0 || mon_index != state.active_mon_index(side))
    }

    fn valid_move(
        &self,
        state: &BattleState,
        teams: &[Team; 2],
        side: Side,
        move_index: usize,
        extra_data: u64,
    ) -> bool {
        if move_index >= self.config.moves_per_mon {
            return false;
        }
        let Some(move_set) = teams[side.index()]
            .get(state.active_mon_index(side))
            .and_then(|mon| mon.move_at(move_index))
        else {
            return false;
        };
        move_set.stamina_cost() <= effective_stamina(state, side)
            && move_set.is_valid_target(state, side, extra_data)
    }
}

impl Validator for DefaultValidator {
    fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    fn validate_team(&self, side: Side, team: &Team) -> Result<(), SetupError> {
        if team.len() != self.config.mons_per_team {
            return Err(SetupError::TeamSize {
                side,
                expected: self.config.mons_per_team,
                actual: team.len(),
            });
        }
        for (mon_index, mon) in team.mons.iter().enumerate() {
            if mon.moves.len() > self.config.moves_per_mon {
                return Err(SetupError::TooManyMoves {
                    side,
                    mon_index,
                    actual: mon.moves.len(),
                    max: self.config.moves_per_mon,
                });
            }
        }
        Ok(())
    }

    fn validate_action(
        &self,
        state: &BattleState,
        teams: &[Team; 2],
        side: Side,
        action: &PlayerAction,
    ) -> bool {
        // Lead selection and replacing a knocked out mon are switch-only.
        let must_switch = state.turn_id == 0 || state.active_is_knocked_out(side);

        match action {
            PlayerAction::Switch { mon_index } => self.valid_switch_target(state, side, *mon_index),
            _ if must_switch => false,
            PlayerAction::NoOp => true,
            PlayerAction::UseMove {
                move_index,
                extra_data,
            } => self.valid_move(state, teams, side, *move_index, *extra_data),
        }
    }

    fn validate_timeout(
        &self,
        state: &BattleState,
        turn: &TurnCommitments,
        now: u64,
    ) -> Option<Side> {
        if state.is_finished() {
            return None;
        }
        let timeout = self.config.timeout_secs;
        let opened = state.last_turn_timestamp;

        if let Some(obligor) = state.switch_flag {
            let window = timeout.saturating_mul(self.config.prev_turn_multiplier);
            let stalled = turn.revealed(obligor).is_none() && now >= opened.saturating_add(window);
            return stalled.then_some(obligor);
        }

        let committer = committer_for(state.turn_id);
        let other = committer.opponent();
        match (
            turn.committed_at,
            turn.revealed_at[other.index()],
            turn.revealed_at[committer.index()],
        ) {
            (None, _, _) => (now >= opened.saturating_add(timeout)).then_some(committer),
            (Some(committed_at), None, _) => {
                (now >= committed_at.saturating_add(timeout)).then_some(other)
            }
            (Some(_), Some(revealed_at), None) => {
                (now >= revealed_at.saturating_add(timeout)).then_some(committer)
            }
            (Some(_), Some(_), Some(_)) => None,
        }
    }
}

/// Every action the validator would accept for `side` right now.
pub fn legal_actions(
    validator: &dyn Validator,
    state: &BattleState,
    teams: &[Team; 2],
    side: Side,
) -> Vec<PlayerAction> {
    let roster_len = state.mon_states[side.index()].len();
    let move_count = teams[side.index()]
        .get(state.active_mon_index(side))
        .map_or(0, |mon| mon.moves.len());
    let is_legal = |action: &PlayerAction| validator.validate_action(state, teams, side, action);

    let mut actions: Vec<PlayerAction> = (0..roster_len)
        .map(|mon_index| PlayerAction::Switch { mon_index })
        .filter(|action| is_legal(action))
        .collect();
    // extra_data is move-specific; offer the first payload the move accepts.
    actions.extend((0..move_count).filter_map(|move_index| {
        (0..roster_len.max(1) as u64)
            .map(|extra_data| PlayerAction::UseMove {
                move_index,
                extra_data,
            })
            .find(|action| is_legal(action))
    }));
    if is_legal(&PlayerAction::NoOp) {
        actions.push(PlayerAction::NoOp);
    }
    actions
}
