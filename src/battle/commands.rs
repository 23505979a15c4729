use crate::battle::effects::EffectScope;
use crate::battle::state::{BattleEvent, BattleState, EventBus};
use schema::StatKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Player side for commands - provides type safety over raw indices
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    P0,
    P1,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::P0, Side::P1];

    pub fn index(self) -> usize {
        match self {
            Side::P0 => 0,
            Side::P1 => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::P0 => Side::P1,
            Side::P1 => Side::P0,
        }
    }

    pub fn from_index(index: usize) -> Option<Side> {
        match index {
            0 => Some(Side::P0),
            1 => Some(Side::P1),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::P0 => f.write_str("P0"),
            Side::P1 => f.write_str("P1"),
        }
    }
}

/// Atomic commands representing final state changes.
///
/// Moves, abilities and effect hooks never touch `BattleState` directly: they
/// return a list of these and the engine applies them in order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleCommand {
    // Mon modifications
    DealDamage {
        side: Side,
        mon_index: usize,
        amount: u32,
    },
    UpdateMonState {
        side: Side,
        mon_index: usize,
        stat: StatKind,
        delta: i64,
    },

    // Effect bookkeeping
    AddEffect {
        scope: EffectScope,
        effect: String,
        data: u64,
    },
    RemoveEffect {
        scope: EffectScope,
        instance_id: u64,
    },
    RemoveEffectsNamed {
        scope: EffectScope,
        effect: String,
    },

    // Battle flow
    ForceSwitch {
        side: Side,
        mon_index: usize,
    },
    SetGlobalValue {
        key: String,
        value: u64,
    },
    EmitEvent(BattleEvent),
}

impl BattleCommand {
    /// Convenience constructor for damaging a side's active mon.
    pub fn damage_active(state: &BattleState, side: Side, amount: u32) -> Self {
        BattleCommand::DealDamage {
            side,
            mon_index: state.active_mon_index(side),
            amount,
        }
    }

    /// Convenience constructor for changing a stat on a side's active mon.
    pub fn update_active(state: &BattleState, side: Side, stat: StatKind, delta: i64) -> Self {
        BattleCommand::UpdateMonState {
            side,
            mon_index: state.active_mon_index(side),
            stat,
            delta,
        }
    }
}

/// Error types for command execution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("no mon at {side} slot {mon_index}")]
    InvalidMonIndex { side: Side, mon_index: usize },
    #[error("command must be applied by the engine")]
    RequiresEngine,
}

/// What a state command did, so the engine can fire follow-up hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// The command had nothing to act on (e.g. damage to a knocked out mon)
    Ignored,
    Damaged {
        side: Side,
        mon_index: usize,
        damage: u32,
        knocked_out: bool,
    },
    KnockedOut {
        side: Side,
        mon_index: usize,
    },
}

/// Apply a single state-only command.
///
/// Effect and switch commands need hook dispatch and return
/// `ExecutionError::RequiresEngine`.
pub fn execute_command(
    command: &BattleCommand,
    state: &mut BattleState,
    bus: &mut EventBus,
) -> Result<CommandOutcome, ExecutionError> {
    trace!(?command, "applying command");
    match command {
        BattleCommand::DealDamage {
            side,
            mon_index,
            amount,
        } => {
            let (side, mon_index, amount) = (*side, *mon_index, *amount);
            let base_hp = state.base_stat(side, mon_index, StatKind::Hp);
            let mon = state
                .mon_state_mut(side, mon_index)
                .ok_or(ExecutionError::InvalidMonIndex { side, mon_index })?;
            if mon.is_knocked_out || amount == 0 {
                return Ok(CommandOutcome::Ignored);
            }
            mon.hp_delta -= i64::from(amount);
            let remaining_hp = effective_value(base_hp, mon.hp_delta);
            let knocked_out = remaining_hp == 0;
            mon.is_knocked_out = knocked_out;

            bus.push(BattleEvent::DamageDealt {
                side,
                mon_index,
                damage: amount,
                remaining_hp,
            });
            if knocked_out {
                bus.push(BattleEvent::MonKnockedOut { side, mon_index });
            }
            Ok(CommandOutcome::Damaged {
                side,
                mon_index,
                damage: amount,
                knocked_out,
            })
        }
        BattleCommand::UpdateMonState {
            side,
            mon_index,
            stat,
            delta,
        } => {
            let (side, mon_index, stat, delta) = (*side, *mon_index, *stat, *delta);
            let base = state.base_stat(side, mon_index, stat);
            let mon = state
                .mon_state_mut(side, mon_index)
                .ok_or(ExecutionError::InvalidMonIndex { side, mon_index })?;
            if mon.is_knocked_out {
                return Ok(CommandOutcome::Ignored);
            }
            let applied = mon.apply_delta(stat, delta);
            if applied == 0 {
                return Ok(CommandOutcome::Ignored);
            }
            bus.push(BattleEvent::StatChanged {
                side,
                mon_index,
                stat,
                delta: applied,
            });

            if stat == StatKind::Hp && effective_value(base, mon.hp_delta) == 0 {
                mon.is_knocked_out = true;
                bus.push(BattleEvent::MonKnockedOut { side, mon_index });
                return Ok(CommandOutcome::KnockedOut { side, mon_index });
            }
            Ok(CommandOutcome::Applied)
        }
        BattleCommand::SetGlobalValue { key, value } => {
            state.global_kv.insert(key.clone(), *value);
            bus.push(BattleEvent::GlobalValueSet {
                key: key.clone(),
                value: *value,
            });
            Ok(CommandOutcome::Applied)
        }
        BattleCommand::EmitEvent(event) => {
            bus.push(event.clone());
            Ok(CommandOutcome::Applied)
        }
        BattleCommand::AddEffect { .. }
        | BattleCommand::RemoveEffect { .. }
        | BattleCommand::RemoveEffectsNamed { .. }
        | BattleCommand::ForceSwitch { .. } => Err(ExecutionError::RequiresEngine),
    }
}

/// Base value plus signed delta, floored at zero.
pub fn effective_value(base: u32, delta: i64) -> u32 {
    let value = i64::from(base) + delta;
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::state::BattleState;
    use crate::player::PlayerId;
    use crate::protocol::commitment::BattleKey;
    use pretty_assertions::assert_eq;
    use schema::MonStats;

    fn two_mon_state() -> BattleState {
        BattleState::new(
            BattleKey::from_bytes([0; 32]),
            [PlayerId::new("alice"), PlayerId::new("bob")],
            [vec![MonStats::default(); 2], vec![MonStats::default()]],
        )
    }

    #[test]
    fn test_damage_to_zero_knocks_out() {
        let mut state = two_mon_state();
        let mut bus = EventBus::new();

        let outcome = execute_command(
            &BattleCommand::DealDamage {
                side: Side::P1,
                mon_index: 0,
                amount: 25,
            },
            &mut state,
            &mut bus,
        )
        .unwrap();

        assert_eq!(
            outcome,
            CommandOutcome::Damaged {
                side: Side::P1,
                mon_index: 0,
                damage: 25,
                knocked_out: true
            }
        );
        assert_eq!(state.mon_states[1][0].hp_delta, -25);
        assert!(state.mon_states[1][0].is_knocked_out);
        assert_eq!(bus.len(), 2);
    }

    #[test]
    fn test_damage_to_knocked_out_mon_is_ignored() {
        let mut state = two_mon_state();
        let mut bus = EventBus::new();
        state.mon_states[0][1].is_knocked_out = true;

        let outcome = execute_command(
            &BattleCommand::DealDamage {
                side: Side::P0,
                mon_index: 1,
                amount: 3,
            },
            &mut state,
            &mut bus,
        )
        .unwrap();

        assert_eq!(outcome, CommandOutcome::Ignored);
        assert_eq!(state.mon_states[0][1].hp_delta, 0);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_healing_never_exceeds_base() {
        let mut state = two_mon_state();
        let mut bus = EventBus::new();
        state.mon_states[0][0].hp_delta = -3;

        execute_command(
            &BattleCommand::UpdateMonState {
                side: Side::P0,
                mon_index: 0,
                stat: StatKind::Hp,
                delta: 10,
            },
            &mut state,
            &mut bus,
        )
        .unwrap();

        assert_eq!(state.mon_states[0][0].hp_delta, 0);
    }

    #[test]
    fn test_invalid_mon_index_is_an_error() {
        let mut state = two_mon_state();
        let mut bus = EventBus::new();

        let result = execute_command(
            &BattleCommand::DealDamage {
                side: Side::P1,
                mon_index: 4,
                amount: 1,
            },
            &mut state,
            &mut bus,
        );

        assert_eq!(
            result,
            Err(ExecutionError::InvalidMonIndex {
                side: Side::P1,
                mon_index: 4
            })
        );
    }

    #[test]
    fn test_effective_value_floors_at_zero() {
        assert_eq!(effective_value(10, -12), 0);
        assert_eq!(effective_value(10, 5), 15);
    }
}
