use crate::battle::commands::{BattleCommand, Side};
use crate::battle::effects::{Effect, EffectContext, EffectScope, HookOutcome};
use schema::StatKind;

pub const STAMINA_REGEN: &str = "StaminaRegen";
pub const FROSTBITE: &str = "Frostbite";
pub const ZAP: &str = "Zap";
pub const SPIKES: &str = "Spikes";
pub const REBOUND: &str = "Rebound";
pub const POISON: &str = "Poison";
pub const FOCUS: &str = "Focus";
pub const BRACE: &str = "Brace";

/// Rounds a frostbite lasts.
pub const FROSTBITE_ROUNDS: u64 = 3;

fn hp_fraction(ctx: &EffectContext, side: Side, mon_index: usize, divisor: u32) -> u32 {
    (ctx.state.base_stat(side, mon_index, StatKind::Hp) / divisor).max(1)
}

fn stat_change(ctx: &EffectContext, stat: StatKind, delta: i64) -> Vec<BattleCommand> {
    let Some((side, mon_index)) = ctx.scope.mon() else {
        return Vec::new();
    };
    vec![BattleCommand::UpdateMonState {
        side,
        mon_index,
        stat,
        delta,
    }]
}

/// Ruleset effect: every living active mon below its base stamina regains 1
/// at the end of each round.
#[derive(Debug, Default)]
pub struct StaminaRegen;

impl Effect for StaminaRegen {
    fn id(&self) -> &str {
        STAMINA_REGEN
    }

    fn single_instance(&self) -> bool {
        true
    }

    fn on_round_end(&self, ctx: &mut EffectContext) -> HookOutcome {
        let commands = Side::BOTH
            .into_iter()
            .filter(|side| {
                ctx.state
                    .active_mon(*side)
                    .is_some_and(|mon| !mon.is_knocked_out && mon.stamina_delta < 0)
            })
            .map(|side| BattleCommand::update_active(ctx.state, side, StatKind::Stamina, 1))
            .collect();
        HookOutcome::with_commands(commands)
    }
}

/// Chip damage of 1/16 base HP per round; thaws after `FROSTBITE_ROUNDS`.
/// The rounds survived so far live in the attachment data.
#[derive(Debug, Default)]
pub struct Frostbite;

impl Effect for Frostbite {
    fn id(&self) -> &str {
        FROSTBITE
    }

    fn single_instance(&self) -> bool {
        true
    }

    fn on_round_end(&self, ctx: &mut EffectContext) -> HookOutcome {
        let Some((side, mon_index)) = ctx.scope.mon() else {
            return HookOutcome::unchanged().removing();
        };
        let damage = hp_fraction(ctx, side, mon_index, 16);
        let outcome = HookOutcome::with_commands(vec![BattleCommand::DealDamage {
            side,
            mon_index,
            amount: damage,
        }]);

        let rounds = ctx.data + 1;
        if rounds >= FROSTBITE_ROUNDS {
            outcome.removing()
        } else {
            outcome.with_data(rounds)
        }
    }
}

/// Skips the host's next move, then wears off.
#[derive(Debug, Default)]
pub struct Zap;

impl Effect for Zap {
    fn id(&self) -> &str {
        ZAP
    }

    fn single_instance(&self) -> bool {
        true
    }

    fn before_move(&self, ctx: &mut EffectContext) -> HookOutcome {
        if ctx.acting_side != ctx.scope.side() {
            return HookOutcome::unchanged();
        }
        HookOutcome::unchanged().cancel_move().removing()
    }
}

/// Player-side hazard: each mon switching in on that side takes 1/8 base HP.
#[derive(Debug, Default)]
pub struct Spikes;

impl Effect for Spikes {
    fn id(&self) -> &str {
        SPIKES
    }

    fn single_instance(&self) -> bool {
        true
    }

    fn on_switch_in(&self, ctx: &mut EffectContext) -> HookOutcome {
        let (EffectScope::Player(side), Some(acting)) = (ctx.scope, ctx.acting_side) else {
            return HookOutcome::unchanged();
        };
        if side != acting {
            return HookOutcome::unchanged();
        }
        let mon_index = ctx.state.active_mon_index(side);
        let damage = hp_fraction(ctx, side, mon_index, 8);
        HookOutcome::with_commands(vec![BattleCommand::DealDamage {
            side,
            mon_index,
            amount: damage,
        }])
    }
}

/// Sends half of any damage taken back at the opposing active mon.
#[derive(Debug, Default)]
pub struct Rebound;

impl Effect for Rebound {
    fn id(&self) -> &str {
        REBOUND
    }

    fn single_instance(&self) -> bool {
        true
    }

    fn after_damage(&self, ctx: &mut EffectContext) -> HookOutcome {
        let Some(side) = ctx.scope.side() else {
            return HookOutcome::unchanged();
        };
        let reflected = ctx.damage / 2;
        if reflected == 0 {
            return HookOutcome::unchanged();
        }
        HookOutcome::with_commands(vec![BattleCommand::damage_active(
            ctx.state,
            side.opponent(),
            reflected,
        )])
    }
}

/// Stacks: every application is its own entry dealing 1 damage per round.
#[derive(Debug, Default)]
pub struct Poison;

impl Effect for Poison {
    fn id(&self) -> &str {
        POISON
    }

    fn on_round_end(&self, ctx: &mut EffectContext) -> HookOutcome {
        let Some((side, mon_index)) = ctx.scope.mon() else {
            return HookOutcome::unchanged();
        };
        HookOutcome::with_commands(vec![BattleCommand::DealDamage {
            side,
            mon_index,
            amount: 1,
        }])
    }
}

/// +2 attack while the mon stays in.
#[derive(Debug, Default)]
pub struct Focus;

impl Effect for Focus {
    fn id(&self) -> &str {
        FOCUS
    }

    fn single_instance(&self) -> bool {
        true
    }

    fn is_volatile(&self) -> bool {
        true
    }

    fn on_apply(&self, ctx: &mut EffectContext) -> HookOutcome {
        HookOutcome::with_commands(stat_change(ctx, StatKind::Attack, 2))
    }

    fn on_remove(&self, ctx: &mut EffectContext) -> Vec<BattleCommand> {
        stat_change(ctx, StatKind::Attack, -2)
    }
}

/// +3 defense for the rest of the turn it was used in.
#[derive(Debug, Default)]
pub struct Brace;

impl Effect for Brace {
    fn id(&self) -> &str {
        BRACE
    }

    fn single_instance(&self) -> bool {
        true
    }

    fn lasts_single_turn(&self) -> bool {
        true
    }

    fn on_apply(&self, ctx: &mut EffectContext) -> HookOutcome {
        HookOutcome::with_commands(stat_change(ctx, StatKind::Defense, 3))
    }

    fn on_remove(&self, ctx: &mut EffectContext) -> Vec<BattleCommand> {
        stat_change(ctx, StatKind::Defense, -3)
    }
}
