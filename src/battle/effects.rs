//! Effect hooks: attachable behavior with fixed trigger points.
//!
//! An `Effect` is shared, stateless content. Anything an effect needs to
//! remember between triggers lives in the `data` word of its
//! `EffectInstance`, so one effect object can back any number of attachments
//! across any number of concurrent battles.

use crate::battle::commands::{BattleCommand, Side};
use crate::battle::state::{BattleState, TurnRng};
use crate::player::PlayerAction;
use schema::EffectStep;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Where an effect instance is attached.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectScope {
    Global,
    Player(Side),
    /// A mon's own list (self-applied effects)
    Mon { side: Side, mon_index: usize },
    /// A mon's inbound list (effects opposing moves attached)
    Targeted { side: Side, mon_index: usize },
}

impl EffectScope {
    /// The side this scope belongs to, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            EffectScope::Global => None,
            EffectScope::Player(side)
            | EffectScope::Mon { side, .. }
            | EffectScope::Targeted { side, .. } => Some(side),
        }
    }

    /// The mon this scope points at, if any.
    pub fn mon(self) -> Option<(Side, usize)> {
        match self {
            EffectScope::Mon { side, mon_index } | EffectScope::Targeted { side, mon_index } => {
                Some((side, mon_index))
            }
            _ => None,
        }
    }
}

impl fmt::Display for EffectScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectScope::Global => f.write_str("the field"),
            EffectScope::Player(side) => write!(f, "{}'s side", side),
            EffectScope::Mon { side, mon_index } | EffectScope::Targeted { side, mon_index } => {
                write!(f, "{}'s mon {}", side, mon_index)
            }
        }
    }
}

/// One attachment of an effect. `data` is the attachment's private state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EffectInstance {
    pub instance_id: u64,
    pub effect: String,
    pub data: u64,
}

/// Whether the pending move goes ahead after `before_move` hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveGate {
    #[default]
    Proceed,
    Cancel,
    /// Run this action in place of the chosen one
    Redirect(PlayerAction),
}

/// Result of running one hook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookOutcome {
    pub commands: Vec<BattleCommand>,
    /// New value for the instance's `data`
    pub data: Option<u64>,
    /// Detach this instance once the commands are applied
    pub remove: bool,
    pub gate: MoveGate,
}

impl HookOutcome {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn with_commands(commands: Vec<BattleCommand>) -> Self {
        Self {
            commands,
            ..Self::default()
        }
    }

    pub fn with_data(mut self, data: u64) -> Self {
        self.data = Some(data);
        self
    }

    pub fn removing(mut self) -> Self {
        self.remove = true;
        self
    }

    pub fn cancel_move(mut self) -> Self {
        self.gate = MoveGate::Cancel;
        self
    }

    pub fn redirect(mut self, action: PlayerAction) -> Self {
        self.gate = MoveGate::Redirect(action);
        self
    }
}

/// Read-only view handed to every hook.
pub struct EffectContext<'a> {
    pub state: &'a BattleState,
    pub scope: EffectScope,
    pub data: u64,
    /// The side whose mon is moving or switching, for move and switch hooks
    pub acting_side: Option<Side>,
    /// Damage just dealt, for `after_damage`
    pub damage: u32,
    pub rng: &'a mut TurnRng,
}

impl EffectContext<'_> {
    /// The mon this effect is attached to, or the active mon of the side it
    /// is attached to for player-scoped effects.
    pub fn host_mon(&self) -> Option<(Side, usize)> {
        match self.scope {
            EffectScope::Global => None,
            EffectScope::Player(side) => Some((side, self.state.active_mon_index(side))),
            scope => scope.mon(),
        }
    }

    /// True when the host mon is the side's active mon.
    pub fn host_is_active(&self) -> bool {
        self.host_mon()
            .is_some_and(|(side, mon_index)| self.state.active_mon_index(side) == mon_index)
    }
}

/// A hook object. Every trigger point defaults to doing nothing.
pub trait Effect: Send + Sync + fmt::Debug {
    /// Registry id, also stored on every attachment.
    fn id(&self) -> &str;

    /// Attaching again to a target that already carries this effect is a no-op.
    fn single_instance(&self) -> bool {
        false
    }

    /// Removed from a mon when it switches out.
    fn is_volatile(&self) -> bool {
        false
    }

    /// Removed at the end of the turn it was attached in.
    fn lasts_single_turn(&self) -> bool {
        false
    }

    fn should_apply(&self, _ctx: &EffectContext) -> bool {
        true
    }

    fn on_apply(&self, _ctx: &mut EffectContext) -> HookOutcome {
        HookOutcome::unchanged()
    }

    fn on_remove(&self, _ctx: &mut EffectContext) -> Vec<BattleCommand> {
        Vec::new()
    }

    fn on_round_start(&self, _ctx: &mut EffectContext) -> HookOutcome {
        HookOutcome::unchanged()
    }

    fn on_round_end(&self, _ctx: &mut EffectContext) -> HookOutcome {
        HookOutcome::unchanged()
    }

    fn on_switch_in(&self, _ctx: &mut EffectContext) -> HookOutcome {
        HookOutcome::unchanged()
    }

    fn on_switch_out(&self, _ctx: &mut EffectContext) -> HookOutcome {
        HookOutcome::unchanged()
    }

    /// May cancel or redirect the pending move of `ctx.acting_side`.
    fn before_move(&self, _ctx: &mut EffectContext) -> HookOutcome {
        HookOutcome::unchanged()
    }

    fn after_damage(&self, _ctx: &mut EffectContext) -> HookOutcome {
        HookOutcome::unchanged()
    }
}

/// Route a trigger point to the matching hook.
pub fn run_step(effect: &dyn Effect, step: EffectStep, ctx: &mut EffectContext) -> HookOutcome {
    match step {
        EffectStep::OnApply => effect.on_apply(ctx),
        EffectStep::OnRemove => HookOutcome::with_commands(effect.on_remove(ctx)),
        EffectStep::RoundStart => effect.on_round_start(ctx),
        EffectStep::RoundEnd => effect.on_round_end(ctx),
        EffectStep::OnMonSwitchIn => effect.on_switch_in(ctx),
        EffectStep::OnMonSwitchOut => effect.on_switch_out(ctx),
        EffectStep::BeforeMove => effect.before_move(ctx),
        EffectStep::AfterDamage => effect.after_damage(ctx),
    }
}

/// Registry of every effect a battle may attach, keyed by id.
#[derive(Debug, Default, Clone)]
pub struct EffectRegistry {
    lookup_table: HashMap<String, Arc<dyn Effect>>,
}

impl EffectRegistry {
    pub fn new(effects: Vec<Arc<dyn Effect>>) -> Self {
        let lookup_table = effects
            .into_iter()
            .map(|effect| (effect.id().to_string(), effect))
            .collect();
        Self { lookup_table }
    }

    /// Adds an effect, replacing any earlier one with the same id.
    pub fn register(&mut self, effect: Arc<dyn Effect>) {
        self.lookup_table.insert(effect.id().to_string(), effect);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Effect>> {
        self.lookup_table.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lookup_table.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lookup_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup_table.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.lookup_table.keys().map(String::as_str)
    }
}
