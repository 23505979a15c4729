use crate::battle::commands::{execute_command, BattleCommand, CommandOutcome, Side};
use crate::battle::effects::{
    run_step, EffectContext, EffectInstance, EffectRegistry, EffectScope, MoveGate,
};
use crate::battle::state::{
    ActionFailureReason, BattleEvent, BattleState, EventBus, GameState, TurnRng,
};
use crate::battle::stats::{effective_speed, effective_stamina, NeutralTypeChart, TypeChart};
use crate::mon::Team;
use crate::moves::MoveContext;
use crate::observers::BattleObserver;
use crate::player::PlayerAction;
use schema::{EffectStep, StatKind, DEFAULT_PRIORITY, SWITCH_PRIORITY};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Hooks may trigger further hooks (damage -> after_damage -> damage ...).
/// Anything nested deeper than this is dropped with a warning.
pub const MAX_HOOK_DEPTH: usize = 8;

/// Everything a battle needs besides its mutable state.
#[derive(Debug, Clone)]
pub struct BattleEnv {
    pub teams: [Team; 2],
    pub effects: Arc<EffectRegistry>,
    pub type_chart: Arc<dyn TypeChart>,
    pub observers: Vec<Arc<dyn BattleObserver>>,
}

impl BattleEnv {
    pub fn new(teams: [Team; 2], effects: Arc<EffectRegistry>) -> Self {
        Self {
            teams,
            effects,
            type_chart: Arc::new(NeutralTypeChart),
            observers: Vec::new(),
        }
    }

    pub fn with_type_chart(mut self, type_chart: Arc<dyn TypeChart>) -> Self {
        self.type_chart = type_chart;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn BattleObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

/// Attach the ruleset's global effects (running their `on_apply`).
pub fn apply_ruleset(
    state: &mut BattleState,
    env: &BattleEnv,
    ruleset: &[String],
    rng: TurnRng,
) -> EventBus {
    let mut resolver = Resolver::new(state, env, rng);
    for effect in ruleset {
        resolver.attach_effect(EffectScope::Global, effect, 0);
    }
    resolver.finish()
}

/// Resolve one turn with the revealed actions.
///
/// On a forced-switch turn only the obligated side's action is read. The
/// caller is expected to have validated both actions already; anything that
/// still turns out to be impossible (a switch into a slot that fell this
/// turn, an attack into a knocked out mon) is reported as `ActionFailed` and
/// skipped.
pub fn resolve_turn(
    state: &mut BattleState,
    env: &BattleEnv,
    actions: [Option<PlayerAction>; 2],
    rng: TurnRng,
    now: u64,
) -> EventBus {
    if state.is_finished() {
        warn!(battle = %state.battle_key, "resolve_turn called on a finished battle");
        return EventBus::new();
    }

    let mut resolver = Resolver::new(state, env, rng);
    let turn_id = resolver.state.turn_id;
    resolver.state.game_state = GameState::TurnInProgress;
    resolver.bus.push(BattleEvent::TurnStarted { turn_id });
    debug!(battle = %resolver.state.battle_key, turn_id, "turn started");

    match resolver.state.switch_flag {
        Some(side) => resolver.resolve_forced_switch(side, actions[side.index()]),
        None => resolver.resolve_full_turn(actions),
    }

    resolver.finalize_turn(now);
    resolver.finish()
}

/// End the battle in favour of `loser`'s opponent without resolving a turn.
pub fn forfeit(state: &mut BattleState, env: &BattleEnv, loser: Side) -> EventBus {
    let mut bus = EventBus::new();
    if state.is_finished() {
        return bus;
    }
    let winner = loser.opponent();
    state.game_state = GameState::Finished { winner };
    state.switch_flag = None;
    bus.push(BattleEvent::PlayerTimedOut { side: loser });
    bus.push(BattleEvent::BattleEnded { winner });
    info!(battle = %state.battle_key, %winner, %loser, "battle ended by timeout");
    for observer in &env.observers {
        observer.on_game_end(state, winner);
    }
    bus
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActionPriority {
    priority: i32, // Switch and no-op: SWITCH_PRIORITY, Move: declared
    speed: u32,    // Effective speed for tiebreaking
}

fn calculate_action_priority(
    state: &BattleState,
    env: &BattleEnv,
    side: Side,
    action: &PlayerAction,
) -> ActionPriority {
    let priority = match action {
        PlayerAction::Switch { .. } | PlayerAction::NoOp => SWITCH_PRIORITY,
        PlayerAction::UseMove { move_index, .. } => env.teams[side.index()]
            .get(state.active_mon_index(side))
            .and_then(|mon| mon.move_at(*move_index))
            .map_or(DEFAULT_PRIORITY, |move_set| move_set.priority(state, side)),
    };
    ActionPriority {
        priority,
        speed: effective_speed(state, side),
    }
}

/// Order actions by priority, then effective speed, then a coin flip drawn
/// from the turn's randomness. The draw only happens on a full tie.
pub fn determine_action_order(
    state: &BattleState,
    env: &BattleEnv,
    actions: &[(Side, PlayerAction)],
    rng: &mut TurnRng,
) -> Vec<(Side, PlayerAction)> {
    let mut ranked: Vec<(Side, PlayerAction, ActionPriority)> = actions
        .iter()
        .map(|(side, action)| {
            (
                *side,
                *action,
                calculate_action_priority(state, env, *side, action),
            )
        })
        .collect();

    let tie_winner = match ranked.as_slice() {
        [(_, _, a), (_, _, b)] if a == b => {
            let first = if rng.next_value("speed tie") % 2 == 0 {
                Side::P0
            } else {
                Side::P1
            };
            Some(first)
        }
        _ => None,
    };

    ranked.sort_by(|a, b| {
        b.2.priority
            .cmp(&a.2.priority)
            .then_with(|| b.2.speed.cmp(&a.2.speed))
    });
    if let Some(first) = tie_winner {
        ranked.sort_by_key(|(side, ..)| *side != first);
    }

    debug!(order = ?ranked, "action order");
    ranked
        .into_iter()
        .map(|(side, action, _)| (side, action))
        .collect()
}

/// Per-turn working set. All state changes during a turn go through here so
/// hook dispatch, knockout bookkeeping and randomness stay in one place.
struct Resolver<'a> {
    state: &'a mut BattleState,
    env: &'a BattleEnv,
    bus: EventBus,
    rng: TurnRng,
    depth: usize,
    /// Sides in the order their mons were knocked out this turn.
    ko_log: Vec<Side>,
}

impl<'a> Resolver<'a> {
    fn new(state: &'a mut BattleState, env: &'a BattleEnv, rng: TurnRng) -> Self {
        Self {
            state,
            env,
            bus: EventBus::new(),
            rng,
            depth: 0,
            ko_log: Vec::new(),
        }
    }

    fn finish(self) -> EventBus {
        let Resolver {
            state, bus, rng, ..
        } = self;
        state.rng_history.extend(rng.into_history());
        bus
    }

    fn resolve_full_turn(&mut self, actions: [Option<PlayerAction>; 2]) {
        // 1. Round-start hooks (not on the lead selection turn)
        if self.state.turn_id > 0 {
            self.run_round_hooks(EffectStep::RoundStart);
            if self.check_game_over() {
                return;
            }
        }

        // 2. Order and execute both actions, checking for a winner after each
        let submitted: Vec<(Side, PlayerAction)> = Side::BOTH
            .into_iter()
            .map(|side| (side, actions[side.index()].unwrap_or(PlayerAction::NoOp)))
            .collect();
        let order = determine_action_order(self.state, self.env, &submitted, &mut self.rng);

        for (side, action) in order {
            if !action.is_switch() && self.state.active_is_knocked_out(side) {
                debug!(%side, %action, "actor was knocked out, skipping");
                if action != PlayerAction::NoOp {
                    self.bus.push(BattleEvent::ActionFailed {
                        side,
                        reason: ActionFailureReason::ActorKnockedOut,
                    });
                }
                continue;
            }
            self.execute_action(side, action);
            if self.check_game_over() {
                return;
            }
        }

        // 3. Round-end hooks, then a final win check
        self.run_round_hooks(EffectStep::RoundEnd);
        self.check_game_over();
    }

    fn resolve_forced_switch(&mut self, side: Side, action: Option<PlayerAction>) {
        match action {
            Some(PlayerAction::Switch { mon_index }) => self.perform_switch(side, mon_index),
            other => {
                warn!(%side, ?other, "forced switch turn without a switch");
                self.bus.push(BattleEvent::ActionFailed {
                    side,
                    reason: ActionFailureReason::InvalidSwitchTarget,
                });
            }
        }
        self.check_game_over();
    }

    fn finalize_turn(&mut self, now: u64) {
        // 1. Work out who owes a replacement
        if !self.state.is_finished() {
            let state = &*self.state;
            let needs = Side::BOTH
                .map(|side| state.active_is_knocked_out(side) && state.has_replacement(side));
            let flag = match needs {
                [true, false] => Some(Side::P0),
                [false, true] => Some(Side::P1),
                [true, true] => {
                    debug!("both sides must replace a knocked out mon");
                    None
                }
                [false, false] => None,
            };
            self.state.switch_flag = flag;
            self.state.game_state = match flag {
                Some(side) => GameState::WaitingForReplacement(side),
                None => GameState::WaitingForActions,
            };
        }

        // 2. Drop single-turn effects
        self.expire_single_turn_effects();

        // 3. Advance the turn
        let turn_id = self.state.turn_id;
        self.state.turn_id += 1;
        self.state.last_turn_timestamp = now;
        self.bus.push(BattleEvent::TurnEnded { turn_id });
        debug!(battle = %self.state.battle_key, turn_id, "turn ended");
    }

    fn execute_action(&mut self, side: Side, action: PlayerAction) {
        debug!(%side, %action, "executing action");
        match action {
            PlayerAction::Switch { mon_index } => self.perform_switch(side, mon_index),
            PlayerAction::UseMove {
                move_index,
                extra_data,
            } => self.execute_move(side, move_index, extra_data),
            PlayerAction::NoOp => {}
        }
    }

    fn execute_move(&mut self, side: Side, move_index: usize, extra_data: u64) {
        match self.run_before_move(side) {
            MoveGate::Proceed => self.perform_move(side, move_index, extra_data),
            MoveGate::Cancel => debug!(%side, "move cancelled by effect"),
            MoveGate::Redirect(action) => {
                debug!(%side, %action, "move redirected by effect");
                match action {
                    PlayerAction::UseMove {
                        move_index,
                        extra_data,
                    } => self.perform_move(side, move_index, extra_data),
                    PlayerAction::Switch { mon_index } => self.perform_switch(side, mon_index),
                    PlayerAction::NoOp => {}
                }
            }
        }
    }

    /// `before_move` hooks of the mover: its own mon, its side, then global.
    fn run_before_move(&mut self, side: Side) -> MoveGate {
        let mon_index = self.state.active_mon_index(side);
        let scopes = [
            EffectScope::Mon { side, mon_index },
            EffectScope::Targeted { side, mon_index },
            EffectScope::Player(side),
            EffectScope::Global,
        ];
        for scope in scopes {
            let gate = self.run_scope_hooks(scope, EffectStep::BeforeMove, Some(side), 0);
            if gate != MoveGate::Proceed {
                return gate;
            }
        }
        MoveGate::Proceed
    }

    fn perform_move(&mut self, side: Side, move_index: usize, extra_data: u64) {
        let mon_index = self.state.active_mon_index(side);
        let Some(move_set) = self.env.teams[side.index()]
            .get(mon_index)
            .and_then(|mon| mon.move_at(move_index))
            .cloned()
        else {
            self.bus.push(BattleEvent::ActionFailed {
                side,
                reason: ActionFailureReason::InvalidMove,
            });
            return;
        };

        // Attacking into a mon that already fell this turn does nothing.
        if move_set.move_class().targets_opponent()
            && self.state.active_is_knocked_out(side.opponent())
        {
            self.bus.push(BattleEvent::ActionFailed {
                side,
                reason: ActionFailureReason::TargetKnockedOut,
            });
            return;
        }

        let cost = move_set.stamina_cost();
        if cost > effective_stamina(self.state, side) {
            self.bus.push(BattleEvent::ActionFailed {
                side,
                reason: ActionFailureReason::NotEnoughStamina,
            });
            return;
        }
        if cost > 0 {
            self.apply_command(BattleCommand::UpdateMonState {
                side,
                mon_index,
                stat: StatKind::Stamina,
                delta: -i64::from(cost),
            });
        }

        self.bus.push(BattleEvent::MoveUsed {
            side,
            mon_index,
            move_name: move_set.name().to_string(),
        });

        let commands = {
            let mut ctx = MoveContext {
                state: &*self.state,
                teams: &self.env.teams,
                type_chart: self.env.type_chart.as_ref(),
                user: side,
                extra_data,
                rng: &mut self.rng,
            };
            move_set.execute(&mut ctx)
        };
        self.apply_commands(commands);
    }

    /// Swap the active mon. Invalid targets are reported and ignored.
    fn perform_switch(&mut self, side: Side, mon_index: usize) {
        let lead_selection = self.state.turn_id == 0;
        let current = self.state.active_mon_index(side);
        let valid = self
            .state
            .mon_state(side, mon_index)
            .is_some_and(|mon| !mon.is_knocked_out)
            && (lead_selection || mon_index != current);
        if !valid {
            debug!(%side, mon_index, "ignoring invalid switch target");
            self.bus.push(BattleEvent::ActionFailed {
                side,
                reason: ActionFailureReason::InvalidSwitchTarget,
            });
            return;
        }

        if !lead_selection {
            self.switch_out(side, current);
        }

        self.state.active_mon_index[side.index()] = mon_index;
        self.bus.push(BattleEvent::MonSwitched {
            side,
            from: current,
            to: mon_index,
        });
        info!(
            battle = %self.state.battle_key,
            %side,
            from = current,
            to = mon_index,
            "mon switched"
        );

        self.switch_in(side, mon_index);
    }

    fn switch_out(&mut self, side: Side, mon_index: usize) {
        // 1. Volatile effects go first
        for scope in [
            EffectScope::Mon { side, mon_index },
            EffectScope::Targeted { side, mon_index },
        ] {
            let volatile: Vec<u64> = self
                .state
                .effects(scope)
                .map(|list| {
                    list.iter()
                        .filter(|instance| {
                            self.env
                                .effects
                                .get(&instance.effect)
                                .is_some_and(|effect| effect.is_volatile())
                        })
                        .map(|instance| instance.instance_id)
                        .collect()
                })
                .unwrap_or_default();
            for instance_id in volatile {
                self.detach_effect(scope, instance_id);
            }
        }

        // 2. Switch-out hooks, global -> player -> mon
        for scope in [
            EffectScope::Global,
            EffectScope::Player(side),
            EffectScope::Mon { side, mon_index },
            EffectScope::Targeted { side, mon_index },
        ] {
            self.run_scope_hooks(scope, EffectStep::OnMonSwitchOut, Some(side), 0);
        }

        let env = self.env;
        for observer in &env.observers {
            observer.on_switch_out(self.state, side, mon_index);
        }
    }

    fn switch_in(&mut self, side: Side, mon_index: usize) {
        // 1. The incoming mon's ability
        let ability = self.env.teams[side.index()]
            .get(mon_index)
            .and_then(|mon| mon.ability.clone());
        if let Some(ability) = ability {
            let commands = {
                let mut ctx = MoveContext {
                    state: &*self.state,
                    teams: &self.env.teams,
                    type_chart: self.env.type_chart.as_ref(),
                    user: side,
                    extra_data: 0,
                    rng: &mut self.rng,
                };
                ability.activate_on_switch(&mut ctx)
            };
            debug!(%side, ability = ability.name(), "ability activated");
            self.apply_commands(commands);
        }

        // 2. Switch-in hooks, global -> player -> mon
        for scope in [
            EffectScope::Global,
            EffectScope::Player(side),
            EffectScope::Mon { side, mon_index },
            EffectScope::Targeted { side, mon_index },
        ] {
            self.run_scope_hooks(scope, EffectStep::OnMonSwitchIn, Some(side), 0);
        }

        let env = self.env;
        for observer in &env.observers {
            observer.on_switch_in(self.state, side, mon_index);
        }
    }

    /// Global, then each player, then each living active mon.
    fn run_round_hooks(&mut self, step: EffectStep) {
        self.run_scope_hooks(EffectScope::Global, step, None, 0);
        for side in Side::BOTH {
            self.run_scope_hooks(EffectScope::Player(side), step, None, 0);
        }
        for side in Side::BOTH {
            let mon_index = self.state.active_mon_index(side);
            for scope in [
                EffectScope::Mon { side, mon_index },
                EffectScope::Targeted { side, mon_index },
            ] {
                if self.state.active_is_knocked_out(side) {
                    break;
                }
                self.run_scope_hooks(scope, step, None, 0);
            }
        }
    }

    /// Run one hook for every instance in a scope, in attachment order.
    /// Instances attached by these hooks wait for the next trigger.
    fn run_scope_hooks(
        &mut self,
        scope: EffectScope,
        step: EffectStep,
        acting_side: Option<Side>,
        damage: u32,
    ) -> MoveGate {
        let instance_ids: Vec<u64> = self
            .state
            .effects(scope)
            .map(|list| list.iter().map(|instance| instance.instance_id).collect())
            .unwrap_or_default();

        for instance_id in instance_ids {
            let gate = self.dispatch(scope, instance_id, step, acting_side, damage);
            if step == EffectStep::BeforeMove && gate != MoveGate::Proceed {
                return gate;
            }
        }
        MoveGate::Proceed
    }

    fn dispatch(
        &mut self,
        scope: EffectScope,
        instance_id: u64,
        step: EffectStep,
        acting_side: Option<Side>,
        damage: u32,
    ) -> MoveGate {
        if self.depth >= MAX_HOOK_DEPTH {
            warn!(?scope, %step, "hook depth limit reached, skipping");
            return MoveGate::Proceed;
        }
        // An earlier hook may already have removed this instance.
        let Some(instance) = self.state.find_effect(scope, instance_id).cloned() else {
            return MoveGate::Proceed;
        };
        let Some(effect) = self.env.effects.get(&instance.effect).cloned() else {
            warn!(effect = %instance.effect, "effect missing from registry");
            return MoveGate::Proceed;
        };

        let outcome = {
            let mut ctx = EffectContext {
                state: &*self.state,
                scope,
                data: instance.data,
                acting_side,
                damage,
                rng: &mut self.rng,
            };
            run_step(effect.as_ref(), step, &mut ctx)
        };

        if let Some(data) = outcome.data {
            if let Some(entry) = self.state.effects_mut(scope).and_then(|list| {
                list.iter_mut()
                    .find(|entry| entry.instance_id == instance_id)
            }) {
                entry.data = data;
            }
        }

        self.depth += 1;
        self.apply_commands(outcome.commands);
        self.depth -= 1;

        if outcome.remove {
            self.detach_effect(scope, instance_id);
        }

        if outcome.gate == MoveGate::Cancel {
            if let Some(side) = acting_side {
                self.bus.push(BattleEvent::MoveCancelled {
                    side,
                    effect: instance.effect,
                });
            }
        }
        outcome.gate
    }

    fn attach_effect(&mut self, scope: EffectScope, effect_id: &str, data: u64) {
        let Some(effect) = self.env.effects.get(effect_id).cloned() else {
            warn!(effect = effect_id, "cannot attach unknown effect");
            return;
        };
        if self.state.effects(scope).is_none() {
            warn!(?scope, effect = effect_id, "effect scope does not exist");
            return;
        }
        if effect.single_instance() && self.state.has_effect(scope, effect_id) {
            debug!(?scope, effect = effect_id, "single-instance effect already present");
            return;
        }

        let applies = {
            let ctx = EffectContext {
                state: &*self.state,
                scope,
                data,
                acting_side: scope.side(),
                damage: 0,
                rng: &mut self.rng,
            };
            effect.should_apply(&ctx)
        };
        if !applies {
            return;
        }

        let instance_id = self.state.allocate_instance_id();
        if let Some(list) = self.state.effects_mut(scope) {
            list.push(EffectInstance {
                instance_id,
                effect: effect_id.to_string(),
                data,
            });
        }
        self.bus.push(BattleEvent::EffectApplied {
            scope,
            effect: effect_id.to_string(),
        });
        self.dispatch(scope, instance_id, EffectStep::OnApply, scope.side(), 0);
    }

    fn detach_effect(&mut self, scope: EffectScope, instance_id: u64) {
        let Some(list) = self.state.effects_mut(scope) else {
            return;
        };
        let Some(position) = list
            .iter()
            .position(|instance| instance.instance_id == instance_id)
        else {
            return;
        };
        let instance = list.remove(position);
        self.bus.push(BattleEvent::EffectRemoved {
            scope,
            effect: instance.effect.clone(),
        });

        let Some(effect) = self.env.effects.get(&instance.effect).cloned() else {
            return;
        };
        if self.depth >= MAX_HOOK_DEPTH {
            warn!(
                ?scope,
                effect = %instance.effect,
                "hook depth limit reached, skipping on_remove"
            );
            return;
        }
        let commands = {
            let mut ctx = EffectContext {
                state: &*self.state,
                scope,
                data: instance.data,
                acting_side: scope.side(),
                damage: 0,
                rng: &mut self.rng,
            };
            effect.on_remove(&mut ctx)
        };
        self.depth += 1;
        self.apply_commands(commands);
        self.depth -= 1;
    }

    fn expire_single_turn_effects(&mut self) {
        for scope in self.state.all_scopes() {
            let expiring: Vec<u64> = self
                .state
                .effects(scope)
                .map(|list| {
                    list.iter()
                        .filter(|instance| {
                            self.env
                                .effects
                                .get(&instance.effect)
                                .is_some_and(|effect| effect.lasts_single_turn())
                        })
                        .map(|instance| instance.instance_id)
                        .collect()
                })
                .unwrap_or_default();
            for instance_id in expiring {
                self.detach_effect(scope, instance_id);
            }
        }
    }

    fn apply_commands(&mut self, commands: Vec<BattleCommand>) {
        for command in commands {
            self.apply_command(command);
        }
    }

    fn apply_command(&mut self, command: BattleCommand) {
        match command {
            BattleCommand::AddEffect {
                scope,
                effect,
                data,
            } => self.attach_effect(scope, &effect, data),
            BattleCommand::RemoveEffect { scope, instance_id } => {
                self.detach_effect(scope, instance_id)
            }
            BattleCommand::RemoveEffectsNamed { scope, effect } => {
                let matching: Vec<u64> = self
                    .state
                    .effects(scope)
                    .map(|list| {
                        list.iter()
                            .filter(|instance| instance.effect == effect)
                            .map(|instance| instance.instance_id)
                            .collect()
                    })
                    .unwrap_or_default();
                for instance_id in matching {
                    self.detach_effect(scope, instance_id);
                }
            }
            BattleCommand::ForceSwitch { side, mon_index } => {
                if !self.state.is_finished() {
                    self.perform_switch(side, mon_index);
                }
            }
            command => match execute_command(&command, self.state, &mut self.bus) {
                Ok(CommandOutcome::Damaged {
                    side,
                    mon_index,
                    damage,
                    knocked_out,
                }) => {
                    if knocked_out {
                        self.record_knockout(side, mon_index);
                    }
                    self.run_after_damage(side, mon_index, damage);
                }
                Ok(CommandOutcome::KnockedOut { side, mon_index }) => {
                    self.record_knockout(side, mon_index)
                }
                Ok(CommandOutcome::Applied | CommandOutcome::Ignored) => {}
                Err(err) => warn!(%err, ?command, "command failed"),
            },
        }
    }

    fn run_after_damage(&mut self, side: Side, mon_index: usize, damage: u32) {
        for scope in [
            EffectScope::Mon { side, mon_index },
            EffectScope::Targeted { side, mon_index },
        ] {
            self.run_scope_hooks(scope, EffectStep::AfterDamage, None, damage);
        }
    }

    fn record_knockout(&mut self, side: Side, mon_index: usize) {
        info!(battle = %self.state.battle_key, %side, mon_index, "mon knocked out");
        self.ko_log.push(side);
    }

    /// Declare a winner once a side has no living mons. Returns true if the
    /// battle is over.
    fn check_game_over(&mut self) -> bool {
        if self.state.is_finished() {
            return true;
        }
        let alive = Side::BOTH.map(|side| self.state.living_mons(side) > 0);
        let loser = match alive {
            [true, true] => return false,
            [false, true] => Side::P0,
            [true, false] => Side::P1,
            [false, false] => self.first_eliminated(),
        };
        let winner = loser.opponent();

        self.state.game_state = GameState::Finished { winner };
        self.state.switch_flag = None;
        self.bus.push(BattleEvent::PlayerDefeated { side: loser });
        self.bus.push(BattleEvent::BattleEnded { winner });
        info!(battle = %self.state.battle_key, %winner, "battle ended");

        let env = self.env;
        for observer in &env.observers {
            observer.on_game_end(self.state, winner);
        }
        true
    }

    /// Both sides ran out at the same checkpoint: the side whose last mon
    /// fell first loses.
    fn first_eliminated(&self) -> Side {
        let last_fall = |side: Side| self.ko_log.iter().rposition(|fallen| *fallen == side);
        match (last_fall(Side::P0), last_fall(Side::P1)) {
            (Some(p0), Some(p1)) if p1 < p0 => Side::P1,
            (Some(_), None) => Side::P1,
            _ => Side::P0,
        }
    }
}
