use crate::battle::commands::{effective_value, Side};
use crate::battle::effects::{EffectInstance, EffectScope};
use crate::player::PlayerId;
use crate::protocol::commitment::BattleKey;
use crate::randomness::RandomnessOracle;
use schema::{MonStats, StatKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Copy)]
pub enum GameState {
    WaitingForActions,
    TurnInProgress,
    WaitingForReplacement(Side), // This side must send out a new mon before play resumes
    Finished { winner: Side },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Turn Management
    TurnStarted {
        turn_id: u64,
    },
    TurnEnded {
        turn_id: u64,
    },

    // Mon Actions
    MonSwitched {
        side: Side,
        from: usize,
        to: usize,
    },
    MoveUsed {
        side: Side,
        mon_index: usize,
        move_name: String,
    },
    MoveMissed {
        side: Side,
        move_name: String,
    },
    MoveCancelled {
        side: Side,
        effect: String,
    },
    DamageDealt {
        side: Side,
        mon_index: usize,
        damage: u32,
        remaining_hp: u32,
    },
    StatChanged {
        side: Side,
        mon_index: usize,
        stat: StatKind,
        delta: i64,
    },
    MonKnockedOut {
        side: Side,
        mon_index: usize,
    },

    // Effects
    EffectApplied {
        scope: EffectScope,
        effect: String,
    },
    EffectRemoved {
        scope: EffectScope,
        effect: String,
    },
    GlobalValueSet {
        key: String,
        value: u64,
    },

    // Action Failures
    ActionFailed {
        side: Side,
        reason: ActionFailureReason,
    },

    // Battle End
    PlayerDefeated {
        side: Side,
    },
    PlayerTimedOut {
        side: Side,
    },
    BattleEnded {
        winner: Side,
    },
}

impl BattleEvent {
    /// Formats the event into a human-readable line.
    /// Returns None for silent events that should not produce user-visible text.
    pub fn format(&self) -> Option<String> {
        match self {
            BattleEvent::TurnStarted { turn_id } => Some(format!("=== Turn {} ===", turn_id)),
            BattleEvent::TurnEnded { .. } => None,
            BattleEvent::MonSwitched { side, from, to } => {
                Some(format!("{} recalled mon {} and sent out mon {}", side, from, to))
            }
            BattleEvent::MoveUsed {
                side,
                mon_index,
                move_name,
            } => Some(format!("{}'s mon {} used {}!", side, mon_index, move_name)),
            BattleEvent::MoveMissed { side, .. } => Some(format!("{}'s attack missed!", side)),
            BattleEvent::MoveCancelled { side, effect } => {
                Some(format!("{} could not move because of {}", side, effect))
            }
            BattleEvent::DamageDealt {
                side,
                mon_index,
                damage,
                remaining_hp,
            } => Some(format!(
                "{}'s mon {} took {} damage ({} HP left)",
                side, mon_index, damage, remaining_hp
            )),
            BattleEvent::StatChanged {
                side,
                mon_index,
                stat,
                delta,
            } => Some(format!(
                "{}'s mon {} {} changed by {}",
                side, mon_index, stat, delta
            )),
            BattleEvent::MonKnockedOut { side, mon_index } => {
                Some(format!("{}'s mon {} was knocked out!", side, mon_index))
            }
            BattleEvent::EffectApplied { scope, effect } => {
                Some(format!("{} took hold on {}", effect, scope))
            }
            BattleEvent::EffectRemoved { scope, effect } => {
                Some(format!("{} wore off from {}", effect, scope))
            }
            BattleEvent::GlobalValueSet { .. } => None,
            BattleEvent::ActionFailed { side, reason } => {
                Some(format!("{}'s action failed: {:?}", side, reason))
            }
            BattleEvent::PlayerDefeated { side } => Some(format!("{} has no mons left!", side)),
            BattleEvent::PlayerTimedOut { side } => Some(format!("{} ran out of time", side)),
            BattleEvent::BattleEnded { winner } => Some(format!("{} wins the battle!", winner)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionFailureReason {
    InvalidSwitchTarget,
    InvalidMove,
    TargetKnockedOut, // Opponent-targeting move into a mon that already fell this turn
    ActorKnockedOut,
    NotEnoughStamina,
}

/// Event bus for collecting and managing battle events.
///
/// ```rust,ignore
/// event_bus.log_events();                         // Every event at debug level
/// event_bus.log_events_with_message("Turn 1");    // With header message
/// println!("{}", event_bus);                      // Display impl
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<BattleEvent> {
        self.events
    }

    /// Emit every event through `tracing`, formatted text when available.
    pub fn log_events(&self) {
        for event in &self.events {
            match event.format() {
                Some(formatted) => debug!(target: "mon_arena::events", "{}", formatted),
                None => trace!(target: "mon_arena::events", "{:?}", event),
            }
        }
    }

    pub fn log_events_with_message(&self, message: &str) {
        debug!(target: "mon_arena::events", "{}", message);
        self.log_events();
    }

    /// Return true if the event bus contains no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Return the number of events in the bus.
    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl std::fmt::Display for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

/// The randomness stream for one turn.
///
/// Outside of tests every draw is `oracle.next(previous)`, starting from the
/// turn seed, so anyone holding the revealed salts can replay the turn. Every
/// value handed out (the seed included) is kept for `BattleState::rng_history`.
#[derive(Debug, Clone)]
pub struct TurnRng {
    source: RngSource,
    drawn: Vec<u64>,
}

#[derive(Debug, Clone)]
enum RngSource {
    Scripted { outcomes: Vec<u64>, index: usize },
    Oracle {
        oracle: Arc<dyn RandomnessOracle>,
        current: u64,
    },
}

impl TurnRng {
    pub fn new_for_test(outcomes: Vec<u64>) -> Self {
        Self {
            source: RngSource::Scripted { outcomes, index: 0 },
            drawn: Vec::new(),
        }
    }

    pub fn from_oracle(oracle: Arc<dyn RandomnessOracle>, seed: u64) -> Self {
        Self {
            source: RngSource::Oracle {
                oracle,
                current: seed,
            },
            drawn: vec![seed],
        }
    }

    /// Next raw value in the stream.
    pub fn next_value(&mut self, reason: &str) -> u64 {
        let value = match &mut self.source {
            RngSource::Scripted { outcomes, index } => {
                // Scripted streams wrap around instead of running dry.
                let value = if outcomes.is_empty() {
                    0
                } else {
                    outcomes[*index % outcomes.len()]
                };
                *index += 1;
                value
            }
            RngSource::Oracle { oracle, current } => {
                *current = oracle.next(*current);
                *current
            }
        };
        trace!(value, reason, "rng draw");
        self.drawn.push(value);
        value
    }

    /// A roll in 1..=100.
    pub fn roll_percent(&mut self, reason: &str) -> u32 {
        (self.next_value(reason) % 100) as u32 + 1
    }

    pub fn history(&self) -> &[u64] {
        &self.drawn
    }

    pub fn into_history(self) -> Vec<u64> {
        self.drawn
    }
}

/// Per-mon overlay on immutable base stats.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MonState {
    /// Copied from the roster when the battle starts; never changes.
    pub base: MonStats,
    pub hp_delta: i64,
    pub stamina_delta: i64,
    pub speed_delta: i64,
    pub attack_delta: i64,
    pub defense_delta: i64,
    pub special_attack_delta: i64,
    pub special_defense_delta: i64,
    pub is_knocked_out: bool,
    /// Effects this mon applied to itself, in attachment order.
    pub effects: Vec<EffectInstance>,
    /// Effects opposing moves attached to this mon, in attachment order.
    pub targeted_effects: Vec<EffectInstance>,
}

impl MonState {
    pub fn new(base: MonStats) -> Self {
        Self {
            base,
            hp_delta: 0,
            stamina_delta: 0,
            speed_delta: 0,
            attack_delta: 0,
            defense_delta: 0,
            special_attack_delta: 0,
            special_defense_delta: 0,
            is_knocked_out: false,
            effects: Vec::new(),
            targeted_effects: Vec::new(),
        }
    }

    pub fn delta(&self, stat: StatKind) -> i64 {
        match stat {
            StatKind::Hp => self.hp_delta,
            StatKind::Stamina => self.stamina_delta,
            StatKind::Speed => self.speed_delta,
            StatKind::Attack => self.attack_delta,
            StatKind::Defense => self.defense_delta,
            StatKind::SpecialAttack => self.special_attack_delta,
            StatKind::SpecialDefense => self.special_defense_delta,
        }
    }

    fn delta_mut(&mut self, stat: StatKind) -> &mut i64 {
        match stat {
            StatKind::Hp => &mut self.hp_delta,
            StatKind::Stamina => &mut self.stamina_delta,
            StatKind::Speed => &mut self.speed_delta,
            StatKind::Attack => &mut self.attack_delta,
            StatKind::Defense => &mut self.defense_delta,
            StatKind::SpecialAttack => &mut self.special_attack_delta,
            StatKind::SpecialDefense => &mut self.special_defense_delta,
        }
    }

    /// Adds `delta` to a stat overlay and returns the change actually made.
    /// HP and stamina can never rise above their base value.
    pub fn apply_delta(&mut self, stat: StatKind, delta: i64) -> i64 {
        let capped = matches!(stat, StatKind::Hp | StatKind::Stamina);
        let slot = self.delta_mut(stat);
        let before = *slot;
        let mut after = before.saturating_add(delta);
        if capped {
            after = after.min(0);
        }
        *slot = after;
        after - before
    }

    pub fn effective(&self, stat: StatKind) -> u32 {
        effective_value(self.base.get(stat), self.delta(stat))
    }

    pub fn has_effect(&self, effect: &str) -> bool {
        self.effects
            .iter()
            .chain(self.targeted_effects.iter())
            .any(|instance| instance.effect == effect)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleState {
    pub battle_key: BattleKey,
    pub players: [PlayerId; 2],
    pub turn_id: u64,
    pub game_state: GameState,
    pub active_mon_index: [usize; 2],
    pub mon_states: [Vec<MonState>; 2],
    pub global_effects: Vec<EffectInstance>,
    pub player_effects: [Vec<EffectInstance>; 2],
    /// Every randomness value consumed so far, oldest first.
    pub rng_history: Vec<u64>,
    /// The single side that owes a replacement switch, if any.
    pub switch_flag: Option<Side>,
    pub global_kv: BTreeMap<String, u64>,
    /// Seconds timestamp at which the current turn opened.
    pub last_turn_timestamp: u64,
    next_instance_id: u64,
}

impl BattleState {
    pub fn new(battle_key: BattleKey, players: [PlayerId; 2], rosters: [Vec<MonStats>; 2]) -> Self {
        let [p0, p1] = rosters;
        Self {
            battle_key,
            players,
            turn_id: 0,
            game_state: GameState::WaitingForActions,
            active_mon_index: [0, 0],
            mon_states: [
                p0.into_iter().map(MonState::new).collect(),
                p1.into_iter().map(MonState::new).collect(),
            ],
            global_effects: Vec::new(),
            player_effects: [Vec::new(), Vec::new()],
            rng_history: Vec::new(),
            switch_flag: None,
            global_kv: BTreeMap::new(),
            last_turn_timestamp: 0,
            next_instance_id: 1,
        }
    }

    pub fn winner(&self) -> Option<Side> {
        match self.game_state {
            GameState::Finished { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.winner().is_some()
    }

    pub fn side_of(&self, player: &PlayerId) -> Option<Side> {
        Side::BOTH
            .into_iter()
            .find(|side| &self.players[side.index()] == player)
    }

    pub fn active_mon_index(&self, side: Side) -> usize {
        self.active_mon_index[side.index()]
    }

    pub fn mon_state(&self, side: Side, mon_index: usize) -> Option<&MonState> {
        self.mon_states[side.index()].get(mon_index)
    }

    pub fn mon_state_mut(&mut self, side: Side, mon_index: usize) -> Option<&mut MonState> {
        self.mon_states[side.index()].get_mut(mon_index)
    }

    pub fn active_mon(&self, side: Side) -> Option<&MonState> {
        self.mon_state(side, self.active_mon_index(side))
    }

    pub fn active_is_knocked_out(&self, side: Side) -> bool {
        self.active_mon(side).map_or(true, |mon| mon.is_knocked_out)
    }

    /// Base value of a stat, or 0 for a slot that does not exist.
    pub fn base_stat(&self, side: Side, mon_index: usize, stat: StatKind) -> u32 {
        self.mon_state(side, mon_index)
            .map_or(0, |mon| mon.base.get(stat))
    }

    pub fn effective_stat(&self, side: Side, mon_index: usize, stat: StatKind) -> u32 {
        self.mon_state(side, mon_index)
            .map_or(0, |mon| mon.effective(stat))
    }

    pub fn living_mons(&self, side: Side) -> usize {
        self.mon_states[side.index()]
            .iter()
            .filter(|mon| !mon.is_knocked_out)
            .count()
    }

    /// True if the side has a living mon other than the active one.
    pub fn has_replacement(&self, side: Side) -> bool {
        let active = self.active_mon_index(side);
        self.mon_states[side.index()]
            .iter()
            .enumerate()
            .any(|(index, mon)| index != active && !mon.is_knocked_out)
    }

    pub fn effects(&self, scope: EffectScope) -> Option<&Vec<EffectInstance>> {
        match scope {
            EffectScope::Global => Some(&self.global_effects),
            EffectScope::Player(side) => Some(&self.player_effects[side.index()]),
            EffectScope::Mon { side, mon_index } => {
                self.mon_state(side, mon_index).map(|mon| &mon.effects)
            }
            EffectScope::Targeted { side, mon_index } => self
                .mon_state(side, mon_index)
                .map(|mon| &mon.targeted_effects),
        }
    }

    pub fn effects_mut(&mut self, scope: EffectScope) -> Option<&mut Vec<EffectInstance>> {
        match scope {
            EffectScope::Global => Some(&mut self.global_effects),
            EffectScope::Player(side) => Some(&mut self.player_effects[side.index()]),
            EffectScope::Mon { side, mon_index } => self
                .mon_state_mut(side, mon_index)
                .map(|mon| &mut mon.effects),
            EffectScope::Targeted { side, mon_index } => self
                .mon_state_mut(side, mon_index)
                .map(|mon| &mut mon.targeted_effects),
        }
    }

    /// Whether `effect` is already attached to the target `scope` points at.
    /// Both mon lists count as the same target.
    pub fn has_effect(&self, scope: EffectScope, effect: &str) -> bool {
        match scope {
            EffectScope::Mon { side, mon_index } | EffectScope::Targeted { side, mon_index } => self
                .mon_state(side, mon_index)
                .is_some_and(|mon| mon.has_effect(effect)),
            _ => self
                .effects(scope)
                .is_some_and(|list| list.iter().any(|instance| instance.effect == effect)),
        }
    }

    pub fn find_effect(&self, scope: EffectScope, instance_id: u64) -> Option<&EffectInstance> {
        self.effects(scope)?
            .iter()
            .find(|instance| instance.instance_id == instance_id)
    }

    /// Every scope an effect can live in, in hook tier order.
    pub fn all_scopes(&self) -> Vec<EffectScope> {
        let mut scopes = vec![
            EffectScope::Global,
            EffectScope::Player(Side::P0),
            EffectScope::Player(Side::P1),
        ];
        for side in Side::BOTH {
            for mon_index in 0..self.mon_states[side.index()].len() {
                scopes.push(EffectScope::Mon { side, mon_index });
                scopes.push(EffectScope::Targeted { side, mon_index });
            }
        }
        scopes
    }

    pub(crate) fn allocate_instance_id(&mut self) -> u64 {
        let id = self.next_instance_id;
        self.next_instance_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stamina_delta_is_capped_at_base() {
        let mut mon = MonState::new(MonStats::default());
        assert_eq!(mon.apply_delta(StatKind::Stamina, -2), -2);
        assert_eq!(mon.apply_delta(StatKind::Stamina, 5), 2);
        assert_eq!(mon.stamina_delta, 0);
    }

    #[test]
    fn test_attack_delta_can_go_positive() {
        let mut mon = MonState::new(MonStats::default());
        mon.apply_delta(StatKind::Attack, 3);
        assert_eq!(mon.effective(StatKind::Attack), 4);
        mon.apply_delta(StatKind::Attack, -10);
        assert_eq!(mon.effective(StatKind::Attack), 0);
    }

    #[test]
    fn test_scripted_rng_wraps_and_records() {
        let mut rng = TurnRng::new_for_test(vec![7, 150]);
        assert_eq!(rng.next_value("a"), 7);
        assert_eq!(rng.roll_percent("b"), 51);
        assert_eq!(rng.next_value("c"), 7);
        assert_eq!(rng.into_history(), vec![7, 150, 7]);
    }

    #[test]
    fn test_event_bus_formats_silent_events_as_none() {
        assert_eq!(BattleEvent::TurnEnded { turn_id: 1 }.format(), None);
        assert_eq!(
            BattleEvent::BattleEnded { winner: Side::P1 }.format(),
            Some("P1 wins the battle!".to_string())
        );
    }
}
