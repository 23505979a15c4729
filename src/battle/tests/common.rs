use crate::battle::effects::{EffectInstance, EffectScope};
use crate::battle::engine::BattleEnv;
use crate::battle::state::{BattleEvent, BattleState, EventBus, TurnRng};
use crate::content::moves::StandardAttack;
use crate::content::standard_registry;
use crate::mon::{Mon, Team};
use crate::moves::{Ability, MoveSet};
use crate::player::{PlayerAction, PlayerId};
use crate::protocol::commitment::BattleKey;
use schema::MonStats;
use std::sync::Arc;

/// A builder for creating test mons with common defaults.
///
/// # Example
/// ```ignore
/// let mon = TestMonBuilder::new("Sparky")
///     .with_speed(3)
///     .with_move(StandardAttack::new("Tackle", 4))
///     .build();
/// ```
pub struct TestMonBuilder {
    name: String,
    stats: MonStats,
    moves: Vec<Arc<dyn MoveSet>>,
    ability: Option<Arc<dyn Ability>>,
}

impl TestMonBuilder {
    /// Starts from `MonStats::default()`: 10 hp, 5 stamina, 1 in everything else.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stats: MonStats::default(),
            moves: Vec::new(),
            ability: None,
        }
    }

    pub fn with_hp(mut self, hp: u32) -> Self {
        self.stats.hp = hp;
        self
    }

    pub fn with_stamina(mut self, stamina: u32) -> Self {
        self.stats.stamina = stamina;
        self
    }

    pub fn with_speed(mut self, speed: u32) -> Self {
        self.stats.speed = speed;
        self
    }

    pub fn with_attack(mut self, attack: u32) -> Self {
        self.stats.attack = attack;
        self
    }

    pub fn with_defense(mut self, defense: u32) -> Self {
        self.stats.defense = defense;
        self
    }

    pub fn with_move(mut self, move_set: impl MoveSet + 'static) -> Self {
        self.moves.push(Arc::new(move_set));
        self
    }

    pub fn with_ability(mut self, ability: impl Ability + 'static) -> Self {
        self.ability = Some(Arc::new(ability));
        self
    }

    pub fn build(self) -> Mon {
        let mon = Mon::new(self.name, self.stats).with_moves(self.moves);
        match self.ability {
            Some(ability) => mon.with_ability(ability),
            None => mon,
        }
    }
}

/// A plain attacker: one physical move of the given power.
pub fn attacker(name: &str, speed: u32, power: u32) -> Mon {
    TestMonBuilder::new(name)
        .with_speed(speed)
        .with_move(StandardAttack::new("Tackle", power))
        .build()
}

/// Builds an environment over the standard effect catalog.
pub fn create_test_env(p0_team: Vec<Mon>, p1_team: Vec<Mon>) -> BattleEnv {
    BattleEnv::new(
        [Team::new(p0_team), Team::new(p1_team)],
        Arc::new(standard_registry()),
    )
}

/// Fresh state at turn 0, before leads are picked.
pub fn create_test_state(env: &BattleEnv) -> BattleState {
    BattleState::new(
        BattleKey::from_bytes([7; 32]),
        [PlayerId::new("alice"), PlayerId::new("bob")],
        [env.teams[0].base_stats(), env.teams[1].base_stats()],
    )
}

/// State past lead selection with slot 0 active on both sides.
pub fn create_battle_in_progress(env: &BattleEnv) -> BattleState {
    let mut state = create_test_state(env);
    state.turn_id = 1;
    state
}

/// Creates a `TurnRng` with a generous buffer of default values (50).
/// 50 is even, so speed ties go to P0, and it rolls 51 on percent checks.
pub fn predictable_rng() -> TurnRng {
    TurnRng::new_for_test(vec![50; 100])
}

pub fn use_move(move_index: usize) -> Option<PlayerAction> {
    Some(PlayerAction::UseMove {
        move_index,
        extra_data: 0,
    })
}

pub fn switch_to(mon_index: usize) -> Option<PlayerAction> {
    Some(PlayerAction::Switch { mon_index })
}

/// Position of the first event matching `predicate`.
pub fn position_of(bus: &EventBus, predicate: impl Fn(&BattleEvent) -> bool) -> Option<usize> {
    bus.events().iter().position(predicate)
}

/// Attach an effect directly, skipping `on_apply`. Returns the instance id.
pub fn attach(state: &mut BattleState, scope: EffectScope, effect: &str) -> u64 {
    let instance_id = state.allocate_instance_id();
    if let Some(list) = state.effects_mut(scope) {
        list.push(EffectInstance {
            instance_id,
            effect: effect.to_string(),
            data: 0,
        });
    }
    instance_id
}
