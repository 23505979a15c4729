use crate::battle::commands::{BattleCommand, Side};
use crate::battle::effects::EffectScope;
use crate::battle::state::{BattleEvent, BattleState};
use crate::battle::stats::{calculate_damage, effective_attack, effective_defense, move_hits};
use crate::moves::{MoveContext, MoveSet};
use schema::{MonType, MoveClass, DEFAULT_PRIORITY};

/// Who an attack's secondary effect lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflictTarget {
    /// The opposing active mon's targeted list
    OpponentMon,
    /// The opposing player's side
    OpponentSide,
    /// The user's own list
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inflict {
    pub effect: String,
    /// Percent chance, 100 or more always applies without a roll
    pub chance: u32,
    pub target: InflictTarget,
}

/// Damage plus an optional secondary effect. Covers plain attacks, status
/// moves (power 0) and hazard setters.
#[derive(Debug, Clone)]
pub struct StandardAttack {
    name: String,
    power: u32,
    accuracy: u32,
    stamina: u32,
    priority: i32,
    class: MoveClass,
    move_type: MonType,
    inflicts: Option<Inflict>,
}

impl StandardAttack {
    pub fn new(name: impl Into<String>, power: u32) -> Self {
        Self {
            name: name.into(),
            power,
            accuracy: 100,
            stamina: 1,
            priority: DEFAULT_PRIORITY,
            class: MoveClass::Physical,
            move_type: MonType::None,
            inflicts: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy: u32) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_stamina(mut self, stamina: u32) -> Self {
        self.stamina = stamina;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_class(mut self, class: MoveClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_type(mut self, move_type: MonType) -> Self {
        self.move_type = move_type;
        self
    }

    pub fn inflicting(
        mut self,
        effect: impl Into<String>,
        chance: u32,
        target: InflictTarget,
    ) -> Self {
        self.inflicts = Some(Inflict {
            effect: effect.into(),
            chance,
            target,
        });
        self
    }

    fn damage_commands(&self, ctx: &mut MoveContext) -> Vec<BattleCommand> {
        if self.power == 0 {
            return Vec::new();
        }
        let target = ctx.opponent();
        let attack = effective_attack(ctx.state, ctx.user, self.class);
        let defense = effective_defense(ctx.state, target, self.class);
        let defender_types = ctx
            .active_mon(target)
            .map_or((MonType::None, MonType::None), |mon| mon.types);
        let multiplier = ctx.type_chart.multiplier(self.move_type, defender_types);
        let damage = calculate_damage(self.power, attack, defense, multiplier);
        vec![BattleCommand::damage_active(ctx.state, target, damage)]
    }

    fn inflict_commands(&self, ctx: &mut MoveContext) -> Vec<BattleCommand> {
        let Some(inflict) = &self.inflicts else {
            return Vec::new();
        };
        if inflict.chance < 100 && ctx.rng.roll_percent("effect chance") > inflict.chance {
            return Vec::new();
        }
        let target = ctx.opponent();
        let scope = match inflict.target {
            InflictTarget::OpponentMon => EffectScope::Targeted {
                side: target,
                mon_index: ctx.state.active_mon_index(target),
            },
            InflictTarget::OpponentSide => EffectScope::Player(target),
            InflictTarget::User => EffectScope::Mon {
                side: ctx.user,
                mon_index: ctx.state.active_mon_index(ctx.user),
            },
        };
        vec![BattleCommand::AddEffect {
            scope,
            effect: inflict.effect.clone(),
            data: 0,
        }]
    }
}

impl MoveSet for StandardAttack {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self, _state: &BattleState, _user: Side) -> i32 {
        self.priority
    }

    fn stamina_cost(&self) -> u32 {
        self.stamina
    }

    fn move_class(&self) -> MoveClass {
        self.class
    }

    fn move_type(&self) -> MonType {
        self.move_type
    }

    fn base_power(&self) -> u32 {
        self.power
    }

    fn accuracy(&self) -> u32 {
        self.accuracy
    }

    fn execute(&self, ctx: &mut MoveContext) -> Vec<BattleCommand> {
        if !move_hits(self.accuracy, ctx.rng) {
            return vec![BattleCommand::EmitEvent(BattleEvent::MoveMissed {
                side: ctx.user,
                move_name: self.name.clone(),
            })];
        }
        let mut commands = self.damage_commands(ctx);
        commands.extend(self.inflict_commands(ctx));
        commands
    }
}

/// Hits, then switches the user out to the roster slot in `extra_data`.
#[derive(Debug, Clone)]
pub struct PivotAttack {
    attack: StandardAttack,
}

impl PivotAttack {
    pub fn new(attack: StandardAttack) -> Self {
        Self { attack }
    }
}

impl MoveSet for PivotAttack {
    fn name(&self) -> &str {
        self.attack.name()
    }

    fn priority(&self, state: &BattleState, user: Side) -> i32 {
        self.attack.priority(state, user)
    }

    fn stamina_cost(&self) -> u32 {
        self.attack.stamina_cost()
    }

    fn move_class(&self) -> MoveClass {
        self.attack.move_class()
    }

    fn move_type(&self) -> MonType {
        self.attack.move_type()
    }

    fn base_power(&self) -> u32 {
        self.attack.base_power()
    }

    fn accuracy(&self) -> u32 {
        self.attack.accuracy()
    }

    fn is_valid_target(&self, state: &BattleState, user: Side, extra_data: u64) -> bool {
        let Ok(mon_index) = usize::try_from(extra_data) else {
            return false;
        };
        mon_index != state.active_mon_index(user)
            && state
                .mon_state(user, mon_index)
                .is_some_and(|mon| !mon.is_knocked_out)
    }

    fn execute(&self, ctx: &mut MoveContext) -> Vec<BattleCommand> {
        let mut commands = self.attack.execute(ctx);
        if let Ok(mon_index) = usize::try_from(ctx.extra_data) {
            commands.push(BattleCommand::ForceSwitch {
                side: ctx.user,
                mon_index,
            });
        }
        commands
    }
}
