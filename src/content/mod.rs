//! A small reference catalog of moves, effects and abilities.

pub mod abilities;
pub mod effects;
pub mod moves;

use crate::battle::effects::{Effect, EffectRegistry};
use crate::mon::{Mon, Team};
use crate::moves::MoveSet;
use abilities::Menace;
use effects::{Brace, Focus, Frostbite, Poison, Rebound, Spikes, StaminaRegen, Zap};
use moves::{InflictTarget, PivotAttack, StandardAttack};
use schema::{MonStats, MonType, MoveClass};
use std::sync::Arc;

/// Registry holding every effect in this catalog.
pub fn standard_registry() -> EffectRegistry {
    EffectRegistry::new(vec![
        Arc::new(StaminaRegen) as Arc<dyn Effect>,
        Arc::new(Frostbite),
        Arc::new(Zap),
        Arc::new(Spikes),
        Arc::new(Rebound),
        Arc::new(Poison),
        Arc::new(Focus),
        Arc::new(Brace),
    ])
}

fn strike() -> Arc<dyn MoveSet> {
    Arc::new(StandardAttack::new("Strike", 6).with_stamina(1))
}

fn demo_moves(variant: usize) -> Vec<Arc<dyn MoveSet>> {
    match variant % 3 {
        0 => vec![
            strike(),
            Arc::new(
                StandardAttack::new("Frost Bite", 4)
                    .with_type(MonType::Ice)
                    .with_class(MoveClass::Special)
                    .with_stamina(2)
                    .inflicting(effects::FROSTBITE, 100, InflictTarget::OpponentMon),
            ),
            Arc::new(
                StandardAttack::new("Quick Jab", 3)
                    .with_priority(4)
                    .with_stamina(1),
            ),
            Arc::new(
                StandardAttack::new("Brace", 0)
                    .with_class(MoveClass::SelfTarget)
                    .with_stamina(0)
                    .inflicting(effects::BRACE, 100, InflictTarget::User),
            ),
        ],
        1 => vec![
            strike(),
            Arc::new(
                StandardAttack::new("Shock", 3)
                    .with_type(MonType::Lightning)
                    .with_class(MoveClass::Special)
                    .with_accuracy(90)
                    .with_stamina(2)
                    .inflicting(effects::ZAP, 50, InflictTarget::OpponentMon),
            ),
            Arc::new(
                StandardAttack::new("Caltrops", 0)
                    .with_class(MoveClass::Other)
                    .with_stamina(2)
                    .inflicting(effects::SPIKES, 100, InflictTarget::OpponentSide),
            ),
            Arc::new(PivotAttack::new(
                StandardAttack::new("Hit and Run", 4).with_stamina(2),
            )),
        ],
        _ => vec![
            strike(),
            Arc::new(
                StandardAttack::new("Venom Spit", 2)
                    .with_type(MonType::Nature)
                    .with_stamina(1)
                    .inflicting(effects::POISON, 100, InflictTarget::OpponentMon),
            ),
            Arc::new(
                StandardAttack::new("Power Up", 0)
                    .with_class(MoveClass::SelfTarget)
                    .with_stamina(1)
                    .inflicting(effects::FOCUS, 100, InflictTarget::User),
            ),
            Arc::new(
                StandardAttack::new("Mirror Shell", 0)
                    .with_class(MoveClass::SelfTarget)
                    .with_stamina(2)
                    .inflicting(effects::REBOUND, 100, InflictTarget::User),
            ),
        ],
    }
}

/// Three-mon team used by the demo binary.
pub fn demo_team(variant: usize) -> Team {
    let names = ["Emberfox", "Tidecrab", "Moss Golem", "Voltkit"];
    let types = [MonType::Fire, MonType::Water, MonType::Earth, MonType::Lightning];
    let mons = (0..3)
        .map(|slot| {
            let pick = (variant + slot) % names.len();
            let stats = MonStats {
                hp: 30 + 5 * pick as u32,
                speed: 2 + (pick as u32 % 3),
                attack: 3,
                defense: 2,
                special_attack: 3,
                special_defense: 2,
                ..MonStats::default()
            };
            let mon = Mon::new(names[pick], stats)
                .with_types(types[pick], MonType::None)
                .with_moves(demo_moves(variant + slot));
            if slot == 0 {
                mon.with_ability(Arc::new(Menace))
            } else {
                mon
            }
        })
        .collect();
    Team::new(mons)
}
