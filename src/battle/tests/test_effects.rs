#[cfg(test)]
mod tests {
    use crate::battle::commands::{BattleCommand, Side};
    use crate::battle::effects::{Effect, EffectContext, EffectScope, HookOutcome};
    use crate::battle::engine::{apply_ruleset, resolve_turn, BattleEnv};
    use crate::battle::state::{BattleEvent, TurnRng};
    use crate::battle::tests::common::{
        attach, attacker, create_battle_in_progress, create_test_env, predictable_rng, use_move,
        TestMonBuilder,
    };
    use crate::content::effects::{
        BRACE, FROSTBITE, FROSTBITE_ROUNDS, POISON, REBOUND, STAMINA_REGEN, ZAP,
    };
    use crate::content::moves::{InflictTarget, StandardAttack};
    use crate::content::standard_registry;
    use crate::mon::Team;
    use crate::player::PlayerAction;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use schema::MoveClass;
    use std::sync::Arc;

    const IDLE: Option<PlayerAction> = Some(PlayerAction::NoOp);

    fn p1_targeted() -> EffectScope {
        EffectScope::Targeted {
            side: Side::P1,
            mon_index: 0,
        }
    }

    #[test]
    fn test_single_instance_effect_is_not_stacked() {
        // Arrange: a move that always frostbites its target
        let chiller = TestMonBuilder::new("Chiller")
            .with_move(
                StandardAttack::new("Chill", 1).inflicting(
                    FROSTBITE,
                    100,
                    InflictTarget::OpponentMon,
                ),
            )
            .build();
        let sturdy = TestMonBuilder::new("Sturdy").with_hp(64).build();
        let env = create_test_env(vec![chiller], vec![sturdy]);
        let mut state = create_battle_in_progress(&env);

        // Act: inflict twice
        resolve_turn(&mut state, &env, [use_move(0), IDLE], predictable_rng(), 0);
        resolve_turn(&mut state, &env, [use_move(0), IDLE], predictable_rng(), 0);

        // Assert: one entry that has now seen two round ends
        let targeted = &state.mon_states[1][0].targeted_effects;
        assert_eq!(targeted.len(), 1);
        assert_eq!(targeted[0].effect, FROSTBITE);
        assert_eq!(targeted[0].data, 2);
    }

    #[test]
    fn test_frostbite_thaws_after_its_rounds() {
        let env = create_test_env(
            vec![attacker("A", 1, 1)],
            vec![TestMonBuilder::new("Sturdy").with_hp(32).build()],
        );
        let mut state = create_battle_in_progress(&env);
        attach(&mut state, p1_targeted(), FROSTBITE);

        for _ in 0..FROSTBITE_ROUNDS {
            resolve_turn(&mut state, &env, [IDLE, IDLE], predictable_rng(), 0);
        }

        assert!(!state.has_effect(p1_targeted(), FROSTBITE));
        assert_eq!(state.mon_states[1][0].hp_delta, -2 * FROSTBITE_ROUNDS as i64);
    }

    #[test]
    fn test_zap_cancels_one_move() {
        let env = create_test_env(vec![attacker("A", 1, 1)], vec![attacker("B", 1, 3)]);
        let mut state = create_battle_in_progress(&env);
        attach(&mut state, p1_targeted(), ZAP);

        // Act 1: the move is cancelled before any cost is paid
        let event_bus = resolve_turn(&mut state, &env, [IDLE, use_move(0)], predictable_rng(), 0);
        assert!(event_bus.events().contains(&BattleEvent::MoveCancelled {
            side: Side::P1,
            effect: ZAP.to_string(),
        }));
        assert_eq!(state.mon_states[0][0].hp_delta, 0);
        assert_eq!(state.mon_states[1][0].stamina_delta, 0);
        assert!(!state.has_effect(p1_targeted(), ZAP));

        // Act 2: back to normal
        resolve_turn(&mut state, &env, [IDLE, use_move(0)], predictable_rng(), 0);
        assert_eq!(state.mon_states[0][0].hp_delta, -3);
    }

    #[test]
    fn test_rebound_returns_half_the_damage() {
        let env = create_test_env(
            vec![attacker("A", 2, 6)],
            vec![TestMonBuilder::new("Shell").with_hp(20).build()],
        );
        let mut state = create_battle_in_progress(&env);
        attach(
            &mut state,
            EffectScope::Mon {
                side: Side::P1,
                mon_index: 0,
            },
            REBOUND,
        );

        resolve_turn(&mut state, &env, [use_move(0), IDLE], predictable_rng(), 0);

        assert_eq!(state.mon_states[1][0].hp_delta, -6);
        assert_eq!(state.mon_states[0][0].hp_delta, -3);
    }

    #[test]
    fn test_poison_stacks() {
        let env = create_test_env(vec![attacker("A", 1, 1)], vec![attacker("B", 1, 1)]);
        let mut state = create_battle_in_progress(&env);
        attach(&mut state, p1_targeted(), POISON);
        attach(&mut state, p1_targeted(), POISON);

        resolve_turn(&mut state, &env, [IDLE, IDLE], predictable_rng(), 0);

        assert_eq!(state.mon_states[1][0].targeted_effects.len(), 2);
        assert_eq!(state.mon_states[1][0].hp_delta, -2);
    }

    #[test]
    fn test_brace_lasts_one_turn() {
        // Arrange: a fast guard against a power 8 hit
        let guard = TestMonBuilder::new("Guard")
            .with_hp(20)
            .with_move(
                StandardAttack::new("Brace", 0)
                    .with_class(MoveClass::SelfTarget)
                    .with_priority(5)
                    .with_stamina(0)
                    .inflicting(BRACE, 100, InflictTarget::User),
            )
            .build();
        let env = create_test_env(vec![guard], vec![attacker("Hitter", 1, 8)]);
        let mut state = create_battle_in_progress(&env);

        // Act
        let event_bus = resolve_turn(
            &mut state,
            &env,
            [use_move(0), use_move(0)],
            predictable_rng(),
            0,
        );

        // Assert: 8 power into 4 defense, then the buff is gone
        assert_eq!(state.mon_states[0][0].hp_delta, -2);
        assert_eq!(state.mon_states[0][0].defense_delta, 0);
        assert!(state.mon_states[0][0].effects.is_empty());
        assert!(event_bus.events().contains(&BattleEvent::EffectRemoved {
            scope: EffectScope::Mon {
                side: Side::P0,
                mon_index: 0,
            },
            effect: BRACE.to_string(),
        }));
    }

    #[test]
    fn test_ruleset_regenerates_stamina() {
        let env = create_test_env(vec![attacker("A", 2, 1)], vec![attacker("B", 1, 1)]);
        let mut state = create_battle_in_progress(&env);
        apply_ruleset(&mut state, &env, &[STAMINA_REGEN.to_string()], predictable_rng());
        assert_eq!(state.global_effects.len(), 1);

        // Spend 1, regain 1 at round end
        resolve_turn(&mut state, &env, [use_move(0), IDLE], predictable_rng(), 0);
        assert_eq!(state.mon_states[0][0].stamina_delta, 0);

        // Never above base
        resolve_turn(&mut state, &env, [IDLE, IDLE], predictable_rng(), 0);
        assert_eq!(state.mon_states[0][0].stamina_delta, 0);
    }

    #[test]
    fn test_unknown_ruleset_effect_is_skipped() {
        let env = create_test_env(vec![attacker("A", 1, 1)], vec![attacker("B", 1, 1)]);
        let mut state = create_battle_in_progress(&env);

        let ruleset = ["NoSuchEffect".to_string()];
        let event_bus = apply_ruleset(&mut state, &env, &ruleset, predictable_rng());

        assert!(event_bus.is_empty());
        assert!(state.global_effects.is_empty());
    }

    #[rstest]
    #[case("low roll applies", 10, true)]
    #[case("roll on the threshold applies", 49, true)]
    #[case("high roll does nothing", 50, false)]
    fn test_secondary_effect_chance(
        #[case] desc: &str,
        #[case] draw: u64,
        #[case] expect_zap: bool,
    ) {
        // Arrange: 50% chance, perfect accuracy so the chance roll is the only draw
        let shocker = TestMonBuilder::new("Shocker")
            .with_speed(3)
            .with_move(StandardAttack::new("Shock", 1).inflicting(
                ZAP,
                50,
                InflictTarget::OpponentMon,
            ))
            .build();
        let env = create_test_env(vec![shocker], vec![attacker("B", 1, 1)]);
        let mut state = create_battle_in_progress(&env);

        // Act
        resolve_turn(&mut state, &env, [use_move(0), IDLE], TurnRng::new_for_test(vec![draw]), 0);

        // Assert
        assert_eq!(state.has_effect(p1_targeted(), ZAP), expect_zap, "Test case failed: {}", desc);
        assert_eq!(state.rng_history, vec![draw], "Test case failed: {}", desc);
    }

    /// Writes its own scope into the global store at round end.
    #[derive(Debug)]
    struct RoundMarker;

    const ROUND_MARKER: &str = "RoundMarker";

    impl Effect for RoundMarker {
        fn id(&self) -> &str {
            ROUND_MARKER
        }

        fn on_round_end(&self, ctx: &mut EffectContext) -> HookOutcome {
            HookOutcome::with_commands(vec![BattleCommand::SetGlobalValue {
                key: ctx.scope.to_string(),
                value: ctx.state.turn_id,
            }])
        }
    }

    #[test]
    fn test_round_end_hooks_run_global_then_player_then_mon() {
        // Arrange: a marker in every tier, attached innermost first
        let mut registry = standard_registry();
        registry.register(Arc::new(RoundMarker));
        let env = BattleEnv::new(
            [
                Team::new(vec![attacker("A", 1, 1)]),
                Team::new(vec![attacker("B", 1, 1)]),
            ],
            Arc::new(registry),
        );
        let mut state = create_battle_in_progress(&env);
        let tiers = [
            EffectScope::Global,
            EffectScope::Player(Side::P0),
            EffectScope::Player(Side::P1),
            EffectScope::Mon {
                side: Side::P0,
                mon_index: 0,
            },
            p1_targeted(),
        ];
        for scope in tiers.iter().rev() {
            attach(&mut state, *scope, ROUND_MARKER);
        }

        // Act
        let event_bus = resolve_turn(&mut state, &env, [IDLE, IDLE], predictable_rng(), 0);

        // Assert
        let fired: Vec<String> = event_bus
            .events()
            .iter()
            .filter_map(|event| match event {
                BattleEvent::GlobalValueSet { key, .. } => Some(key.clone()),
                _ => None,
            })
            .collect();
        let expected: Vec<String> = tiers.iter().map(|scope| scope.to_string()).collect();
        assert_eq!(fired, expected);
    }
}
