#[cfg(test)]
mod tests {
    use crate::battle::commands::Side;
    use crate::battle::tests::common::{
        attacker, create_battle_in_progress, create_test_env, create_test_state, TestMonBuilder,
    };
    use crate::content::moves::{PivotAttack, StandardAttack};
    use crate::errors::SetupError;
    use crate::mon::Team;
    use crate::player::PlayerAction;
    use crate::protocol::commit_manager::{RevealedMove, TurnCommitments};
    use crate::protocol::commitment::Commitment;
    use crate::validator::{legal_actions, DefaultValidator, Validator, ValidatorConfig};
    use pretty_assertions::assert_eq;
    use schema::SWITCH_MOVE_INDEX;

    fn validator() -> DefaultValidator {
        DefaultValidator::new(ValidatorConfig {
            mons_per_team: 2,
            ..ValidatorConfig::default()
        })
    }

    fn pair() -> Vec<crate::mon::Mon> {
        vec![attacker("A", 1, 1), attacker("B", 1, 1)]
    }

    #[test]
    fn test_team_limits() {
        let validator = validator();

        assert_eq!(validator.validate_team(Side::P0, &Team::new(pair())), Ok(()));
        assert_eq!(
            validator.validate_team(Side::P1, &Team::new(vec![attacker("A", 1, 1)])),
            Err(SetupError::TeamSize {
                side: Side::P1,
                expected: 2,
                actual: 1,
            })
        );

        let mut crowded = TestMonBuilder::new("Crowded");
        for power in 0..5 {
            crowded = crowded.with_move(StandardAttack::new("Poke", power));
        }
        assert_eq!(
            validator.validate_team(
                Side::P0,
                &Team::new(vec![attacker("A", 1, 1), crowded.build()])
            ),
            Err(SetupError::TooManyMoves {
                side: Side::P0,
                mon_index: 1,
                actual: 5,
                max: 4,
            })
        );
    }

    #[test]
    fn test_lead_selection_is_switch_only() {
        let env = create_test_env(pair(), pair());
        let state = create_test_state(&env);

        let actions = legal_actions(&validator(), &state, &env.teams, Side::P0);

        assert_eq!(
            actions,
            vec![
                PlayerAction::Switch { mon_index: 0 },
                PlayerAction::Switch { mon_index: 1 },
            ]
        );
    }

    #[test]
    fn test_normal_turn_actions() {
        let env = create_test_env(pair(), pair());
        let state = create_battle_in_progress(&env);
        let validator = validator();

        assert!(!validator.validate_action(
            &state,
            &env.teams,
            Side::P0,
            &PlayerAction::Switch { mon_index: 0 }
        ));
        assert!(!validator.validate_action(
            &state,
            &env.teams,
            Side::P0,
            &PlayerAction::UseMove {
                move_index: 3,
                extra_data: 0
            }
        ));
        assert_eq!(
            legal_actions(&validator, &state, &env.teams, Side::P0),
            vec![
                PlayerAction::Switch { mon_index: 1 },
                PlayerAction::UseMove {
                    move_index: 0,
                    extra_data: 0
                },
                PlayerAction::NoOp,
            ]
        );
    }

    #[test]
    fn test_stamina_gates_moves() {
        let tired = TestMonBuilder::new("Tired")
            .with_move(StandardAttack::new("Heavy", 5).with_stamina(3))
            .build();
        let env = create_test_env(vec![tired, attacker("B", 1, 1)], pair());
        let mut state = create_battle_in_progress(&env);
        let heavy = PlayerAction::UseMove {
            move_index: 0,
            extra_data: 0,
        };

        assert!(validator().validate_action(&state, &env.teams, Side::P0, &heavy));
        state.mon_states[0][0].stamina_delta = -3;
        assert!(!validator().validate_action(&state, &env.teams, Side::P0, &heavy));
    }

    #[test]
    fn test_pivot_needs_a_living_bench_target() {
        let pivot = TestMonBuilder::new("Pivot")
            .with_move(PivotAttack::new(StandardAttack::new("Hit and Run", 2)))
            .build();
        let env = create_test_env(vec![pivot, attacker("B", 1, 1)], pair());
        let mut state = create_battle_in_progress(&env);
        let pivot_to = |slot: u64| PlayerAction::UseMove {
            move_index: 0,
            extra_data: slot,
        };
        let validator = validator();

        assert!(!validator.validate_action(&state, &env.teams, Side::P0, &pivot_to(0)));
        assert!(validator.validate_action(&state, &env.teams, Side::P0, &pivot_to(1)));
        state.mon_states[0][1].is_knocked_out = true;
        assert!(!validator.validate_action(&state, &env.teams, Side::P0, &pivot_to(1)));
    }

    #[test]
    fn test_knocked_out_active_must_switch() {
        let env = create_test_env(pair(), pair());
        let mut state = create_battle_in_progress(&env);
        state.mon_states[0][0].is_knocked_out = true;
        state.mon_states[1][0].is_knocked_out = true;

        for side in [Side::P0, Side::P1] {
            assert_eq!(
                legal_actions(&validator(), &state, &env.teams, side),
                vec![PlayerAction::Switch { mon_index: 1 }]
            );
        }
    }

    #[test]
    fn test_timeout_windows() {
        let env = create_test_env(pair(), pair());
        let mut state = create_battle_in_progress(&env);
        state.last_turn_timestamp = 100;
        let validator = validator(); // 30s, multiplier 2
        let mut turn = TurnCommitments::new(1);

        // No commitment: the committer (P1 on odd turns) gets T
        assert_eq!(validator.validate_timeout(&state, &turn, 129), None);
        assert_eq!(validator.validate_timeout(&state, &turn, 130), Some(Side::P1));

        // Committed: the other player has T from the commitment
        turn.commitment = Some(Commitment::new(0, &[1; 32], 0));
        turn.committed_at = Some(110);
        assert_eq!(validator.validate_timeout(&state, &turn, 139), None);
        assert_eq!(validator.validate_timeout(&state, &turn, 140), Some(Side::P0));

        // Other player revealed: the committer has T to open
        turn.revealed_at[Side::P0.index()] = Some(120);
        assert_eq!(validator.validate_timeout(&state, &turn, 150), Some(Side::P1));

        // Everything in: nobody is stalling
        turn.revealed_at[Side::P1.index()] = Some(121);
        assert_eq!(validator.validate_timeout(&state, &turn, 10_000), None);
    }

    #[test]
    fn test_forced_switch_timeout() {
        let env = create_test_env(pair(), pair());
        let mut state = create_battle_in_progress(&env);
        state.last_turn_timestamp = 100;
        state.switch_flag = Some(Side::P0);
        let turn = TurnCommitments::new(1);

        // The obligor gets T * M, not just T
        assert_eq!(validator().validate_timeout(&state, &turn, 130), None);
        assert_eq!(validator().validate_timeout(&state, &turn, 159), None);
        assert_eq!(validator().validate_timeout(&state, &turn, 160), Some(Side::P0));

        // A replacement that is in on time clears the obligation
        let mut turn = turn;
        turn.revealed[Side::P0.index()] = Some(RevealedMove::new(SWITCH_MOVE_INDEX, [3; 32], 1));
        assert_eq!(validator().validate_timeout(&state, &turn, 10_000), None);
    }
}
