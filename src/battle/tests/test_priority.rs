#[cfg(test)]
mod tests {
    use crate::battle::commands::Side;
    use crate::battle::engine::{determine_action_order, resolve_turn};
    use crate::battle::state::TurnRng;
    use crate::battle::tests::common::{
        attacker, create_battle_in_progress, create_test_env, predictable_rng, switch_to, use_move,
        TestMonBuilder,
    };
    use crate::content::moves::StandardAttack;
    use crate::mon::Mon;
    use crate::player::PlayerAction;
    use pretty_assertions::assert_eq;

    fn jabber(speed: u32, priority: i32) -> Mon {
        TestMonBuilder::new("Jabber")
            .with_speed(speed)
            .with_move(StandardAttack::new("Jab", 4).with_priority(priority))
            .build()
    }

    const MOVE: PlayerAction = PlayerAction::UseMove {
        move_index: 0,
        extra_data: 0,
    };

    #[test]
    fn test_priority_beats_speed() {
        let env = create_test_env(vec![jabber(9, 3)], vec![jabber(1, 4)]);
        let state = create_battle_in_progress(&env);
        let mut rng = predictable_rng();

        let submitted = [(Side::P0, MOVE), (Side::P1, MOVE)];
        let order = determine_action_order(&state, &env, &submitted, &mut rng);

        assert_eq!(order, vec![(Side::P1, MOVE), (Side::P0, MOVE)]);
        assert!(rng.history().is_empty());
    }

    #[test]
    fn test_switch_goes_before_a_faster_move() {
        let env = create_test_env(vec![jabber(1, 3), jabber(1, 3)], vec![jabber(9, 3)]);
        let state = create_battle_in_progress(&env);
        let switch = PlayerAction::Switch { mon_index: 1 };

        let order = determine_action_order(
            &state,
            &env,
            &[(Side::P0, switch), (Side::P1, MOVE)],
            &mut predictable_rng(),
        );

        assert_eq!(order, vec![(Side::P0, switch), (Side::P1, MOVE)]);
    }

    #[test]
    fn test_full_tie_draws_once() {
        let env = create_test_env(vec![jabber(4, 3)], vec![jabber(4, 3)]);
        let state = create_battle_in_progress(&env);
        let actions = [(Side::P0, MOVE), (Side::P1, MOVE)];

        // Odd draw: P1 first
        let mut rng = TurnRng::new_for_test(vec![7]);
        let order = determine_action_order(&state, &env, &actions, &mut rng);
        assert_eq!(order[0].0, Side::P1);
        assert_eq!(rng.history(), &[7]);

        // Even draw: P0 first
        let mut rng = TurnRng::new_for_test(vec![8]);
        let order = determine_action_order(&state, &env, &actions, &mut rng);
        assert_eq!(order[0].0, Side::P0);
    }

    #[test]
    fn test_no_op_shares_switch_priority() {
        let env = create_test_env(vec![jabber(1, 3)], vec![jabber(9, 5)]);
        let state = create_battle_in_progress(&env);

        let order = determine_action_order(
            &state,
            &env,
            &[(Side::P0, PlayerAction::NoOp), (Side::P1, MOVE)],
            &mut predictable_rng(),
        );

        assert_eq!(order[0], (Side::P0, PlayerAction::NoOp));
    }

    #[test]
    fn test_priority_seven_move_hits_the_outgoing_mon() {
        // Arrange: P1's move outranks switching
        let env = create_test_env(
            vec![attacker("Outgoing", 1, 1), attacker("Incoming", 1, 1)],
            vec![jabber(1, 7)],
        );
        let mut state = create_battle_in_progress(&env);

        // Act
        resolve_turn(&mut state, &env, [switch_to(1), use_move(0)], predictable_rng(), 0);

        // Assert
        assert_eq!(state.mon_states[0][0].hp_delta, -4);
        assert_eq!(state.mon_states[0][1].hp_delta, 0);
        assert_eq!(state.active_mon_index(Side::P0), 1);
    }
}
