#[cfg(test)]
mod tests {
    use crate::battle::commands::Side;
    use crate::battle::effects::EffectScope;
    use crate::battle::engine::resolve_turn;
    use crate::battle::state::{ActionFailureReason, BattleEvent, GameState};
    use crate::battle::tests::common::{
        attach, attacker, create_battle_in_progress, create_test_env, predictable_rng, switch_to,
        use_move,
    };
    use crate::content::effects::POISON;
    use crate::player::PlayerAction;
    use pretty_assertions::assert_eq;

    const IDLE: Option<PlayerAction> = Some(PlayerAction::NoOp);

    #[test]
    fn test_knockout_raises_the_switch_flag() {
        // Arrange
        let env = create_test_env(
            vec![attacker("Striker", 2, 10)],
            vec![attacker("Fragile", 1, 10), attacker("Backup", 1, 10)],
        );
        let mut state = create_battle_in_progress(&env);

        // Act
        let event_bus = resolve_turn(
            &mut state,
            &env,
            [use_move(0), use_move(0)],
            predictable_rng(),
            0,
        );

        // Assert
        assert!(state.mon_states[1][0].is_knocked_out);
        assert_eq!(state.switch_flag, Some(Side::P1));
        assert_eq!(state.game_state, GameState::WaitingForReplacement(Side::P1));
        assert!(event_bus.events().contains(&BattleEvent::ActionFailed {
            side: Side::P1,
            reason: ActionFailureReason::ActorKnockedOut,
        }));
        assert!(event_bus.events().contains(&BattleEvent::MonKnockedOut {
            side: Side::P1,
            mon_index: 0,
        }));
    }

    #[test]
    fn test_forced_switch_turn_is_one_sided() {
        let env = create_test_env(
            vec![attacker("Striker", 2, 10)],
            vec![attacker("Fragile", 1, 10), attacker("Backup", 1, 10)],
        );
        let mut state = create_battle_in_progress(&env);
        resolve_turn(&mut state, &env, [use_move(0), use_move(0)], predictable_rng(), 0);
        let stamina_after_attack = state.mon_states[0][0].stamina_delta;

        // P0's action is ignored on a forced-switch turn
        let event_bus = resolve_turn(
            &mut state,
            &env,
            [use_move(0), switch_to(1)],
            predictable_rng(),
            10,
        );

        assert_eq!(state.active_mon_index(Side::P1), 1);
        assert_eq!(state.switch_flag, None);
        assert_eq!(state.game_state, GameState::WaitingForActions);
        assert_eq!(state.turn_id, 3);
        assert_eq!(state.mon_states[0][0].stamina_delta, stamina_after_attack);
        assert_eq!(state.mon_states[1][1].hp_delta, 0);
        let p0_moved = event_bus
            .events()
            .iter()
            .any(|e| matches!(e, BattleEvent::MoveUsed { side: Side::P0, .. }));
        assert!(!p0_moved);
    }

    #[test]
    fn test_dual_knockout_leaves_flag_clear() {
        // Arrange: both actives on 1 hp with poison ticking
        let env = create_test_env(
            vec![attacker("A", 1, 1), attacker("A2", 1, 1)],
            vec![attacker("B", 1, 1), attacker("B2", 1, 1)],
        );
        let mut state = create_battle_in_progress(&env);
        for side in Side::BOTH {
            state.mon_states[side.index()][0].hp_delta = -9;
            attach(&mut state, EffectScope::Targeted { side, mon_index: 0 }, POISON);
        }

        // Act
        resolve_turn(&mut state, &env, [IDLE, IDLE], predictable_rng(), 0);

        // Assert: nobody is singled out, both must switch next turn
        assert!(state.active_is_knocked_out(Side::P0));
        assert!(state.active_is_knocked_out(Side::P1));
        assert_eq!(state.switch_flag, None);
        assert_eq!(state.game_state, GameState::WaitingForActions);
    }

    #[test]
    fn test_simultaneous_elimination_goes_against_first_to_fall() {
        let env = create_test_env(vec![attacker("A", 1, 1)], vec![attacker("B", 1, 1)]);
        let mut state = create_battle_in_progress(&env);
        for side in Side::BOTH {
            state.mon_states[side.index()][0].hp_delta = -9;
            attach(&mut state, EffectScope::Targeted { side, mon_index: 0 }, POISON);
        }

        let event_bus = resolve_turn(&mut state, &env, [IDLE, IDLE], predictable_rng(), 0);

        // P0's poison ticks first, so P0's last mon fell first
        assert_eq!(state.winner(), Some(Side::P1));
        assert!(event_bus
            .events()
            .contains(&BattleEvent::PlayerDefeated { side: Side::P0 }));
    }

    #[test]
    fn test_attack_into_fallen_target_fails_without_cost() {
        // Arrange: P1's active is already down
        let env = create_test_env(
            vec![attacker("A", 1, 5)],
            vec![attacker("B", 1, 5), attacker("B2", 1, 5)],
        );
        let mut state = create_battle_in_progress(&env);
        state.mon_states[1][0].is_knocked_out = true;
        state.mon_states[1][0].hp_delta = -10;

        // Act
        let event_bus = resolve_turn(&mut state, &env, [use_move(0), IDLE], predictable_rng(), 0);

        // Assert
        assert_eq!(state.mon_states[0][0].stamina_delta, 0);
        assert!(event_bus.events().contains(&BattleEvent::ActionFailed {
            side: Side::P0,
            reason: ActionFailureReason::TargetKnockedOut,
        }));
        assert_eq!(state.switch_flag, Some(Side::P1));
    }

    #[test]
    fn test_move_knockout_decides_before_round_end_damage() {
        // Arrange: P0 would fall to poison at round end, but strikes first
        let env = create_test_env(vec![attacker("Striker", 5, 10)], vec![attacker("Last", 1, 1)]);
        let mut state = create_battle_in_progress(&env);
        state.mon_states[0][0].hp_delta = -9;
        attach(
            &mut state,
            EffectScope::Targeted {
                side: Side::P0,
                mon_index: 0,
            },
            POISON,
        );

        // Act
        let event_bus = resolve_turn(&mut state, &env, [use_move(0), IDLE], predictable_rng(), 0);

        // Assert: the battle ended on the move, round-end poison never ticked
        assert_eq!(state.winner(), Some(Side::P0));
        assert!(state.mon_states[1][0].is_knocked_out);
        assert!(!state.mon_states[0][0].is_knocked_out);
        assert_eq!(state.mon_states[0][0].hp_delta, -9);
        assert!(event_bus
            .events()
            .contains(&BattleEvent::PlayerDefeated { side: Side::P1 }));
    }
}
