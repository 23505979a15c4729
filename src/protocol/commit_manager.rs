use crate::battle::commands::Side;
use crate::battle::state::BattleState;
use crate::errors::ProtocolError;
use crate::player::PlayerAction;
use crate::protocol::commitment::{Commitment, Salt};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// The player who commits on a normal turn. Alternates every turn, P0 first.
pub fn committer_for(turn_id: u64) -> Side {
    if turn_id % 2 == 0 {
        Side::P0
    } else {
        Side::P1
    }
}

/// Where a battle is in the commit/reveal cycle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingFirstAction,
    AwaitingSecondAction,
    AwaitingExecution,
    GameOver,
}

/// An opened move.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealedMove {
    pub move_index: u8,
    pub salt: Salt,
    pub extra_data: u64,
}

impl RevealedMove {
    pub fn new(move_index: u8, salt: Salt, extra_data: u64) -> Self {
        Self {
            move_index,
            salt,
            extra_data,
        }
    }

    pub fn action(&self) -> PlayerAction {
        PlayerAction::from_raw(self.move_index, self.extra_data)
    }

    pub fn commitment(&self) -> Commitment {
        Commitment::new(self.move_index, &self.salt, self.extra_data)
    }
}

/// Everything submitted for one turn. Timestamps are seconds.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnCommitments {
    pub turn_id: u64,
    pub commitment: Option<Commitment>,
    pub committed_at: Option<u64>,
    pub revealed: [Option<RevealedMove>; 2],
    pub revealed_at: [Option<u64>; 2],
}

impl TurnCommitments {
    pub fn new(turn_id: u64) -> Self {
        Self {
            turn_id,
            ..Self::default()
        }
    }

    pub fn revealed(&self, side: Side) -> Option<&RevealedMove> {
        self.revealed[side.index()].as_ref()
    }
}

/// Bookkeeping for hidden-move submission.
///
/// Implementations only check ordering and hash bindings. Move legality is
/// decided by the caller-supplied `is_legal` check so the validator stays the
/// single source of truth for what a mon may do.
pub trait CommitManager: Send + Sync + fmt::Debug {
    fn commit(
        &mut self,
        state: &BattleState,
        side: Side,
        commitment: Commitment,
        now: u64,
    ) -> Result<(), ProtocolError>;

    fn reveal(
        &mut self,
        state: &BattleState,
        side: Side,
        revealed: RevealedMove,
        now: u64,
        is_legal: &dyn Fn(&PlayerAction) -> bool,
    ) -> Result<(), ProtocolError>;

    /// The revealed moves, once every required reveal for the turn is in.
    fn ready_moves(&self, state: &BattleState) -> Option<[Option<RevealedMove>; 2]>;

    fn phase(&self, state: &BattleState) -> Phase;

    fn turn(&self) -> &TurnCommitments;

    /// Forget the finished turn and start collecting for `turn_id`.
    fn start_turn(&mut self, turn_id: u64);

    /// Replace the in-progress turn, e.g. when resuming from a snapshot.
    fn restore(&mut self, turn: TurnCommitments);
}

#[derive(Debug, Clone, Default)]
pub struct DefaultCommitManager {
    turn: TurnCommitments,
}

impl DefaultCommitManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a snapshot's turn record.
    pub fn from_turn(turn: TurnCommitments) -> Self {
        Self { turn }
    }
}

impl CommitManager for DefaultCommitManager {
    fn commit(
        &mut self,
        state: &BattleState,
        side: Side,
        commitment: Commitment,
        now: u64,
    ) -> Result<(), ProtocolError> {
        if state.is_finished() {
            return Err(ProtocolError::GameAlreadyOver);
        }
        // Forced-switch turns are revealed directly.
        if state.switch_flag.is_some() || side != committer_for(state.turn_id) {
            return Err(ProtocolError::PlayerNotAllowed);
        }
        if self.turn.commitment.is_some() {
            return Err(ProtocolError::AlreadyCommitted);
        }

        debug!(
            battle = %state.battle_key,
            turn_id = state.turn_id,
            %side,
            %commitment,
            "commitment stored"
        );
        self.turn.commitment = Some(commitment);
        self.turn.committed_at = Some(now);
        Ok(())
    }

    fn reveal(
        &mut self,
        state: &BattleState,
        side: Side,
        revealed: RevealedMove,
        now: u64,
        is_legal: &dyn Fn(&PlayerAction) -> bool,
    ) -> Result<(), ProtocolError> {
        if state.is_finished() {
            return Err(ProtocolError::GameAlreadyOver);
        }
        if self.turn.revealed(side).is_some() {
            return Err(ProtocolError::AlreadyRevealed);
        }

        match state.switch_flag {
            Some(obligor) if obligor != side => return Err(ProtocolError::PlayerNotAllowed),
            Some(_) => {}
            None if side == committer_for(state.turn_id) => {
                let Some(commitment) = self.turn.commitment else {
                    return Err(ProtocolError::RevealBeforeOtherReveal);
                };
                if self.turn.revealed(side.opponent()).is_none() {
                    return Err(ProtocolError::RevealBeforeOtherReveal);
                }
                if !commitment.opens_to(revealed.move_index, &revealed.salt, revealed.extra_data) {
                    return Err(ProtocolError::WrongPreimage);
                }
            }
            None => {
                if self.turn.commitment.is_none() {
                    return Err(ProtocolError::RevealBeforeOtherCommit);
                }
            }
        }

        let action = revealed.action();
        if !is_legal(&action) {
            return Err(ProtocolError::InvalidMove(side));
        }

        debug!(
            battle = %state.battle_key,
            turn_id = state.turn_id,
            %side,
            %action,
            "move revealed"
        );
        self.turn.revealed[side.index()] = Some(revealed);
        self.turn.revealed_at[side.index()] = Some(now);
        Ok(())
    }

    fn ready_moves(&self, state: &BattleState) -> Option<[Option<RevealedMove>; 2]> {
        if state.is_finished() {
            return None;
        }
        let ready = match state.switch_flag {
            Some(obligor) => self.turn.revealed(obligor).is_some(),
            None => self.turn.revealed.iter().all(Option::is_some),
        };
        ready.then_some(self.turn.revealed)
    }

    fn phase(&self, state: &BattleState) -> Phase {
        if state.is_finished() {
            Phase::GameOver
        } else if self.ready_moves(state).is_some() {
            Phase::AwaitingExecution
        } else if self.turn.commitment.is_some() || self.turn.revealed.iter().any(Option::is_some) {
            Phase::AwaitingSecondAction
        } else {
            Phase::AwaitingFirstAction
        }
    }

    fn turn(&self) -> &TurnCommitments {
        &self.turn
    }

    fn start_turn(&mut self, turn_id: u64) {
        self.turn = TurnCommitments::new(turn_id);
    }

    fn restore(&mut self, turn: TurnCommitments) {
        self.turn = turn;
    }
}
