use crate::battle::commands::Side;
use crate::battle::effects::EffectRegistry;
use crate::battle::engine::{apply_ruleset, forfeit, resolve_turn, BattleEnv};
use crate::battle::state::{BattleEvent, BattleState, GameState, TurnRng};
use crate::battle::stats::{NeutralTypeChart, TypeChart};
use crate::errors::{BattleResult, ProtocolError, SetupError, SnapshotError, TimeoutError};
use crate::mon::Team;
use crate::observers::BattleObserver;
use crate::player::{PlayerAction, PlayerId};
use crate::protocol::commit_manager::{
    CommitManager, DefaultCommitManager, Phase, RevealedMove, TurnCommitments,
};
use crate::protocol::commitment::{BattleKey, Commitment, Salt};
use crate::randomness::{HashOracle, RandomnessOracle};
use crate::validator::{DefaultValidator, Validator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything needed to start (or resume) one battle.
#[derive(Debug)]
pub struct BattleSetup {
    pub players: [PlayerId; 2],
    pub teams: [Team; 2],
    pub effects: Arc<EffectRegistry>,
    pub validator: Arc<dyn Validator>,
    pub oracle: Arc<dyn RandomnessOracle>,
    pub commit_manager: Box<dyn CommitManager>,
    pub type_chart: Arc<dyn TypeChart>,
    /// Global effect ids attached when the battle starts
    pub ruleset: Vec<String>,
    pub observers: Vec<Arc<dyn BattleObserver>>,
}

impl BattleSetup {
    pub fn new(players: [PlayerId; 2], teams: [Team; 2], effects: Arc<EffectRegistry>) -> Self {
        Self {
            players,
            teams,
            effects,
            validator: Arc::new(DefaultValidator::default()),
            oracle: Arc::new(HashOracle),
            commit_manager: Box::new(DefaultCommitManager::new()),
            type_chart: Arc::new(NeutralTypeChart),
            ruleset: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn RandomnessOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_commit_manager(mut self, commit_manager: Box<dyn CommitManager>) -> Self {
        self.commit_manager = commit_manager;
        self
    }

    pub fn with_type_chart(mut self, type_chart: Arc<dyn TypeChart>) -> Self {
        self.type_chart = type_chart;
        self
    }

    pub fn with_ruleset(mut self, ruleset: Vec<String>) -> Self {
        self.ruleset = ruleset;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn BattleObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

/// Enough to pick a battle back up: the state plus the half-finished turn.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleSnapshot {
    pub state: BattleState,
    pub commitments: TurnCommitments,
}

impl BattleSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        postcard::to_allocvec(self).map_err(|err| SnapshotError::Encode(err.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(postcard::from_bytes(bytes)?)
    }
}

/// Result of executing a battle turn
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub events: Vec<BattleEvent>,
    pub new_game_state: GameState,
    pub battle_ended: bool,
    pub winner: Option<Side>,
}

impl ExecutionResult {
    pub fn new(events: Vec<BattleEvent>, new_game_state: GameState) -> Self {
        let winner = match new_game_state {
            GameState::Finished { winner } => Some(winner),
            _ => None,
        };
        Self {
            events,
            new_game_state,
            battle_ended: winner.is_some(),
            winner,
        }
    }
}

/// One battle: its state, collaborators and commit/reveal bookkeeping.
/// Every transition is sequential; callers wanting concurrency hold many
/// runners, not many threads on one runner.
#[derive(Debug)]
pub struct BattleRunner {
    state: BattleState,
    env: BattleEnv,
    validator: Arc<dyn Validator>,
    oracle: Arc<dyn RandomnessOracle>,
    commits: Box<dyn CommitManager>,
    accumulated_events: Vec<BattleEvent>,
}

impl BattleRunner {
    /// Validate the rosters, build turn 0 and attach the ruleset.
    pub fn new(battle_key: BattleKey, setup: BattleSetup, now: u64) -> Result<Self, SetupError> {
        Self::check_setup(&setup)?;
        let BattleSetup {
            players,
            teams,
            effects,
            validator,
            oracle,
            mut commit_manager,
            type_chart,
            ruleset,
            observers,
        } = setup;

        let rosters = [teams[0].base_stats(), teams[1].base_stats()];
        let mut state = BattleState::new(battle_key, players, rosters);
        state.last_turn_timestamp = now;

        let env = BattleEnv {
            teams,
            effects,
            type_chart,
            observers,
        };
        let rng = TurnRng::from_oracle(Arc::clone(&oracle), oracle.initial_seed(&battle_key));
        let bus = apply_ruleset(&mut state, &env, &ruleset, rng);
        commit_manager.start_turn(state.turn_id);

        info!(
            battle = %battle_key,
            p0 = %state.players[0],
            p1 = %state.players[1],
            "battle started"
        );
        Ok(Self {
            state,
            env,
            validator,
            oracle,
            commits: commit_manager,
            accumulated_events: bus.into_events(),
        })
    }

    /// Rebuild a runner from a snapshot and the collaborators it was started with.
    pub fn from_snapshot(snapshot: BattleSnapshot, setup: BattleSetup) -> Result<Self, SetupError> {
        Self::check_setup(&setup)?;
        let BattleSnapshot { state, commitments } = snapshot;

        let rosters_match = Side::BOTH.into_iter().all(|side| {
            let team = &setup.teams[side.index()];
            let mons = &state.mon_states[side.index()];
            team.len() == mons.len()
                && team
                    .mons
                    .iter()
                    .zip(mons.iter())
                    .all(|(mon, mon_state)| mon.stats == mon_state.base)
        });
        if state.players != setup.players || !rosters_match {
            return Err(SetupError::SnapshotMismatch);
        }

        let BattleSetup {
            teams,
            effects,
            validator,
            oracle,
            mut commit_manager,
            type_chart,
            observers,
            ..
        } = setup;
        commit_manager.restore(commitments);

        info!(battle = %state.battle_key, turn_id = state.turn_id, "battle resumed");
        Ok(Self {
            state,
            env: BattleEnv {
                teams,
                effects,
                type_chart,
                observers,
            },
            validator,
            oracle,
            commits: commit_manager,
            accumulated_events: Vec::new(),
        })
    }

    fn check_setup(setup: &BattleSetup) -> Result<(), SetupError> {
        if setup.players[0] == setup.players[1] {
            return Err(SetupError::SamePlayer);
        }
        for side in Side::BOTH {
            setup
                .validator
                .validate_team(side, &setup.teams[side.index()])?;
        }
        if let Some(unknown) = setup
            .ruleset
            .iter()
            .find(|effect| !setup.effects.contains(effect))
        {
            return Err(SetupError::UnknownEffect(unknown.clone()));
        }
        Ok(())
    }

    pub fn battle_key(&self) -> BattleKey {
        self.state.battle_key
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn env(&self) -> &BattleEnv {
        &self.env
    }

    pub fn validator(&self) -> &dyn Validator {
        self.validator.as_ref()
    }

    pub fn commitments(&self) -> &TurnCommitments {
        self.commits.turn()
    }

    pub fn phase(&self) -> Phase {
        self.commits.phase(&self.state)
    }

    pub fn side_of(&self, player: &PlayerId) -> Option<Side> {
        self.state.side_of(player)
    }

    /// Every event since the runner was created.
    pub fn events(&self) -> &[BattleEvent] {
        &self.accumulated_events
    }

    pub fn is_legal(&self, side: Side, action: &PlayerAction) -> bool {
        self.validator
            .validate_action(&self.state, &self.env.teams, side, action)
    }

    fn ensure_window_open(&self, side: Side, now: u64) -> BattleResult<()> {
        if self
            .validator
            .validate_timeout(&self.state, self.commits.turn(), now)
            == Some(side)
        {
            warn!(battle = %self.state.battle_key, %side, "action after the window expired");
            return Err(TimeoutError::WindowExpired.into());
        }
        Ok(())
    }

    pub fn commit(&mut self, side: Side, commitment: Commitment, now: u64) -> BattleResult<()> {
        self.ensure_window_open(side, now)?;
        self.commits
            .commit(&self.state, side, commitment, now)
            .inspect_err(|err| {
                warn!(battle = %self.state.battle_key, %side, %err, "commit rejected")
            })?;
        Ok(())
    }

    /// Open a move. With `auto_execute` the turn resolves as soon as the
    /// last required reveal is in.
    pub fn reveal(
        &mut self,
        side: Side,
        revealed: RevealedMove,
        auto_execute: bool,
        now: u64,
    ) -> BattleResult<Option<ExecutionResult>> {
        self.ensure_window_open(side, now)?;

        let validator = &self.validator;
        let state = &self.state;
        let teams = &self.env.teams;
        let is_legal =
            |action: &PlayerAction| validator.validate_action(state, teams, side, action);
        self.commits
            .reveal(state, side, revealed, now, &is_legal)
            .inspect_err(|err| warn!(battle = %state.battle_key, %side, %err, "reveal rejected"))?;

        if auto_execute && self.commits.ready_moves(&self.state).is_some() {
            return self.execute(now).map(Some);
        }
        Ok(None)
    }

    /// Resolve the turn from the revealed moves.
    pub fn execute(&mut self, now: u64) -> BattleResult<ExecutionResult> {
        if self.state.is_finished() {
            return Err(ProtocolError::GameAlreadyOver.into());
        }
        let Some(moves) = self.commits.ready_moves(&self.state) else {
            return Err(ProtocolError::NotReadyToExecute.into());
        };

        let battle_key = self.state.battle_key;
        let turn_id = self.state.turn_id;
        let salts: Vec<Salt> = moves.iter().flatten().map(|revealed| revealed.salt).collect();
        let seed = self.oracle.turn_seed(&battle_key, turn_id, &salts);
        let rng = TurnRng::from_oracle(Arc::clone(&self.oracle), seed);
        let actions = moves.map(|revealed| revealed.map(|revealed| revealed.action()));

        let bus = resolve_turn(&mut self.state, &self.env, actions, rng, now);
        bus.log_events_with_message(&format!("battle {} turn {}", battle_key, turn_id));
        self.commits.start_turn(self.state.turn_id);

        let events = bus.into_events();
        self.accumulated_events.extend(events.iter().cloned());
        Ok(ExecutionResult::new(events, self.state.game_state))
    }

    /// Award the battle to the opponent of whoever let their window lapse.
    /// Returns the winner.
    pub fn end(&mut self, now: u64) -> BattleResult<Side> {
        if self.state.is_finished() {
            return Err(TimeoutError::GameAlreadyOver.into());
        }
        let Some(loser) = self
            .validator
            .validate_timeout(&self.state, self.commits.turn(), now)
        else {
            return Err(TimeoutError::NotExpired.into());
        };

        let bus = forfeit(&mut self.state, &self.env, loser);
        bus.log_events();
        self.accumulated_events.extend(bus.into_events());
        Ok(loser.opponent())
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            state: self.state.clone(),
            commitments: self.commits.turn().clone(),
        }
    }
}
