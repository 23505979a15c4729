//! The battle store: every live battle keyed by its `BattleKey`.

use crate::battle::ai::Behavior;
use crate::battle::commands::Side;
use crate::battle::runner::{BattleRunner, BattleSetup, BattleSnapshot, ExecutionResult};
use crate::battle::state::{BattleEvent, BattleState};
use crate::clock::{Clock, SystemClock};
use crate::errors::{BattleEngineError, BattleResult, ProtocolError, SetupError};
use crate::player::{PlayerAction, PlayerId};
use crate::protocol::commit_manager::{Phase, RevealedMove};
use crate::protocol::commitment::{BattleKey, Commitment, Salt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

type SharedRunner = Arc<Mutex<BattleRunner>>;

/// Owns every battle and the clock they are timed against. Battles are
/// independent; each one is behind its own lock.
#[derive(Debug)]
pub struct Arena {
    battles: RwLock<HashMap<BattleKey, SharedRunner>>,
    pair_nonces: Mutex<HashMap<(PlayerId, PlayerId), u64>>,
    clock: Arc<dyn Clock>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl Arena {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            battles: RwLock::new(HashMap::new()),
            pair_nonces: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// A fresh key for a pairing. Each call bumps the pair's nonce.
    pub fn next_battle_key(&self, p0: &PlayerId, p1: &PlayerId) -> BattleKey {
        // The nonce map holds plain counters, so a poisoned lock is still usable.
        let mut nonces = self
            .pair_nonces
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let nonce = nonces.entry((p0.clone(), p1.clone())).or_insert(0);
        let key = BattleKey::derive(p0, p1, *nonce);
        *nonce += 1;
        key
    }

    /// Create a battle. Returns the events raised while attaching the ruleset.
    pub fn start_battle(
        &self,
        battle_key: BattleKey,
        setup: BattleSetup,
    ) -> BattleResult<Vec<BattleEvent>> {
        let mut battles = self
            .battles
            .write()
            .map_err(|_| BattleEngineError::Poisoned(battle_key))?;
        if battles.contains_key(&battle_key) {
            return Err(SetupError::DuplicateBattle(battle_key).into());
        }
        let runner = BattleRunner::new(battle_key, setup, self.clock.now())?;
        let events = runner.events().to_vec();
        battles.insert(battle_key, Arc::new(Mutex::new(runner)));
        Ok(events)
    }

    /// Rebuild a battle from `snapshot` bytes. The setup must carry the same
    /// players and rosters the battle was started with.
    pub fn resume_battle(&self, snapshot: &[u8], setup: BattleSetup) -> BattleResult<BattleKey> {
        let snapshot = BattleSnapshot::decode(snapshot)?;
        let battle_key = snapshot.state.battle_key;
        let mut battles = self
            .battles
            .write()
            .map_err(|_| BattleEngineError::Poisoned(battle_key))?;
        if battles.contains_key(&battle_key) {
            return Err(SetupError::DuplicateBattle(battle_key).into());
        }
        let runner = BattleRunner::from_snapshot(snapshot, setup)?;
        battles.insert(battle_key, Arc::new(Mutex::new(runner)));
        Ok(battle_key)
    }

    /// Drop a battle from the store, returning its final state.
    pub fn remove_battle(&self, battle_key: BattleKey) -> BattleResult<BattleState> {
        let runner = self
            .battles
            .write()
            .map_err(|_| BattleEngineError::Poisoned(battle_key))?
            .remove(&battle_key)
            .ok_or(SetupError::UnknownBattle(battle_key))?;
        let runner = runner
            .lock()
            .map_err(|_| BattleEngineError::Poisoned(battle_key))?;
        debug!(battle = %battle_key, "battle removed");
        Ok(runner.state().clone())
    }

    pub fn battle_count(&self) -> usize {
        self.battles.read().map_or(0, |battles| battles.len())
    }

    fn runner(&self, battle_key: BattleKey) -> BattleResult<SharedRunner> {
        self.battles
            .read()
            .map_err(|_| BattleEngineError::Poisoned(battle_key))?
            .get(&battle_key)
            .cloned()
            .ok_or_else(|| SetupError::UnknownBattle(battle_key).into())
    }

    fn with_runner<T>(
        &self,
        battle_key: BattleKey,
        f: impl FnOnce(&mut BattleRunner) -> BattleResult<T>,
    ) -> BattleResult<T> {
        let runner = self.runner(battle_key)?;
        let mut runner = runner
            .lock()
            .map_err(|_| BattleEngineError::Poisoned(battle_key))?;
        f(&mut runner)
    }

    fn side_for(runner: &BattleRunner, player: &PlayerId) -> BattleResult<Side> {
        runner
            .side_of(player)
            .ok_or_else(|| ProtocolError::PlayerNotAllowed.into())
    }

    pub fn commit(
        &self,
        battle_key: BattleKey,
        player: &PlayerId,
        commitment: Commitment,
    ) -> BattleResult<()> {
        let now = self.clock.now();
        self.with_runner(battle_key, |runner| {
            let side = Self::side_for(runner, player)?;
            runner.commit(side, commitment, now)
        })
    }

    pub fn reveal(
        &self,
        battle_key: BattleKey,
        player: &PlayerId,
        move_index: u8,
        salt: Salt,
        extra_data: u64,
        auto_execute: bool,
    ) -> BattleResult<Option<ExecutionResult>> {
        let now = self.clock.now();
        self.with_runner(battle_key, |runner| {
            let side = Self::side_for(runner, player)?;
            runner.reveal(side, RevealedMove::new(move_index, salt, extra_data), auto_execute, now)
        })
    }

    pub fn execute(&self, battle_key: BattleKey) -> BattleResult<ExecutionResult> {
        let now = self.clock.now();
        self.with_runner(battle_key, |runner| runner.execute(now))
    }

    /// End a stalled battle. Returns the winner.
    pub fn end(&self, battle_key: BattleKey) -> BattleResult<PlayerId> {
        let now = self.clock.now();
        self.with_runner(battle_key, |runner| {
            let winner = runner.end(now)?;
            let winner = runner.state().players[winner.index()].clone();
            info!(battle = %battle_key, %winner, "battle ended on timeout");
            Ok(winner)
        })
    }

    pub fn state(&self, battle_key: BattleKey) -> BattleResult<BattleState> {
        self.with_runner(battle_key, |runner| Ok(runner.state().clone()))
    }

    pub fn phase(&self, battle_key: BattleKey) -> BattleResult<Phase> {
        self.with_runner(battle_key, |runner| Ok(runner.phase()))
    }

    pub fn snapshot(&self, battle_key: BattleKey) -> BattleResult<Vec<u8>> {
        self.with_runner(battle_key, |runner| Ok(runner.snapshot().encode()?))
    }

    /// Ask `behavior` what `player` should do next in this battle.
    pub fn suggest_action(
        &self,
        battle_key: BattleKey,
        player: &PlayerId,
        behavior: &dyn Behavior,
    ) -> BattleResult<PlayerAction> {
        self.with_runner(battle_key, |runner| {
            let side = Self::side_for(runner, player)?;
            Ok(behavior.decide_action(side, runner.state(), runner.env(), runner.validator()))
        })
    }
}
