//! Read-only battle observers.
//!
//! Observers are told about switches and the end of a battle. They only ever
//! see `&BattleState`, so they can keep their own books but never change the
//! outcome.

use crate::battle::commands::Side;
use crate::battle::state::BattleState;
use crate::player::PlayerId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use tracing::warn;

pub trait BattleObserver: Send + Sync + fmt::Debug {
    fn on_switch_in(&self, _state: &BattleState, _side: Side, _mon_index: usize) {}

    fn on_switch_out(&self, _state: &BattleState, _side: Side, _mon_index: usize) {}

    fn on_game_end(&self, _state: &BattleState, _winner: Side) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
}

/// Win/loss counts per player across every battle it observes.
#[derive(Debug, Default)]
pub struct WinTally {
    records: Mutex<BTreeMap<PlayerId, Record>>,
}

impl WinTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, player: &PlayerId) -> Record {
        match self.records.lock() {
            Ok(records) => records.get(player).copied().unwrap_or_default(),
            Err(poisoned) => poisoned.into_inner().get(player).copied().unwrap_or_default(),
        }
    }

    pub fn snapshot(&self) -> BTreeMap<PlayerId, Record> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl BattleObserver for WinTally {
    fn on_game_end(&self, state: &BattleState, winner: Side) {
        let mut records = match self.records.lock() {
            Ok(records) => records,
            Err(poisoned) => {
                warn!("win tally lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        records
            .entry(state.players[winner.index()].clone())
            .or_default()
            .wins += 1;
        records
            .entry(state.players[winner.opponent().index()].clone())
            .or_default()
            .losses += 1;
    }
}

/// Counts switch-ins per side. Handy for checking hook ordering in tests.
#[derive(Debug, Default)]
pub struct SwitchCounter {
    counts: Mutex<[u32; 2]>,
}

impl SwitchCounter {
    pub fn counts(&self) -> [u32; 2] {
        match self.counts.lock() {
            Ok(counts) => *counts,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl BattleObserver for SwitchCounter {
    fn on_switch_in(&self, _state: &BattleState, side: Side, _mon_index: usize) {
        if let Ok(mut counts) = self.counts.lock() {
            counts[side.index()] += 1;
        }
    }
}
