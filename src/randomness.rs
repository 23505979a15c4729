//! Shared randomness for turn resolution.
//!
//! The oracle is a pure function: the same salts give the same seed and the
//! same seed gives the same stream, so every participant can replay a turn
//! from the revealed moves and `BattleState::rng_history`.

use crate::protocol::commitment::{BattleKey, Salt};
use sha2::{Digest, Sha256};
use std::fmt;

pub trait RandomnessOracle: Send + Sync + fmt::Debug {
    /// Seed for a turn, mixed from the salts revealed that turn.
    fn turn_seed(&self, battle_key: &BattleKey, turn_id: u64, salts: &[Salt]) -> u64;

    /// Next value of the stream.
    fn next(&self, previous: u64) -> u64;

    /// Single value used while setting a battle up.
    fn initial_seed(&self, battle_key: &BattleKey) -> u64 {
        self.turn_seed(battle_key, 0, &[])
    }
}

/// SHA-256 based oracle. Holds no state, so one instance can serve any
/// number of battles at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashOracle;

impl HashOracle {
    fn first_word(digest: &[u8]) -> u64 {
        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(word)
    }
}

impl RandomnessOracle for HashOracle {
    fn turn_seed(&self, battle_key: &BattleKey, turn_id: u64, salts: &[Salt]) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(b"mon-arena/turn-seed/v1");
        hasher.update(battle_key.as_bytes());
        hasher.update(turn_id.to_be_bytes());
        for salt in salts {
            hasher.update(salt);
        }
        Self::first_word(&hasher.finalize())
    }

    fn next(&self, previous: u64) -> u64 {
        let digest = Sha256::digest(previous.to_be_bytes());
        Self::first_word(&digest)
    }
}
