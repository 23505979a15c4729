//! Hash commitments for hidden moves, and battle key derivation.

use crate::player::PlayerId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Random bytes a player mixes into their commitment. Revealed salts also
/// seed the turn's randomness.
pub type Salt = [u8; 32];

const COMMITMENT_DOMAIN: &[u8] = b"mon-arena/commitment/v1";
const BATTLE_KEY_DOMAIN: &[u8] = b"mon-arena/battle-key/v1";

/// Identifies one battle. Derived from both players and a nonce so repeated
/// pairings get distinct keys.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BattleKey([u8; 32]);

impl BattleKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn derive(p0: &PlayerId, p1: &PlayerId, nonce: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(BATTLE_KEY_DOMAIN);
        for player in [p0, p1] {
            let id = player.as_str().as_bytes();
            hasher.update((id.len() as u64).to_be_bytes());
            hasher.update(id);
        }
        hasher.update(nonce.to_be_bytes());
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for BattleKey {
    /// First eight bytes, which is plenty to tell battles apart in logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0[..8]))
    }
}

/// `sha256(domain || move_index || salt || extra_data)`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Commitment([u8; 32]);

impl Commitment {
    pub fn new(move_index: u8, salt: &Salt, extra_data: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(COMMITMENT_DOMAIN);
        hasher.update([move_index]);
        hasher.update(salt);
        hasher.update(extra_data.to_be_bytes());
        Self(hasher.finalize().into())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// True iff the opening hashes to this commitment.
    pub fn opens_to(&self, move_index: u8, salt: &Salt, extra_data: u64) -> bool {
        Self::new(move_index, salt, extra_data) == *self
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
