//! Commit/reveal protocol: who may commit or reveal when, and what has been
//! submitted for the current turn.

pub mod commit_manager;
pub mod commitment;

pub use commit_manager::{
    committer_for, CommitManager, DefaultCommitManager, Phase, RevealedMove, TurnCommitments,
};
pub use commitment::{BattleKey, Commitment, Salt};
