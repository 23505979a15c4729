use schema::{NO_OP_MOVE_INDEX, SWITCH_MOVE_INDEX};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a participant. Two battles between the same pair of
/// players are told apart by the arena's per-pair nonce, not by this id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    // The index refers to the move's position in the active mon's move list.
    // `extra_data` is passed through to the move untouched.
    UseMove { move_index: usize, extra_data: u64 },

    // The index refers to the mon's roster slot.
    Switch { mon_index: usize },

    NoOp,
}

impl PlayerAction {
    /// Decodes the `(move_index, extra_data)` pair a player commits to.
    pub fn from_raw(move_index: u8, extra_data: u64) -> Self {
        match move_index {
            SWITCH_MOVE_INDEX => PlayerAction::Switch {
                // Out of range targets are rejected by the validator.
                mon_index: usize::try_from(extra_data).unwrap_or(usize::MAX),
            },
            NO_OP_MOVE_INDEX => PlayerAction::NoOp,
            index => PlayerAction::UseMove {
                move_index: index as usize,
                extra_data,
            },
        }
    }

    /// Encodes the action back into the committed `(move_index, extra_data)` pair.
    /// Returns None for move indices that do not fit the wire format.
    pub fn to_raw(self) -> Option<(u8, u64)> {
        match self {
            PlayerAction::UseMove {
                move_index,
                extra_data,
            } => {
                let index = u8::try_from(move_index).ok()?;
                if index == SWITCH_MOVE_INDEX || index == NO_OP_MOVE_INDEX {
                    return None;
                }
                Some((index, extra_data))
            }
            PlayerAction::Switch { mon_index } => {
                Some((SWITCH_MOVE_INDEX, u64::try_from(mon_index).ok()?))
            }
            PlayerAction::NoOp => Some((NO_OP_MOVE_INDEX, 0)),
        }
    }

    pub fn is_switch(&self) -> bool {
        matches!(self, PlayerAction::Switch { .. })
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerAction::UseMove {
                move_index,
                extra_data,
            } => {
                if *extra_data == 0 {
                    write!(f, "Use move {}", move_index)
                } else {
                    write!(f, "Use move {} ({})", move_index, extra_data)
                }
            }
            PlayerAction::Switch { mon_index } => write!(f, "Switch to mon {}", mon_index),
            PlayerAction::NoOp => write!(f, "Do nothing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reserved_indices_decode_to_switch_and_no_op() {
        assert_eq!(
            PlayerAction::from_raw(SWITCH_MOVE_INDEX, 2),
            PlayerAction::Switch { mon_index: 2 }
        );
        assert_eq!(PlayerAction::from_raw(NO_OP_MOVE_INDEX, 99), PlayerAction::NoOp);
        assert_eq!(
            PlayerAction::from_raw(1, 7),
            PlayerAction::UseMove {
                move_index: 1,
                extra_data: 7
            }
        );
    }

    #[test]
    fn test_move_index_colliding_with_sentinel_has_no_raw_form() {
        let action = PlayerAction::UseMove {
            move_index: SWITCH_MOVE_INDEX as usize,
            extra_data: 0,
        };
        assert_eq!(action.to_raw(), None);
        assert_eq!(
            PlayerAction::Switch { mon_index: 1 }.to_raw(),
            Some((SWITCH_MOVE_INDEX, 1))
        );
    }
}
