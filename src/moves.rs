//! Content contracts for moves and abilities.
//!
//! Moves and abilities never mutate the battle. They read a `MoveContext` and
//! return the `BattleCommand`s the engine should apply.

use crate::battle::commands::{BattleCommand, Side};
use crate::battle::state::{BattleState, TurnRng};
use crate::battle::stats::TypeChart;
use crate::mon::{Mon, Team};
use schema::{MonType, MoveClass, DEFAULT_PRIORITY};
use std::fmt;

pub struct MoveContext<'a> {
    pub state: &'a BattleState,
    pub teams: &'a [Team; 2],
    pub type_chart: &'a dyn TypeChart,
    /// The side using the move (or owning the ability)
    pub user: Side,
    /// Passed through untouched from the revealed action
    pub extra_data: u64,
    pub rng: &'a mut TurnRng,
}

impl MoveContext<'_> {
    pub fn opponent(&self) -> Side {
        self.user.opponent()
    }

    /// Roster entry of a side's active mon.
    pub fn active_mon(&self, side: Side) -> Option<&Mon> {
        self.teams[side.index()].get(self.state.active_mon_index(side))
    }
}

/// A usable move.
pub trait MoveSet: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn priority(&self, _state: &BattleState, _user: Side) -> i32 {
        DEFAULT_PRIORITY
    }

    fn stamina_cost(&self) -> u32;

    fn move_class(&self) -> MoveClass;

    fn move_type(&self) -> MonType;

    /// Nominal power, used by bots to rank moves. Zero for non-damaging moves.
    fn base_power(&self) -> u32 {
        0
    }

    fn accuracy(&self) -> u32 {
        100
    }

    /// Move-specific legality of `extra_data`, checked when the move is revealed.
    fn is_valid_target(&self, _state: &BattleState, _user: Side, _extra_data: u64) -> bool {
        true
    }

    fn execute(&self, ctx: &mut MoveContext) -> Vec<BattleCommand>;
}

/// A passive trait of a mon, triggered whenever it switches in.
pub trait Ability: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn activate_on_switch(&self, ctx: &mut MoveContext) -> Vec<BattleCommand>;
}
