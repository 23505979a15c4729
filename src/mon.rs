use crate::moves::{Ability, MoveSet};
use schema::{MonStats, MonType};
use std::sync::Arc;

/// One immutable roster entry.
#[derive(Debug, Clone)]
pub struct Mon {
    pub name: String,
    pub stats: MonStats,
    pub types: (MonType, MonType),
    pub moves: Vec<Arc<dyn MoveSet>>,
    pub ability: Option<Arc<dyn Ability>>,
}

impl Mon {
    pub fn new(name: impl Into<String>, stats: MonStats) -> Self {
        Self {
            name: name.into(),
            stats,
            types: (MonType::None, MonType::None),
            moves: Vec::new(),
            ability: None,
        }
    }

    pub fn with_types(mut self, primary: MonType, secondary: MonType) -> Self {
        self.types = (primary, secondary);
        self
    }

    pub fn with_move(mut self, move_set: Arc<dyn MoveSet>) -> Self {
        self.moves.push(move_set);
        self
    }

    pub fn with_moves(mut self, moves: Vec<Arc<dyn MoveSet>>) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_ability(mut self, ability: Arc<dyn Ability>) -> Self {
        self.ability = Some(ability);
        self
    }

    pub fn move_at(&self, move_index: usize) -> Option<&Arc<dyn MoveSet>> {
        self.moves.get(move_index)
    }
}

/// A side's roster, indexed by slot.
#[derive(Debug, Clone, Default)]
pub struct Team {
    pub mons: Vec<Mon>,
}

impl Team {
    pub fn new(mons: Vec<Mon>) -> Self {
        Self { mons }
    }

    pub fn len(&self) -> usize {
        self.mons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mons.is_empty()
    }

    pub fn get(&self, mon_index: usize) -> Option<&Mon> {
        self.mons.get(mon_index)
    }

    pub fn base_stats(&self) -> Vec<MonStats> {
        self.mons.iter().map(|mon| mon.stats).collect()
    }
}
