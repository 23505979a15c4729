use crate::battle::commands::BattleCommand;
use crate::moves::{Ability, MoveContext};
use schema::StatKind;

/// Lowers the opposing active mon's attack by 1 on entry.
#[derive(Debug, Default)]
pub struct Menace;

impl Ability for Menace {
    fn name(&self) -> &str {
        "Menace"
    }

    fn activate_on_switch(&self, ctx: &mut MoveContext) -> Vec<BattleCommand> {
        let target = ctx.opponent();
        if ctx.state.active_is_knocked_out(target) {
            return Vec::new();
        }
        vec![BattleCommand::update_active(
            ctx.state,
            target,
            StatKind::Attack,
            -1,
        )]
    }
}
