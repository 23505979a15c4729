//! Demo: a handful of bot-vs-bot battles played through the full
//! commit/reveal protocol, then a JSON summary on stdout.

use mon_arena::battle::ai::ScoringAI;
use mon_arena::battle::commands::Side;
use mon_arena::config::{ArenaConfig, DEFAULT_CONFIG_PATH};
use mon_arena::content::{demo_team, standard_registry};
use mon_arena::errors::{BattleResult, ProtocolError};
use mon_arena::observers::WinTally;
use mon_arena::protocol::{committer_for, BattleKey, Commitment};
use mon_arena::validator::DefaultValidator;
use mon_arena::{Arena, BattleSetup, PlayerId};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const MAX_TURNS: u64 = 200;
const ROSTER: [&str; 4] = ["red", "blue", "green", "gold"];

#[derive(Debug, Serialize)]
struct BattleSummary {
    battle: String,
    players: [String; 2],
    winner: Option<String>,
    turns: u64,
    rng_draws: usize,
}

fn load_config() -> Result<ArenaConfig, mon_arena::errors::ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => ArenaConfig::load(Path::new(&path)),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            ArenaConfig::load(Path::new(DEFAULT_CONFIG_PATH))
        }
        None => Ok(ArenaConfig::default()),
    }
}

/// Submit one player's action for the current turn.
fn submit(
    arena: &Arena,
    battle_key: BattleKey,
    player: &PlayerId,
    side: Side,
    bot: &ScoringAI,
    commit_only: bool,
) -> BattleResult<Option<(u8, [u8; 32], u64)>> {
    let action = arena.suggest_action(battle_key, player, bot)?;
    let (move_index, extra_data) = action.to_raw().ok_or(ProtocolError::InvalidMove(side))?;
    let salt: [u8; 32] = rand::random();

    if commit_only {
        arena.commit(battle_key, player, Commitment::new(move_index, &salt, extra_data))?;
        return Ok(Some((move_index, salt, extra_data)));
    }
    arena.reveal(battle_key, player, move_index, salt, extra_data, true)?;
    Ok(None)
}

fn play_battle(
    arena: &Arena,
    battle_key: BattleKey,
    players: &[PlayerId; 2],
) -> BattleResult<BattleSummary> {
    let bot = ScoringAI::new();

    loop {
        let state = arena.state(battle_key)?;
        if state.is_finished() || state.turn_id >= MAX_TURNS {
            if !state.is_finished() {
                warn!(battle = %battle_key, "turn limit reached without a winner");
            }
            return Ok(BattleSummary {
                battle: battle_key.to_hex(),
                players: players.clone().map(|player| player.to_string()),
                winner: state.winner().map(|side| players[side.index()].to_string()),
                turns: state.turn_id,
                rng_draws: state.rng_history.len(),
            });
        }

        if let Some(obligor) = state.switch_flag {
            submit(arena, battle_key, &players[obligor.index()], obligor, &bot, false)?;
            continue;
        }

        let committer = committer_for(state.turn_id);
        let other = committer.opponent();
        let committer_id = &players[committer.index()];
        let committed = submit(arena, battle_key, committer_id, committer, &bot, true)?;
        submit(arena, battle_key, &players[other.index()], other, &bot, false)?;
        if let Some((move_index, salt, extra_data)) = committed {
            arena.reveal(battle_key, committer_id, move_index, salt, extra_data, true)?;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let arena = Arc::new(Arena::default());
    let registry = Arc::new(standard_registry());
    let validator = Arc::new(DefaultValidator::new(config.validator));
    let tally = Arc::new(WinTally::new());

    info!(battles = config.battles, ruleset = ?config.ruleset, "starting arena");

    let mut handles = Vec::with_capacity(config.battles);
    for round in 0..config.battles {
        let players = [
            PlayerId::new(ROSTER[round % ROSTER.len()]),
            PlayerId::new(ROSTER[(round + 1) % ROSTER.len()]),
        ];
        let setup = BattleSetup::new(
            players.clone(),
            [demo_team(round), demo_team(round + 1)],
            Arc::clone(&registry),
        )
        .with_validator(validator.clone())
        .with_ruleset(config.ruleset.clone())
        .with_observer(tally.clone());

        let battle_key = arena.next_battle_key(&players[0], &players[1]);
        arena.start_battle(battle_key, setup)?;

        let arena = Arc::clone(&arena);
        handles.push(tokio::task::spawn_blocking(move || {
            play_battle(&arena, battle_key, &players)
        }));
    }

    let mut summaries = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await? {
            Ok(summary) => summaries.push(summary),
            Err(err) => error!(%err, "battle aborted"),
        }
    }

    let report = serde_json::json!({
        "battles": summaries,
        "records": tally.snapshot(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
