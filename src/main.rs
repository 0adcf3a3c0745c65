//! Headless autoplay.
//!
//! Plays a run of levels with random aim, submits every finished level to
//! an in-process backend, then logs the leaderboard and saves the ledger.

use bevy::{log::LogPlugin, prelude::*};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::Arc;
use uuid::Uuid;

use elemental_pop::{
    config::GameConfig,
    game::{
        BubbleEngine, EngineSystems, FireProjectile, LevelFinished,
        abilities::{AbilityKind, LineMode},
        level::LevelConfig,
        start_level,
    },
    server::{GameApi, LeaderboardQuery, MemoryStore},
};

/// Levels played before the run ends.
const LEVELS: u32 = 3;
/// Chance a shot uses an ability when one is available.
const ABILITY_CHANCE: f64 = 0.2;

fn main() -> AppExit {
    App::new()
        .add_plugins((MinimalPlugins, LogPlugin::default()))
        .add_plugins(elemental_pop::plugin)
        .insert_resource(Settings(GameConfig::load()))
        .insert_resource(Autoplay {
            rng: StdRng::seed_from_u64(7),
            level: 1,
        })
        .add_systems(Startup, (setup_backend, start_first_level))
        .add_systems(
            Update,
            (
                aim_and_fire
                    .before(EngineSystems)
                    .run_if(resource_exists::<BubbleEngine>),
                report_finished_levels.after(EngineSystems),
            ),
        )
        .run()
}

#[derive(Resource)]
struct Settings(GameConfig);

#[derive(Resource)]
struct Autoplay {
    rng: StdRng,
    level: u32,
}

#[derive(Resource)]
struct Backend {
    api: GameApi,
    store: Arc<MemoryStore>,
    player: Uuid,
}

fn setup_backend(mut commands: Commands, settings: Res<Settings>) {
    let server = &settings.0.server;
    let store = match server.ledger_path() {
        Some(path) => MemoryStore::open(&path).unwrap_or_else(|e| {
            warn!("{}, starting with an empty ledger", e);
            MemoryStore::new()
        }),
        None => MemoryStore::new(),
    };
    let store = Arc::new(store);
    let api = GameApi::new(store.clone(), server.clone());

    let player = Uuid::new_v4();
    if let Err(e) = api.ledger().register_player(player, "autoplay@elemental-pop.local") {
        error!("Failed to register autoplay player: {}", e);
    }
    commands.insert_resource(Backend { api, store, player });
}

fn start_first_level(mut commands: Commands, settings: Res<Settings>) {
    start_level(&mut commands, LevelConfig::numbered(1), settings.0.engine.clone());
}

/// One random shot per frame while the level runs.
fn aim_and_fire(
    engine: Res<BubbleEngine>,
    mut autoplay: ResMut<Autoplay>,
    mut fire: MessageWriter<FireProjectile>,
) {
    if engine.result().is_some() {
        return;
    }
    let rng = &mut autoplay.rng;
    let direction = Vec2::new(rng.random_range(-1.0..1.0), -1.0);

    let available: Vec<AbilityKind> = AbilityKind::ACTIVE
        .into_iter()
        .filter(|kind| engine.inventory().has(*kind))
        .collect();
    let ability = if !available.is_empty() && rng.random_bool(ABILITY_CHANCE) {
        available[rng.random_range(0..available.len())]
    } else {
        AbilityKind::None
    };
    let mode = if rng.random_bool(0.5) {
        LineMode::Column
    } else {
        LineMode::Row
    };

    fire.write(FireProjectile {
        direction,
        ability,
        mode,
    });
}

fn report_finished_levels(
    mut commands: Commands,
    mut finished: MessageReader<LevelFinished>,
    mut autoplay: ResMut<Autoplay>,
    backend: Res<Backend>,
    settings: Res<Settings>,
    mut exit: MessageWriter<AppExit>,
) {
    for event in finished.read() {
        match backend.api.submit_session(backend.player, &event.session) {
            Ok(response) => info!(
                "Level {} {:?}: score {}, {} stars, {} coins (session {})",
                event.session.level,
                event.result,
                event.session.score,
                event.session.stars,
                response.coins_earned,
                response.session_id
            ),
            Err(e) => error!(
                "Submitting level {} failed ({}): {}",
                event.session.level,
                e.status_code(),
                e
            ),
        }

        if autoplay.level < LEVELS {
            autoplay.level += 1;
            start_level(
                &mut commands,
                LevelConfig::numbered(autoplay.level),
                settings.0.engine.clone(),
            );
            continue;
        }

        finish_run(&backend, &settings.0);
        exit.write(AppExit::Success);
    }
}

fn finish_run(backend: &Backend, config: &GameConfig) {
    match backend.api.ledger().get_total_reward_coins(backend.player) {
        Ok(coins) => info!("Run over, {} coins earned", coins),
        Err(e) => warn!("Could not total coins: {}", e),
    }

    match backend.api.leaderboard(LeaderboardQuery::default()) {
        Ok(board) => {
            for entry in board {
                info!("#{} {} {}", entry.rank, entry.display_name, entry.total_score);
            }
        }
        Err(e) => warn!("Could not read leaderboard: {}", e),
    }

    if let Some(path) = config.server.ledger_path()
        && let Err(e) = backend.store.save(&path)
    {
        warn!("Could not save ledger: {}", e);
    }
}
