//! Headless симуляция CodeAlpha
//!
//! Гоняет одного героя через несколько жизней: seeded урон каждый тик,
//! смерть → анимация → respawn на новом pawn'е.
//!
//! Аргументы: `[path/to/character.ron] [seed]`

use bevy::prelude::*;
use rand::Rng;

use codealpha_simulation::{
    create_headless_app, log, log_error, log_info, log_warning, spawn_character, spawn_pawn,
    AttributeSet, CharacterConfig, CharacterDied, CharacterInitialized, DamageRequest,
    DeterministicRng, Lifecycle, NetworkId, Possessed, PossessionSource, ReplicationOutbox,
    SimulationConfig, SimulationPlugin,
};

const DEFAULT_CHARACTER: &str = "assets/characters/hero.ron";
const TICKS: u32 = 3000;
/// Тиков между смертью и новым possession
const RESPAWN_DELAY: u32 = 120;

fn main() {
    let mut args = std::env::args().skip(1);
    let character_path = args.next().unwrap_or_else(|| DEFAULT_CHARACTER.to_string());
    let seed = args
        .next()
        .and_then(|value| value.parse().ok())
        .unwrap_or(SimulationConfig::default().seed);

    let config = match CharacterConfig::load(&character_path) {
        Ok(config) => config,
        Err(err) => {
            log_warning(&format!("{}, falling back to built-in hero", err));
            let built_in = include_str!("../assets/characters/hero.ron");
            match CharacterConfig::from_ron(built_in, "built-in hero") {
                Ok(config) => config,
                Err(err) => {
                    log_error(&err.to_string());
                    std::process::exit(1);
                }
            }
        }
    };

    log_info(&format!(
        "Starting CodeAlpha headless simulation (character: {}, seed: {})",
        config.name, seed
    ));

    let sim_config = SimulationConfig {
        seed,
        ..SimulationConfig::default()
    };

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin::server().with_config(sim_config.clone()));

    let character = {
        let world = app.world_mut();
        let character = spawn_character(&mut world.commands(), config, NetworkId(1));
        world.flush();
        character
    };
    possess(&mut app, &sim_config, character);

    let mut deaths = 0;
    let mut lives = 0;
    let mut dead_since: Option<u32> = None;
    let mut frames_sent = 0;

    for tick in 0..TICKS {
        let alive = app
            .world()
            .get::<Lifecycle>(character)
            .is_some_and(|lifecycle| lifecycle.is_alive());

        if alive {
            let amount = app
                .world_mut()
                .resource_mut::<DeterministicRng>()
                .rng
                .gen_range(0.0..4.0);
            app.world_mut().send_event(DamageRequest {
                target: character,
                source: None,
                amount,
            });
        }

        if let Some(since) = dead_since {
            let dead = app
                .world()
                .get::<Lifecycle>(character)
                .is_some_and(|lifecycle| lifecycle.pawn().is_none());
            if dead && tick - since >= RESPAWN_DELAY {
                possess(&mut app, &sim_config, character);
                dead_since = None;
            }
        }

        app.update();

        lives += drain_events::<CharacterInitialized>(&mut app);
        let died = drain_events::<CharacterDied>(&mut app);
        if died > 0 {
            deaths += died;
            dead_since = Some(tick);
        }
        // Транспорта нет: frames просто считаем
        frames_sent += app.world_mut().resource_mut::<ReplicationOutbox>().drain().len();

        if tick % 500 == 0 {
            let health = app
                .world()
                .get::<AttributeSet>(character)
                .map(|attributes| attributes.health())
                .unwrap_or_default();
            log(&format!(
                "Tick {}: {} entities, health {:.1}",
                tick,
                app.world().entities().len(),
                health
            ));
        }
    }

    log_info(&format!(
        "Simulation complete: {} lives, {} deaths, {} replication frames",
        lives, deaths, frames_sent
    ));
}

/// Новый pawn + Possessed (Takeover)
fn possess(app: &mut App, sim_config: &SimulationConfig, character: Entity) {
    let world = app.world_mut();
    let pawn = spawn_pawn(&mut world.commands(), sim_config, character, Vec3::ZERO);
    world.flush();
    world.send_event(Possessed {
        character,
        pawn,
        source: PossessionSource::Takeover,
    });
}

fn drain_events<E: Event>(app: &mut App) -> usize {
    app.world_mut().resource_mut::<Events<E>>().drain().count()
}
