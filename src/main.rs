//! Tilestep Simulator
//!
//! Headless driver: records a scripted run of level 1, verifies it by
//! replay, then plays the same script through a full session.
//!
//! Usage: `tilestep-sim [LEVELS_DIR] [SAVE_FILE] [TICKS]`

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tilestep::{
    LEVEL_COUNT, TICK_RATE, VERSION,
    game::{
        animation::{frame_table, NoSprites},
        input::InputFrame,
        replay::{replay_run, RunRecorder, RunRecording},
        runtime::{LevelRuntime, RuntimeConfig},
    },
    level::{load_level, DirLevelSource, LevelSource, MemoryLevelSource},
    session::{Screen, Session, SessionAction, SessionConfig, Shop, ShopStore},
};

/// Default tick budget (two minutes of play)
const DEFAULT_TICKS: u32 = 120 * TICK_RATE;

/// Built-in level used when no levels directory is given.
const DEMO_LEVEL: [&str; 8] = [
    "..............................",
    "..............................",
    "...........C.C................",
    "..........#####.......C.......",
    "..P..............E.........G..",
    "######...#############..######",
    "######...#############__######",
    "######SSS#############SS######",
];

struct Args {
    levels_dir: Option<String>,
    save_file: Option<String>,
    ticks: u32,
}

impl Args {
    fn parse() -> Result<Self> {
        let mut args = std::env::args().skip(1);
        let levels_dir = args.next();
        let save_file = args.next();
        let ticks = match args.next() {
            Some(raw) => raw.parse().with_context(|| format!("invalid tick budget {raw:?}"))?,
            None => DEFAULT_TICKS,
        };
        Ok(Self { levels_dir, save_file, ticks })
    }

    fn levels(&self) -> Box<dyn LevelSource> {
        match &self.levels_dir {
            Some(dir) => Box::new(DirLevelSource::new(dir)),
            None => Box::new(MemoryLevelSource::new().with_rows(1, 32, &DEMO_LEVEL)),
        }
    }

    fn shop(&self) -> ShopStore {
        match &self.save_file {
            Some(path) => ShopStore::load(path),
            None => ShopStore::in_memory(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse()?;

    info!("Tilestep Simulator v{}", VERSION);
    info!("Tick Rate: {} Hz, tick budget: {} ({} seconds)", TICK_RATE, args.ticks, args.ticks / TICK_RATE);

    let recording = record_run(&args)?;
    verify_run(&args, &recording)?;
    play_session(&args)
}

/// Hold right and hop every 40 ticks.
fn scripted_input(tick: u32) -> InputFrame {
    let frame = InputFrame::right();
    if tick % 40 < 3 {
        frame.with_jump()
    } else {
        frame
    }
}

fn record_run(args: &Args) -> Result<RunRecording> {
    info!("=== Recording Run ===");

    let levels = args.levels();
    let level = load_level(levels.as_ref(), 1).context("loading level 1")?;
    info!(
        "Level 1: {}x{} tiles, {} coins, {} enemies",
        level.width(),
        level.height(),
        level.coins().len(),
        level.enemy_spawns().len()
    );

    let mut shop = ShopStore::in_memory();
    let frames = frame_table(&NoSprites, shop.equipped_skin());
    let mut runtime = LevelRuntime::new(level, 1, RuntimeConfig::default(), frames);
    let mut recorder = RunRecorder::new(&runtime);

    let mut total_events = 0;
    for t in 0..args.ticks {
        let result = recorder.step(&mut runtime, scripted_input(t), &mut shop);
        total_events += result.events.len();

        for event in &result.events {
            if event.is_terminal() {
                info!("Tick {}: {:?}", event.tick, event.data);
            } else {
                debug!("Tick {}: {:?}", event.tick, event.data);
            }
        }

        if t > 0 && t % 600 == 0 {
            let player = runtime.player();
            let (x, y) = player.rect.origin().to_floats();
            info!("Tick {}: player at ({:.1}, {:.1}), {} lives, {} coins", t, x, y, player.lives, player.coins);
        }

        if let Some(outcome) = result.outcome {
            info!("Level ended at tick {}: {:?}", runtime.tick_count(), outcome);
            break;
        }
    }

    let recording = recorder.finish(&runtime);
    info!("Total events: {}", total_events);
    info!("Coins banked: {}", shop.coins());
    info!("Final State Hash: {}", hex::encode(recording.final_hash));
    Ok(recording)
}

fn verify_run(args: &Args, recording: &RunRecording) -> Result<()> {
    info!("=== Verifying Determinism ===");

    let bytes = recording.to_bytes()?;
    info!(
        "Recording: {} bytes, {} input changes over {} ticks, {} checkpoints",
        bytes.len(),
        recording.inputs.deltas().len(),
        recording.tick_count(),
        recording.checkpoints.len()
    );
    let decoded = RunRecording::from_bytes(&bytes)?;

    let levels = args.levels();
    let level = load_level(levels.as_ref(), decoded.level_index)?;
    let report = replay_run(level, &decoded, RuntimeConfig::default())?;

    info!("Replay Hash: {}", hex::encode(report.final_hash));
    if !report.matches {
        bail!("replay diverged (first divergent checkpoint: {:?})", report.first_divergence);
    }
    info!("✓ Determinism verified");
    Ok(())
}

fn play_session(args: &Args) -> Result<()> {
    info!("=== Session Run ===");

    let config = SessionConfig { level_count: LEVEL_COUNT, ..SessionConfig::default() };
    // Headless: no sprite sheets, every state draws the placeholder frame
    let mut session = Session::new(config, args.levels(), Box::new(args.shop()))
        .with_sprites(Box::new(NoSprites));

    session.handle(SessionAction::OpenLevelSelect)?;
    let unlocked = session.level_select_entries().iter().filter(|e| !e.locked).count();
    info!("{} of {} levels unlocked", unlocked, LEVEL_COUNT);
    session.handle(SessionAction::PickLevel(1))?;

    let mut ticks = 0;
    while ticks < args.ticks && session.screen() == Screen::Playing {
        let tick = session.runtime().map_or(0, |rt| rt.tick_count());
        session.tick(scripted_input(tick));
        ticks += 1;
    }

    info!(
        "Session ended on {:?} after {} ticks (level {}, {} coins, max level {})",
        session.screen(),
        ticks,
        session.level_index(),
        session.shop().coins(),
        session.shop().max_unlocked_level()
    );
    Ok(())
}
