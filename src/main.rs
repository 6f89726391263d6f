use clap::Parser;
use env_logger::Env;
use itertools::Itertools;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::error::Error;
use std::io::{self, BufReader};
use std::path::PathBuf;

use spotter::annotations::{
    fetch_retrying, AnnotationPair, AnnotationSource, DirAnnotationSource, FileIdGenerator,
    StaticAnnotationSource,
};
use spotter::config::{Config, ConfigStore, Difficulty, FileConfigStore, GameMode};
use spotter::draw::{DrawCommand, Layer};
use spotter::error::RoundError;
use spotter::game::Game;
use spotter::geometry::Rect;
use spotter::levels::LevelCatalog;
use spotter::progression::{
    Achievement, AchievementStore, MemoryStore, ProgressionEvent, ProgressionStore, MAX_STARS,
};
use spotter::round::{RoundEffect, RoundMachine};
use spotter::runtime::{drive, ChannelEventSource, RoundTicker, Runner};
use spotter::session::GameSessionSummary;
use spotter::store::SqliteStore;

/// spot the region before the predictor does
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timed spotting rounds against a region predictor. Type `x y` to click, `h` for a hint and `q` to quit."
)]
pub struct Cli {
    /// game mode, overrides the saved preference
    #[clap(short = 'm', long, value_enum)]
    mode: Option<GameMode>,

    /// image difficulty, overrides the saved preference
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// directory holding <difficulty>/annotations/<id>.json files
    #[clap(short = 'a', long)]
    annotations: Option<PathBuf>,

    /// adventure level to play
    #[clap(short = 'l', long, default_value_t = 0)]
    level: u32,

    /// adventure level catalog (JSON), defaults to the built-in story
    #[clap(long)]
    levels: Option<PathBuf>,

    /// seed hints and image order for a reproducible game
    #[clap(long)]
    seed: Option<u64>,

    /// keep progress in memory only
    #[clap(long)]
    no_persist: bool,

    /// store the given mode/difficulty/annotations as the new defaults
    #[clap(long)]
    save_config: bool,

    /// print adventure level ranks and exit
    #[clap(long)]
    stars: bool,

    /// print achievements and exit
    #[clap(long)]
    achievements: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(mode) = self.mode {
            config.game_mode = mode;
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(dir) = &self.annotations {
            config.annotations_dir = Some(dir.clone());
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    cli.apply(&mut config);
    if cli.save_config {
        config_store.save(&config)?;
        log::info!("saved preferences to {}", config_store.path().display());
    }

    if cli.stars || cli.achievements {
        let store = SqliteStore::new()?;
        if cli.achievements {
            print_achievements(&store)?;
        }
        if cli.stars {
            print_stars(&store)?;
        }
        return Ok(());
    }

    let catalog = match &cli.levels {
        Some(path) => LevelCatalog::from_path(path)?,
        None => LevelCatalog::default(),
    };

    if cli.no_persist {
        play(&cli, &config, &catalog, MemoryStore::new())?;
    } else {
        let (store, summary) = play(&cli, &config, &catalog, SqliteStore::new()?)?;
        if let Err(e) = store.record_session(&summary) {
            log::warn!("could not save game: {}", e);
        }
        if let Ok(Some(best)) = store.best_score(summary.mode) {
            println!("best {} score: {}", summary.mode, best);
        }
    }

    Ok(())
}

/// Built-in rounds for when no annotation directory is configured
fn demo_pairs() -> Result<Vec<AnnotationPair>, RoundError> {
    [
        ([120.0, 140.0, 220.0, 230.0], [130.0, 150.0, 225.0, 240.0]),
        ([300.0, 60.0, 360.0, 110.0], [250.0, 40.0, 320.0, 100.0]),
        ([40.0, 330.0, 150.0, 470.0], [45.0, 320.0, 160.0, 460.0]),
        ([380.0, 380.0, 430.0, 420.0], [100.0, 100.0, 160.0, 150.0]),
    ]
    .into_iter()
    .map(|(truth, predicted)| {
        Ok(AnnotationPair {
            truth: Rect::try_from(truth)?,
            predicted: Rect::try_from(predicted)?,
        })
    })
    .collect()
}

fn play<S: AchievementStore + ProgressionStore>(
    cli: &Cli,
    config: &Config,
    catalog: &LevelCatalog,
    store: S,
) -> Result<(S, GameSessionSummary), Box<dyn Error>> {
    let mut game = match config.game_mode {
        GameMode::Adventure => Game::adventure(config, catalog, cli.level, store)?,
        GameMode::Casual | GameMode::Competitive => Game::new(config, store)?,
    };
    let round_config = game.round_config().clone();
    let difficulty = round_config.difficulty;

    let (mut machine, mut rng) = match cli.seed {
        Some(seed) => (
            RoundMachine::with_seed(round_config.clone(), seed)?,
            StdRng::seed_from_u64(seed),
        ),
        None => (RoundMachine::new(round_config.clone())?, StdRng::from_entropy()),
    };

    let mut source: Box<dyn AnnotationSource> = match &config.annotations_dir {
        Some(dir) => Box::new(DirAnnotationSource::new(dir, round_config.canvas_scale())),
        None => Box::new(StaticAnnotationSource::new(
            demo_pairs()?
                .iter()
                .map(|p| p.to_canvas_scale(round_config.canvas_scale()))
                .collect(),
        )),
    };
    let file_count = match &config.annotations_dir {
        Some(_) => config.files_per_difficulty,
        None => demo_pairs()?.len() as u32,
    };
    let mut ids = FileIdGenerator::new(file_count, Vec::new(), &mut rng);

    let events = ChannelEventSource::from_reader(BufReader::new(io::stdin()));
    let mut runner = Runner::new(events, RoundTicker);

    println!(
        "{} game on {} images ({}x{} canvas). `x y` to click, `h` for a hint, `q` to quit.",
        config.game_mode, difficulty, round_config.canvas_size, round_config.canvas_size
    );

    while !game.is_over() {
        machine.begin_loading()?;
        let Some(file_id) = ids.next_id() else {
            println!("no images left");
            break;
        };

        let pair = match fetch_retrying(source.as_mut(), file_id, difficulty, 1) {
            Ok(pair) => pair,
            Err(RoundError::LoadFailed(reason)) => {
                machine.load_failed(&reason);
                eprintln!("image {} could not be loaded: {}", file_id, reason);
                continue;
            }
            Err(e) => {
                log::warn!("skipping image {}: {}", file_id, e);
                continue;
            }
        };
        if let Err(e) = machine.start_round(pair) {
            log::warn!("skipping image {}: {}", file_id, e);
            continue;
        }

        println!("round {}: go!", game.session().round_index() + 1);
        match drive(&mut machine, &mut runner, print_effect) {
            Some(outcome) => {
                for event in game.settle_round(outcome) {
                    print_progress(&event);
                }
            }
            None => break,
        }
    }

    for event in game.end() {
        print_progress(&event);
    }

    let summary = game.summary();
    println!(
        "final score: you {} / predictor {} over {} round(s), {} correct, winner: {}",
        summary.player_score,
        summary.ai_score,
        summary.rounds,
        summary.player_correct,
        summary.winner
    );
    if let Some(ms) = summary.mean_answer_ms {
        println!("mean answer time: {:.1}s", ms / 1000.0);
    }

    Ok((game.into_store(), summary))
}

fn rect_text(rect: &Rect) -> String {
    <[f64; 4]>::from(*rect)
        .iter()
        .map(|v| format!("{v:.0}"))
        .join(", ")
}

fn print_effect(effect: &RoundEffect) {
    match effect {
        RoundEffect::PhaseChanged { .. } => {}
        RoundEffect::Draw(DrawCommand::Rectangle {
            layer: Layer::Image,
            rect,
            stroke,
        }) => println!("{} box: [{}]", stroke, rect_text(rect)),
        RoundEffect::Draw(DrawCommand::Cross { at, .. }) => {
            println!("your click: ({:.0}, {:.0})", at.x, at.y)
        }
        RoundEffect::Draw(DrawCommand::Text(text)) => println!("{}", text.key()),
        RoundEffect::Draw(_) => {}
        RoundEffect::HintShown(p) => println!("hint: look near ({:.0}, {:.0})", p.x, p.y),
        RoundEffect::Urgent => println!("hurry!"),
        RoundEffect::Thinking => println!("the predictor is searching..."),
        RoundEffect::Evaluated(outcome) => println!(
            "you +{} / predictor +{} (IoU {:.2})",
            outcome.player_round_score, outcome.ai_round_score, outcome.iou
        ),
    }
}

fn star_text(stars: u8) -> String {
    (0..MAX_STARS)
        .map(|i| if i < stars { '★' } else { '☆' })
        .collect()
}

fn print_progress(event: &ProgressionEvent) {
    match event {
        ProgressionEvent::AchievementUnlocked(a) => println!("Achievement! {}", a.message()),
        ProgressionEvent::StarsAwarded { level, stars, .. } => {
            println!("{}: {}", level, star_text(*stars))
        }
        ProgressionEvent::LevelUnlocked(level) => println!("unlocked {}", level),
        ProgressionEvent::Win { .. } => println!("you beat the predictor!"),
        ProgressionEvent::StoreFailure { key, message } => {
            eprintln!("progress for {} was not saved: {}", key, message)
        }
    }
}

fn print_achievements(store: &SqliteStore) -> Result<(), Box<dyn Error>> {
    let unlocked: HashMap<String, _> = store.unlocked_achievements()?.into_iter().collect();
    for achievement in Achievement::ALL {
        match unlocked.get(achievement.key()) {
            Some(at) => println!(
                "[x] {:<30} {} ({})",
                achievement.key(),
                achievement.message(),
                at.format("%Y-%m-%d")
            ),
            None => println!("[ ] {}", achievement.key()),
        }
    }
    Ok(())
}

fn print_stars(store: &SqliteStore) -> Result<(), Box<dyn Error>> {
    let stars = store.all_stars()?;
    if stars.is_empty() {
        println!("no adventure levels played yet");
    }
    for (level, n) in stars {
        println!("{:<12} {}", level, star_text(n));
    }
    Ok(())
}
