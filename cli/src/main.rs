//! # Tile-merge CLI
//!
//! Terminal front end for the tile-merge engine: interactive play with undo,
//! or headless simulations with configurable policies.

mod store;

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tilemerge_core::{
    rng::fresh_seed, BestScore, Direction, GameConfig, GameController, GameError, GameStatus,
    MemoryScoreStore, TurnReport,
};
use tracing_subscriber::EnvFilter;

use crate::store::{JsonFileStore, DEFAULT_BEST_SCORE_FILE};

#[derive(Parser, Debug)]
#[command(name = "tilemerge")]
#[command(author, version, about = "Play the tile-merge puzzle in the terminal or run simulations")]
struct Args {
    /// Run in interactive mode (default if no other mode specified)
    #[arg(short, long)]
    interactive: bool,

    /// Number of episodes to run in headless mode
    #[arg(short, long)]
    episodes: Option<u32>,

    /// Spawn seed; a fresh one is drawn when omitted
    #[arg(short, long)]
    seed: Option<u32>,

    /// Maximum steps per episode (0 = unlimited)
    #[arg(short, long, default_value = "10000")]
    max_steps: u32,

    /// Policy for headless mode
    #[arg(short, long, value_enum, default_value = "random")]
    policy: Policy,

    /// In headless mode, spend undo credits to escape stuck positions
    #[arg(long)]
    use_undo: bool,

    /// Show board after each move in headless mode
    #[arg(long)]
    verbose: bool,

    /// JSON file with undo-economy and win settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where the best score is kept
    #[arg(long, env = "TILEMERGE_BEST_SCORE", default_value = DEFAULT_BEST_SCORE_FILE)]
    best_score_file: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Random valid moves
    Random,
    /// Cycle through actions: Left, Down, Right, Up
    Cycle,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;
    let seed = args.seed.unwrap_or_else(fresh_seed);
    tracing::info!(seed, ?config, "starting");

    if let Some(episodes) = args.episodes {
        run_headless(&args, config, seed, episodes)
    } else {
        run_interactive(&args, config, seed)
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

// =============================================================================
// Interactive mode
// =============================================================================

const CONTROLS: &str = "Controls: WASD or Arrow Keys | U undo | R restart | Q quit";

/// Run interactive mode where user plays with keyboard.
fn run_interactive(args: &Args, config: GameConfig, seed: u32) -> Result<()> {
    let store = JsonFileStore::new(&args.best_score_file);
    tracing::info!(path = %store.path().display(), "loading best score");
    let mut game = GameController::with_config(config, seed, store)?;
    let mut stdin = io::stdin();

    // Set terminal to raw mode for single-key input; restored on every exit path
    let _raw = RawMode::enable();
    redraw(&game)?;

    loop {
        match read_action(&mut stdin)? {
            InputAction::Move(direction) => {
                let report = match game.move_tiles(direction) {
                    Ok(Some(report)) => report,
                    Ok(None) => continue,
                    Err(err) => {
                        tracing::debug!(%err, "move declined");
                        continue;
                    }
                };
                // Nothing animates in a terminal; release the lock right away.
                game.finish_animation();
                redraw(&game)?;
                print_turn(&report, game.undo_count());
            }
            InputAction::Undo => {
                let result = game.undo();
                game.finish_animation();
                redraw(&game)?;
                match result {
                    Ok(report) => println!("  Undone. {} undo(s) left", report.undo_count),
                    Err(GameError::NoHistory) => println!("  Nothing to undo"),
                    Err(err) => println!("  {err}"),
                }
            }
            InputAction::Restart => {
                game.restart();
                redraw(&game)?;
            }
            InputAction::Quit => {
                println!("\nGoodbye!");
                return Ok(());
            }
            InputAction::None => {}
        }
    }
}

fn print_turn(report: &TurnReport, undo_count: u32) {
    if report.score_delta > 0 {
        println!("  +{} points!", report.score_delta);
    }
    if report.undo_rewards > 0 {
        println!("  +{} undo", report.undo_rewards);
    }
    if report.new_best {
        println!("  New best score!");
    }

    match report.status {
        GameStatus::Playing => {}
        GameStatus::Won => {
            println!("\n  *** YOU WIN ***");
            println!("  Keep going, or press R to restart");
        }
        GameStatus::Stuck => {
            println!("\n  No moves left!");
            println!("  Press U to undo ({undo_count} left) or R to restart");
        }
        GameStatus::GameOver => {
            println!("\n  *** GAME OVER ***");
            println!("  Final Score: {}", report.score);
            println!("\n  Press R to restart or Q to quit");
        }
    }
}

fn redraw<S: tilemerge_core::ScoreStore>(game: &GameController<S>) -> Result<()> {
    print!("\x1b[2J\x1b[H"); // Clear screen
    println!("=== TILE MERGE ===");
    println!("{CONTROLS}\n");
    println!(
        "Score: {}   Best: {}   Undo: {}",
        game.score(),
        game.best_score(),
        game.undo_count()
    );
    print!("{}", game.grid());
    io::stdout().flush()?;
    Ok(())
}

// =============================================================================
// Headless mode
// =============================================================================

#[derive(Debug, Default)]
struct EpisodeStats {
    score: u32,
    max_tile: u32,
    steps: u32,
    undos: u32,
    won: bool,
}

/// Run headless simulation mode.
fn run_headless(args: &Args, config: GameConfig, seed: u32, episodes: u32) -> Result<()> {
    let mut results: Vec<EpisodeStats> = Vec::with_capacity(episodes as usize);

    // Use a separate RNG for action selection
    let mut action_rng = SmallRng::seed_from_u64(u64::from(seed).wrapping_add(1000));

    for episode in 0..episodes {
        let episode_seed = seed.wrapping_add(episode);
        let mut game = GameController::with_config(config, episode_seed, MemoryScoreStore::new())?;
        let stats = play_episode(&mut game, args, &mut action_rng);

        if args.verbose {
            println!(
                "Episode {}: Score={}, MaxTile={}, Steps={}, Undos={}",
                episode + 1,
                stats.score,
                stats.max_tile,
                stats.steps,
                stats.undos
            );
        }
        results.push(stats);
    }

    let store = JsonFileStore::new(&args.best_score_file);
    tracing::info!(path = %store.path().display(), "recording best score");
    let mut best = BestScore::load(store);
    let top_score = results.iter().map(|r| r.score).max().unwrap_or(0);
    let new_best = best.offer(top_score);

    print_summary(args, seed, &results, new_best, best.get());
    Ok(())
}

fn play_episode(
    game: &mut GameController,
    args: &Args,
    action_rng: &mut SmallRng,
) -> EpisodeStats {
    let mut stats = EpisodeStats::default();
    let mut action_cycle = 0;

    while args.max_steps == 0 || stats.steps < args.max_steps {
        match game.status() {
            GameStatus::GameOver => break,
            GameStatus::Stuck if !args.use_undo => break,
            GameStatus::Stuck => {
                if game.undo().is_err() {
                    break;
                }
                game.finish_animation();
                stats.undos += 1;
                stats.steps += 1;
                continue;
            }
            GameStatus::Playing | GameStatus::Won => {}
        }

        let action = match args.policy {
            Policy::Random => select_random_action(game, action_rng),
            Policy::Cycle => select_cycle_action(game, &mut action_cycle),
        };
        let Some(direction) = action else {
            break; // No valid actions
        };

        if let Ok(Some(report)) = game.move_tiles(direction) {
            game.finish_animation();
            stats.steps += 1;
            stats.won |= report.status == GameStatus::Won;

            if args.verbose {
                println!("Step {}: {}", stats.steps, direction);
                print!("{}", game.grid());
            }
        }
    }

    stats.score = game.score();
    stats.max_tile = game.grid().max_tile();
    stats
}

fn print_summary(args: &Args, seed: u32, results: &[EpisodeStats], new_best: bool, best: u32) {
    let episodes = results.len();
    if episodes == 0 {
        println!("=== Simulation Results ===");
        println!("episodes=0");
        return;
    }

    let total_score: u64 = results.iter().map(|r| u64::from(r.score)).sum();
    let avg_score = total_score as f64 / episodes as f64;
    let mut scores: Vec<u32> = results.iter().map(|r| r.score).collect();
    scores.sort_unstable();
    let median_score = if episodes % 2 == 0 {
        (scores[episodes / 2 - 1] + scores[episodes / 2]) as f64 / 2.0
    } else {
        scores[episodes / 2] as f64
    };
    let max_tile_overall = results.iter().map(|r| r.max_tile).max().unwrap_or(0);
    let wins = results.iter().filter(|r| r.won).count();
    let undos: u32 = results.iter().map(|r| r.undos).sum();

    // Count tile distribution
    let mut tile_counts = std::collections::BTreeMap::new();
    for result in results {
        *tile_counts.entry(result.max_tile).or_insert(0u32) += 1;
    }

    // Output results in parseable format
    println!("=== Simulation Results ===");
    println!("episodes={}", episodes);
    println!("policy={:?}", args.policy);
    println!("seed={}", seed);
    println!("max_steps={}", args.max_steps);
    println!("use_undo={}", args.use_undo);
    println!("avg_score={:.2}", avg_score);
    println!("median_score={:.2}", median_score);
    println!("min_score={}", scores.first().unwrap_or(&0));
    println!("max_score={}", scores.last().unwrap_or(&0));
    println!("max_tile_overall={}", max_tile_overall);
    println!("wins={}", wins);
    println!("undos_used={}", undos);
    println!("best_score={}{}", best, if new_best { " (new)" } else { "" });

    let distribution: Vec<String> = tile_counts
        .iter()
        .map(|(tile, count)| format!("{}:{}", tile, count))
        .collect();
    println!("tile_distribution={}", distribution.join(","));
}

/// Select a random valid action.
fn select_random_action(game: &GameController, rng: &mut SmallRng) -> Option<Direction> {
    let legal = game.legal_directions();
    if legal.is_empty() {
        None
    } else {
        Some(legal[rng.gen_range(0..legal.len())])
    }
}

/// Select action in a cycle: Left, Down, Right, Up.
fn select_cycle_action(game: &GameController, cycle: &mut usize) -> Option<Direction> {
    let order = [Direction::Left, Direction::Down, Direction::Right, Direction::Up];
    let legal = game.legal_directions();

    // Try actions in cycle order, starting from current position
    for _ in 0..4 {
        let direction = order[*cycle % 4];
        *cycle += 1;
        if legal.contains(&direction) {
            return Some(direction);
        }
    }

    None
}

// =============================================================================
// Input
// =============================================================================

#[derive(Debug, PartialEq, Eq)]
enum InputAction {
    Move(Direction),
    Undo,
    Restart,
    Quit,
    None,
}

/// Read one key press. End of input quits instead of spinning.
fn read_action(input: &mut impl Read) -> io::Result<InputAction> {
    let mut buffer = [0u8; 3];
    let bytes_read = input.read(&mut buffer)?;
    if bytes_read == 0 {
        return Ok(InputAction::Quit);
    }
    Ok(parse_input(&buffer[..bytes_read]))
}

fn parse_input(bytes: &[u8]) -> InputAction {
    match bytes {
        // Arrow keys (escape sequences)
        [27, 91, 65] => InputAction::Move(Direction::Up),
        [27, 91, 66] => InputAction::Move(Direction::Down),
        [27, 91, 67] => InputAction::Move(Direction::Right),
        [27, 91, 68] => InputAction::Move(Direction::Left),

        // WASD keys
        [b'w'] | [b'W'] => InputAction::Move(Direction::Up),
        [b's'] | [b'S'] => InputAction::Move(Direction::Down),
        [b'a'] | [b'A'] => InputAction::Move(Direction::Left),
        [b'd'] | [b'D'] => InputAction::Move(Direction::Right),

        // Control keys
        [b'u'] | [b'U'] => InputAction::Undo,
        [b'q'] | [b'Q'] | [3] | [27] => InputAction::Quit, // q, Q, Ctrl+C, Esc
        [b'r'] | [b'R'] => InputAction::Restart,

        _ => InputAction::None,
    }
}

// Platform-specific terminal raw mode handling

/// Puts stdin into raw mode and restores the saved settings when dropped.
struct RawMode {
    #[cfg(unix)]
    saved: Option<libc::termios>,
}

#[cfg(unix)]
impl RawMode {
    fn enable() -> Self {
        use std::os::unix::io::AsRawFd;
        let fd = io::stdin().as_raw_fd();
        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &mut termios) != 0 {
                // Not a terminal; nothing to restore.
                return Self { saved: None };
            }
            let saved = termios;
            termios.c_lflag &= !(libc::ICANON | libc::ECHO);
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;
            libc::tcsetattr(fd, libc::TCSANOW, &termios);
            Self { saved: Some(saved) }
        }
    }
}

#[cfg(unix)]
impl Drop for RawMode {
    fn drop(&mut self) {
        use std::os::unix::io::AsRawFd;
        if let Some(saved) = self.saved.take() {
            let fd = io::stdin().as_raw_fd();
            unsafe {
                libc::tcsetattr(fd, libc::TCSANOW, &saved);
            }
        }
    }
}

#[cfg(not(unix))]
impl RawMode {
    fn enable() -> Self {
        // Without raw mode each key needs Enter
        Self {}
    }
}
