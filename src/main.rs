#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::module_name_repetitions)]

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use glob::GlobError;
use rayon::prelude::*;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use pbp_to_box::event_file::game_state::{
    GameOptions, GameState, ProcessedGame, ValidationPolicy,
};
use pbp_to_box::event_file::schemas::GameFile;

const ABOUT: &str = "Resolves Retrosheet play notation into enhanced play-by-play records.";

#[derive(Parser, Debug)]
#[command(name = "pbp-to-box", about = ABOUT)]
struct Opt {
    /// Glob pattern matching JSON game files.
    #[arg(short, long)]
    input: String,

    #[arg(short, long)]
    output_dir: PathBuf,

    /// Reject games containing plays that do not fully parse.
    #[arg(long)]
    strict: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Opt {
    const fn options(&self) -> GameOptions {
        GameOptions {
            validation: if self.strict {
                ValidationPolicy::Strict
            } else {
                ValidationPolicy::Lenient
            },
        }
    }
}

fn output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "games".into(), |s| s.to_string_lossy());
    output_dir.join(format!("{stem}-enhanced.json"))
}

/// Games that fail a consistency check are logged and left out of the output.
fn process_file(input: &Path, output_dir: &Path, options: GameOptions) -> Result<usize> {
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?,
    );
    let games = serde_json::from_reader::<_, GameFile>(reader)
        .with_context(|| format!("Failed to parse {}", input.display()))?
        .into_games();
    let game_count = games.len();

    let processed: Vec<ProcessedGame> = games
        .par_iter()
        .filter_map(|game| {
            GameState::process(game, options)
                .map_err(|e| error!("{:?}", e))
                .ok()
        })
        .collect();
    if processed.len() < game_count {
        info!(
            "{}: {} of {} games skipped",
            input.display(),
            game_count - processed.len(),
            game_count
        );
    }

    let path = output_path(input, output_dir);
    let writer = BufWriter::new(
        File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?,
    );
    serde_json::to_writer(writer, &processed)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(processed.len())
}

fn process_files(opt: &Opt) -> Result<usize> {
    std::fs::create_dir_all(&opt.output_dir).context("Error occurred on output dir check")?;
    let mut files = glob::glob(&opt.input)
        .context("Invalid input pattern")?
        .collect::<Result<Vec<PathBuf>, GlobError>>()?;
    files.par_sort();
    info!("Processing {} files", files.len());
    let options = opt.options();
    files
        .par_iter()
        .map(|f| process_file(f, &opt.output_dir, options))
        .sum()
}

#[allow(clippy::expect_used)]
fn main() {
    let opt: Opt = Opt::parse();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if opt.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to initialize trace");

    let start = Instant::now();
    let games = process_files(&opt).expect("Error occurred while processing files");

    info!("Processed {} games", games);
    info!("Elapsed: {:?}", start.elapsed());
}
