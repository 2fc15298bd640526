mod db;
mod play;
mod report;

use std::io;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use hanzi_core::GameRules;
use hanzi_core::model::{Category, UserId};
use services::{AppServices, CharacterService, Clock, GameOptions};

#[derive(Parser)]
#[command(name = "hanzi")]
#[command(about = "Learn Chinese characters with short multiple-choice games")]
#[command(version)]
struct Cli {
    /// Database URL or path
    #[arg(long, global = true, env = "HANZI_DB_URL", default_value = "sqlite://hanzi.sqlite3")]
    db: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game in the terminal
    Play(PlayArgs),

    /// Show a user's profile and achievements
    Profile {
        #[arg(long, env = "HANZI_USER_ID")]
        user: UserId,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show statistics over completed games
    Stats {
        #[arg(long, env = "HANZI_USER_ID")]
        user: UserId,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List catalog characters
    Characters {
        /// Only characters unlocked at this level
        #[arg(long)]
        level: Option<u32>,

        #[arg(long)]
        category: Option<Category>,
    },
}

#[derive(Args)]
struct PlayArgs {
    /// Existing user id; a guest profile is created when missing
    #[arg(long, env = "HANZI_USER_ID")]
    user: Option<UserId>,

    /// Display name for a new guest
    #[arg(long)]
    name: Option<String>,

    /// Number of questions
    #[arg(long)]
    count: Option<usize>,

    #[arg(long)]
    category: Option<Category>,

    /// Leave out characters already mastered
    #[arg(long)]
    skip_mastered: bool,

    /// Seed for reproducible character picks
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let characters = match &cli.command {
        Commands::Play(PlayArgs {
            seed: Some(seed), ..
        }) => CharacterService::with_seed(*seed),
        _ => CharacterService::new(),
    };

    let db_url = db::normalize_sqlite_url(&cli.db);
    db::prepare_sqlite_file(&db_url)?;
    tracing::debug!(db = %db_url, "opening database");
    let app = AppServices::new_sqlite(&db_url, Clock::default(), GameRules::default(), characters)
        .await
        .with_context(|| format!("failed to open {db_url}"))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Play(args) => {
            let user = app.users().login_guest(args.user, args.name).await?;
            let options = GameOptions {
                count: args.count,
                category: args.category,
                skip_mastered: args.skip_mastered,
            };
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let summary = play::play(&app, &user, &options, &mut input, &mut out).await?;
            tracing::debug!(
                user_id = %user.id,
                score = summary.results.score,
                unlocked = summary.unlocked.len(),
                record_id = ?summary.record_id,
                "game finished"
            );
        }
        Commands::Profile { user, json } => {
            report::profile(&app, &user, json, &mut out).await?;
        }
        Commands::Stats { user, json } => {
            report::stats(&app, &user, json, &mut out).await?;
        }
        Commands::Characters { level, category } => {
            report::characters(&app, level, category, &mut out)?;
        }
    }
    Ok(())
}
