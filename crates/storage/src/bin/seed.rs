use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use hanzi_core::GameRules;
use hanzi_core::catalog;
use hanzi_core::model::{CharacterId, GameSessionRecord, User, UserId, UserProgress};
use storage::repository::Storage;

/// Same default as the `hanzi` binary so seeded data shows up there.
const DEFAULT_DB_URL: &str = "sqlite://hanzi.sqlite3";

/// Seeds a demo learner with progress and a few finished sessions.
#[derive(Debug, Parser)]
#[command(name = "seed")]
struct Args {
    /// SQLite URL
    #[arg(long = "db", env = "HANZI_DB_URL", default_value = DEFAULT_DB_URL)]
    db_url: String,

    /// Id of the demo user to upsert
    #[arg(long, env = "HANZI_USER_ID", default_value = "demo-user")]
    user_id: String,

    #[arg(long, default_value = "Demo Learner")]
    name: String,

    /// Number of completed game sessions to append
    #[arg(long, default_value_t = 3)]
    sessions: u32,

    /// Number of catalog characters to give progress for
    #[arg(long, default_value_t = 12)]
    characters: u32,

    /// Fixed current time (RFC3339) for deterministic seeding
    #[arg(long)]
    now: Option<DateTime<Utc>>,
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let rules = GameRules::default();
    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);
    let user_id = UserId::new(args.user_id.clone())?;

    let mut user = match storage.users.get_user(&user_id).await? {
        Some(user) => user,
        None => User::new(
            user_id.clone(),
            args.name.clone(),
            "demo@example.com",
            None,
            now,
        ),
    };

    let mut progress = Vec::new();
    for ch in catalog::all().iter().take(args.characters as usize) {
        let mut entry = UserProgress::first_attempt(user_id.clone(), ch.id, true, now);
        // Every other character gets enough correct answers to be mastered.
        if ch.id.value() % 2 == 0 {
            for _ in 1..rules.mastery_threshold {
                entry.record_attempt(true, now, rules.mastery_threshold);
            }
        }
        progress.push(entry);
    }
    storage.progress.upsert_progress(&progress).await?;

    for i in 0..args.sessions {
        let started_at = now - Duration::days(i64::from(i)) - Duration::minutes(10);
        let studied: Vec<CharacterId> = progress
            .iter()
            .skip(i as usize)
            .take(rules.questions_per_session)
            .map(|p| p.character_id)
            .collect();
        let total = u32::try_from(studied.len())?;
        let correct = total.saturating_sub(i % 3);
        let score = u64::from(correct) * 100;
        let record = GameSessionRecord {
            id: None,
            user_id: user_id.clone(),
            characters_studied: studied,
            score,
            correct_answers: correct,
            total_questions: total,
            time_spent_secs: 240,
            started_at,
            completed_at: Some(started_at + Duration::minutes(4)),
        };
        storage.sessions.append_session(&record).await?;
        user.add_experience(score, &rules);
    }

    user.last_login_at = now.max(user.created_at);
    storage.users.upsert_user(&user).await?;

    println!(
        "Seeded user {} (level {}) with {} progress entries and {} sessions into {}",
        user_id,
        user.level,
        progress.len(),
        args.sessions,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
