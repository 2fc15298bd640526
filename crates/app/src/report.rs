use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use hanzi_core::model::{AchievementStatus, Category, User, UserId};
use hanzi_core::scoring;
use hanzi_core::selection::LearningRecommendation;
use services::{AppServices, UserStats};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileReport {
    user: User,
    experience_to_next_level: u64,
    level_progress_percent: u32,
    recommendations: LearningRecommendation,
    achievements: Vec<AchievementStatus>,
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Print a user's profile, level progress and achievements.
///
/// # Errors
///
/// Fails for unknown users or storage errors.
pub async fn profile<W: Write>(
    app: &AppServices,
    user_id: &UserId,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let user = app.users().get_user(user_id).await?;
    let rules = app.rules();
    let report = ProfileReport {
        experience_to_next_level: scoring::experience_to_next_level(user.experience, rules),
        level_progress_percent: scoring::level_progress_percent(user.experience, rules),
        recommendations: app.characters().recommendations(user.level),
        achievements: app.achievements().catalog_with_status(user_id).await?,
        user,
    };

    if json {
        return write_json(out, &report);
    }

    let user = &report.user;
    writeln!(out, "{} ({})", user.name, user.id)?;
    if !user.email.is_empty() {
        writeln!(out, "  email: {}", user.email)?;
    }
    writeln!(
        out,
        "  level {}   xp {}   total score {}",
        user.level, user.experience, user.total_score
    )?;
    writeln!(
        out,
        "  {}% to level {} ({} xp to go)",
        report.level_progress_percent,
        user.level + 1,
        report.experience_to_next_level
    )?;

    writeln!(out)?;
    writeln!(out, "{}", report.recommendations.description)?;
    for focus in &report.recommendations.focus {
        writeln!(out, "  - {focus}")?;
    }
    writeln!(out, "Next: {}", report.recommendations.next_milestone)?;

    writeln!(out)?;
    writeln!(out, "Achievements")?;
    for status in &report.achievements {
        let mark = if status.unlocked { "x" } else { " " };
        writeln!(
            out,
            "  [{mark}] {} {}: {}",
            status.achievement.icon, status.achievement.title, status.achievement.description
        )?;
    }
    Ok(())
}

/// Print aggregate statistics over a user's completed games.
///
/// # Errors
///
/// Fails for unknown users or storage errors.
pub async fn stats<W: Write>(
    app: &AppServices,
    user_id: &UserId,
    json: bool,
    out: &mut W,
) -> Result<()> {
    app.users().get_user(user_id).await?;
    let stats: UserStats = app.stats().user_stats(user_id).await?;
    if json {
        return write_json(out, &stats);
    }

    writeln!(out, "Sessions played:     {}", stats.total_sessions)?;
    writeln!(out, "Characters learned:  {}", stats.total_characters_learned)?;
    writeln!(out, "Average score:       {}", stats.average_score)?;
    writeln!(out, "Time spent:          {}s", stats.total_time_spent_secs)?;
    Ok(())
}

/// Print the catalog, optionally limited to a level and a category.
///
/// # Errors
///
/// Fails only when writing to `out` fails.
pub fn characters<W: Write>(
    app: &AppServices,
    level: Option<u32>,
    category: Option<Category>,
    out: &mut W,
) -> Result<()> {
    let list = app.characters().list_characters(level, category);
    for c in &list {
        writeln!(
            out,
            "{:>3}  {}  {:<8} {:<20} d{}  {}",
            c.id,
            c.character,
            c.pinyin,
            c.meaning,
            c.difficulty.as_u8(),
            c.category
        )?;
    }
    writeln!(out, "{} characters", list.len())?;
    Ok(())
}
