use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use hanzi_core::model::{Achievement, GameSessionId, User};
use services::{AppServices, GameOptions, GameResults, GameSession};

/// What a finished game left behind.
#[derive(Debug)]
pub struct PlaySummary {
    pub results: GameResults,
    pub unlocked: Vec<Achievement>,
    pub record_id: Option<GameSessionId>,
}

enum Command {
    Hint,
    Answer(usize),
    Invalid,
}

fn parse_command(line: &str, option_count: usize) -> Command {
    let line = line.trim();
    if line.eq_ignore_ascii_case("h") {
        return Command::Hint;
    }
    match line.parse::<usize>() {
        Ok(n) if (1..=option_count).contains(&n) => Command::Answer(n - 1),
        _ => Command::Invalid,
    }
}

fn print_question<W: Write>(session: &GameSession, out: &mut W) -> Result<()> {
    let Some(question) = session.current_question() else {
        return Ok(());
    };
    let progress = session.progress();
    writeln!(out)?;
    writeln!(
        out,
        "Question {}/{} ({}%)   score {}",
        progress.current,
        progress.total,
        progress.percent(),
        session.score()
    )?;
    writeln!(out, "  {}", question.character().character)?;
    if question.hint_used() {
        writeln!(out, "  pinyin: {}", question.character().pinyin)?;
    }
    for (i, option) in question.options().iter().enumerate() {
        writeln!(out, "  {}) {}", i + 1, option)?;
    }
    write!(out, "> ")?;
    out.flush()?;
    Ok(())
}

/// Play one game for `user`, reading commands line by line from `input`.
///
/// `h` reveals the pinyin hint, `1`..`n` picks an option.
///
/// # Errors
///
/// Fails if the game cannot start, persistence fails, or input ends early.
pub async fn play<R: BufRead, W: Write>(
    app: &AppServices,
    user: &User,
    options: &GameOptions,
    input: &mut R,
    out: &mut W,
) -> Result<PlaySummary> {
    let game_loop = app.game_loop();
    let mut session = game_loop.start_game(&user.id, options).await?;
    let mut unlocked = Vec::new();

    writeln!(
        out,
        "{} (level {}), {} questions. Type h for a hint or a number to answer.",
        user.name,
        user.level,
        session.progress().total
    )?;

    let mut line = String::new();
    while !session.is_complete() || session.has_pending_answer() {
        let option = if let Some(pending) = session.pending_option() {
            let pending = pending.to_string();
            write!(out, "Press Enter to retry saving, or q to quit: ")?;
            out.flush()?;
            line.clear();
            if input.read_line(&mut line)? == 0 || line.trim().eq_ignore_ascii_case("q") {
                bail!("the last answer was not saved");
            }
            pending
        } else {
            print_question(&session, out)?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                bail!("input closed before the game finished");
            }

            let option_count = session
                .current_question()
                .map_or(0, |q| q.options().len());
            match parse_command(&line, option_count) {
                Command::Hint => {
                    let pinyin = session.reveal_hint()?.to_string();
                    writeln!(out, "Hint: {pinyin} (points halved)")?;
                    continue;
                }
                Command::Invalid => {
                    writeln!(out, "Type h or a number from 1 to {option_count}.")?;
                    continue;
                }
                Command::Answer(index) => match session
                    .current_question()
                    .and_then(|q| q.options().get(index).cloned())
                {
                    Some(option) => option,
                    None => continue,
                },
            }
        };

        let result = match game_loop.answer_current(&mut session, &option).await {
            Ok(result) => result,
            Err(err) if session.has_pending_answer() => {
                writeln!(out, "Could not save the answer: {err}")?;
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        if result.outcome.correct {
            writeln!(out, "正确! +{} points", result.outcome.points)?;
        } else {
            writeln!(out, "Not quite. It means \"{}\".", result.outcome.correct_meaning)?;
        }
        if let Some(gain) = &result.experience {
            if gain.level_change.leveled_up() {
                writeln!(out, "Level up! You reached level {}.", gain.level_change.to)?;
            }
        }
        unlocked.extend(result.unlocked);
    }

    let results = session.results();
    writeln!(out)?;
    writeln!(
        out,
        "{} {}",
        results.performance.emoji(),
        results.performance.message()
    )?;
    writeln!(
        out,
        "Score {}   correct {}/{}   accuracy {}%   time {}s",
        results.score,
        results.correct,
        results.total,
        results.accuracy,
        session.time_spent_secs()
    )?;
    for achievement in &unlocked {
        writeln!(
            out,
            "{} Achievement unlocked: {} ({})",
            achievement.icon, achievement.title, achievement.description
        )?;
    }

    Ok(PlaySummary {
        results,
        unlocked,
        record_id: session.record_id(),
    })
}
