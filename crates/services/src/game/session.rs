use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use hanzi_core::GameRules;
use hanzi_core::model::{GameSessionId, GameSessionRecord, UserId};
use hanzi_core::quiz::Question;
use hanzi_core::scoring::{self, Performance};

use super::progress::{AnswerOutcome, GameProgress, GameResults, PendingAnswer};
use crate::error::SessionError;

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Ready,
    Playing,
    Completed,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory game: a fixed list of questions answered in order.
///
/// Timestamps are passed in by the services layer so tests stay
/// deterministic.
pub struct GameSession {
    user_id: UserId,
    rules: GameRules,
    phase: GamePhase,
    questions: Vec<Question>,
    current: usize,
    answers: Vec<AnswerOutcome>,
    score: u64,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    record_id: Option<GameSessionId>,
    pending: Option<PendingAnswer>,
}

impl GameSession {
    #[must_use]
    pub fn new(user_id: UserId, rules: GameRules) -> Self {
        Self {
            user_id,
            rules,
            phase: GamePhase::Ready,
            questions: Vec::new(),
            current: 0,
            answers: Vec::new(),
            score: 0,
            started_at: None,
            completed_at: None,
            record_id: None,
            pending: None,
        }
    }

    /// Move from `Ready` to `Playing` with the given questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` unless the session is `Ready`.
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn start(
        &mut self,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if self.phase != GamePhase::Ready {
            return Err(SessionError::AlreadyStarted);
        }
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        self.questions = questions;
        self.started_at = Some(started_at);
        self.phase = GamePhase::Playing;
        Ok(())
    }

    /// Back to `Ready` for another round. The persisted id is forgotten.
    pub fn reset(&mut self) {
        *self = Self::new(self.user_id.clone(), self.rules.clone());
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == GamePhase::Completed
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub fn answers(&self) -> &[AnswerOutcome] {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn record_id(&self) -> Option<GameSessionId> {
        self.record_id
    }

    pub(crate) fn set_record_id(&mut self, id: GameSessionId) {
        self.record_id = Some(id);
    }

    /// The question waiting for an answer, if the game is being played.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase == GamePhase::Playing {
            self.questions.get(self.current)
        } else {
            None
        }
    }

    /// True while an answer waits for its writes to be retried.
    #[must_use]
    pub fn has_pending_answer(&self) -> bool {
        self.pending.is_some()
    }

    /// The option of the answer waiting to be retried.
    #[must_use]
    pub fn pending_option(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.option.as_str())
    }

    fn open_question(&self) -> Result<&Question, SessionError> {
        if self.pending.is_some() {
            return Err(SessionError::AnswerPending);
        }
        match self.phase {
            GamePhase::Ready => Err(SessionError::NotStarted),
            GamePhase::Completed => Err(SessionError::Completed),
            GamePhase::Playing => self
                .questions
                .get(self.current)
                .ok_or(SessionError::Completed),
        }
    }

    fn current_question_mut(&mut self) -> Result<&mut Question, SessionError> {
        if self.pending.is_some() {
            return Err(SessionError::AnswerPending);
        }
        match self.phase {
            GamePhase::Ready => Err(SessionError::NotStarted),
            GamePhase::Completed => Err(SessionError::Completed),
            GamePhase::Playing => self
                .questions
                .get_mut(self.current)
                .ok_or(SessionError::Completed),
        }
    }

    /// Reveal the pinyin of the current character. Halves its points.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` or `SessionError::Completed` when
    /// no question is open.
    pub fn reveal_hint(&mut self) -> Result<&str, SessionError> {
        Ok(self.current_question_mut()?.reveal_hint())
    }

    /// Score `option` against the current question without changing state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownOption` if `option` was not offered.
    /// Returns `SessionError::AnswerPending` while an earlier answer awaits
    /// a retry, or `NotStarted`/`Completed` when no question is open.
    pub fn grade(&self, option: &str) -> Result<AnswerOutcome, SessionError> {
        let question = self.open_question()?;
        if !question.options().iter().any(|o| o == option) {
            return Err(SessionError::UnknownOption(option.to_string()));
        }
        let character = question.character();
        let correct = question.check(option);
        Ok(AnswerOutcome {
            character_id: character.id,
            correct,
            points: scoring::points_for_answer(
                character.difficulty,
                question.hint_used(),
                correct,
                &self.rules,
            ),
            correct_meaning: character.meaning.clone(),
        })
    }

    /// Answer the current question with one of its options and advance.
    ///
    /// # Errors
    ///
    /// Same as [`GameSession::grade`].
    pub fn answer(
        &mut self,
        option: &str,
        answered_at: DateTime<Utc>,
    ) -> Result<AnswerOutcome, SessionError> {
        let outcome = self.grade(option)?;
        self.commit(&outcome, answered_at);
        Ok(outcome)
    }

    fn commit(&mut self, outcome: &AnswerOutcome, answered_at: DateTime<Utc>) {
        self.score = self.score.saturating_add(outcome.points);
        self.answers.push(outcome.clone());
        self.current += 1;
        if self.current >= self.questions.len() {
            self.phase = GamePhase::Completed;
            self.completed_at = Some(answered_at);
        }
    }

    /// Resume the parked answer for `option`, or grade a new one.
    pub(crate) fn begin_answer(
        &mut self,
        option: &str,
        answered_at: DateTime<Utc>,
    ) -> Result<PendingAnswer, SessionError> {
        if let Some(pending) = self.pending.take() {
            if pending.option != option {
                self.pending = Some(pending);
                return Err(SessionError::AnswerPending);
            }
            return Ok(pending);
        }
        let outcome = self.grade(option)?;
        Ok(PendingAnswer::new(option, outcome, answered_at))
    }

    /// Apply a graded answer once; later calls for the same answer are no-ops.
    pub(crate) fn commit_pending(&mut self, pending: &mut PendingAnswer) {
        if !pending.committed {
            self.commit(&pending.outcome, pending.answered_at);
            pending.committed = true;
        }
    }

    pub(crate) fn park_answer(&mut self, pending: PendingAnswer) {
        self.pending = Some(pending);
    }

    /// Answer by 0-based option index.
    ///
    /// # Errors
    ///
    /// Same as [`GameSession::answer`]; an index outside the options is an
    /// unknown option.
    pub fn answer_index(
        &mut self,
        index: usize,
        answered_at: DateTime<Utc>,
    ) -> Result<AnswerOutcome, SessionError> {
        let option = self
            .current_question()
            .and_then(|q| q.options().get(index).cloned())
            .ok_or_else(|| match self.phase {
                GamePhase::Ready => SessionError::NotStarted,
                GamePhase::Completed => SessionError::Completed,
                GamePhase::Playing => SessionError::UnknownOption(index.to_string()),
            })?;
        self.answer(&option, answered_at)
    }

    #[must_use]
    pub fn progress(&self) -> GameProgress {
        let total = self.questions.len();
        GameProgress {
            current: (self.current + 1).min(total),
            total,
            answered: self.answers.len(),
        }
    }

    #[must_use]
    pub fn results(&self) -> GameResults {
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        let correct = u32::try_from(self.answers.iter().filter(|a| a.correct).count())
            .unwrap_or(u32::MAX);
        let answered = u32::try_from(self.answers.len()).unwrap_or(u32::MAX);
        let accuracy = scoring::accuracy_percent(correct, total);
        GameResults {
            score: self.score,
            correct,
            incorrect: answered - correct,
            total,
            accuracy,
            performance: Performance::from_accuracy(accuracy),
        }
    }

    /// Seconds between start and completion, zero while unfinished.
    #[must_use]
    pub fn time_spent_secs(&self) -> u64 {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => u64::try_from((end - start).num_seconds()).unwrap_or(0),
            _ => 0,
        }
    }

    /// Persistable shape of this game.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` if the game was never started.
    pub fn record(&self) -> Result<GameSessionRecord, SessionError> {
        let started_at = self.started_at.ok_or(SessionError::NotStarted)?;
        let results = self.results();
        Ok(GameSessionRecord {
            id: self.record_id,
            user_id: self.user_id.clone(),
            characters_studied: self.answers.iter().map(|a| a.character_id).collect(),
            score: self.score,
            correct_answers: results.correct,
            total_questions: results.total,
            time_spent_secs: self.time_spent_secs(),
            started_at,
            completed_at: self.completed_at,
        })
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("user_id", &self.user_id)
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("score", &self.score)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .field("record_id", &self.record_id)
            .field("pending", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use hanzi_core::catalog;
    use hanzi_core::model::CharacterId;
    use hanzi_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn questions(ids: &[u32]) -> Vec<Question> {
        let mut rng = StdRng::seed_from_u64(11);
        ids.iter()
            .map(|id| {
                let c = catalog::find(CharacterId::new(*id)).unwrap().clone();
                Question::generate(c, 4, &mut rng)
            })
            .collect()
    }

    fn wrong_option(q: &Question) -> String {
        q.options().iter().find(|o| !q.check(o)).unwrap().clone()
    }

    fn started(ids: &[u32]) -> GameSession {
        let mut session = GameSession::new(UserId::new("u1").unwrap(), GameRules::default());
        session.start(questions(ids), fixed_now()).unwrap();
        session
    }

    #[test]
    fn empty_game_cannot_start() {
        let mut session = GameSession::new(UserId::new("u1").unwrap(), GameRules::default());
        assert_eq!(
            session.start(Vec::new(), fixed_now()),
            Err(SessionError::Empty)
        );
        assert_eq!(session.phase(), GamePhase::Ready);
        assert!(session.current_question().is_none());
        assert_eq!(session.reveal_hint(), Err(SessionError::NotStarted));
        assert_eq!(session.record().unwrap_err(), SessionError::NotStarted);
    }

    #[test]
    fn game_runs_to_completion() {
        // 1 and 31 are difficulty 1 and 2.
        let mut session = started(&[1, 31]);
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(
            session.progress(),
            GameProgress {
                current: 1,
                total: 2,
                answered: 0
            }
        );
        assert_eq!(
            session.start(questions(&[2]), fixed_now()),
            Err(SessionError::AlreadyStarted)
        );

        let meaning = session.current_question().unwrap().character().meaning.clone();
        let first = session.answer(&meaning, fixed_now()).unwrap();
        assert!(first.correct);
        assert_eq!(first.points, 100);
        assert_eq!(first.character_id, CharacterId::new(1));

        let q = session.current_question().unwrap();
        let wrong = wrong_option(q);
        let finished_at = fixed_now() + Duration::seconds(75);
        let second = session.answer(&wrong, finished_at).unwrap();
        assert!(!second.correct);
        assert_eq!(second.points, 0);
        assert_eq!(second.correct_meaning, catalog::find(CharacterId::new(31)).unwrap().meaning);

        assert!(session.is_complete());
        assert_eq!(session.progress().current, 2);
        assert_eq!(session.answer(&wrong, finished_at), Err(SessionError::Completed));

        let results = session.results();
        assert_eq!(results.score, 100);
        assert_eq!(results.correct, 1);
        assert_eq!(results.incorrect, 1);
        assert_eq!(results.accuracy, 50);
        assert_eq!(results.performance, Performance::Good);

        let record = session.record().unwrap();
        assert_eq!(
            record.characters_studied,
            vec![CharacterId::new(1), CharacterId::new(31)]
        );
        assert_eq!(record.time_spent_secs, 75);
        assert_eq!(record.completed_at, Some(finished_at));
        assert_eq!(record.total_questions, 2);
    }

    #[test]
    fn hint_halves_points() {
        // 31 is difficulty 2: 200 points, 100 with the hint.
        let mut session = started(&[31]);
        let pinyin = session.reveal_hint().unwrap().to_string();
        assert_eq!(pinyin, catalog::find(CharacterId::new(31)).unwrap().pinyin);

        let index = session.current_question().unwrap().correct_index().unwrap();
        let outcome = session.answer_index(index, fixed_now()).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.points, 100);
    }

    #[test]
    fn unknown_options_are_rejected_without_advancing() {
        let mut session = started(&[1, 2]);
        let err = session.answer("definitely not offered", fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::UnknownOption(_)));
        assert_eq!(
            session.answer_index(9, fixed_now()),
            Err(SessionError::UnknownOption("9".into()))
        );
        assert_eq!(session.progress().answered, 0);
    }

    #[test]
    fn grading_leaves_the_session_untouched() {
        let session = started(&[1, 2]);
        let meaning = session.current_question().unwrap().character().meaning.clone();
        let outcome = session.grade(&meaning).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.points, 100);
        assert_eq!(session.progress().answered, 0);
        assert_eq!(session.score(), 0);
        assert_eq!(session.current_question().unwrap().character().id, CharacterId::new(1));
    }

    #[test]
    fn parked_answer_blocks_other_answers_until_resumed() {
        let mut session = started(&[1, 2]);
        let meaning = session.current_question().unwrap().character().meaning.clone();
        let pending = session.begin_answer(&meaning, fixed_now()).unwrap();
        session.park_answer(pending);

        assert!(session.has_pending_answer());
        assert_eq!(session.pending_option(), Some(meaning.as_str()));
        assert_eq!(session.grade(&meaning), Err(SessionError::AnswerPending));
        assert_eq!(session.reveal_hint(), Err(SessionError::AnswerPending));
        let other = wrong_option(session.questions.first().unwrap());
        assert_eq!(
            session.begin_answer(&other, fixed_now()).unwrap_err(),
            SessionError::AnswerPending
        );

        let mut resumed = session.begin_answer(&meaning, fixed_now()).unwrap();
        assert!(!session.has_pending_answer());
        session.commit_pending(&mut resumed);
        session.commit_pending(&mut resumed);
        assert_eq!(session.progress().answered, 1);
        assert_eq!(session.score(), 100);
    }

    #[test]
    fn reset_returns_to_ready() {
        let mut session = started(&[1]);
        let meaning = session.current_question().unwrap().character().meaning.clone();
        session.answer(&meaning, fixed_now()).unwrap();
        session.set_record_id(GameSessionId::new(4));

        session.reset();
        assert_eq!(session.phase(), GamePhase::Ready);
        assert_eq!(session.score(), 0);
        assert!(session.record_id().is_none());
        session.start(questions(&[2]), fixed_now()).unwrap();
    }
}
