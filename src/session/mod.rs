//! Lesson session controller: drives one attempt at one lesson through its
//! phases (theory, quiz, challenge, completion) and reports the result to
//! the progression engine exactly once.
//!
//! Quiz answers lock as soon as they are given. Challenges require at least
//! one run before advancing, but a failing run never blocks progress. The
//! only external side effect of a session is the single completion call.

mod runner;

pub use runner::{matches_expected, RunReport, SimulatedRunner, PLACEHOLDER_OUTPUT};

use crate::catalog::{Challenge, Lesson, QuizQuestion};
use crate::progression::{CompletionOutcome, LessonKey, ProgressionEngine};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Theory,
    Quiz,
    Challenge,
    Complete,
}

/// A locked-in quiz answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizAnswer {
    pub selected: usize,
    pub correct: bool,
}

/// Result of finishing an attempt. `stars` is present only when the
/// completion went through (including replays of an already-completed
/// lesson).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCompletion {
    pub outcome: CompletionOutcome,
    pub stars: Option<u8>,
}

/// What an advance call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAdvance {
    NextQuestion(usize),
    ChallengePhase,
    NextChallenge(usize),
    Finished(SessionCompletion),
}

pub struct LessonSession<'a> {
    engine: &'a ProgressionEngine,
    lesson: &'a Lesson,
    user_id: String,
    key: LessonKey,
    phase: SessionPhase,
    current_question: usize,
    quiz_answers: Vec<Option<QuizAnswer>>,
    current_challenge: usize,
    challenge_runs: Vec<Option<RunReport>>,
    runner: SimulatedRunner,
    stars: Option<u8>,
    completing: bool,
}

impl<'a> LessonSession<'a> {
    pub fn new(
        engine: &'a ProgressionEngine,
        user_id: impl Into<String>,
        language_id: &str,
        lesson: &'a Lesson,
    ) -> Result<Self> {
        let key = LessonKey::new(language_id, &lesson.id)?;
        Ok(Self {
            engine,
            lesson,
            user_id: user_id.into(),
            key,
            phase: SessionPhase::Theory,
            current_question: 0,
            quiz_answers: vec![None; lesson.quiz.len()],
            current_challenge: 0,
            challenge_runs: vec![None; lesson.challenges.len()],
            runner: SimulatedRunner::new(),
            stars: None,
            completing: false,
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn lesson_key(&self) -> &LessonKey {
        &self.key
    }

    pub fn stars(&self) -> Option<u8> {
        self.stars
    }

    /// Leaves the theory phase. The only transition out of `Theory` apart
    /// from [`skip`](Self::skip). Lessons without quiz questions drop
    /// straight into the challenge phase, and theory-only lessons go to
    /// scoring.
    pub fn begin_quiz(&mut self) -> Result<SessionAdvance> {
        if self.phase != SessionPhase::Theory {
            bail!("Quiz can only be started from the theory phase");
        }
        if !self.lesson.quiz.is_empty() {
            self.phase = SessionPhase::Quiz;
            return Ok(SessionAdvance::NextQuestion(0));
        }
        if self.lesson.challenges.is_empty() {
            return Ok(SessionAdvance::Finished(self.finish()?));
        }
        self.phase = SessionPhase::Challenge;
        Ok(SessionAdvance::ChallengePhase)
    }

    pub fn current_question(&self) -> Option<(usize, &QuizQuestion)> {
        if self.phase != SessionPhase::Quiz {
            return None;
        }
        self.lesson
            .quiz
            .get(self.current_question)
            .map(|q| (self.current_question, q))
    }

    /// Locks in the answer for the current question. Answers are final:
    /// answering the same question twice is an error.
    pub fn answer_current_question(&mut self, selected: usize) -> Result<QuizAnswer> {
        if self.phase != SessionPhase::Quiz {
            bail!("Not in the quiz phase");
        }
        let question = &self.lesson.quiz[self.current_question];
        if selected >= question.options.len() {
            bail!(
                "Answer index {selected} out of range for question {}",
                self.current_question + 1
            );
        }
        if self.quiz_answers[self.current_question].is_some() {
            bail!("Question {} is already answered", self.current_question + 1);
        }
        let answer = QuizAnswer {
            selected,
            correct: selected == question.correct_answer,
        };
        self.quiz_answers[self.current_question] = Some(answer);
        Ok(answer)
    }

    /// Moves past the current question once it is answered. After the last
    /// question the session enters the challenge phase, or goes straight to
    /// scoring when the lesson has no challenges.
    pub fn advance_quiz(&mut self) -> Result<SessionAdvance> {
        if self.phase != SessionPhase::Quiz {
            bail!("Not in the quiz phase");
        }
        if self.quiz_answers[self.current_question].is_none() {
            bail!("Answer question {} before advancing", self.current_question + 1);
        }
        if self.current_question + 1 < self.lesson.quiz.len() {
            self.current_question += 1;
            return Ok(SessionAdvance::NextQuestion(self.current_question));
        }
        if self.lesson.challenges.is_empty() {
            return Ok(SessionAdvance::Finished(self.finish()?));
        }
        self.phase = SessionPhase::Challenge;
        Ok(SessionAdvance::ChallengePhase)
    }

    pub fn current_challenge(&self) -> Option<(usize, &Challenge)> {
        if self.phase != SessionPhase::Challenge {
            return None;
        }
        self.lesson
            .challenges
            .get(self.current_challenge)
            .map(|c| (self.current_challenge, c))
    }

    /// Runs the current challenge through the simulated runner and records
    /// the report. Reruns overwrite the previous report.
    pub fn run_current_challenge(&mut self, code: &str) -> Result<RunReport> {
        if self.phase != SessionPhase::Challenge {
            bail!("Not in the challenge phase");
        }
        let challenge = &self.lesson.challenges[self.current_challenge];
        let report = self.runner.run(code, &challenge.expected_output);
        self.challenge_runs[self.current_challenge] = Some(report.clone());
        Ok(report)
    }

    /// Hint for the current challenge; revealing it costs nothing.
    pub fn reveal_hint(&self) -> Result<&str> {
        if self.phase != SessionPhase::Challenge {
            bail!("Not in the challenge phase");
        }
        Ok(&self.lesson.challenges[self.current_challenge].hint)
    }

    /// Moves past the current challenge. At least one run is required; a
    /// failing verdict is not a blocker. After the last challenge the
    /// attempt is scored and completed.
    pub fn advance_challenge(&mut self) -> Result<SessionAdvance> {
        if self.phase != SessionPhase::Challenge {
            bail!("Not in the challenge phase");
        }
        if self.challenge_runs[self.current_challenge].is_none() {
            bail!(
                "Run challenge {} at least once before advancing",
                self.current_challenge + 1
            );
        }
        if self.current_challenge + 1 < self.lesson.challenges.len() {
            self.current_challenge += 1;
            return Ok(SessionAdvance::NextChallenge(self.current_challenge));
        }
        Ok(SessionAdvance::Finished(self.finish()?))
    }

    /// Skips the rest of the lesson from any phase and scores whatever was
    /// attempted; unattempted items count as incorrect.
    pub fn skip(&mut self) -> Result<SessionCompletion> {
        if self.phase == SessionPhase::Complete {
            bail!("Lesson attempt is already complete");
        }
        self.finish()
    }

    fn finish(&mut self) -> Result<SessionCompletion> {
        if self.phase == SessionPhase::Complete {
            bail!("Lesson attempt is already complete");
        }
        if self.completing {
            bail!("A completion request is already in flight for this attempt");
        }
        self.completing = true;
        let result = self.submit_completion();
        self.completing = false;
        result
    }

    fn submit_completion(&mut self) -> Result<SessionCompletion> {
        let stars = stars_for(self.total_score());
        let outcome = self.engine.complete_lesson(&self.user_id, &self.key)?;
        if outcome == CompletionOutcome::InsufficientCoins {
            // Stay in the current phase: the attempt is retryable once the
            // user has coins again, and nothing was charged.
            return Ok(SessionCompletion {
                outcome,
                stars: None,
            });
        }
        self.phase = SessionPhase::Complete;
        self.stars = Some(stars);
        Ok(SessionCompletion {
            outcome,
            stars: Some(stars),
        })
    }

    fn total_score(&self) -> f64 {
        let quiz_score = ratio_score(
            self.quiz_answers
                .iter()
                .filter(|a| matches!(a, Some(answer) if answer.correct))
                .count(),
            self.lesson.quiz.len(),
        );
        let challenge_score = ratio_score(
            self.challenge_runs
                .iter()
                .filter(|r| matches!(r, Some(report) if report.passed))
                .count(),
            self.lesson.challenges.len(),
        );
        (quiz_score + challenge_score) / 2.0
    }
}

fn ratio_score(correct: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        correct as f64 / total as f64 * 100.0
    }
}

/// Star rating for a combined score, always at least one star.
pub fn stars_for(total_score: f64) -> u8 {
    if total_score >= 90.0 {
        5
    } else if total_score >= 75.0 {
        4
    } else if total_score >= 60.0 {
        3
    } else if total_score >= 40.0 {
        2
    } else {
        1
    }
}
