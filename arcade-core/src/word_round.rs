use anyhow::{Result, anyhow};
use arcade_types::{AnswerSet, Category, Opponent, RoundConclusion, RoundScores};
use async_trait::async_trait;
use rand::Rng;
use tracing::warn;

use crate::scoring::score_round;

/// The alphabet the round letter is drawn from.
pub const PERSIAN_ALPHABET: [char; 32] = [
    'ا', 'ب', 'پ', 'ت', 'ث', 'ج', 'چ', 'ح', 'خ', 'د', 'ذ', 'ر', 'ز', 'ژ', 'س', 'ش', 'ص', 'ض',
    'ط', 'ظ', 'ع', 'غ', 'ف', 'ق', 'ک', 'گ', 'ل', 'م', 'ن', 'و', 'ه', 'ی',
];

pub fn random_letter<R: Rng + ?Sized>(rng: &mut R) -> char {
    PERSIAN_ALPHABET[rng.random_range(0..PERSIAN_ALPHABET.len())]
}

/// External capability that answers every category for a starting letter.
#[async_trait]
pub trait AiOpponent: Send + Sync {
    async fn category_answers(&self, letter: char) -> Result<AnswerSet>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    Playing,
    Scoring,
    Finished,
}

/// One round of the category word game, seen from the local participant.
///
/// `Playing -> Scoring` happens on timer expiry or an explicit stop, both
/// idempotent. Scoring waits until the opponent's answers are available, then
/// `try_score` produces the totals exactly once.
#[derive(Debug)]
pub struct WordRound {
    letter: char,
    opponent: Opponent,
    timer_seconds: u32,
    remaining_seconds: u32,
    my_answers: AnswerSet,
    opponent_answers: Option<AnswerSet>,
    phase: RoundPhase,
    scores: Option<RoundScores>,
}

impl WordRound {
    pub fn new<R: Rng + ?Sized>(opponent: Opponent, timer_seconds: u32, rng: &mut R) -> Self {
        Self::with_letter(opponent, timer_seconds, random_letter(rng))
    }

    pub fn with_letter(opponent: Opponent, timer_seconds: u32, letter: char) -> Self {
        Self {
            letter,
            opponent,
            timer_seconds,
            remaining_seconds: timer_seconds,
            my_answers: AnswerSet::default(),
            opponent_answers: None,
            phase: RoundPhase::Playing,
            scores: None,
        }
    }

    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn opponent(&self) -> &Opponent {
        &self.opponent
    }

    pub fn timer_seconds(&self) -> u32 {
        self.timer_seconds
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn my_answers(&self) -> &AnswerSet {
        &self.my_answers
    }

    pub fn opponent_answers(&self) -> Option<&AnswerSet> {
        self.opponent_answers.as_ref()
    }

    pub fn scores(&self) -> Option<RoundScores> {
        self.scores
    }

    pub fn conclusion(&self) -> Option<RoundConclusion> {
        self.scores.map(|s| s.conclusion())
    }

    /// Edit one of the local answers. Rejected once the round left `Playing`.
    pub fn set_answer(&mut self, category: Category, answer: impl Into<String>) -> Result<()> {
        if self.phase != RoundPhase::Playing {
            return Err(anyhow!("answers are locked after the round stops"));
        }
        self.my_answers.set(category, answer);
        Ok(())
    }

    /// Advance the countdown by one second; at zero the round stops itself.
    pub fn tick_second(&mut self) {
        if self.phase != RoundPhase::Playing {
            return;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.stop();
        }
    }

    /// Leave `Playing` for `Scoring`. Safe to call any number of times; timer
    /// expiry and the stop button may race.
    pub fn stop(&mut self) {
        if self.phase == RoundPhase::Playing {
            self.phase = RoundPhase::Scoring;
        }
    }

    /// Resolve an AI opponent's answers. Any adapter failure counts as the AI
    /// forfeiting every category: the round continues with blank answers.
    pub async fn resolve_ai_opponent(&mut self, ai: &dyn AiOpponent) -> Result<()> {
        if !self.opponent.is_ai() {
            return Err(anyhow!("opponent is not the AI stand-in"));
        }
        if self.phase != RoundPhase::Scoring || self.opponent_answers.is_some() {
            return Ok(());
        }

        let answers = match ai.category_answers(self.letter).await {
            Ok(answers) => answers,
            Err(e) => {
                warn!("AI opponent failed for letter '{}': {e:#}", self.letter);
                AnswerSet::default()
            }
        };
        self.opponent_answers = Some(answers);
        Ok(())
    }

    /// Deliver a human opponent's answers from the session channel.
    pub fn receive_opponent_answers(&mut self, answers: AnswerSet) {
        if self.phase == RoundPhase::Finished {
            return;
        }
        self.opponent_answers = Some(answers);
    }

    /// Score the round once both answer sets are present. Returns `Some` on
    /// the single transition into `Finished`, `None` otherwise, so callers can
    /// report the result exactly once.
    pub fn try_score(&mut self) -> Option<RoundScores> {
        if self.phase != RoundPhase::Scoring {
            return None;
        }
        let theirs = self.opponent_answers.as_ref()?;

        let scores = score_round(self.letter, &self.my_answers, theirs);
        self.scores = Some(scores);
        self.phase = RoundPhase::Finished;
        Some(scores)
    }
}
