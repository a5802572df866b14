use arcade_core::{AiOpponent, WordRound};
use arcade_types::{AnswerSet, Category, CustomerRef, Opponent};
use async_trait::async_trait;

/// Creates a round against the AI with a known letter and timer
pub fn create_ai_round(letter: char, timer_seconds: u32) -> WordRound {
    WordRound::with_letter(Opponent::Ai, timer_seconds, letter)
}

/// Creates a round against another customer with a known letter
pub fn create_versus_round(letter: char, opponent_name: &str) -> WordRound {
    let opponent = Opponent::Human {
        customer: CustomerRef {
            id: format!("09120000{}", opponent_name.len()),
            display_name: opponent_name.to_string(),
        },
    };
    WordRound::with_letter(opponent, 60, letter)
}

/// Creates an answer sheet with every category filled from the given words
pub fn full_answers(words: [&str; 7]) -> AnswerSet {
    let mut answers = AnswerSet::default();
    for (category, word) in Category::ALL.iter().zip(words) {
        answers.set(*category, word.to_string());
    }
    answers
}

/// AI opponent that always returns the same prepared sheet
pub struct ScriptedAi {
    pub answers: AnswerSet,
}

#[async_trait]
impl AiOpponent for ScriptedAi {
    async fn category_answers(&self, _letter: char) -> anyhow::Result<AnswerSet> {
        Ok(self.answers.clone())
    }
}

/// AI opponent whose upstream call always fails
pub struct UnreachableAi;

#[async_trait]
impl AiOpponent for UnreachableAi {
    async fn category_answers(&self, _letter: char) -> anyhow::Result<AnswerSet> {
        anyhow::bail!("upstream model unavailable")
    }
}
