use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::customer::CustomerRef;

/// The seven fixed categories of the word game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Name,
    Family,
    City,
    Country,
    Animal,
    Food,
    Object,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Name,
        Category::Family,
        Category::City,
        Category::Country,
        Category::Animal,
        Category::Food,
        Category::Object,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::Name => "name",
            Category::Family => "family",
            Category::City => "city",
            Category::Country => "country",
            Category::Animal => "animal",
            Category::Food => "food",
            Category::Object => "object",
        }
    }
}

/// One participant's answers for a round. Every field defaults to an empty
/// string on deserialization, so a malformed or partial payload (an AI
/// opponent dropping keys, for instance) degrades to blank answers instead of
/// failing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct AnswerSet {
    pub name: String,
    pub family: String,
    pub city: String,
    pub country: String,
    pub animal: String,
    pub food: String,
    pub object: String,
}

impl AnswerSet {
    pub fn get(&self, category: Category) -> &str {
        match category {
            Category::Name => &self.name,
            Category::Family => &self.family,
            Category::City => &self.city,
            Category::Country => &self.country,
            Category::Animal => &self.animal,
            Category::Food => &self.food,
            Category::Object => &self.object,
        }
    }

    pub fn set(&mut self, category: Category, answer: impl Into<String>) {
        let slot = match category {
            Category::Name => &mut self.name,
            Category::Family => &mut self.family,
            Category::City => &mut self.city,
            Category::Country => &mut self.country,
            Category::Animal => &mut self.animal,
            Category::Food => &mut self.food,
            Category::Object => &mut self.object,
        };
        *slot = answer.into();
    }

    pub fn is_blank(&self) -> bool {
        Category::ALL
            .iter()
            .all(|&category| self.get(category).trim().is_empty())
    }
}

/// The other side of a round: the generative-AI stand-in or a real customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Opponent {
    Ai,
    Human { customer: CustomerRef },
}

impl Opponent {
    pub fn display_name(&self) -> &str {
        match self {
            Opponent::Ai => "AI",
            Opponent::Human { customer } => &customer.display_name,
        }
    }

    pub fn is_ai(&self) -> bool {
        matches!(self, Opponent::Ai)
    }
}

/// Point totals for one finished round, from the local side's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoundScores {
    pub mine: u32,
    pub theirs: u32,
}

impl RoundScores {
    pub fn conclusion(&self) -> RoundConclusion {
        match self.mine.cmp(&self.theirs) {
            std::cmp::Ordering::Greater => RoundConclusion::Win,
            std::cmp::Ordering::Less => RoundConclusion::Lose,
            std::cmp::Ordering::Equal => RoundConclusion::Draw,
        }
    }

    /// The same totals seen from the opposite side.
    pub fn flipped(&self) -> RoundScores {
        RoundScores {
            mine: self.theirs,
            theirs: self.mine,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RoundConclusion {
    Win,
    Lose,
    Draw,
}
