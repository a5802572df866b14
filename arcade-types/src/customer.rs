use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Opaque customer identity. The original registration flow keys customers by
/// phone number, so this stays a string rather than a uuid.
pub type CustomerId = String;

/// Cumulative-score cutoffs defining level boundaries, shared by both
/// mini-games. `level == number of thresholds <= total_score`, floor 1.
pub const LEVEL_THRESHOLDS: [u32; 11] = [
    0, 200, 500, 1000, 2000, 3500, 5000, 7500, 10000, 15000, 20000,
];

pub fn level_for_total_score(total_score: u32) -> u32 {
    let reached = LEVEL_THRESHOLDS
        .iter()
        .filter(|&&threshold| threshold <= total_score)
        .count() as u32;
    reached.max(1)
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: CustomerId,
    pub display_name: String,
    pub restaurant_id: String,
    pub progression: Progression,
    pub joined_at: String, // ISO 8601 string
}

/// Lightweight identity used inside invites and rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerRef {
    pub id: CustomerId,
    pub display_name: String,
}

impl From<&Customer> for CustomerRef {
    fn from(customer: &Customer) -> Self {
        CustomerRef {
            id: customer.id.clone(),
            display_name: customer.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Progression {
    pub level: u32,
    pub total_score: u32,
    pub high_score: u32,
}

impl Progression {
    pub fn new() -> Self {
        Self {
            level: 1,
            total_score: 0,
            high_score: 0,
        }
    }

    /// Fold one finished game/round score into the record. `total_score` only
    /// ever grows; `high_score` tracks the best single round, not the total.
    pub fn apply_round(&mut self, round_score: u32) {
        self.total_score += round_score;
        self.high_score = self.high_score.max(round_score);
        self.level = level_for_total_score(self.total_score);
    }
}

impl Default for Progression {
    fn default() -> Self {
        Self::new()
    }
}
