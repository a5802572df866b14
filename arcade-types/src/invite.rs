use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::customer::{CustomerId, CustomerRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum InviteStatus {
    Pending,
    Accepted,
    Declined,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InviteSettings {
    /// Countdown length both participants agree on for the round.
    pub timer_seconds: u32,
}

impl Default for InviteSettings {
    fn default() -> Self {
        Self { timer_seconds: 30 }
    }
}

/// A directed, time-limited word-game proposal from one customer to another.
/// At most one invite exists per ordered (from, to) pair; a resolved invite
/// lingers briefly so both clients can react to its terminal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameInvite {
    pub from: CustomerRef,
    pub to: CustomerRef,
    pub status: InviteStatus,
    pub settings: InviteSettings,
}

impl GameInvite {
    pub fn new(from: CustomerRef, to: CustomerRef, settings: InviteSettings) -> Self {
        Self {
            from,
            to,
            status: InviteStatus::Pending,
            settings,
        }
    }

    pub fn involves(&self, customer_id: &str) -> bool {
        self.from.id == customer_id || self.to.id == customer_id
    }

    /// The other participant, from `customer_id`'s point of view.
    pub fn opponent_of(&self, customer_id: &str) -> Option<&CustomerRef> {
        if self.from.id == customer_id {
            Some(&self.to)
        } else if self.to.id == customer_id {
            Some(&self.from)
        } else {
            None
        }
    }

    pub fn pair(&self) -> (CustomerId, CustomerId) {
        (self.from.id.clone(), self.to.id.clone())
    }
}
