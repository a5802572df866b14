use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::info;

use arcade_types::{CustomerId, CustomerRef, GameInvite, InviteSettings, InviteStatus};

/// Countdown lengths the clients offer when composing an invite.
pub const TIMER_OPTIONS: [u32; 4] = [30, 45, 60, 90];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InviteError {
    #[error("Cannot invite yourself")]
    SelfInvite,
    #[error("Invalid timer length: {0} seconds")]
    InvalidTimer(u32),
    #[error("Invite not found")]
    NotFound,
    #[error("Invite already resolved")]
    AlreadyResolved,
}

#[derive(Debug, Clone)]
struct TrackedInvite {
    invite: GameInvite,
    /// Set once the invite leaves `Pending`; the sweeper drops it after the
    /// retention window so both clients see the terminal status first.
    resolved_at: Option<Instant>,
}

/// All open and recently resolved invites, keyed by the directed
/// (sender, recipient) pair. Re-sending replaces the previous invite for the
/// same pair instead of stacking a second one.
pub struct InviteBoard {
    invites: RwLock<HashMap<(CustomerId, CustomerId), TrackedInvite>>,
    retention: Duration,
}

impl InviteBoard {
    pub fn new(retention: Duration) -> Self {
        Self {
            invites: RwLock::new(HashMap::new()),
            retention,
        }
    }

    pub async fn send_invite(
        &self,
        from: CustomerRef,
        to: CustomerRef,
        timer_seconds: u32,
    ) -> Result<GameInvite, InviteError> {
        if from.id == to.id {
            return Err(InviteError::SelfInvite);
        }
        if !TIMER_OPTIONS.contains(&timer_seconds) {
            return Err(InviteError::InvalidTimer(timer_seconds));
        }

        let invite = GameInvite::new(from, to, InviteSettings { timer_seconds });
        let mut invites = self.invites.write().await;
        invites.insert(
            invite.pair(),
            TrackedInvite {
                invite: invite.clone(),
                resolved_at: None,
            },
        );

        info!(
            "Invite sent from {} to {} ({}s timer)",
            invite.from.id, invite.to.id, timer_seconds
        );
        Ok(invite)
    }

    /// Move a pending invite into a terminal status. Accept and decline come
    /// from the recipient, cancel from the sender; the board only checks that
    /// the invite exists and is still open.
    pub async fn resolve(
        &self,
        from_id: &str,
        to_id: &str,
        status: InviteStatus,
    ) -> Result<GameInvite, InviteError> {
        debug_assert_ne!(status, InviteStatus::Pending);

        let mut invites = self.invites.write().await;
        let tracked = invites
            .get_mut(&(from_id.to_string(), to_id.to_string()))
            .ok_or(InviteError::NotFound)?;

        if tracked.invite.status != InviteStatus::Pending {
            return Err(InviteError::AlreadyResolved);
        }

        tracked.invite.status = status;
        tracked.resolved_at = Some(Instant::now());

        info!("Invite {} -> {} resolved as {:?}", from_id, to_id, status);
        Ok(tracked.invite.clone())
    }

    /// Invites waiting on `customer_id`'s answer.
    pub async fn pending_for(&self, customer_id: &str) -> Vec<GameInvite> {
        let invites = self.invites.read().await;
        invites
            .values()
            .filter(|t| t.invite.status == InviteStatus::Pending && t.invite.to.id == customer_id)
            .map(|t| t.invite.clone())
            .collect()
    }

    /// Cancel every open invite the customer is part of, in either direction.
    /// Used when they disconnect; returns the invites so the other side can
    /// be told.
    pub async fn cancel_involving(&self, customer_id: &str) -> Vec<GameInvite> {
        let mut invites = self.invites.write().await;
        let now = Instant::now();
        let mut cancelled = Vec::new();

        for tracked in invites.values_mut() {
            if tracked.invite.status == InviteStatus::Pending
                && tracked.invite.involves(customer_id)
            {
                tracked.invite.status = InviteStatus::Cancelled;
                tracked.resolved_at = Some(now);
                cancelled.push(tracked.invite.clone());
            }
        }

        cancelled
    }

    /// Drop resolved invites once they have lingered past the retention
    /// window. Returns how many were removed.
    pub async fn sweep_resolved(&self) -> usize {
        let mut invites = self.invites.write().await;
        let before = invites.len();
        let retention = self.retention;
        invites.retain(|_, tracked| match tracked.resolved_at {
            Some(at) => at.elapsed() < retention,
            None => true,
        });
        before - invites.len()
    }

    pub async fn invite_count(&self) -> usize {
        let invites = self.invites.read().await;
        invites.len()
    }
}
