use std::sync::Arc;
use tracing::info;

use arcade_persistence::{CustomerRepository, LeaderboardEntry};
use arcade_types::{Customer, CustomerId, Progression};

/// Progression writes for one customer must not interleave, or two rounds
/// finishing together could each read the same total and lose one of the
/// scores. A per-customer mutex serializes them; different customers still
/// write concurrently.
pub struct ProgressionService {
    repository: Arc<CustomerRepository>,
    customer_locks: dashmap::DashMap<CustomerId, Arc<tokio::sync::Mutex<()>>>,
}

impl ProgressionService {
    pub fn new(repository: Arc<CustomerRepository>) -> Self {
        Self {
            repository,
            customer_locks: dashmap::DashMap::new(),
        }
    }

    fn lock_for(&self, customer_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.customer_locks
            .entry(customer_id.to_string())
            .or_default()
            .clone()
    }

    pub async fn register(
        &self,
        customer_id: &str,
        display_name: &str,
        restaurant_id: &str,
    ) -> anyhow::Result<Customer> {
        self.repository
            .find_or_create(customer_id, display_name, restaurant_id)
            .await
    }

    pub async fn get_progression(&self, customer_id: &str) -> anyhow::Result<Option<Progression>> {
        let customer = self.repository.find_by_id(customer_id).await?;
        Ok(customer.map(|c| c.progression))
    }

    pub async fn apply_round_score(
        &self,
        customer_id: &str,
        round_score: u32,
    ) -> anyhow::Result<Progression> {
        let lock = self.lock_for(customer_id);
        let _guard = lock.lock().await;

        let progression = self
            .repository
            .apply_round_score(customer_id, round_score)
            .await?;

        info!(
            "Applied round score {} for {}: total {}, level {}",
            round_score, customer_id, progression.total_score, progression.level
        );
        Ok(progression)
    }

    pub async fn leaderboard(&self, limit: u64) -> anyhow::Result<Vec<LeaderboardEntry>> {
        self.repository.get_leaderboard(limit).await
    }
}
