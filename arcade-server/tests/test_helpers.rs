use arcade_core::AiOpponent;
use arcade_persistence::CustomerRepository;
use arcade_server::invites::InviteBoard;
use arcade_server::progression::ProgressionService;
use arcade_server::round_manager::RoundManager;
use arcade_server::websocket::ConnectionManager;
use arcade_types::{AnswerSet, Category, CustomerRef};
use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use std::time::Duration;

/// AI opponent whose upstream is always down, forfeiting every round.
pub struct UnreachableAi;

#[async_trait]
impl AiOpponent for UnreachableAi {
    async fn category_answers(&self, _letter: char) -> anyhow::Result<AnswerSet> {
        anyhow::bail!("no model in tests")
    }
}

pub fn test_customer(id: &str, name: &str) -> CustomerRef {
    CustomerRef {
        id: id.to_string(),
        display_name: name.to_string(),
    }
}

/// A sheet answering every category with the round letter itself, always
/// valid under first-letter checking.
pub fn letter_sheet(letter: char) -> AnswerSet {
    let mut answers = AnswerSet::default();
    for category in Category::ALL {
        answers.set(category, letter.to_string());
    }
    answers
}

/// Test setup that provides all necessary components
pub struct TestArcadeSetup {
    pub connection_manager: Arc<ConnectionManager>,
    pub invite_board: Arc<InviteBoard>,
    pub round_manager: Arc<RoundManager>,
    pub progression: Arc<ProgressionService>,
}

impl TestArcadeSetup {
    pub async fn new() -> Self {
        let db = arcade_persistence::connection::connect_to_memory_database()
            .await
            .unwrap();
        Migrator::up(&db, None).await.unwrap();
        let progression = Arc::new(ProgressionService::new(Arc::new(CustomerRepository::new(
            db,
        ))));

        Self {
            connection_manager: Arc::new(ConnectionManager::new()),
            invite_board: Arc::new(InviteBoard::new(Duration::from_secs(5))),
            round_manager: Arc::new(RoundManager::new(
                Arc::new(UnreachableAi),
                progression.clone(),
                Duration::from_secs(10),
            )),
            progression,
        }
    }

    /// Register the customers in the store so round scores have somewhere
    /// to land.
    pub async fn register_customers(&self, customers: &[(&str, &str)]) {
        for (id, name) in customers {
            self.progression
                .register(id, name, "cafe-01")
                .await
                .unwrap();
        }
    }
}
