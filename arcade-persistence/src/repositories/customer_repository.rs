use anyhow::Result;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder, QuerySelect};

use crate::entities::{customers, prelude::*};
use arcade_types::{Customer, CustomerId, Progression};

pub struct CustomerRepository {
    db: DatabaseConnection,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LeaderboardEntry {
    pub customer: Customer,
    pub rank: u32,
}

impl CustomerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_customer(model: customers::Model) -> Customer {
        Customer {
            id: model.id,
            display_name: model.display_name,
            restaurant_id: model.restaurant_id,
            progression: Progression {
                level: model.level.max(1) as u32,
                total_score: model.total_score.max(0) as u32,
                high_score: model.high_score.max(0) as u32,
            },
            joined_at: model.created_at.to_rfc3339(),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Customer>> {
        let customer_model = Customers::find_by_id(id).one(&self.db).await?;
        Ok(customer_model.map(Self::model_to_customer))
    }

    pub async fn create_customer(
        &self,
        id: CustomerId,
        display_name: String,
        restaurant_id: String,
    ) -> Result<Customer> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = chrono::Utc::now().into();

        let customer_model = customers::ActiveModel {
            id: sea_orm::ActiveValue::Set(id),
            display_name: sea_orm::ActiveValue::Set(display_name),
            restaurant_id: sea_orm::ActiveValue::Set(restaurant_id),
            level: sea_orm::ActiveValue::Set(1),
            total_score: sea_orm::ActiveValue::Set(0),
            high_score: sea_orm::ActiveValue::Set(0),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
        };

        let saved_model = Customers::insert(customer_model).exec(&self.db).await?;

        // Fetch the created customer
        let created = Customers::find_by_id(saved_model.last_insert_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created customer"))?;

        Ok(Self::model_to_customer(created))
    }

    /// Returning customers keep their record; new phone numbers get a fresh
    /// one. The display name follows whatever the customer typed last.
    pub async fn find_or_create(
        &self,
        id: &str,
        display_name: &str,
        restaurant_id: &str,
    ) -> Result<Customer> {
        if let Some(existing) = Customers::find_by_id(id).one(&self.db).await? {
            if existing.display_name != display_name {
                let renamed = customers::ActiveModel {
                    id: sea_orm::ActiveValue::Unchanged(existing.id.clone()),
                    display_name: sea_orm::ActiveValue::Set(display_name.to_string()),
                    updated_at: sea_orm::ActiveValue::Set(chrono::Utc::now().into()),
                    ..Default::default()
                };
                let updated = Customers::update(renamed).exec(&self.db).await?;
                return Ok(Self::model_to_customer(updated));
            }
            return Ok(Self::model_to_customer(existing));
        }

        self.create_customer(
            id.to_string(),
            display_name.to_string(),
            restaurant_id.to_string(),
        )
        .await
    }

    /// Fold a finished round score into the stored progression and return the
    /// updated record. Level is recomputed from the new cumulative total.
    pub async fn apply_round_score(&self, id: &str, round_score: u32) -> Result<Progression> {
        let customer = Customers::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Customer not found"))?;

        let mut progression = Progression {
            level: customer.level.max(1) as u32,
            total_score: customer.total_score.max(0) as u32,
            high_score: customer.high_score.max(0) as u32,
        };
        progression.apply_round(round_score);

        let updated = customers::ActiveModel {
            id: sea_orm::ActiveValue::Unchanged(customer.id),
            display_name: sea_orm::ActiveValue::Unchanged(customer.display_name),
            restaurant_id: sea_orm::ActiveValue::Unchanged(customer.restaurant_id),
            level: sea_orm::ActiveValue::Set(progression.level as i32),
            total_score: sea_orm::ActiveValue::Set(progression.total_score as i32),
            high_score: sea_orm::ActiveValue::Set(progression.high_score as i32),
            created_at: sea_orm::ActiveValue::Unchanged(customer.created_at),
            updated_at: sea_orm::ActiveValue::Set(chrono::Utc::now().into()),
        };

        Customers::update(updated).exec(&self.db).await?;
        Ok(progression)
    }

    pub async fn get_leaderboard(&self, limit: u64) -> Result<Vec<LeaderboardEntry>> {
        let customers = Customers::find()
            .order_by_desc(customers::Column::TotalScore)
            .limit(limit)
            .all(&self.db)
            .await?;

        let leaderboard = customers
            .into_iter()
            .enumerate()
            .map(|(index, model)| LeaderboardEntry {
                customer: Self::model_to_customer(model),
                rank: (index + 1) as u32,
            })
            .collect();

        Ok(leaderboard)
    }
}
