use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Customers::DisplayName).string().not_null())
                    .col(ColumnDef::new(Customers::RestaurantId).string().not_null())
                    .col(
                        ColumnDef::new(Customers::Level)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Customers::TotalScore)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Customers::HighScore)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Customers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Customers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index on total_score for leaderboard queries
        manager
            .create_index(
                Index::create()
                    .name("idx_customers_total_score")
                    .table(Customers::Table)
                    .col(Customers::TotalScore)
                    .to_owned(),
            )
            .await?;

        // Create index on restaurant_id for per-restaurant listings
        manager
            .create_index(
                Index::create()
                    .name("idx_customers_restaurant_id")
                    .table(Customers::Table)
                    .col(Customers::RestaurantId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    DisplayName,
    RestaurantId,
    Level,
    TotalScore,
    HighScore,
    CreatedAt,
    UpdatedAt,
}
