use sea_query::{
    ColumnDef, Index, IndexCreateStatement, Table, TableCreateStatement, TableDropStatement,
};

use crate::table::ForecastLog;

pub struct CreateTable;
pub struct CreateIdx1;

fn create_table() -> TableCreateStatement {
    Table::create()
        .table(ForecastLog::Table)
        .col(
            ColumnDef::new(ForecastLog::Id)
                .string()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(ForecastLog::HouseholdId).string().not_null())
        .col(ColumnDef::new(ForecastLog::ProductId).string().not_null())
        .col(
            ColumnDef::new(ForecastLog::GeneratedAt)
                .big_integer()
                .not_null(),
        )
        .col(
            ColumnDef::new(ForecastLog::ExpectedDaysLeft)
                .double()
                .not_null(),
        )
        .col(ColumnDef::new(ForecastLog::Level).string().not_null())
        .col(ColumnDef::new(ForecastLog::Confidence).double().not_null())
        .col(ColumnDef::new(ForecastLog::EventId).string().not_null())
        .to_owned()
}

fn drop_table() -> TableDropStatement {
    Table::drop().table(ForecastLog::Table).to_owned()
}

fn create_idx1() -> IndexCreateStatement {
    Index::create()
        .name("idx_forecast_log_pair_generated")
        .table(ForecastLog::Table)
        .col(ForecastLog::HouseholdId)
        .col(ForecastLog::ProductId)
        .col(ForecastLog::GeneratedAt)
        .to_owned()
}

#[async_trait::async_trait]
impl sqlx_migrator::Operation<sqlx::Sqlite> for CreateTable {
    async fn up(
        &self,
        connection: &mut sqlx::SqliteConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = create_table().to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }

    async fn down(
        &self,
        connection: &mut sqlx::SqliteConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = drop_table().to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl sqlx_migrator::Operation<sqlx::Sqlite> for CreateIdx1 {
    async fn up(
        &self,
        connection: &mut sqlx::SqliteConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = create_idx1().to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }

    async fn down(
        &self,
        connection: &mut sqlx::SqliteConnection,
    ) -> Result<(), sqlx_migrator::Error> {
        let statement = Index::drop()
            .name("idx_forecast_log_pair_generated")
            .table(ForecastLog::Table)
            .to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }
}
