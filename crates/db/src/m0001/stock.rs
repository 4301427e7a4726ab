use sea_query::{
    ColumnDef, Index, IndexCreateStatement, Table, TableCreateStatement, TableDropStatement,
};

use crate::table::Stock;

pub struct CreateTable;
pub struct CreateIdx1;

fn create_table() -> TableCreateStatement {
    Table::create()
        .table(Stock::Table)
        .col(ColumnDef::new(Stock::Id).string().not_null().primary_key())
        .col(ColumnDef::new(Stock::HouseholdId).string().not_null())
        .col(ColumnDef::new(Stock::ProductId).string().not_null())
        .col(ColumnDef::new(Stock::DaysLeft).double().not_null())
        .col(ColumnDef::new(Stock::Level).string().not_null())
        .col(ColumnDef::new(Stock::LastSource).string().not_null())
        .col(ColumnDef::new(Stock::UpdatedAt).big_integer().not_null())
        .to_owned()
}

fn drop_table() -> TableDropStatement {
    Table::drop().table(Stock::Table).to_owned()
}

fn create_idx1() -> IndexCreateStatement {
    Index::create()
        .name("idx_stock_household")
        .table(Stock::Table)
        .col(Stock::HouseholdId)
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
            .name("idx_stock_household")
            .table(Stock::Table)
            .to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }
}
