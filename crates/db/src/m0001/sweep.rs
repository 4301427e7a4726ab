use sea_query::{
    ColumnDef, Index, IndexCreateStatement, Table, TableCreateStatement, TableDropStatement,
};

use crate::table::Sweep;

pub struct CreateTable;
pub struct CreateIdx1;

fn create_table() -> TableCreateStatement {
    Table::create()
        .table(Sweep::Table)
        .col(ColumnDef::new(Sweep::Id).string().not_null().primary_key())
        .col(ColumnDef::new(Sweep::HouseholdId).string().not_null())
        .col(ColumnDef::new(Sweep::ProductId).string().not_null())
        .col(
            ColumnDef::new(Sweep::AnniversaryWeekday)
                .small_integer()
                .not_null(),
        )
        .col(ColumnDef::new(Sweep::LastTickAt).big_integer())
        .to_owned()
}

fn drop_table() -> TableDropStatement {
    Table::drop().table(Sweep::Table).to_owned()
}

fn create_idx1() -> IndexCreateStatement {
    Index::create()
        .name("idx_sweep_weekday")
        .table(Sweep::Table)
        .col(Sweep::AnniversaryWeekday)
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
            .name("idx_sweep_weekday")
            .table(Sweep::Table)
            .to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }
}
