use sea_query::{
    ColumnDef, Index, IndexCreateStatement, Table, TableCreateStatement, TableDropStatement,
};

use crate::table::AuditLog;

pub struct CreateTable;
pub struct CreateIdx1;

fn create_table() -> TableCreateStatement {
    Table::create()
        .table(AuditLog::Table)
        .col(
            ColumnDef::new(AuditLog::Id)
                .string()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(AuditLog::HouseholdId).string().not_null())
        .col(ColumnDef::new(AuditLog::ProductId).string().not_null())
        .col(ColumnDef::new(AuditLog::Kind).string().not_null())
        .col(ColumnDef::new(AuditLog::Reason).string())
        .col(ColumnDef::new(AuditLog::Note).string())
        .col(ColumnDef::new(AuditLog::At).big_integer().not_null())
        .col(ColumnDef::new(AuditLog::DaysBefore).double().not_null())
        .col(ColumnDef::new(AuditLog::DaysAfter).double().not_null())
        .col(ColumnDef::new(AuditLog::MeanBefore).double().not_null())
        .col(ColumnDef::new(AuditLog::MeanAfter).double().not_null())
        .col(ColumnDef::new(AuditLog::IdempotencyKey).string())
        .col(ColumnDef::new(AuditLog::OutOfOrder).boolean().not_null())
        .to_owned()
}

fn drop_table() -> TableDropStatement {
    Table::drop().table(AuditLog::Table).to_owned()
}

fn create_idx1() -> IndexCreateStatement {
    Index::create()
        .name("idx_audit_log_pair_at")
        .table(AuditLog::Table)
        .col(AuditLog::HouseholdId)
        .col(AuditLog::ProductId)
        .col(AuditLog::At)
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
            .name("idx_audit_log_pair_at")
            .table(AuditLog::Table)
            .to_string(sea_query::SqliteQueryBuilder);
        sqlx::query(&statement).execute(connection).await?;

        Ok(())
    }
}
