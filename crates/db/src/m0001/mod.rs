mod audit_log;
mod forecast_log;
mod stock;
mod sweep;

use sqlx_migrator::vec_box;

pub struct Migration;

sqlx_migrator::sqlite_migration!(
    Migration,
    "restock",
    "m0001",
    vec_box![],
    vec_box![
        stock::CreateTable,
        stock::CreateIdx1,
        audit_log::CreateTable,
        audit_log::CreateIdx1,
        forecast_log::CreateTable,
        forecast_log::CreateIdx1,
        sweep::CreateTable,
        sweep::CreateIdx1
    ]
);
