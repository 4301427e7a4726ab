mod command;
mod date;
pub mod pantry;

pub use command::*;
pub use date::*;
use evento::Executor;

#[derive(Clone)]
pub struct State<E: Executor> {
    pub executor: E,
    pub read_db: sqlx::SqlitePool,
    pub write_db: sqlx::SqlitePool,
}
