mod migrate;
mod tick;
mod worker;

pub use migrate::*;
pub use tick::*;
pub use worker::*;
