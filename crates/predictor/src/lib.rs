mod classify;
mod confidence;
mod input;
mod priors;
mod tracker;

pub use classify::*;
pub use confidence::*;
pub use input::*;
pub use priors::*;
pub use tracker::*;

cfg_if::cfg_if! {
    if #[cfg(feature = "full")] {
        mod query;
        mod root;
        mod scheduler;
        mod subscription;

        pub use query::*;
        pub use root::*;
        pub use scheduler::*;
        pub use subscription::*;
    }
}
