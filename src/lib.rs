pub mod arith;
pub mod changes;
pub mod changeset;
pub mod ci;
pub mod config;
pub mod delay;
pub mod error;
pub mod git;
pub mod release;
pub mod size_check;
pub mod version;

pub use arith::{add, multiply};
pub use delay::{delay, delay_until_cancelled, spawn_delay};
pub use error::{Error, Result};
