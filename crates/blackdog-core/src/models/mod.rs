//! Data models for BlackDog.

mod plugin;
mod stage;

pub use plugin::*;
pub use stage::*;
