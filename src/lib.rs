// Library surface for the game cores, persistence and the headless runtime.
// Terminal rendering lives with the binary in main.rs / ui.rs.
pub mod app_dirs;
pub mod clock;
pub mod coin;
pub mod config;
pub mod error;
pub mod finger;
pub mod runtime;
pub mod spinner;
pub mod store;
pub mod timer;
pub mod usage;

pub use error::{GameError, Result};
