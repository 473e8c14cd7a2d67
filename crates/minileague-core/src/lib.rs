// Library root: re-exports all modules so the CLI and integration tests can
// reach the crate's public API.

pub mod app;
pub mod breakdown;
pub mod cache;
pub mod config;
pub mod error;
pub mod league;
pub mod model;
pub mod protocol;
pub mod source;
pub mod standings;
pub mod stats;
pub mod upstream;

#[cfg(test)]
mod test_support;

pub use app::App;
pub use error::{LeagueError, Result};
