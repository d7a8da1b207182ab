//! CLI subcommand implementations.

pub mod change;
pub mod export;
pub mod finalize;
pub mod geocode;
pub mod grid;
pub mod logs;
pub mod route;
pub mod status;
pub mod sync;
pub mod trip;
pub mod util;
