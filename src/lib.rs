// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod assets;
pub mod background;
pub mod config;
pub mod emoji;
pub mod error;
pub mod gesture;
pub mod host;
pub mod kiosk;
pub mod logging;
pub mod node_machine;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod timing;
pub mod ui;
pub mod watchdog;

pub use error::{KioskError, Result};
