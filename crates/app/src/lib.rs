pub mod config;
pub mod render;
pub mod session;

pub use config::{Config, ConfigError};
pub use session::{CorrectionError, Session};
