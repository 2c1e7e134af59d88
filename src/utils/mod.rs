//! Utility modules for error handling, configuration and file naming

pub mod config;
pub mod error;
pub mod organizer;
pub mod platform;

// Re-export for convenience
pub use config::AppSettings;
pub use error::{AcfunError, Result};
pub use organizer::{part_file_name, sanitize_filename};
