// void-common/src/lib.rs
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod model;

// Re-export key types
pub use catalog::Catalog;
pub use config::Config;
pub use error::{Result, VoidError};
pub use fetch::{Downloader, Offline};
pub use model::{AppRecord, ArchiveKind};
