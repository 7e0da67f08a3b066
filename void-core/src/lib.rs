// void-core/src/lib.rs
pub mod classify;
pub mod cleanup;
pub mod fs_util;
pub mod inspect;
pub mod install;
pub mod link;

// Re-export key types for easier use by the CLI crate
pub use classify::{classify, sniff_kind};
pub use install::locate::{locate, ExecutableCandidate};
pub use install::{InstallOptions, InstallOutcome, InstallState, Installer};
pub use link::health::HealthReport;
pub use link::LinkManager;
