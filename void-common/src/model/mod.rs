// void-common/src/model/mod.rs
pub mod app;
pub mod archive;

pub use app::{AppRecord, APPIMAGE_ENTRY_POINT};
pub use archive::ArchiveKind;
