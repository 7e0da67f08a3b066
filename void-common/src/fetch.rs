use std::path::Path;

use crate::error::{Result, VoidError};

/// Fetches a remote artifact into a local file.
///
/// Implementations must leave no partial file at `dest` when they fail.
pub trait Downloader {
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

impl<D: Downloader + ?Sized> Downloader for &D {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        (**self).download(url, dest)
    }
}

/// Refuses every download; for operations that only inspect local state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl Downloader for Offline {
    fn download(&self, url: &str, _dest: &Path) -> Result<()> {
        Err(VoidError::Generic(format!(
            "Refusing to download {url} in offline mode"
        )))
    }
}
