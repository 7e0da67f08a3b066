// void-net/src/lib.rs
pub mod http;
pub mod validation;

pub use http::HttpDownloader;
pub use validation::{download_file_name, validate_url};
