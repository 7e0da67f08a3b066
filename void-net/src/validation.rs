use url::Url;
use void_common::error::{Result, VoidError};

/// Name used for staged downloads whose URL does not end in a usable file name.
pub const PLACEHOLDER_DOWNLOAD_NAME: &str = "temp_download.archive";

/// Validates a download URL. Only `http`, `https` and `file` are accepted.
pub fn validate_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str)
        .map_err(|e| VoidError::ValidationError(format!("Failed to parse URL '{url_str}': {e}")))?;
    match url.scheme() {
        "https" | "http" | "file" => Ok(url),
        other => Err(VoidError::ValidationError(format!(
            "Invalid URL scheme for '{url_str}': expected http(s) or file, got '{other}'"
        ))),
    }
}

/// File name for a staged download, taken from the URL's final path segment.
///
/// Segments carrying query-string characters (or nothing at all) cannot be used as a
/// file name and are replaced by [`PLACEHOLDER_DOWNLOAD_NAME`].
pub fn download_file_name(url: &str) -> String {
    let last = url.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    if last.is_empty() || last.contains(['?', '&', '=', '#']) || last.contains(':') {
        PLACEHOLDER_DOWNLOAD_NAME.to_string()
    } else {
        last.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_web_and_file_schemes() {
        assert!(validate_url("https://example.com/a.tar.gz").is_ok());
        assert!(validate_url("file:///tmp/a.tar.gz").is_ok());
        assert!(matches!(
            validate_url("ftp://example.com/a.tar.gz"),
            Err(VoidError::ValidationError(_))
        ));
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn file_name_from_last_segment() {
        assert_eq!(
            download_file_name("https://example.com/dl/tool-1.0.tar.gz"),
            "tool-1.0.tar.gz"
        );
        assert_eq!(
            download_file_name("https://discord.com/api/download?platform=linux&format=tar.gz"),
            PLACEHOLDER_DOWNLOAD_NAME
        );
        assert_eq!(
            download_file_name("https://example.com/"),
            "example.com"
        );
        assert_eq!(download_file_name("https://"), PLACEHOLDER_DOWNLOAD_NAME);
    }
}
