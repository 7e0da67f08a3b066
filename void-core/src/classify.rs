// void-core/src/classify.rs
//! Maps a source URL to an [`ArchiveKind`], and sniffs file contents after a failed
//! extraction to suggest the kind the artifact really is.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;
use url::Url;
use void_common::model::ArchiveKind;

const FALLBACK_KIND: ArchiveKind = ArchiveKind::TarGz;

// Suffix checks run in this order; `.tar.gz` must not shadow `.tar.xz` and friends.
const SUFFIXES: &[(&str, ArchiveKind)] = &[
    (".zip", ArchiveKind::Zip),
    (".deb", ArchiveKind::Deb),
    (".appimage", ArchiveKind::AppImage),
    (".tar.xz", ArchiveKind::TarXz),
    (".tar.bz2", ArchiveKind::TarBz2),
    (".tar.gz", ArchiveKind::TarGz),
    (".tgz", ArchiveKind::TarGz),
];

// Download APIs that encode the format as a path component, e.g. `/linux/appimage/x64`.
const SEGMENT_TOKENS: &[(&str, ArchiveKind)] = &[
    ("deb", ArchiveKind::Deb),
    ("appimage", ArchiveKind::AppImage),
    ("zip", ArchiveKind::Zip),
    ("tar.xz", ArchiveKind::TarXz),
    ("tar.bz2", ArchiveKind::TarBz2),
    ("tar.gz", ArchiveKind::TarGz),
    ("tgz", ArchiveKind::TarGz),
];

/// Classifies a download. An explicit `hint` always wins; otherwise the URL's file
/// suffix, then its path segments decide, falling back to `tar.gz`.
///
/// `raw-binary` is never inferred from a URL.
pub fn classify(url: &str, hint: Option<ArchiveKind>) -> ArchiveKind {
    if let Some(kind) = hint {
        debug!("Using explicit archive kind '{}' for {}", kind, url);
        return kind;
    }

    let segments = path_segments(url);

    if let Some(last) = segments.last() {
        let last = last.to_ascii_lowercase();
        if let Some((_, kind)) = SUFFIXES.iter().find(|(suffix, _)| last.ends_with(suffix)) {
            debug!("Classified {} as '{}' from file suffix", url, kind);
            return *kind;
        }
    }

    for (token, kind) in SEGMENT_TOKENS {
        if segments.iter().any(|seg| seg.eq_ignore_ascii_case(token)) {
            debug!("Classified {} as '{}' from path segment '{}'", url, kind, token);
            return *kind;
        }
    }

    debug!(
        "Could not classify {} from its URL; assuming '{}'",
        url, FALLBACK_KIND
    );
    FALLBACK_KIND
}

/// Non-empty path segments of `url`, without query string or fragment.
fn path_segments(url: &str) -> Vec<String> {
    match Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        Err(_) => {
            // Bare file names and relative paths.
            let path = url.split(['?', '#']).next().unwrap_or(url);
            path.split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        }
    }
}

/// Guesses the real kind of a downloaded artifact from its leading bytes.
///
/// Only used to explain extraction failures; `None` when nothing matches.
pub fn sniff_kind(path: &Path) -> Option<ArchiveKind> {
    let mut header = [0u8; 512];
    let read = File::open(path)
        .and_then(|mut file| file.read(&mut header))
        .ok()?;
    sniff_bytes(&header[..read])
}

fn sniff_bytes(header: &[u8]) -> Option<ArchiveKind> {
    if header.starts_with(&[0x1f, 0x8b]) {
        return Some(ArchiveKind::TarGz);
    }
    if header.starts_with(b"PK\x03\x04") {
        return Some(ArchiveKind::Zip);
    }
    if header.starts_with(b"!<arch>") {
        return Some(ArchiveKind::Deb);
    }

    let kind = infer::get(header)?;
    match kind.extension() {
        "xz" => Some(ArchiveKind::TarXz),
        "bz2" => Some(ArchiveKind::TarBz2),
        "elf" => {
            // AppImages carry "AI" plus the image type in the ELF padding bytes.
            if header.len() > 10 && &header[8..10] == b"AI" {
                Some(ArchiveKind::AppImage)
            } else {
                Some(ArchiveKind::RawBinary)
            }
        }
        other => {
            debug!("Content looks like '{}', not a supported archive", other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn hint_overrides_everything() {
        assert_eq!(
            classify("https://x.org/tool.zip", Some(ArchiveKind::Deb)),
            ArchiveKind::Deb
        );
        assert_eq!(
            classify("https://x.org/tool", Some(ArchiveKind::RawBinary)),
            ArchiveKind::RawBinary
        );
    }

    #[test]
    fn suffix_is_case_insensitive() {
        assert_eq!(classify("https://x.org/Obsidian.AppImage", None), ArchiveKind::AppImage);
        assert_eq!(classify("https://x.org/a/b-1.0.TAR.XZ", None), ArchiveKind::TarXz);
        assert_eq!(classify("https://x.org/a.tar.bz2", None), ArchiveKind::TarBz2);
        assert_eq!(classify("https://x.org/a.tgz", None), ArchiveKind::TarGz);
        assert_eq!(classify("https://x.org/a.deb?mirror=1", None), ArchiveKind::Deb);
        assert_eq!(classify("tool_linux_amd64.zip", None), ArchiveKind::Zip);
    }

    #[test]
    fn path_segment_tokens() {
        assert_eq!(
            classify("https://api.example.com/download/appimage/x64", None),
            ArchiveKind::AppImage
        );
        assert_eq!(
            classify("https://code.example.com/sha/latest/linux-deb-x64/deb", None),
            ArchiveKind::Deb
        );
    }

    #[test]
    fn unknown_falls_back_to_tar_gz() {
        assert_eq!(
            classify("https://discord.com/api/download?platform=linux&format=tar.gz", None),
            ArchiveKind::TarGz
        );
        assert_eq!(classify("https://x.org/download/latest", None), ArchiveKind::TarGz);
    }

    #[test]
    fn sniffs_magic_numbers() {
        let tmp = TempDir::new().unwrap();
        let cases: [(&str, &[u8], Option<ArchiveKind>); 5] = [
            ("gz", &[0x1f, 0x8b, 0x08, 0x00], Some(ArchiveKind::TarGz)),
            ("zip", b"PK\x03\x04rest", Some(ArchiveKind::Zip)),
            ("deb", b"!<arch>\ndebian-binary", Some(ArchiveKind::Deb)),
            ("text", b"hello world", None),
            ("empty", b"", None),
        ];
        for (name, bytes, expected) in cases {
            let path = tmp.path().join(name);
            fs::write(&path, bytes).unwrap();
            assert_eq!(sniff_kind(&path), expected, "case {name}");
        }
        assert_eq!(sniff_kind(&tmp.path().join("missing")), None);
    }

    #[test]
    fn sniffs_elf_flavours() {
        let mut elf = vec![0x7f, b'E', b'L', b'F', 2, 1, 1, 0];
        elf.extend_from_slice(&[0u8; 56]);
        assert_eq!(sniff_bytes(&elf), Some(ArchiveKind::RawBinary));

        elf[8] = b'A';
        elf[9] = b'I';
        elf[10] = 2;
        assert_eq!(sniff_bytes(&elf), Some(ArchiveKind::AppImage));
    }
}
