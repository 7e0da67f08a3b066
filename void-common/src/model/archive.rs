use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VoidError;

/// The closed set of distribution formats an app can be shipped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveKind {
    #[serde(rename = "tar.gz", alias = "tgz")]
    TarGz,
    #[serde(rename = "tar.xz")]
    TarXz,
    #[serde(rename = "tar.bz2")]
    TarBz2,
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "deb")]
    Deb,
    #[serde(rename = "appimage")]
    AppImage,
    /// A single executable file, installed as-is.
    #[serde(rename = "raw-binary", alias = "binary")]
    RawBinary,
}

impl ArchiveKind {
    pub const ALL: [ArchiveKind; 7] = [
        ArchiveKind::TarGz,
        ArchiveKind::TarXz,
        ArchiveKind::TarBz2,
        ArchiveKind::Zip,
        ArchiveKind::Deb,
        ArchiveKind::AppImage,
        ArchiveKind::RawBinary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveKind::TarGz => "tar.gz",
            ArchiveKind::TarXz => "tar.xz",
            ArchiveKind::TarBz2 => "tar.bz2",
            ArchiveKind::Zip => "zip",
            ArchiveKind::Deb => "deb",
            ArchiveKind::AppImage => "appimage",
            ArchiveKind::RawBinary => "raw-binary",
        }
    }

    pub fn is_tarball(&self) -> bool {
        matches!(
            self,
            ArchiveKind::TarGz | ArchiveKind::TarXz | ArchiveKind::TarBz2
        )
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveKind {
    type Err = VoidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tar.gz" | "tgz" => Ok(ArchiveKind::TarGz),
            "tar.xz" | "txz" => Ok(ArchiveKind::TarXz),
            "tar.bz2" | "tbz2" | "tbz" => Ok(ArchiveKind::TarBz2),
            "zip" => Ok(ArchiveKind::Zip),
            "deb" => Ok(ArchiveKind::Deb),
            "appimage" => Ok(ArchiveKind::AppImage),
            "raw-binary" | "binary" => Ok(ArchiveKind::RawBinary),
            other => Err(VoidError::ValidationError(format!(
                "Unknown archive type '{other}' (expected one of: {})",
                ArchiveKind::ALL
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_aliases_case_insensitively() {
        assert_eq!("TGZ".parse::<ArchiveKind>().unwrap(), ArchiveKind::TarGz);
        assert_eq!("AppImage".parse::<ArchiveKind>().unwrap(), ArchiveKind::AppImage);
        assert_eq!("binary".parse::<ArchiveKind>().unwrap(), ArchiveKind::RawBinary);
        assert!("rar".parse::<ArchiveKind>().is_err());
    }

    #[test]
    fn display_matches_serde_name() {
        for kind in ArchiveKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
