use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::archive::ArchiveKind;

/// Entry point produced by AppImage self-extraction; every AppImage install runs through it.
pub const APPIMAGE_ENTRY_POINT: &str = "AppRun";

/// One installable application as described by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    /// Catalog key; filled in from the map key when the catalog is built.
    #[serde(skip)]
    pub key: String,
    pub name: String,
    pub url: String,
    /// Fixed archive kind. When absent the kind is classified from the URL.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ArchiveKind>,
    /// Executable path relative to the install directory. Ignored for AppImages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bin_path: Option<String>,
    pub link_name: String,
    /// Home-relative directories relocated to fast storage.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_paths: Vec<String>,
    /// Shell snippets run after a fresh install. `{bin}` and `{link}` are substituted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_install: Vec<String>,
    /// Preferred icon, relative to the install directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl AppRecord {
    pub fn new(
        key: impl Into<String>,
        url: impl Into<String>,
        kind: Option<ArchiveKind>,
        bin_path: Option<&str>,
        link_name: impl Into<String>,
    ) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            key,
            url: url.into(),
            kind,
            bin_path: bin_path.map(str::to_string),
            link_name: link_name.into(),
            data_paths: Vec::new(),
            post_install: Vec::new(),
            icon: None,
        }
    }

    pub fn with_data_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_post_install<I, S>(mut self, scripts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.post_install = scripts.into_iter().map(Into::into).collect();
        self
    }

    /// Relative path of the main executable inside the install directory for `kind`.
    ///
    /// AppImages always resolve to [`APPIMAGE_ENTRY_POINT`]. Raw binaries fall back to the
    /// launcher name when no `bin_path` is declared. Other kinds need an explicit `bin_path`.
    pub fn binary_rel_path(&self, kind: ArchiveKind) -> Option<PathBuf> {
        match kind {
            ArchiveKind::AppImage => Some(PathBuf::from(APPIMAGE_ENTRY_POINT)),
            ArchiveKind::RawBinary => Some(PathBuf::from(
                self.bin_path.as_deref().unwrap_or(&self.link_name),
            )),
            _ => self
                .bin_path
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Field-wise patch applied by `custom_apps.json` on top of a catalog entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppOverride {
    pub name: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<ArchiveKind>,
    pub bin_path: Option<String>,
    pub link_name: Option<String>,
    pub data_paths: Option<Vec<String>>,
    pub post_install: Option<Vec<String>>,
    pub icon: Option<String>,
}

impl AppOverride {
    pub fn apply_to(self, record: &mut AppRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(url) = self.url {
            record.url = url;
        }
        if self.kind.is_some() {
            record.kind = self.kind;
        }
        if self.bin_path.is_some() {
            record.bin_path = self.bin_path;
        }
        if let Some(link_name) = self.link_name {
            record.link_name = link_name;
        }
        if let Some(data_paths) = self.data_paths {
            record.data_paths = data_paths;
        }
        if let Some(post_install) = self.post_install {
            record.post_install = post_install;
        }
        if self.icon.is_some() {
            record.icon = self.icon;
        }
    }

    /// Turns the patch into a standalone record. Needs at least `url` and `link_name`.
    pub fn into_record(self, key: &str) -> Option<AppRecord> {
        let url = self.url.clone()?;
        let link_name = self.link_name.clone()?;
        let mut record = AppRecord::new(key, url, None, None, link_name);
        self.apply_to(&mut record);
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appimage_ignores_declared_bin_path() {
        let app = AppRecord::new(
            "codium",
            "https://example.com/VSCodium.AppImage",
            Some(ArchiveKind::AppImage),
            Some("VSCodium.AppImage"),
            "codium",
        );
        assert_eq!(
            app.binary_rel_path(ArchiveKind::AppImage),
            Some(PathBuf::from("AppRun"))
        );
    }

    #[test]
    fn raw_binary_falls_back_to_link_name() {
        let app = AppRecord::new("jq", "https://example.com/jq", None, None, "jq");
        assert_eq!(app.binary_rel_path(ArchiveKind::RawBinary), Some(PathBuf::from("jq")));
        assert_eq!(app.binary_rel_path(ArchiveKind::TarGz), None);
    }

    #[test]
    fn deserializes_catalog_json() {
        let raw = r#"{
            "name": "Discord",
            "url": "https://discord.com/api/download?platform=linux&format=tar.gz",
            "type": "tar.gz",
            "bin_path": "Discord/Discord",
            "link_name": "discord",
            "data_paths": [".config/discord"]
        }"#;
        let app: AppRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(app.kind, Some(ArchiveKind::TarGz));
        assert_eq!(app.data_paths, vec![".config/discord".to_string()]);
        assert!(app.post_install.is_empty());
    }

    #[test]
    fn override_requires_url_and_link_name_for_new_entries() {
        let partial = AppOverride {
            link_name: Some("x".into()),
            ..Default::default()
        };
        assert!(partial.into_record("x").is_none());

        let full = AppOverride {
            url: Some("https://example.com/x.zip".into()),
            link_name: Some("x".into()),
            bin_path: Some("x".into()),
            ..Default::default()
        };
        let record = full.into_record("x").unwrap();
        assert_eq!(record.key, "x");
        assert_eq!(record.bin_path.as_deref(), Some("x"));
    }
}
