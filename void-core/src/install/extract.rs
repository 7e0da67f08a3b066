// Path: void-core/src/install/extract.rs
use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::os::unix::fs::{self as unix_fs, PermissionsExt};
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, error, warn};
use void_common::error::{Result, VoidError};
use void_common::model::ArchiveKind;
use xz2::read::XzDecoder;
use zip::read::ZipArchive;

use crate::classify::sniff_kind;
use crate::fs_util::{move_path, remove_path, set_executable};

/// Directory produced by `<appimage> --appimage-extract` in its working directory.
const SQUASHFS_ROOT: &str = "squashfs-root";

/// Extracts `archive_path` into `target_dir` according to `kind`.
///
/// `target_dir` is created when missing. On failure, the artifact's content is sniffed
/// and the error names the kind it most likely is when that differs from `kind`.
///
/// AppImage extraction executes the downloaded file. Raw binaries and AppImages consume
/// the artifact (it is moved or deleted).
pub fn extract_archive(archive_path: &Path, target_dir: &Path, kind: ArchiveKind) -> Result<()> {
    debug!(
        "Extracting '{}' (type: {}) to '{}'",
        archive_path.display(),
        kind,
        target_dir.display()
    );

    fs::create_dir_all(target_dir).map_err(|e| {
        VoidError::Io(std::sync::Arc::new(io::Error::new(
            e.kind(),
            format!(
                "Failed to create target directory {}: {}",
                target_dir.display(),
                e
            ),
        )))
    })?;

    let result = match kind {
        ArchiveKind::TarGz | ArchiveKind::TarXz | ArchiveKind::TarBz2 | ArchiveKind::Zip => {
            extract_with_crates(archive_path, target_dir, kind)
        }
        ArchiveKind::Deb => extract_deb(archive_path, target_dir),
        ArchiveKind::AppImage => extract_appimage(archive_path, target_dir),
        ArchiveKind::RawBinary => install_raw_binary(archive_path, target_dir),
    };

    result.map_err(|e| with_kind_suggestion(e, archive_path, kind))
}

fn extract_with_crates(archive_path: &Path, target_dir: &Path, kind: ArchiveKind) -> Result<()> {
    let file = File::open(archive_path).map_err(|e| {
        VoidError::Io(std::sync::Arc::new(io::Error::new(
            e.kind(),
            format!("Failed to open archive {}: {}", archive_path.display(), e),
        )))
    })?;

    match kind {
        ArchiveKind::Zip => extract_zip_archive(file, target_dir, archive_path),
        ArchiveKind::TarGz => extract_tar_archive(GzDecoder::new(file), target_dir, archive_path),
        ArchiveKind::TarBz2 => extract_tar_archive(BzDecoder::new(file), target_dir, archive_path),
        ArchiveKind::TarXz => extract_tar_archive(XzDecoder::new(file), target_dir, archive_path),
        other => Err(VoidError::ExtractionError(format!(
            "'{}' is not a tar or zip archive kind ({})",
            other,
            archive_path.display()
        ))),
    }
}

/// Appends a `--type` suggestion when the content says the artifact is something else.
fn with_kind_suggestion(err: VoidError, archive_path: &Path, kind: ArchiveKind) -> VoidError {
    let base = match err {
        VoidError::ExtractionError(msg) => msg,
        other => other.to_string(),
    };
    match sniff_kind(archive_path) {
        Some(sniffed) if sniffed != kind => VoidError::ExtractionError(format!(
            "{base}\nFile appears to be a {sniffed} archive, not {kind}. Try: --type {sniffed}"
        )),
        _ => VoidError::ExtractionError(base),
    }
}

/// Maps an in-archive path onto `target_dir`, rejecting anything that could escape it.
fn safe_target_path(target_dir: &Path, path_in_archive: &Path) -> std::result::Result<Option<PathBuf>, String> {
    let mut out = target_dir.to_path_buf();
    let mut pushed = false;
    for comp in path_in_archive.components() {
        match comp {
            Component::Normal(p) => {
                out.push(p);
                pushed = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(format!(
                    "Unsafe '..' in archive path {}",
                    path_in_archive.display()
                ));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(format!(
                    "Disallowed component {:?} in archive path {}",
                    comp,
                    path_in_archive.display()
                ));
            }
        }
    }
    Ok(pushed.then_some(out))
}

fn extract_tar_archive<R: Read>(
    reader: R,
    target_dir: &Path,
    archive_path_for_log: &Path,
) -> Result<()> {
    let mut archive = Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);

    debug!(
        "Starting TAR extraction for {}",
        archive_path_for_log.display()
    );

    let mut errors: Vec<String> = Vec::new();
    let entries = archive.entries().map_err(|e| {
        VoidError::ExtractionError(format!(
            "Failed to read TAR archive {}: {}",
            archive_path_for_log.display(),
            e
        ))
    })?;

    for entry_result in entries {
        let mut entry = entry_result.map_err(|e| {
            VoidError::ExtractionError(format!(
                "Error reading TAR entry from {}: {}",
                archive_path_for_log.display(),
                e
            ))
        })?;

        let path_in_archive: PathBuf = entry
            .path()
            .map_err(|e| {
                VoidError::ExtractionError(format!(
                    "Invalid path in TAR entry from {}: {}",
                    archive_path_for_log.display(),
                    e
                ))
            })?
            .into_owned();

        let final_target_path_on_disk = match safe_target_path(target_dir, &path_in_archive) {
            Ok(Some(path)) => path,
            Ok(None) => continue,
            Err(msg) => {
                error!("{}", msg);
                errors.push(msg);
                continue;
            }
        };

        if let Some(parent) = final_target_path_on_disk.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        // unpack_in re-checks containment and resolves hard links relative to target_dir.
        match entry.unpack_in(target_dir) {
            Ok(true) => debug!(
                "Unpacked TAR entry to: {}",
                final_target_path_on_disk.display()
            ),
            Ok(false) => {
                let msg = format!(
                    "Skipped TAR entry {} escaping {}",
                    path_in_archive.display(),
                    target_dir.display()
                );
                warn!("{}", msg);
                errors.push(msg);
            }
            Err(e) => {
                let msg = format!(
                    "Failed to unpack entry {:?} to {}: {}. Entry type: {:?}",
                    path_in_archive,
                    final_target_path_on_disk.display(),
                    e,
                    entry.header().entry_type()
                );
                error!("{}", msg);
                errors.push(msg);
            }
        }
    }

    if !errors.is_empty() {
        return Err(VoidError::ExtractionError(format!(
            "Failed during TAR extraction for {} with {} error(s): {}",
            archive_path_for_log.display(),
            errors.len(),
            errors.join("; ")
        )));
    }

    debug!(
        "Finished TAR extraction for {}",
        archive_path_for_log.display()
    );
    Ok(())
}

fn extract_zip_archive<R: Read + Seek>(
    reader: R,
    target_dir: &Path,
    archive_path_for_log: &Path,
) -> Result<()> {
    let mut archive = ZipArchive::new(reader).map_err(|e| {
        VoidError::ExtractionError(format!(
            "Failed to open ZIP {}: {}",
            archive_path_for_log.display(),
            e
        ))
    })?;
    debug!(
        "Starting ZIP extraction for {}",
        archive_path_for_log.display()
    );

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| {
            VoidError::ExtractionError(format!(
                "Error reading ZIP index {} in {}: {}",
                i,
                archive_path_for_log.display(),
                e
            ))
        })?;

        let path_in_archive = match file.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => {
                debug!("Skipping unsafe ZIP entry name {}", file.name());
                continue;
            }
        };
        let final_target_path_on_disk = match safe_target_path(target_dir, &path_in_archive) {
            Ok(Some(path)) => path,
            Ok(None) => continue,
            Err(msg) => {
                error!("{}", msg);
                return Err(VoidError::ExtractionError(msg));
            }
        };

        if let Some(parent) = final_target_path_on_disk.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        if file.is_dir() {
            fs::create_dir_all(&final_target_path_on_disk)?;
        } else if file.is_symlink() {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)?;
            let link_target_path = PathBuf::from(String::from_utf8_lossy(&buf).to_string());
            remove_path(&final_target_path_on_disk)?;
            unix_fs::symlink(&link_target_path, &final_target_path_on_disk).map_err(|e| {
                debug!(
                    "Failed to create symlink {} -> {}: {}",
                    final_target_path_on_disk.display(),
                    link_target_path.display(),
                    e
                );
                VoidError::from(e)
            })?;
        } else {
            remove_path(&final_target_path_on_disk)?;
            let mut out_file = File::create(&final_target_path_on_disk).map_err(|e| {
                VoidError::Io(std::sync::Arc::new(io::Error::new(
                    e.kind(),
                    format!(
                        "Failed create file {}: {}",
                        final_target_path_on_disk.display(),
                        e
                    ),
                )))
            })?;
            io::copy(&mut file, &mut out_file).map_err(|e| {
                VoidError::ExtractionError(format!(
                    "Failed to decompress {} from {}: {}",
                    path_in_archive.display(),
                    archive_path_for_log.display(),
                    e
                ))
            })?;
            if let Some(mode) = file.unix_mode() {
                fs::set_permissions(
                    &final_target_path_on_disk,
                    fs::Permissions::from_mode(mode),
                )?;
            }
        }
    }
    debug!(
        "Finished ZIP extraction for {}",
        archive_path_for_log.display()
    );
    Ok(())
}

/// Unpacks the data tree of a `.deb` without root privileges via `dpkg -x`.
fn extract_deb(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let dpkg = which::which("dpkg").map_err(|_| {
        VoidError::ExtractionError(
            "'dpkg' is required to extract .deb packages but was not found in PATH".to_string(),
        )
    })?;
    debug!("Running {} -x {}", dpkg.display(), archive_path.display());
    let output = Command::new(&dpkg)
        .arg("-x")
        .arg(archive_path)
        .arg(target_dir)
        .output()
        .map_err(|e| VoidError::CommandExecError(format!("Failed to run dpkg: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("dpkg -x failed with status {}: {}", output.status, stderr.trim());
        return Err(VoidError::ExtractionError(format!(
            "dpkg -x failed for {}: {}",
            archive_path.display(),
            stderr.trim()
        )));
    }
    Ok(())
}

/// Runs the AppImage's self-extraction inside `target_dir` and flattens `squashfs-root`.
fn extract_appimage(archive_path: &Path, target_dir: &Path) -> Result<()> {
    set_executable(archive_path)?;
    let artifact = fs::canonicalize(archive_path)?;
    let squashfs_root = target_dir.join(SQUASHFS_ROOT);
    if remove_path(&squashfs_root)? {
        debug!("Removed stale {}", squashfs_root.display());
    }

    debug!(
        "Running {} --appimage-extract in {}",
        artifact.display(),
        target_dir.display()
    );
    let output = Command::new(&artifact)
        .arg("--appimage-extract")
        .current_dir(target_dir)
        .output()
        .map_err(|e| {
            VoidError::ExtractionError(format!(
                "Failed to execute AppImage {}: {}",
                artifact.display(),
                e
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VoidError::ExtractionError(format!(
            "AppImage self-extraction failed with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    if !squashfs_root.is_dir() {
        return Err(VoidError::ExtractionError(format!(
            "AppImage extraction did not produce {}",
            squashfs_root.display()
        )));
    }

    for entry in fs::read_dir(&squashfs_root)? {
        let entry = entry?;
        let destination = target_dir.join(entry.file_name());
        remove_path(&destination)?;
        move_path(&entry.path(), &destination)?;
    }
    fs::remove_dir_all(&squashfs_root)?;

    if let Err(e) = fs::remove_file(&artifact) {
        warn!("Could not delete AppImage {}: {}", artifact.display(), e);
    }
    Ok(())
}

fn install_raw_binary(archive_path: &Path, target_dir: &Path) -> Result<()> {
    let file_name = archive_path.file_name().ok_or_else(|| {
        VoidError::ExtractionError(format!("No file name in {}", archive_path.display()))
    })?;
    let destination = target_dir.join(file_name);
    remove_path(&destination)?;
    move_path(archive_path, &destination)?;
    set_executable(&destination)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    use super::*;

    fn write_tar_gz(path: &Path, files: &[(&str, &[u8], u32)]) {
        let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, data, mode) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
        for (name, data) in files {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn tar_gz_preserves_tree_and_modes() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("app.tar.gz");
        write_tar_gz(
            &archive,
            &[("App/app", b"#!/bin/sh\n", 0o755), ("App/README", b"hi", 0o644)],
        );
        let dest = tmp.path().join("out");

        extract_archive(&archive, &dest, ArchiveKind::TarGz).unwrap();

        let mode = fs::metadata(dest.join("App/app")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
        assert_eq!(fs::read(dest.join("App/README")).unwrap(), b"hi");
    }

    #[test]
    fn zip_mislabeled_as_tar_gz_names_zip() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("download.tar.gz");
        write_zip(&archive, &[("tool/tool", b"bin")]);

        let err = extract_archive(&archive, &tmp.path().join("out"), ArchiveKind::TarGz)
            .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, VoidError::ExtractionError(_)));
        assert!(msg.contains("zip"), "{msg}");
        assert!(msg.contains("--type zip"), "{msg}");
    }

    #[test]
    fn zip_extracts_with_permissions() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("tool.zip");
        write_zip(&archive, &[("terraform", b"ELF"), ("docs/LICENSE", b"MIT")]);
        let dest = tmp.path().join("out");

        extract_archive(&archive, &dest, ArchiveKind::Zip).unwrap();

        let mode = fs::metadata(dest.join("terraform")).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
        assert_eq!(fs::read(dest.join("docs/LICENSE")).unwrap(), b"MIT");
    }

    #[test]
    fn raw_binary_is_moved_and_made_executable() {
        let tmp = TempDir::new().unwrap();
        let staged = tmp.path().join("stage/jq");
        fs::create_dir_all(staged.parent().unwrap()).unwrap();
        fs::write(&staged, b"binary").unwrap();
        let dest = tmp.path().join("apps/jq");

        extract_archive(&staged, &dest, ArchiveKind::RawBinary).unwrap();

        assert!(!staged.exists());
        let mode = fs::metadata(dest.join("jq")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn appimage_self_extraction_is_flattened() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("Tool.AppImage");
        // Stand-in for an AppImage runtime: honours --appimage-extract in the cwd.
        fs::write(
            &artifact,
            "#!/bin/sh\n[ \"$1\" = \"--appimage-extract\" ] || exit 2\n\
             mkdir -p squashfs-root/usr/bin\n\
             printf '#!/bin/sh\\n' > squashfs-root/AppRun\n\
             chmod 755 squashfs-root/AppRun\n\
             echo icon > squashfs-root/tool.png\n",
        )
        .unwrap();
        let dest = tmp.path().join("apps/tool");

        extract_archive(&artifact, &dest, ArchiveKind::AppImage).unwrap();

        assert!(dest.join("AppRun").is_file());
        assert!(dest.join("tool.png").is_file());
        assert!(dest.join("usr/bin").is_dir());
        assert!(!dest.join(SQUASHFS_ROOT).exists());
        assert!(!artifact.exists());
    }

    #[test]
    fn failing_appimage_reports_extraction_error() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("Broken.AppImage");
        fs::write(&artifact, "#!/bin/sh\necho nope >&2\nexit 1\n").unwrap();

        let err = extract_archive(&artifact, &tmp.path().join("out"), ArchiveKind::AppImage)
            .unwrap_err();
        assert!(matches!(err, VoidError::ExtractionError(ref m) if m.contains("nope")));
    }

    #[test]
    fn unsafe_paths_are_rejected() {
        let base = Path::new("/dest");
        assert!(safe_target_path(base, Path::new("../etc/passwd")).is_err());
        assert!(safe_target_path(base, Path::new("/etc/passwd")).is_err());
        assert_eq!(safe_target_path(base, Path::new("./")).unwrap(), None);
        assert_eq!(
            safe_target_path(base, Path::new("./a/b")).unwrap(),
            Some(PathBuf::from("/dest/a/b"))
        );
    }
}
