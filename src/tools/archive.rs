use std::path::Path;

use tar::Archive;
use xz2::read::XzDecoder;
use zip::ZipArchive;

use crate::error::ExtractionError;

/// Unpacks `archive` into `destination`, overwriting any existing entries
/// without confirmation. The format is chosen from the file name: `.zip` or
/// `.tar.xz`. Re-extracting over a previous install must not fail.
pub fn extract(archive: &Path, destination: &Path) -> Result<(), ExtractionError> {
    std::fs::create_dir_all(destination).map_err(|source| ExtractionError::Unpack {
        path: destination.to_path_buf(),
        source,
    })?;

    let name = archive.file_name().map(|n| n.to_string_lossy().to_lowercase());
    match name.as_deref() {
        Some(name) if name.ends_with(".zip") => extract_zip(archive, destination),
        Some(name) if name.ends_with(".tar.xz") || name.ends_with(".txz") => {
            extract_tar_xz(archive, destination)
        }
        _ => Err(ExtractionError::UnsupportedFormat {
            path: archive.to_path_buf(),
        }),
    }
}

fn extract_zip(archive_path: &Path, destination: &Path) -> Result<(), ExtractionError> {
    let open_err = |source| ExtractionError::Open {
        path: archive_path.to_path_buf(),
        source,
    };
    let zip_err = |source| ExtractionError::Zip {
        path: archive_path.to_path_buf(),
        source,
    };
    let unpack_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ExtractionError::Unpack { path, source }
    };

    let file = std::fs::File::open(archive_path).map_err(open_err)?;
    let mut archive = ZipArchive::new(file).map_err(zip_err)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(zip_err)?;
        // Entries with paths escaping the destination are skipped
        let Some(relative) = entry.enclosed_name() else {
            log::warn!("Skipping zip entry with unsafe path: {}", entry.name());
            continue;
        };
        let out_path = destination.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(unpack_err(&out_path))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(unpack_err(parent))?;
        }

        // File::create truncates, so a re-extract replaces prior contents
        let mut out_file = std::fs::File::create(&out_path).map_err(unpack_err(&out_path))?;
        std::io::copy(&mut entry, &mut out_file).map_err(unpack_err(&out_path))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out_path, Permissions::from_mode(mode))
                .map_err(unpack_err(&out_path))?;
        }
    }

    log::info!("Extracted {:?} into {:?}", archive_path, destination);
    Ok(())
}

fn extract_tar_xz(archive_path: &Path, destination: &Path) -> Result<(), ExtractionError> {
    let file = std::fs::File::open(archive_path).map_err(|source| ExtractionError::Open {
        path: archive_path.to_path_buf(),
        source,
    })?;

    let mut archive = Archive::new(XzDecoder::new(file));
    archive.set_overwrite(true);
    archive
        .unpack(destination)
        .map_err(|source| ExtractionError::Unpack {
            path: destination.to_path_buf(),
            source,
        })?;

    log::info!("Extracted {:?} into {:?}", archive_path, destination);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extracts_zip_entries_with_directories() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("tools.zip");
        write_zip(
            &archive,
            &[("ffmpeg", b"binary"), ("doc/readme.txt", b"notes")],
        );

        let dest = temp_dir.path().join("bin");
        extract(&archive, &dest).unwrap();

        assert_eq!(std::fs::read(dest.join("ffmpeg")).unwrap(), b"binary");
        assert_eq!(std::fs::read(dest.join("doc/readme.txt")).unwrap(), b"notes");
    }

    #[test]
    fn re_extraction_overwrites_existing_contents() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("bin");
        std::fs::create_dir_all(&dest).unwrap();

        // Stale file from an earlier install
        std::fs::write(dest.join("ffmpeg"), b"old").unwrap();

        let archive = temp_dir.path().join("tools.zip");
        write_zip(&archive, &[("ffmpeg", b"new")]);

        extract(&archive, &dest).unwrap();
        assert_eq!(std::fs::read(dest.join("ffmpeg")).unwrap(), b"new");

        // And a second pass over its own output still succeeds
        extract(&archive, &dest).unwrap();
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("tools.rar");
        std::fs::write(&archive, b"not an archive").unwrap();

        let err = extract(&archive, temp_dir.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedFormat { .. }));
    }

    #[test]
    fn truncated_zip_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let archive = temp_dir.path().join("broken.zip");
        std::fs::write(&archive, b"PK\x03\x04garbage").unwrap();

        let err = extract(&archive, temp_dir.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::Zip { .. }));
    }
}
