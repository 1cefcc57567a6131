use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::fs;
use tokio::io;

use crate::error::FetchError;
use crate::tools::archive;
use crate::tools::urls;
use crate::tools::util::{ffmpeg_file_name, find_in_tree, yt_dlp_file_name};

/// Description of one external tool: where it comes from and where its
/// binary must end up. Immutable after construction; the binary existing on
/// disk is the sole proof of a prior successful install.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub name: &'static str,
    pub remote_url: String,
    /// Present when the remote resource is an archive that must be unpacked
    /// before the binary appears.
    pub archive: Option<PathBuf>,
    pub binary: PathBuf,
    pub mark_executable: bool,
}

impl Dependency {
    pub fn ffmpeg(bin_dir: &Path) -> Self {
        Dependency {
            name: "ffmpeg",
            remote_url: urls::ffmpeg_url().to_string(),
            archive: Some(bin_dir.join(urls::ffmpeg_archive_name())),
            binary: bin_dir.join(ffmpeg_file_name()),
            mark_executable: true,
        }
    }

    pub fn yt_dlp(bin_dir: &Path) -> Self {
        Dependency {
            name: "yt-dlp",
            remote_url: urls::yt_dlp_url(),
            archive: None,
            binary: bin_dir.join(yt_dlp_file_name()),
            mark_executable: true,
        }
    }
}

/// Makes sure the dependency's binary exists locally, downloading and
/// unpacking it if absent.
///
/// Idempotent: when the binary is already on disk this returns immediately
/// without touching the network. No version or checksum is re-validated.
pub async fn ensure(dep: &Dependency) -> Result<(), FetchError> {
    if dep.binary.exists() {
        log::info!("{} exists already, skipping download", dep.name);
        return Ok(());
    }

    log::info!("{} not found, downloading from {}", dep.name, dep.remote_url);

    let destination = dep.archive.as_deref().unwrap_or(dep.binary.as_path());
    let staging_dir = destination.parent().unwrap_or(Path::new("."));

    // Stage the download in a temp file next to the destination, then move
    // it into place so a half-written file never sits at the final path.
    let staging = NamedTempFile::new_in(staging_dir).map_err(|source| FetchError::Io {
        path: staging_dir.to_path_buf(),
        source,
    })?;
    let staging_path = staging.into_temp_path();

    download_file(&dep.remote_url, &staging_path).await?;

    staging_path
        .persist(destination)
        .map_err(|e| FetchError::Io {
            path: destination.to_path_buf(),
            source: e.error,
        })?;
    log::info!("Moved download into place at {:?}", destination);

    if let Some(archive_path) = &dep.archive {
        let tools_dir = dep
            .binary
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();
        archive::extract(archive_path, &tools_dir)?;
        place_extracted_binary(dep, &tools_dir).await?;
    }

    if dep.mark_executable {
        mark_executable(&dep.binary).await?;
    }

    log::info!("{} installed at {:?}", dep.name, dep.binary);
    Ok(())
}

/// Streams `url` into `path` chunk by chunk.
pub async fn download_file(url: &str, path: &Path) -> Result<(), FetchError> {
    let client = reqwest::Client::new();
    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

    if !response.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let io_err = |source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = fs::File::create(path).await.map_err(io_err)?;
    while let Some(chunk) = response.chunk().await.map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
    })? {
        io::copy(&mut chunk.as_ref(), &mut file)
            .await
            .map_err(io_err)?;
    }

    log::info!("Download of {} completed", url);
    Ok(())
}

/// Archives do not always carry the binary at their root; if it did not land
/// at the expected path, search the unpacked tree and copy it into place.
async fn place_extracted_binary(dep: &Dependency, tools_dir: &Path) -> Result<(), FetchError> {
    if dep.binary.exists() {
        return Ok(());
    }

    let file_name = dep
        .binary
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match find_in_tree(tools_dir, &file_name) {
        Some(found) => {
            log::info!("Found {} at {:?}, copying to {:?}", dep.name, found, dep.binary);
            fs::copy(&found, &dep.binary)
                .await
                .map_err(|source| FetchError::Io {
                    path: dep.binary.clone(),
                    source,
                })?;
            Ok(())
        }
        None => Err(FetchError::BinaryMissing {
            name: dep.name,
            path: dep.binary.clone(),
        }),
    }
}

async fn mark_executable(path: &Path) -> Result<(), FetchError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let io_err = |source| FetchError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut perms = fs::metadata(path).await.map_err(io_err)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).await.map_err(io_err)?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
