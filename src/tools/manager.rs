use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::orchestrator::ToolProvider;
use crate::process;
use crate::tools::fetcher::{self, Dependency};
use crate::tools::util::{is_executable_present, yt_dlp_file_name};

/// Installs both external tools on first use and keeps the downloader fresh
/// via its own update mechanism.
pub struct DependencyManager {
    bin_dir: PathBuf,
    dependencies: Vec<Dependency>,
}

impl DependencyManager {
    pub fn new(bin_dir: PathBuf) -> Self {
        // Fixed order: transcoder first, then the downloader that needs it
        let dependencies = vec![Dependency::ffmpeg(&bin_dir), Dependency::yt_dlp(&bin_dir)];
        Self {
            bin_dir,
            dependencies,
        }
    }

    #[cfg(test)]
    fn with_dependencies(bin_dir: PathBuf, dependencies: Vec<Dependency>) -> Self {
        Self {
            bin_dir,
            dependencies,
        }
    }

    /// Runs `yt-dlp --update`. Site extraction logic changes upstream every
    /// few months, so this runs on every job, even right after a fresh
    /// install. Downloads may still work with a stale tool, so failure here
    /// is logged and swallowed.
    async fn self_update(&self) {
        let yt_dlp = self.bin_dir.join(yt_dlp_file_name());
        match process::run(&self.bin_dir, &yt_dlp, ["--update"]).await {
            Ok(status) if status.success() => {
                log::info!("yt-dlp self-update completed");
            }
            Ok(status) => {
                log::warn!(
                    "yt-dlp self-update exited with {}, continuing with the installed version",
                    status
                );
            }
            Err(e) => {
                log::warn!(
                    "yt-dlp self-update failed: {}, continuing with the installed version",
                    e
                );
            }
        }
    }
}

#[async_trait]
impl ToolProvider for DependencyManager {
    async fn prepare_all(&self) -> Result<(), FetchError> {
        for dependency in &self.dependencies {
            fetcher::ensure(dependency).await?;
            if !is_executable_present(&dependency.binary) {
                return Err(FetchError::BinaryMissing {
                    name: dependency.name,
                    path: dependency.binary.clone(),
                });
            }
        }
        self.self_update().await;
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn install_stub(bin_dir: &Path, name: &str, script: &str) {
        let path = bin_dir.join(name);
        std::fs::write(&path, script).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }

    #[tokio::test]
    async fn present_tools_are_not_refetched_but_self_update_still_runs() {
        let temp_dir = TempDir::new().unwrap();
        let bin_dir = temp_dir.path().to_path_buf();

        install_stub(&bin_dir, "ffmpeg", "#!/bin/sh\nexit 0\n");
        install_stub(
            &bin_dir,
            "yt-dlp",
            "#!/bin/sh\nif [ \"$1\" = \"--update\" ]; then touch updated; fi\nexit 0\n",
        );

        let manager = DependencyManager::new(bin_dir.clone());
        manager.prepare_all().await.unwrap();

        // The update marker proves the self-update step ran even though both
        // binaries were already installed
        assert!(bin_dir.join("updated").is_file());
    }

    #[tokio::test]
    async fn failed_self_update_is_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let bin_dir = temp_dir.path().to_path_buf();

        install_stub(&bin_dir, "ffmpeg", "#!/bin/sh\nexit 0\n");
        install_stub(&bin_dir, "yt-dlp", "#!/bin/sh\nexit 1\n");

        let manager = DependencyManager::new(bin_dir);
        manager.prepare_all().await.unwrap();
    }

    /// Fresh install: neither tool present, both fetched (the transcoder
    /// from an archive), made executable, then the self-update runs.
    #[tokio::test]
    async fn fresh_install_fetches_both_tools_then_updates() {
        let mut server = mockito::Server::new_async().await;

        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("ffmpeg", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"#!/bin/sh\nexit 0\n").unwrap();
        let archive = writer.finish().unwrap().into_inner();

        let ffmpeg_mock = server
            .mock("GET", "/ffmpeg.zip")
            .with_body(archive)
            .create_async()
            .await;
        let yt_dlp_mock = server
            .mock("GET", "/yt-dlp")
            .with_body(b"#!/bin/sh\nif [ \"$1\" = \"--update\" ]; then touch updated; fi\nexit 0\n")
            .create_async()
            .await;

        let temp_dir = TempDir::new().unwrap();
        let bin_dir = temp_dir.path().to_path_buf();

        let manager = DependencyManager::with_dependencies(
            bin_dir.clone(),
            vec![
                Dependency {
                    name: "ffmpeg",
                    remote_url: format!("{}/ffmpeg.zip", server.url()),
                    archive: Some(bin_dir.join("ffmpeg.zip")),
                    binary: bin_dir.join("ffmpeg"),
                    mark_executable: true,
                },
                Dependency {
                    name: "yt-dlp",
                    remote_url: format!("{}/yt-dlp", server.url()),
                    archive: None,
                    binary: bin_dir.join("yt-dlp"),
                    mark_executable: true,
                },
            ],
        );

        manager.prepare_all().await.unwrap();

        ffmpeg_mock.assert_async().await;
        yt_dlp_mock.assert_async().await;
        assert!(is_executable_present(&bin_dir.join("ffmpeg")));
        assert!(is_executable_present(&bin_dir.join("yt-dlp")));
        assert!(bin_dir.join("updated").is_file());
    }
}
