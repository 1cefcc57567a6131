//! Pinned download locations for the two external tools. Both URLs are
//! versioned; staleness of yt-dlp is handled by its own `--update` mechanism
//! after install.

/// yt-dlp release tag the install is pinned to.
const YT_DLP_RELEASE: &str = "2023.12.30";

pub fn yt_dlp_url() -> String {
    let asset = if cfg!(target_os = "windows") {
        "yt-dlp.exe"
    } else if cfg!(target_os = "macos") {
        "yt-dlp_macos"
    } else {
        "yt-dlp_linux"
    };

    format!("https://github.com/yt-dlp/yt-dlp/releases/download/{YT_DLP_RELEASE}/{asset}")
}

pub fn ffmpeg_url() -> &'static str {
    if cfg!(target_os = "windows") {
        "https://github.com/BtbN/FFmpeg-Builds/releases/latest/download/ffmpeg-master-latest-win64-gpl.zip"
    } else if cfg!(target_os = "macos") {
        "https://evermeet.cx/ffmpeg/ffmpeg-113169-ge1c1dc8347.zip"
    } else {
        "https://johnvansickle.com/ffmpeg/builds/ffmpeg-git-amd64-static.tar.xz"
    }
}

/// File name the ffmpeg archive is stored under in the bin directory before
/// extraction.
pub fn ffmpeg_archive_name() -> &'static str {
    if cfg!(target_os = "linux") {
        "ffmpeg.tar.xz"
    } else {
        "ffmpeg.zip"
    }
}
