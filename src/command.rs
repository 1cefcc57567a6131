use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::tools::util::yt_dlp_file_name;

/// Output container chosen by the user. `Mkv` is the default, matching the
/// last-used default of the desktop frontends this core serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Mp3,
    Opus,
    #[default]
    Mkv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Opus => "opus",
            OutputFormat::Mkv => "mkv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp3" => Ok(OutputFormat::Mp3),
            "opus" => Ok(OutputFormat::Opus),
            "mkv" => Ok(OutputFormat::Mkv),
            other => Err(format!(
                "unknown output format {other:?}, expected mp3, opus or mkv"
            )),
        }
    }
}

/// A fully resolved invocation of the downloader tool: the program path and
/// its argv, ready to hand to the process runner. No shell involved, so URLs
/// and paths need no quoting.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

/// Maps a format selection to the exact yt-dlp argument list.
///
/// Every variant downloads playlists transparently, skips broken playlist
/// items instead of aborting the batch, names outputs
/// `<channel> - <title>.<ext>` under `output_dir`, and points yt-dlp at the
/// locally installed ffmpeg instead of relying on PATH.
pub fn build(format: OutputFormat, url: &str, output_dir: &Path, bin_dir: &Path) -> CommandSpec {
    let mut args: Vec<OsString> = Vec::new();

    match format {
        OutputFormat::Mp3 => {
            push_all(
                &mut args,
                [
                    "-f",
                    "bestaudio",
                    "--extract-audio",
                    "--audio-format",
                    "mp3",
                    "--audio-quality",
                    "0",
                ],
            );
        }
        OutputFormat::Opus => {
            push_all(
                &mut args,
                [
                    "-f",
                    "bestaudio",
                    "--extract-audio",
                    "--audio-format",
                    "opus",
                    "--remux-video",
                    "opus",
                    "--audio-quality",
                    "0",
                ],
            );
        }
        OutputFormat::Mkv => {
            push_all(
                &mut args,
                [
                    "-f",
                    "bestvideo[ext=mkv]+bestaudio[ext=m4a]/best[ext=mkv]/best",
                    "--recode-video",
                    "mkv",
                ],
            );
        }
    }

    push_all(&mut args, ["--ignore-errors", "--yes-playlist", "-o"]);
    args.push(
        output_dir
            .join("%(channel)s - %(title)s.%(ext)s")
            .into_os_string(),
    );
    args.push(OsString::from("--ffmpeg-location"));
    args.push(bin_dir.as_os_str().to_os_string());
    args.push(OsString::from(url));

    CommandSpec {
        program: bin_dir.join(yt_dlp_file_name()),
        args,
    }
}

fn push_all<const N: usize>(args: &mut Vec<OsString>, literals: [&str; N]) {
    args.extend(literals.into_iter().map(OsString::from));
}
