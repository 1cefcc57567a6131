use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use log::LevelFilter;

use crate::command::OutputFormat;
use crate::config::Workspace;
use crate::orchestrator::{DownloadRequest, JobState, Orchestrator};
use crate::tools::DependencyManager;

mod command;
mod config;
mod error;
mod orchestrator;
mod process;
mod tools;

struct CliArgs {
    url: String,
    format: OutputFormat,
    output_dir: Option<PathBuf>,
}

fn parse_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let Some(url) = args.next() else {
        bail!("usage: ytgrab <URL> [mp3|opus|mkv] [OUTPUT_DIR]");
    };
    let format = match args.next() {
        Some(raw) => raw.parse().map_err(anyhow::Error::msg)?,
        None => OutputFormat::default(),
    };
    let output_dir = args.next().map(PathBuf::from);

    Ok(CliArgs {
        url,
        format,
        output_dir,
    })
}

fn init_logging() {
    use std::io::Write;

    let mut builder = pretty_env_logger::formatted_builder();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    log::info!("Starting ytgrab...");

    if let Err(e) = config::load_environment() {
        log::warn!("Failed to load environment: {}", e);
    }

    let args = parse_args()?;

    // Workspace creation failure is fatal; nothing works without bin/
    let workspace = Workspace::resolve()?;
    workspace.create()?;
    log::info!("Workspace root: {:?}", workspace.root);

    // Downloads land in the workspace root unless the caller chose a folder
    let output_dir = args.output_dir.unwrap_or_else(|| workspace.root.clone());

    let manager = Arc::new(DependencyManager::new(workspace.bin.clone()));
    let orchestrator = Orchestrator::new(manager, workspace.bin.clone());
    let mut states = orchestrator.subscribe();

    let handle = orchestrator.start(DownloadRequest {
        url: args.url,
        format: args.format,
        output_dir,
    })?;

    let terminal = loop {
        states.changed().await?;
        let state = states.borrow_and_update().clone();
        match &state {
            JobState::Preparing => log::info!("Preparing external tools..."),
            JobState::Downloading => log::info!("Downloading, please wait..."),
            _ => {}
        }
        if state.is_terminal() {
            break state;
        }
    };
    handle.await?;

    match terminal {
        JobState::Failed(reason) => bail!("download failed: {}", reason),
        _ => {
            orchestrator.acknowledge();
            Ok(())
        }
    }
}
