use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::command::{self, OutputFormat};
use crate::error::{FetchError, StartError};
use crate::process;

/// Seam between the orchestrator and the dependency bootstrap, so tests can
/// run jobs without touching the network.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    async fn prepare_all(&self) -> Result<(), FetchError>;
}

/// One user-initiated job: fetch `url` and convert it into `format` under
/// `output_dir`. Consumed by `Orchestrator::start` and discarded once the
/// job reaches a terminal state.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub format: OutputFormat,
    pub output_dir: PathBuf,
}

/// Externally observable job progress. Exactly one job is live at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Preparing,
    Downloading,
    Succeeded,
    Failed(String),
}

impl JobState {
    pub fn is_busy(&self) -> bool {
        matches!(self, JobState::Preparing | JobState::Downloading)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed(_))
    }
}

/// Drives one download job at a time: prepare tools, build the yt-dlp
/// command, execute it, and publish the terminal state.
///
/// The whole sequence runs on a spawned background task; the caller only
/// observes the busy flag and the state channel.
pub struct Orchestrator {
    provider: Arc<dyn ToolProvider>,
    bin_dir: PathBuf,
    busy: Arc<AtomicBool>,
    state: watch::Sender<JobState>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn ToolProvider>, bin_dir: PathBuf) -> Self {
        let (state, _) = watch::channel(JobState::Idle);
        Self {
            provider,
            bin_dir,
            busy: Arc::new(AtomicBool::new(false)),
            state,
        }
    }

    /// Channel carrying every state transition of the current job.
    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.state.subscribe()
    }

    pub fn current_state(&self) -> JobState {
        self.state.borrow().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Returns a terminal state to `Idle` once the caller has taken note of
    /// the outcome.
    pub fn acknowledge(&self) {
        if self.current_state().is_terminal() {
            self.state.send_replace(JobState::Idle);
        }
    }

    /// Accepts the request and spawns the job, or rejects it up front.
    ///
    /// An invalid request is rejected before the job enters `Preparing`; a
    /// second submission while a job is in flight gets `StartError::Busy`
    /// and leaves the running job untouched. The handle resolves to the
    /// job's terminal state.
    pub fn start(&self, request: DownloadRequest) -> Result<JoinHandle<JobState>, StartError> {
        if request.url.trim().is_empty() {
            return Err(StartError::EmptyUrl);
        }
        if !request.output_dir.is_dir() {
            return Err(StartError::InvalidOutputDir(request.output_dir));
        }

        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| StartError::Busy)?;

        let provider = Arc::clone(&self.provider);
        let bin_dir = self.bin_dir.clone();
        let busy = Arc::clone(&self.busy);
        let state = self.state.clone();

        Ok(tokio::spawn(async move {
            let terminal = run_job(provider, &bin_dir, &state, &request).await;

            // Busy clears before the terminal state becomes visible, so an
            // observer of a terminal state may immediately start a new job
            busy.store(false, Ordering::SeqCst);
            state.send_replace(terminal.clone());

            match &terminal {
                JobState::Succeeded => log::info!("All downloads completed successfully"),
                JobState::Failed(reason) => log::error!("Download job failed: {}", reason),
                _ => {}
            }
            terminal
        }))
    }
}

async fn run_job(
    provider: Arc<dyn ToolProvider>,
    bin_dir: &PathBuf,
    state: &watch::Sender<JobState>,
    request: &DownloadRequest,
) -> JobState {
    state.send_replace(JobState::Preparing);
    log::info!("Preparing external tools in {:?}", bin_dir);

    if let Err(e) = provider.prepare_all().await {
        return JobState::Failed(e.to_string());
    }

    state.send_replace(JobState::Downloading);
    let spec = command::build(request.format, &request.url, &request.output_dir, bin_dir);
    log::info!(
        "Downloading {} as {} into {:?}",
        request.url,
        request.format.as_str(),
        request.output_dir
    );

    match process::run(bin_dir, &spec.program, &spec.args).await {
        Ok(status) if status.success() => JobState::Succeeded,
        Ok(status) => JobState::Failed(format!("downloader exited with {}", status)),
        Err(e) => JobState::Failed(e.to_string()),
    }
}
