use crate::export::{ExportError, append_pages, write_atomic};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// File work for one recorded page. The PDF bytes are rendered on the UI
/// thread beforehand.
#[derive(Debug, Clone)]
pub enum ExportJob {
    /// Write a fresh single-page document at `path`, or at a `-N` sibling
    /// when `path` is taken.
    Create { path: PathBuf, pdf: Vec<u8> },
    /// Merge the page into `path`. When `path` no longer exists the page
    /// starts a fresh document at `new_document` instead.
    Append {
        path: PathBuf,
        new_document: PathBuf,
        pdf: Vec<u8>,
    },
}

impl ExportJob {
    pub fn path(&self) -> &PathBuf {
        match self {
            ExportJob::Create { path, .. } | ExportJob::Append { path, .. } => path,
        }
    }

    /// Performs the job on the calling thread.
    pub fn run(self) -> ExportDone {
        match self {
            ExportJob::Create { path, pdf } => create_document(&path, &pdf),
            ExportJob::Append {
                path,
                new_document,
                pdf,
            } => {
                if !path.exists() {
                    log::warn!(
                        "Session document {} is gone, starting a new one",
                        path.display()
                    );
                    return create_document(&new_document, &pdf);
                }
                let result = append_pages(&path, &pdf);
                ExportDone { path, result }
            }
        }
    }
}

fn create_document(path: &Path, pdf: &[u8]) -> ExportDone {
    let path = unique_path(path);
    let result = write_atomic(&path, pdf).map(|()| {
        log::info!("Started session document {}", path.display());
        1
    });
    ExportDone { path, result }
}

/// `path`, or the first free `<stem>-N.<ext>` sibling.
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    (1u32..)
        .map(|n| path.with_file_name(format!("{}-{}{}", stem, n, extension)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Result of a finished job, delivered back to the UI thread.
#[derive(Debug)]
pub struct ExportDone {
    /// Document the page was written to
    pub path: PathBuf,
    pub result: Result<usize, ExportError>,
}

/// Runs export jobs on tokio's blocking pool.
///
/// Jobs go out over a channel and results are collected with
/// [`ExportWorker::try_take`] from the synchronous host loop.
pub struct ExportWorker {
    request_tx: mpsc::UnboundedSender<ExportJob>,
    result_rx: mpsc::UnboundedReceiver<ExportDone>,
}

impl ExportWorker {
    /// Create a new export worker.
    ///
    /// This spawns a background task that runs one job at a time.
    ///
    /// # Arguments
    /// * `runtime_handle` - Tokio runtime handle for spawning async tasks
    pub fn new(runtime_handle: &tokio::runtime::Handle) -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<ExportJob>();
        let (result_tx, result_rx) = mpsc::unbounded_channel::<ExportDone>();

        runtime_handle.spawn(async move {
            while let Some(job) = request_rx.recv().await {
                let path = job.path().clone();
                log::debug!("Processing export job for {}", path.display());

                let done = match tokio::task::spawn_blocking(move || job.run()).await {
                    Ok(done) => done,
                    Err(err) => ExportDone {
                        path,
                        result: Err(ExportError::Io(std::io::Error::other(format!(
                            "export task failed: {}",
                            err
                        )))),
                    },
                };
                if result_tx.send(done).is_err() {
                    log::debug!("Export worker result channel closed");
                    break;
                }
            }
        });

        Self {
            request_tx,
            result_rx,
        }
    }

    /// Queues a job. Non-blocking.
    pub fn submit(&self, job: ExportJob) -> Result<(), ExportError> {
        self.request_tx.send(job).map_err(|_| {
            ExportError::Io(std::io::Error::other("export worker not running"))
        })
    }

    /// Next finished job, if any.
    pub fn try_take(&mut self) -> Option<ExportDone> {
        self.result_rx.try_recv().ok()
    }

    /// Polls for a finished job until `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<ExportDone> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(done) = self.try_take() {
                return Some(done);
            }
            if Instant::now() >= deadline {
                return None;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }
}

impl std::fmt::Debug for ExportWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportWorker")
            .field("running", &!self.request_tx.is_closed())
            .finish()
    }
}
