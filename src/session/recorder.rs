//! Timed page recording into a growing multi-page PDF.

use super::options::{Preferences, SessionOptions};
use super::timer::{TickScheduler, TokioTicker};
use super::worker::{ExportDone, ExportJob, ExportWorker};
use crate::draw::Canvas;
use crate::export::{DocumentInfo, ExportError, generate_filename, render_pdf_page};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// How long the record indicator stays up after a saved page.
pub const RECORD_INDICATOR_DURATION: Duration = Duration::from_millis(500);

/// What a tick or save request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing changed since the last page.
    Unchanged,
    /// An export is still in flight; the request was skipped.
    Busy,
    /// A page landed in `path`, which now holds `pages` pages.
    Appended { path: PathBuf, pages: usize },
    /// The page was handed to the background worker.
    Queued,
    /// The export failed; recording state is unchanged.
    Failed,
}

impl TickOutcome {
    fn accepted(&self) -> bool {
        matches!(self, TickOutcome::Appended { .. } | TickOutcome::Queued)
    }
}

#[derive(Debug)]
struct PendingPage {
    serial: u64,
    clear_after: bool,
}

/// Records the canvas as PDF pages while recording is on.
///
/// The recorder never touches the canvas between ticks. Notices raised by an
/// auto-clear stay queued on the canvas until the host's next
/// [`Modules::deliver_notices`](crate::input::Modules::deliver_notices).
pub struct SessionRecorder {
    options: SessionOptions,
    info: DocumentInfo,
    ticker: Box<dyn TickScheduler>,
    worker: Option<ExportWorker>,
    recording: bool,
    output: Option<PathBuf>,
    pending: Option<PendingPage>,
    pages_written: usize,
}

impl SessionRecorder {
    /// Recorder performing exports inline on the calling thread.
    pub fn new(options: SessionOptions, ticker: impl TickScheduler + 'static) -> Self {
        Self {
            options,
            info: DocumentInfo::session(),
            ticker: Box::new(ticker),
            worker: None,
            recording: false,
            output: None,
            pending: None,
            pages_written: 0,
        }
    }

    /// Recorder using a tokio interval timer, and the background worker when
    /// `options.background_export` is set.
    pub fn with_runtime(options: SessionOptions, handle: &tokio::runtime::Handle) -> Self {
        let background = options.background_export;
        let recorder = Self::new(options, TokioTicker::new(handle.clone()));
        if background {
            recorder.with_worker(ExportWorker::new(handle))
        } else {
            recorder
        }
    }

    /// Moves file I/O onto `worker`.
    pub fn with_worker(mut self, worker: ExportWorker) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn with_document_info(mut self, info: DocumentInfo) -> Self {
        self.info = info;
        self
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Document pages are appended to; `None` until the first page is saved.
    pub fn output_path(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Pages written to the current document.
    pub fn pages_written(&self) -> usize {
        self.pages_written
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.options.recording_interval()
    }

    pub fn set_auto_clear(&mut self, auto_clear: bool) {
        self.options.auto_clear = auto_clear;
    }

    /// Starts or stops recording. Starting restarts the timer and forgets any
    /// change made before recording began.
    pub fn set_recording(&mut self, recording: bool, canvas: &mut Canvas) {
        self.recording = recording;
        if recording {
            log::info!(
                "Recording started ({} ms interval)",
                self.options.interval_ms
            );
            canvas.reset_changed();
            self.restart_timer();
        } else {
            log::info!("Recording stopped");
            self.ticker.stop();
        }
    }

    /// Sets the tick interval. A zero interval stops the timer.
    pub fn set_interval(&mut self, interval_ms: u64) {
        self.options.interval_ms = interval_ms;
        if self.recording {
            self.restart_timer();
        }
    }

    fn restart_timer(&mut self) {
        self.ticker.stop();
        let interval = self.options.recording_interval();
        if interval.is_zero() {
            log::debug!("Recording interval is zero, timer disabled");
            return;
        }
        self.ticker.start(interval);
    }

    /// Starts a new document on the next saved page.
    pub fn restart_session(&mut self) {
        log::info!("Session restarted");
        self.output = None;
        self.pages_written = 0;
    }

    /// Handles one timer tick: saves a page only when the canvas changed.
    pub fn on_tick(&mut self, canvas: &mut Canvas) -> TickOutcome {
        if !self.recording {
            return TickOutcome::Unchanged;
        }
        if self.pending.is_some() {
            log::debug!("Skipping tick, export still in flight");
            return TickOutcome::Busy;
        }
        if !canvas.has_changed() {
            return TickOutcome::Unchanged;
        }
        let clear_after = self.options.auto_clear();
        self.save(canvas, clear_after)
    }

    /// Drains timer ticks and finished background exports. Call from the
    /// host loop.
    pub fn pump(&mut self, canvas: &mut Canvas) -> Vec<TickOutcome> {
        let mut outcomes = Vec::new();

        while let Some(done) = self.worker.as_mut().and_then(ExportWorker::try_take) {
            outcomes.push(self.complete(canvas, done));
        }

        // Ticks that piled up collapse into one
        if self.ticker.take_ticks() > 0 {
            outcomes.push(self.on_tick(canvas));
        }

        canvas.expire_record_indicator(Instant::now());
        outcomes
    }

    /// Blocks until the in-flight export finishes or `timeout` passes.
    pub fn flush(&mut self, canvas: &mut Canvas, timeout: Duration) -> Option<TickOutcome> {
        self.pending.as_ref()?;
        let done = self.worker.as_mut()?.wait(timeout)?;
        Some(self.complete(canvas, done))
    }

    /// Saves the canvas as a page regardless of the changed flag.
    pub fn save_page(&mut self, canvas: &mut Canvas) -> bool {
        self.request(canvas, false)
    }

    /// Saves a page and restarts the timer.
    pub fn manual_save_page(&mut self, canvas: &mut Canvas) -> bool {
        let saved = self.save_page(canvas);
        if self.recording {
            self.restart_timer();
        }
        saved
    }

    /// Saves a page, then clears the canvas once the page is safely written.
    pub fn save_clear_page(&mut self, canvas: &mut Canvas) -> bool {
        self.request(canvas, true)
    }

    /// Saves and clears, then restarts the timer.
    pub fn manual_save_clear_page(&mut self, canvas: &mut Canvas) -> bool {
        let saved = self.save_clear_page(canvas);
        if self.recording {
            self.restart_timer();
        }
        saved
    }

    fn request(&mut self, canvas: &mut Canvas, clear_after: bool) -> bool {
        if self.pending.is_some() {
            log::warn!("Page save ignored, previous export still in flight");
            return false;
        }
        self.save(canvas, clear_after).accepted()
    }

    fn save(&mut self, canvas: &mut Canvas, clear_after: bool) -> TickOutcome {
        let serial = canvas.change_serial();
        let pdf = match render_pdf_page(canvas, &self.info) {
            Ok(pdf) => pdf,
            Err(err) => {
                log::error!("Failed to render session page: {}", err);
                return TickOutcome::Failed;
            }
        };

        let new_document = self.next_document_path();
        let job = match self.output.clone() {
            Some(path) => ExportJob::Append {
                path,
                new_document,
                pdf,
            },
            None => ExportJob::Create {
                path: new_document,
                pdf,
            },
        };

        self.pending = Some(PendingPage {
            serial,
            clear_after,
        });

        if let Some(worker) = self.worker.as_ref() {
            let path = job.path().clone();
            match worker.submit(job) {
                Ok(()) => return TickOutcome::Queued,
                Err(err) => {
                    return self.complete(
                        canvas,
                        ExportDone {
                            path,
                            result: Err(err),
                        },
                    );
                }
            }
        }

        let done = job.run();
        self.complete(canvas, done)
    }

    fn complete(&mut self, canvas: &mut Canvas, done: ExportDone) -> TickOutcome {
        let Some(pending) = self.pending.take() else {
            log::warn!("Export result for {} without a pending page", done.path.display());
            return TickOutcome::Failed;
        };

        let pages = match done.result {
            Ok(pages) => pages,
            Err(err) => {
                log_export_error(&done.path, &err);
                return TickOutcome::Failed;
            }
        };

        self.output = Some(done.path.clone());
        self.pages_written = pages;
        let current = canvas.acknowledge_changes(pending.serial);

        if self.options.show_indicator {
            canvas.show_record_indicator(RECORD_INDICATOR_DURATION);
        }
        if pending.clear_after {
            if current {
                canvas.clear();
                // The cleared page is not a change worth recording
                canvas.acknowledge_changes(canvas.change_serial());
            } else {
                log::info!("Canvas changed while the page was saving, clear skipped");
            }
        }

        TickOutcome::Appended {
            path: done.path,
            pages,
        }
    }

    /// Name for a new document; the export job resolves collisions.
    fn next_document_path(&self) -> PathBuf {
        let name = generate_filename(&self.options.filename_template, "pdf");
        self.options.session_directory().join(name)
    }
}

fn log_export_error(path: &Path, err: &ExportError) {
    match err {
        ExportError::Locked(_) => {
            log::warn!("Session document {} is busy, will retry: {}", path.display(), err)
        }
        _ => log::error!("Failed to save session page to {}: {}", path.display(), err),
    }
}

impl Drop for SessionRecorder {
    fn drop(&mut self) {
        self.ticker.stop();
        if self.pending.is_some() {
            log::warn!("Session recorder dropped with an export in flight");
        }
    }
}

impl std::fmt::Debug for SessionRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecorder")
            .field("recording", &self.recording)
            .field("interval_ms", &self.options.interval_ms)
            .field("output", &self.output)
            .field("pages_written", &self.pages_written)
            .field("busy", &self.pending.is_some())
            .finish()
    }
}
