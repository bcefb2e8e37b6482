// src/pipeline/orchestrator.rs
use super::assembler::{FinishedFile, PdfAssembler};
use super::cancel::CancelFlag;
use super::dispatcher::Dispatcher;
use super::events::{EventSink, ExportEvent};
use crate::config::ExportRequest;
use crate::error::ExportError;
use crate::layout::{PageGeometry, Pagination};
use crate::symbol::RenderTask;
use codesheet_executor::{Executor, ExecutorImpl};
use log::{debug, error, info, trace, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

/// Where an export stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportPhase {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// A snapshot of the run's progress. File and page numbers are 1-based; 0 means not started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportState {
    pub phase: ExportPhase,
    pub file: usize,
    pub page: usize,
    pub processed: usize,
}

/// What a successful export produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub output_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub pages: usize,
    pub items: usize,
    /// Items whose image could not be decoded and were left blank.
    pub skipped: Vec<usize>,
}

/// Why the page loop stopped early.
enum Interrupt {
    Cancelled,
    Failed(ExportError),
}

/// Drives an export: plans the grid, renders page by page, and writes files.
///
/// Build one with [`ExportPipelineBuilder`](super::ExportPipelineBuilder).
pub struct ExportPipeline<E: Executor = ExecutorImpl> {
    dispatcher: Dispatcher<E>,
    file_prefix: String,
    events: EventSink,
    cancel: CancelFlag,
    state: Mutex<ExportState>,
}

impl<E: Executor> ExportPipeline<E> {
    pub(super) fn new(dispatcher: Dispatcher<E>, file_prefix: String, events: EventSink, cancel: CancelFlag) -> Self {
        Self {
            dispatcher,
            file_prefix,
            events,
            cancel,
            state: Mutex::new(ExportState::default()),
        }
    }

    /// The flag that cancels this pipeline's runs.
    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    /// How many chunks each page is split into.
    pub fn workers(&self) -> usize {
        self.dispatcher.workers()
    }

    pub fn state(&self) -> ExportState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut ExportState)) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *state);
    }

    /// Exports `request` into `output_dir`, blocking until the run ends.
    ///
    /// Files already finalized are kept whatever the outcome. Exactly one
    /// terminal event is emitted.
    pub fn run(&self, request: &ExportRequest, output_dir: impl AsRef<Path>) -> Result<ExportSummary, ExportError> {
        let output_dir = output_dir.as_ref();
        let start = Instant::now();
        self.update(|s| *s = ExportState { phase: ExportPhase::Running, ..ExportState::default() });

        let geometry = match PageGeometry::plan(&request.layout) {
            Ok(geometry) => geometry,
            Err(e) => return self.fail(e),
        };
        let pagination = Pagination::new(
            request.codes.len(),
            geometry.slots_per_page(),
            request.layout.per_file_max_pages,
        );
        info!(
            "[EXPORT] {} items -> {} pages in {} files ({} slots per page, {} workers)",
            pagination.total_items,
            pagination.total_pages,
            pagination.total_files,
            pagination.slots_per_page,
            self.dispatcher.workers()
        );

        if let Err(e) = fs::create_dir_all(output_dir) {
            return self.fail(ExportError::Io(e));
        }

        let mut assembler = PdfAssembler::new(
            output_dir,
            self.file_prefix.as_str(),
            pagination.pages_per_file,
            geometry.clone(),
        );
        let mut skipped = Vec::new();

        let outcome = self.export_pages(request, &geometry, &pagination, &mut assembler, &mut skipped);
        match outcome {
            Ok(()) => {
                if let Err(e) = self.finish_file(&mut assembler) {
                    return self.fail(e);
                }
                let files: Vec<PathBuf> = assembler.finished_files().iter().map(|f| f.path.clone()).collect();
                self.update(|s| s.phase = ExportPhase::Completed);
                info!(
                    "[EXPORT] Completed {} items in {} files in {:.2?}",
                    pagination.total_items,
                    files.len(),
                    start.elapsed()
                );
                self.events.emit(ExportEvent::Ok { output_dir: output_dir.to_path_buf(), files: files.clone() });
                Ok(ExportSummary {
                    output_dir: output_dir.to_path_buf(),
                    files,
                    pages: pagination.total_pages,
                    items: pagination.total_items,
                    skipped,
                })
            }
            Err(Interrupt::Cancelled) => {
                if let Err(e) = self.finish_file(&mut assembler) {
                    return self.fail(e);
                }
                self.update(|s| s.phase = ExportPhase::Cancelled);
                info!(
                    "[EXPORT] Cancelled after {} items; {} files kept",
                    self.state().processed,
                    assembler.finished_files().len()
                );
                self.events.emit(ExportEvent::Cancelled);
                Err(ExportError::Cancelled)
            }
            Err(Interrupt::Failed(e)) => {
                if let Err(finish_err) = self.finish_file(&mut assembler) {
                    error!("[EXPORT] Could not finalize the open file after failure: {}", finish_err);
                }
                self.fail(e)
            }
        }
    }

    fn export_pages(
        &self,
        request: &ExportRequest,
        geometry: &PageGeometry,
        pagination: &Pagination,
        assembler: &mut PdfAssembler,
        skipped: &mut Vec<usize>,
    ) -> Result<(), Interrupt> {
        let mut processed = 0;

        for file in 0..pagination.total_files {
            if self.cancel.is_cancelled() {
                debug!("[EXPORT] Cancellation observed before file #{}", file + 1);
                return Err(Interrupt::Cancelled);
            }
            self.update(|s| s.file = file + 1);

            for page in pagination.file_pages(file) {
                self.update(|s| s.page = page + 1);
                let tasks: Vec<RenderTask> = pagination
                    .page_items(page)
                    .map(|index| RenderTask {
                        index,
                        text: request.codes[index].clone(),
                        mode: request.mode,
                        style: request.style,
                        size: geometry.item_px,
                    })
                    .collect();

                let results = self.dispatcher.render_page(tasks).map_err(Interrupt::Failed)?;

                let mut canvas = assembler.begin_page();
                let mut stopping = false;
                for (slot, result) in results.iter().enumerate() {
                    assembler.draw(&mut canvas, slot, result);
                    processed += 1;
                    self.update(|s| s.processed = processed);
                    trace!("[EXPORT] Drew item #{} on page {}", result.index, page + 1);
                    self.events.emit(ExportEvent::Exporting {
                        page: page + 1,
                        page_total: pagination.total_pages,
                        index: processed,
                        total: pagination.total_items,
                    });

                    if !stopping && self.cancel.is_cancelled() {
                        debug!(
                            "[EXPORT] Cancellation observed at slot {} of page {}; finishing the page",
                            slot,
                            page + 1
                        );
                        stopping = true;
                    }
                }
                skipped.extend_from_slice(canvas.skipped());

                // The batch is fully rendered, so the page is committed even when cancelled
                if let Some(done) = assembler.commit_page(canvas).map_err(Interrupt::Failed)? {
                    self.file_done(&done);
                }
                if stopping || self.cancel.is_cancelled() {
                    return Err(Interrupt::Cancelled);
                }
            }
        }
        Ok(())
    }

    fn finish_file(&self, assembler: &mut PdfAssembler) -> Result<(), ExportError> {
        if let Some(done) = assembler.finish()? {
            self.file_done(&done);
        }
        Ok(())
    }

    fn file_done(&self, done: &FinishedFile) {
        self.events.emit(ExportEvent::FileDone { file_index: done.number, path: done.path.clone() });
    }

    fn fail(&self, e: ExportError) -> Result<ExportSummary, ExportError> {
        self.update(|s| s.phase = ExportPhase::Failed);
        warn!("[EXPORT] Failed: {}", e);
        self.events.emit(ExportEvent::Failed { error: e.to_string() });
        Err(e)
    }
}
