// src/pipeline/builder.rs
use super::assembler::DEFAULT_FILE_PREFIX;
use super::cancel::CancelFlag;
use super::dispatcher::{DEFAULT_WORKER_CAP, Dispatcher, worker_count};
use super::events::{EventSink, ExportEvent};
use super::orchestrator::ExportPipeline;
use crate::error::ExportError;
use crate::symbol::{CodeRenderer, SymbolRenderer};
use codesheet_executor::{Executor, ExecutorError, ExecutorImpl};
use std::sync::Arc;

type ExecutorFactory<E> = Box<dyn FnOnce(usize) -> Result<E, ExecutorError>>;

/// A builder for creating an `ExportPipeline`.
pub struct ExportPipelineBuilder<E: Executor = ExecutorImpl> {
    worker_cap: usize,
    workers: Option<usize>,
    executor: ExecutorFactory<E>,
    renderer: Arc<dyn SymbolRenderer>,
    file_prefix: String,
    events: Option<async_channel::Sender<ExportEvent>>,
    cancel: CancelFlag,
}

impl Default for ExportPipelineBuilder<ExecutorImpl> {
    fn default() -> Self {
        Self {
            worker_cap: DEFAULT_WORKER_CAP,
            workers: None,
            executor: Box::new(ExecutorImpl::with_threads),
            renderer: Arc::new(CodeRenderer),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            events: None,
            cancel: CancelFlag::new(),
        }
    }
}

impl ExportPipelineBuilder<ExecutorImpl> {
    /// Creates a builder with the stock renderer and a worker pool sized to the machine.
    pub fn new() -> Self {
        Default::default()
    }
}

impl<E: Executor + 'static> ExportPipelineBuilder<E> {
    /// Caps the number of render workers. The pool gets `min(cores, cap)` threads.
    pub fn with_worker_cap(mut self, cap: usize) -> Self {
        self.worker_cap = cap.max(1);
        self
    }

    /// Uses exactly `count` workers, whatever the machine has.
    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.workers = Some(count.max(1));
        self
    }

    /// Runs render jobs on `executor` instead of a pool built by the pipeline.
    pub fn with_executor<X: Executor + 'static>(self, executor: X) -> ExportPipelineBuilder<X> {
        ExportPipelineBuilder {
            worker_cap: self.worker_cap,
            workers: self.workers,
            executor: Box::new(move |_| Ok(executor)),
            renderer: self.renderer,
            file_prefix: self.file_prefix,
            events: self.events,
            cancel: self.cancel,
        }
    }

    pub fn with_renderer<R: SymbolRenderer + 'static>(mut self, renderer: R) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Output files are named `<prefix>_<n>.pdf`.
    pub fn with_file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }

    /// Progress events are sent here. The channel must be unbounded so no event is lost;
    /// `build` rejects a bounded one.
    pub fn with_event_sender(mut self, sender: async_channel::Sender<ExportEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Consumes the builder and creates the `ExportPipeline`, starting its worker pool.
    pub fn build(self) -> Result<ExportPipeline<E>, ExportError> {
        if self.file_prefix.is_empty() || self.file_prefix.contains(['/', '\\']) {
            return Err(ExportError::Config(format!("invalid file prefix '{}'", self.file_prefix)));
        }

        if let Some(capacity) = self.events.as_ref().and_then(|tx| tx.capacity()) {
            return Err(ExportError::Config(format!(
                "progress channel must be unbounded, got capacity {}",
                capacity
            )));
        }

        let workers = self.workers.unwrap_or_else(|| worker_count(self.worker_cap));
        let executor = (self.executor)(workers)?;
        log::info!("[EXPORT] Using {} with {} workers", executor.name(), workers);

        let dispatcher = Dispatcher::new(executor, self.renderer, workers);
        Ok(ExportPipeline::new(
            dispatcher,
            self.file_prefix,
            EventSink::new(self.events),
            self.cancel,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codesheet_executor::SyncExecutor;

    #[test]
    fn defaults_build() {
        let pipeline = ExportPipelineBuilder::new().with_worker_cap(2).build().unwrap();
        assert!(!pipeline.cancel_flag().is_cancelled());
    }

    #[test]
    fn shares_the_given_cancel_flag() {
        let flag = CancelFlag::new();
        let pipeline = ExportPipelineBuilder::new()
            .with_executor(SyncExecutor::new())
            .with_cancel_flag(flag.clone())
            .build()
            .unwrap();
        flag.cancel();
        assert!(pipeline.cancel_flag().is_cancelled());
    }

    #[test]
    fn rejects_bounded_event_channel() {
        let (tx, _rx) = async_channel::bounded(4);
        let result = ExportPipelineBuilder::new().with_event_sender(tx).build();
        assert!(matches!(result, Err(ExportError::Config(_))));

        let (tx, _rx) = async_channel::unbounded();
        assert!(ExportPipelineBuilder::new().with_event_sender(tx).build().is_ok());
    }

    #[test]
    fn worker_count_overrides_the_cap() {
        let pipeline = ExportPipelineBuilder::new()
            .with_worker_cap(1)
            .with_worker_count(3)
            .with_executor(SyncExecutor::new())
            .build()
            .unwrap();
        assert_eq!(pipeline.workers(), 3);
    }

    #[test]
    fn rejects_path_like_prefix() {
        let result = ExportPipelineBuilder::new().with_file_prefix("../escape").build();
        assert!(matches!(result, Err(ExportError::Config(_))));
    }
}
