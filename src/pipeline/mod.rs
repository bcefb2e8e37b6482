//! Export pipeline orchestration.
//!
//! - [`ExportPipelineBuilder`]: fluent builder for an [`ExportPipeline`]
//! - [`dispatcher`]: fans one page's render jobs out over the worker pool
//! - [`assembler`]: writes pages into size-capped PDF files
//! - [`ExportEvent`] / [`CancelFlag`]: progress out, cancellation in
//!
//! # Example
//!
//! ```ignore
//! use codesheet::{ExportOptions, ExportPipelineBuilder, ExportRequest};
//!
//! let options = ExportOptions::from_file("options.json")?;
//! let request = ExportRequest::new(codes, &options)?;
//! let pipeline = ExportPipelineBuilder::new().build()?;
//! let summary = pipeline.run(&request, "out")?;
//! ```

pub mod assembler;
mod builder;
mod cancel;
pub mod dispatcher;
mod events;
mod orchestrator;

pub use assembler::{DEFAULT_FILE_PREFIX, FinishedFile, PageCanvas, PdfAssembler};
pub use builder::ExportPipelineBuilder;
pub use cancel::CancelFlag;
pub use dispatcher::{DEFAULT_WORKER_CAP, Dispatcher, partition, worker_count};
pub use events::ExportEvent;
pub use orchestrator::{ExportPhase, ExportPipeline, ExportState, ExportSummary};
