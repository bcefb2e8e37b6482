//! Batch export of QR codes and barcodes to paginated PDF sheets.
//!
//! An [`ExportRequest`] (ordered codes plus layout and style) goes through an
//! [`ExportPipeline`]: the layout planner sizes the grid once, each page's
//! symbols are rendered in parallel, and the assembler streams pages into
//! PDF files capped at `perFileMaxPages` pages each.

pub mod config;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod symbol;

pub use codesheet_executor::{Executor, ExecutorImpl, SyncExecutor};
pub use codesheet_types::{Color, Orientation, PaperSize};
pub use config::{ExportOptions, ExportRequest, ItemSize, LayoutConfig, Margins, SymbolMode, SymbolStyle, Symbology};
pub use error::{EncodingError, ExportError};
pub use layout::{PageGeometry, Pagination};
pub use pipeline::{
    CancelFlag, ExportEvent, ExportPhase, ExportPipeline, ExportPipelineBuilder, ExportState, ExportSummary,
};
pub use symbol::{CodeRenderer, RenderResult, RenderTask, SymbolRenderer};
