pub mod fixtures;
pub mod pdf_assertions;

use codesheet::{ExportEvent, ExportOptions, ExportPipelineBuilder, ExportRequest, SymbolRenderer};
use std::path::Path;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a run produced: its result and every event, in order.
pub struct ExportRun {
    pub result: Result<codesheet::ExportSummary, codesheet::ExportError>,
    pub events: Vec<ExportEvent>,
}

impl ExportRun {
    /// The summary of a successful run, borrowed so the events stay usable.
    pub fn summary(&self) -> Result<&codesheet::ExportSummary, String> {
        self.result.as_ref().map_err(|e| e.to_string())
    }

    pub fn file_done_indices(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ExportEvent::FileDone { file_index, .. } => Some(*file_index),
                _ => None,
            })
            .collect()
    }

    pub fn last_exporting(&self) -> Option<&ExportEvent> {
        self.events.iter().rev().find(|e| matches!(e, ExportEvent::Exporting { .. }))
    }

    pub fn terminal(&self) -> Option<&ExportEvent> {
        self.events.last().filter(|e| e.is_terminal())
    }
}

pub fn drain(rx: &async_channel::Receiver<ExportEvent>) -> Vec<ExportEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Runs one export with `renderer` and collects its events.
pub fn run_export<R: SymbolRenderer + 'static>(
    codes: Vec<String>,
    options: &ExportOptions,
    renderer: R,
    output_dir: &Path,
) -> Result<ExportRun, Box<dyn std::error::Error>> {
    let (tx, rx) = async_channel::unbounded();
    let pipeline = ExportPipelineBuilder::new()
        .with_worker_cap(4)
        .with_renderer(renderer)
        .with_event_sender(tx)
        .build()?;
    let request = ExportRequest::new(codes, options)?;
    let result = pipeline.run(&request, output_dir);
    Ok(ExportRun { result, events: drain(&rx) })
}
