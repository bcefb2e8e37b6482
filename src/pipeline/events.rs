use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Progress reported while an export runs.
///
/// Serialized with a `type` tag, e.g. `{"type":"file_done","fileIndex":1,"path":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportEvent {
    /// One more item has been drawn. `page` and `index` are 1-based.
    #[serde(rename_all = "camelCase")]
    Exporting {
        page: usize,
        page_total: usize,
        index: usize,
        total: usize,
    },
    /// A file has been finalized and synced. `file_index` is 1-based.
    #[serde(rename_all = "camelCase")]
    FileDone { file_index: usize, path: PathBuf },
    #[serde(rename_all = "camelCase")]
    Ok { output_dir: PathBuf, files: Vec<PathBuf> },
    Cancelled,
    Failed { error: String },
}

impl ExportEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportEvent::Ok { .. } | ExportEvent::Cancelled | ExportEvent::Failed { .. })
    }
}

/// Where the pipeline sends its events. Without a sender, events are dropped.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventSink {
    sender: Option<async_channel::Sender<ExportEvent>>,
}

impl EventSink {
    pub fn new(sender: Option<async_channel::Sender<ExportEvent>>) -> Self {
        Self { sender }
    }

    pub fn emit(&self, event: ExportEvent) {
        let Some(sender) = &self.sender else { return };
        if let Err(e) = sender.try_send(event) {
            // A closed or full channel means nobody is listening any more.
            log::trace!("[EXPORT] Dropped progress event: {}", e);
        }
    }
}
