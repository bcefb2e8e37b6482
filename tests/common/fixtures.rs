use codesheet::{CancelFlag, EncodingError, ExportOptions, RenderTask, SymbolRenderer};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// `n` distinct codes: ITEM-00000, ITEM-00001, ...
pub fn codes(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("ITEM-{:05}", i)).collect()
}

/// A4 portrait at 150 dpi with 8 columns and 5 rows: 40 slots per page.
pub fn grid_options() -> ExportOptions {
    ExportOptions {
        auto_size: true,
        items_per_row: 8,
        side_margin: 5,
        top_margin: 10,
        spacing_x: 0,
        spacing_y: 0,
        item_height: Some(300),
        ..ExportOptions::default()
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    RgbImage::from_pixel(width, height, Rgb([0, 0, 0]))
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Emits the same 2x2 PNG for every item. Keeps large runs fast.
#[derive(Clone)]
pub struct TinyRenderer {
    png: Vec<u8>,
}

impl TinyRenderer {
    pub fn new() -> Self {
        Self { png: png(2, 2) }
    }
}

impl SymbolRenderer for TinyRenderer {
    fn render(&self, _task: &RenderTask) -> Result<Vec<u8>, EncodingError> {
        Ok(self.png.clone())
    }
}

/// Encodes the item index as the image width (`index + 1` pixels), so the
/// PDF shows which item landed in which slot.
pub struct IndexWidthRenderer;

impl SymbolRenderer for IndexWidthRenderer {
    fn render(&self, task: &RenderTask) -> Result<Vec<u8>, EncodingError> {
        Ok(png(task.index as u32 + 1, 1))
    }
}

/// Raises `flag` while rendering item `at`.
pub struct CancellingRenderer {
    pub flag: CancelFlag,
    pub at: usize,
    pub inner: TinyRenderer,
}

impl SymbolRenderer for CancellingRenderer {
    fn render(&self, task: &RenderTask) -> Result<Vec<u8>, EncodingError> {
        if task.index == self.at {
            self.flag.cancel();
        }
        self.inner.render(task)
    }
}

/// Returns garbage instead of a PNG for the listed items.
pub struct CorruptingRenderer {
    pub corrupt: Vec<usize>,
    pub inner: TinyRenderer,
}

impl SymbolRenderer for CorruptingRenderer {
    fn render(&self, task: &RenderTask) -> Result<Vec<u8>, EncodingError> {
        if self.corrupt.contains(&task.index) {
            return Ok(b"\x89PNG garbage".to_vec());
        }
        self.inner.render(task)
    }
}
