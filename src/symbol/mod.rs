//! Turns one code into one PNG image.
//!
//! Rendering is a pure function of its [`RenderTask`]; renderers hold no
//! state and are shared by every worker thread.

mod barcode;
mod qr;

pub use barcode::encode_bars;

use crate::config::{SymbolMode, SymbolStyle};
use crate::error::EncodingError;
use codesheet_types::PixelSize;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;

/// One code to render, with everything needed to render it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTask {
    /// Position of the code in the export, starting at 0.
    pub index: usize,
    pub text: String,
    pub mode: SymbolMode,
    pub style: SymbolStyle,
    /// Target size of the symbol in pixels.
    pub size: PixelSize,
}

/// The encoded image for one task.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    pub index: usize,
    pub png: Vec<u8>,
}

/// Produces encoded image bytes for a single task.
pub trait SymbolRenderer: Send + Sync {
    fn render(&self, task: &RenderTask) -> Result<Vec<u8>, EncodingError>;
}

/// The stock renderer: QR codes through `qrcode`, linear barcodes through `barcoders`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeRenderer;

impl SymbolRenderer for CodeRenderer {
    fn render(&self, task: &RenderTask) -> Result<Vec<u8>, EncodingError> {
        let image = match task.mode {
            SymbolMode::Qr => qr::render(&task.text, task.size, &task.style)?,
            SymbolMode::Barcode => barcode::render(&task.text, &task.style)?,
        };
        encode_png(&image)
    }
}

pub(crate) fn encode_png(image: &RgbImage) -> Result<Vec<u8>, EncodingError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| EncodingError::Png(e.to_string()))?;
    Ok(buf.into_inner())
}
