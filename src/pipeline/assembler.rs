//! Draws rendered symbols onto pages and spreads the pages over files.
//!
//! Only one output file is open at a time. A file is created when its first
//! page is committed and finalized as soon as it holds `pages_per_file`
//! pages, so every file on disk is either complete or still being written.

use crate::error::ExportError;
use crate::layout::PageGeometry;
use crate::symbol::RenderResult;
use codesheet_render_lopdf::{ImageXObject, StreamingPdfWriter, draw_image};
use codesheet_types::Placement;
use log::{debug, info, warn};
use lopdf::content::Content;
use lopdf::{Dictionary, Object, dictionary};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

pub const DEFAULT_FILE_PREFIX: &str = "qrbarcode_export_part";

const PDF_VERSION: &str = "1.7";

/// The decoded images of one page, waiting to be committed.
#[derive(Debug, Default)]
pub struct PageCanvas {
    images: Vec<(ImageXObject, Placement)>,
    skipped: Vec<usize>,
}

impl PageCanvas {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Indices whose images could not be decoded.
    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }
}

/// A file that has been finalized and synced to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedFile {
    /// 1-based file number, also the suffix of the file name.
    pub number: usize,
    pub path: PathBuf,
    pub pages: usize,
}

struct OpenFile {
    number: usize,
    path: PathBuf,
    writer: StreamingPdfWriter<BufWriter<File>>,
}

pub struct PdfAssembler {
    output_dir: PathBuf,
    prefix: String,
    pages_per_file: usize,
    geometry: PageGeometry,
    current: Option<OpenFile>,
    next_number: usize,
    finished: Vec<FinishedFile>,
}

impl PdfAssembler {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        pages_per_file: usize,
        geometry: PageGeometry,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
            pages_per_file: pages_per_file.max(1),
            geometry,
            current: None,
            next_number: 1,
            finished: Vec::new(),
        }
    }

    pub fn file_path(&self, number: usize) -> PathBuf {
        file_path(&self.output_dir, &self.prefix, number)
    }

    pub fn begin_page(&self) -> PageCanvas {
        PageCanvas::default()
    }

    /// Places one rendered symbol into `slot`. An image that fails to decode
    /// is logged and left out; the rest of the page is unaffected.
    pub fn draw(&self, canvas: &mut PageCanvas, slot: usize, result: &RenderResult) {
        match ImageXObject::from_encoded(&result.png) {
            Ok(image) => canvas.images.push((image, self.geometry.slot_placement(slot))),
            Err(e) => {
                warn!("[ASSEMBLER] Skipping item #{} in slot {}: {}", result.index, slot, e);
                canvas.skipped.push(result.index);
            }
        }
    }

    /// Writes a completed page, opening a file first if none is open.
    ///
    /// Returns the file that this page completed, if any.
    pub fn commit_page(&mut self, canvas: PageCanvas) -> Result<Option<FinishedFile>, ExportError> {
        let mut file = match self.current.take() {
            Some(file) => file,
            None => self.open_next()?,
        };

        write_page(&mut file.writer, canvas, &self.geometry).map_err(|e| ExportError::stream(&file.path, e))?;
        debug!(
            "[ASSEMBLER] Committed page {} of file #{}",
            file.writer.page_count(),
            file.number
        );

        if file.writer.page_count() >= self.pages_per_file {
            return self.finalize(file).map(Some);
        }
        self.current = Some(file);
        Ok(None)
    }

    /// Finalizes the open file, if there is one.
    pub fn finish(&mut self) -> Result<Option<FinishedFile>, ExportError> {
        match self.current.take() {
            Some(file) => self.finalize(file).map(Some),
            None => Ok(None),
        }
    }

    pub fn has_open_file(&self) -> bool {
        self.current.is_some()
    }

    pub fn finished_files(&self) -> &[FinishedFile] {
        &self.finished
    }

    fn open_next(&mut self) -> Result<OpenFile, ExportError> {
        let number = self.next_number;
        let path = self.file_path(number);
        let handle = File::create(&path).map_err(|e| ExportError::stream(&path, e))?;
        let writer =
            StreamingPdfWriter::new(BufWriter::new(handle), PDF_VERSION).map_err(|e| ExportError::stream(&path, e))?;
        self.next_number += 1;
        info!("[ASSEMBLER] Opened {}", path.display());
        Ok(OpenFile { number, path, writer })
    }

    fn finalize(&mut self, file: OpenFile) -> Result<FinishedFile, ExportError> {
        let OpenFile { number, path, writer } = file;
        let pages = writer.page_count();
        let sync = || -> io::Result<()> {
            let handle = writer.finish()?.into_inner().map_err(|e| e.into_error())?;
            handle.sync_all()
        };
        sync().map_err(|e| ExportError::stream(&path, e))?;

        info!("[ASSEMBLER] Finalized {} ({} pages)", path.display(), pages);
        let finished = FinishedFile { number, path, pages };
        self.finished.push(finished.clone());
        Ok(finished)
    }
}

pub(crate) fn file_path(dir: &Path, prefix: &str, number: usize) -> PathBuf {
    dir.join(format!("{}_{}.pdf", prefix, number))
}

fn write_page(
    writer: &mut StreamingPdfWriter<BufWriter<File>>,
    canvas: PageCanvas,
    geometry: &PageGeometry,
) -> io::Result<()> {
    let mut xobjects = Dictionary::new();
    let mut operations = Vec::with_capacity(canvas.images.len() * 4);
    for (i, (image, placement)) in canvas.images.into_iter().enumerate() {
        let name = format!("Im{}", i);
        let id = writer.write_object(Object::Stream(image.into_stream()))?;
        operations.extend(draw_image(&name, &placement, geometry.page_height_pt));
        xobjects.set(name, Object::Reference(id));
    }

    let content_id = writer.write_content_stream(&Content { operations })?;
    let resources = dictionary! { "XObject" => xobjects };
    writer.write_page(geometry.page_width_pt, geometry.page_height_pt, content_id, resources)?;
    Ok(())
}
