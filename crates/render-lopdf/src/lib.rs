//! Streaming PDF output using lopdf object types.
//!
//! [`StreamingPdfWriter`] writes each object to the sink as soon as it is
//! produced and only keeps byte offsets in memory, so a document's size is
//! bounded by the sink rather than by RAM. [`ImageXObject`] turns encoded
//! raster images into PDF image streams, and [`draw_image`] produces the
//! content-stream operations that paint one onto a page.

mod image;
mod writer;

pub use self::image::{ImageError, ImageXObject, draw_image};
pub use writer::StreamingPdfWriter;
