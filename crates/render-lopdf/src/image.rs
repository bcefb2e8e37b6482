use codesheet_types::Placement;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::content::Operation;
use lopdf::{Stream, dictionary};
use std::io::{self, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("could not decode image: {0}")]
    Decode(#[from] ::image::ImageError),
    #[error("image has zero width or height")]
    Empty,
    #[error("could not compress image data: {0}")]
    Compress(#[from] io::Error),
}

/// An RGB image ready to be written as a PDF image XObject.
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    compressed: Vec<u8>,
}

impl ImageXObject {
    /// Decodes an encoded raster image (PNG in practice) and deflates its RGB samples.
    pub fn from_encoded(bytes: &[u8]) -> Result<Self, ImageError> {
        let rgb = ::image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageError::Empty);
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(rgb.as_raw())?;
        let compressed = encoder.finish()?;

        Ok(Self {
            width,
            height,
            compressed,
        })
    }

    pub fn into_stream(self) -> Stream {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        Stream::new(dict, self.compressed)
    }
}

/// Content operations that paint the XObject `name` into `placement`.
///
/// `placement` is measured from the top-left corner; PDF space starts at the
/// bottom-left, so the y axis is flipped against `page_height`.
pub fn draw_image(name: &str, placement: &Placement, page_height: f32) -> Vec<Operation> {
    let bottom = placement.pdf_bottom(page_height);
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                placement.width.into(),
                0.into(),
                0.into(),
                placement.height.into(),
                placement.x.into(),
                bottom.into(),
            ],
        ),
        Operation::new("Do", vec![lopdf::Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}
