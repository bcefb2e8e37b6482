use crate::config::{SymbolStyle, Symbology};
use crate::error::EncodingError;
use barcoders::sym::code128::Code128;
use barcoders::sym::code39::Code39;
use barcoders::sym::ean13::EAN13;
use barcoders::sym::ean8::EAN8;
use barcoders::sym::tf::TF;
use image::{Rgb, RgbImage};

const MIN_BAR_HEIGHT: u32 = 10;

/// Encodes `text` into a module sequence (1 = bar, 0 = space).
pub fn encode_bars(text: &str, symbology: Symbology) -> Result<Vec<u8>, EncodingError> {
    let rejected = |reason: String| EncodingError::Rejected {
        text: text.to_string(),
        symbology,
        reason,
    };
    if text.is_empty() {
        return Err(rejected("empty input".into()));
    }

    let bars = match symbology {
        // Character set B covers printable ASCII
        Symbology::Code128 => Code128::new(format!("\u{0181}{}", text)).map(|b| b.encode()),
        Symbology::Ean13 => EAN13::new(text.to_string()).map(|b| b.encode()),
        Symbology::Ean8 => EAN8::new(text.to_string()).map(|b| b.encode()),
        // UPC-A is EAN-13 with a leading zero
        Symbology::Upca => EAN13::new(format!("0{}", text)).map(|b| b.encode()),
        Symbology::Code39 => Code39::new(text.to_string()).map(|b| b.encode()),
        Symbology::Itf => TF::interleaved(text.to_string()).map(|b| b.encode()),
    };
    bars.map_err(|e| rejected(e.to_string()))
}

/// Draws `text` as a linear barcode, one `bar_width`-pixel column per module.
pub(super) fn render(text: &str, style: &SymbolStyle) -> Result<RgbImage, EncodingError> {
    let bars = encode_bars(text, style.symbology)?;
    let module_width = style.bar_width.max(1);
    let height = style.bar_height.max(MIN_BAR_HEIGHT);
    let width = bars.len() as u32 * module_width;

    let dark = Rgb(style.foreground.to_array());
    let mut image = RgbImage::from_pixel(width, height, Rgb(style.background.to_array()));
    for (module, _) in bars.iter().enumerate().filter(|(_, bar)| **bar == 1) {
        let left = module as u32 * module_width;
        for x in left..left + module_width {
            for y in 0..height {
                image.put_pixel(x, y, dark);
            }
        }
    }
    Ok(image)
}
