use crate::config::SymbolStyle;
use crate::error::EncodingError;
use codesheet_types::PixelSize;
use image::{Rgb, RgbImage};
use qrcode::{EcLevel, QrCode};

/// Draws `text` as a high error-correction QR code with no quiet zone.
///
/// The code is scaled to the largest square that fits in `size` and
/// centred; any remaining area takes the background color.
pub(super) fn render(text: &str, size: PixelSize, style: &SymbolStyle) -> Result<RgbImage, EncodingError> {
    if size.width == 0 || size.height == 0 {
        return Err(EncodingError::EmptyCanvas { width: size.width, height: size.height });
    }

    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::H).map_err(|e| EncodingError::Qr {
        text: text.to_string(),
        reason: e.to_string(),
    })?;
    let modules = code.width();
    let colors = code.to_colors();

    let side = size.width.min(size.height);
    let offset_x = (size.width - side) / 2;
    let offset_y = (size.height - side) / 2;
    let dark = Rgb(style.foreground.to_array());
    let light = Rgb(style.background.to_array());

    let mut image = RgbImage::from_pixel(size.width, size.height, light);
    for y in 0..side {
        let my = y as usize * modules / side as usize;
        for x in 0..side {
            let mx = x as usize * modules / side as usize;
            if colors[my * modules + mx] == qrcode::Color::Dark {
                image.put_pixel(offset_x + x, offset_y + y, dark);
            }
        }
    }
    Ok(image)
}
