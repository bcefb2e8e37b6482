/// Integer pixel dimensions at the export DPI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Where one symbol lands on a page, in PDF points measured from the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Placement {
    /// The y coordinate of the bottom edge in PDF space, where the origin is bottom-left.
    pub fn pdf_bottom(&self, page_height: f32) -> f32 {
        page_height - (self.y + self.height)
    }
}
