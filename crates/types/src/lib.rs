pub mod color;
pub mod geometry;
pub mod paper;
pub mod units;

pub use color::{Color, ColorParseError};
pub use geometry::{PixelSize, Placement};
pub use paper::{Orientation, PaperSize};
