// src/config.rs
//! Export options as they arrive from the caller, and the validated
//! settings the pipeline actually runs with.

use crate::error::ExportError;
use codesheet_types::{Color, Orientation, PaperSize};
use serde::{Deserialize, Deserializer, Serialize, de};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// What kind of symbol each code becomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolMode {
    #[default]
    Qr,
    Barcode,
}

/// Linear barcode symbologies available in barcode mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Symbology {
    #[default]
    Code128,
    Ean13,
    Ean8,
    Upca,
    Code39,
    Itf,
}

impl Symbology {
    pub const ALL: [Symbology; 6] = [
        Symbology::Code128,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::Upca,
        Symbology::Code39,
        Symbology::Itf,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Symbology::Code128 => "code128",
            Symbology::Ean13 => "ean13",
            Symbology::Ean8 => "ean8",
            Symbology::Upca => "upca",
            Symbology::Code39 => "code39",
            Symbology::Itf => "itf",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Symbology {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Symbology::ALL
            .into_iter()
            .find(|sym| sym.name() == wanted)
            .ok_or_else(|| ExportError::Config(format!("unknown barcode type '{}'", s)))
    }
}

// Option files go through `FromStr`, so `"EAN13"` and `"ean13"` both work.
impl<'de> Deserialize<'de> for Symbology {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

/// Raw export options, deserialized from camelCase JSON. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    pub mode: SymbolMode,
    pub paper: PaperSize,
    pub orientation: Orientation,
    pub dpi: u32,
    pub items_per_row: u32,
    pub side_margin: u32,
    pub top_margin: u32,
    pub margin_left: Option<u32>,
    pub margin_right: Option<u32>,
    pub margin_top: Option<u32>,
    pub margin_bottom: Option<u32>,
    pub spacing_x: u32,
    pub spacing_y: u32,
    pub auto_size: bool,
    pub item_width: u32,
    pub item_height: Option<u32>,
    pub foreground: Color,
    pub background: Color,
    pub barcode_type: Symbology,
    pub bar_width: u32,
    pub bar_height: u32,
    pub per_file_max_pages: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            mode: SymbolMode::Qr,
            paper: PaperSize::A4,
            orientation: Orientation::Portrait,
            dpi: 150,
            items_per_row: 8,
            side_margin: 10,
            top_margin: 10,
            margin_left: None,
            margin_right: None,
            margin_top: None,
            margin_bottom: None,
            spacing_x: 10,
            spacing_y: 10,
            auto_size: false,
            item_width: 200,
            item_height: None,
            foreground: Color::BLACK,
            background: Color::WHITE,
            barcode_type: Symbology::Code128,
            bar_width: 2,
            bar_height: 100,
            per_file_max_pages: 50,
        }
    }
}

impl ExportOptions {
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ExportError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            ExportError::Config(format!("failed to read options from '{}': {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Per-side margins, with the explicit side keys taking precedence over the symmetric ones.
    pub fn margins(&self) -> Margins {
        Margins {
            left: self.margin_left.unwrap_or(self.side_margin),
            right: self.margin_right.unwrap_or(self.side_margin),
            top: self.margin_top.unwrap_or(self.top_margin),
            bottom: self.margin_bottom.unwrap_or(self.top_margin),
        }
    }

    /// Checks the options that can be judged without laying anything out.
    pub fn validate(&self) -> Result<(LayoutConfig, SymbolStyle), ExportError> {
        if self.dpi == 0 {
            return Err(ExportError::Config("dpi must be greater than zero".into()));
        }
        if self.per_file_max_pages == 0 {
            return Err(ExportError::Config("perFileMaxPages must be at least 1".into()));
        }
        if self.auto_size && self.items_per_row == 0 {
            return Err(ExportError::Config("itemsPerRow must be at least 1 when autoSize is set".into()));
        }

        let layout = LayoutConfig {
            paper: self.paper,
            orientation: self.orientation,
            dpi: self.dpi,
            margins: self.margins(),
            spacing_x: self.spacing_x,
            spacing_y: self.spacing_y,
            item_size: if self.auto_size {
                ItemSize::Auto { items_per_row: self.items_per_row, height: self.item_height }
            } else {
                ItemSize::Fixed { width: self.item_width, height: self.item_height }
            },
            per_file_max_pages: self.per_file_max_pages as usize,
        };
        let style = SymbolStyle {
            foreground: self.foreground,
            background: self.background,
            symbology: self.barcode_type,
            bar_width: self.bar_width,
            bar_height: self.bar_height,
        };
        Ok((layout, style))
    }
}

/// Margins around every slot, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Margins {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
}

impl Margins {
    pub fn symmetric(side: u32, top: u32) -> Self {
        Self { left: side, right: side, top, bottom: top }
    }

    /// `left + right`, widened so oversized margins cannot overflow.
    pub fn horizontal(&self) -> u64 {
        self.left as u64 + self.right as u64
    }

    pub fn vertical(&self) -> u64 {
        self.top as u64 + self.bottom as u64
    }
}

/// How big each symbol is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSize {
    /// Width derived from the page width and the requested number of columns.
    Auto { items_per_row: u32, height: Option<u32> },
    Fixed { width: u32, height: Option<u32> },
}

/// Validated page and grid settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutConfig {
    pub paper: PaperSize,
    pub orientation: Orientation,
    pub dpi: u32,
    pub margins: Margins,
    pub spacing_x: u32,
    pub spacing_y: u32,
    pub item_size: ItemSize,
    pub per_file_max_pages: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            paper: PaperSize::A4,
            orientation: Orientation::Portrait,
            dpi: 150,
            margins: Margins::symmetric(10, 10),
            spacing_x: 10,
            spacing_y: 10,
            item_size: ItemSize::Fixed { width: 200, height: None },
            per_file_max_pages: 50,
        }
    }
}

/// Colors and barcode parameters shared by every symbol in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolStyle {
    pub foreground: Color,
    pub background: Color,
    pub symbology: Symbology,
    /// Width of one barcode module in pixels.
    pub bar_width: u32,
    pub bar_height: u32,
}

impl Default for SymbolStyle {
    fn default() -> Self {
        Self {
            foreground: Color::BLACK,
            background: Color::WHITE,
            symbology: Symbology::Code128,
            bar_width: 2,
            bar_height: 100,
        }
    }
}

/// One complete export job. Immutable once the run starts.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub codes: Vec<String>,
    pub mode: SymbolMode,
    pub layout: LayoutConfig,
    pub style: SymbolStyle,
}

impl ExportRequest {
    pub fn new(codes: Vec<String>, options: &ExportOptions) -> Result<Self, ExportError> {
        let (layout, style) = options.validate()?;
        Ok(Self { codes, mode: options.mode, layout, style })
    }
}
