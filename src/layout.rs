// src/layout.rs
//! Page geometry and pagination.
//!
//! Everything here is plain integer arithmetic on the validated
//! [`LayoutConfig`]. The planner runs once per export, before any file is
//! opened, so a degenerate layout never produces output.

use crate::config::{ItemSize, LayoutConfig, Margins};
use crate::error::ExportError;
use codesheet_types::units::{mm_to_px, px_to_pt};
use codesheet_types::{PixelSize, Placement};
use std::ops::Range;

/// The grid every page of an export shares.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    pub dpi: u32,
    pub page_px: PixelSize,
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub item_px: PixelSize,
    /// One slot including its margins and trailing spacing.
    pub cell_px: PixelSize,
    pub columns: u32,
    pub rows: u32,
    pub margins: Margins,
    pub spacing_x: u32,
    pub spacing_y: u32,
}

impl PageGeometry {
    pub fn plan(config: &LayoutConfig) -> Result<Self, ExportError> {
        if config.dpi == 0 {
            return Err(ExportError::InvalidLayout("dpi must be greater than zero".into()));
        }

        let (width_mm, height_mm) = config.paper.oriented_mm(config.orientation);
        let page_px = PixelSize::new(mm_to_px(width_mm, config.dpi), mm_to_px(height_mm, config.dpi));
        let margins = config.margins;

        let item_width = match config.item_size {
            ItemSize::Auto { items_per_row, .. } => {
                if items_per_row == 0 {
                    return Err(ExportError::InvalidLayout("itemsPerRow must be at least 1".into()));
                }
                let width = (page_px.width as f64 / items_per_row as f64 - margins.horizontal() as f64).floor();
                if width <= 0.0 {
                    return Err(ExportError::InvalidLayout(format!(
                        "{} items per row leave no room for a symbol on a {}px wide page with {}px side margins",
                        items_per_row,
                        page_px.width,
                        margins.horizontal()
                    )));
                }
                width as u32
            }
            ItemSize::Fixed { width, .. } => width,
        };
        let item_height = match config.item_size {
            ItemSize::Auto { height, .. } | ItemSize::Fixed { height, .. } => height.unwrap_or(item_width),
        };
        if item_width == 0 || item_height == 0 {
            return Err(ExportError::InvalidLayout(format!(
                "item size {}x{} is empty",
                item_width, item_height
            )));
        }

        let cell_width = item_width as u64 + margins.horizontal() + config.spacing_x as u64;
        let cell_height = item_height as u64 + margins.vertical() + config.spacing_y as u64;
        let columns = page_px.width as u64 / cell_width;
        let rows = page_px.height as u64 / cell_height;

        if columns == 0 || rows == 0 {
            return Err(ExportError::InvalidLayout(format!(
                "a {}x{}px cell does not fit on a {}x{}px page ({} columns, {} rows)",
                cell_width, cell_height, page_px.width, page_px.height, columns, rows
            )));
        }

        let geometry = Self {
            dpi: config.dpi,
            page_px,
            page_width_pt: px_to_pt(page_px.width as f32, config.dpi),
            page_height_pt: px_to_pt(page_px.height as f32, config.dpi),
            item_px: PixelSize::new(item_width, item_height),
            // A cell that fits on the page fits in u32
            cell_px: PixelSize::new(cell_width as u32, cell_height as u32),
            columns: columns as u32,
            rows: rows as u32,
            margins,
            spacing_x: config.spacing_x,
            spacing_y: config.spacing_y,
        };
        log::debug!(
            "[PLANNER] page {}x{}px, item {}x{}px, grid {}x{} ({} slots)",
            page_px.width,
            page_px.height,
            item_width,
            item_height,
            geometry.columns,
            geometry.rows,
            geometry.slots_per_page()
        );
        Ok(geometry)
    }

    pub fn slots_per_page(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    pub fn cell_width(&self) -> u32 {
        self.cell_px.width
    }

    pub fn cell_height(&self) -> u32 {
        self.cell_px.height
    }

    /// Top-left pixel of slot `slot`, filling rows left to right, then top to bottom.
    pub fn slot_origin_px(&self, slot: usize) -> (u32, u32) {
        let slot = slot as u32;
        let col = slot % self.columns;
        let row = slot / self.columns;
        (
            col * self.cell_width() + self.margins.left,
            row * self.cell_height() + self.margins.top,
        )
    }

    /// Where slot `slot` lands on the page, in points from the top-left corner.
    pub fn slot_placement(&self, slot: usize) -> Placement {
        let (x, y) = self.slot_origin_px(slot);
        Placement {
            x: px_to_pt(x as f32, self.dpi),
            y: px_to_pt(y as f32, self.dpi),
            width: px_to_pt(self.item_px.width as f32, self.dpi),
            height: px_to_pt(self.item_px.height as f32, self.dpi),
        }
    }
}

/// How `total_items` spread over pages and files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub total_items: usize,
    pub slots_per_page: usize,
    pub pages_per_file: usize,
    pub total_pages: usize,
    pub total_files: usize,
}

impl Pagination {
    pub fn new(total_items: usize, slots_per_page: usize, pages_per_file: usize) -> Self {
        let slots_per_page = slots_per_page.max(1);
        let pages_per_file = pages_per_file.max(1);
        let total_pages = total_items.div_ceil(slots_per_page);
        Self {
            total_items,
            slots_per_page,
            pages_per_file,
            total_pages,
            total_files: total_pages.div_ceil(pages_per_file),
        }
    }

    /// Global item indices on page `page` (0-based).
    pub fn page_items(&self, page: usize) -> Range<usize> {
        let start = (page * self.slots_per_page).min(self.total_items);
        let end = (start + self.slots_per_page).min(self.total_items);
        start..end
    }

    /// Global page indices belonging to file `file` (0-based).
    pub fn file_pages(&self, file: usize) -> Range<usize> {
        let start = (file * self.pages_per_file).min(self.total_pages);
        let end = (start + self.pages_per_file).min(self.total_pages);
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExportOptions;
    use codesheet_types::{Orientation, PaperSize};

    fn auto_a4() -> LayoutConfig {
        LayoutConfig {
            margins: Margins::symmetric(5, 10),
            spacing_x: 0,
            spacing_y: 0,
            item_size: ItemSize::Auto { items_per_row: 8, height: Some(300) },
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn auto_size_fills_the_row() {
        let geometry = PageGeometry::plan(&auto_a4()).unwrap();
        assert_eq!(geometry.page_px, PixelSize::new(1240, 1754));
        assert_eq!(geometry.item_px, PixelSize::new(145, 300));
        assert_eq!(geometry.columns, 8);
        assert_eq!(geometry.rows, 5);
        assert_eq!(geometry.slots_per_page(), 40);
    }

    #[test]
    fn defaults_plan_a_grid() {
        let (layout, _) = ExportOptions::default().validate().unwrap();
        let geometry = PageGeometry::plan(&layout).unwrap();
        // 200 + 20 + 10 = 230px cells
        assert_eq!(geometry.columns, 1240 / 230);
        assert_eq!(geometry.rows, 1754 / 230);
        assert_eq!(geometry.item_px, PixelSize::new(200, 200));
    }

    #[test]
    fn landscape_swaps_the_page() {
        let config = LayoutConfig { orientation: Orientation::Landscape, ..LayoutConfig::default() };
        let geometry = PageGeometry::plan(&config).unwrap();
        assert_eq!(geometry.page_px, PixelSize::new(1754, 1240));
    }

    #[test]
    fn oversized_item_is_invalid() {
        let config = LayoutConfig {
            paper: PaperSize::A5,
            item_size: ItemSize::Fixed { width: 5000, height: None },
            ..LayoutConfig::default()
        };
        assert!(matches!(PageGeometry::plan(&config), Err(ExportError::InvalidLayout(_))));
    }

    #[test]
    fn margins_wider_than_the_column_are_invalid() {
        let config = LayoutConfig {
            margins: Margins::symmetric(100, 10),
            item_size: ItemSize::Auto { items_per_row: 8, height: None },
            ..LayoutConfig::default()
        };
        assert!(matches!(PageGeometry::plan(&config), Err(ExportError::InvalidLayout(_))));
    }

    #[test]
    fn huge_margins_are_invalid_not_an_overflow() {
        let options = ExportOptions { side_margin: 3_000_000_000, top_margin: 3_000_000_000, ..Default::default() };
        let (layout, _) = options.validate().unwrap();
        assert!(matches!(PageGeometry::plan(&layout), Err(ExportError::InvalidLayout(_))));

        let config = LayoutConfig {
            spacing_x: u32::MAX,
            item_size: ItemSize::Fixed { width: u32::MAX, height: Some(10) },
            ..LayoutConfig::default()
        };
        assert!(matches!(PageGeometry::plan(&config), Err(ExportError::InvalidLayout(_))));
    }

    #[test]
    fn zero_sized_item_is_invalid() {
        let config = LayoutConfig {
            item_size: ItemSize::Fixed { width: 0, height: Some(10) },
            ..LayoutConfig::default()
        };
        assert!(matches!(PageGeometry::plan(&config), Err(ExportError::InvalidLayout(_))));
    }

    #[test]
    fn slot_origins_follow_rows() {
        let geometry = PageGeometry::plan(&auto_a4()).unwrap();
        assert_eq!(geometry.slot_origin_px(0), (5, 10));
        assert_eq!(geometry.slot_origin_px(1), (160, 10));
        assert_eq!(geometry.slot_origin_px(8), (5, 330));
        assert_eq!(geometry.slot_origin_px(39), (7 * 155 + 5, 4 * 320 + 10));
    }

    #[test]
    fn asymmetric_margins_shift_the_origin() {
        let config = LayoutConfig {
            margins: Margins { left: 20, right: 0, top: 0, bottom: 30 },
            spacing_x: 0,
            spacing_y: 0,
            item_size: ItemSize::Fixed { width: 100, height: Some(50) },
            ..LayoutConfig::default()
        };
        let geometry = PageGeometry::plan(&config).unwrap();
        assert_eq!(geometry.slot_origin_px(0), (20, 0));
        assert_eq!(geometry.slot_origin_px(1), (140, 0));
        assert_eq!(geometry.slot_origin_px(geometry.columns as usize), (20, 80));
    }

    #[test]
    fn placement_is_in_points() {
        let geometry = PageGeometry::plan(&auto_a4()).unwrap();
        let placement = geometry.slot_placement(0);
        assert!((placement.x - 2.4).abs() < 1e-4);
        assert!((placement.y - 4.8).abs() < 1e-4);
        assert!((placement.width - 69.6).abs() < 1e-4);
        assert!((placement.height - 144.0).abs() < 1e-4);
        assert!((geometry.page_width_pt - 595.2).abs() < 1e-3);
    }

    #[test]
    fn pagination_counts() {
        let p = Pagination::new(130, 40, 50);
        assert_eq!((p.total_pages, p.total_files), (4, 1));
        assert_eq!(p.page_items(3), 120..130);

        let p = Pagination::new(5000, 40, 50);
        assert_eq!((p.total_pages, p.total_files), (125, 3));
        assert_eq!(p.file_pages(2), 100..125);

        let p = Pagination::new(0, 40, 50);
        assert_eq!((p.total_pages, p.total_files), (0, 0));
    }
}
