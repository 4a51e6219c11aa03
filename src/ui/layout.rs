//! Foreground geometry in physical pixels.

use crate::shell::Navigation;
use crate::ui::draw::Rect;

pub const COVER_ART_SIZE: f32 = 200.0;
pub const COVER_CORNER_RADIUS: f32 = 6.0;
pub const COVER_TOP_MARGIN: f32 = 40.0;
pub const SECTION_PADDING: f32 = 16.0;
pub const GRID_SPACING: f32 = 14.0;
pub const GRID_COLUMNS: usize = 5;
pub const SWATCH_SIZE: f32 = 44.0;
pub const SWATCH_CORNER_RADIUS: f32 = 3.0;
pub const FREQUENCY_TEXT_SIZE: f32 = 8.0;
pub const BUTTON_SIZE: f32 = 44.0;
pub const BUTTON_SPACING: f32 = 8.0;
pub const STROKE_WIDTH: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Physical pixels per point.
    pub scale: f32,
    pub cover: Rect,
    pub backward: Rect,
    pub forward: Rect,
    grid_left: f32,
    grid_top: f32,
    column_width: f32,
}

impl Layout {
    /// Lays out a single centered column: cover art, buttons, palette grid.
    pub fn for_surface(width: u32, scale_factor: f32) -> Self {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        let width_f = width.max(1) as f32;

        let cover_size = COVER_ART_SIZE * scale;
        let cover = Rect::from_origin(
            (width_f - cover_size) * 0.5,
            COVER_TOP_MARGIN * scale,
            cover_size,
            cover_size,
        );

        let button = BUTTON_SIZE * scale;
        let row_width = 2.0 * button + BUTTON_SPACING * scale;
        let row_left = (width_f - row_width) * 0.5;
        let row_top = cover.bottom + SECTION_PADDING * scale;
        let backward = Rect::from_origin(row_left, row_top, button, button);
        let forward = Rect::from_origin(row_left + button + BUTTON_SPACING * scale, row_top, button, button);

        let grid_left = SECTION_PADDING * scale;
        let grid_width = (width_f - 2.0 * grid_left).max(0.0);
        let spacing = GRID_SPACING * scale;
        let column_width =
            ((grid_width - spacing * (GRID_COLUMNS - 1) as f32) / GRID_COLUMNS as f32).max(0.0);

        Self {
            scale,
            cover,
            backward,
            forward,
            grid_left,
            grid_top: forward.bottom + 2.0 * SECTION_PADDING * scale,
            column_width,
        }
    }

    /// Swatch square for palette entry `index`, centered in its grid cell.
    pub fn swatch(&self, index: usize) -> Rect {
        let spacing = GRID_SPACING * self.scale;
        let size = SWATCH_SIZE * self.scale;
        let column = index % GRID_COLUMNS;
        let row = index / GRID_COLUMNS;
        let cell_left = self.grid_left + column as f32 * (self.column_width + spacing);
        let left = cell_left + (self.column_width - size) * 0.5;
        let top = self.grid_top + row as f32 * (size + spacing);
        Rect::from_origin(left, top, size, size)
    }

    pub fn hit_test(&self, x: f32, y: f32) -> Option<Navigation> {
        if self.backward.contains(x, y) {
            Some(Navigation::Backward)
        } else if self.forward.contains(x, y) {
            Some(Navigation::Forward)
        } else {
            None
        }
    }
}
