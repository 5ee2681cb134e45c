use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;

use crate::font::GlyphFont;
use crate::ramp::BrightnessRamp;
use crate::sampler::{CellGrid, GridSpec};

/// How glyphs are colored on the white canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Each glyph takes its cell's RGB color from the resized frame.
    #[default]
    Color,
    /// Every glyph is pure black; brightness is carried only by glyph choice.
    Black,
    /// Each glyph is drawn in `(gray, gray, gray)` for its cell.
    Gray,
}

/// Pixel dimensions of the canvas for a grid and glyph cell width.
pub fn canvas_size(grid: GridSpec, glyph_width: u32) -> (u32, u32) {
    (grid.columns * glyph_width, grid.rows * glyph_width)
}

/// Rasterize one frame's cell grid into a canvas.
///
/// The canvas is pre-filled white, then each cell's glyph is drawn at
/// `(x * glyph_width, y * glyph_width)` in row-major order. Stateless apart
/// from the shared immutable ramp and font, so frames can render in parallel.
pub fn render_canvas(
    cells: &CellGrid,
    grid: GridSpec,
    ramp: &BrightnessRamp,
    font: &GlyphFont,
    mode: ColorMode,
) -> RgbImage {
    let glyph_width = font.glyph_width();
    let (width, height) = canvas_size(grid, glyph_width);
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

    let mut buf = [0u8; 4];
    for y in 0..grid.rows {
        for x in 0..grid.columns {
            let gray = cells.gray_at(x, y);
            let glyph = ramp.glyph_for(gray);
            let color = match mode {
                ColorMode::Color => cells.rgb_at(x, y),
                ColorMode::Black => Rgb([0, 0, 0]),
                ColorMode::Gray => Rgb([gray, gray, gray]),
            };
            draw_text_mut(
                &mut canvas,
                color,
                (x * glyph_width) as i32,
                (y * glyph_width) as i32,
                font.scale(),
                font.font(),
                glyph.encode_utf8(&mut buf),
            );
        }
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_size_is_grid_times_glyph() {
        let grid = GridSpec::new(100, 1.6).unwrap();
        assert_eq!(canvas_size(grid, 9), (900, 558));
        assert_eq!(canvas_size(grid, 1), (100, 62));
    }

    #[test]
    fn canvas_size_deterministic_across_frames() {
        let grid = GridSpec::new(80, 16.0 / 9.0).unwrap();
        let first = canvas_size(grid, 8);
        for _ in 0..3 {
            assert_eq!(canvas_size(grid, 8), first);
        }
    }
}
