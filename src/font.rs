use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Monospace font candidates probed when no `--font` path is given.
const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/System/Library/Fonts/Menlo.ttc",
    "/Library/Fonts/Courier New.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
];

/// A parsed monospace font plus the derived cell metric.
///
/// `glyph_width` is the square cell edge in pixels: the rounded mean of the
/// horizontal advance of 'a' and the scaled line height. Every glyph is drawn
/// into a `glyph_width x glyph_width` cell, so the canvas size is a pure
/// function of the grid and this metric.
pub struct GlyphFont {
    font: FontVec,
    scale: PxScale,
    glyph_width: u32,
}

impl GlyphFont {
    /// Parse font bytes and compute the cell metric at the given pixel size.
    pub fn from_bytes(data: Vec<u8>, px_size: f32) -> Result<Self> {
        if px_size <= 0.0 {
            return Err(anyhow!("Font size must be positive, got {}", px_size));
        }
        let font = FontVec::try_from_vec(data).context("parsing font data")?;
        let scale = PxScale::from(px_size);
        let glyph_width = {
            let scaled = font.as_scaled(scale);
            let advance = scaled.h_advance(scaled.glyph_id('a'));
            let width = ((advance + scaled.height()) / 2.0).round() as u32;
            width.max(1)
        };
        Ok(Self {
            font,
            scale,
            glyph_width,
        })
    }

    /// Load from an explicit path, failing fast if it cannot be read or parsed.
    pub fn from_path(path: &Path, px_size: f32) -> Result<Self> {
        let data =
            fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
        Self::from_bytes(data, px_size)
            .with_context(|| format!("loading font {}", path.display()))
    }

    /// Load the first readable font from the platform search list.
    ///
    /// Font availability is a startup precondition; there is no substitution
    /// beyond this explicit list.
    pub fn discover(px_size: f32) -> Result<Self> {
        for candidate in FONT_SEARCH_PATHS {
            let path = PathBuf::from(candidate);
            if path.is_file() {
                return Self::from_path(&path, px_size);
            }
        }
        Err(anyhow!(
            "No monospace font found. Tried: {}. Pass one explicitly with --font.",
            FONT_SEARCH_PATHS.join(", ")
        ))
    }

    pub fn font(&self) -> &FontVec {
        &self.font
    }

    pub fn scale(&self) -> PxScale {
        self.scale
    }

    /// Edge length in pixels of one glyph cell.
    pub fn glyph_width(&self) -> u32 {
        self.glyph_width
    }
}
