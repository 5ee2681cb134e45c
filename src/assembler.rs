use anyhow::{Context, Result};
use image::RgbImage;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::font::GlyphFont;
use crate::ramp::BrightnessRamp;
use crate::render::{canvas_size, render_canvas, ColorMode};
use crate::sampler::{FrameStore, GridSpec};

/// Drives per-timestamp canvas generation for one run.
///
/// Owns the immutable pieces (frame store, ramp, font, color mode) and
/// exposes `frame_at` as the pure generation primitive: given a timestamp it
/// produces one canvas, with no state carried between calls. The render loop
/// and any external encoder invoke it at their own cadence.
pub struct FrameAssembler {
    store: FrameStore,
    ramp: BrightnessRamp,
    font: GlyphFont,
    mode: ColorMode,
}

impl FrameAssembler {
    pub fn new(
        store: FrameStore,
        ramp: BrightnessRamp,
        font: GlyphFont,
        mode: ColorMode,
    ) -> Self {
        Self {
            store,
            ramp,
            font,
            mode,
        }
    }

    pub fn grid(&self) -> GridSpec {
        self.store.grid()
    }

    /// Pixel dimensions shared by every canvas of this run.
    pub fn canvas_size(&self) -> (u32, u32) {
        canvas_size(self.store.grid(), self.font.glyph_width())
    }

    pub fn frame_count(&self) -> usize {
        self.store.frame_count()
    }

    pub fn duration(&self) -> f64 {
        self.store.duration()
    }

    pub fn output_fps(&self) -> u32 {
        self.store.fps()
    }

    /// Render the canvas for timestamp `t` within `[0, duration)`.
    pub fn frame_at(&self, t: f64) -> Result<RgbImage> {
        let cells = self.store.sample(t)?;
        Ok(render_canvas(
            &cells,
            self.store.grid(),
            &self.ramp,
            &self.font,
            self.mode,
        ))
    }

    /// Render the canvas for a known output frame index.
    pub fn frame_at_index(&self, index: usize) -> Result<RgbImage> {
        let cells = self.store.sample_index(index)?;
        Ok(render_canvas(
            &cells,
            self.store.grid(),
            &self.ramp,
            &self.font,
            self.mode,
        ))
    }

    /// Render every output frame into `out_dir` as `canvas_%05d.png`.
    ///
    /// Frames render in parallel; file names carry the sequence order, so
    /// the encoder consumes them in increasing-time order regardless of
    /// completion order. Returns the number of frames written.
    pub fn render_all<F>(&self, out_dir: &Path, progress: F) -> Result<usize>
    where
        F: Fn(usize, usize) + Send + Sync,
    {
        let total = self.store.frame_count();
        let completed = AtomicUsize::new(0);

        (0..total)
            .into_par_iter()
            .try_for_each(|index| -> Result<()> {
                let canvas = self.frame_at_index(index)?;
                let out_path = out_dir.join(format!("canvas_{:05}.png", index + 1));
                canvas
                    .save(&out_path)
                    .with_context(|| format!("writing {}", out_path.display()))?;
                let current = completed.fetch_add(1, Ordering::SeqCst) + 1;
                progress(current, total);
                Ok(())
            })?;

        Ok(total)
    }
}
