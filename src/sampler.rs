use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Character-grid geometry for a whole run.
///
/// `rows` is derived once from the caller-supplied column count and the
/// source aspect ratio: `floor(columns / aspect)`, clamped to at least one
/// row. The grid never changes between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub columns: u32,
    pub rows: u32,
}

impl GridSpec {
    pub fn new(columns: u32, aspect_ratio: f64) -> Result<Self> {
        if columns == 0 {
            return Err(anyhow!("Grid width must be at least 1 column"));
        }
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return Err(anyhow!("Invalid aspect ratio: {}", aspect_ratio));
        }
        let rows = ((columns as f64 / aspect_ratio).floor() as u32).max(1);
        Ok(Self { columns, rows })
    }

    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

/// One downsampled frame: a grid-sized color buffer plus the per-cell gray
/// values the quantizer reads. Row-major, `grid.cell_count()` grays.
pub struct CellGrid {
    pub rgb: RgbImage,
    pub gray: Vec<u8>,
}

impl CellGrid {
    pub fn from_rgb(rgb: RgbImage) -> Self {
        let gray = rgb.pixels().map(|px| luminance(*px)).collect();
        Self { rgb, gray }
    }

    pub fn gray_at(&self, x: u32, y: u32) -> u8 {
        self.gray[y as usize * self.rgb.width() as usize + x as usize]
    }

    pub fn rgb_at(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.rgb.get_pixel(x, y)
    }
}

/// Rec. 709 luma, matching the weights used for ASCII cell brightness.
pub fn luminance(rgb: Rgb<u8>) -> u8 {
    let r = rgb[0] as f64;
    let g = rgb[1] as f64;
    let b = rgb[2] as f64;
    (0.2126 * r + 0.7152 * g + 0.0722 * b) as u8
}

/// Timestamp-indexed access to the frames extracted for one run.
///
/// Frames live on disk as `src_%05d.png`, already scaled to the grid and
/// sampled at the output fps, so `t` maps to an index with
/// `floor(t * fps)`. A timestamp at or past the end of the store is an
/// assembler sequencing bug and is reported as a hard error.
pub struct FrameStore {
    frames: Vec<PathBuf>,
    grid: GridSpec,
    fps: u32,
}

impl FrameStore {
    /// Collect the extracted frames from `dir` in index order.
    pub fn open(dir: &Path, grid: GridSpec, fps: u32) -> Result<Self> {
        if fps == 0 {
            return Err(anyhow!("Output fps must be at least 1"));
        }
        let mut frames: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension().map(|e| e == "png").unwrap_or(false)
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with("src_"))
            })
            .collect();
        frames.sort();
        if frames.is_empty() {
            return Err(anyhow!(
                "No extracted frames found in {}",
                dir.display()
            ));
        }
        Ok(Self { frames, grid, fps })
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    /// Duration covered by the store at the output fps.
    pub fn duration(&self) -> f64 {
        self.frames.len() as f64 / self.fps as f64
    }

    /// Index of the frame covering timestamp `t`.
    pub fn index_for(&self, t: f64) -> Result<usize> {
        if !t.is_finite() || t < 0.0 {
            return Err(anyhow!("Timestamp {} is before the clip start", t));
        }
        let index = (t * self.fps as f64).floor() as usize;
        if index >= self.frames.len() {
            return Err(anyhow!(
                "Timestamp {:.3}s is past the end of the clip ({} frames at {} fps)",
                t,
                self.frames.len(),
                self.fps
            ));
        }
        Ok(index)
    }

    /// Load the grid-sized cell buffer for timestamp `t`.
    pub fn sample(&self, t: f64) -> Result<CellGrid> {
        self.sample_index(self.index_for(t)?)
    }

    /// Load the grid-sized cell buffer for a known frame index.
    pub fn sample_index(&self, index: usize) -> Result<CellGrid> {
        let path = self
            .frames
            .get(index)
            .ok_or_else(|| anyhow!("Frame index {} out of range", index))?;
        let mut rgb = image::open(path)
            .with_context(|| format!("opening {}", path.display()))?
            .to_rgb8();
        // ffmpeg already scaled to the grid; resample only if it disagrees.
        if rgb.dimensions() != (self.grid.columns, self.grid.rows) {
            rgb = DynamicImage::ImageRgb8(rgb)
                .resize_exact(
                    self.grid.columns,
                    self.grid.rows,
                    image::imageops::FilterType::Triangle,
                )
                .to_rgb8();
        }
        Ok(CellGrid::from_rgb(rgb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_rows_from_aspect() {
        // floor(100 / 1.6) = 62
        let grid = GridSpec::new(100, 1.6).unwrap();
        assert_eq!(grid.columns, 100);
        assert_eq!(grid.rows, 62);

        let grid = GridSpec::new(200, 16.0 / 9.0).unwrap();
        assert_eq!(grid.rows, 112);
    }

    #[test]
    fn grid_rows_never_zero() {
        let grid = GridSpec::new(2, 100.0).unwrap();
        assert_eq!(grid.rows, 1);
    }

    #[test]
    fn grid_rejects_bad_input() {
        assert!(GridSpec::new(0, 1.6).is_err());
        assert!(GridSpec::new(100, 0.0).is_err());
        assert!(GridSpec::new(100, -1.0).is_err());
        assert!(GridSpec::new(100, f64::NAN).is_err());
    }

    #[test]
    fn grid_is_deterministic() {
        let a = GridSpec::new(120, 1.777).unwrap();
        let b = GridSpec::new(120, 1.777).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn luminance_weights() {
        assert_eq!(luminance(Rgb([0, 0, 0])), 0);
        assert_eq!(luminance(Rgb([255, 255, 255])), 254);
        assert!(luminance(Rgb([0, 255, 0])) > luminance(Rgb([255, 0, 0])));
        assert!(luminance(Rgb([255, 0, 0])) > luminance(Rgb([0, 0, 255])));
    }

    #[test]
    fn cell_grid_gray_layout() {
        let mut rgb = RgbImage::new(2, 2);
        rgb.put_pixel(0, 0, Rgb([0, 0, 0]));
        rgb.put_pixel(1, 0, Rgb([255, 255, 255]));
        rgb.put_pixel(0, 1, Rgb([255, 0, 0]));
        rgb.put_pixel(1, 1, Rgb([0, 255, 0]));
        let cells = CellGrid::from_rgb(rgb);
        assert_eq!(cells.gray.len(), 4);
        assert_eq!(cells.gray_at(0, 0), 0);
        assert_eq!(cells.gray_at(1, 0), 254);
        assert_eq!(cells.rgb_at(0, 1), Rgb([255, 0, 0]));
    }
}
