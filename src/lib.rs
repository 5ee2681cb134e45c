//! # charvid - Character-Art Video Library
//!
//! `charvid` converts videos into character-art videos: each frame is
//! downsampled to a coarse grid, every cell's brightness picks a glyph from a
//! fixed ramp, and the glyphs are rasterized onto a white canvas that
//! replaces the frame. The canvases are re-encoded at a caller-chosen frame
//! rate with the source audio passed through.
//!
//! ## Features
//!
//! - Brightness-ramp quantization with a configurable ASCII glyph ramp
//! - Color, black, and true-grayscale glyph rendering modes
//! - Parallel frame rendering
//! - Audio pass-through with start/end trimming
//! - Progress reporting for integration with UI applications
//!
//! ## Example
//!
//! ```no_run
//! use charvid::{Converter, ConvertOptions};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = Converter::new();
//! let options = ConvertOptions::default().with_columns(120).with_fps(12);
//! let report = converter.convert(
//!     Path::new("input.mp4"),
//!     Some(Path::new("output.mp4")),
//!     &options,
//! )?;
//! println!("wrote {} frames to {}", report.frame_count, report.output.display());
//! # Ok(())
//! # }
//! ```

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod assembler;
pub mod font;
pub mod ramp;
pub mod render;
pub mod sampler;
pub mod video;

pub use assembler::FrameAssembler;
pub use font::GlyphFont;
pub use ramp::{BrightnessRamp, DEFAULT_RAMP};
pub use render::ColorMode;
pub use sampler::{CellGrid, FrameStore, GridSpec};
pub use video::{ClipInfo, FfmpegConfig};

/// Represents the current phase of a conversion operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressPhase {
    /// Probing source metadata with ffprobe
    Probing,
    /// Extracting grid-sized frames from the source with ffmpeg
    ExtractingFrames,
    /// Rendering glyph canvases from extracted frames
    RenderingFrames,
    /// Encoding canvases and audio into the output container
    Encoding,
    /// Conversion completed successfully
    Complete,
}

/// Progress information for conversion operations
///
/// Provides detailed progress information that can be used to display
/// progress in UI applications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    /// Current phase of the conversion
    pub phase: ProgressPhase,
    /// Number of items completed in the current phase
    pub completed: usize,
    /// Total number of items in the current phase (0 if indeterminate)
    pub total: usize,
    /// Percentage complete (0.0 to 100.0)
    pub percentage: f64,
    /// Human-readable message describing current status
    pub message: String,
}

impl Progress {
    pub fn probing() -> Self {
        Self {
            phase: ProgressPhase::Probing,
            completed: 0,
            total: 0,
            percentage: 0.0,
            message: "Probing source clip...".to_string(),
        }
    }

    pub fn extracting_frames() -> Self {
        Self {
            phase: ProgressPhase::ExtractingFrames,
            completed: 0,
            total: 0,
            percentage: 0.0,
            message: "Extracting frames from video...".to_string(),
        }
    }

    pub fn rendering_frames(completed: usize, total: usize) -> Self {
        let percentage = if total > 0 {
            (completed as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        Self {
            phase: ProgressPhase::RenderingFrames,
            completed,
            total,
            percentage,
            message: format!("Rendering frame {} of {}", completed, total),
        }
    }

    pub fn encoding() -> Self {
        Self {
            phase: ProgressPhase::Encoding,
            completed: 0,
            total: 0,
            percentage: 0.0,
            message: "Encoding output video...".to_string(),
        }
    }

    pub fn complete(total_frames: usize) -> Self {
        Self {
            phase: ProgressPhase::Complete,
            completed: total_frames,
            total: total_frames,
            percentage: 100.0,
            message: format!("Conversion complete: {} frames", total_frames),
        }
    }
}

/// Configuration preset defining quality settings
#[derive(Debug, Deserialize, Clone)]
pub struct Preset {
    pub columns: u32,
    pub fps: u32,
    pub font_px: f32,
}

fn default_ramp() -> String {
    DEFAULT_RAMP.to_string()
}

fn default_start_str() -> String {
    "0".to_string()
}
fn default_end_str() -> String {
    String::new()
}

/// Application configuration with presets and the glyph ramp
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub presets: std::collections::HashMap<String, Preset>,
    pub default_preset: String,
    #[serde(default = "default_ramp")]
    pub ramp: String,
    #[serde(default = "default_start_str")]
    pub default_start: String,
    #[serde(default = "default_end_str")]
    pub default_end: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let default_json = r#"{
            "presets": {
                "default": {"columns": 200, "fps": 10, "font_px": 14.0},
                "small":   {"columns": 80,  "fps": 8,  "font_px": 12.0},
                "large":   {"columns": 320, "fps": 24, "font_px": 14.0}
            },
            "default_preset": "default",
            "default_start": "0",
            "default_end": ""
        }"#;
        serde_json::from_str(default_json).unwrap()
    }
}

/// Options for one conversion run
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Target width in characters (columns)
    pub columns: u32,
    /// Output frames per second, independent of the source frame rate
    pub fps: u32,
    /// Glyph coloring mode
    pub mode: ColorMode,
    /// Glyph ramp, densest glyph first
    pub ramp: String,
    /// Font pixel size used for rasterization and the cell metric
    pub font_px: f32,
    /// Explicit font path; platform monospace fonts are probed when unset
    pub font_path: Option<PathBuf>,
    /// Start trim time, seconds or `HH:MM:SS.mmm`
    pub start: Option<String>,
    /// End trim time, seconds or `HH:MM:SS.mmm`
    pub end: Option<String>,
    /// Keep the scratch directory of extracted frames and canvases
    pub keep_frames: bool,
    /// ffmpeg/ffprobe binaries to invoke
    pub ffmpeg: FfmpegConfig,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            columns: 200,
            fps: 10,
            mode: ColorMode::Color,
            ramp: DEFAULT_RAMP.to_string(),
            font_px: 14.0,
            font_path: None,
            start: None,
            end: None,
            keep_frames: false,
            ffmpeg: FfmpegConfig::default(),
        }
    }
}

impl ConvertOptions {
    pub fn with_columns(mut self, columns: u32) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_mode(mut self, mode: ColorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_ramp(mut self, ramp: String) -> Self {
        self.ramp = ramp;
        self
    }

    pub fn with_font_px(mut self, font_px: f32) -> Self {
        self.font_px = font_px;
        self
    }

    /// Create options from a preset
    pub fn from_preset(preset: &Preset, ramp: String) -> Self {
        Self {
            columns: preset.columns,
            fps: preset.fps,
            font_px: preset.font_px,
            ramp,
            ..Self::default()
        }
    }

    /// Resolve the trim window against the probed clip duration.
    fn trim_window(&self, clip_duration: f64) -> Result<(f64, f64)> {
        let start = match self.start.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => video::parse_timestamp(s),
            _ => 0.0,
        };
        let end = match self.end.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => video::parse_timestamp(s),
            _ => clip_duration,
        };
        if start < 0.0 || start >= clip_duration {
            return Err(anyhow!(
                "Start time {:.3}s is outside the clip (duration {:.3}s)",
                start,
                clip_duration
            ));
        }
        if end <= start {
            return Err(anyhow!(
                "End time {:.3}s is not after start time {:.3}s",
                end,
                start
            ));
        }
        Ok((start, end.min(clip_duration)))
    }
}

/// Summary of a completed conversion
#[derive(Debug, Clone)]
pub struct ConvertReport {
    /// Path the output clip was written to
    pub output: PathBuf,
    /// Number of output frames rendered and encoded
    pub frame_count: usize,
    /// Character grid used for every frame
    pub grid: GridSpec,
    /// Pixel dimensions of every canvas
    pub canvas_size: (u32, u32),
    /// Output duration in seconds
    pub duration: f64,
    /// Whether source audio was carried over
    pub audio: bool,
}

/// Main entry point for character-art video conversion
pub struct Converter {
    config: AppConfig,
}

impl Converter {
    /// Create a converter with default configuration
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    /// Create a converter with custom configuration
    pub fn with_config(config: AppConfig) -> Result<Self> {
        // Validate the ramp up front so every preset-derived run inherits a
        // usable glyph set.
        BrightnessRamp::new(&config.ramp)?;
        Ok(Self { config })
    }

    /// Load configuration from a file
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&text).context("parsing config json")?;
        Self::with_config(config)
    }

    /// Get the current configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a preset by name
    pub fn get_preset(&self, name: &str) -> Option<&Preset> {
        self.config.presets.get(name)
    }

    /// Get conversion options from a preset name
    pub fn options_from_preset(&self, preset_name: &str) -> Result<ConvertOptions> {
        let preset = self
            .get_preset(preset_name)
            .ok_or_else(|| anyhow!("Preset '{}' not found", preset_name))?;
        Ok(ConvertOptions::from_preset(
            preset,
            self.config.ramp.clone(),
        ))
    }

    /// Convert a video into a character-art video.
    ///
    /// When `output` is `None` the result is written next to the input as
    /// `<stem>_char.mp4`.
    pub fn convert(
        &self,
        input: &Path,
        output: Option<&Path>,
        options: &ConvertOptions,
    ) -> Result<ConvertReport> {
        self.convert_with_progress(input, output, options, |_| {})
    }

    /// Convert a video with detailed progress reporting.
    ///
    /// The callback receives a [`Progress`] update for each phase and for
    /// every rendered frame, making it suitable for UI integration.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use charvid::{Converter, ConvertOptions, ProgressPhase};
    /// use std::path::Path;
    ///
    /// let converter = Converter::new();
    /// let options = ConvertOptions::default();
    ///
    /// converter.convert_with_progress(
    ///     Path::new("video.mp4"),
    ///     None,
    ///     &options,
    ///     |progress| {
    ///         if progress.phase == ProgressPhase::RenderingFrames {
    ///             println!("{}/{} ({:.1}%)",
    ///                 progress.completed, progress.total, progress.percentage);
    ///         }
    ///     },
    /// ).unwrap();
    /// ```
    pub fn convert_with_progress<F>(
        &self,
        input: &Path,
        output: Option<&Path>,
        options: &ConvertOptions,
        progress_callback: F,
    ) -> Result<ConvertReport>
    where
        F: Fn(Progress) + Send + Sync,
    {
        if !input.is_file() {
            return Err(anyhow!("Input does not exist: {}", input.display()));
        }
        if options.fps == 0 {
            return Err(anyhow!("Output fps must be at least 1"));
        }

        let ramp = BrightnessRamp::new(&options.ramp)?;
        let font = match &options.font_path {
            Some(path) => GlyphFont::from_path(path, options.font_px)?,
            None => GlyphFont::discover(options.font_px)?,
        };

        progress_callback(Progress::probing());
        let info = video::probe_clip(input, &options.ffmpeg)?;
        let grid = GridSpec::new(options.columns, info.aspect_ratio())?;
        let (start, end) = options.trim_window(info.duration)?;
        let duration = end - start;

        let output = match output {
            Some(p) => p.to_path_buf(),
            None => default_output_path(input),
        };
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating output dir {}", parent.display()))?;
            }
        }

        let scratch = video::TempDirGuard::new(
            std::env::temp_dir().join(format!(
                "charvid_{}_{}",
                std::process::id(),
                input
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("clip")
            )),
            options.keep_frames,
        );
        fs::create_dir_all(scratch.path()).context("creating scratch directory")?;

        progress_callback(Progress::extracting_frames());
        video::extract_frames(
            input,
            scratch.path(),
            grid,
            options.fps,
            start,
            duration,
            &options.ffmpeg,
        )?;

        let store = FrameStore::open(scratch.path(), grid, options.fps)?;
        let assembler = FrameAssembler::new(store, ramp, font, options.mode);
        let canvas_size = assembler.canvas_size();

        progress_callback(Progress::rendering_frames(0, assembler.frame_count()));
        let frame_count = assembler.render_all(scratch.path(), |completed, total| {
            progress_callback(Progress::rendering_frames(completed, total));
        })?;

        progress_callback(Progress::encoding());
        video::encode_clip(
            scratch.path(),
            options.fps,
            input,
            start,
            duration,
            info.has_audio,
            &output,
            &options.ffmpeg,
        )?;

        progress_callback(Progress::complete(frame_count));

        Ok(ConvertReport {
            output,
            frame_count,
            grid,
            canvas_size,
            duration,
            audio: info.has_audio,
        })
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

/// Sibling path `<stem>_char.mp4` used when no output path is given.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{}_char.mp4", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.presets.contains_key(&cfg.default_preset));
        assert!(BrightnessRamp::new(&cfg.ramp).is_ok());
    }

    #[test]
    fn config_rejects_bad_ramp() {
        let mut cfg = AppConfig::default();
        cfg.ramp = "x".to_string();
        assert!(Converter::with_config(cfg).is_err());
    }

    #[test]
    fn preset_options_carry_config_ramp() {
        let converter = Converter::new();
        let opts = converter.options_from_preset("small").unwrap();
        assert_eq!(opts.columns, 80);
        assert_eq!(opts.fps, 8);
        assert_eq!(opts.ramp, DEFAULT_RAMP);
        assert!(converter.options_from_preset("nonsense").is_err());
    }

    #[test]
    fn trim_window_defaults_to_full_clip() {
        let opts = ConvertOptions::default();
        assert_eq!(opts.trim_window(12.5).unwrap(), (0.0, 12.5));
    }

    #[test]
    fn trim_window_parses_both_forms() {
        let mut opts = ConvertOptions::default();
        opts.start = Some("2".to_string());
        opts.end = Some("00:00:05.5".to_string());
        assert_eq!(opts.trim_window(10.0).unwrap(), (2.0, 5.5));
    }

    #[test]
    fn trim_window_duration_independent_of_fps() {
        for fps in [1u32, 10, 60] {
            let mut opts = ConvertOptions::default().with_fps(fps);
            opts.start = Some("1".to_string());
            opts.end = Some("4".to_string());
            let (start, end) = opts.trim_window(10.0).unwrap();
            assert_eq!(end - start, 3.0);
        }
    }

    #[test]
    fn trim_window_rejects_inverted_range() {
        let mut opts = ConvertOptions::default();
        opts.start = Some("5".to_string());
        opts.end = Some("2".to_string());
        assert!(opts.trim_window(10.0).is_err());

        opts.start = Some("20".to_string());
        opts.end = None;
        assert!(opts.trim_window(10.0).is_err());
    }

    #[test]
    fn trim_window_clamps_end_to_duration() {
        let mut opts = ConvertOptions::default();
        opts.end = Some("99".to_string());
        assert_eq!(opts.trim_window(10.0).unwrap(), (0.0, 10.0));
    }

    #[test]
    fn output_path_defaults_next_to_input() {
        let out = default_output_path(Path::new("/videos/cat.mp4"));
        assert_eq!(out, PathBuf::from("/videos/cat_char.mp4"));
    }

    #[test]
    fn progress_percentage() {
        let p = Progress::rendering_frames(25, 100);
        assert_eq!(p.percentage, 25.0);
        let done = Progress::complete(42);
        assert_eq!(done.percentage, 100.0);
        assert_eq!(done.completed, 42);
    }
}
