use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command as ProcCommand;

use crate::sampler::GridSpec;

/// Names of the ffmpeg/ffprobe binaries to invoke, overridable for
/// non-standard installs.
#[derive(Debug, Clone)]
pub struct FfmpegConfig {
    ffmpeg: String,
    ffprobe: String,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

impl FfmpegConfig {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    pub fn ffmpeg_cmd(&self) -> &str {
        &self.ffmpeg
    }

    pub fn ffprobe_cmd(&self) -> &str {
        &self.ffprobe
    }
}

/// Source clip metadata read once before any frame work starts.
#[derive(Debug, Clone)]
pub struct ClipInfo {
    pub width: u32,
    pub height: u32,
    pub native_fps: f64,
    pub duration: f64,
    pub has_audio: bool,
}

impl ClipInfo {
    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}

/// Probe a clip's video stream, container duration, and audio presence.
pub fn probe_clip(input: &Path, config: &FfmpegConfig) -> Result<ClipInfo> {
    let stream = run_ffprobe(
        config,
        &[
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate",
            "-of",
            "csv=p=0",
        ],
        input,
    )?;
    let (width, height, native_fps) = parse_stream_line(stream.trim())
        .with_context(|| format!("parsing video stream info for {}", input.display()))?;

    let duration = run_ffprobe(
        config,
        &[
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "csv=p=0",
        ],
        input,
    )?;
    let duration: f64 = duration
        .trim()
        .parse()
        .with_context(|| format!("parsing duration for {}", input.display()))?;
    if duration <= 0.0 {
        return Err(anyhow!("Source clip has no duration: {}", input.display()));
    }

    let audio = run_ffprobe(
        config,
        &[
            "-v",
            "error",
            "-select_streams",
            "a",
            "-show_entries",
            "stream=index",
            "-of",
            "csv=p=0",
        ],
        input,
    )?;

    Ok(ClipInfo {
        width,
        height,
        native_fps,
        duration,
        has_audio: !audio.trim().is_empty(),
    })
}

fn run_ffprobe(config: &FfmpegConfig, args: &[&str], input: &Path) -> Result<String> {
    let output = ProcCommand::new(config.ffprobe_cmd())
        .args(args)
        .arg(input)
        .output()
        .context("running ffprobe")?;
    if !output.status.success() {
        return Err(anyhow!(
            "ffprobe failed for {}: {}",
            input.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse the `width,height,r_frame_rate` csv line from ffprobe.
fn parse_stream_line(line: &str) -> Result<(u32, u32, f64)> {
    let mut fields = line.split(',');
    let width: u32 = fields
        .next()
        .ok_or_else(|| anyhow!("missing width"))?
        .trim()
        .parse()
        .context("parsing width")?;
    let height: u32 = fields
        .next()
        .ok_or_else(|| anyhow!("missing height"))?
        .trim()
        .parse()
        .context("parsing height")?;
    let rate = parse_rate(fields.next().ok_or_else(|| anyhow!("missing frame rate"))?)?;
    if width == 0 || height == 0 {
        return Err(anyhow!("degenerate frame size {}x{}", width, height));
    }
    Ok((width, height, rate))
}

/// Parse an ffprobe rational frame rate such as `30000/1001` or `25/1`.
fn parse_rate(rate: &str) -> Result<f64> {
    let rate = rate.trim();
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().context("parsing frame rate numerator")?;
            let den: f64 = den.parse().context("parsing frame rate denominator")?;
            if den == 0.0 {
                return Err(anyhow!("frame rate denominator is zero"));
            }
            Ok(num / den)
        }
        None => rate.parse().context("parsing frame rate"),
    }
}

/// Parse a trim time given as seconds (`83.456`) or `HH:MM:SS.mmm`.
pub fn parse_timestamp(s: &str) -> f64 {
    s.split(':').rev().enumerate().fold(0.0, |acc, (i, v)| {
        acc + v.parse::<f64>().unwrap_or(0.0) * 60f64.powi(i as i32)
    })
}

/// Extract the trimmed clip as grid-sized PNG frames at the output fps.
///
/// The scale filter uses area averaging so each pixel of the extracted
/// frame is the mean of the source region covered by that grid cell.
pub fn extract_frames(
    input: &Path,
    out_dir: &Path,
    grid: GridSpec,
    fps: u32,
    start: f64,
    duration: f64,
    config: &FfmpegConfig,
) -> Result<()> {
    let out_pattern = out_dir.join("src_%05d.png");
    let mut args: Vec<String> = vec!["-loglevel".into(), "error".into(), "-y".into()];
    if start > 0.0 {
        args.push("-ss".into());
        args.push(start.to_string());
    }
    args.push("-i".into());
    args.push(path_arg(input)?);
    args.push("-t".into());
    args.push(duration.to_string());
    args.push("-vf".into());
    args.push(format!(
        "scale={}:{}:flags=area,fps={}",
        grid.columns, grid.rows, fps
    ));
    args.push(path_arg(&out_pattern)?);

    let status = ProcCommand::new(config.ffmpeg_cmd())
        .args(&args)
        .status()
        .context("running ffmpeg frame extraction")?;
    if !status.success() {
        return Err(anyhow!("ffmpeg frame extraction failed"));
    }
    Ok(())
}

/// Encode the rendered canvases into the output container.
///
/// Video comes from the `canvas_%05d.png` sequence at the output fps; when
/// the source has audio, the same trim window of the source is mapped in as
/// the audio track. Odd canvas dimensions are padded by one pixel of white so
/// yuv420p encoding accepts them.
pub fn encode_clip(
    canvas_dir: &Path,
    fps: u32,
    source: &Path,
    start: f64,
    duration: f64,
    has_audio: bool,
    output: &Path,
    config: &FfmpegConfig,
) -> Result<()> {
    let in_pattern = canvas_dir.join("canvas_%05d.png");
    let mut args: Vec<String> = vec![
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
        "-framerate".into(),
        fps.to_string(),
        "-i".into(),
        path_arg(&in_pattern)?,
    ];
    if has_audio {
        if start > 0.0 {
            args.push("-ss".into());
            args.push(start.to_string());
        }
        args.push("-t".into());
        args.push(duration.to_string());
        args.push("-i".into());
        args.push(path_arg(source)?);
        args.push("-map".into());
        args.push("0:v:0".into());
        args.push("-map".into());
        args.push("1:a:0".into());
        args.push("-c:a".into());
        args.push("aac".into());
        args.push("-shortest".into());
    }
    args.push("-vf".into());
    args.push("pad=ceil(iw/2)*2:ceil(ih/2)*2:color=white".into());
    args.push("-c:v".into());
    args.push("libx264".into());
    args.push("-pix_fmt".into());
    args.push("yuv420p".into());
    args.push(path_arg(output)?);

    let status = ProcCommand::new(config.ffmpeg_cmd())
        .args(&args)
        .status()
        .context("running ffmpeg encoding")?;
    if !status.success() {
        return Err(anyhow!("ffmpeg encoding failed"));
    }
    Ok(())
}

fn path_arg(path: &Path) -> Result<String> {
    path.to_str()
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("Non-UTF-8 path: {}", path.display()))
}

/// Temp directory removed when the guard drops, keeping extraction and
/// canvas scratch space out of the output tree on both success and failure.
pub struct TempDirGuard {
    path: PathBuf,
    keep: bool,
}

impl TempDirGuard {
    pub fn new(path: PathBuf, keep: bool) -> Self {
        Self { path, keep }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        if !self.keep {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}
