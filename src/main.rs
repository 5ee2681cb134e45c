use anyhow::{anyhow, Context, Result};
use charvid::{
    default_output_path, AppConfig, ColorMode, ConvertOptions, Converter, Progress, ProgressPhase,
};
use clap::{Parser, ValueEnum};
use dialoguer::{Confirm, FuzzySelect, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use walkdir::WalkDir;

fn load_config() -> Result<AppConfig> {
    // Look for charvid.json in app support, current dir fallback, then built-in default
    let mut tried: Vec<PathBuf> = Vec::new();
    if let Some(mut d) = dirs::data_dir() {
        d.push("charvid");
        d.push("charvid.json");
        tried.push(d);
    }
    tried.push(PathBuf::from("charvid.json"));

    for p in &tried {
        if p.exists() {
            let text =
                fs::read_to_string(p).with_context(|| format!("reading config {}", p.display()))?;
            let cfg: AppConfig = serde_json::from_str(&text).context("parsing config json")?;
            return Ok(cfg);
        }
    }

    Ok(AppConfig::default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Glyphs take their cell's color from the source frame
    Color,
    /// Black glyphs on white, brightness carried by glyph choice only
    Black,
    /// Glyphs drawn in their cell's gray value
    Gray,
}

impl From<ModeArg> for ColorMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Color => ColorMode::Color,
            ModeArg::Black => ColorMode::Black,
            ModeArg::Gray => ColorMode::Gray,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Convert a video into a character-art video.")]
struct Args {
    /// Input video file
    input: Option<PathBuf>,

    /// Output video path (default: <input stem>_char.mp4 next to the input)
    out: Option<PathBuf>,

    /// Target width in characters (columns)
    #[arg(long)]
    columns: Option<u32>,

    /// Output frames per second
    #[arg(long)]
    fps: Option<u32>,

    /// Glyph coloring mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Font pixel size for glyph rasterization
    #[arg(long)]
    font_size: Option<f32>,

    /// Path to a monospace TTF font (platform fonts are probed when unset)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Custom glyph ramp, densest glyph first
    #[arg(long)]
    ramp: Option<String>,

    /// Use default quality preset
    #[arg(long, default_value_t = false, conflicts_with_all = &["small", "large"])]
    default: bool,

    /// Use smaller default values for quality settings
    #[arg(long, short, default_value_t = false, conflicts_with_all = &["default", "large"])]
    small: bool,

    /// Use larger default values for quality settings
    #[arg(long, short, default_value_t = false, conflicts_with_all = &["default", "small"])]
    large: bool,

    /// Start time (e.g., 00:01:23.456 or 83.456)
    #[arg(long)]
    start: Option<String>,

    /// End time (e.g., 00:01:23.456 or 83.456)
    #[arg(long)]
    end: Option<String>,

    /// Keep the scratch directory of extracted frames and canvases
    #[arg(long, default_value_t = false)]
    keep_frames: bool,

    /// Log generation details to standard output
    #[arg(long, default_value_t = false)]
    log_details: bool,
}

fn main() -> Result<()> {
    let mut args = Args::parse();
    let is_interactive = !(args.default || args.small || args.large);

    // --- Interactive Prompts ---
    if args.input.is_none() {
        if !is_interactive {
            return Err(anyhow!("Input file must be provided when using a preset."));
        }
        let files = find_video_files()?;
        if files.is_empty() {
            return Err(anyhow!("No video files found in current directory."));
        }
        let selection = FuzzySelect::with_theme(&dialoguer::theme::ColorfulTheme::default())
            .with_prompt("Choose an input video")
            .default(0)
            .items(&files)
            .interact()?;
        args.input = Some(PathBuf::from(&files[selection]));
    }

    let input_path = args.input.as_ref().unwrap();
    if !input_path.is_file() {
        return Err(anyhow!(
            "Input path does not exist: {}",
            input_path.display()
        ));
    }

    // Load config and decide preset
    let cfg = load_config()?;
    let converter = Converter::with_config(cfg.clone())?;

    let active_preset_name = if args.small {
        "small"
    } else if args.large {
        "large"
    } else {
        cfg.default_preset.as_str()
    };

    let active = cfg
        .presets
        .get(active_preset_name)
        .ok_or_else(|| anyhow!(format!("Missing preset '{}' in config", active_preset_name)))?;

    if is_interactive {
        if args.columns.is_none() {
            args.columns = Some(
                Input::new()
                    .with_prompt("Columns (width in characters)")
                    .default(active.columns)
                    .interact()?,
            );
        }
        if args.fps.is_none() {
            args.fps = Some(
                Input::new()
                    .with_prompt("Output frames per second")
                    .default(active.fps)
                    .interact()?,
            );
        }
        if args.start.is_none() {
            args.start = Some(
                Input::new()
                    .with_prompt("Start time (e.g., 00:00:05)")
                    .default(cfg.default_start.clone())
                    .interact()?,
            );
        }
        if args.end.is_none() {
            args.end = Some(
                Input::new()
                    .with_prompt("End time (e.g., 00:00:10) (optional)")
                    .default(cfg.default_end.clone())
                    .interact()?,
            );
        }
    }

    let mut options: ConvertOptions = converter.options_from_preset(active_preset_name)?;
    options.columns = args.columns.unwrap_or(options.columns);
    options.fps = args.fps.unwrap_or(options.fps);
    options.mode = args.mode.map(ColorMode::from).unwrap_or_default();
    options.font_px = args.font_size.unwrap_or(options.font_px);
    options.font_path = args.font.clone();
    options.start = args.start.clone().filter(|s| !s.trim().is_empty() && s.trim() != "0");
    options.end = args.end.clone().filter(|s| !s.trim().is_empty());
    options.keep_frames = args.keep_frames;
    if let Some(ramp) = &args.ramp {
        options.ramp = ramp.clone();
    }

    let output_path = args
        .out
        .clone()
        .unwrap_or_else(|| default_output_path(input_path));

    if output_path.exists()
        && is_interactive
        && !Confirm::new()
            .with_prompt(format!(
                "Output file {} already exists. Overwrite?",
                output_path.display()
            ))
            .default(false)
            .interact()?
    {
        println!("Operation cancelled.");
        return Ok(());
    }

    // --- Execution ---
    let progress_bar: Arc<Mutex<Option<ProgressBar>>> = Arc::new(Mutex::new(None));
    let pb_clone = Arc::clone(&progress_bar);

    let report = converter.convert_with_progress(
        input_path,
        Some(&output_path),
        &options,
        move |progress: Progress| match progress.phase {
            ProgressPhase::Probing => println!("Probing source clip..."),
            ProgressPhase::ExtractingFrames => println!("Extracting frames..."),
            ProgressPhase::RenderingFrames => {
                let mut pb_guard = pb_clone.lock().unwrap();
                if pb_guard.is_none() {
                    let pb = ProgressBar::new(progress.total as u64);
                    pb.set_style(
                        ProgressStyle::default_bar()
                            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
                            .unwrap()
                            .progress_chars("#>-"),
                    );
                    pb.set_message("Rendering frames");
                    *pb_guard = Some(pb);
                }
                if let Some(ref pb) = *pb_guard {
                    pb.set_position(progress.completed as u64);
                }
            }
            ProgressPhase::Encoding => {
                let pb_opt = pb_clone.lock().unwrap().take();
                if let Some(pb) = pb_opt {
                    pb.finish_with_message("Rendered");
                }
                println!("Encoding output video...");
            }
            ProgressPhase::Complete => {}
        },
    )?;

    println!(
        "\nCharacter-art video written to {}",
        report.output.display()
    );

    let details = format!(
        "Version: {}\nFrames: {}\nGrid: {}x{}\nCanvas: {}x{}\nDuration: {:.2}s\nFPS: {}\nAudio: {}",
        env!("CARGO_PKG_VERSION"),
        report.frame_count,
        report.grid.columns,
        report.grid.rows,
        report.canvas_size.0,
        report.canvas_size.1,
        report.duration,
        options.fps,
        if report.audio { "yes" } else { "no" }
    );

    if args.log_details {
        println!("\n--- Generation Details ---");
        println!("{}", details);
    }

    Ok(())
}

fn find_video_files() -> Result<Vec<String>> {
    Ok(WalkDir::new(".")
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path().is_file()
                && e.path().extension().is_some_and(|ext| {
                    matches!(ext.to_str(), Some("mp4" | "mkv" | "mov" | "avi" | "webm"))
                })
        })
        .map(|e| e.path().to_str().unwrap_or("").to_string())
        .collect())
}
