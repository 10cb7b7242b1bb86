//! sprite-gif - turn a sprite sheet into a looping GIF

use anyhow::{Context, Result};
use clap::Parser;
use sprite_gif::{validate_config, PartialGridConfig, ProgressEvent, SpriteConverter};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "sprite-gif", version, about = "Slice a sprite sheet into a grid and encode it as a looping GIF")]
struct Cli {
    /// Sprite sheet: file path, http(s) URL or data: URI
    input: String,

    /// Output file (defaults to the input file name with a .gif extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of rows in the sheet (1-20)
    #[arg(long, env = "SPRITE_GIF_ROWS", allow_negative_numbers = true)]
    rows: Option<i64>,

    /// Number of columns in the sheet (1-20)
    #[arg(long, env = "SPRITE_GIF_COLS", allow_negative_numbers = true)]
    cols: Option<i64>,

    /// Display time of each frame in milliseconds (10-2000)
    #[arg(short, long, env = "SPRITE_GIF_DURATION", allow_negative_numbers = true)]
    duration: Option<i64>,

    /// Encoder quality, 1 (best) to 30 (fastest)
    #[arg(short, long, env = "SPRITE_GIF_QUALITY", allow_negative_numbers = true)]
    quality: Option<i64>,

    /// Encoder worker threads
    #[arg(short, long, env = "SPRITE_GIF_WORKERS", allow_negative_numbers = true)]
    workers: Option<i64>,

    /// JSON file with any of `rows`, `cols`, `duration`, `quality`, `workers`;
    /// command line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only validate the configuration, do not convert
    #[arg(long)]
    check: bool,
}

impl Cli {
    fn flag_config(&self) -> PartialGridConfig {
        PartialGridConfig {
            rows: self.rows,
            cols: self.cols,
            duration: self.duration,
            quality: self.quality,
            workers: self.workers,
        }
    }

    fn grid_config(&self) -> Result<PartialGridConfig> {
        let file_config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                PartialGridConfig::from_json(&json)
                    .with_context(|| format!("failed to parse config {}", path.display()))?
            }
            None => PartialGridConfig::default(),
        };
        Ok(file_config.overlay(self.flag_config()))
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input))
    }
}

/// `sheet.png` -> `sheet.gif`; URLs and data URIs fall back to `animation.gif`.
fn default_output_path(input: &str) -> PathBuf {
    let is_remote = ["data:", "http://", "https://", "blob:"]
        .iter()
        .any(|scheme| input.starts_with(scheme));
    if is_remote {
        return PathBuf::from("animation.gif");
    }
    let path = input.strip_prefix("file://").unwrap_or(input);
    Path::new(path).with_extension("gif")
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.grid_config()?;

    if cli.check {
        let violations = validate_config(&config.merged_with_defaults());
        if violations.is_empty() {
            println!("configuration ok");
            return Ok(());
        }
        for violation in &violations {
            eprintln!("{}", violation);
        }
        anyhow::bail!("{} invalid setting(s)", violations.len());
    }

    let output = cli.output_path();
    let converter = SpriteConverter::new();

    let result = smol::block_on(converter.convert_with_progress(
        cli.input.as_str(),
        config,
        |event: ProgressEvent| eprintln!("{}...", event.kind()),
    ))
    .with_context(|| format!("failed to convert {}", cli.input))?;

    std::fs::write(&output, result.bytes())
        .with_context(|| format!("failed to write {}", output.display()))?;

    eprintln!(
        "Wrote {} ({} frames, {}x{}, {} bytes)",
        output.display(),
        result.frame_count,
        result.frame_width,
        result.frame_height,
        result.bytes().len()
    );

    converter.release(&result);
    Ok(())
}
