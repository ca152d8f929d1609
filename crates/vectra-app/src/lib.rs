//! Vectra headless driver.
//!
//! Replays a JSON script of input events through the tool controller,
//! renders frames on a simulated render tick and reports the last frame.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use vectra_core::clock::FrameClock;
use vectra_core::config::{ConfigError, EditorConfig};
use vectra_core::input::InputEvent;
use vectra_core::render::{DrawCommand, RenderContext};
use vectra_core::scene::SceneError;
use vectra_core::shapes::ShapeProperties;
use vectra_core::tools::{ToolController, ToolError};
use vectra_render::{ApproximateTextLayout, CommandRecorder, RasterImageDecoder};

/// Driver errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Usage: {0}")]
    Usage(String),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Script parse error: {0}")]
    Script(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Tool(#[from] ToolError),
}

/// An image placed before the events run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePlacement {
    /// Relative paths resolve against the script's directory.
    pub path: PathBuf,
    pub x: f64,
    pub y: f64,
}

/// Input script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Script {
    pub images: Vec<ImagePlacement>,
    pub events: Vec<InputEvent>,
    /// Simulated time between two events.
    pub event_interval_ms: u64,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            images: Vec::new(),
            events: Vec::new(),
            event_interval_ms: 16,
        }
    }
}

/// What the driver prints.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub frames_rendered: usize,
    pub node_count: usize,
    pub commands: Vec<DrawCommand>,
    pub selected: Option<ShapeProperties>,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub script: PathBuf,
    pub config: Option<PathBuf>,
}

impl Args {
    /// Parse `<script.json> [--config <config.json>]`.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, AppError> {
        let mut script = None;
        let mut config = None;
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => match args.next() {
                    Some(path) => config = Some(PathBuf::from(path)),
                    None => return Err(AppError::Usage("--config needs a path".into())),
                },
                flag if flag.starts_with('-') => {
                    return Err(AppError::Usage(format!("unknown flag {flag}")));
                }
                _ if script.is_none() => script = Some(PathBuf::from(arg)),
                _ => return Err(AppError::Usage(format!("unexpected argument {arg}"))),
            }
        }
        let script = script.ok_or_else(|| AppError::Usage("vectra <script.json> [--config <config.json>]".into()))?;
        Ok(Self { script, config })
    }
}

fn read(path: &Path) -> Result<Vec<u8>, AppError> {
    std::fs::read(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_script(path: &Path) -> Result<Script, AppError> {
    let bytes = read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Replay `script` and return the final frame.
pub fn run(script: &Script, base_dir: &Path, config: EditorConfig) -> Result<Report, AppError> {
    let mut clock = FrameClock::new(config.frame_rate);
    let mut controller = ToolController::new(config).with_text_layout(Box::new(ApproximateTextLayout::new()));
    let mut decoder = RasterImageDecoder::new();

    for placement in &script.images {
        let bytes = read(&base_dir.join(&placement.path))?;
        controller.insert_image(&mut decoder, &bytes, placement.x, placement.y)?;
    }

    let start = Instant::now();
    let step = Duration::from_millis(script.event_interval_ms);
    let mut frames_rendered = 0;
    let mut now = start;
    for event in &script.events {
        controller.dispatch(event.clone())?;
        if clock.tick(now) {
            let mut recorder = CommandRecorder::new();
            controller.render(&mut RenderContext::new(&mut recorder));
            frames_rendered += 1;
        }
        now += step;
    }

    let mut recorder = CommandRecorder::new();
    controller.render(&mut RenderContext::new(&mut recorder));
    frames_rendered += 1;
    log::info!(
        "Replayed {} events, rendered {frames_rendered} frames",
        script.events.len()
    );

    Ok(Report {
        frames_rendered,
        node_count: controller.scene().len(),
        commands: recorder.into_commands(),
        selected: controller.selected_properties(),
    })
}

/// Entry point behind `main`.
pub fn run_cli(args: impl IntoIterator<Item = String>) -> Result<String, AppError> {
    let args = Args::parse(args)?;
    let config = match &args.config {
        Some(path) => EditorConfig::from_file(path)?,
        None => EditorConfig::default(),
    };
    let script = load_script(&args.script)?;
    let base_dir = args.script.parent().unwrap_or_else(|| Path::new("."));
    let report = run(&script, base_dir, config)?;
    Ok(serde_json::to_string_pretty(&report)?)
}
