//! Headless driver: seeds a scene, runs motion, and logs one summary line
//! per rendered frame.
//!
//! ```text
//! headless [config.json] [points] [frames]
//! ```
//!
//! `config.json` is a `MotionConfig`; missing fields take their defaults.
//! Set `RUST_LOG=debug` to see every tick and rebuild.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use kn_core::{MotionConfig, SystemClock};
use kn_sim::{Canvas, Frame, FrameSink, Scene};

const CANVAS_W: f64 = 800.0;
const CANVAS_H: f64 = 600.0;
const FRAME_PERIOD: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    setup_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match args.first().filter(|a| a.as_str() != "-") {
        Some(path) => load_config(Path::new(path))?,
        None => MotionConfig::default(),
    };
    let points = args.get(1).map(|s| s.parse::<i64>()).transpose().context("points must be an integer")?.unwrap_or(1_000);
    let frames = args.get(2).map(|s| s.parse::<usize>()).transpose().context("frames must be an integer")?.unwrap_or(20);

    info!(?config, points, frames, "starting headless run");

    let mut scene = Scene::new(config, Arc::new(SystemClock), Canvas::new(CANVAS_W, CANVAS_H))?;
    scene.reseed(points)?;
    scene.toggle_grid();
    scene.start_motion()?;

    let mut sink = LogSink::default();
    let t0 = Instant::now();
    for i in 0..frames {
        // Sweep the pointer across the canvas so the match set changes.
        let f = i as f64 / frames.max(1) as f64;
        scene.set_pointer_px(f * CANVAS_W, (1.0 - f) * CANVAS_H);
        scene.render(&mut sink)?;
        thread::sleep(FRAME_PERIOD);
    }

    scene.stop_motion()?;
    scene.render(&mut sink)?;

    info!(
        frames = sink.frames,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        live = scene.shared().lock().live_count(),
        "run complete"
    );
    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn load_config(path: &Path) -> Result<MotionConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: MotionConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

#[derive(Default)]
struct LogSink {
    frames: usize,
}

impl FrameSink for LogSink {
    fn on_frame(&mut self, frame: &Frame) {
        self.frames += 1;
        info!(
            frame = self.frames,
            mode = %frame.mode,
            pointer = %frame.reference,
            matched = frame.result.matched.len(),
            unmatched = frame.result.unmatched.len(),
            nodes = frame.overlay.as_ref().map_or(0, Vec::len),
            "frame"
        );
    }
}
