//! `Scene` — the user actions of an interactive front end, headless.

use std::sync::Arc;

use tracing::info;

use kn_core::{Clock, Mode, MotionConfig, Point2D};
use kn_index::IndexAdapter;

use crate::{
    Canvas, FrameSink, MotionLoop, MotionSimulator, NoopObserver, ParamValidity, QueryEngine,
    QueryParams, SharedIndex, SimResult,
};

/// Owns the shared index, the motion loop, and the display state.
///
/// Every method is a single user action; each takes the index lock at most
/// once, except [`render`](Self::render) which takes it exactly once.
pub struct Scene {
    shared:  SharedIndex,
    config:  MotionConfig,
    clock:   Arc<dyn Clock>,
    canvas:  Canvas,
    params:  QueryParams,
    pointer: Point2D,
    grid:    bool,
    motion:  Option<MotionLoop>,
}

impl Scene {
    pub fn new(config: MotionConfig, clock: Arc<dyn Clock>, canvas: Canvas) -> SimResult<Self> {
        let adapter = IndexAdapter::new(config.clone(), Arc::clone(&clock))?;
        Ok(Self {
            shared: SharedIndex::new(adapter),
            config,
            clock,
            canvas,
            params: QueryParams::default(),
            pointer: Point2D::CENTER,
            grid: false,
            motion: None,
        })
    }

    pub fn shared(&self) -> &SharedIndex {
        &self.shared
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut QueryParams {
        &mut self.params
    }

    pub fn pointer(&self) -> Point2D {
        self.pointer
    }

    pub fn grid(&self) -> bool {
        self.grid
    }

    pub fn mode(&self) -> Mode {
        self.shared.lock().mode()
    }

    /// `true` while a motion loop is running.
    pub fn is_moving(&self) -> bool {
        self.motion.as_ref().is_some_and(MotionLoop::is_active)
    }

    // ── User actions ──────────────────────────────────────────────────────

    /// Replace the point set with `count` fresh points in the current mode.
    pub fn reseed(&mut self, count: i64) -> SimResult<()> {
        let mut index = self.shared.lock();
        let mode = index.mode();
        index.seed(count, mode)?;
        Ok(())
    }

    /// Parse text inputs into the query parameters.
    pub fn update_params(&mut self, num_neighbours: &str, distance_threshold: &str) -> ParamValidity {
        self.params.update_from_text(num_neighbours, distance_threshold)
    }

    /// Switch to velocity-augmented mode and start ticking.  No-op if the
    /// loop is already running.
    pub fn start_motion(&mut self) -> SimResult<()> {
        if self.is_moving() {
            return Ok(());
        }
        // Reap a loop that exited on its own.
        if let Some(old) = self.motion.take() {
            old.stop()?;
        }
        self.shared.lock().switch_mode(Mode::VelocityAugmented)?;
        let simulator = MotionSimulator::new(&self.config, Arc::clone(&self.clock));
        self.motion = Some(MotionLoop::spawn(
            self.shared.clone(),
            simulator,
            self.config.tick_interval(),
            NoopObserver,
        )?);
        info!("motion started");
        Ok(())
    }

    /// Freeze every point at its current position and stop ticking.
    pub fn stop_motion(&mut self) -> SimResult<()> {
        self.shared.lock().switch_mode(Mode::Static)?;
        if let Some(motion) = self.motion.take() {
            motion.stop()?;
            info!("motion stopped");
        }
        Ok(())
    }

    pub fn toggle_motion(&mut self) -> SimResult<bool> {
        if self.is_moving() {
            self.stop_motion()?;
        } else {
            self.start_motion()?;
        }
        Ok(self.is_moving())
    }

    pub fn toggle_grid(&mut self) -> bool {
        self.grid = !self.grid;
        self.grid
    }

    /// Move the query reference to a pixel position on the canvas.
    pub fn set_pointer_px(&mut self, px: f64, py: f64) {
        self.pointer = self.canvas.normalize(px, py);
    }

    pub fn set_pointer(&mut self, reference: Point2D) {
        self.pointer = reference;
    }

    pub fn resize(&mut self, canvas: Canvas) {
        self.canvas = canvas;
    }

    /// Build one frame and hand it to `sink`.
    pub fn render<S: FrameSink + ?Sized>(&self, sink: &mut S) -> SimResult<()> {
        let frame = QueryEngine::frame(&self.shared, &self.params, &self.canvas, self.pointer, self.grid);
        sink.on_frame(&frame);
        Ok(())
    }
}
