//! The render engine: one watcher/renderer thread driving the
//! layout → framebuffer → diff pipeline, plus an optional stdin reader.
//!
//! ```text
//! producer writes ──► wake word ──┐
//! stdin reader ── events + wake ──┤
//!                                 ▼
//!                         renderer thread
//!                 consume wake → drain input → layout →
//!                 compose → diff → render_count += 1 → park
//! ```
//!
//! Any number of producer wakes that land before the watcher observes the
//! word coalesce into exactly one frame. `render_count` increments with
//! release ordering once the frame's effects (computed fields, framebuffer,
//! emitted bytes) are complete, so a producer spinning on it reads a
//! consistent frame.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as TermEvent};
use crossterm::tty::IsTty;

use crate::framebuffer::{compose_frame, ComposeContext, HitRegion};
use crate::layout::{compute_layout, LayoutContext};
use crate::region::{
    SharedRegion, H_FRAMEBUFFER_US, H_LAYOUT_US, H_RENDER_US, H_TOTAL_FRAME_US,
};
use crate::renderer::{ansi, DiffRenderer, Frame};
use crate::input::InputRouter;

use super::terminal::TerminalGuard;
use super::wake::{AdaptiveWaiter, WakeConfig};

// =============================================================================
// Pipeline
// =============================================================================

/// One frame's worth of pipeline state, reusable across frames. Owned by the
/// renderer thread; tests drive it synchronously.
pub struct RenderPipeline {
    layout: LayoutContext,
    compose: ComposeContext,
    diff: DiffRenderer,
    pub router: InputRouter,
    hits: Vec<HitRegion>,
    writer: Box<dyn Write + Send>,
    /// Framebuffer slot the next compose writes into.
    parity: usize,
    viewport: (u16, u16),
}

impl RenderPipeline {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            layout: LayoutContext::new(),
            compose: ComposeContext::new(),
            diff: DiffRenderer::new(),
            router: InputRouter::new(),
            hits: Vec::new(),
            writer,
            parity: 0,
            viewport: (0, 0),
        }
    }

    /// Run one full pipeline pass: layout → compose → diff → emit.
    pub fn run_frame(&mut self, region: &SharedRegion) -> io::Result<()> {
        let frame_start = Instant::now();

        // Viewport, clamped to the reserved framebuffer area. Exceeding it
        // is non-fatal: render the fitting part and log.
        let (tw, th) = region.terminal_size();
        let (mw, mh) = region.max_viewport();
        if tw > mw || th > mh {
            log::warn!("viewport {tw}x{th} exceeds reserved {mw}x{mh}, clamping");
        }
        let vw = tw.min(mw) as u16;
        let vh = th.min(mh) as u16;
        if vw == 0 || vh == 0 {
            return Ok(());
        }

        // A viewport change invalidates the previous frame: fill it with the
        // sentinel so the diff repaints everything.
        if (vw, vh) != self.viewport {
            self.viewport = (vw, vh);
            Frame::in_region(region, 1 - self.parity, vw, vh).invalidate();
            self.diff.reset_terminal_state();
            ansi::clear_screen(&mut self.writer)?;
        }

        let stage = Instant::now();
        compute_layout(region, &mut self.layout, (vw as u32, vh as u32));
        region.set_timer_us(H_LAYOUT_US, stage.elapsed().as_micros() as u32);

        let stage = Instant::now();
        {
            let mut current = Frame::in_region(region, self.parity, vw, vh);
            compose_frame(region, &mut current, &self.layout.diagnostics, &mut self.compose, &mut self.hits);
        }
        self.router.update_hit_regions(&self.hits, vw, vh);
        region.set_timer_us(H_FRAMEBUFFER_US, stage.elapsed().as_micros() as u32);

        let stage = Instant::now();
        {
            let current = Frame::in_region(region, self.parity, vw, vh);
            let previous = Frame::in_region(region, 1 - self.parity, vw, vh);
            self.diff.render(&current, &previous, &mut self.writer)?;
        }
        region.set_timer_us(H_RENDER_US, stage.elapsed().as_micros() as u32);

        // Swap current/previous roles; record which slot was emitted.
        region.set_emitted_parity(self.parity as u32);
        self.parity = 1 - self.parity;

        region.set_timer_us(H_TOTAL_FRAME_US, frame_start.elapsed().as_micros() as u32);
        region.render_count().fetch_add(1, Ordering::Release);
        Ok(())
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Engine start options.
pub struct EngineConfig {
    pub wake: WakeConfig,
    /// Enter raw mode / alternate screen when stdout is a terminal.
    pub manage_terminal: bool,
    /// Spawn the stdin reader thread.
    pub read_input: bool,
    /// Render sink; stdout when None.
    pub writer: Option<Box<dyn Write + Send>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { wake: WakeConfig::default(), manage_terminal: true, read_input: true, writer: None }
    }
}

impl EngineConfig {
    /// No terminal takeover, no stdin reader, frames to `writer`. The shape
    /// tests and embedders use.
    pub fn headless(writer: Box<dyn Write + Send>) -> Self {
        Self {
            wake: WakeConfig::default(),
            manage_terminal: false,
            read_input: false,
            writer: Some(writer),
        }
    }
}

/// Handle to a running engine.
pub struct Engine {
    region: &'static SharedRegion,
    running: Arc<AtomicBool>,
    render_thread: Mutex<Option<JoinHandle<()>>>,
    input_thread: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Spawn the renderer thread (and the stdin reader when configured).
    pub fn start(region: &'static SharedRegion, cfg: EngineConfig) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));

        let (tx, rx) = mpsc::channel();
        let input_thread = if cfg.read_input && io::stdin().is_tty() {
            Some(spawn_input_reader(region, tx, running.clone())?)
        } else {
            None
        };

        let wake = cfg.wake;
        let manage_terminal = cfg.manage_terminal;
        let writer = cfg.writer.unwrap_or_else(|| Box::new(io::stdout()));
        let running_render = running.clone();
        let render_thread = std::thread::Builder::new()
            .name("weft-render".to_string())
            .spawn(move || {
                if let Err(e) =
                    run_renderer(region, wake, manage_terminal, writer, rx, running_render)
                {
                    log::error!("renderer thread failed: {e}");
                }
            })?;

        Ok(Self {
            region,
            running,
            render_thread: Mutex::new(Some(render_thread)),
            input_thread: Mutex::new(input_thread),
        })
    }

    /// Cooperative shutdown: raise `requested_exit`, notify the wake word,
    /// and join both threads. The in-flight frame completes first.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.region.request_exit();
        if let Some(handle) = self.render_thread.lock().unwrap().take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.input_thread.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// The watcher/renderer loop described in the module docs above.
fn run_renderer(
    region: &'static SharedRegion,
    wake: WakeConfig,
    manage_terminal: bool,
    writer: Box<dyn Write + Send>,
    events: Receiver<TermEvent>,
    running: Arc<AtomicBool>,
) -> io::Result<()> {
    let mut terminal = TerminalGuard::new();
    if manage_terminal {
        terminal.enter()?;
        if let Some((w, h)) = TerminalGuard::size() {
            region.set_terminal_size(w as u32, h as u32);
        }
    }

    let mut pipeline = RenderPipeline::new(writer);
    let mut waiter = AdaptiveWaiter::new(wake);

    // Initial frame so the screen reflects whatever the producer staged
    // before starting the engine.
    pipeline.run_frame(region)?;

    loop {
        if region.exit_requested() || !running.load(Ordering::Relaxed) {
            break;
        }
        if region.consume_wake() {
            waiter.reset();
            while let Ok(event) = events.try_recv() {
                pipeline.router.handle(region, &event);
            }
            pipeline.run_frame(region)?;
            continue;
        }
        waiter.wait(region);
    }

    // Always leave the terminal neutral.
    ansi::reset(&mut pipeline.writer)?;
    pipeline.writer.flush()?;
    terminal.exit()?;
    running.store(false, Ordering::SeqCst);
    Ok(())
}

fn spawn_input_reader(
    region: &'static SharedRegion,
    tx: Sender<TermEvent>,
    running: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new().name("weft-input".to_string()).spawn(move || {
        // poll() sleeps in the kernel; the timeout only bounds shutdown
        // latency, not input latency.
        while running.load(Ordering::Relaxed) && !region.exit_requested() {
            match event::poll(Duration::from_millis(100)) {
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if tx.send(ev).is_err() {
                            break;
                        }
                        region.wake();
                    }
                    Err(e) => {
                        log::warn!("stdin read error: {e}");
                    }
                },
                Ok(false) => continue,
                Err(e) => {
                    log::warn!("stdin poll error: {e}");
                    break;
                }
            }
        }
    })
}
