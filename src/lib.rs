//! weft-tui — a reactive terminal-UI rendering engine over a single shared
//! memory region.
//!
//! A producer (the declarative layer, possibly in another language) and the
//! renderer communicate exclusively through one fixed-layout region; there
//! is no owning pointer graph between pipeline stages and no locks.
//!
//! ```text
//! Producer (UI description)               Renderer (this crate's thread)
//! ─────────────────────────               ──────────────────────────────
//! write node fields + text                 consume wake word
//!        │                                 drain parsed input
//!        ▼                                 layout (taffy over node table)
//! ┌──────────────────────────────────────┐ compose (cell framebuffer)
//! │           SharedRegion               │ diff → minimal ANSI → stdout
//! │ header · node table · text pool      │ render_count += 1 (release)
//! │ framebuffers ×2 · event ring         │ park on wake word
//! └──────────────────────────────────────┘        │
//!        ▲                                        │
//!        └─── event ring (input, focus) ──────────┘
//! ```
//!
//! The region contract lives in [`region`]; the render loop in [`pipeline`];
//! layout, compositing, and emission in [`layout`], [`framebuffer`], and
//! [`renderer`]; input routing in [`input`].

pub mod error;
pub mod framebuffer;
pub mod input;
pub mod layout;
pub mod pipeline;
pub mod region;
pub mod renderer;
pub mod types;

use std::sync::OnceLock;

pub use error::EngineError;
pub use pipeline::{Engine, EngineConfig, RenderPipeline, WakeConfig};
pub use region::{RegionConfig, SharedRegion};

// =============================================================================
// C-ABI OPERATIONAL SURFACE
// =============================================================================

/// The attached region, initialized once via `engine_init`.
static REGION: OnceLock<SharedRegion> = OnceLock::new();

/// The running engine handle.
static ENGINE: OnceLock<Engine> = OnceLock::new();

/// Attach to a producer-initialized region and start the renderer thread.
///
/// Returns 0 on success, an [`EngineError::code`] on validation failure,
/// 100 when already initialized, 101 when the thread failed to spawn.
///
/// # Safety
/// `region_ptr` must point to `region_len` valid bytes that outlive the
/// process (the producer owns the allocation and never moves it).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn engine_init(region_ptr: *mut u8, region_len: usize) -> i32 {
    let region = match unsafe { SharedRegion::attach(region_ptr, region_len) } {
        Ok(region) => region,
        Err(e) => {
            log::error!("engine_init: {e}");
            return e.code();
        }
    };
    if REGION.set(region).is_err() {
        log::error!("engine_init: already initialized");
        return 100;
    }
    let region = REGION.get().expect("just set");
    match Engine::start(region, EngineConfig::default()) {
        Ok(engine) => {
            let _ = ENGINE.set(engine);
            0
        }
        Err(e) => {
            log::error!("engine_init: failed to start renderer: {e}");
            101
        }
    }
}

/// Explicit wake for producers that cannot perform the atomic sequence
/// themselves: publishes pending writes and notifies the renderer.
#[unsafe(no_mangle)]
pub extern "C" fn engine_wake() {
    if let Some(region) = REGION.get() {
        region.wake();
    }
}

/// Request shutdown, join the renderer, and leave the terminal neutral.
#[unsafe(no_mangle)]
pub extern "C" fn engine_cleanup() {
    if let Some(engine) = ENGINE.get() {
        engine.stop();
    }
}
