//! The wake-driven render loop.
//!
//! ```text
//! producer: write fields → wake word := 1 (release) → notify
//! renderer: swap wake word (acquire) → one frame → render_count += 1
//!           (release) → adaptive spin → park
//! ```
//!
//! Coalescing is the wake word's job: N producer writes before the watcher
//! observes the word yield exactly one frame.

pub mod engine;
pub mod terminal;
pub mod wake;

pub use engine::{Engine, EngineConfig, RenderPipeline};
pub use terminal::TerminalGuard;
pub use wake::{AdaptiveWaiter, WakeConfig};
