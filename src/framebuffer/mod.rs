//! Framebuffer stage: turns laid-out nodes into a filled cell grid.
//!
//! ```text
//! node table (computed_* valid) ──► compose_frame ──► current Frame
//!                                        │
//!                                        └─► hit regions (mouse routing)
//! ```

mod compose;
mod inheritance;

pub use compose::{compose_frame, ComposeContext, HitRegion};
pub use inheritance::{apply_opacity, effective_opacity, inherited_bg, inherited_fg};
