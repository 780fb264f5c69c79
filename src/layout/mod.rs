//! Layout stage: flexbox computation over the node table plus the text
//! measurement it depends on.
//!
//! ```text
//! SharedRegion ──► compute_layout (taffy over node table)
//!                      │ writes computed_{x,y,width,height},
//!                      │ content sizes, scroll extents
//!                      ▼
//!                  framebuffer compositor
//! ```

pub mod flow;
pub mod measure;
mod tree;

pub use flow::{truncate_text, wrap_text, wrapped_height};
pub use measure::{char_width, display_width, grapheme_width, strip_escapes};
pub use tree::{compute_layout, LayoutContext, LayoutDiagnostic};
