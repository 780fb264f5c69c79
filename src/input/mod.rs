//! Input routing: terminal events → node tree → event ring.
//!
//! Parsing raw stdin bytes is delegated to the terminal crate; this module
//! starts at parsed events:
//!
//! ```text
//! parsed events ──► InputRouter
//!                      ├── hit grid (mouse → topmost node)
//!                      ├── focus manager (tab order, click focus)
//!                      ├── scroll mutation (clamped, wheel chains)
//!                      └── event ring records (target + consumed)
//! ```

pub mod events;
pub mod focus;
pub mod router;
pub mod scroll;

pub use events::{EventKind, EventMask, EventRecord};
pub use focus::FocusManager;
pub use router::{HitGrid, InputRouter};
