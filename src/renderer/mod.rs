//! Terminal output layer — the "blind" end of the pipeline.
//!
//! The renderer understands cells, nothing else: no nodes, no layout. The
//! compositor fills a [`Frame`]; [`DiffRenderer`] compares it to the
//! previously emitted frame and writes the minimal escape stream through an
//! [`OutputBuffer`] in one syscall.

pub mod ansi;
pub mod diff;
pub mod frame;
pub mod output;

pub use diff::DiffRenderer;
pub use frame::Frame;
pub use output::{CellWriter, OutputBuffer};
