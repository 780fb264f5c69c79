//! Engine error taxonomy.
//!
//! Init/attach failures surface to the caller. Per-frame failures
//! (InvalidTree, ViewportOutOfRange) are non-fatal: the renderer skips the
//! offending subtree, paints a diagnostic cell, and continues.

use thiserror::Error;

/// Every failure the engine can report.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// The supplied region is smaller than the layout derived from its
    /// header capacities (or the requested config) requires.
    #[error("region too small: need {needed} bytes, got {got}")]
    BufferTooSmall { needed: usize, got: usize },

    /// The region header carries a different contract version than this
    /// build was compiled against.
    #[error("region version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// `alloc()` found no free slot in the node table.
    #[error("node table full ({max_nodes} slots)")]
    TableFull { max_nodes: u32 },

    /// The text pool cannot satisfy a write even after compaction.
    #[error("text pool exhausted: {requested} bytes requested, {free} free after compaction")]
    TextPoolExhausted { requested: usize, free: usize },

    /// A cycle was detected in the node hierarchy, or an index points
    /// outside the table.
    #[error("invalid node tree at slot {node}")]
    InvalidTree { node: usize },

    /// The terminal viewport exceeds the framebuffer area reserved at init.
    #[error("viewport {width}x{height} exceeds reserved {max_width}x{max_height}")]
    ViewportOutOfRange {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },
}

impl EngineError {
    /// Stable numeric kind for the C-ABI entry points.
    pub fn code(&self) -> i32 {
        match self {
            EngineError::BufferTooSmall { .. } => 1,
            EngineError::VersionMismatch { .. } => 2,
            EngineError::TableFull { .. } => 3,
            EngineError::TextPoolExhausted { .. } => 4,
            EngineError::InvalidTree { .. } => 5,
            EngineError::ViewportOutOfRange { .. } => 6,
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
