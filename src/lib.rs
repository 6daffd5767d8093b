//! Auto-layout engine for node-graph editors.
//!
//! Given a graph state (nodes, connections between their terminals, and
//! designated input/output anchor nodes) the engine assigns a canvas
//! position to every node. Stored positions are treated as pins and never
//! move; anchors without a pin get fixed slots in a left or right column;
//! everything else is placed by a force-directed relaxation. Groups of nodes
//! with no path to an anchor are laid out on their own and stacked below.
//!
//! The engine is synchronous and keeps no state between calls. Hosts either
//! call [`apply_layout`] directly or go through the JSON entry points in
//! [`wasm`].

pub mod error;
pub mod layout;
pub mod output;
pub mod state;
pub mod wasm;

pub use error::{Error, Result};
pub use layout::{
    apply_layout,
    compute_layout,
    LayoutConfig,
    LayoutReport,
    LayoutResult,
    Rect,
    Size,
};
pub use state::{
    AnchorRole,
    Connection,
    Endpoint,
    GraphKind,
    GraphState,
    GuiState,
    LineShape,
    Point,
};
