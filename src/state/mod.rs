mod types;
mod update;

pub use types::*;
pub use update::{
    clear_all_positions,
    clear_node_position,
    default_anchors,
    set_node_position,
    sync_gui_state,
    GraphKind,
};
