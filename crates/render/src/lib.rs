//! Rendering adapter: renderer-agnostic views over the blocks a
//! [`MeshManager`](meshpage_paging::MeshManager) currently holds.
//!
//! # Invariants
//! - Renderers only read paging state; they never build or evict blocks.
//! - Output depends only on the manager's live blocks and the view.

mod draw_list;
mod renderer;

pub use draw_list::{DrawBatch, DrawListRenderer};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "meshpage-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
