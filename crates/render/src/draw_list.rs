use meshpage_common::{CellCoord, LodTier, TextureRef};
use meshpage_paging::MeshManager;
use serde::Serialize;

use crate::renderer::{RenderView, Renderer};

/// One geometry buffer ready to submit, with the state it draws under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawBatch {
    pub lod: LodTier,
    pub cell: CellCoord,
    pub texture: Option<TextureRef>,
    pub transparency: bool,
    pub vertex_count: usize,
    pub triangle_count: usize,
}

/// Flattens visible blocks into a draw list, one entry per geometry buffer.
///
/// Blocks whose bounding sphere lies entirely beyond the view's far distance
/// are skipped. Opaque batches come before transparent ones; order is
/// otherwise tier, cell, then batch node order.
#[derive(Debug, Default)]
pub struct DrawListRenderer;

impl Renderer for DrawListRenderer {
    type Output = Vec<DrawBatch>;

    fn render(&self, manager: &MeshManager, view: &RenderView) -> Vec<DrawBatch> {
        let mut batches = Vec::new();
        let mut culled = 0usize;
        for level in manager.levels() {
            for (cell, block) in level.blocks() {
                if !view.reaches(block.center(), block.radius()) {
                    culled += 1;
                    continue;
                }
                block.node().for_each_geom(|state, geom| {
                    if geom.is_empty() {
                        return;
                    }
                    batches.push(DrawBatch {
                        lod: block.lod(),
                        cell,
                        texture: state.texture.clone(),
                        transparency: state.transparency,
                        vertex_count: geom.vertex_count(),
                        triangle_count: geom.triangle_count(),
                    });
                });
            }
        }
        // stable: keeps tier and cell order within each pass
        batches.sort_by_key(|b| b.transparency);
        tracing::trace!(batches = batches.len(), culled, "draw list built");
        batches
    }
}
