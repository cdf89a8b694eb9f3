use std::fmt::Write;

use glam::Vec3;
use meshpage_geom::RenderNode;
use meshpage_paging::MeshManager;

/// Viewer position and draw distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Blocks entirely farther than this are not drawn.
    pub far: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::ZERO,
            far: f32::INFINITY,
        }
    }
}

impl RenderView {
    /// Whether a bounding sphere reaches inside the draw distance.
    pub fn reaches(&self, center: Vec3, radius: f32) -> bool {
        self.eye.distance(center) - radius <= self.far
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
pub trait Renderer {
    type Output;

    /// Render one frame of the manager's live blocks.
    fn render(&self, manager: &MeshManager, view: &RenderView) -> Self::Output;
}

/// Human-readable dump of tiers, blocks and batch nodes.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Also list each block's batch node tree.
    pub show_nodes: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes(mut self) -> Self {
        self.show_nodes = true;
        self
    }
}

fn write_node(out: &mut String, node: &RenderNode, depth: usize) {
    let _ = write!(out, "{:indent$}{}", "", node.name, indent = 4 + depth * 2);
    if let Some(tex) = &node.state.texture {
        let _ = write!(out, " texture={tex}");
    }
    if node.state.transparency {
        out.push_str(" transparent");
    }
    for g in &node.geoms {
        let _ = write!(
            out,
            " [{} v={} t={}]",
            g.layout(),
            g.vertex_count(),
            g.triangle_count()
        );
    }
    out.push('\n');
    for child in &node.children {
        write_node(out, child, depth + 1);
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, manager: &MeshManager, view: &RenderView) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Mesh pages (levels={}, blocks={}) ===",
            manager.levels().len(),
            manager.block_count()
        );
        let _ = writeln!(
            out,
            "View: eye=({:.2}, {:.2}, {:.2}) far={}",
            view.eye.x, view.eye.y, view.eye.z, view.far
        );

        for level in manager.levels() {
            let window = level
                .cache()
                .window()
                .map(|w| format!("{}+{}", w.origin, w.size))
                .unwrap_or_else(|| "none".into());
            let _ = writeln!(
                out,
                "{} block_size={} window={} blocks={} requirements={}",
                level.lod(),
                level.block_size(),
                window,
                level.block_count(),
                level.requirement_count()
            );
            for (cell, block) in level.blocks() {
                let _ = writeln!(
                    out,
                    "  {cell} v={} t={}",
                    block.vertex_count(),
                    block.triangle_count()
                );
                if self.show_nodes {
                    write_node(&mut out, block.node(), 0);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshpage_common::LodTier;
    use meshpage_generators::StripeGenerator;
    use meshpage_paging::{LevelConfig, PagingConfig};
    use std::sync::Arc;

    fn manager() -> MeshManager {
        let config = PagingConfig {
            levels: vec![LevelConfig {
                lod: LodTier(0),
                block_size: 1.0,
                cell_capacity: 3,
                ..LevelConfig::default()
            }],
        };
        MeshManager::new(vec![Arc::new(StripeGenerator)], &config).unwrap()
    }

    #[test]
    fn debug_renderer_before_update() {
        let output = DebugTextRenderer::new().render(&manager(), &RenderView::default());
        assert!(output.contains("levels=1, blocks=0"));
        assert!(output.contains("window=none"));
    }

    #[test]
    fn debug_renderer_lists_blocks() {
        let mut m = manager();
        m.update(Vec3::new(0.5, 0.5, 0.0)).unwrap();
        let output = DebugTextRenderer::new()
            .with_nodes()
            .render(&m, &RenderView::default());
        assert!(output.contains("blocks=3"));
        assert!(output.contains("(0, -1) v=3 t=1"));
        assert!(output.contains("batch-1 [v3n3c4 v=3 t=1]"));
    }

    #[test]
    fn reach_accounts_for_radius() {
        let view = RenderView {
            eye: Vec3::ZERO,
            far: 10.0,
        };
        assert!(view.reaches(Vec3::new(11.0, 0.0, 0.0), 1.5));
        assert!(!view.reaches(Vec3::new(12.0, 0.0, 0.0), 1.5));
        assert!(RenderView::default().reaches(Vec3::splat(1e9), 0.0));
    }
}
