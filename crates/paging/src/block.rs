use glam::Vec3;
use meshpage_common::{CellBounds, LodTier};
use meshpage_geom::RenderNode;

/// The renderable unit produced for one cache cell at one LOD tier.
///
/// Owned by the cache slot that built it and dropped when that slot is
/// evicted or replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    lod: LodTier,
    bounds: CellBounds,
    center: Vec3,
    radius: f32,
    node: RenderNode,
}

impl Block {
    pub fn new(lod: LodTier, bounds: CellBounds, node: RenderNode) -> Self {
        Self {
            lod,
            bounds,
            center: bounds.center(),
            radius: bounds.radius(),
            node,
        }
    }

    pub fn lod(&self) -> LodTier {
        self.lod
    }

    pub fn bounds(&self) -> CellBounds {
        self.bounds
    }

    /// Centre of the cell on the ground plane.
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Bounding radius of the cell footprint.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn node(&self) -> &RenderNode {
        &self.node
    }

    pub fn vertex_count(&self) -> usize {
        self.node.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.node.triangle_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshpage_geom::RenderState;

    #[test]
    fn metadata_derives_from_bounds() {
        let bounds = CellBounds::new(2.0, 4.0, 4.0, 6.0);
        let block = Block::new(
            LodTier(0),
            bounds,
            RenderNode::new("root", RenderState::default()),
        );
        assert_eq!(block.center(), Vec3::new(3.0, 5.0, 0.0));
        assert!((block.radius() - 2.0_f32.sqrt()).abs() < 1e-6);
        assert_eq!(block.triangle_count(), 0);
    }
}
