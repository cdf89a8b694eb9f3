use glam::{Vec2, Vec3};
use meshpage_common::{CellBounds, LodTier, TextureRef};
use meshpage_geom::{
    DrawResourceFactory, GeomError, GeomRequirements, RequirementCollection, RequirementId,
    Vertex, VertexLayout,
};
use meshpage_paging::ContentGenerator;

/// Covers every block with one textured quad at a fixed height.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundPatchGenerator {
    texture: TextureRef,
    height: f32,
}

impl GroundPatchGenerator {
    pub fn new(texture: TextureRef) -> Self {
        Self {
            texture,
            height: 0.0,
        }
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }
}

impl ContentGenerator for GroundPatchGenerator {
    fn name(&self) -> &str {
        "ground-patch"
    }

    fn register_requirements(
        &self,
        _lod: LodTier,
        collection: &mut RequirementCollection,
    ) -> Vec<RequirementId> {
        vec![collection.add(
            GeomRequirements::new(VertexLayout::v3n3t2()).with_texture(self.texture.clone()),
        )]
    }

    fn draw(
        &self,
        _lod: LodTier,
        bounds: CellBounds,
        requirements: &[RequirementId],
        factory: &mut DrawResourceFactory,
    ) -> Result<(), GeomError> {
        let Some(&id) = requirements.first() else {
            return Ok(());
        };
        let r = factory.draw_resources(id)?;
        let row = r.next_vertex();
        let z = self.height;
        let corners = [
            (Vec3::new(bounds.x0, bounds.y0, z), Vec2::new(0.0, 0.0)),
            (Vec3::new(bounds.x1, bounds.y0, z), Vec2::new(1.0, 0.0)),
            (Vec3::new(bounds.x1, bounds.y1, z), Vec2::new(1.0, 1.0)),
            (Vec3::new(bounds.x0, bounds.y1, z), Vec2::new(0.0, 1.0)),
        ];
        for (p, uv) in corners {
            r.add_vertex(Vertex::new(p).normal(Vec3::Z).texcoord(uv))?;
        }
        r.add_triangle(row, row + 1, row + 2)?;
        r.add_triangle(row, row + 2, row + 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_quad_per_block() {
        let ground = GroundPatchGenerator::new(TextureRef::new("grass")).with_height(-1.0);
        let mut collection = RequirementCollection::new();
        let ids = ground.register_requirements(LodTier(0), &mut collection);
        let mut factory = collection.draw_resource_factory().unwrap().unwrap();
        ground
            .draw(LodTier(0), CellBounds::new(2.0, 2.0, 4.0, 4.0), &ids, &mut factory)
            .unwrap();
        let node = factory.into_renderable().unwrap();
        assert_eq!(node.vertex_count(), 4);
        assert_eq!(node.triangle_count(), 2);
        node.for_each_geom(|state, g| {
            assert_eq!(state.texture, Some(TextureRef::new("grass")));
            assert!(g.positions().iter().all(|p| p.z == -1.0));
            assert_eq!(g.positions()[2], Vec3::new(4.0, 4.0, -1.0));
        });
    }
}
