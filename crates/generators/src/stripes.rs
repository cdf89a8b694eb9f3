use glam::{Vec3, Vec4};
use meshpage_common::{CellBounds, LodTier};
use meshpage_geom::{
    DrawResourceFactory, GeomError, GeomRequirements, RequirementCollection, RequirementId,
    Vertex, VertexLayout,
};
use meshpage_paging::ContentGenerator;

/// Draws one triangle in every block whose x origin is an even integer,
/// leaving the odd columns empty. Handy for checking paging by eye.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StripeGenerator;

impl ContentGenerator for StripeGenerator {
    fn name(&self) -> &str {
        "stripes"
    }

    fn register_requirements(
        &self,
        _lod: LodTier,
        collection: &mut RequirementCollection,
    ) -> Vec<RequirementId> {
        vec![collection.add(GeomRequirements::new(VertexLayout::v3n3c4()))]
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
        if bounds.x0.fract() != 0.0 || (bounds.x0 as i64).rem_euclid(2) != 0 {
            return Ok(());
        }
        let r = factory.draw_resources(id)?;
        let row = r.next_vertex();
        for p in [
            Vec3::new(bounds.x0, bounds.y0, 0.0),
            Vec3::new(bounds.x1, bounds.y0, 0.0),
            Vec3::new(bounds.x0, bounds.y1, 0.0),
        ] {
            r.add_vertex(Vertex::new(p).normal(Vec3::Z).color(Vec4::ONE))?;
        }
        r.add_triangle(row, row + 1, row + 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangles(x0: f32) -> usize {
        let mut collection = RequirementCollection::new();
        let ids = StripeGenerator.register_requirements(LodTier(0), &mut collection);
        let mut factory = collection.draw_resource_factory().unwrap().unwrap();
        StripeGenerator
            .draw(
                LodTier(0),
                CellBounds::new(x0, 0.0, x0 + 1.0, 1.0),
                &ids,
                &mut factory,
            )
            .unwrap();
        factory.into_renderable().map_or(0, |n| n.triangle_count())
    }

    #[test]
    fn even_columns_only() {
        assert_eq!(triangles(0.0), 1);
        assert_eq!(triangles(-2.0), 1);
        assert_eq!(triangles(4.0), 1);
        assert_eq!(triangles(1.0), 0);
        assert_eq!(triangles(-3.0), 0);
        assert_eq!(triangles(2.5), 0);
    }
}
