use std::sync::Arc;

use meshpage_common::{CellBounds, LodTier};
use meshpage_geom::{DrawResourceFactory, GeomError, RequirementCollection, RequirementId};

/// A pluggable producer of procedural geometry (vegetation, terrain skirts, ...).
///
/// Generators are immutable and shared by every tier. The tier keeps the ids
/// returned from [`register_requirements`](Self::register_requirements) and
/// passes them back, in the same order, to every [`draw`](Self::draw) call for
/// that tier.
pub trait ContentGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Declare the kinds of geometry this generator emits at `lod`.
    fn register_requirements(
        &self,
        lod: LodTier,
        collection: &mut RequirementCollection,
    ) -> Vec<RequirementId>;

    /// Distances at which this generator's output changes noticeably.
    /// Informational only.
    fn lod_thresholds(&self) -> Vec<f32> {
        Vec::new()
    }

    /// Write every feature instance belonging to `bounds` into `factory`.
    fn draw(
        &self,
        lod: LodTier,
        bounds: CellBounds,
        requirements: &[RequirementId],
        factory: &mut DrawResourceFactory,
    ) -> Result<(), GeomError>;
}

pub type SharedGenerator = Arc<dyn ContentGenerator>;
