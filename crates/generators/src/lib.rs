//! Reference content generators.
//!
//! [`FernGenerator`] is a full vegetation scatterer with per-tier detail
//! selection. [`GroundPatchGenerator`] and [`StripeGenerator`] are minimal
//! generators for skirts and for watching the paging window move.

mod fern;
mod ground;
mod rng;
mod stripes;

pub use fern::{FernConfig, FernGenerator, FlatGround, HeightField};
pub use ground::GroundPatchGenerator;
pub use rng::CellRng;
pub use stripes::StripeGenerator;

pub fn crate_info() -> &'static str {
    "meshpage-generators v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use meshpage_common::{LodTier, TextureRef};
    use meshpage_paging::{LevelConfig, MeshManager, PagingConfig, SharedGenerator};
    use std::sync::Arc;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("generators"));
    }

    #[test]
    fn generators_page_together() {
        let generators: Vec<SharedGenerator> = vec![
            Arc::new(GroundPatchGenerator::new(TextureRef::new("grass"))),
            Arc::new(FernGenerator::new(FernConfig::default())),
            Arc::new(StripeGenerator),
        ];
        let config = PagingConfig {
            levels: vec![LevelConfig {
                lod: LodTier(2),
                block_size: 4.0,
                cell_capacity: 3,
                ..LevelConfig::default()
            }],
        };
        let mut manager = MeshManager::new(generators, &config).unwrap();
        manager.update(Vec3::new(2.0, 2.0, 0.0)).unwrap();
        // the ground patch puts something in every cell
        assert_eq!(manager.block_count(), 9);
        // untextured ferns and stripes declare the same requirement
        assert_eq!(manager.levels()[0].requirement_count(), 2);
        assert_eq!(manager.lod_thresholds(), vec![800.0, 1200.0]);
    }
}
