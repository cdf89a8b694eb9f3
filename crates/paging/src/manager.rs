use std::time::{Duration, Instant};

use glam::Vec3;
use meshpage_cache::CacheStats;
use meshpage_common::{CellCoord, LodTier};

use crate::PagingError;
use crate::block::Block;
use crate::config::PagingConfig;
use crate::generator::SharedGenerator;
use crate::level::PagingLevel;

/// What one [`MeshManager::update`] did across all tiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerStats {
    pub levels: Vec<(LodTier, CacheStats)>,
    /// Live blocks after the update.
    pub blocks: usize,
    pub elapsed: Duration,
}

impl ManagerStats {
    pub fn recentered(&self) -> usize {
        self.levels.iter().filter(|(_, s)| s.recentered).count()
    }

    pub fn populated(&self) -> usize {
        self.levels.iter().map(|(_, s)| s.populated).sum()
    }

    pub fn evicted(&self) -> usize {
        self.levels.iter().map(|(_, s)| s.evicted).sum()
    }
}

/// Owns every LOD tier and keeps them following one focus.
///
/// Blocks are owned by their tier's cache; a block is part of the scene
/// exactly while it is reachable through [`MeshManager::blocks`].
pub struct MeshManager {
    generators: Vec<SharedGenerator>,
    levels: Vec<PagingLevel>,
    stats: ManagerStats,
}

impl std::fmt::Debug for MeshManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshManager")
            .field(
                "generators",
                &self.generators.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .field("levels", &self.levels)
            .field("stats", &self.stats)
            .finish()
    }
}

impl MeshManager {
    pub fn new(
        generators: Vec<SharedGenerator>,
        config: &PagingConfig,
    ) -> Result<Self, PagingError> {
        config.validate()?;
        let levels = config
            .levels
            .iter()
            .map(|level| PagingLevel::new(level, generators.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(
            levels = levels.len(),
            generators = generators.len(),
            "mesh manager ready"
        );
        Ok(Self {
            generators,
            levels,
            stats: ManagerStats::default(),
        })
    }

    /// Move every tier toward `focus`. All tiers are updated even if one
    /// fails; the first error is returned afterwards.
    pub fn update(&mut self, focus: Vec3) -> Result<&ManagerStats, PagingError> {
        let start = Instant::now();
        let _span = tracing::info_span!("manager_update", x = focus.x, y = focus.y).entered();

        let mut stats = ManagerStats::default();
        let mut first_error = None;
        for level in &mut self.levels {
            match level.update(focus) {
                Ok(s) => stats.levels.push((level.lod(), s)),
                Err(e) => {
                    stats.levels.push((level.lod(), level.cache().stats().clone()));
                    if first_error.is_none() {
                        first_error = Some(e);
                    } else {
                        tracing::warn!(lod = %level.lod(), error = %e, "level update failed");
                    }
                }
            }
        }
        stats.blocks = self.block_count();
        stats.elapsed = start.elapsed();
        self.stats = stats;

        match first_error {
            Some(e) => Err(e),
            None => Ok(&self.stats),
        }
    }

    pub fn levels(&self) -> &[PagingLevel] {
        &self.levels
    }

    pub fn level(&self, lod: LodTier) -> Option<&PagingLevel> {
        self.levels.iter().find(|l| l.lod() == lod)
    }

    pub fn level_mut(&mut self, lod: LodTier) -> Option<&mut PagingLevel> {
        self.levels.iter_mut().find(|l| l.lod() == lod)
    }

    /// Every live block across all tiers.
    pub fn blocks(&self) -> impl Iterator<Item = (CellCoord, &Block)> + '_ {
        self.levels.iter().flat_map(PagingLevel::blocks)
    }

    pub fn block_count(&self) -> usize {
        self.levels.iter().map(PagingLevel::block_count).sum()
    }

    /// Stats of the last update.
    pub fn stats(&self) -> &ManagerStats {
        &self.stats
    }

    pub fn generators(&self) -> &[SharedGenerator] {
        &self.generators
    }

    /// Distances at which generators would like detail to change, sorted and
    /// deduplicated. Nothing consumes these yet.
    pub fn lod_thresholds(&self) -> Vec<f32> {
        let mut thresholds: Vec<f32> = self
            .generators
            .iter()
            .flat_map(|g| g.lod_thresholds())
            .filter(|t| t.is_finite())
            .collect();
        thresholds.sort_by(f32::total_cmp);
        thresholds.dedup();
        thresholds
    }
}
