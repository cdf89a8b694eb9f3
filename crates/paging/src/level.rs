use std::fmt;

use glam::Vec3;
use meshpage_cache::{CacheError, CacheStats, CellLifecycle, ToroidalCache};
use meshpage_common::{CellBounds, CellCoord, LodTier};
use meshpage_geom::{BufferLimits, GeomError, RequirementCollection, RequirementId};

use crate::PagingError;
use crate::block::Block;
use crate::config::{BatchingMode, LevelConfig};
use crate::generator::SharedGenerator;

/// The tier's requirement collection plus the ids each generator received.
struct LevelRequirements {
    collection: RequirementCollection,
    per_generator: Vec<Vec<RequirementId>>,
}

/// Builds and tears down the blocks of one tier; the cache's cell lifecycle.
pub struct BlockBuilder {
    lod: LodTier,
    block_size: f32,
    batching: BatchingMode,
    limits: BufferLimits,
    generators: Vec<SharedGenerator>,
    requirements: Option<LevelRequirements>,
}

impl fmt::Debug for BlockBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockBuilder")
            .field("lod", &self.lod)
            .field("block_size", &self.block_size)
            .field("batching", &self.batching)
            .field(
                "generators",
                &self.generators.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .field(
                "requirements",
                &self.requirements.as_ref().map(|r| r.collection.len()),
            )
            .finish()
    }
}

impl BlockBuilder {
    fn new(config: &LevelConfig, generators: Vec<SharedGenerator>) -> Self {
        Self {
            lod: config.lod,
            block_size: config.block_size,
            batching: config.batching,
            limits: config.limits,
            generators,
            requirements: None,
        }
    }

    /// Number of unique requirements, once the first block has been built.
    pub fn requirement_count(&self) -> Option<usize> {
        self.requirements.as_ref().map(|r| r.collection.len())
    }

    /// Build the block covering `bounds`, or `None` if nothing is drawn there.
    ///
    /// The requirement collection is gathered from the generators on the first
    /// call and reused afterwards.
    pub fn build_block(&mut self, bounds: CellBounds) -> Result<Option<Block>, GeomError> {
        let lod = self.lod;
        let generators = &self.generators;
        let (batching, limits) = (self.batching, self.limits);
        let reqs = self
            .requirements
            .get_or_insert_with(|| register(lod, generators, batching, limits));

        let Some(mut factory) = reqs.collection.draw_resource_factory()? else {
            return Ok(None);
        };
        for (generator, ids) in generators.iter().zip(&reqs.per_generator) {
            generator.draw(lod, bounds, ids, &mut factory)?;
        }
        Ok(factory
            .into_renderable()
            .map(|node| Block::new(lod, bounds, node)))
    }
}

fn register(
    lod: LodTier,
    generators: &[SharedGenerator],
    batching: BatchingMode,
    limits: BufferLimits,
) -> LevelRequirements {
    let mut collection =
        RequirementCollection::with_strategy(batching.strategy()).with_limits(limits);
    let per_generator = generators
        .iter()
        .map(|g| {
            let ids = g.register_requirements(lod, &mut collection);
            tracing::debug!(%lod, generator = g.name(), ?ids, "registered requirements");
            ids
        })
        .collect();
    tracing::info!(%lod, unique = collection.len(), "requirement collection built");
    LevelRequirements {
        collection,
        per_generator,
    }
}

impl CellLifecycle for BlockBuilder {
    type Value = Block;
    type Error = GeomError;

    fn populate(&mut self, cell: CellCoord) -> Result<Option<Block>, GeomError> {
        self.build_block(cell.bounds(self.block_size))
    }

    fn evict(&mut self, cell: CellCoord, block: Block) {
        tracing::debug!(
            lod = %self.lod,
            %cell,
            triangles = block.triangle_count(),
            "detaching block"
        );
    }
}

/// One LOD tier: a toroidal cache of blocks at one block size.
#[derive(Debug)]
pub struct PagingLevel {
    cache: ToroidalCache<BlockBuilder>,
}

impl PagingLevel {
    pub fn new(
        config: &LevelConfig,
        generators: Vec<SharedGenerator>,
    ) -> Result<Self, PagingError> {
        config.validate()?;
        let builder = BlockBuilder::new(config, generators);
        let cache = ToroidalCache::new(config.cache_config(), builder)
            .map_err(|e| cache_error(config.lod, e))?;
        Ok(Self { cache })
    }

    pub fn lod(&self) -> LodTier {
        self.cache.lifecycle().lod
    }

    pub fn block_size(&self) -> f32 {
        self.cache.lifecycle().block_size
    }

    /// Cell containing a world-space position.
    pub fn cell_at(&self, pos: Vec3) -> CellCoord {
        let p = pos / self.block_size();
        CellCoord::new(p.x.floor() as i32, p.y.floor() as i32)
    }

    /// Follow the focus, given in the owning root's coordinate space.
    pub fn update(&mut self, focus: Vec3) -> Result<CacheStats, PagingError> {
        let lod = self.lod();
        let p = focus * (1.0 / self.block_size());
        let _span = tracing::info_span!("level_update", %lod).entered();
        self.cache
            .update_center(p.x, p.y)
            .map_err(|e| cache_error(lod, e))
    }

    /// Build a block for arbitrary world bounds with this tier's generators,
    /// outside the cache.
    pub fn build_block(&mut self, bounds: CellBounds) -> Result<Option<Block>, PagingError> {
        Ok(self.cache.lifecycle_mut().build_block(bounds)?)
    }

    /// Rebuild one cell on the host's request.
    pub fn invalidate(&mut self, cell: CellCoord) -> Result<bool, PagingError> {
        let lod = self.lod();
        self.cache.replace(cell).map_err(|e| cache_error(lod, e))
    }

    /// Rebuild every cell whose last build failed.
    pub fn retry_failed(&mut self) -> Result<usize, PagingError> {
        let lod = self.lod();
        self.cache.retry_failed().map_err(|e| cache_error(lod, e))
    }

    pub fn block(&self, cell: CellCoord) -> Option<&Block> {
        self.cache.value(cell)
    }

    /// Live blocks with their cells, row-major.
    pub fn blocks(&self) -> impl Iterator<Item = (CellCoord, &Block)> + '_ {
        self.cache.values()
    }

    pub fn block_count(&self) -> usize {
        self.cache.ready_count()
    }

    pub fn cache(&self) -> &ToroidalCache<BlockBuilder> {
        &self.cache
    }

    pub fn requirement_count(&self) -> usize {
        self.cache.lifecycle().requirement_count().unwrap_or(0)
    }
}

fn cache_error(lod: LodTier, e: CacheError<GeomError>) -> PagingError {
    match e {
        CacheError::Configuration(msg) => PagingError::Configuration(format!("{lod}: {msg}")),
        CacheError::Populate { cell, source } => PagingError::Block { lod, cell, source },
    }
}
