use std::path::Path;

use meshpage_cache::CacheConfig;
use meshpage_common::LodTier;
use meshpage_geom::{BatchStrategy, BufferLimits, NodePerRequirement, SharedStateGrouping};
use serde::{Deserialize, Serialize};

use crate::PagingError;

/// How a tier groups requirements into batch nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchingMode {
    /// One node per requirement.
    #[default]
    NodePerRequirement,
    /// Requirements with matching render state share nodes.
    SharedState,
}

impl BatchingMode {
    pub fn strategy(self) -> Box<dyn BatchStrategy> {
        match self {
            BatchingMode::NodePerRequirement => Box::new(NodePerRequirement),
            BatchingMode::SharedState => Box::new(SharedStateGrouping),
        }
    }
}

/// Configuration of one LOD tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub lod: LodTier,
    /// World units per cell edge.
    pub block_size: f32,
    /// Cache window edge in cells.
    pub cell_capacity: usize,
    /// Dead zone in cells, in `(0, 1)`.
    pub hysteresis: f32,
    pub batching: BatchingMode,
    pub limits: BufferLimits,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            lod: LodTier(1),
            block_size: 20.0 * 0.0002,
            cell_capacity: 7,
            hysteresis: 0.6,
            batching: BatchingMode::default(),
            limits: BufferLimits::default(),
        }
    }
}

impl LevelConfig {
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.cell_capacity, self.hysteresis)
    }

    pub fn validate(&self) -> Result<(), PagingError> {
        if !(self.block_size.is_finite() && self.block_size > 0.0) {
            return Err(PagingError::Configuration(format!(
                "{}: block_size must be positive, got {}",
                self.lod, self.block_size
            )));
        }
        if u32::try_from(self.limits.max_vertices).is_err() {
            return Err(PagingError::Configuration(format!(
                "{}: max_vertices must fit a u32 index, got {}",
                self.lod, self.limits.max_vertices
            )));
        }
        self.cache_config()
            .validate()
            .map_err(|e| PagingError::Configuration(format!("{}: {e}", self.lod)))
    }
}

/// Every LOD tier a [`MeshManager`](crate::MeshManager) runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    pub levels: Vec<LevelConfig>,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            levels: vec![LevelConfig::default()],
        }
    }
}

impl PagingConfig {
    pub fn validate(&self) -> Result<(), PagingError> {
        if self.levels.is_empty() {
            return Err(PagingError::Configuration("no levels configured".into()));
        }
        for (i, level) in self.levels.iter().enumerate() {
            if self.levels[..i].iter().any(|l| l.lod == level.lod) {
                return Err(PagingError::Configuration(format!(
                    "{} configured more than once",
                    level.lod
                )));
            }
            level.validate()?;
        }
        Ok(())
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, PagingError> {
        let config: PagingConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, PagingError> {
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading paging config");
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> Result<String, PagingError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_single_tier() {
        let c = PagingConfig::default();
        assert_eq!(c.levels.len(), 1);
        let level = &c.levels[0];
        assert_eq!(level.lod, LodTier(1));
        assert!((level.block_size - 0.004).abs() < 1e-9);
        assert_eq!(level.cell_capacity, 7);
        c.validate().unwrap();
    }

    #[test]
    fn rejects_bad_block_size() {
        for block_size in [0.0, -1.0, f32::INFINITY, f32::NAN] {
            let level = LevelConfig {
                block_size,
                ..LevelConfig::default()
            };
            assert!(matches!(
                level.validate(),
                Err(PagingError::Configuration(_))
            ));
        }
    }

    #[test]
    fn rejects_bad_cache_parameters() {
        let level = LevelConfig {
            hysteresis: 1.2,
            ..LevelConfig::default()
        };
        assert!(level.validate().is_err());
        assert!(PagingConfig { levels: vec![] }.validate().is_err());
    }

    #[test]
    fn rejects_vertex_limit_beyond_u32_indices() {
        let level = LevelConfig {
            limits: BufferLimits {
                max_vertices: u32::MAX as usize + 1,
                ..BufferLimits::default()
            },
            ..LevelConfig::default()
        };
        assert!(matches!(
            level.validate(),
            Err(PagingError::Configuration(_))
        ));
        let level = LevelConfig {
            limits: BufferLimits {
                max_vertices: u32::MAX as usize,
                ..BufferLimits::default()
            },
            ..LevelConfig::default()
        };
        level.validate().unwrap();
    }

    #[test]
    fn rejects_duplicate_tiers() {
        let tier = |lod, block_size| LevelConfig {
            lod: LodTier(lod),
            block_size,
            ..LevelConfig::default()
        };
        let config = PagingConfig {
            levels: vec![tier(0, 1.0), tier(1, 4.0), tier(0, 16.0)],
        };
        assert!(matches!(
            config.validate(),
            Err(PagingError::Configuration(_))
        ));
        let yaml = "levels:\n  - lod: 2\n  - lod: 2\n";
        assert!(matches!(
            PagingConfig::from_yaml_str(yaml),
            Err(PagingError::Configuration(_))
        ));
        PagingConfig {
            levels: vec![tier(0, 1.0), tier(1, 4.0)],
        }
        .validate()
        .unwrap();
    }

    #[test]
    fn parses_yaml_with_defaults() {
        let yaml = r#"
levels:
  - lod: 0
    block_size: 1.0
    cell_capacity: 5
    batching: shared_state
  - lod: 1
    block_size: 4.0
"#;
        let c = PagingConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(c.levels.len(), 2);
        assert_eq!(c.levels[0].batching, BatchingMode::SharedState);
        assert_eq!(c.levels[0].hysteresis, 0.6);
        assert_eq!(c.levels[1].cell_capacity, 7);
    }

    #[test]
    fn invalid_yaml_values_fail_validation() {
        let yaml = "levels:\n  - block_size: -2.0\n";
        assert!(matches!(
            PagingConfig::from_yaml_str(yaml),
            Err(PagingError::Configuration(_))
        ));
        assert!(matches!(
            PagingConfig::from_yaml_str("levels: 7"),
            Err(PagingError::ConfigParse(_))
        ));
    }

    #[test]
    fn load_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paging.yaml");
        let config = PagingConfig {
            levels: vec![LevelConfig {
                lod: LodTier(3),
                block_size: 2.5,
                ..LevelConfig::default()
            }],
        };
        std::fs::write(&path, config.to_yaml().unwrap()).unwrap();
        assert_eq!(PagingConfig::load(&path).unwrap(), config);
    }
}
