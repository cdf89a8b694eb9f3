//! Paging: LOD tiers that stream procedurally generated mesh blocks into a
//! bounded window of cells around a moving focus.
//!
//! # Invariants
//! - Each tier registers generator requirements once, on its first block.
//! - Every block gets its own draw resource factory; nothing is shared
//!   between cells except the tier's requirement layout.
//! - A cell that produced nothing is remembered as empty, not rebuilt.
//!
//! Control flow: [`MeshManager::update`] feeds the focus to every
//! [`PagingLevel`], whose toroidal cache evicts cells that left its window and
//! asks the level's block builder for cells that entered it.

mod block;
mod config;
mod generator;
mod level;
mod manager;

pub use block::Block;
pub use config::{BatchingMode, LevelConfig, PagingConfig};
pub use generator::{ContentGenerator, SharedGenerator};
pub use level::{BlockBuilder, PagingLevel};
pub use manager::{ManagerStats, MeshManager};

use meshpage_common::{CellCoord, LodTier};
use meshpage_geom::GeomError;

/// Errors from configuring or updating paging levels.
#[derive(Debug, thiserror::Error)]
pub enum PagingError {
    #[error("invalid paging configuration: {0}")]
    Configuration(String),
    #[error("building block {cell} at {lod} failed: {source}")]
    Block {
        lod: LodTier,
        cell: CellCoord,
        #[source]
        source: GeomError,
    },
    #[error("geometry error: {0}")]
    Geometry(#[from] GeomError),
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub fn crate_info() -> &'static str {
    "meshpage-paging v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("paging"));
    }

    #[test]
    fn block_error_names_the_cell() {
        let err = PagingError::Block {
            lod: LodTier(2),
            cell: CellCoord::new(3, -4),
            source: GeomError::ResourceExhausted {
                what: "vertex",
                limit: 8,
            },
        };
        let text = err.to_string();
        assert!(text.contains("(3, -4)"));
        assert!(text.contains("lod2"));
    }
}
