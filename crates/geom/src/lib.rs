//! Geometry requirements and draw resources.
//!
//! Content generators declare what kinds of surface they emit (vertex layout,
//! texture, transparency, shader inputs) once per LOD tier. Identical
//! declarations are merged, a batch layout plan groups them into as few render
//! state boundaries as the active strategy manages, and every block gets a
//! factory that hands out writable buffers on demand.
//!
//! # Invariants
//! - Requirement ids are insertion-ordered and stable for a collection's lifetime.
//! - A batch node's parent always has a lower index than the node itself.
//! - No geometry buffer exists until a generator asks for it.

mod batch;
mod buffer;
mod collection;
mod factory;
mod node;
mod requirements;

pub use batch::{
    BatchLayoutPlan, BatchNodeSpec, BatchStrategy, NodePerRequirement, SharedStateGrouping,
};
pub use buffer::{BufferLimits, DrawResources, GeomBuffer, Vertex};
pub use collection::{BatchLayout, RequirementCollection, RequirementId};
pub use factory::DrawResourceFactory;
pub use node::RenderNode;
pub use requirements::{
    GeomRequirements, RenderState, ShaderSetting, ShaderValue, VertexAttribute, VertexLayout,
};

/// Errors raised while planning batches or writing geometry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeomError {
    #[error("requirement {id:?} was never registered ({registered} requirements known)")]
    RequirementMismatch { id: RequirementId, registered: usize },
    #[error("vertex attribute {attribute:?} does not match layout {layout}")]
    LayoutMismatch {
        layout: String,
        attribute: VertexAttribute,
    },
    #[error("triangle index {index} out of range ({vertices} vertices written)")]
    IndexOutOfRange { index: u32, vertices: u32 },
    #[error("{what} limit of {limit} exhausted")]
    ResourceExhausted { what: &'static str, limit: usize },
    #[error("invalid batch layout plan: {0}")]
    InvalidPlan(String),
}

pub fn crate_info() -> &'static str {
    "meshpage-geom v0.1.0"
}
