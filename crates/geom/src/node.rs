use crate::buffer::GeomBuffer;
use crate::requirements::RenderState;

/// A renderable node tree produced for one block.
///
/// Each node sets `state` for itself and its descendants; `geoms` are drawn
/// with the node's effective state.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    pub name: String,
    pub state: RenderState,
    pub geoms: Vec<GeomBuffer>,
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    pub fn new(name: impl Into<String>, state: RenderState) -> Self {
        Self {
            name: name.into(),
            state,
            geoms: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    pub fn geom_count(&self) -> usize {
        self.geoms.len() + self.children.iter().map(|c| c.geom_count()).sum::<usize>()
    }

    pub fn vertex_count(&self) -> usize {
        self.geoms.iter().map(|g| g.vertex_count()).sum::<usize>()
            + self.children.iter().map(|c| c.vertex_count()).sum::<usize>()
    }

    pub fn triangle_count(&self) -> usize {
        self.geoms.iter().map(|g| g.triangle_count()).sum::<usize>()
            + self.children.iter().map(|c| c.triangle_count()).sum::<usize>()
    }

    /// Visit every geometry buffer with the state it renders under.
    pub fn for_each_geom(&self, mut f: impl FnMut(&RenderState, &GeomBuffer)) {
        self.walk(&RenderState::default(), &mut f);
    }

    fn walk(&self, parent: &RenderState, f: &mut impl FnMut(&RenderState, &GeomBuffer)) {
        let state = self.state.inherit(parent);
        for g in &self.geoms {
            f(&state, g);
        }
        for c in &self.children {
            c.walk(&state, f);
        }
    }
}
