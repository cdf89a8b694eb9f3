use crate::GeomError;
use crate::buffer::{BufferLimits, DrawResources};
use crate::collection::{BatchLayout, RequirementId};
use crate::node::RenderNode;
use crate::requirements::RenderState;
use std::sync::Arc;

/// A batch node materialized in a factory's arena.
#[derive(Debug)]
struct BatchNode {
    state: RenderState,
    children: Vec<usize>,
    /// Requirement indices whose buffers live on this node, in request order.
    geoms: Vec<usize>,
}

/// Hands out [`DrawResources`] for one block.
///
/// Produced by `RequirementCollection::draw_resource_factory`. Batch nodes
/// and buffers are created lazily, the first time a requirement is asked
/// for; nothing exists until then.
#[derive(Debug)]
pub struct DrawResourceFactory {
    layout: Arc<BatchLayout>,
    limits: BufferLimits,
    nodes: Vec<Option<BatchNode>>,
    resources: Vec<Option<DrawResources>>,
    root: Option<usize>,
}

impl DrawResourceFactory {
    pub(crate) fn new(layout: Arc<BatchLayout>, limits: BufferLimits) -> Self {
        let node_count = layout.plan().nodes().len();
        let requirement_count = layout.len();
        Self {
            layout,
            limits,
            nodes: (0..node_count).map(|_| None).collect(),
            resources: (0..requirement_count).map(|_| None).collect(),
            root: None,
        }
    }

    pub fn layout(&self) -> &Arc<BatchLayout> {
        &self.layout
    }

    /// The draw resources for `id`, created on first request.
    ///
    /// Repeated calls return the same handle. Ids the collection never issued
    /// fail with [`GeomError::RequirementMismatch`].
    pub fn draw_resources(&mut self, id: RequirementId) -> Result<&mut DrawResources, GeomError> {
        let index = id.0;
        let Some(node) = self.layout.plan().node_for(index) else {
            return Err(GeomError::RequirementMismatch {
                id,
                registered: self.layout.len(),
            });
        };
        if self.resources[index].is_none() {
            self.materialize(node);
            if let Some(batch) = self.nodes[node].as_mut() {
                batch.geoms.push(index);
            }
            tracing::trace!(requirement = index, node, "geometry buffer created");
        }
        let layout = &self.layout;
        let limits = self.limits;
        Ok(self.resources[index].get_or_insert_with(|| {
            let vertex_layout = layout.requirements()[index].vertex_layout.clone();
            DrawResources::new(id, node, vertex_layout, limits)
        }))
    }

    /// Whether any draw resources were requested, i.e. whether
    /// [`into_renderable`](Self::into_renderable) will yield a node.
    pub fn has_renderable(&self) -> bool {
        self.root.is_some()
    }

    /// Number of geometry buffers created so far.
    pub fn buffer_count(&self) -> usize {
        self.resources.iter().filter(|r| r.is_some()).count()
    }

    /// Number of batch nodes materialized so far.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// The root renderable node, or `None` when nothing was requested.
    pub fn into_renderable(mut self) -> Option<RenderNode> {
        let root = self.root?;
        Some(self.build(root))
    }

    fn materialize(&mut self, index: usize) {
        if self.nodes[index].is_some() {
            return;
        }
        let Some(spec) = self.layout.plan().node(index) else {
            return;
        };
        let parent = spec.parent;
        let state = spec.state.clone();
        match parent {
            Some(p) => {
                self.materialize(p);
                if let Some(parent) = self.nodes[p].as_mut() {
                    parent.children.push(index);
                }
            }
            None => self.root = Some(index),
        }
        self.nodes[index] = Some(BatchNode {
            state,
            children: Vec::new(),
            geoms: Vec::new(),
        });
    }

    fn build(&mut self, index: usize) -> RenderNode {
        let Some(batch) = self.nodes[index].take() else {
            return RenderNode::new(format!("batch-{index}"), RenderState::default());
        };
        let mut node = RenderNode::new(format!("batch-{index}"), batch.state);
        node.geoms = batch
            .geoms
            .iter()
            .filter_map(|&g| self.resources[g].take())
            .map(DrawResources::into_buffer)
            .collect();
        node.children = batch.children.iter().map(|&c| self.build(c)).collect();
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::SharedStateGrouping;
    use crate::buffer::Vertex;
    use crate::collection::RequirementCollection;
    use crate::requirements::{GeomRequirements, VertexLayout};
    use glam::{Vec2, Vec3};
    use meshpage_common::TextureRef;

    fn collection() -> (RequirementCollection, RequirementId, RequirementId) {
        let mut c = RequirementCollection::new();
        let leaf = c.add(
            GeomRequirements::new(VertexLayout::v3n3t2()).with_texture(TextureRef::new("leaf")),
        );
        let plain = c.add(GeomRequirements::new(VertexLayout::v3n3()));
        (c, leaf, plain)
    }

    fn triangle(r: &mut DrawResources) {
        let row = r.next_vertex();
        for p in [Vec3::ZERO, Vec3::X, Vec3::Y] {
            r.add_vertex(Vertex::new(p).normal(Vec3::Z).texcoord(Vec2::ZERO))
                .unwrap();
        }
        r.add_triangle(row, row + 1, row + 2).unwrap();
    }

    #[test]
    fn nothing_exists_until_requested() {
        let (mut c, _, _) = collection();
        let f = c.draw_resource_factory().unwrap().unwrap();
        assert!(!f.has_renderable());
        assert_eq!(f.buffer_count(), 0);
        assert_eq!(f.node_count(), 0);
        assert!(f.into_renderable().is_none());
    }

    #[test]
    fn lookup_is_idempotent() {
        let (mut c, leaf, _) = collection();
        let mut f = c.draw_resource_factory().unwrap().unwrap();
        triangle(f.draw_resources(leaf).unwrap());
        let again = f.draw_resources(leaf).unwrap();
        assert_eq!(again.vertex_count(), 3, "same buffer comes back");
        assert_eq!(f.buffer_count(), 1);
        // root + leaf node
        assert_eq!(f.node_count(), 2);
    }

    #[test]
    fn unknown_requirement_fails_fast() {
        let (mut c, _, _) = collection();
        let mut f = c.draw_resource_factory().unwrap().unwrap();
        let err = f.draw_resources(RequirementId(7)).unwrap_err();
        assert_eq!(
            err,
            GeomError::RequirementMismatch {
                id: RequirementId(7),
                registered: 2
            }
        );
        assert!(!f.has_renderable());
    }

    #[test]
    fn requested_but_unwritten_still_renders() {
        let (mut c, _, plain) = collection();
        let mut f = c.draw_resource_factory().unwrap().unwrap();
        f.draw_resources(plain).unwrap();
        let node = f.into_renderable().unwrap();
        assert_eq!(node.geom_count(), 1);
        assert_eq!(node.vertex_count(), 0);
    }

    #[test]
    fn renderable_tree_follows_plan() {
        let (mut c, leaf, plain) = collection();
        let mut f = c.draw_resource_factory().unwrap().unwrap();
        triangle(f.draw_resources(leaf).unwrap());
        f.draw_resources(plain).unwrap();

        let root = f.into_renderable().unwrap();
        assert_eq!(root.name, "batch-0");
        assert!(root.geoms.is_empty());
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].state.texture, Some(TextureRef::new("leaf")));
        assert_eq!(root.children[0].geoms[0].requirement(), leaf);
        assert_eq!(root.children[1].geoms[0].requirement(), plain);
        assert_eq!(root.triangle_count(), 1);
    }

    #[test]
    fn nested_nodes_materialize_parent_first() {
        let mut c = RequirementCollection::with_strategy(Box::new(SharedStateGrouping));
        let glass = c.add(
            GeomRequirements::new(VertexLayout::v3n3t2())
                .with_texture(TextureRef::new("glass"))
                .with_transparency(true),
        );
        let mut f = c.draw_resource_factory().unwrap().unwrap();
        let r = f.draw_resources(glass).unwrap();
        assert_eq!(r.batch_node(), 2);
        assert_eq!(f.node_count(), 3);

        let root = f.into_renderable().unwrap();
        assert_eq!(root.node_count(), 3);
        let textured = &root.children[0];
        assert_eq!(textured.state.texture, Some(TextureRef::new("glass")));
        assert!(textured.children[0].state.transparency);
        assert_eq!(textured.children[0].geoms.len(), 1);
    }

    #[test]
    fn shared_node_holds_one_buffer_per_requirement() {
        let mut c = RequirementCollection::with_strategy(Box::new(SharedStateGrouping));
        let a = c.add(
            GeomRequirements::new(VertexLayout::v3n3t2()).with_texture(TextureRef::new("t")),
        );
        let b =
            c.add(GeomRequirements::new(VertexLayout::v3n3()).with_texture(TextureRef::new("t")));
        let mut f = c.draw_resource_factory().unwrap().unwrap();
        f.draw_resources(b).unwrap();
        f.draw_resources(a).unwrap();
        let root = f.into_renderable().unwrap();
        let shared = &root.children[0];
        assert_eq!(shared.geoms.len(), 2);
        assert_eq!(shared.geoms[0].requirement(), b);
        assert_eq!(shared.geoms[1].requirement(), a);
    }
}
