use crate::GeomError;
use crate::collection::RequirementId;
use crate::requirements::{VertexAttribute, VertexLayout};
use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Capacity limits for a single geometry buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferLimits {
    pub max_vertices: usize,
    pub max_triangles: usize,
}

impl Default for BufferLimits {
    fn default() -> Self {
        Self {
            max_vertices: 1 << 20,
            max_triangles: 1 << 21,
        }
    }
}

/// One vertex to write. Optional attributes must match the buffer layout
/// exactly: present when the layout has them, absent otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Option<Vec3>,
    pub texcoord: Option<Vec2>,
    pub color: Option<Vec4>,
}

impl Vertex {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn normal(mut self, normal: Vec3) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn texcoord(mut self, texcoord: Vec2) -> Self {
        self.texcoord = Some(texcoord);
        self
    }

    pub fn color(mut self, color: Vec4) -> Self {
        self.color = Some(color);
        self
    }
}

/// Attribute streams and triangle indices for one requirement in one block.
#[derive(Debug, Clone, PartialEq)]
pub struct GeomBuffer {
    requirement: RequirementId,
    layout: VertexLayout,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    texcoords: Vec<Vec2>,
    colors: Vec<Vec4>,
    indices: Vec<u32>,
}

impl GeomBuffer {
    pub fn new(requirement: RequirementId, layout: VertexLayout) -> Self {
        Self {
            requirement,
            layout,
            positions: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            colors: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn requirement(&self) -> RequirementId {
        self.requirement
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn texcoords(&self) -> &[Vec2] {
        &self.texcoords
    }

    pub fn colors(&self) -> &[Vec4] {
        &self.colors
    }

    /// Flat triangle list, three indices per triangle.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Raw position stream for upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    fn check(&self, present: bool, attribute: VertexAttribute) -> Result<(), GeomError> {
        if present == self.layout.has(attribute) {
            Ok(())
        } else {
            Err(GeomError::LayoutMismatch {
                layout: self.layout.to_string(),
                attribute,
            })
        }
    }
}

/// Writable handle to the geometry buffer bound to one requirement.
///
/// Handed out by `DrawResourceFactory::draw_resources`; generators write
/// straight into it.
#[derive(Debug)]
pub struct DrawResources {
    node: usize,
    limits: BufferLimits,
    buffer: GeomBuffer,
}

impl DrawResources {
    pub(crate) fn new(
        requirement: RequirementId,
        node: usize,
        layout: VertexLayout,
        limits: BufferLimits,
    ) -> Self {
        Self {
            node,
            limits,
            buffer: GeomBuffer::new(requirement, layout),
        }
    }

    pub fn requirement(&self) -> RequirementId {
        self.buffer.requirement
    }

    /// Batch node this buffer lives on.
    pub fn batch_node(&self) -> usize {
        self.node
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.buffer.layout
    }

    /// Index the next written vertex will receive.
    pub fn next_vertex(&self) -> u32 {
        self.buffer.positions.len() as u32
    }

    pub fn vertex_count(&self) -> usize {
        self.buffer.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.buffer.triangle_count()
    }

    pub fn buffer(&self) -> &GeomBuffer {
        &self.buffer
    }

    pub(crate) fn into_buffer(self) -> GeomBuffer {
        self.buffer
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<u32, GeomError> {
        let b = &mut self.buffer;
        if b.positions.len() >= self.limits.max_vertices {
            return Err(GeomError::ResourceExhausted {
                what: "vertex",
                limit: self.limits.max_vertices,
            });
        }
        b.check(true, VertexAttribute::Position3)?;
        b.check(vertex.normal.is_some(), VertexAttribute::Normal3)?;
        b.check(vertex.texcoord.is_some(), VertexAttribute::TexCoord2)?;
        b.check(vertex.color.is_some(), VertexAttribute::Color4)?;

        let index = b.positions.len() as u32;
        b.positions.push(vertex.position);
        if let Some(n) = vertex.normal {
            b.normals.push(n);
        }
        if let Some(t) = vertex.texcoord {
            b.texcoords.push(t);
        }
        if let Some(c) = vertex.color {
            b.colors.push(c);
        }
        Ok(index)
    }

    /// Append one triangle referencing already written vertices.
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) -> Result<(), GeomError> {
        let vertices = self.next_vertex();
        if let Some(&index) = [a, b, c].iter().find(|&&i| i >= vertices) {
            return Err(GeomError::IndexOutOfRange { index, vertices });
        }
        if self.buffer.triangle_count() >= self.limits.max_triangles {
            return Err(GeomError::ResourceExhausted {
                what: "triangle",
                limit: self.limits.max_triangles,
            });
        }
        self.buffer.indices.extend_from_slice(&[a, b, c]);
        Ok(())
    }
}
