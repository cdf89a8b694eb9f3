use glam::Vec4;
use meshpage_common::TextureRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One per-vertex attribute stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexAttribute {
    Position3,
    Normal3,
    TexCoord2,
    Color4,
}

impl VertexAttribute {
    /// Size of one element in bytes (f32 components).
    pub fn size(self) -> usize {
        match self {
            VertexAttribute::Position3 | VertexAttribute::Normal3 => 12,
            VertexAttribute::TexCoord2 => 8,
            VertexAttribute::Color4 => 16,
        }
    }

    fn short(self) -> &'static str {
        match self {
            VertexAttribute::Position3 => "v3",
            VertexAttribute::Normal3 => "n3",
            VertexAttribute::TexCoord2 => "t2",
            VertexAttribute::Color4 => "c4",
        }
    }
}

/// Ordered vertex attribute layout of a geometry buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    pub fn new(attributes: Vec<VertexAttribute>) -> Self {
        Self { attributes }
    }

    /// Position, normal, texcoord.
    pub fn v3n3t2() -> Self {
        Self::new(vec![
            VertexAttribute::Position3,
            VertexAttribute::Normal3,
            VertexAttribute::TexCoord2,
        ])
    }

    /// Position, normal, colour.
    pub fn v3n3c4() -> Self {
        Self::new(vec![
            VertexAttribute::Position3,
            VertexAttribute::Normal3,
            VertexAttribute::Color4,
        ])
    }

    /// Position, normal.
    pub fn v3n3() -> Self {
        Self::new(vec![VertexAttribute::Position3, VertexAttribute::Normal3])
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn has(&self, attribute: VertexAttribute) -> bool {
        self.attributes.contains(&attribute)
    }

    /// Bytes per vertex if the streams were interleaved.
    pub fn stride(&self) -> usize {
        self.attributes.iter().map(|a| a.size()).sum()
    }
}

impl fmt::Display for VertexLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for a in &self.attributes {
            f.write_str(a.short())?;
        }
        Ok(())
    }
}

/// Value bound to a named shader input.
///
/// Floats compare by bit pattern, so a value (NaN included) always equals
/// its own clone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShaderValue {
    Float(f32),
    Vec4(Vec4),
    Texture(TextureRef),
}

impl PartialEq for ShaderValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ShaderValue::Float(a), ShaderValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ShaderValue::Vec4(a), ShaderValue::Vec4(b)) => {
                a.to_array().map(f32::to_bits) == b.to_array().map(f32::to_bits)
            }
            (ShaderValue::Texture(a), ShaderValue::Texture(b)) => a == b,
            _ => false,
        }
    }
}

/// A named shader input. Order matters: settings are applied in sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderSetting {
    pub name: String,
    pub value: ShaderValue,
}

impl ShaderSetting {
    pub fn new(name: impl Into<String>, value: ShaderValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Render state carried by a batch node: everything about a requirement except
/// its vertex layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderState {
    pub texture: Option<TextureRef>,
    pub transparency: bool,
    pub shader_settings: Vec<ShaderSetting>,
}

impl RenderState {
    pub fn is_default(&self) -> bool {
        self.texture.is_none() && !self.transparency && self.shader_settings.is_empty()
    }

    /// State a node ends up with when `self` is set on it below `parent`.
    ///
    /// Texture and same-named shader inputs on the child win; transparency is
    /// sticky once any ancestor enables it.
    pub fn inherit(&self, parent: &RenderState) -> RenderState {
        let mut shader_settings: Vec<ShaderSetting> = parent
            .shader_settings
            .iter()
            .filter(|p| !self.shader_settings.iter().any(|c| c.name == p.name))
            .cloned()
            .collect();
        shader_settings.extend(self.shader_settings.iter().cloned());
        RenderState {
            texture: self.texture.clone().or_else(|| parent.texture.clone()),
            transparency: self.transparency || parent.transparency,
            shader_settings,
        }
    }
}

/// Requirements for one kind of surface a generator emits.
///
/// Translated into one geometry buffer per block and merged with structurally
/// equal requirements from other generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeomRequirements {
    pub vertex_layout: VertexLayout,
    pub texture: Option<TextureRef>,
    pub transparency: bool,
    pub shader_settings: Vec<ShaderSetting>,
}

impl GeomRequirements {
    pub fn new(vertex_layout: VertexLayout) -> Self {
        Self {
            vertex_layout,
            texture: None,
            transparency: false,
            shader_settings: Vec::new(),
        }
    }

    pub fn with_texture(mut self, texture: TextureRef) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_transparency(mut self, transparency: bool) -> Self {
        self.transparency = transparency;
        self
    }

    pub fn with_shader_setting(mut self, setting: ShaderSetting) -> Self {
        self.shader_settings.push(setting);
        self
    }

    pub fn render_state(&self) -> RenderState {
        RenderState {
            texture: self.texture.clone(),
            transparency: self.transparency,
            shader_settings: self.shader_settings.clone(),
        }
    }
}
