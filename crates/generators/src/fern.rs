use std::fmt;
use std::sync::Arc;

use glam::{EulerRot, Quat, Vec2, Vec3, Vec4};
use meshpage_common::{CellBounds, LodTier, TextureRef};
use meshpage_geom::{
    DrawResourceFactory, DrawResources, GeomError, GeomRequirements, RequirementCollection,
    RequirementId, ShaderSetting, ShaderValue, Vertex, VertexLayout,
};
use meshpage_paging::ContentGenerator;

use crate::rng::CellRng;

const LEAF_COLOR: Vec4 = Vec4::new(0.1, 0.3, 0.1, 1.0);
const LEAF_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
];

/// Ground height under a point.
pub trait HeightField: Send + Sync {
    fn height(&self, x: f32, y: f32) -> f32;
}

/// Level ground at a fixed height.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlatGround(pub f32);

impl HeightField for FlatGround {
    fn height(&self, _x: f32, _y: f32) -> f32 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FernConfig {
    /// Textured leaves when set, flat coloured ones otherwise.
    pub leaf_texture: Option<TextureRef>,
    /// Overall fern size.
    pub scalar: f32,
    /// Spacing of candidate fern positions.
    pub grid_size: f32,
    pub seed: u64,
    /// Tier that only draws large ferns.
    pub low_lod: LodTier,
    /// Tier that only draws medium ferns.
    pub mid_lod: LodTier,
    pub low_distance: f32,
    pub mid_distance: f32,
}

impl Default for FernConfig {
    fn default() -> Self {
        Self {
            leaf_texture: None,
            scalar: 0.25,
            grid_size: 1.0,
            seed: 0,
            low_lod: LodTier(1),
            mid_lod: LodTier(0),
            low_distance: 1200.0,
            mid_distance: 800.0,
        }
    }
}

/// Scatters ferns over a jittered grid.
///
/// Each grid point gets its own random stream, so a point draws the same fern
/// no matter which block or tier asks for it. About 60% of points are empty.
/// Ferns scaled below 0.3 are skipped; the rest split between the two tiers at
/// scale 0.8. Any other tier draws every fern.
pub struct FernGenerator {
    config: FernConfig,
    ground: Arc<dyn HeightField>,
}

impl fmt::Debug for FernGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FernGenerator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FernGenerator {
    pub fn new(config: FernConfig) -> Self {
        Self::with_ground(config, Arc::new(FlatGround(0.0)))
    }

    pub fn with_ground(config: FernConfig, ground: Arc<dyn HeightField>) -> Self {
        Self { config, ground }
    }

    pub fn config(&self) -> &FernConfig {
        &self.config
    }

    fn leaf_requirements(&self) -> GeomRequirements {
        match &self.config.leaf_texture {
            Some(tex) => GeomRequirements::new(VertexLayout::v3n3t2())
                .with_texture(tex.clone())
                .with_shader_setting(ShaderSetting::new(
                    "diffTex",
                    ShaderValue::Texture(tex.clone()),
                )),
            None => GeomRequirements::new(VertexLayout::v3n3c4()),
        }
    }

    fn leaf_vertex(&self, position: Vec3, normal: Vec3, uv: Vec2) -> Vertex {
        let v = Vertex::new(position).normal(normal);
        if self.config.leaf_texture.is_some() {
            v.texcoord(uv)
        } else {
            v.color(LEAF_COLOR)
        }
    }

    fn draw_fern(
        &self,
        lod: LodTier,
        pos: Vec3,
        rng: &mut CellRng,
        leaf: RequirementId,
        factory: &mut DrawResourceFactory,
    ) -> Result<bool, GeomError> {
        let scale = rng.next_f32();
        if scale < 0.3 {
            return Ok(false);
        }
        let count = (scale.powf(0.7) * 12.0) as usize;
        if scale < 0.8 {
            if lod == self.config.low_lod {
                return Ok(false);
            }
        } else if lod == self.config.mid_lod {
            return Ok(false);
        }

        let resources = factory.draw_resources(leaf)?;
        let size = scale * self.config.scalar * 3.0;
        for _ in 0..count {
            let pitch = rng.next_f32().powi(2) * 60.0 + 20.0;
            let heading = rng.next_f32() * 360.0;
            self.draw_frond(resources, pos, size, heading, pitch)?;
        }
        Ok(true)
    }

    /// One frond: a bent quad, written once per side.
    fn draw_frond(
        &self,
        r: &mut DrawResources,
        pos: Vec3,
        size: f32,
        heading: f32,
        pitch: f32,
    ) -> Result<(), GeomError> {
        let q2 = hpr(heading, pitch);
        let q3 = hpr(heading, pitch - 20.0 - pitch / 4.0);

        let tip = q2 * Vec3::Y * (size * 4.0);
        let side = q2 * Vec3::X * (size * 0.5);
        let end = q3 * Vec3::Y * (size * 3.0) + tip;
        let n0 = q2 * Vec3::Z;
        let n2 = q3 * Vec3::Z;
        let n1 = (n0 + n2).normalize_or_zero();

        let corners = [pos, pos + tip + side, pos + tip - side, pos + end];
        for back in [false, true] {
            let sign = if back { -1.0 } else { 1.0 };
            let normals = [n0, n1, n1, n2];
            let row = r.next_vertex();
            for ((&p, n), uv) in corners.iter().zip(normals).zip(LEAF_UVS) {
                r.add_vertex(self.leaf_vertex(p, n * sign, uv))?;
            }
            if back {
                r.add_triangle(row + 1, row, row + 2)?;
                r.add_triangle(row + 3, row + 1, row + 2)?;
            } else {
                r.add_triangle(row, row + 1, row + 2)?;
                r.add_triangle(row + 1, row + 3, row + 2)?;
            }
        }
        Ok(())
    }
}

/// Heading about +Z then pitch about +X, in degrees. +Y is forward.
fn hpr(heading: f32, pitch: f32) -> Quat {
    Quat::from_euler(EulerRot::ZXY, heading.to_radians(), pitch.to_radians(), 0.0)
}

impl ContentGenerator for FernGenerator {
    fn name(&self) -> &str {
        "fern"
    }

    fn register_requirements(
        &self,
        _lod: LodTier,
        collection: &mut RequirementCollection,
    ) -> Vec<RequirementId> {
        vec![collection.add(self.leaf_requirements())]
    }

    fn lod_thresholds(&self) -> Vec<f32> {
        vec![self.config.low_distance, self.config.mid_distance]
    }

    fn draw(
        &self,
        lod: LodTier,
        bounds: CellBounds,
        requirements: &[RequirementId],
        factory: &mut DrawResourceFactory,
    ) -> Result<(), GeomError> {
        let Some(&leaf) = requirements.first() else {
            return Ok(());
        };
        let g = self.config.grid_size;
        if !(g.is_finite() && g > 0.0) {
            return Ok(());
        }
        let (ix0, ix1) = ((bounds.x0 / g).ceil() as i64, (bounds.x1 / g).ceil() as i64);
        let (iy0, iy1) = ((bounds.y0 / g).ceil() as i64, (bounds.y1 / g).ceil() as i64);

        let mut drawn = 0usize;
        for iy in iy0..iy1 {
            for ix in ix0..ix1 {
                let mut rng = CellRng::for_point(self.config.seed, ix, iy);
                if rng.next_f32() < 0.6 {
                    continue;
                }
                let x = (ix as f32 + (rng.next_f32() - 0.5) * 0.5) * g;
                let y = (iy as f32 + (rng.next_f32() - 0.5) * 0.5) * g;
                let pos = Vec3::new(x, y, self.ground.height(x, y));
                if self.draw_fern(lod, pos, &mut rng, leaf, factory)? {
                    drawn += 1;
                }
            }
        }
        tracing::trace!(%lod, x = bounds.x0, y = bounds.y0, drawn, "ferns drawn");
        Ok(())
    }
}
