use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D integer cell coordinate in a paging grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// World-space bounds of this cell for a grid with the given cell size.
    pub fn bounds(self, cell_size: f32) -> CellBounds {
        CellBounds {
            x0: self.x as f32 * cell_size,
            y0: self.y as f32 * cell_size,
            x1: (self.x + 1) as f32 * cell_size,
            y1: (self.y + 1) as f32 * cell_size,
        }
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned world-space rectangle covered by one cell: `[x0, y0]..[x1, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellBounds {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl CellBounds {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x0, self.y0)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x1, self.y1)
    }

    pub fn size(&self) -> Vec2 {
        self.max() - self.min()
    }

    /// Centre of the rectangle on the ground plane (z = 0).
    pub fn center(&self) -> Vec3 {
        let c = (self.min() + self.max()) * 0.5;
        Vec3::new(c.x, c.y, 0.0)
    }

    /// Radius of the circle through the four corners.
    pub fn radius(&self) -> f32 {
        self.size().length() * 0.5
    }

    /// Half-open containment test: `[x0, x1) x [y0, y1)`.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// One level-of-detail tier. Lower numbers are not implied to be finer; the
/// meaning of a tier is defined by the generators that draw it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct LodTier(pub u32);

impl fmt::Display for LodTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lod{}", self.0)
    }
}

/// Identity of a texture owned by the rendering layer.
///
/// Compared by name; two references with the same name bind the same texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureRef(pub String);

impl TextureRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TextureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_bounds_scale_with_cell_size() {
        let b = CellCoord::new(2, -1).bounds(0.5);
        assert_eq!(b, CellBounds::new(1.0, -0.5, 1.5, 0.0));
    }

    #[test]
    fn bounds_center_and_radius() {
        let b = CellBounds::new(0.0, 0.0, 2.0, 2.0);
        assert_eq!(b.center(), Vec3::new(1.0, 1.0, 0.0));
        assert!((b.radius() - 2.0_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn bounds_contains_is_half_open() {
        let b = CellBounds::new(0.0, 0.0, 1.0, 1.0);
        assert!(b.contains(0.0, 0.0));
        assert!(b.contains(0.5, 0.99));
        assert!(!b.contains(1.0, 0.5));
    }

    #[test]
    fn texture_refs_compare_by_name() {
        assert_eq!(TextureRef::new("leaf"), TextureRef::new("leaf"));
        assert_ne!(TextureRef::new("leaf"), TextureRef::new("bark"));
    }
}
