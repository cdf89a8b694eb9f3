use serde::{Deserialize, Serialize};

/// Largest accepted window edge, in cells.
const MAX_CELL_CAPACITY: usize = 4096;

/// Window size and hysteresis of a [`ToroidalCache`](crate::ToroidalCache).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Window edge length in cells; the window holds `cell_capacity²` cells.
    pub cell_capacity: usize,
    /// Dead zone, as a fraction of a cell, the focus must drift past before
    /// the window moves. Must lie in `(0, 1)`.
    pub hysteresis: f32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cell_capacity: 7,
            hysteresis: 0.6,
        }
    }
}

impl CacheConfig {
    pub fn new(cell_capacity: usize, hysteresis: f32) -> Self {
        Self {
            cell_capacity,
            hysteresis,
        }
    }

    /// Reject capacities outside `1..=4096` and hysteresis outside `(0, 1)`.
    pub fn validate(&self) -> Result<(), String> {
        if self.cell_capacity == 0 || self.cell_capacity > MAX_CELL_CAPACITY {
            return Err(format!(
                "cell_capacity must be in 1..={MAX_CELL_CAPACITY}, got {}",
                self.cell_capacity
            ));
        }
        if !(self.hysteresis > 0.0 && self.hysteresis < 1.0) {
            return Err(format!(
                "hysteresis must be in (0, 1), got {}",
                self.hysteresis
            ));
        }
        Ok(())
    }

    /// Distance from the window centre, in cells, the focus may reach on
    /// either axis without moving the window.
    pub fn dead_zone(&self) -> f32 {
        self.hysteresis.max(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = CacheConfig::default();
        assert_eq!(c.cell_capacity, 7);
        assert_eq!(c.hysteresis, 0.6);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(CacheConfig::new(0, 0.5).validate().is_err());
        assert!(CacheConfig::new(5, 0.0).validate().is_err());
        assert!(CacheConfig::new(5, 1.0).validate().is_err());
        assert!(CacheConfig::new(5, f32::NAN).validate().is_err());
        assert!(CacheConfig::new(10_000, 0.5).validate().is_err());
    }

    #[test]
    fn dead_zone_never_below_half_a_cell() {
        assert_eq!(CacheConfig::new(3, 0.2).dead_zone(), 0.5);
        assert_eq!(CacheConfig::new(3, 0.6).dead_zone(), 0.6);
    }
}
