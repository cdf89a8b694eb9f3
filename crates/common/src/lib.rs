//! Shared value types used across the meshpage crates.

mod types;

pub use types::{CellBounds, CellCoord, LodTier, TextureRef};

pub fn crate_info() -> &'static str {
    "meshpage-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
