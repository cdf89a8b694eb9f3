//! Toroidal cell cache: a fixed-capacity square window over integer grid
//! cells that follows a moving focus.
//!
//! # Invariants
//! - At most one value per cell; occupied cells are always inside the window.
//! - After `update_center` returns, every cell in the window is `Ready`,
//!   `Empty` or `Failed`; none is silently missing.
//! - Focus motion inside the hysteresis dead zone never evicts or rebuilds.
//!
//! Values are created and torn down by a [`CellLifecycle`] strategy owned by
//! the cache, so the cache itself knows nothing about what it stores.

mod config;
mod toroidal;

pub use config::CacheConfig;
pub use toroidal::{
    CacheError, CacheStats, CacheTotals, CellLifecycle, CellState, CellWindow, ToroidalCache,
};

pub fn crate_info() -> &'static str {
    "meshpage-cache v0.1.0"
}
