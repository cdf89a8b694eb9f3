use std::time::{Duration, Instant};

use glam::Vec2;
use meshpage_common::CellCoord;

use crate::config::CacheConfig;

/// Creates and tears down the values a [`ToroidalCache`] stores.
pub trait CellLifecycle {
    type Value;
    type Error;

    /// Build the value for a cell entering the window. `Ok(None)` marks the
    /// cell as populated but empty; it will not be asked for again until it
    /// leaves and re-enters the window.
    fn populate(&mut self, cell: CellCoord) -> Result<Option<Self::Value>, Self::Error>;

    /// Release a value whose cell left the window or is being replaced.
    fn evict(&mut self, cell: CellCoord, value: Self::Value);
}

/// Errors from cache construction and population.
#[derive(Debug, thiserror::Error)]
pub enum CacheError<E> {
    #[error("invalid cache configuration: {0}")]
    Configuration(String),
    #[error("populating cell {cell} failed: {source}")]
    Populate { cell: CellCoord, source: E },
}

/// Contents of one in-window cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellState<V> {
    Ready(V),
    /// Populated, nothing to hold.
    Empty,
    /// Population failed; stays failed until evicted, replaced or retried.
    Failed,
}

impl<V> CellState<V> {
    pub fn value(&self) -> Option<&V> {
        match self {
            CellState::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, CellState::Ready(_))
    }
}

/// Square window of cells `origin .. origin + size` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellWindow {
    pub origin: CellCoord,
    pub size: i32,
}

impl CellWindow {
    /// Window of `size` cells whose centre lies closest to `focus`, or `None`
    /// when the window would not fit in the `i32` cell range.
    pub fn around(focus: Vec2, size: i32) -> Option<Self> {
        let half = f64::from(size) * 0.5;
        let origin = |f: f32| {
            let o = (f64::from(f) - half + 0.5).floor();
            let fits = o >= f64::from(i32::MIN) && o + f64::from(size) <= f64::from(i32::MAX);
            fits.then_some(o as i32)
        };
        Some(Self {
            origin: CellCoord::new(origin(focus.x)?, origin(focus.y)?),
            size,
        })
    }

    pub fn center(&self) -> Vec2 {
        let half = self.size as f32 * 0.5;
        Vec2::new(self.origin.x as f32 + half, self.origin.y as f32 + half)
    }

    pub fn contains(&self, cell: CellCoord) -> bool {
        let (x, y) = (i64::from(cell.x), i64::from(cell.y));
        let (ox, oy, n) = (
            i64::from(self.origin.x),
            i64::from(self.origin.y),
            i64::from(self.size),
        );
        x >= ox && x < ox + n && y >= oy && y < oy + n
    }

    /// All cells in row-major order (y outer, x inner). Cells past the `i32`
    /// range are skipped.
    pub fn cells(self) -> impl Iterator<Item = CellCoord> {
        let o = self.origin;
        let n = self.size;
        (0..n)
            .filter_map(move |dy| o.y.checked_add(dy))
            .flat_map(move |y| {
                (0..n)
                    .filter_map(move |dx| o.x.checked_add(dx))
                    .map(move |x| CellCoord::new(x, y))
            })
    }
}

/// What one `update_center` (or invalidation) call did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub recentered: bool,
    pub populated: usize,
    pub ready: usize,
    pub empty: usize,
    pub failed: usize,
    pub evicted: usize,
    pub elapsed: Duration,
}

/// Counters accumulated over the cache lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheTotals {
    pub recenters: u64,
    pub populated: u64,
    pub evicted: u64,
    pub failed: u64,
}

#[derive(Debug)]
struct Slot<V> {
    cell: CellCoord,
    state: CellState<V>,
}

/// Fixed-capacity square window over grid cells, re-centred on a moving
/// focus.
///
/// Slots are addressed by `(x mod N, y mod N)`, so when the window slides by
/// one cell only the row or column that left is reused for the one that
/// entered; every other slot keeps its value.
#[derive(Debug)]
pub struct ToroidalCache<L: CellLifecycle> {
    config: CacheConfig,
    lifecycle: L,
    slots: Vec<Option<Slot<L::Value>>>,
    window: Option<CellWindow>,
    stats: CacheStats,
    totals: CacheTotals,
}

impl<L: CellLifecycle> ToroidalCache<L> {
    pub fn new(config: CacheConfig, lifecycle: L) -> Result<Self, CacheError<L::Error>> {
        config.validate().map_err(CacheError::Configuration)?;
        let n = config.cell_capacity;
        Ok(Self {
            config,
            lifecycle,
            slots: (0..n * n).map(|_| None).collect(),
            window: None,
            stats: CacheStats::default(),
            totals: CacheTotals::default(),
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    pub fn lifecycle_mut(&mut self) -> &mut L {
        &mut self.lifecycle
    }

    /// The committed window, `None` before the first update.
    pub fn window(&self) -> Option<CellWindow> {
        self.window
    }

    /// Statistics from the last update or invalidation.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn totals(&self) -> CacheTotals {
        self.totals
    }

    fn size(&self) -> i32 {
        self.config.cell_capacity as i32
    }

    fn slot_index(&self, cell: CellCoord) -> usize {
        let n = self.size();
        (cell.x.rem_euclid(n) + cell.y.rem_euclid(n) * n) as usize
    }

    /// Move the window to follow `focus` (in cell units) if it drifted out of
    /// the dead zone, evicting cells that left and populating cells that
    /// entered.
    ///
    /// Population errors do not stop the sweep: every in-window cell ends up
    /// with a state, failed ones as [`CellState::Failed`], and the first error
    /// is returned afterwards.
    pub fn update_center(
        &mut self,
        focus_x: f32,
        focus_y: f32,
    ) -> Result<CacheStats, CacheError<L::Error>> {
        let start = Instant::now();
        self.stats = CacheStats::default();

        if !(focus_x.is_finite() && focus_y.is_finite()) {
            tracing::warn!(focus_x, focus_y, "ignoring non-finite cache focus");
            return Ok(self.stats.clone());
        }
        let focus = Vec2::new(focus_x, focus_y);
        let moved = match self.window {
            None => true,
            Some(w) => {
                let drift = (focus - w.center()).abs();
                drift.max_element() > self.config.dead_zone()
            }
        };
        if !moved {
            self.stats.elapsed = start.elapsed();
            return Ok(self.stats.clone());
        }

        let Some(target) = CellWindow::around(focus, self.size()) else {
            tracing::warn!(focus_x, focus_y, "ignoring cache focus outside the cell range");
            self.stats.elapsed = start.elapsed();
            return Ok(self.stats.clone());
        };
        let _span = tracing::info_span!(
            "cache_recenter",
            x = target.origin.x,
            y = target.origin.y,
            size = target.size
        )
        .entered();
        self.window = Some(target);
        self.stats.recentered = true;
        self.totals.recenters += 1;

        self.evict_outside(target);
        let result = self.populate_missing(target);

        self.stats.elapsed = start.elapsed();
        tracing::trace!(
            populated = self.stats.populated,
            ready = self.stats.ready,
            empty = self.stats.empty,
            failed = self.stats.failed,
            evicted = self.stats.evicted,
            "cache recenter complete"
        );
        result.map(|()| self.stats.clone())
    }

    fn evict_outside(&mut self, window: CellWindow) {
        for i in 0..self.slots.len() {
            let stale = matches!(&self.slots[i], Some(slot) if !window.contains(slot.cell));
            if !stale {
                continue;
            }
            if let Some(slot) = self.slots[i].take() {
                self.release(slot);
            }
        }
    }

    fn release(&mut self, slot: Slot<L::Value>) {
        tracing::debug!(cell = %slot.cell, "evicting cell");
        if let CellState::Ready(value) = slot.state {
            self.lifecycle.evict(slot.cell, value);
        }
        self.stats.evicted += 1;
        self.totals.evicted += 1;
    }

    fn populate_missing(&mut self, window: CellWindow) -> Result<(), CacheError<L::Error>> {
        let mut first_error = None;
        for cell in window.cells() {
            let i = self.slot_index(cell);
            if self.slots[i].is_some() {
                continue;
            }
            if let Err(e) = self.fill(i, cell) {
                record_error(&mut first_error, e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Populate slot `i` for `cell`. The slot is always left holding a state.
    fn fill(&mut self, i: usize, cell: CellCoord) -> Result<(), CacheError<L::Error>> {
        self.stats.populated += 1;
        self.totals.populated += 1;
        let (state, result) = match self.lifecycle.populate(cell) {
            Ok(Some(value)) => {
                self.stats.ready += 1;
                (CellState::Ready(value), Ok(()))
            }
            Ok(None) => {
                self.stats.empty += 1;
                (CellState::Empty, Ok(()))
            }
            Err(source) => {
                self.stats.failed += 1;
                self.totals.failed += 1;
                (CellState::Failed, Err(CacheError::Populate { cell, source }))
            }
        };
        tracing::debug!(%cell, ready = state.is_ready(), "populated cell");
        self.slots[i] = Some(Slot { cell, state });
        result
    }

    /// Tear down and rebuild one in-window cell. Returns `Ok(false)` if the
    /// cell is outside the window.
    pub fn replace(&mut self, cell: CellCoord) -> Result<bool, CacheError<L::Error>> {
        let start = Instant::now();
        self.stats = CacheStats::default();
        if !self.contains(cell) {
            return Ok(false);
        }
        let i = self.slot_index(cell);
        if let Some(old) = self.slots[i].take() {
            self.release(old);
        }
        let result = self.fill(i, cell);
        self.stats.elapsed = start.elapsed();
        result.map(|()| true)
    }

    /// Populate every failed cell again. Returns how many were retried.
    pub fn retry_failed(&mut self) -> Result<usize, CacheError<L::Error>> {
        let start = Instant::now();
        self.stats = CacheStats::default();
        let failed: Vec<(usize, CellCoord)> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match s {
                Some(Slot {
                    cell,
                    state: CellState::Failed,
                }) => Some((i, *cell)),
                _ => None,
            })
            .collect();
        let mut first_error = None;
        for &(i, cell) in &failed {
            if let Err(e) = self.fill(i, cell) {
                record_error(&mut first_error, e);
            }
        }
        self.stats.elapsed = start.elapsed();
        first_error.map_or(Ok(failed.len()), Err)
    }

    /// Evict everything and forget the window; the next update starts fresh.
    pub fn clear(&mut self) {
        self.stats = CacheStats::default();
        for i in 0..self.slots.len() {
            if let Some(slot) = self.slots[i].take() {
                self.release(slot);
            }
        }
        self.window = None;
    }

    pub fn contains(&self, cell: CellCoord) -> bool {
        self.window.is_some_and(|w| w.contains(cell))
    }

    /// State of an in-window cell.
    pub fn get(&self, cell: CellCoord) -> Option<&CellState<L::Value>> {
        match &self.slots[self.slot_index(cell)] {
            Some(slot) if slot.cell == cell => Some(&slot.state),
            _ => None,
        }
    }

    pub fn value(&self, cell: CellCoord) -> Option<&L::Value> {
        self.get(cell).and_then(CellState::value)
    }

    /// In-window cells and their states, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &CellState<L::Value>)> + '_ {
        self.window
            .into_iter()
            .flat_map(CellWindow::cells)
            .filter_map(|c| self.get(c).map(|s| (c, s)))
    }

    pub fn values(&self) -> impl Iterator<Item = (CellCoord, &L::Value)> + '_ {
        self.iter().filter_map(|(c, s)| s.value().map(|v| (c, v)))
    }

    /// Number of slots holding any state.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn ready_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Some(slot) if slot.state.is_ready()))
            .count()
    }
}

impl<L: CellLifecycle> Drop for ToroidalCache<L> {
    fn drop(&mut self) {
        for slot in self.slots.iter_mut().filter_map(Option::take) {
            if let CellState::Ready(value) = slot.state {
                self.lifecycle.evict(slot.cell, value);
            }
        }
    }
}

fn record_error<E>(first: &mut Option<CacheError<E>>, e: CacheError<E>) {
    if first.is_none() {
        *first = Some(e);
    } else if let CacheError::Populate { cell, .. } = &e {
        tracing::warn!(%cell, "additional cell failed to populate");
    }
}
