//! Sentinel-based infinite scroll.
//!
//! A front end places an invisible sentinel after the last rendered post and
//! reports its visibility as [`IntersectionEntry`] values. [`InfiniteScroll`]
//! decides whether that visibility should trigger the next page.

/// Observer tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollOptions {
    /// Fraction of the sentinel that must be visible (0.0..=1.0).
    pub threshold: f32,
    /// Distance beyond the viewport edge that already counts as visible, in pixels/rows.
    pub root_margin: f32,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: 100.0,
        }
    }
}

/// One visibility observation of the sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub is_intersecting: bool,
    pub intersection_ratio: f32,
}

impl IntersectionEntry {
    /// Measure a sentinel against a viewport that starts at 0 and is
    /// `viewport_height` tall, grown by `root_margin` on both edges.
    pub fn measure(
        viewport_height: f32,
        sentinel_top: f32,
        sentinel_height: f32,
        root_margin: f32,
    ) -> Self {
        let root_top = -root_margin;
        let root_bottom = viewport_height + root_margin;
        let sentinel_bottom = sentinel_top + sentinel_height;

        let visible = (sentinel_bottom.min(root_bottom) - sentinel_top.max(root_top)).max(0.0);

        // A zero-height sentinel counts as fully visible when it sits inside the root
        let (is_intersecting, intersection_ratio) = if sentinel_height <= 0.0 {
            let inside = sentinel_top >= root_top && sentinel_top <= root_bottom;
            (inside, if inside { 1.0 } else { 0.0 })
        } else {
            (visible > 0.0, visible / sentinel_height)
        };

        Self {
            is_intersecting,
            intersection_ratio: intersection_ratio.clamp(0.0, 1.0),
        }
    }
}

/// Current fetch flags of the list the sentinel belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadGate {
    pub has_more: bool,
    pub loading: bool,
}

impl LoadGate {
    pub fn is_open(&self) -> bool {
        self.has_more && !self.loading
    }
}

/// Identifies one attachment of the observer to a sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelHandle {
    generation: u64,
}

/// Decides when a visible sentinel should load the next page.
#[derive(Debug, Default)]
pub struct InfiniteScroll {
    options: ScrollOptions,
    generation: u64,
    attached: bool,
}

impl InfiniteScroll {
    pub fn new(options: ScrollOptions) -> Self {
        Self {
            options,
            generation: 0,
            attached: false,
        }
    }

    pub fn options(&self) -> ScrollOptions {
        self.options
    }

    /// Attach to a sentinel. Any earlier handle stops triggering.
    pub fn attach(&mut self) -> SentinelHandle {
        self.generation += 1;
        self.attached = true;
        SentinelHandle {
            generation: self.generation,
        }
    }

    /// Re-attach with new options, as when the observer's inputs change.
    pub fn reattach(&mut self, options: ScrollOptions) -> SentinelHandle {
        self.options = options;
        self.attach()
    }

    pub fn detach(&mut self) {
        self.attached = false;
        self.generation += 1;
    }

    pub fn is_attached(&self, handle: &SentinelHandle) -> bool {
        self.attached && handle.generation == self.generation
    }

    /// Handle one observer callback. Returns `true` when the caller should
    /// load the next page: at most once per callback, and never while a load
    /// is in flight or nothing more is available.
    pub fn observe(
        &self,
        handle: &SentinelHandle,
        entries: &[IntersectionEntry],
        gate: LoadGate,
    ) -> bool {
        if !self.is_attached(handle) {
            return false;
        }

        let Some(target) = entries.first() else {
            return false;
        };

        target.is_intersecting
            && target.intersection_ratio >= self.options.threshold
            && gate.is_open()
    }
}
