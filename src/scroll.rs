//! Scroll-offset signals for list views.
//!
//! Two derived booleans: "past the top threshold" (shows a scroll-to-top
//! affordance) and "near the end" (asks the coordinator for the next page).

/// Distance from the bottom, in pixels, that counts as "near the end".
pub const DEFAULT_END_THRESHOLD_PX: f64 = 200.0;

/// True when `offset` is strictly beyond `threshold_px`.
pub fn is_past_threshold(offset: f64, threshold_px: f64) -> bool {
    offset > threshold_px
}

/// True when the bottom of the viewport is within `threshold_px` of the
/// end of the content.
///
/// Content shorter than the viewport is always "near the end".
pub fn is_near_end(
    offset: f64,
    viewport_height: f64,
    content_height: f64,
    threshold_px: f64,
) -> bool {
    let remaining = content_height - (offset.max(0.0) + viewport_height);
    remaining <= threshold_px
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTracker {
    threshold_px: f64,
    offset: f64,
}

impl ScrollTracker {
    pub fn new(threshold_px: f64) -> Self {
        Self {
            threshold_px,
            offset: 0.0,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold_px
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Record a scroll offset. Returns whether the scroll-to-top affordance
    /// should now be visible.
    pub fn on_scroll(&mut self, offset: f64) -> bool {
        self.offset = offset;
        self.show_scroll_to_top()
    }

    pub fn show_scroll_to_top(&self) -> bool {
        is_past_threshold(self.offset, self.threshold_px)
    }
}
