// Scrollable panel state
//
// Each panel owns its scroll state; App just renders and routes input.
// Two behaviors matter for the timeline browser:
//
// 1. Auto-follow: the view stays pinned to the bottom (most recent first
//    convention) until the user scrolls away, and re-engages when they
//    scroll back to the bottom.
// 2. Anchor preservation: when older rows are prepended above the
//    viewport, the offset shifts by the number of new rows so the visible
//    content does not move - the row-based analogue of restoring
//    scrollTop from the scrollHeight difference.

/// Scroll state for a single panel
#[derive(Debug, Clone)]
pub struct ScrollState {
    /// Current scroll offset (row index at top of viewport)
    offset: usize,

    /// Total number of rows in content
    total: usize,

    /// Number of rows visible in viewport
    viewport: usize,

    /// Whether to keep the view pinned to the bottom as content changes.
    /// User scrolling up disables this; scrolling to bottom re-enables.
    pub auto_follow: bool,
}

impl ScrollState {
    /// Create new scroll state with auto-follow enabled
    pub fn new() -> Self {
        Self {
            offset: 0,
            total: 0,
            viewport: 0,
            auto_follow: true,
        }
    }

    /// Update content and viewport dimensions.
    /// Call this each render frame with current sizes.
    pub fn update_dimensions(&mut self, total: usize, viewport: usize) {
        self.total = total;
        self.viewport = viewport;

        if self.auto_follow {
            self.offset = self.max_offset();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
    }

    /// Account for `count` rows prepended above the viewport, keeping the
    /// currently visible rows in place.
    pub fn note_prepended(&mut self, count: usize) {
        self.total += count;
        if self.auto_follow {
            self.offset = self.max_offset();
        } else {
            self.offset = (self.offset + count).min(self.max_offset());
        }
    }

    /// Restore a previously stored offset (re-entering a timeline slot).
    /// Leaves auto-follow off: the user had scrolled somewhere specific.
    pub fn restore(&mut self, offset: usize) {
        self.offset = offset;
        self.auto_follow = false;
    }

    /// Scroll up by one row. Disables auto-follow (user took control).
    pub fn scroll_up(&mut self) {
        if self.offset > 0 {
            self.offset -= 1;
            self.auto_follow = false;
        }
    }

    /// Scroll down by one row. Re-enables auto-follow at the bottom.
    pub fn scroll_down(&mut self) {
        if self.total == 0 || self.offset < self.max_offset() {
            self.offset += 1;
        }

        if self.total > 0 && self.offset >= self.max_offset() {
            self.auto_follow = true;
        }
    }

    /// Scroll up by a page
    pub fn page_up(&mut self) {
        let page = self.viewport.max(1);
        self.offset = self.offset.saturating_sub(page);
        self.auto_follow = false;
    }

    /// Scroll down by a page
    pub fn page_down(&mut self) {
        let page = self.viewport.max(1);
        self.offset = (self.offset + page).min(self.max_offset());

        if self.offset >= self.max_offset() {
            self.auto_follow = true;
        }
    }

    /// Jump to top
    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
        self.auto_follow = false;
    }

    /// Jump to bottom (and enable auto-follow)
    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max_offset();
        self.auto_follow = true;
    }

    /// Whether the viewport is at the very top of the content
    pub fn at_top(&self) -> bool {
        self.offset == 0
    }

    /// Move the viewport the minimum amount needed to show `index`.
    pub fn ensure_visible(&mut self, index: usize) {
        if self.viewport == 0 {
            return;
        }
        if index < self.offset {
            self.offset = index;
            self.auto_follow = false;
        } else if index >= self.offset + self.viewport {
            self.offset = index + 1 - self.viewport;
        }
        if self.total > 0 && self.offset >= self.max_offset() {
            self.auto_follow = true;
        }
    }

    /// Get current scroll offset
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Get visible range (start_index, end_index)
    pub fn visible_range(&self) -> (usize, usize) {
        let start = self.offset;
        let end = (self.offset + self.viewport).min(self.total);
        (start, end)
    }

    /// Check if content overflows viewport (scrollbar needed)
    pub fn needs_scrollbar(&self) -> bool {
        self.total > self.viewport
    }

    /// Maximum valid offset
    fn max_offset(&self) -> usize {
        self.total.saturating_sub(self.viewport)
    }

    /// Get total content size
    pub fn total(&self) -> usize {
        self.total
    }

    /// Get viewport size
    pub fn viewport(&self) -> usize {
        self.viewport
    }
}

impl Default for ScrollState {
    fn default() -> Self {
        Self::new()
    }
}
