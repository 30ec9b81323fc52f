//! Generic scrollable list with a cursor.

pub struct ScrollableList<T> {
    pub items: Vec<T>,
    pub selected: usize,
    pub scroll_offset: usize,
}

impl<T> ScrollableList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            scroll_offset: 0,
        }
    }

    /// Replace the contents and put the cursor back on the first row.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_up(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + n).min(self.items.len().saturating_sub(1));
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    /// Items visible in `height` rows.
    /// Call ensure_visible first to update scroll_offset.
    pub fn visible_items(&self, height: usize) -> &[T] {
        if height == 0 || self.items.is_empty() {
            return &[];
        }
        let end = (self.scroll_offset + height).min(self.items.len());
        &self.items[self.scroll_offset..end]
    }

    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected.saturating_sub(height - 1);
        }
    }

    /// Handle a click at `row` within the rendered area.
    /// Returns true if the row holds an item.
    pub fn handle_click(&mut self, row: usize) -> bool {
        let target = self.scroll_offset + row;
        if target < self.items.len() {
            self.selected = target;
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected_in_view(&self, height: usize) -> usize {
        self.selected
            .saturating_sub(self.scroll_offset)
            .min(height.saturating_sub(1))
    }
}

impl<T> Default for ScrollableList<T> {
    fn default() -> Self {
        Self::new()
    }
}
