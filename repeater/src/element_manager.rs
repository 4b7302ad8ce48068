use alloc::vec::Vec;

use crate::{
    CollectionChange, ElementId, ElementRealizationOptions, LayoutContext, Rect, ScrollOrientation,
};

/// Contiguous realized range kept by a virtualizing layout.
///
/// Slot `i` maps to data index `first_realized_index + i`. A `None` slot is a sentinel for an
/// index that is part of the range but has no element yet; it is realized lazily by
/// [`ElementManager::get_at`]. Clearing always works from the outer edges inward so the first
/// index only needs an O(1) update.
///
/// When the context is not virtualizing (its realization rect is infinite) every item counts as
/// realized and realized indices equal data indices.
#[derive(Clone, Debug)]
pub struct ElementManager {
    orientation: ScrollOrientation,
    realized: Vec<Option<ElementId>>,
    bounds: Vec<Rect>,
    first_realized_index: Option<usize>,
    is_virtualizing: bool,
}

impl Default for ElementManager {
    fn default() -> Self {
        Self::new(ScrollOrientation::Vertical)
    }
}

impl ElementManager {
    pub fn new(orientation: ScrollOrientation) -> Self {
        Self {
            orientation,
            realized: Vec::new(),
            bounds: Vec::new(),
            first_realized_index: None,
            is_virtualizing: true,
        }
    }

    pub fn orientation(&self) -> ScrollOrientation {
        self.orientation
    }

    pub fn is_virtualizing_context(&self) -> bool {
        self.is_virtualizing
    }

    /// Prepares for a measure pass: trims the range to the realization window, or sizes the
    /// bounds table when every item is realized.
    pub fn on_begin_measure(&mut self, ctx: &mut dyn LayoutContext) {
        self.is_virtualizing = !ctx.realization_rect().is_infinite();
        if self.is_virtualizing {
            let window = ctx.realization_rect();
            self.discard_elements_outside_window(ctx, window, self.orientation);
        } else {
            self.realized.clear();
            self.first_realized_index = None;
            self.bounds.resize(ctx.item_count(), Rect::ZERO);
        }
    }

    pub fn realized_element_count(&self, ctx: &dyn LayoutContext) -> usize {
        if self.is_virtualizing {
            self.realized.len()
        } else {
            ctx.item_count()
        }
    }

    pub fn first_realized_index(&self) -> Option<usize> {
        if self.is_virtualizing {
            self.first_realized_index
        } else if self.bounds.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn last_realized_index(&self) -> Option<usize> {
        if self.is_virtualizing {
            self.first_realized_index
                .map(|first| first + self.realized.len() - 1)
        } else {
            self.bounds.len().checked_sub(1)
        }
    }

    /// Realized elements and their data indices, sentinels skipped.
    pub fn realized_elements(&self) -> impl Iterator<Item = (usize, ElementId)> + '_ {
        let first = self.first_realized_index.unwrap_or(0);
        self.realized
            .iter()
            .enumerate()
            .filter_map(move |(i, slot)| slot.map(|e| (first + i, e)))
    }

    /// Returns the element in realized slot `realized_index`, creating it if the slot is a
    /// sentinel.
    pub fn get_at(&mut self, ctx: &mut dyn LayoutContext, realized_index: usize) -> ElementId {
        if !self.is_virtualizing {
            return ctx.get_or_create_element_at(realized_index, ElementRealizationOptions::NONE);
        }

        assert!(
            realized_index < self.realized.len(),
            "realized index {realized_index} outside the realized range ({})",
            self.realized.len()
        );
        if let Some(element) = self.realized[realized_index] {
            return element;
        }
        let data_index = self.data_index_from_realized_index(realized_index);
        rtrace!(data_index, "ElementManager: realizing sentinel slot");
        let element = ctx.get_or_create_element_at(
            data_index,
            ElementRealizationOptions::FORCE_CREATE
                | ElementRealizationOptions::SUPPRESS_AUTO_RECYCLE,
        );
        self.realized[realized_index] = Some(element);
        element
    }

    /// Appends `element` after the last realized index.
    pub fn add(&mut self, element: ElementId, data_index: usize) {
        if self.realized.is_empty() {
            self.first_realized_index = Some(data_index);
        }
        debug_assert_eq!(
            self.first_realized_index.map(|f| f + self.realized.len()),
            Some(data_index),
            "added index breaks range contiguity"
        );
        self.realized.push(Some(element));
        self.bounds.push(Rect::ZERO);
    }

    /// Inserts a slot; `element = None` inserts a sentinel.
    pub fn insert(&mut self, realized_index: usize, data_index: usize, element: Option<ElementId>) {
        if realized_index == 0 {
            self.first_realized_index = Some(data_index);
        }
        self.realized.insert(realized_index, element);
        self.bounds.insert(realized_index, Rect::ZERO);
    }

    /// Recycles `count` slots starting at `realized_index` and removes them from the range.
    pub fn clear_realized_range_at(
        &mut self,
        ctx: &mut dyn LayoutContext,
        realized_index: usize,
        count: usize,
    ) {
        if count == 0 {
            return;
        }
        let is_front = realized_index == 0;
        for i in 0..count {
            let slot = if is_front {
                realized_index + i
            } else {
                realized_index + count - 1 - i
            };
            if let Some(element) = self.realized[slot] {
                ctx.recycle_element(element);
            }
        }

        self.realized.drain(realized_index..realized_index + count);
        self.bounds.drain(realized_index..realized_index + count);

        if is_front {
            self.first_realized_index = if self.realized.is_empty() {
                None
            } else {
                self.first_realized_index.map(|first| first + count)
            };
        }
    }

    pub fn clear_realized_range(&mut self, ctx: &mut dyn LayoutContext) {
        let count = self.realized.len();
        self.clear_realized_range_at(ctx, 0, count);
    }

    /// Clears realized elements outside `window`, keeping at most one element past each end.
    ///
    /// Layouts may place one element beyond the window before they notice they are done, and
    /// that element can be the anchor of a bring-into-view. Calling this twice with the same
    /// window changes nothing the second time.
    pub fn discard_elements_outside_window(
        &mut self,
        ctx: &mut dyn LayoutContext,
        window: Rect,
        orientation: ScrollOrientation,
    ) {
        if !self.is_virtualizing || self.realized.is_empty() {
            return;
        }
        let size = self.realized.len();

        let leading = self
            .bounds
            .iter()
            .take_while(|b| !window.intersects_along(b, orientation))
            .count();
        let trailing = self
            .bounds
            .iter()
            .rev()
            .take_while(|b| !window.intersects_along(b, orientation))
            .count();

        // Slot one past each non-intersecting run is kept.
        let back_cutoff = size - trailing;
        if back_cutoff + 1 < size {
            rtrace!(count = size - back_cutoff - 1, "ElementManager: trimming back");
            self.clear_realized_range_at(ctx, back_cutoff + 1, size - back_cutoff - 1);
        }
        let front_cutoff = leading.saturating_sub(1);
        if front_cutoff > 0 {
            let count = front_cutoff.min(self.realized.len());
            rtrace!(count, "ElementManager: trimming front");
            self.clear_realized_range_at(ctx, 0, count);
        }
    }

    /// Clears everything from `data_index` onward (`forward`) or up to and including it.
    pub fn discard_elements_from(
        &mut self,
        ctx: &mut dyn LayoutContext,
        forward: bool,
        data_index: usize,
    ) {
        if !self.is_data_index_realized(data_index) {
            return;
        }
        let realized_index = self.realized_index_from_data_index(data_index);
        if forward {
            let count = self.realized.len() - realized_index;
            self.clear_realized_range_at(ctx, realized_index, count);
        } else {
            self.clear_realized_range_at(ctx, 0, realized_index + 1);
        }
    }

    pub fn is_data_index_realized(&self, data_index: usize) -> bool {
        if !self.is_virtualizing {
            return data_index < self.bounds.len();
        }
        match self.first_realized_index {
            Some(first) => data_index >= first && data_index < first + self.realized.len(),
            None => false,
        }
    }

    pub fn is_index_valid_in_data(&self, ctx: &dyn LayoutContext, data_index: usize) -> bool {
        data_index < ctx.item_count()
    }

    pub fn realized_element(&self, data_index: usize) -> Option<ElementId> {
        if !self.is_virtualizing || !self.is_data_index_realized(data_index) {
            return None;
        }
        self.realized[self.realized_index_from_data_index(data_index)]
    }

    /// Makes sure `data_index` is realized, extending the range at the end (`forward`) or the
    /// front.
    pub fn ensure_element_realized(
        &mut self,
        ctx: &mut dyn LayoutContext,
        forward: bool,
        data_index: usize,
    ) {
        if self.is_data_index_realized(data_index) {
            return;
        }
        let element = ctx.get_or_create_element_at(
            data_index,
            ElementRealizationOptions::FORCE_CREATE
                | ElementRealizationOptions::SUPPRESS_AUTO_RECYCLE,
        );
        if forward {
            self.add(element, data_index);
        } else {
            self.insert(0, data_index, Some(element));
        }
    }

    /// Whether the realized range still touches `window`, i.e. whether layout can continue from
    /// it instead of starting over from an anchor.
    pub fn is_window_connected(&self, window: Rect, orientation: ScrollOrientation) -> bool {
        if self.realized.is_empty() {
            return false;
        }
        let first = &self.bounds[0];
        let last = &self.bounds[self.bounds.len() - 1];
        window.intersects_along(first, orientation)
            || window.intersects_along(last, orientation)
            || (first.main_start(orientation) <= window.main_start(orientation)
                && last.main_end(orientation) >= window.main_end(orientation))
    }

    pub fn layout_bounds_for_data_index(&self, data_index: usize) -> Rect {
        self.bounds[self.realized_index_from_data_index(data_index)]
    }

    pub fn set_layout_bounds_for_data_index(&mut self, data_index: usize, bounds: Rect) {
        let realized_index = self.realized_index_from_data_index(data_index);
        self.bounds[realized_index] = bounds;
    }

    pub fn layout_bounds_for_realized_index(&self, realized_index: usize) -> Rect {
        self.bounds[realized_index]
    }

    pub fn set_layout_bounds_for_realized_index(&mut self, realized_index: usize, bounds: Rect) {
        self.bounds[realized_index] = bounds;
    }

    pub fn data_index_from_realized_index(&self, realized_index: usize) -> usize {
        if self.is_virtualizing {
            realized_index + self.first_realized_index.unwrap_or(0)
        } else {
            realized_index
        }
    }

    pub fn realized_index_from_data_index(&self, data_index: usize) -> usize {
        if self.is_virtualizing {
            data_index - self.first_realized_index.unwrap_or(0)
        } else {
            data_index
        }
    }

    /// Keeps the range in step with a collection change. Indices are those before the change.
    pub fn data_source_changed(&mut self, ctx: &mut dyn LayoutContext, change: &CollectionChange) {
        if !self.is_virtualizing {
            return;
        }
        rtrace!(?change, "ElementManager::data_source_changed");
        match *change {
            CollectionChange::Add { index, count } => self.on_items_added(index, count),
            CollectionChange::Remove { index, count } => {
                self.on_items_removed(ctx, index, count)
            }
            CollectionChange::Replace {
                index,
                old_count,
                new_count,
            } => {
                let in_place = old_count == new_count
                    && old_count > 0
                    && self.is_data_index_realized(index)
                    && self.is_data_index_realized(index + old_count - 1);
                if in_place {
                    // Removing and re-adding could drop the anchor and force a full relayout.
                    let start = self.realized_index_from_data_index(index);
                    for slot in start..start + old_count {
                        if let Some(element) = self.realized[slot].take() {
                            ctx.recycle_element(element);
                        }
                    }
                } else {
                    self.on_items_removed(ctx, index, old_count);
                    self.on_items_added(index, new_count);
                }
            }
            CollectionChange::Move {
                old_index,
                new_index,
                count,
            } => {
                self.on_items_removed(ctx, old_index, count);
                self.on_items_added(new_index, count);
            }
            CollectionChange::Reset => self.clear_realized_range(ctx),
        }
    }

    fn on_items_added(&mut self, index: usize, count: usize) {
        let Some(first) = self.first_realized_index else {
            return;
        };
        let last = first + self.realized.len() - 1;
        if index > first && index <= last {
            // Sentinels keep the range contiguous without creating elements the next layout
            // pass may throw away.
            let start = index - first;
            for i in 0..count {
                self.insert(start + i, index + i, None);
            }
        } else if index <= first {
            self.first_realized_index = Some(first + count);
        }
    }

    fn on_items_removed(&mut self, ctx: &mut dyn LayoutContext, index: usize, count: usize) {
        let Some(first) = self.first_realized_index else {
            return;
        };
        if count == 0 {
            return;
        }
        let last = first + self.realized.len() - 1;
        let start = first.max(index);
        let end = last.min(index + count - 1);
        if end >= start {
            let realized_index = self.realized_index_from_data_index(start);
            self.clear_realized_range_at(ctx, realized_index, end - start + 1);
        }
        if index <= first {
            // Compare against the first index before clearing: everything left in the range
            // sat after the removed span.
            if let Some(current) = self.first_realized_index {
                self.first_realized_index = Some(current - count);
            }
        }
    }
}
