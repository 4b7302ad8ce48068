use crate::{CollectionChange, ElementId, ElementRealizationOptions, Point, Rect, Size};

/// The view of a repeater that a [`Layout`] works against.
///
/// Rects are in layout coordinates: repeater coordinates offset by the layout origin.
pub trait LayoutContext {
    fn item_count(&self) -> usize;

    /// Returns the element for `index`, realizing it if needed.
    ///
    /// Panics if `index` is outside the items source.
    fn get_or_create_element_at(
        &mut self,
        index: usize,
        options: ElementRealizationOptions,
    ) -> ElementId;

    /// Gives an element the layout no longer needs back to the repeater.
    ///
    /// Panics if the layout does not hold `element`.
    fn recycle_element(&mut self, element: ElementId);

    /// Region within which indexes must stay realized.
    fn realization_rect(&self) -> Rect;

    fn visible_rect(&self) -> Rect;

    /// Index the layout should start generating from, if something must stay anchored.
    fn recommended_anchor_index(&self) -> Option<usize>;

    fn layout_origin(&self) -> Point;

    fn set_layout_origin(&mut self, origin: Point);

    /// Records where `element` was placed during arrange.
    fn arrange_element(&mut self, element: ElementId, bounds: Rect);

    fn invalidate_measure(&mut self);
}

/// A pluggable placement algorithm.
pub trait Layout {
    /// Non-virtualizing layouts realize every item and opt out of viewport management.
    fn is_virtualizing(&self) -> bool {
        true
    }

    fn initialize_for_context(&mut self, ctx: &mut dyn LayoutContext) {
        let _ = ctx;
    }

    /// Called when the layout is detached; it should drop any element it still tracks.
    fn uninitialize_for_context(&mut self, ctx: &mut dyn LayoutContext) {
        let _ = ctx;
    }

    fn measure(&mut self, ctx: &mut dyn LayoutContext, available: Size) -> Size;

    fn arrange(&mut self, ctx: &mut dyn LayoutContext, final_size: Size) -> Size;

    fn on_items_changed(&mut self, ctx: &mut dyn LayoutContext, change: &CollectionChange) {
        let _ = change;
        ctx.invalidate_measure();
    }
}
