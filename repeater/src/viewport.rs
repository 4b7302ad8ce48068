use alloc::vec::Vec;

use crate::options::validate_cache_length;
use crate::registry::ElementRegistry;
use crate::{ElementId, Point, Rect, RepeaterError, RepeaterOptions, ScrollOwner};

/// Tracks the visible and realization windows handed to the layout.
///
/// Responsibilities:
/// - grow a cache buffer around the visible window a little on every arrange pass, so building
///   a large offscreen cache never stalls a single frame;
/// - remember the viewport shift a layout pass implies when the extent origin moves, and fold
///   shifts the scroll owner could not honor into a permanent correction;
/// - manage which children may serve as scroll anchors, in particular while a bring-into-view
///   operation is in flight.
#[derive(Clone, Debug)]
pub struct ViewportManager {
    managing_disabled: bool,
    has_layout: bool,
    has_scroller: bool,

    visible_window: Rect,
    layout_extent: Rect,
    expected_shift: Point,
    pending_shift: Point,
    unshiftable_shift: Point,
    layout_updated_armed: bool,
    shift_tolerance: f64,

    max_horizontal_cache_length: f64,
    max_vertical_cache_length: f64,
    horizontal_cache_buffer_per_side: f64,
    vertical_cache_buffer_per_side: f64,
    cache_buffer_inflation: f64,
    cache_build_requested: bool,
    cache_build_pending: bool,

    made_anchor: Option<ElementId>,
    is_anchor_outside_realized_range: bool,
    bring_into_view_in_progress: bool,
    suppressed_candidates: Vec<ElementId>,
    rendering_requested: bool,

    measure_requested: bool,
}

impl ViewportManager {
    pub fn new(options: &RepeaterOptions) -> Self {
        Self {
            managing_disabled: false,
            has_layout: false,
            has_scroller: false,
            visible_window: Rect::infinite(),
            layout_extent: Rect::ZERO,
            expected_shift: Point::ZERO,
            pending_shift: Point::ZERO,
            unshiftable_shift: Point::ZERO,
            layout_updated_armed: false,
            shift_tolerance: options.viewport_shift_tolerance,
            max_horizontal_cache_length: options.horizontal_cache_length,
            max_vertical_cache_length: options.vertical_cache_length,
            horizontal_cache_buffer_per_side: 0.0,
            vertical_cache_buffer_per_side: 0.0,
            cache_buffer_inflation: options.cache_buffer_inflation,
            cache_build_requested: false,
            cache_build_pending: false,
            made_anchor: None,
            is_anchor_outside_realized_range: false,
            bring_into_view_in_progress: false,
            suppressed_candidates: Vec::new(),
            rendering_requested: false,
            measure_requested: false,
        }
    }

    pub fn is_managing_viewport(&self) -> bool {
        !self.managing_disabled
    }

    pub fn has_scroller(&self) -> bool {
        self.has_scroller
    }

    /// The last viewport reported by the scroll owner, in repeater coordinates.
    pub fn visible_window(&self) -> Rect {
        self.visible_window
    }

    pub fn layout_extent(&self) -> Rect {
        self.layout_extent
    }

    pub fn expected_viewport_shift(&self) -> Point {
        self.expected_shift
    }

    pub fn pending_viewport_shift(&self) -> Point {
        self.pending_shift
    }

    pub fn unshiftable_shift(&self) -> Point {
        self.unshiftable_shift
    }

    pub fn is_waiting_for_layout_updated(&self) -> bool {
        self.layout_updated_armed
    }

    pub fn horizontal_cache_buffer_per_side(&self) -> f64 {
        self.horizontal_cache_buffer_per_side
    }

    pub fn vertical_cache_buffer_per_side(&self) -> f64 {
        self.vertical_cache_buffer_per_side
    }

    pub fn horizontal_cache_length(&self) -> f64 {
        self.max_horizontal_cache_length
    }

    pub fn vertical_cache_length(&self) -> f64 {
        self.max_vertical_cache_length
    }

    pub fn made_anchor(&self) -> Option<ElementId> {
        self.made_anchor
    }

    pub fn is_bring_into_view_in_progress(&self) -> bool {
        self.bring_into_view_in_progress
    }

    pub fn is_rendering_requested(&self) -> bool {
        self.rendering_requested
    }

    pub fn set_horizontal_cache_length(&mut self, value: f64) -> Result<(), RepeaterError> {
        if self.max_horizontal_cache_length != value {
            validate_cache_length(value)?;
            self.max_horizontal_cache_length = value;
            self.reset_cache_buffer();
        }
        Ok(())
    }

    pub fn set_vertical_cache_length(&mut self, value: f64) -> Result<(), RepeaterError> {
        if self.max_vertical_cache_length != value {
            validate_cache_length(value)?;
            self.max_vertical_cache_length = value;
            self.reset_cache_buffer();
        }
        Ok(())
    }

    /// Visible window in layout coordinates, ignoring any made anchor.
    pub fn layout_visible_window_discard_anchor(&self) -> Rect {
        let mut window = self.visible_window;
        if self.has_scroller {
            window.x += self.layout_extent.x + self.expected_shift.x + self.unshiftable_shift.x;
            window.y += self.layout_extent.y + self.expected_shift.y + self.unshiftable_shift.y;
        }
        window
    }

    pub fn layout_visible_window(&self) -> Rect {
        if self.managing_disabled {
            return Rect::infinite();
        }
        let mut window = self.visible_window;
        if self.made_anchor.is_some() && self.is_anchor_outside_realized_range {
            // The anchor is not laid out yet and is expected to land at the origin. Only moved
            // when the anchor is outside the realized range; moving the window for an anchor
            // inside it would look like a new bring-into-view to the layout.
            window.x = 0.0;
            window.y = 0.0;
        } else if self.has_scroller {
            window.x += self.layout_extent.x + self.expected_shift.x + self.unshiftable_shift.x;
            window.y += self.layout_extent.y + self.expected_shift.y + self.unshiftable_shift.y;
        }
        window
    }

    pub fn layout_realization_window(&self) -> Rect {
        let mut window = self.layout_visible_window();
        if self.has_scroller && !self.managing_disabled {
            window.x -= self.horizontal_cache_buffer_per_side;
            window.y -= self.vertical_cache_buffer_per_side;
            window.width += self.horizontal_cache_buffer_per_side * 2.0;
            window.height += self.vertical_cache_buffer_per_side * 2.0;
        }
        window
    }

    /// Element to anchor on: the made anchor first, else the scroll owner's anchor when it is
    /// one of our children.
    pub fn suggested_anchor(
        &self,
        registry: &ElementRegistry,
        scroll_owner: Option<&(dyn ScrollOwner + 'static)>,
    ) -> Option<ElementId> {
        if let Some(anchor) = self.made_anchor {
            return Some(anchor);
        }
        let anchor = scroll_owner?.current_anchor()?;
        if registry.contains(anchor) {
            Some(anchor)
        } else {
            rwarn!(anchor = anchor.0, "scroll anchor is not a child of this repeater");
            None
        }
    }

    /// Records the extent produced by a measure pass and the viewport shift it implies.
    pub fn set_layout_extent(&mut self, extent: Rect) {
        self.expected_shift.x += self.layout_extent.x - extent.x;
        self.expected_shift.y += self.layout_extent.y - extent.y;

        if self.expected_shift.x.abs() > self.shift_tolerance
            || self.expected_shift.y.abs() > self.shift_tolerance
        {
            rtrace!(
                x = self.expected_shift.x,
                y = self.expected_shift.y,
                "expecting viewport shift"
            );
            // The scroll owner may be unable to shift (for instance at an edge). If no new
            // viewport arrives before layout settles, on_layout_updated gives up on it.
            self.layout_updated_armed = true;
        }

        self.layout_extent = extent;
        self.pending_shift = self.expected_shift;
    }

    pub fn on_layout_changed(&mut self, has_layout: bool, is_virtualizing: bool) {
        self.has_layout = has_layout;
        self.managing_disabled = !is_virtualizing;
        self.layout_extent = Rect::ZERO;
        self.expected_shift = Point::ZERO;
        self.pending_shift = Point::ZERO;
        self.unshiftable_shift = Point::ZERO;
        self.layout_updated_armed = false;
        self.reset_cache_buffer();
    }

    /// Grows the cache buffer while it is below its maximum and asks for another build step.
    pub fn on_owner_arranged(&mut self) {
        self.expected_shift = Point::ZERO;

        if self.managing_disabled || !self.has_scroller {
            return;
        }

        let max_horizontal =
            self.max_horizontal_cache_length * self.visible_window.width / 2.0;
        let max_vertical = self.max_vertical_cache_length * self.visible_window.height / 2.0;

        // The viewport shrank since the buffer was built.
        if self.horizontal_cache_buffer_per_side > max_horizontal
            || self.vertical_cache_buffer_per_side > max_vertical
        {
            self.horizontal_cache_buffer_per_side =
                self.horizontal_cache_buffer_per_side.min(max_horizontal);
            self.vertical_cache_buffer_per_side =
                self.vertical_cache_buffer_per_side.min(max_vertical);
            rtrace!(
                horizontal = self.horizontal_cache_buffer_per_side,
                vertical = self.vertical_cache_buffer_per_side,
                "cache buffer clamped"
            );
            self.measure_requested = true;
        }

        let continue_building = self.horizontal_cache_buffer_per_side < max_horizontal
            || self.vertical_cache_buffer_per_side < max_vertical;

        if continue_building {
            self.horizontal_cache_buffer_per_side = (self.horizontal_cache_buffer_per_side
                + self.cache_buffer_inflation)
                .min(max_horizontal);
            self.vertical_cache_buffer_per_side = (self.vertical_cache_buffer_per_side
                + self.cache_buffer_inflation)
                .min(max_vertical);
            rtrace!(
                horizontal = self.horizontal_cache_buffer_per_side,
                vertical = self.vertical_cache_buffer_per_side,
                "cache buffer grown"
            );
            // Registered even when the maximum was just reached: the grown buffer still needs
            // one more measure to be used.
            self.register_cache_build_work();
        }
    }

    /// Layout settled without a new viewport: the scroll owner will not honor the pending
    /// shift, so treat it as permanent.
    pub fn on_layout_updated(&mut self) {
        if !self.layout_updated_armed {
            return;
        }
        self.layout_updated_armed = false;
        if self.managing_disabled {
            return;
        }
        if !self.pending_shift.is_zero() {
            rdebug!(
                x = self.pending_shift.x,
                y = self.pending_shift.y,
                "viewport shift not honored, folding into correction"
            );
            self.unshiftable_shift.x += self.pending_shift.x;
            self.unshiftable_shift.y += self.pending_shift.y;
            self.pending_shift = Point::ZERO;
            self.expected_shift = Point::ZERO;
            self.try_invalidate_measure();
        }
    }

    pub fn on_scroller_changed(&mut self, has_scroller: bool) {
        self.has_scroller = has_scroller;
        self.visible_window = if has_scroller {
            Rect::ZERO
        } else {
            Rect::infinite()
        };
        self.pending_shift = Point::ZERO;
        self.unshiftable_shift = Point::ZERO;
        self.layout_updated_armed = false;
        self.reset_cache_buffer();
    }

    /// A new viewport from the scroll owner; any shift we were waiting for has been applied.
    pub fn on_effective_viewport_changed(&mut self, viewport: Option<Rect>) {
        if self.managing_disabled {
            return;
        }
        self.update_viewport(viewport);
        self.pending_shift = Point::ZERO;
        self.unshiftable_shift = Point::ZERO;
        if self.visible_window == Rect::ZERO {
            self.layout_extent = Rect::ZERO;
        }
        self.layout_updated_armed = false;
    }

    fn update_viewport(&mut self, viewport: Option<Rect>) {
        match viewport {
            Some(viewport) if viewport.width > 0.0 || viewport.height > 0.0 => {
                rtrace!(
                    x = viewport.x,
                    y = viewport.y,
                    width = viewport.width,
                    height = viewport.height,
                    "viewport updated"
                );
                self.visible_window = viewport;
            }
            _ => {
                rtrace!("viewport cleared");
                self.visible_window = Rect::ZERO;
            }
        }
        self.try_invalidate_measure();
    }

    pub fn on_make_anchor(&mut self, anchor: ElementId, is_anchor_outside_realized_range: bool) {
        if self.made_anchor != Some(anchor) {
            self.made_anchor = Some(anchor);
            self.is_anchor_outside_realized_range = is_anchor_outside_realized_range;
        }
        // The made anchor only lasts until the next rendered frame.
        self.rendering_requested = true;
    }

    pub fn on_element_prepared(
        &mut self,
        registry: &mut ElementRegistry,
        scroll_owner: Option<&mut (dyn ScrollOwner + 'static)>,
        element: ElementId,
    ) {
        if self.bring_into_view_in_progress && self.made_anchor != Some(element) {
            // Restored with the other suppressed candidates on the next rendering tick.
            if !self.suppressed_candidates.contains(&element) {
                self.suppressed_candidates.push(element);
            }
            return;
        }
        set_can_be_scroll_anchor(registry, scroll_owner, element, true);
    }

    pub fn on_element_cleared(
        &mut self,
        registry: &mut ElementRegistry,
        scroll_owner: Option<&mut (dyn ScrollOwner + 'static)>,
        element: ElementId,
    ) {
        self.suppressed_candidates.retain(|&e| e != element);
        if self.made_anchor == Some(element) {
            self.made_anchor = None;
        }
        set_can_be_scroll_anchor(registry, scroll_owner, element, false);
    }

    /// Restricts anchor candidacy to `target` until the next rendered frame.
    pub fn on_bring_into_view_requested(
        &mut self,
        registry: &mut ElementRegistry,
        mut scroll_owner: Option<&mut (dyn ScrollOwner + 'static)>,
        target: ElementId,
    ) -> Result<(), RepeaterError> {
        if self.managing_disabled {
            return Ok(());
        }
        if !registry.contains(target) {
            return Err(RepeaterError::NotAChild);
        }

        let others = registry.collect_children(|info| info.can_be_scroll_anchor());
        for child in others.into_iter().filter(|&c| c != target) {
            set_can_be_scroll_anchor(registry, scroll_owner.as_deref_mut(), child, false);
            self.suppressed_candidates.push(child);
        }

        self.bring_into_view_in_progress = true;
        self.rendering_requested = true;
        Ok(())
    }

    /// Rendering tick: the bring-into-view target and made anchor have been honored.
    pub fn on_rendering(
        &mut self,
        registry: &mut ElementRegistry,
        mut scroll_owner: Option<&mut (dyn ScrollOwner + 'static)>,
    ) {
        if !self.rendering_requested {
            return;
        }
        self.rendering_requested = false;
        self.bring_into_view_in_progress = false;
        self.made_anchor = None;
        self.pending_shift = Point::ZERO;

        if !self.cache_build_pending {
            self.try_invalidate_measure();
        }

        for child in core::mem::take(&mut self.suppressed_candidates) {
            let still_held = registry.info(child).is_some_and(|i| i.is_held_by_layout());
            if still_held {
                set_can_be_scroll_anchor(registry, scroll_owner.as_deref_mut(), child, true);
            }
        }
    }

    fn reset_cache_buffer(&mut self) {
        self.horizontal_cache_buffer_per_side = 0.0;
        self.vertical_cache_buffer_per_side = 0.0;
        if !self.managing_disabled {
            self.register_cache_build_work();
        }
    }

    fn register_cache_build_work(&mut self) {
        if self.has_layout && !self.cache_build_pending {
            self.cache_build_requested = true;
            self.cache_build_pending = true;
        }
    }

    /// Returns `true` once per requested cache build step; the caller schedules it.
    pub fn take_cache_build_request(&mut self) -> bool {
        core::mem::take(&mut self.cache_build_requested)
    }

    pub fn is_cache_build_pending(&self) -> bool {
        self.cache_build_pending
    }

    pub fn on_cache_build_completed(&mut self) {
        self.cache_build_pending = false;
        if !self.managing_disabled {
            self.measure_requested = true;
        }
    }

    /// Drops a scheduled build step that will never run, e.g. because the layout went away.
    pub fn cancel_cache_build(&mut self) {
        self.cache_build_requested = false;
        self.cache_build_pending = false;
    }

    fn try_invalidate_measure(&mut self) {
        if self.visible_window != Rect::ZERO {
            self.measure_requested = true;
        }
    }

    /// Returns `true` once after the manager decided measure must run again.
    pub fn take_measure_request(&mut self) -> bool {
        core::mem::take(&mut self.measure_requested)
    }
}

/// Updates an element's anchor candidacy and tells the scroll owner when it flips.
pub(crate) fn set_can_be_scroll_anchor(
    registry: &mut ElementRegistry,
    scroll_owner: Option<&mut (dyn ScrollOwner + 'static)>,
    element: ElementId,
    value: bool,
) {
    let Some(info) = registry.info_mut(element) else {
        return;
    };
    if info.can_be_scroll_anchor() == value {
        return;
    }
    info.set_can_be_scroll_anchor(value);
    if let Some(owner) = scroll_owner {
        if value {
            owner.register_anchor_candidate(element);
        } else {
            owner.unregister_anchor_candidate(element);
        }
    }
}
