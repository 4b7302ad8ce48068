use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use item_repeater::{ElementId, Point, Rect, ScrollOrientation, ScrollOwner, Size};

#[derive(Clone, Copy, Debug, PartialEq)]
struct Anchor {
    element: ElementId,
    /// Slot of the element when it was chosen.
    slot: Rect,
}

#[derive(Clone, Debug)]
struct State {
    orientation: ScrollOrientation,
    offset: Point,
    size: Size,
    extent: Option<Rect>,
    changed: bool,
    candidates: Vec<ElementId>,
    anchor: Option<Anchor>,
    /// Bring-into-view target whose slot was not known yet.
    pending_bring_into_view: Option<ElementId>,
}

/// A scrolling viewport that can host an [`item_repeater::ItemsRepeater`].
///
/// The handle is shared: give a clone to the repeater through
/// [`item_repeater::ItemsRepeater::set_scroll_owner`] and keep one to scroll from the host.
///
/// After every arrange pass it keeps the anchor element at the same place in the viewport by
/// following the anchor's slot, clamps the offset to the extent and then picks a new anchor: the
/// first registered candidate inside the viewport along the scrolling axis.
#[derive(Clone, Debug)]
pub struct ScrollViewport {
    state: Rc<RefCell<State>>,
}

impl ScrollViewport {
    pub fn new(orientation: ScrollOrientation, size: Size) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                orientation,
                offset: Point::ZERO,
                size,
                extent: None,
                changed: true,
                candidates: Vec::new(),
                anchor: None,
                pending_bring_into_view: None,
            })),
        }
    }

    pub fn orientation(&self) -> ScrollOrientation {
        self.state.borrow().orientation
    }

    pub fn offset(&self) -> Point {
        self.state.borrow().offset
    }

    pub fn size(&self) -> Size {
        self.state.borrow().size
    }

    /// Extent reported by the last arrange pass.
    pub fn extent(&self) -> Option<Rect> {
        self.state.borrow().extent
    }

    pub fn viewport_rect(&self) -> Rect {
        let state = self.state.borrow();
        Rect::from_origin_size(state.offset, state.size)
    }

    /// The element scroll position is currently anchored on.
    pub fn anchor(&self) -> Option<ElementId> {
        self.state.borrow().anchor.map(|a| a.element)
    }

    pub fn anchor_candidates(&self) -> Vec<ElementId> {
        self.state.borrow().candidates.clone()
    }

    /// Scrolls to `offset`, clamped to the known extent. Drops the anchor: the user moved.
    pub fn scroll_to(&self, offset: Point) {
        let mut state = self.state.borrow_mut();
        state.anchor = None;
        state.set_offset(offset);
    }

    pub fn scroll_by(&self, dx: f64, dy: f64) {
        let offset = self.offset();
        self.scroll_to(Point::new(offset.x + dx, offset.y + dy));
    }

    pub fn set_viewport_size(&self, size: Size) {
        let mut state = self.state.borrow_mut();
        if state.size != size {
            state.size = size;
            state.changed = true;
            let offset = state.offset;
            state.set_offset(offset);
        }
    }
}

impl State {
    fn max_offset(&self) -> Point {
        match self.extent {
            Some(extent) => Point::new(
                (extent.right() - self.size.width).max(extent.x),
                (extent.bottom() - self.size.height).max(extent.y),
            ),
            None => Point::new(f64::INFINITY, f64::INFINITY),
        }
    }

    fn min_offset(&self) -> Point {
        self.extent.map_or(Point::ZERO, |extent| extent.origin())
    }

    fn set_offset(&mut self, offset: Point) {
        let (min, max) = (self.min_offset(), self.max_offset());
        let clamped = Point::new(offset.x.clamp(min.x, max.x), offset.y.clamp(min.y, max.y));
        if clamped != self.offset {
            self.offset = clamped;
            self.changed = true;
        }
    }

    fn viewport(&self) -> Rect {
        Rect::from_origin_size(self.offset, self.size)
    }

    /// Scrolls the least distance that shows `bounds` along the scrolling axis.
    fn reveal(&mut self, bounds: Rect) {
        let orientation = self.orientation;
        let viewport = self.viewport();
        let (start, end) = (bounds.main_start(orientation), bounds.main_end(orientation));
        let target = if start < viewport.main_start(orientation) {
            start
        } else if end > viewport.main_end(orientation) {
            end - viewport.main_extent(orientation)
        } else {
            return;
        };
        let offset = match orientation {
            ScrollOrientation::Vertical => Point::new(self.offset.x, target),
            ScrollOrientation::Horizontal => Point::new(target, self.offset.y),
        };
        self.set_offset(offset);
    }

    fn pick_anchor(&mut self, slot_of: &dyn Fn(ElementId) -> Option<Rect>) {
        let orientation = self.orientation;
        let viewport = self.viewport();
        let (start, end) = (viewport.main_start(orientation), viewport.main_end(orientation));
        self.anchor = self
            .candidates
            .iter()
            .filter_map(|&element| slot_of(element).map(|slot| Anchor { element, slot }))
            .filter(|a| a.slot.main_end(orientation) > start && a.slot.main_start(orientation) < end)
            .min_by(|a, b| {
                a.slot
                    .main_start(orientation)
                    .total_cmp(&b.slot.main_start(orientation))
                    .then(a.element.cmp(&b.element))
            });
    }
}

impl ScrollOwner for ScrollViewport {
    fn viewport(&self) -> Option<Rect> {
        Some(self.viewport_rect())
    }

    fn take_viewport_changed(&mut self) -> bool {
        core::mem::take(&mut self.state.borrow_mut().changed)
    }

    fn current_anchor(&self) -> Option<ElementId> {
        self.anchor()
    }

    fn register_anchor_candidate(&mut self, element: ElementId) {
        let mut state = self.state.borrow_mut();
        if !state.candidates.contains(&element) {
            state.candidates.push(element);
        }
    }

    fn unregister_anchor_candidate(&mut self, element: ElementId) {
        let mut state = self.state.borrow_mut();
        state.candidates.retain(|&e| e != element);
        if state.anchor.is_some_and(|a| a.element == element) {
            state.anchor = None;
        }
    }

    fn on_owner_arranged(&mut self, extent: Rect, slot_of: &dyn Fn(ElementId) -> Option<Rect>) {
        let mut state = self.state.borrow_mut();
        state.extent = Some(extent);

        // Follow the anchor so the content under the viewport does not jump.
        if let Some(anchor) = state.anchor {
            if let Some(slot) = slot_of(anchor.element) {
                let (dx, dy) = (slot.x - anchor.slot.x, slot.y - anchor.slot.y);
                if dx != 0.0 || dy != 0.0 {
                    atrace!(element = anchor.element.0, dx, dy, "following scroll anchor");
                    let offset = Point::new(state.offset.x + dx, state.offset.y + dy);
                    state.set_offset(offset);
                }
            }
        }
        let offset = state.offset;
        state.set_offset(offset);

        if let Some(element) = state.pending_bring_into_view.take() {
            if let Some(slot) = slot_of(element) {
                state.reveal(slot);
            }
        }
        state.pick_anchor(slot_of);
    }

    fn bring_into_view(&mut self, element: ElementId, bounds: Option<Rect>) {
        let mut state = self.state.borrow_mut();
        match bounds {
            Some(bounds) => {
                state.reveal(bounds);
                state.anchor = Some(Anchor {
                    element,
                    slot: bounds,
                });
            }
            None => state.pending_bring_into_view = Some(element),
        }
    }
}
