use crate::*;

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

pub(super) const ITEM_EXTENT: f64 = 10.0;
pub(super) const ITEM_WIDTH: f64 = 100.0;

/// Items are their own keys: `"item-N"`, minted once and never reused.
#[derive(Clone, Debug)]
pub(super) struct KeyedSource {
    pub(super) keys: Vec<String>,
    keyed: bool,
    next_key: usize,
}

impl KeyedSource {
    pub(super) fn new(count: usize, keyed: bool) -> Self {
        Self {
            keys: (0..count).map(|i| format!("item-{i}")).collect(),
            keyed,
            next_key: count,
        }
    }

    fn mint(&mut self) -> String {
        let key = format!("item-{}", self.next_key);
        self.next_key += 1;
        key
    }

    pub(super) fn insert(&mut self, index: usize, count: usize) {
        for i in 0..count {
            let key = self.mint();
            self.keys.insert(index + i, key);
        }
    }

    pub(super) fn remove(&mut self, index: usize, count: usize) {
        self.keys.drain(index..index + count);
    }

    pub(super) fn replace(&mut self, index: usize, old_count: usize, new_count: usize) {
        self.remove(index, old_count);
        self.insert(index, new_count);
    }

    pub(super) fn move_block(&mut self, old_index: usize, new_index: usize, count: usize) {
        let block: Vec<String> = self.keys.drain(old_index..old_index + count).collect();
        for (i, key) in block.into_iter().enumerate() {
            self.keys.insert(new_index + i, key);
        }
    }
}

impl ItemsSource for KeyedSource {
    type Item = String;

    fn count(&self) -> usize {
        self.keys.len()
    }

    fn get_at(&self, index: usize) -> &String {
        &self.keys[index]
    }

    fn has_key_index_mapping(&self) -> bool {
        self.keyed
    }

    fn key_from_index(&self, index: usize) -> Option<String> {
        self.keyed.then(|| self.keys[index].clone())
    }

    fn index_from_key(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }
}

#[derive(Debug, Default)]
pub(super) struct FactoryLog {
    next_id: u64,
    pool: Vec<ElementId>,
    /// Elements minted for the first time.
    pub(super) minted: usize,
    pub(super) recycled: Vec<ElementId>,
    /// Item each element is currently bound to.
    pub(super) bound: BTreeMap<ElementId, String>,
    pub(super) discard: bool,
    pub(super) first_phase: Option<u32>,
    pub(super) last_phase: u32,
    /// Report the same phase again instead of advancing.
    pub(super) stall_phases: bool,
    pub(super) phases: Vec<(ElementId, u32)>,
}

/// Pools recycled elements and hands them out again, newest first.
#[derive(Clone, Debug, Default)]
pub(super) struct CountingFactory {
    pub(super) log: Rc<RefCell<FactoryLog>>,
}

impl ElementFactory<String> for CountingFactory {
    fn get_element(&mut self, args: GetElementArgs<'_, String>) -> ProvidedElement {
        let mut log = self.log.borrow_mut();
        let element = match log.pool.pop() {
            Some(element) => element,
            None => {
                log.next_id += 1;
                log.minted += 1;
                ElementId(log.next_id)
            }
        };
        log.bound.insert(element, args.data.clone());
        ProvidedElement::new(element).with_phase(log.first_phase)
    }

    fn recycle_element(&mut self, args: RecycleElementArgs) -> Recycled {
        let mut log = self.log.borrow_mut();
        log.recycled.push(args.element);
        log.bound.remove(&args.element);
        if log.discard {
            Recycled::Discarded
        } else {
            log.pool.push(args.element);
            Recycled::Pooled
        }
    }

    fn process_phase(&mut self, element: ElementId, _data: &String, phase: u32) -> Option<u32> {
        let mut log = self.log.borrow_mut();
        log.phases.push((element, phase));
        if log.stall_phases {
            return Some(phase);
        }
        (phase < log.last_phase).then_some(phase + 1)
    }
}

/// Vertical stack of fixed-height rows built on [`ElementManager`].
pub(super) struct StackLayout {
    pub(super) manager: Rc<RefCell<ElementManager>>,
    virtualizing: bool,
    all_elements: Vec<ElementId>,
}

impl StackLayout {
    pub(super) fn new() -> Self {
        Self {
            manager: Rc::new(RefCell::new(ElementManager::new(ScrollOrientation::Vertical))),
            virtualizing: true,
            all_elements: Vec::new(),
        }
    }

    pub(super) fn non_virtualizing() -> Self {
        Self {
            virtualizing: false,
            ..Self::new()
        }
    }

    fn row(index: usize) -> Rect {
        Rect::new(0.0, index as f64 * ITEM_EXTENT, ITEM_WIDTH, ITEM_EXTENT)
    }

    /// Rows the window touches, or the anchor's rows when it is outside them.
    fn target_range(ctx: &dyn LayoutContext, count: usize) -> (usize, usize) {
        let window = ctx.realization_rect();
        let last_row = count - 1;
        let lo = ((window.y.max(0.0) / ITEM_EXTENT) as usize).min(last_row);
        let hi = ((window.bottom().max(0.0) / ITEM_EXTENT) as usize).clamp(lo, last_row);
        match ctx.recommended_anchor_index() {
            Some(anchor) if anchor < lo || anchor > hi => {
                (anchor, (anchor + (hi - lo)).min(last_row))
            }
            _ => (lo, hi),
        }
    }
}

impl Layout for StackLayout {
    fn is_virtualizing(&self) -> bool {
        self.virtualizing
    }

    fn uninitialize_for_context(&mut self, ctx: &mut dyn LayoutContext) {
        self.manager.borrow_mut().clear_realized_range(ctx);
        self.all_elements.clear();
    }

    fn measure(&mut self, ctx: &mut dyn LayoutContext, _available: Size) -> Size {
        let mut manager = self.manager.borrow_mut();
        manager.on_begin_measure(ctx);
        let count = ctx.item_count();
        let desired = Size::new(ITEM_WIDTH, count as f64 * ITEM_EXTENT);

        if !manager.is_virtualizing_context() {
            self.all_elements.clear();
            for index in 0..count {
                let element = manager.get_at(ctx, index);
                manager.set_layout_bounds_for_realized_index(index, Self::row(index));
                self.all_elements.push(element);
            }
            return desired;
        }

        if count == 0 {
            manager.clear_realized_range(ctx);
            return desired;
        }

        let (lo, hi) = Self::target_range(ctx, count);
        let connected = match (manager.first_realized_index(), manager.last_realized_index()) {
            (Some(first), Some(last)) => last + 1 >= lo && first <= hi + 1,
            _ => false,
        };
        if !connected {
            manager.clear_realized_range(ctx);
            manager.ensure_element_realized(ctx, true, lo);
        }
        while let Some(first) = manager.first_realized_index().filter(|&f| f > lo) {
            manager.ensure_element_realized(ctx, false, first - 1);
        }
        while let Some(last) = manager.last_realized_index().filter(|&l| l < hi) {
            manager.ensure_element_realized(ctx, true, last + 1);
        }

        for realized_index in 0..manager.realized_element_count(ctx) {
            manager.get_at(ctx, realized_index);
            let index = manager.data_index_from_realized_index(realized_index);
            manager.set_layout_bounds_for_realized_index(realized_index, Self::row(index));
        }
        desired
    }

    fn arrange(&mut self, ctx: &mut dyn LayoutContext, final_size: Size) -> Size {
        let manager = self.manager.borrow();
        if manager.is_virtualizing_context() {
            for (index, element) in manager.realized_elements() {
                ctx.arrange_element(element, manager.layout_bounds_for_data_index(index));
            }
        } else {
            for (index, &element) in self.all_elements.iter().enumerate() {
                ctx.arrange_element(element, Self::row(index));
            }
        }
        final_size
    }

    fn on_items_changed(&mut self, ctx: &mut dyn LayoutContext, change: &CollectionChange) {
        self.manager.borrow_mut().data_source_changed(ctx, change);
        ctx.invalidate_measure();
    }
}

#[derive(Debug, Default)]
pub(super) struct ScrollLog {
    pub(super) viewport: Option<Rect>,
    pub(super) changed: bool,
    pub(super) anchor: Option<ElementId>,
    pub(super) candidates: Vec<ElementId>,
    pub(super) brought_into_view: Vec<(ElementId, Option<Rect>)>,
    pub(super) last_extent: Option<Rect>,
}

#[derive(Clone, Debug, Default)]
pub(super) struct MockScrollOwner {
    pub(super) log: Rc<RefCell<ScrollLog>>,
}

impl MockScrollOwner {
    pub(super) fn set_viewport(&self, viewport: Rect) {
        let mut log = self.log.borrow_mut();
        log.viewport = Some(viewport);
        log.changed = true;
    }

    pub(super) fn viewport(&self) -> Option<Rect> {
        self.log.borrow().viewport
    }

    pub(super) fn candidates(&self) -> Vec<ElementId> {
        self.log.borrow().candidates.clone()
    }
}

impl ScrollOwner for MockScrollOwner {
    fn viewport(&self) -> Option<Rect> {
        self.log.borrow().viewport
    }

    fn take_viewport_changed(&mut self) -> bool {
        core::mem::take(&mut self.log.borrow_mut().changed)
    }

    fn current_anchor(&self) -> Option<ElementId> {
        self.log.borrow().anchor
    }

    fn register_anchor_candidate(&mut self, element: ElementId) {
        let mut log = self.log.borrow_mut();
        if !log.candidates.contains(&element) {
            log.candidates.push(element);
        }
    }

    fn unregister_anchor_candidate(&mut self, element: ElementId) {
        self.log.borrow_mut().candidates.retain(|&e| e != element);
    }

    fn on_owner_arranged(&mut self, extent: Rect, _slot_of: &dyn Fn(ElementId) -> Option<Rect>) {
        self.log.borrow_mut().last_extent = Some(extent);
    }

    fn bring_into_view(&mut self, element: ElementId, bounds: Option<Rect>) {
        self.log.borrow_mut().brought_into_view.push((element, bounds));
    }
}

#[derive(Debug, Default)]
pub(super) struct AnimatorLog {
    pub(super) show: bool,
    pub(super) hide: bool,
    pub(super) bounds: bool,
    pub(super) hide_queries: Vec<AnimationContext>,
    pub(super) started_shows: Vec<(ElementId, AnimationContext)>,
    pub(super) started_hides: Vec<(ElementId, AnimationContext)>,
    pub(super) started_bounds: Vec<(ElementId, Rect, Rect)>,
}

#[derive(Clone, Debug, Default)]
pub(super) struct MockAnimator {
    pub(super) log: Rc<RefCell<AnimatorLog>>,
}

impl ElementAnimator for MockAnimator {
    fn has_show_animation(&self, _element: ElementId, _context: AnimationContext) -> bool {
        self.log.borrow().show
    }

    fn has_hide_animation(&self, _element: ElementId, context: AnimationContext) -> bool {
        let mut log = self.log.borrow_mut();
        log.hide_queries.push(context);
        log.hide
    }

    fn has_bounds_change_animation(
        &self,
        _element: ElementId,
        _context: AnimationContext,
        _old_bounds: Rect,
        _new_bounds: Rect,
    ) -> bool {
        self.log.borrow().bounds
    }

    fn start_show_animation(&mut self, element: ElementId, context: AnimationContext) {
        self.log.borrow_mut().started_shows.push((element, context));
    }

    fn start_hide_animation(&mut self, element: ElementId, context: AnimationContext) {
        self.log.borrow_mut().started_hides.push((element, context));
    }

    fn start_bounds_change_animation(
        &mut self,
        element: ElementId,
        _context: AnimationContext,
        old_bounds: Rect,
        new_bounds: Rect,
    ) {
        self.log
            .borrow_mut()
            .started_bounds
            .push((element, old_bounds, new_bounds));
    }
}

/// Time only moves when a test says so.
#[derive(Debug, Default)]
pub(super) struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub(super) fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Advances by `step` every time it is read.
#[derive(Debug)]
pub(super) struct SteppingClock {
    now: Cell<u64>,
    step: u64,
}

impl SteppingClock {
    pub(super) fn new(step: u64) -> Self {
        Self {
            now: Cell::new(0),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now_ms(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}

/// Bare [`LayoutContext`] for driving an [`ElementManager`] without a repeater.
#[derive(Debug)]
pub(super) struct TestContext {
    pub(super) count: usize,
    pub(super) window: Rect,
    next_id: u64,
    pub(super) held: Vec<(ElementId, usize)>,
    pub(super) recycled: Vec<ElementId>,
}

impl TestContext {
    pub(super) fn new(count: usize, window: Rect) -> Self {
        Self {
            count,
            window,
            next_id: 0,
            held: Vec::new(),
            recycled: Vec::new(),
        }
    }
}

impl LayoutContext for TestContext {
    fn item_count(&self) -> usize {
        self.count
    }

    fn get_or_create_element_at(
        &mut self,
        index: usize,
        _options: ElementRealizationOptions,
    ) -> ElementId {
        assert!(index < self.count);
        self.next_id += 1;
        let element = ElementId(self.next_id);
        self.held.push((element, index));
        element
    }

    fn recycle_element(&mut self, element: ElementId) {
        let position = self
            .held
            .iter()
            .position(|&(e, _)| e == element)
            .expect("recycled an element the layout does not hold");
        self.held.remove(position);
        self.recycled.push(element);
    }

    fn realization_rect(&self) -> Rect {
        self.window
    }

    fn visible_rect(&self) -> Rect {
        self.window
    }

    fn recommended_anchor_index(&self) -> Option<usize> {
        None
    }

    fn layout_origin(&self) -> Point {
        Point::ZERO
    }

    fn set_layout_origin(&mut self, _origin: Point) {}

    fn arrange_element(&mut self, _element: ElementId, _bounds: Rect) {}

    fn invalidate_measure(&mut self) {}
}
