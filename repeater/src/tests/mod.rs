use crate::*;

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

mod animation;
mod element_manager;
mod mocks;

use mocks::{
    CountingFactory, FactoryLog, ITEM_EXTENT, ITEM_WIDTH, KeyedSource, MockScrollOwner,
    StackLayout,
};

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        debug_assert!(start < end_exclusive);
        let span = (end_exclusive - start) as u64;
        start + (self.next_u64() % span) as usize
    }

    fn gen_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Options without cache growth, so the realized range is exactly the visible one.
fn no_cache_options() -> RepeaterOptions {
    RepeaterOptions::new()
        .with_horizontal_cache_length(0.0)
        .and_then(|o| o.with_vertical_cache_length(0.0))
        .unwrap()
}

fn viewport_at(y: f64, height: f64) -> Rect {
    Rect::new(0.0, y, ITEM_WIDTH, height)
}

/// A repeater hosted in a scroll owner with a virtualizing stack layout.
struct Harness {
    repeater: ItemsRepeater<KeyedSource>,
    factory: Rc<RefCell<FactoryLog>>,
    scroll: MockScrollOwner,
    manager: Rc<RefCell<ElementManager>>,
    clock: mocks::ManualClock,
}

impl Harness {
    fn new(count: usize, keyed: bool, viewport: Rect) -> Self {
        Self::with_options(count, keyed, viewport, no_cache_options())
    }

    fn with_options(count: usize, keyed: bool, viewport: Rect, options: RepeaterOptions) -> Self {
        let factory = CountingFactory::default();
        let log = Rc::clone(&factory.log);
        let mut repeater =
            ItemsRepeater::with_options(KeyedSource::new(count, keyed), factory, options).unwrap();
        let layout = StackLayout::new();
        let manager = Rc::clone(&layout.manager);
        repeater.set_layout(Some(alloc::boxed::Box::new(layout)));
        let scroll = MockScrollOwner::default();
        scroll.set_viewport(viewport);
        repeater.set_scroll_owner(Some(alloc::boxed::Box::new(scroll.clone())));
        let mut harness = Self {
            repeater,
            factory: log,
            scroll,
            manager,
            clock: mocks::ManualClock::default(),
        };
        harness.layout_pass();
        harness
    }

    /// Every item realized: no scroll owner and a non-virtualizing layout.
    fn non_virtualizing(count: usize, keyed: bool) -> Self {
        let factory = CountingFactory::default();
        let log = Rc::clone(&factory.log);
        let mut repeater = ItemsRepeater::new(KeyedSource::new(count, keyed), factory);
        let layout = StackLayout::non_virtualizing();
        let manager = Rc::clone(&layout.manager);
        repeater.set_layout(Some(alloc::boxed::Box::new(layout)));
        let mut harness = Self {
            repeater,
            factory: log,
            scroll: MockScrollOwner::default(),
            manager,
            clock: mocks::ManualClock::default(),
        };
        harness.layout_pass();
        harness
    }

    /// Runs measure/arrange until both are valid, then settles layout.
    fn layout_pass(&mut self) {
        let available = Size::new(ITEM_WIDTH, f64::INFINITY);
        for _ in 0..8 {
            if self.repeater.is_measure_valid() && self.repeater.is_arrange_valid() {
                break;
            }
            let desired = self.repeater.measure(available);
            self.repeater.arrange(desired);
        }
        self.repeater.on_layout_updated();
    }

    /// One full frame: layout then rendering.
    fn frame(&mut self) -> usize {
        self.repeater.sync_viewport();
        self.layout_pass();
        self.repeater.on_rendering(&self.clock)
    }

    fn scroll_to(&mut self, y: f64) {
        let height = self.scroll.viewport().map_or(50.0, |v| v.height);
        self.scroll.set_viewport(viewport_at(y, height));
        self.repeater.sync_viewport();
        self.layout_pass();
    }

    /// Layout-held elements sorted by index.
    fn held(&self) -> Vec<(usize, ElementId)> {
        let mut held: Vec<(usize, ElementId)> = self
            .repeater
            .children()
            .iter()
            .filter_map(|&e| {
                let info = self.repeater.virtualization_info(e)?;
                if info.is_held_by_layout() {
                    info.index().map(|i| (i, e))
                } else {
                    None
                }
            })
            .collect();
        held.sort();
        held
    }

    fn held_indices(&self) -> Vec<usize> {
        self.held().into_iter().map(|(i, _)| i).collect()
    }

    fn element_at(&self, index: usize) -> ElementId {
        self.repeater
            .try_get_element(index)
            .unwrap_or_else(|| panic!("no realized element at {index}"))
    }

    fn info(&self, element: ElementId) -> &VirtualizationInfo {
        self.repeater.virtualization_info(element).unwrap()
    }

    fn realized_range(&self) -> (Option<usize>, Option<usize>) {
        let manager = self.manager.borrow();
        (manager.first_realized_index(), manager.last_realized_index())
    }

    fn apply(&mut self, change: CollectionChange) {
        self.repeater.on_items_changed(change).unwrap();
    }

    /// Every realized element is bound to the item now at its index, held indices are unique,
    /// and the layout's realized range agrees with the registry.
    fn assert_consistent(&self) {
        let keys = &self.repeater.items_source().keys;
        let factory = self.factory.borrow();
        let mut seen = Vec::new();
        for &element in self.repeater.children() {
            let info = self.info(element);
            if !info.is_realized() {
                continue;
            }
            let index = info.index().expect("realized element without index");
            assert!(index < keys.len(), "{element:?} at {index} past the end");
            assert_eq!(
                factory.bound.get(&element),
                Some(&keys[index]),
                "{element:?} at {index} bound to the wrong item"
            );
            if info.is_held_by_layout() {
                assert!(!seen.contains(&index), "two elements held at {index}");
                seen.push(index);
            }
        }
        for (index, element) in self.manager.borrow().realized_elements() {
            let info = self.info(element);
            assert_eq!(info.owner(), ElementOwner::Layout);
            assert_eq!(info.index(), Some(index));
        }
    }
}
