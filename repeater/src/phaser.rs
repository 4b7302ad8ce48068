use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::registry::ElementRegistry;
use crate::repeater::RepeaterWork;
use crate::{BuildTreeScheduler, Clock, ElementFactory, ElementId, ItemsSource, Rect};

/// Drives incremental element preparation.
///
/// Elements whose factory reported a pending phase are queued here and processed by scheduler
/// work, most urgent first: elements in the visible window before the others, then the lowest
/// phase. The queue is kept sorted so the most urgent element sits at the end.
#[derive(Clone, Debug, Default)]
pub struct Phaser {
    pending: Vec<ElementId>,
    registered: bool,
}

impl Phaser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_phasing(&self, element: ElementId) -> bool {
        self.pending.contains(&element)
    }

    pub(crate) fn phase_element(
        &mut self,
        registry: &mut ElementRegistry,
        scheduler: &mut BuildTreeScheduler<RepeaterWork>,
        element: ElementId,
        phase: u32,
    ) {
        registry.expect_info_mut(element).set_phase(Some(phase));
        if !self.pending.contains(&element) {
            // Processed from the back; inserting at the front keeps realization order.
            self.pending.insert(0, element);
        }
        self.register(registry, scheduler);
    }

    pub(crate) fn stop_phasing(&mut self, registry: &mut ElementRegistry, element: ElementId) {
        self.pending.retain(|&e| e != element);
        if let Some(info) = registry.info_mut(element) {
            info.set_phase(None);
        }
    }

    fn register(
        &mut self,
        registry: &ElementRegistry,
        scheduler: &mut BuildTreeScheduler<RepeaterWork>,
    ) {
        if self.registered {
            return;
        }
        let Some(&last) = self.pending.last() else {
            return;
        };
        self.registered = true;
        let priority = registry.expect_info(last).phase().unwrap_or(0);
        scheduler.register_work(priority, RepeaterWork::Phasing);
    }

    fn sort(&mut self, registry: &ElementRegistry, visible_window: Rect) {
        let key = |element: ElementId| {
            let info = registry.expect_info(element);
            let visible = info
                .arrange_bounds()
                .is_some_and(|b| b.intersects(&visible_window));
            (visible, info.phase().unwrap_or(0))
        };
        // Not visible first, then descending phase.
        self.pending.sort_by(|&a, &b| {
            let (a_visible, a_phase) = key(a);
            let (b_visible, b_phase) = key(b);
            match a_visible.cmp(&b_visible) {
                Ordering::Equal => b_phase.cmp(&a_phase),
                other => other,
            }
        });
    }

    fn is_visible(&self, registry: &ElementRegistry, position: usize, window: Rect) -> bool {
        registry
            .expect_info(self.pending[position])
            .arrange_bounds()
            .is_some_and(|b| b.intersects(&window))
    }

    /// Scheduler callback: runs phases until the queue drains or the frame budget is spent.
    pub(crate) fn do_phased_work<S: ItemsSource>(
        &mut self,
        registry: &mut ElementRegistry,
        factory: &mut (dyn ElementFactory<S::Item> + 'static),
        source: &S,
        scheduler: &mut BuildTreeScheduler<RepeaterWork>,
        visible_window: Rect,
        clock: &dyn Clock,
    ) {
        self.registered = false;

        if !self.pending.is_empty() && !scheduler.should_yield(clock.now_ms()) {
            self.sort(registry, visible_window);
            let mut current = self.pending.len() as isize - 1;

            loop {
                let position = current as usize;
                let element = self.pending[position];
                let info = registry.expect_info(element);
                let phase = info
                    .phase()
                    .unwrap_or_else(|| panic!("{element:?} is queued for phasing without a phase"));

                let next = match info.index().filter(|&i| i < source.count()) {
                    Some(index) => factory.process_phase(element, source.get_at(index), phase),
                    None => {
                        rwarn!(element = element.0, "phased element has no valid index");
                        None
                    }
                };
                let next = match next {
                    Some(next) if next <= phase => {
                        rwarn!(
                            element = element.0,
                            phase,
                            next,
                            "phases must increase; stopping phasing for element"
                        );
                        None
                    }
                    other => other,
                };

                match next {
                    Some(next) => {
                        registry.expect_info_mut(element).set_phase(Some(next));
                        // Move on when this element is now behind the one before it.
                        let previous_phase = (position > 0).then(|| {
                            registry
                                .expect_info(self.pending[position - 1])
                                .phase()
                                .unwrap_or(0)
                        });
                        if previous_phase.is_none_or(|p| next > p) {
                            current -= 1;
                        }
                    }
                    None => {
                        registry.expect_info_mut(element).set_phase(None);
                        self.pending.remove(position);
                        current -= 1;
                    }
                }

                let count = self.pending.len() as isize;
                if current == -1 {
                    current = count - 1;
                } else if current > -1 && current < count - 1 {
                    // Go back to the visible elements if the next one is offscreen.
                    let next_visible = self.is_visible(registry, current as usize, visible_window);
                    if !next_visible
                        && self.is_visible(registry, (count - 1) as usize, visible_window)
                    {
                        current = count - 1;
                    }
                }

                if self.pending.is_empty() || scheduler.should_yield(clock.now_ms()) {
                    break;
                }
            }
        }

        if !self.pending.is_empty() {
            self.register(registry, scheduler);
        }
    }
}
