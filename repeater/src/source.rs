use alloc::string::String;
use alloc::vec::Vec;

use crate::ElementId;

/// The data collection a repeater presents.
///
/// Hosts mutate the source and then report what changed through
/// [`crate::ItemsRepeater::on_items_changed`].
pub trait ItemsSource {
    type Item;

    fn count(&self) -> usize;

    fn get_at(&self, index: usize) -> &Self::Item;

    /// Whether [`Self::key_from_index`] yields stable identities. Enables element reuse across
    /// resets.
    fn has_key_index_mapping(&self) -> bool {
        false
    }

    fn key_from_index(&self, index: usize) -> Option<String> {
        let _ = index;
        None
    }

    fn index_from_key(&self, key: &str) -> Option<usize> {
        let _ = key;
        None
    }
}

impl<T> ItemsSource for Vec<T> {
    type Item = T;

    fn count(&self) -> usize {
        self.len()
    }

    fn get_at(&self, index: usize) -> &T {
        &self[index]
    }
}

/// What the repeater hands the factory when it needs a new element.
#[derive(Debug)]
pub struct GetElementArgs<'a, D> {
    pub index: usize,
    pub data: &'a D,
}

/// What the repeater hands the factory when an element is given back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecycleElementArgs {
    pub element: ElementId,
    /// The repeater bound the item to this element and expects the binding to be dropped.
    pub clear_data: bool,
}

/// An element returned by [`ElementFactory::get_element`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProvidedElement {
    pub element: ElementId,
    /// `false` when the item *is* the element and no binding was made.
    pub binds_data: bool,
    /// First pending preparation phase, if the element is prepared incrementally.
    pub phase: Option<u32>,
}

impl ProvidedElement {
    pub fn new(element: ElementId) -> Self {
        Self {
            element,
            binds_data: true,
            phase: None,
        }
    }

    pub fn with_binds_data(mut self, binds_data: bool) -> Self {
        self.binds_data = binds_data;
        self
    }

    pub fn with_phase(mut self, phase: Option<u32>) -> Self {
        self.phase = phase.filter(|&p| p > 0);
        self
    }
}

/// Outcome of handing an element back to the factory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recycled {
    /// The factory keeps the element for reuse; the repeater keeps its bookkeeping.
    Pooled,
    /// The element is gone; the repeater forgets it.
    Discarded,
}

/// Creates and recycles the visual elements behind [`ElementId`]s.
pub trait ElementFactory<D> {
    /// Returns an element for `args.index`, either new or previously pooled.
    fn get_element(&mut self, args: GetElementArgs<'_, D>) -> ProvidedElement;

    fn recycle_element(&mut self, args: RecycleElementArgs) -> Recycled;

    /// Runs preparation `phase` for `element` and returns the next phase, which must be greater.
    fn process_phase(&mut self, element: ElementId, data: &D, phase: u32) -> Option<u32> {
        let _ = (element, data, phase);
        None
    }
}
