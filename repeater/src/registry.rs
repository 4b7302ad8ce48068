use alloc::vec::Vec;

use crate::key::ElementMap;
use crate::{ElementId, Rect, VirtualizationInfo};

#[derive(Clone, Debug, Default)]
struct ElementRecord {
    info: VirtualizationInfo,
    /// Slot reported by the layout in repeater coordinates, cleared when the element leaves it.
    layout_slot: Option<Rect>,
}

/// Side table mapping element handles to their [`VirtualizationInfo`], plus child order.
///
/// Children include every element the repeater has seen and the factory has not discarded,
/// whoever currently owns it.
#[derive(Clone, Debug, Default)]
pub struct ElementRegistry {
    records: ElementMap<ElementRecord>,
    children: Vec<ElementId>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.records.contains_key(&element)
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn info(&self, element: ElementId) -> Option<&VirtualizationInfo> {
        self.records.get(&element).map(|r| &r.info)
    }

    pub(crate) fn info_mut(&mut self, element: ElementId) -> Option<&mut VirtualizationInfo> {
        self.records.get_mut(&element).map(|r| &mut r.info)
    }

    /// Like [`Self::info_mut`], for elements the caller knows are children.
    pub(crate) fn expect_info_mut(&mut self, element: ElementId) -> &mut VirtualizationInfo {
        match self.info_mut(element) {
            Some(info) => info,
            None => panic!("{element:?} is not a child of this repeater"),
        }
    }

    pub(crate) fn expect_info(&self, element: ElementId) -> &VirtualizationInfo {
        match self.info(element) {
            Some(info) => info,
            None => panic!("{element:?} is not a child of this repeater"),
        }
    }

    /// Returns the record for `element`, creating a fresh one (owned by the factory) on first
    /// sight. The boolean is `true` when the record already existed.
    pub(crate) fn get_or_create(&mut self, element: ElementId) -> (&mut VirtualizationInfo, bool) {
        let existed = self.records.contains_key(&element);
        if !existed {
            self.children.push(element);
        }
        let record = self.records.entry(element).or_default();
        (&mut record.info, existed)
    }

    pub(crate) fn remove(&mut self, element: ElementId) -> Option<VirtualizationInfo> {
        let record = self.records.remove(&element)?;
        if let Some(pos) = self.children.iter().position(|&c| c == element) {
            self.children.remove(pos);
        }
        Some(record.info)
    }

    pub fn layout_slot(&self, element: ElementId) -> Option<Rect> {
        self.records.get(&element).and_then(|r| r.layout_slot)
    }

    pub(crate) fn set_layout_slot(&mut self, element: ElementId, slot: Option<Rect>) {
        if let Some(record) = self.records.get_mut(&element) {
            record.layout_slot = slot;
        }
    }

    /// Children matching `pred`, snapshotted so the caller can mutate while walking them.
    pub(crate) fn collect_children(
        &self,
        mut pred: impl FnMut(&VirtualizationInfo) -> bool,
    ) -> Vec<ElementId> {
        self.children
            .iter()
            .copied()
            .filter(|c| self.records.get(c).is_some_and(|r| pred(&r.info)))
            .collect()
    }

    /// First realized child bound to `index`.
    pub fn realized_element_at(&self, index: usize) -> Option<ElementId> {
        self.children.iter().copied().find(|c| {
            self.records
                .get(c)
                .is_some_and(|r| r.info.is_realized() && r.info.index() == Some(index))
        })
    }
}
