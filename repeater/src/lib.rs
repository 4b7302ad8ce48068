//! A headless element virtualization and recycling engine for repeating collection controls.
//!
//! For host-side utilities (frame driver, reference scroll owner, clocks), see the
//! `item-repeater-adapter` crate.
//!
//! The engine keeps a bounded window of visual elements alive for a collection of any size:
//! it maps data indices to live elements, recycles elements across scrolling and collection
//! changes, keeps focus and scroll anchors stable across recycling, and spreads non-urgent work
//! over frames under a time budget.
//!
//! It is UI-agnostic. The host provides:
//! - an [`ItemsSource`] and the change notifications for it
//! - an [`ElementFactory`] that creates and recycles the visuals behind [`ElementId`]s
//! - a [`Layout`] that places elements through a [`LayoutContext`]
//! - optionally a [`ScrollOwner`] (the viewport) and an [`ElementAnimator`]
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod animation;
mod element_manager;
mod error;
mod events;
mod info;
mod key;
mod layout;
mod options;
mod phaser;
mod registry;
mod repeater;
mod scheduler;
mod scroll;
mod source;
mod types;
mod view_manager;
mod viewport;

#[cfg(test)]
mod tests;

pub use animation::{AnimationManager, ElementAnimator};
pub use element_manager::ElementManager;
pub use error::RepeaterError;
pub use events::RepeaterEvent;
pub use info::VirtualizationInfo;
pub use layout::{Layout, LayoutContext};
pub use options::RepeaterOptions;
pub use phaser::Phaser;
pub use registry::ElementRegistry;
pub use repeater::ItemsRepeater;
#[cfg(feature = "std")]
pub use scheduler::StdClock;
pub use scheduler::{BuildTreeScheduler, Clock};
pub use scroll::ScrollOwner;
pub use source::{
    ElementFactory, GetElementArgs, ItemsSource, ProvidedElement, RecycleElementArgs, Recycled,
};
pub use types::{
    AnimationContext, CollectionChange, ElementId, ElementOwner, ElementRealizationOptions, Point,
    Rect, ScrollOrientation, Size,
};
pub use view_manager::ViewManager;
pub use viewport::ViewportManager;
