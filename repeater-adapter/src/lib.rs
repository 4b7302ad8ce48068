//! Host-side utilities for the `item-repeater` crate.
//!
//! The `item-repeater` engine does not own a frame loop, a scroll container or a clock. This
//! crate provides small, framework-neutral versions of each:
//!
//! - [`FrameDriver`] sequences layout and rendering for one frame
//! - [`ScrollViewport`] is a reference [`item_repeater::ScrollOwner`] with offset clamping and
//!   anchor-based scroll preservation
//! - [`ManualClock`] is a clock that only moves when told to
//!
//! This crate is intentionally framework-agnostic (no toolkit bindings).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod clock;
mod driver;
mod scroll_viewport;


pub use clock::ManualClock;
pub use driver::{FrameDriver, FrameReport};
pub use scroll_viewport::ScrollViewport;
