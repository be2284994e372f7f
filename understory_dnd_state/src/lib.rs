// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dnd_state --heading-base-level=0

//! Understory DnD State: headless binding state for drag and drop.
//!
//! `understory_dnd` turns platform notifications into per-connection event
//! streams. This crate holds the small pieces of state a UI keeps on top of
//! those streams for each bound element:
//!
//! - [`source`]: a draggable element's `dragging` flag, its `can_drop` hint
//!   and its `dropped` notification.
//! - [`target`]: a drop zone's hover state, drops, and whether a compatible
//!   drag is in progress anywhere.
//! - [`classes`]: style classes to add or remove when a flag flips.
//! - [`visibility`]: show/hide decisions for content that only appears while
//!   dragging or while hovered.
//! - [`layer`]: a headless preview layer keeping one floating preview per
//!   dragged source.
//! - [`reorder`]: insertion positions and drop application for lists whose
//!   entries are both sources and drop positions.
//!
//! Nothing here renders. Each manager reports what changed and leaves
//! applying it to the toolkit.
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//! use kurbo::Point;
//! use understory_dnd::backends::TestBackend;
//! use understory_dnd::{BackendEvent, Dispatcher, DragSource, DropTarget};
//! use understory_dnd_state::source::SourceBinding;
//! use understory_dnd_state::target::TargetBinding;
//!
//! let dispatcher: Dispatcher<u32, TestBackend> = Dispatcher::builder()
//!     .backend(|_monitor| TestBackend::new())
//!     .build()
//!     .unwrap();
//!
//! let mut source = SourceBinding::connect(&dispatcher, &Rc::new(DragSource::new("card", 1)), None);
//! let mut target = TargetBinding::connect(&dispatcher, &Rc::new(DropTarget::new("card")), None);
//!
//! let (s, t) = (source.id().unwrap(), target.id().unwrap());
//! dispatcher.backend().publish(BackendEvent::drag_start(s, Point::ZERO));
//! dispatcher.backend().publish(BackendEvent::drag_over(s, Point::new(4.0, 4.0)).with_target(t));
//! assert!(source.is_dragging() && source.can_drop());
//! assert!(target.is_over());
//!
//! dispatcher.backend().publish(BackendEvent::drop(s, t, Point::new(4.0, 4.0)));
//! assert!(!source.is_dragging());
//! assert!(!target.is_over());
//!
//! source.disconnect(&dispatcher);
//! target.disconnect(&dispatcher);
//! ```
//!
//! ## Features
//!
//! - `std` (default): forwards to `kurbo/std` and `understory_dnd/std`.
//! - `libm`: `no_std` floating point for `kurbo`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod classes;
pub mod layer;
pub mod reorder;
pub mod source;
pub mod target;
pub mod visibility;
