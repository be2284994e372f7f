// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dnd --heading-base-level=0

//! Understory DnD: drag and drop dispatch for UI.
//!
//! This crate is the core of a drag and drop layer. UI elements are bound as
//! draggable *sources* or droppable *targets*; a backend turns the platform's
//! drag notifications into one canonical event sequence; the dispatcher fans
//! that sequence out into one private, item-enriched stream per connection.
//!
//! The pieces, leaves first:
//!
//! - [`offset`]: pure geometry, pointer-to-element offsets.
//! - [`Registry`]: identifier to handle bookkeeping.
//! - [`Monitor`]: "can this drag", "can this drop", "which drag image",
//!   "which drop effect", answered from identifiers alone.
//! - [`DragBackend`]: the transport seam. [`backends::NativeBackend`] adapts
//!   platform notifications, [`backends::TestBackend`] is driven by hand.
//! - [`Dispatcher`]: assigns identifiers, connects handles to the backend,
//!   filters and enriches events, and drives the preview lifecycle.
//!
//! ## Event model
//!
//! Every step of a gesture is a [`BackendEvent`] of one [`EventKind`]:
//! `DragStart (DragOver | DragOut)* (DragEnd | Drop)` per source. Targets see
//! a `DragOut` for every target that stopped accepting, including at the end
//! of a gesture. Delivery is synchronous and ordered through [`EventStream`],
//! a single-threaded broadcast channel.
//!
//! ## Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use kurbo::Point;
//! use understory_dnd::backends::TestBackend;
//! use understory_dnd::{BackendEvent, Dispatcher, DragSource, DropTarget, EventKind};
//!
//! let dispatcher: Dispatcher<u32, TestBackend> = Dispatcher::builder()
//!     .backend(|_monitor| TestBackend::new())
//!     .build()
//!     .unwrap();
//!
//! let source = Rc::new(DragSource::new("card", 7));
//! let target = Rc::new(DropTarget::new("card"));
//! let src = dispatcher.connect_source(&source, None);
//! let tgt = dispatcher.connect_target(&target, None);
//!
//! let hovered = Rc::new(Cell::new(false));
//! let flag = hovered.clone();
//! let _sub = tgt.events().subscribe(move |ev| {
//!     flag.set(ev.kind == EventKind::DragOver);
//! });
//!
//! let over = BackendEvent::drag_over(src.id(), Point::new(100.0, 100.0)).with_target(tgt.id());
//! dispatcher.backend().publish(BackendEvent::drag_start(src.id(), Point::ZERO));
//! dispatcher.backend().publish(over);
//! assert!(hovered.get());
//!
//! dispatcher.disconnect_source(src);
//! dispatcher.disconnect_target(tgt);
//! dispatcher.run_deferred();
//! ```
//!
//! ## Features
//!
//! - `std` (default): forwards to `kurbo/std`.
//! - `libm`: `no_std` floating point for `kurbo`.
//! - `native` (default): [`backends::NativeBackend`].
//!
//! This crate is `no_std` and uses `alloc`.
//!
//! ## Logging
//!
//! Gesture transitions are logged with `tracing` at debug level, connection
//! lifecycle at trace level. No subscriber is installed.

#![no_std]

extern crate alloc;

mod backend;
pub mod backends;
mod deferred;
mod dispatcher;
mod error;
mod event;
mod id;
mod monitor;
pub mod offset;
mod preview;
mod registry;
mod source;
mod stream;
mod target;
pub mod transfer;

pub use backend::{BackendConfig, Disconnect, DragBackend, OverlapOrder};
pub use deferred::DeferredQueue;
pub use dispatcher::{
    Dispatcher, DispatcherBuilder, DispatcherConfig, SourceConnection, TargetConnection,
};
pub use error::{DispatcherError, DragImageError};
pub use event::{BackendEvent, DropItem, EventKind, NativeData, SourceEvent, TargetEvent};
pub use id::{DragOrigin, NativeKind, SourceId, TargetId};
pub use monitor::{Monitor, PreviewImage, TRANSPARENT_PIXEL_GIF};
pub use offset::{ElementRef, FixedElement, HostElement, SourceOffset};
pub use preview::{PreviewContext, PreviewLayer, PreviewUpdates};
pub use registry::Registry;
pub use source::{CanDrag, DragPreview, DragSource, PreviewTemplate};
pub use stream::{EventStream, Subscription};
pub use target::{CanDrop, DropEffect, DropTarget, Incoming, ItemTypes};
