// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The backend seam.
//!
//! A [`DragBackend`] owns one drag transport and is the single writer of the
//! canonical [`BackendEvent`] stream. The [`Dispatcher`](crate::Dispatcher)
//! only ever talks to it through this trait.

use alloc::boxed::Box;
use core::fmt;

use kurbo::Rect;

use crate::event::BackendEvent;
use crate::id::{SourceId, TargetId};
use crate::offset::ElementRef;
use crate::stream::EventStream;

/// A drag transport adapter.
pub trait DragBackend {
    /// Starts listening for drags initiated on `element` on behalf of `id`.
    ///
    /// Running the returned [`Disconnect`] reverses this. If `id` is the
    /// active source at that time, a `DragEnd` is emitted first.
    fn connect_drag_source(&self, id: SourceId, element: Option<ElementRef>) -> Disconnect;

    /// Starts resolving hovers and drops over `element` on behalf of `id`.
    fn connect_drop_target(&self, id: TargetId, element: Option<ElementRef>) -> Disconnect;

    /// The canonical event stream.
    fn events(&self) -> &EventStream<BackendEvent>;
}

/// One-shot callback reversing a backend connection.
///
/// Dropping it without calling [`run`](Self::run) leaves the connection in
/// place.
#[must_use = "a connection stays in place until its disconnect callback runs"]
pub struct Disconnect(Option<Box<dyn FnOnce()>>);

impl Disconnect {
    /// Wraps `f`.
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(f)))
    }

    /// A callback that does nothing, for connections without an element.
    pub fn noop() -> Self {
        Self(None)
    }

    /// Returns `true` if running this does nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.0.is_none()
    }

    /// Runs the callback.
    pub fn run(self) {
        if let Some(f) = self.0 {
            f();
        }
    }
}

impl fmt::Debug for Disconnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Disconnect")
            .field(&if self.is_noop() { "noop" } else { "pending" })
            .finish()
    }
}

/// Tie-break rule among connected elements that overlap under the pointer.
///
/// The first element in this order that accepts wins.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum OverlapOrder {
    /// Most recently connected first. Nested regions are usually connected
    /// after their parents, so this approximates "innermost wins".
    #[default]
    MostRecentFirst,
    /// First connected first.
    RegistrationOrder,
    /// Smallest bounding box first; equal areas fall back to most recent.
    SmallestFirst,
}

/// A connected element under the pointer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Candidate<Id> {
    pub(crate) id: Id,
    /// Connection sequence number; higher is more recent.
    pub(crate) seq: u64,
    /// Bounding box at hit-test time.
    pub(crate) bounds: Rect,
}

impl OverlapOrder {
    /// Sorts `candidates` so the preferred one comes first.
    pub(crate) fn sort<Id>(self, candidates: &mut [Candidate<Id>]) {
        match self {
            Self::MostRecentFirst => candidates.sort_by(|a, b| b.seq.cmp(&a.seq)),
            Self::RegistrationOrder => candidates.sort_by(|a, b| a.seq.cmp(&b.seq)),
            Self::SmallestFirst => candidates.sort_by(|a, b| {
                a.bounds
                    .area()
                    .total_cmp(&b.bounds.area())
                    .then_with(|| b.seq.cmp(&a.seq))
            }),
        }
    }
}

/// Configuration for [`NativeBackend`](crate::backends::NativeBackend).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BackendConfig {
    /// Which overlapping element wins.
    pub overlap: OverlapOrder,
    /// Delay before a native drag leaving the window counts as ended.
    pub native_leave_debounce_ms: u64,
}

impl BackendConfig {
    /// Default delay for the native leave debounce.
    pub const DEFAULT_NATIVE_LEAVE_DEBOUNCE_MS: u64 = 100;

    /// Sets the overlap order.
    #[must_use]
    pub const fn with_overlap(mut self, overlap: OverlapOrder) -> Self {
        self.overlap = overlap;
        self
    }

    /// Sets the native leave debounce.
    #[must_use]
    pub const fn with_native_leave_debounce_ms(mut self, ms: u64) -> Self {
        self.native_leave_debounce_ms = ms;
        self
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            overlap: OverlapOrder::default(),
            native_leave_debounce_ms: Self::DEFAULT_NATIVE_LEAVE_DEBOUNCE_MS,
        }
    }
}
