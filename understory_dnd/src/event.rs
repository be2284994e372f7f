// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canonical backend events and their per-connection enrichments.
//!
//! Backends publish [`BackendEvent`]s: one immutable record per step of a drag
//! gesture, keyed by identifiers only. The dispatcher turns them into
//! [`SourceEvent`]s and [`TargetEvent`]s, which carry the live item payload.
//!
//! A valid gesture, per source, is
//! `DragStart (DragOver | DragOut)* (DragEnd | Drop)`.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;

use crate::id::{DragOrigin, NativeKind, SourceId, TargetId};
use crate::offset::SourceOffset;
use crate::source::DragSource;
use crate::target::DropTarget;
use crate::transfer::NativeFile;

/// Step of a drag gesture.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A drag began.
    DragStart,
    /// The pointer moved; carries the accepting target, if any.
    DragOver,
    /// The pointer left a previously accepting target.
    DragOut,
    /// The gesture ended without a drop.
    DragEnd,
    /// The payload was dropped on an accepting target.
    Drop,
}

impl EventKind {
    /// Returns `true` for the kinds that end a gesture.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::DragEnd | Self::Drop)
    }
}

/// Payload extracted from a native drop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NativeData {
    /// Dropped files.
    Files(Vec<NativeFile>),
    /// Dropped `text/plain` strings, in payload order.
    Strings(Vec<String>),
}

/// One canonical step of a drag gesture.
#[derive(Clone, Debug, PartialEq)]
pub struct BackendEvent {
    /// Which step this is.
    pub kind: EventKind,
    /// The dragged source, if any.
    pub origin: Option<DragOrigin>,
    /// The relevant target, if any.
    pub target: Option<TargetId>,
    /// Pointer position in viewport coordinates.
    pub client_offset: Point,
    /// Offset captured at drag start; present on start, over, out and drop.
    pub source_offset: Option<SourceOffset>,
    /// Extracted native payload; only on drops of native drags.
    pub native: Option<NativeData>,
}

impl BackendEvent {
    /// Creates an event of `kind` at `client_offset` with no other fields set.
    #[must_use]
    pub fn new(kind: EventKind, client_offset: Point) -> Self {
        Self {
            kind,
            origin: None,
            target: None,
            client_offset,
            source_offset: None,
            native: None,
        }
    }

    /// Shorthand for a [`EventKind::DragStart`] event.
    #[must_use]
    pub fn drag_start(origin: impl Into<DragOrigin>, client_offset: Point) -> Self {
        Self::new(EventKind::DragStart, client_offset).with_origin(origin)
    }

    /// Shorthand for a [`EventKind::DragOver`] event.
    #[must_use]
    pub fn drag_over(origin: impl Into<DragOrigin>, client_offset: Point) -> Self {
        Self::new(EventKind::DragOver, client_offset).with_origin(origin)
    }

    /// Shorthand for a [`EventKind::DragOut`] event.
    #[must_use]
    pub fn drag_out(origin: impl Into<DragOrigin>, target: TargetId, client_offset: Point) -> Self {
        Self::new(EventKind::DragOut, client_offset)
            .with_origin(origin)
            .with_target(target)
    }

    /// Shorthand for a [`EventKind::DragEnd`] event.
    #[must_use]
    pub fn drag_end(origin: impl Into<DragOrigin>, client_offset: Point) -> Self {
        Self::new(EventKind::DragEnd, client_offset).with_origin(origin)
    }

    /// Shorthand for a [`EventKind::Drop`] event.
    #[must_use]
    pub fn drop(origin: impl Into<DragOrigin>, target: TargetId, client_offset: Point) -> Self {
        Self::new(EventKind::Drop, client_offset)
            .with_origin(origin)
            .with_target(target)
    }

    /// Sets the origin.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<DragOrigin>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Sets the target.
    #[must_use]
    pub fn with_target(mut self, target: TargetId) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the frozen source offset.
    #[must_use]
    pub fn with_source_offset(mut self, offset: SourceOffset) -> Self {
        self.source_offset = Some(offset);
        self
    }

    /// Attaches a native payload.
    #[must_use]
    pub fn with_native(mut self, native: NativeData) -> Self {
        self.native = Some(native);
        self
    }

    /// Returns the registered source, if the origin is one.
    #[must_use]
    pub fn source_id(&self) -> Option<SourceId> {
        self.origin.and_then(DragOrigin::source_id)
    }

    /// Returns the native kind, if the origin is a native drag.
    #[must_use]
    pub fn native_kind(&self) -> Option<NativeKind> {
        self.origin.and_then(DragOrigin::native)
    }
}

/// An event on a source's private stream.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceEvent<I> {
    /// Which step this is.
    pub kind: EventKind,
    /// The source's own identifier.
    pub id: SourceId,
    /// The accepting target, if any.
    pub target: Option<TargetId>,
    /// Pointer position in viewport coordinates.
    pub client_offset: Point,
    /// Offset captured at drag start.
    pub source_offset: Option<SourceOffset>,
    /// The source's item, read when the event is delivered.
    pub item: I,
    /// The source's item type, read when the event is delivered.
    pub item_type: String,
}

/// What a target receives as the dragged item.
#[derive(Clone, Debug, PartialEq)]
pub enum DropItem<I> {
    /// The item of a registered source.
    Item(I),
    /// Files of a native file drag; empty until the drop.
    Files(Vec<NativeFile>),
    /// Strings of a native text drag; empty until the drop.
    Strings(Vec<String>),
}

impl<I> DropItem<I> {
    /// Returns the registered source's item, if any.
    #[must_use]
    pub fn as_item(&self) -> Option<&I> {
        match self {
            Self::Item(item) => Some(item),
            _ => None,
        }
    }
}

/// An event on a target's private stream.
pub struct TargetEvent<I> {
    /// Which step this is.
    pub kind: EventKind,
    /// The target's own identifier.
    pub id: TargetId,
    /// What is being dragged.
    pub origin: Option<DragOrigin>,
    /// Pointer position in viewport coordinates.
    pub client_offset: Point,
    /// Offset captured at drag start, relative to the source.
    pub source_offset: Option<SourceOffset>,
    /// The dragged item, when it could be resolved.
    pub item: Option<DropItem<I>>,
    /// The dragged item's type, when it could be resolved.
    pub item_type: Option<String>,
    /// The registered source, when the origin is one and still registered.
    pub source: Option<Rc<DragSource<I>>>,
    /// The target this stream belongs to.
    pub target: Rc<DropTarget<I>>,
}

impl<I: Clone> Clone for TargetEvent<I> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            id: self.id,
            origin: self.origin,
            client_offset: self.client_offset,
            source_offset: self.source_offset,
            item: self.item.clone(),
            item_type: self.item_type.clone(),
            source: self.source.clone(),
            target: self.target.clone(),
        }
    }
}

impl<I: fmt::Debug> fmt::Debug for TargetEvent<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetEvent")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("origin", &self.origin)
            .field("client_offset", &self.client_offset)
            .field("source_offset", &self.source_offset)
            .field("item", &self.item)
            .field("item_type", &self.item_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_fill_in_fields() {
        let source = SourceId::new(0);
        let target = TargetId::new(1);
        let ev = BackendEvent::drop(source, target, Point::new(1.0, 2.0));
        assert_eq!(ev.kind, EventKind::Drop);
        assert_eq!(ev.source_id(), Some(source));
        assert_eq!(ev.target, Some(target));
        assert_eq!(ev.native_kind(), None);

        let ev = BackendEvent::drag_start(NativeKind::File, Point::ZERO);
        assert_eq!(ev.native_kind(), Some(NativeKind::File));
        assert_eq!(ev.source_id(), None);
    }

    #[test]
    fn terminal_kinds() {
        assert!(EventKind::Drop.is_terminal());
        assert!(EventKind::DragEnd.is_terminal());
        assert!(!EventKind::DragOver.is_terminal());
        assert!(!EventKind::DragStart.is_terminal());
        assert!(!EventKind::DragOut.is_terminal());
    }
}
