// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Target binding: per-element state for a drop zone.
//!
//! A [`TargetBinding`] connects a [`DropTarget`] and derives three outputs:
//!
//! - [`hovered`](TargetBinding::hovered): `Some(event)` for each `DragOver`
//!   at a new position, `None` for `DragOut` and `Drop`. Repeated positions
//!   are skipped, so a stalled pointer does not re-trigger hover logic. A
//!   hover forgets the last leave and a leave forgets the last hover, so the
//!   same spot fires again once the pointer has left and come back.
//! - [`dropped`](TargetBinding::dropped): every `Drop`.
//! - [`dragging`](TargetBinding::dragging): whether a drag of an accepted
//!   type is in progress anywhere. It follows the target's accepted types and
//!   is re-wired by [`set_item_types`](TargetBinding::set_item_types).

use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use kurbo::Point;
use tracing::trace;
use understory_dnd::{
    Dispatcher, DragBackend, DropTarget, ElementRef, EventKind, EventStream, ItemTypes,
    Subscription, TargetConnection, TargetEvent, TargetId,
};

/// Positions of the latest forwarded hover and leave.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
struct LastSeen {
    over: Option<Point>,
    left: Option<Point>,
}

/// State for one connected drop target.
pub struct TargetBinding<I: 'static> {
    connection: Option<TargetConnection<I>>,
    over: Rc<Cell<bool>>,
    hovered: EventStream<Option<TargetEvent<I>>>,
    dropped: EventStream<TargetEvent<I>>,
    dragging: EventStream<bool>,
    events: Subscription,
    dragging_source: Subscription,
}

impl<I: 'static> fmt::Debug for TargetBinding<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetBinding")
            .field("connection", &self.connection)
            .field("over", &self.over.get())
            .field("hovered", &self.hovered)
            .field("dropped", &self.dropped)
            .field("dragging", &self.dragging)
            .field("events", &self.events)
            .field("dragging_source", &self.dragging_source)
            .finish()
    }
}

impl<I: Clone + 'static> TargetBinding<I> {
    /// Connects `target` through `dispatcher`.
    pub fn connect<B: DragBackend>(
        dispatcher: &Dispatcher<I, B>,
        target: &Rc<DropTarget<I>>,
        element: Option<ElementRef>,
    ) -> Self {
        let connection = dispatcher.connect_target(target, element);
        let over = Rc::new(Cell::new(false));
        let hovered = EventStream::new();
        let dropped = EventStream::new();
        let dragging = EventStream::new();

        let is_over = over.clone();
        let (hovered_out, dropped_out) = (hovered.clone(), dropped.clone());
        let mut last = LastSeen::default();
        let events = connection.events().subscribe(move |event: &TargetEvent<I>| {
            match event.kind {
                EventKind::DragOver => {
                    if last.over == Some(event.client_offset) {
                        return;
                    }
                    last.over = Some(event.client_offset);
                    last.left = None;
                    is_over.set(true);
                    hovered_out.emit(Some(event.clone()));
                }
                EventKind::DragOut | EventKind::Drop => {
                    if last.left != Some(event.client_offset) {
                        last.left = Some(event.client_offset);
                        last.over = None;
                        is_over.set(false);
                        hovered_out.emit(None);
                    }
                    if event.kind == EventKind::Drop {
                        dropped_out.emit(event.clone());
                    }
                }
                EventKind::DragStart | EventKind::DragEnd => {}
            }
        });
        let dragging_source = forward(dispatcher, target.item_types(), &dragging);
        trace!(target = %connection.id(), "target binding connected");

        Self {
            connection: Some(connection),
            over,
            hovered,
            dropped,
            dragging,
            events,
            dragging_source,
        }
    }

    /// Changes the accepted types and re-derives
    /// [`dragging`](Self::dragging) from them.
    pub fn set_item_types<B: DragBackend>(
        &mut self,
        dispatcher: &Dispatcher<I, B>,
        item_types: impl Into<ItemTypes>,
    ) {
        let item_types = item_types.into();
        if let Some(connection) = &self.connection {
            connection.target().set_item_types(item_types.clone());
        }
        self.dragging_source = forward(dispatcher, item_types, &self.dragging);
    }

    /// Disconnects from the dispatcher. Later calls do nothing.
    pub fn disconnect<B: DragBackend>(&mut self, dispatcher: &Dispatcher<I, B>) {
        self.dragging_source = Subscription::empty();
        let Some(connection) = self.connection.take() else {
            return;
        };
        let id = connection.id();
        dispatcher.disconnect_target(connection);
        self.events = Subscription::empty();
        self.over.set(false);
        trace!(target = %id, "target binding disconnected");
    }
}

impl<I: 'static> TargetBinding<I> {
    /// The connection's identifier, until disconnected.
    #[must_use]
    pub fn id(&self) -> Option<TargetId> {
        self.connection.as_ref().map(TargetConnection::id)
    }

    /// Returns `true` between a hover and the following leave or drop.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.over.get()
    }

    /// Hover changes; see the [module docs](self).
    #[must_use]
    pub fn hovered(&self) -> &EventStream<Option<TargetEvent<I>>> {
        &self.hovered
    }

    /// Drops on this target.
    #[must_use]
    pub fn dropped(&self) -> &EventStream<TargetEvent<I>> {
        &self.dropped
    }

    /// Whether a drag of an accepted type is in progress.
    #[must_use]
    pub fn dragging(&self) -> &EventStream<bool> {
        &self.dragging
    }
}

fn forward<I: Clone + 'static, B: DragBackend>(
    dispatcher: &Dispatcher<I, B>,
    item_types: ItemTypes,
    out: &EventStream<bool>,
) -> Subscription {
    let out = out.clone();
    dispatcher
        .dragging(item_types)
        .subscribe(move |value: &bool| out.emit(*value))
}
