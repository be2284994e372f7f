// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Source binding: per-element state for a draggable element.
//!
//! A [`SourceBinding`] connects a [`DragSource`] and follows its private
//! stream:
//!
//! - `DragStart` sets [`is_dragging`](SourceBinding::is_dragging) and emits
//!   `true` on [`dragging`](SourceBinding::dragging).
//! - `DragOver` updates [`can_drop`](SourceBinding::can_drop) from whether the
//!   movement found an accepting target. Repeated positions are ignored.
//! - `Drop` emits the item on [`dropped`](SourceBinding::dropped).
//! - `Drop` and `DragEnd` reset both flags and emit `false` on `dragging`.
//!
//! ## Minimal example
//!
//! ```
//! use std::rc::Rc;
//! use kurbo::Point;
//! use understory_dnd::backends::TestBackend;
//! use understory_dnd::{BackendEvent, Dispatcher, DragSource};
//! use understory_dnd_state::source::SourceBinding;
//!
//! let dispatcher: Dispatcher<&str, TestBackend> = Dispatcher::builder()
//!     .backend(|_monitor| TestBackend::new())
//!     .build()
//!     .unwrap();
//! let mut binding = SourceBinding::connect(&dispatcher, &Rc::new(DragSource::new("t", "a")), None);
//! let id = binding.id().unwrap();
//!
//! dispatcher.backend().publish(BackendEvent::drag_start(id, Point::ZERO));
//! assert!(binding.is_dragging());
//! dispatcher.backend().publish(BackendEvent::drag_end(id, Point::ZERO));
//! assert!(!binding.is_dragging());
//! binding.disconnect(&dispatcher);
//! ```

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use kurbo::Point;
use smallvec::SmallVec;
use tracing::trace;
use understory_dnd::{
    Dispatcher, DragBackend, DragSource, ElementRef, EventKind, EventStream, SourceConnection,
    SourceEvent, SourceId, Subscription,
};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
struct Flags {
    dragging: bool,
    can_drop: bool,
    /// Position of the latest handled `DragOver`.
    last_over: Option<Point>,
}

enum Output<I> {
    Dragging(bool),
    Dropped(I),
}

/// State for one connected drag source.
pub struct SourceBinding<I: 'static> {
    connection: Option<SourceConnection<I>>,
    flags: Rc<RefCell<Flags>>,
    dragging: EventStream<bool>,
    dropped: EventStream<I>,
    subscription: Subscription,
}

impl<I: 'static> fmt::Debug for SourceBinding<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceBinding")
            .field("connection", &self.connection)
            .field("flags", &self.flags.borrow())
            .field("dragging", &self.dragging)
            .field("dropped", &self.dropped)
            .field("subscription", &self.subscription)
            .finish()
    }
}

impl<I: Clone + 'static> SourceBinding<I> {
    /// Connects `source` through `dispatcher`.
    pub fn connect<B: DragBackend>(
        dispatcher: &Dispatcher<I, B>,
        source: &Rc<DragSource<I>>,
        element: Option<ElementRef>,
    ) -> Self {
        let connection = dispatcher.connect_source(source, element);
        let flags = Rc::new(RefCell::new(Flags::default()));
        let dragging = EventStream::new();
        let dropped = EventStream::new();

        let state = flags.clone();
        let (dragging_out, dropped_out) = (dragging.clone(), dropped.clone());
        let subscription = connection.events().subscribe(move |event: &SourceEvent<I>| {
            let outputs = apply(&mut state.borrow_mut(), event);
            for output in outputs {
                match output {
                    Output::Dragging(value) => dragging_out.emit(value),
                    Output::Dropped(item) => dropped_out.emit(item),
                }
            }
        });
        trace!(source = %connection.id(), "source binding connected");

        Self {
            connection: Some(connection),
            flags,
            dragging,
            dropped,
            subscription,
        }
    }

    /// Disconnects from the dispatcher.
    ///
    /// A drag in progress ends first, so [`dragging`](Self::dragging) still
    /// reports `false`. This also holds when called from inside a handler of
    /// the backend's stream. Later calls do nothing.
    pub fn disconnect<B: DragBackend>(&mut self, dispatcher: &Dispatcher<I, B>) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        let id = connection.id();
        // Stay subscribed: a `DragEnd` queued behind the current delivery
        // still has to reach the flags.
        dispatcher.disconnect_source(connection);
        trace!(source = %id, "source binding disconnected");
    }
}

impl<I: 'static> SourceBinding<I> {
    /// The connection's identifier, until disconnected.
    #[must_use]
    pub fn id(&self) -> Option<SourceId> {
        self.connection.as_ref().map(SourceConnection::id)
    }

    /// Returns `true` between `DragStart` and the end of the gesture.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.flags.borrow().dragging
    }

    /// Returns `true` while the pointer is over an accepting target.
    #[must_use]
    pub fn can_drop(&self) -> bool {
        self.flags.borrow().can_drop
    }

    /// Emits `true` when a drag starts and `false` when it ends.
    #[must_use]
    pub fn dragging(&self) -> &EventStream<bool> {
        &self.dragging
    }

    /// Emits the item when it was dropped on a target.
    #[must_use]
    pub fn dropped(&self) -> &EventStream<I> {
        &self.dropped
    }
}

fn apply<I: Clone>(flags: &mut Flags, event: &SourceEvent<I>) -> SmallVec<[Output<I>; 2]> {
    let mut outputs = SmallVec::new();
    match event.kind {
        EventKind::DragStart => {
            *flags = Flags {
                dragging: true,
                ..Flags::default()
            };
            outputs.push(Output::Dragging(true));
        }
        EventKind::DragOver if flags.dragging => {
            if flags.last_over != Some(event.client_offset) {
                flags.last_over = Some(event.client_offset);
                flags.can_drop = event.target.is_some();
            }
        }
        EventKind::Drop | EventKind::DragEnd if flags.dragging => {
            if event.kind == EventKind::Drop {
                outputs.push(Output::Dropped(event.item.clone()));
            }
            *flags = Flags::default();
            outputs.push(Output::Dragging(false));
        }
        _ => {}
    }
    outputs
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};
    use understory_dnd::TargetId;

    fn event(kind: EventKind, x: f64, target: Option<u64>) -> SourceEvent<String> {
        SourceEvent {
            kind,
            id: SourceId::new(0),
            target: target.map(TargetId::new),
            client_offset: Point::new(x, 0.0),
            source_offset: None,
            item: "card".to_string(),
            item_type: "t".to_string(),
        }
    }

    fn dragging_values(outputs: &[Output<String>]) -> alloc::vec::Vec<bool> {
        outputs
            .iter()
            .filter_map(|o| match o {
                Output::Dragging(v) => Some(*v),
                Output::Dropped(_) => None,
            })
            .collect()
    }

    #[test]
    fn start_and_end_toggle_dragging() {
        let mut flags = Flags::default();
        let out = apply(&mut flags, &event(EventKind::DragStart, 0.0, None));
        assert_eq!(dragging_values(&out), [true]);
        assert!(flags.dragging);

        let out = apply(&mut flags, &event(EventKind::DragEnd, 0.0, None));
        assert_eq!(dragging_values(&out), [false]);
        assert_eq!(flags, Flags::default());

        // A second terminal event is not reported again.
        assert!(apply(&mut flags, &event(EventKind::DragEnd, 0.0, None)).is_empty());
    }

    #[test]
    fn can_drop_follows_distinct_positions() {
        let mut flags = Flags::default();
        apply(&mut flags, &event(EventKind::DragStart, 0.0, None));
        apply(&mut flags, &event(EventKind::DragOver, 1.0, Some(3)));
        assert!(flags.can_drop);

        // Same position, different target: ignored as a repeat.
        apply(&mut flags, &event(EventKind::DragOver, 1.0, None));
        assert!(flags.can_drop);

        apply(&mut flags, &event(EventKind::DragOver, 2.0, None));
        assert!(!flags.can_drop);
    }

    #[test]
    fn drop_reports_the_item_before_ending() {
        let mut flags = Flags::default();
        apply(&mut flags, &event(EventKind::DragStart, 0.0, None));
        let out = apply(&mut flags, &event(EventKind::Drop, 0.0, Some(1)));
        assert!(matches!(&out[0], Output::Dropped(item) if item == "card"));
        assert!(matches!(out[1], Output::Dragging(false)));
    }

    #[test]
    fn movement_outside_a_drag_is_ignored() {
        let mut flags = Flags::default();
        assert!(apply(&mut flags, &event(EventKind::DragOver, 1.0, Some(1))).is_empty());
        assert!(!flags.can_drop);
    }
}
