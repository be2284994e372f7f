// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A synthetic backend driven by hand.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use kurbo::Point;
use tracing::{debug, trace};

use crate::backend::{Disconnect, DragBackend};
use crate::event::{BackendEvent, EventKind};
use crate::id::{SourceId, TargetId};
use crate::offset::ElementRef;
use crate::stream::EventStream;

#[derive(Debug, Default)]
struct State {
    sources: Vec<SourceId>,
    targets: Vec<TargetId>,
    /// The source of the latest unterminated `DragStart`.
    active: Option<(SourceId, Point)>,
}

/// A [`DragBackend`] whose events are published by the caller.
///
/// Connections succeed with or without an element. The backend follows the
/// published events to know which source is active, so disconnecting that
/// source mid-drag still emits `DragEnd`.
///
/// ```
/// use kurbo::Point;
/// use understory_dnd::backends::TestBackend;
/// use understory_dnd::{BackendEvent, DragBackend, SourceId};
///
/// let backend = TestBackend::new();
/// let source = SourceId::new(0);
/// let disconnect = backend.connect_drag_source(source, None);
///
/// backend.publish(BackendEvent::drag_start(source, Point::new(1.0, 1.0)));
/// assert_eq!(backend.active_source(), Some(source));
/// disconnect.run();
/// assert_eq!(backend.active_source(), None);
/// ```
#[derive(Clone, Default)]
pub struct TestBackend {
    events: EventStream<BackendEvent>,
    state: Rc<RefCell<State>>,
}

impl fmt::Debug for TestBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestBackend")
            .field("state", &self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl TestBackend {
    /// Creates a backend with nothing connected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `event` on the canonical stream.
    pub fn publish(&self, event: BackendEvent) {
        if let Some(id) = event.source_id() {
            let mut state = self.state.borrow_mut();
            match event.kind {
                EventKind::DragStart => state.active = Some((id, event.client_offset)),
                EventKind::DragEnd | EventKind::Drop => {
                    if state.active.is_some_and(|(active, _)| active == id) {
                        state.active = None;
                    }
                }
                EventKind::DragOver | EventKind::DragOut => {
                    if let Some((active, point)) = &mut state.active {
                        if *active == id {
                            *point = event.client_offset;
                        }
                    }
                }
            }
        }
        self.events.emit(event);
    }

    /// Returns the source being dragged according to the published events.
    #[must_use]
    pub fn active_source(&self) -> Option<SourceId> {
        self.state.borrow().active.map(|(id, _)| id)
    }

    /// Returns `true` while `id` is connected.
    #[must_use]
    pub fn is_source_connected(&self, id: SourceId) -> bool {
        self.state.borrow().sources.contains(&id)
    }

    /// Returns `true` while `id` is connected.
    #[must_use]
    pub fn is_target_connected(&self, id: TargetId) -> bool {
        self.state.borrow().targets.contains(&id)
    }
}

impl DragBackend for TestBackend {
    fn connect_drag_source(&self, id: SourceId, _element: Option<ElementRef>) -> Disconnect {
        self.state.borrow_mut().sources.push(id);
        trace!(source = %id, "source connected");
        let state = Rc::downgrade(&self.state);
        let events = self.events.clone();
        Disconnect::new(move || {
            let Some(state) = state.upgrade() else {
                return;
            };
            let ended = {
                let mut state = state.borrow_mut();
                state.sources.retain(|s| *s != id);
                match state.active {
                    Some((active, point)) if active == id => {
                        state.active = None;
                        Some(point)
                    }
                    _ => None,
                }
            };
            if let Some(point) = ended {
                debug!(source = %id, "active source disconnected");
                events.emit(BackendEvent::drag_end(id, point));
            }
            trace!(source = %id, "source disconnected");
        })
    }

    fn connect_drop_target(&self, id: TargetId, _element: Option<ElementRef>) -> Disconnect {
        self.state.borrow_mut().targets.push(id);
        trace!(target = %id, "target connected");
        let state = Rc::downgrade(&self.state);
        Disconnect::new(move || {
            if let Some(state) = state.upgrade() {
                state.borrow_mut().targets.retain(|t| *t != id);
            }
            trace!(target = %id, "target disconnected");
        })
    }

    fn events(&self) -> &EventStream<BackendEvent> {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn tracks_the_active_source() {
        let backend = TestBackend::new();
        let s = SourceId::new(0);
        let t = TargetId::new(1);
        backend.publish(BackendEvent::drag_start(s, Point::ZERO));
        assert_eq!(backend.active_source(), Some(s));
        backend.publish(BackendEvent::drop(s, t, Point::ZERO));
        assert_eq!(backend.active_source(), None);
    }

    #[test]
    fn disconnecting_the_active_source_emits_drag_end_at_last_position() {
        let backend = TestBackend::new();
        let s = SourceId::new(0);
        let disconnect = backend.connect_drag_source(s, None);
        assert!(backend.is_source_connected(s));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = backend
            .events()
            .subscribe(move |ev: &BackendEvent| sink.borrow_mut().push((ev.kind, ev.client_offset)));

        backend.publish(BackendEvent::drag_start(s, Point::new(1.0, 1.0)));
        backend.publish(BackendEvent::drag_over(s, Point::new(5.0, 6.0)));
        disconnect.run();

        assert!(!backend.is_source_connected(s));
        assert_eq!(
            *seen.borrow(),
            vec![
                (EventKind::DragStart, Point::new(1.0, 1.0)),
                (EventKind::DragOver, Point::new(5.0, 6.0)),
                (EventKind::DragEnd, Point::new(5.0, 6.0)),
            ]
        );
    }

    #[test]
    fn disconnecting_an_idle_source_is_silent() {
        let backend = TestBackend::new();
        let disconnect = backend.connect_drag_source(SourceId::new(0), None);
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        let _sub = backend.events().subscribe(move |_| *c.borrow_mut() += 1);
        disconnect.run();
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn targets_connect_and_disconnect() {
        let backend = TestBackend::new();
        let t = TargetId::new(3);
        let disconnect = backend.connect_drop_target(t, None);
        assert!(backend.is_target_connected(t));
        disconnect.run();
        assert!(!backend.is_target_connected(t));
    }
}
