// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend for platform drag notifications.
//!
//! [`NativeBackend`] turns the host's raw drag notifications into the canonical
//! event sequence. The host forwards each notification to the matching entry
//! point ([`drag_start`](NativeBackend::drag_start),
//! [`drag_over`](NativeBackend::drag_over),
//! [`drag_leave`](NativeBackend::drag_leave), [`drop`](NativeBackend::drop),
//! [`drag_end`](NativeBackend::drag_end)) and calls
//! [`poll_timers`](NativeBackend::poll_timers) from its event loop.
//!
//! ## Gesture state
//!
//! The backend is either idle or dragging exactly one origin. Starting a drag
//! while another one is active ends the previous one first, so there is never
//! more than one active source.
//!
//! ## Hit testing
//!
//! Connected elements whose bounds contain the pointer are candidates. They
//! are ordered by [`OverlapOrder`](crate::OverlapOrder) and the first one that
//! passes the monitor's check wins. Targets are re-checked on every movement,
//! so predicates may depend on changing state.
//!
//! ## Native drags
//!
//! Drags that no connected source claims (files or text dragged in from
//! another application) are reported with a [`DragOrigin::Native`] origin.
//! Platforms fire spurious leave notifications when the pointer crosses child
//! boundaries, so a native leave only ends the drag if no movement follows
//! within [`BackendConfig::native_leave_debounce_ms`].

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use kurbo::Point;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::backend::{BackendConfig, Candidate, Disconnect, DragBackend};
use crate::event::{BackendEvent, NativeData};
use crate::id::{DragOrigin, NativeKind, SourceId, TargetId};
use crate::monitor::Monitor;
use crate::offset::{ElementRef, SourceOffset, drag_preview_offset, source_offset};
use crate::stream::EventStream;
use crate::target::DropEffect;
use crate::transfer::{PlatformDragEvent, classify};

type Batch = SmallVec<[BackendEvent; 3]>;

struct Connected<Id> {
    id: Id,
    element: ElementRef,
    seq: u64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct ActiveDrag {
    origin: DragOrigin,
    /// Frozen at drag start; native drags have none.
    offset: Option<SourceOffset>,
    /// The accepting target of the latest movement.
    target: Option<TargetId>,
    last_point: Point,
}

impl ActiveDrag {
    fn event(&self, mut event: BackendEvent) -> BackendEvent {
        event.source_offset = self.offset;
        event
    }

    /// `DragEnd`, then a trailing `DragOut` for the active target.
    fn end_batch(&self, point: Point) -> Batch {
        let mut batch = Batch::new();
        batch.push(BackendEvent::drag_end(self.origin, point));
        if let Some(target) = self.target {
            batch.push(self.event(BackendEvent::drag_out(self.origin, target, point)));
        }
        batch
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
enum Gesture {
    #[default]
    Idle,
    Dragging(ActiveDrag),
}

#[derive(Default)]
struct State {
    sources: Vec<Connected<SourceId>>,
    targets: Vec<Connected<TargetId>>,
    next_seq: u64,
    gesture: Gesture,
    leave_deadline: Option<u64>,
    /// Ticket and position of the text drop waiting on its reads.
    reading: Option<(u64, Point)>,
    next_read: u64,
}

impl State {
    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn active(&self) -> Option<ActiveDrag> {
        match self.gesture {
            Gesture::Dragging(drag) => Some(drag),
            Gesture::Idle => None,
        }
    }
}

struct PendingStrings {
    slots: Vec<Option<String>>,
    remaining: usize,
}

struct Shared<I> {
    monitor: Monitor<I>,
    config: BackendConfig,
    events: EventStream<BackendEvent>,
    state: RefCell<State>,
}

impl<I: Clone + 'static> Shared<I> {
    fn emit_all(&self, batch: Batch) {
        for event in batch {
            self.events.emit(event);
        }
    }

    fn hits<Id: Copy>(
        &self,
        entries: &[Connected<Id>],
        point: Point,
    ) -> SmallVec<[Candidate<Id>; 4]> {
        let mut candidates: SmallVec<[Candidate<Id>; 4]> = entries
            .iter()
            .filter_map(|entry| {
                let bounds = entry.element.bounding_rect()?;
                bounds.contains(point).then_some(Candidate {
                    id: entry.id,
                    seq: entry.seq,
                    bounds,
                })
            })
            .collect();
        self.config.overlap.sort(&mut candidates);
        candidates
    }

    /// The first target under `point` that accepts `origin`.
    fn accepting_target(&self, point: Point, origin: DragOrigin) -> Option<TargetId> {
        let candidates = {
            let state = self.state.borrow();
            self.hits(&state.targets, point)
        };
        // No borrow is held while predicates run.
        candidates
            .into_iter()
            .map(|candidate| candidate.id)
            .find(|&id| self.monitor.can_drop(id, Some(origin)))
    }

    fn active(&self) -> Option<ActiveDrag> {
        self.state.borrow().active()
    }

    fn take_gesture(&self) -> Option<ActiveDrag> {
        let mut state = self.state.borrow_mut();
        state.leave_deadline = None;
        match core::mem::take(&mut state.gesture) {
            Gesture::Dragging(drag) => Some(drag),
            Gesture::Idle => None,
        }
    }

    fn update_active(&self, origin: DragOrigin, f: impl FnOnce(&mut ActiveDrag)) {
        if let Gesture::Dragging(drag) = &mut self.state.borrow_mut().gesture {
            if drag.origin == origin {
                f(drag);
            }
        }
    }

    fn force_end(&self, point: Option<Point>, reason: &'static str) {
        if let Some(drag) = self.take_gesture() {
            debug!(origin = %drag.origin, reason, "drag ended");
            self.emit_all(drag.end_batch(point.unwrap_or(drag.last_point)));
        }
    }

    /// Ends a text drop whose reads are still outstanding.
    fn abandon_read(&self) {
        let reading = self.state.borrow_mut().reading.take();
        if let Some((ticket, point)) = reading {
            debug!(ticket, "text read abandoned");
            self.events.emit(BackendEvent::drag_end(
                DragOrigin::Native(NativeKind::String),
                point,
            ));
        }
    }

    fn begin(&self, drag: ActiveDrag) -> BackendEvent {
        self.abandon_read();
        let mut state = self.state.borrow_mut();
        state.gesture = Gesture::Dragging(drag);
        state.leave_deadline = None;
        drag.event(BackendEvent::drag_start(drag.origin, drag.last_point))
    }

    fn begin_native<E: PlatformDragEvent + ?Sized>(&self, event: &E) -> Option<ActiveDrag> {
        let kind = classify(event.items(), event.files());
        debug!(kind = %kind, "native drag detected");
        let start = self.begin(ActiveDrag {
            origin: kind.into(),
            offset: None,
            target: None,
            last_point: event.client_offset(),
        });
        self.events.emit(start);
        // A subscriber may have ended the drag already.
        self.active()
    }

    fn disconnect_source(&self, id: SourceId) {
        let active = self
            .active()
            .is_some_and(|drag| drag.origin == DragOrigin::Source(id));
        if active {
            self.force_end(None, "source disconnected");
        }
        let removed = {
            let mut state = self.state.borrow_mut();
            state
                .sources
                .iter()
                .position(|entry| entry.id == id)
                .map(|index| state.sources.remove(index))
        };
        if let Some(entry) = removed {
            entry.element.set_draggable(false);
        }
        trace!(source = %id, "source disconnected");
    }

    fn disconnect_target(&self, id: TargetId) {
        let mut state = self.state.borrow_mut();
        state.targets.retain(|entry| entry.id != id);
        if let Gesture::Dragging(drag) = &mut state.gesture {
            if drag.target == Some(id) {
                drag.target = None;
            }
        }
        trace!(target = %id, "target disconnected");
    }

    fn finish_string_drop(
        &self,
        ticket: u64,
        target: TargetId,
        point: Point,
        strings: Vec<String>,
    ) {
        {
            let mut state = self.state.borrow_mut();
            if state.reading.map(|(current, _)| current) != Some(ticket) {
                debug!(ticket, target = %target, "stale text read discarded");
                return;
            }
            state.reading = None;
        }
        let origin = DragOrigin::Native(NativeKind::String);
        debug!(target = %target, count = strings.len(), "native text dropped");
        let mut batch = Batch::new();
        batch.push(
            BackendEvent::drop(origin, target, point).with_native(NativeData::Strings(strings)),
        );
        batch.push(BackendEvent::drag_end(origin, point));
        self.emit_all(batch);
    }

    /// Reads every `text/plain` entry and emits the drop once all have resolved.
    ///
    /// A drag starting before then abandons the read: the text gesture ends
    /// with `DragEnd` and late results are discarded.
    fn read_strings<E: PlatformDragEvent + ?Sized>(
        self: &Rc<Self>,
        event: &mut E,
        target: TargetId,
        point: Point,
    ) {
        let indices: SmallVec<[usize; 4]> = event
            .items()
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_plain_text())
            .map(|(index, _)| index)
            .collect();
        let ticket = {
            let mut state = self.state.borrow_mut();
            let ticket = state.next_read;
            state.next_read += 1;
            state.reading = Some((ticket, point));
            ticket
        };
        if indices.is_empty() {
            self.finish_string_drop(ticket, target, point, Vec::new());
            return;
        }
        let pending = Rc::new(RefCell::new(PendingStrings {
            slots: vec![None; indices.len()],
            remaining: indices.len(),
        }));
        for (slot, index) in indices.into_iter().enumerate() {
            let pending = pending.clone();
            let shared = Rc::downgrade(self);
            event.read_string(
                index,
                Box::new(move |text| {
                    let done = {
                        let mut guard = pending.borrow_mut();
                        let pending = &mut *guard;
                        if let Some(entry) = pending.slots.get_mut(slot) {
                            if entry.is_none() {
                                *entry = Some(text);
                                pending.remaining -= 1;
                            }
                        }
                        if pending.remaining == 0 {
                            Some(pending.slots.drain(..).flatten().collect::<Vec<_>>())
                        } else {
                            None
                        }
                    };
                    if let (Some(strings), Some(shared)) = (done, shared.upgrade()) {
                        shared.finish_string_drop(ticket, target, point, strings);
                    }
                }),
            );
        }
    }
}

/// A [`DragBackend`] driven by platform drag notifications.
pub struct NativeBackend<I> {
    shared: Rc<Shared<I>>,
}

impl<I> fmt::Debug for NativeBackend<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("NativeBackend")
            .field("config", &self.shared.config)
            .field("sources", &state.sources.len())
            .field("targets", &state.targets.len())
            .field("gesture", &state.gesture)
            .finish_non_exhaustive()
    }
}

impl<I: Clone + 'static> NativeBackend<I> {
    /// Creates a backend answering its questions through `monitor`.
    #[must_use]
    pub fn new(monitor: Monitor<I>, config: BackendConfig) -> Self {
        Self {
            shared: Rc::new(Shared {
                monitor,
                config,
                events: EventStream::new(),
                state: RefCell::new(State::default()),
            }),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> BackendConfig {
        self.shared.config
    }

    /// Returns the monitor.
    #[must_use]
    pub fn monitor(&self) -> &Monitor<I> {
        &self.shared.monitor
    }

    /// Returns what is being dragged, if anything.
    #[must_use]
    pub fn active_origin(&self) -> Option<DragOrigin> {
        self.shared.active().map(|drag| drag.origin)
    }

    /// Returns the target that accepted the latest movement, if any.
    #[must_use]
    pub fn active_target(&self) -> Option<TargetId> {
        self.shared.active().and_then(|drag| drag.target)
    }

    /// Returns `true` while a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.shared.active().is_some()
    }

    /// Handles a drag initiated under the pointer.
    ///
    /// The preferred connected source under the pointer is asked whether it
    /// may drag; if not, the platform gesture is cancelled. When no connected
    /// source is under the pointer the drag is treated as native.
    pub fn drag_start<E: PlatformDragEvent + ?Sized>(&self, event: &mut E) {
        let shared = &self.shared;
        let point = event.client_offset();
        shared.force_end(Some(point), "new drag started");

        let candidate = {
            let state = shared.state.borrow();
            shared.hits(&state.sources, point).first().copied()
        };
        let Some(candidate) = candidate else {
            shared.begin_native(event);
            return;
        };
        let id = candidate.id;
        if !shared.monitor.can_drag(id) {
            debug!(source = %id, "drag refused");
            event.prevent_default();
            return;
        }

        let start = shared.begin(ActiveDrag {
            origin: id.into(),
            offset: Some(source_offset(Some(candidate.bounds), point)),
            target: None,
            last_point: point,
        });
        if let Some(image) = shared.monitor.preview_image_for_source(id) {
            let hotspot = drag_preview_offset(image.bounding_rect(), point);
            if let Err(err) = event.set_drag_image(&image, hotspot) {
                debug!(source = %id, error = %err, "drag image not set");
            }
        }
        debug!(source = %id, "drag started");
        shared.events.emit(start);
    }

    /// Handles pointer movement during a drag.
    ///
    /// While idle, a payload carrying items starts a native drag.
    pub fn drag_over<E: PlatformDragEvent + ?Sized>(&self, event: &mut E) {
        let shared = &self.shared;
        let point = event.client_offset();
        let active = {
            let mut state = shared.state.borrow_mut();
            state.leave_deadline = None;
            state.active()
        };
        let drag = match active {
            Some(drag) => drag,
            None => {
                if event.items().is_empty() && event.files().is_empty() {
                    return;
                }
                match shared.begin_native(event) {
                    Some(drag) => drag,
                    None => return,
                }
            }
        };

        let accepting = shared.accepting_target(point, drag.origin);
        let mut batch = Batch::new();
        if let Some(previous) = drag.target.filter(|&t| Some(t) != accepting) {
            batch.push(drag.event(BackendEvent::drag_out(drag.origin, previous, point)));
        }
        let mut over = drag.event(BackendEvent::drag_over(drag.origin, point));
        over.target = accepting;
        batch.push(over);
        shared.update_active(drag.origin, |active| {
            active.target = accepting;
            active.last_point = point;
        });

        match accepting {
            Some(target) => {
                trace!(target = %target, "over accepting target");
                event.set_drop_effect(shared.monitor.drop_effect_for_target(target));
                event.prevent_default();
            }
            None => event.set_drop_effect(DropEffect::None),
        }
        shared.emit_all(batch);
    }

    /// Handles the pointer leaving the drop region.
    ///
    /// Only native drags react, by scheduling a debounced end.
    pub fn drag_leave<E: PlatformDragEvent + ?Sized>(&self, event: &E) {
        let mut state = self.shared.state.borrow_mut();
        if let Some(ActiveDrag {
            origin: DragOrigin::Native(_),
            ..
        }) = state.active()
        {
            let deadline = event
                .timestamp()
                .saturating_add(self.shared.config.native_leave_debounce_ms);
            state.leave_deadline = Some(deadline);
            trace!(deadline, "native leave scheduled");
        }
    }

    /// Fires a pending native leave whose deadline is at or before `now`.
    pub fn poll_timers(&self, now: u64) {
        let due = {
            let mut state = self.shared.state.borrow_mut();
            match state.leave_deadline {
                Some(deadline) if now >= deadline => {
                    state.leave_deadline = None;
                    true
                }
                _ => false,
            }
        };
        if due {
            self.shared.force_end(None, "native drag left");
        }
    }

    /// Returns the deadline of a pending native leave.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.shared.state.borrow().leave_deadline
    }

    /// Handles a drop.
    ///
    /// The accepting target under the pointer receives `Drop`. Without one,
    /// the previously active target receives `DragOut`; element drags then
    /// stay active until [`drag_end`](Self::drag_end), native drags end
    /// immediately.
    pub fn drop<E: PlatformDragEvent + ?Sized>(&self, event: &mut E) {
        let shared = &self.shared;
        let point = event.client_offset();
        let active = {
            let mut state = shared.state.borrow_mut();
            state.leave_deadline = None;
            state.active()
        };
        let drag = match active {
            Some(drag) => drag,
            None => {
                if event.items().is_empty() && event.files().is_empty() {
                    return;
                }
                match shared.begin_native(event) {
                    Some(drag) => drag,
                    None => return,
                }
            }
        };

        let accepting = shared.accepting_target(point, drag.origin);
        let mut batch = Batch::new();
        let Some(target) = accepting else {
            if let Some(previous) = drag.target {
                batch.push(drag.event(BackendEvent::drag_out(drag.origin, previous, point)));
            }
            if drag.origin.native().is_some() {
                shared.take_gesture();
                debug!(origin = %drag.origin, "native drop outside any target");
                batch.push(BackendEvent::drag_end(drag.origin, point));
            } else {
                shared.update_active(drag.origin, |active| active.target = None);
            }
            shared.emit_all(batch);
            return;
        };

        event.prevent_default();
        shared.take_gesture();
        if let Some(previous) = drag.target.filter(|&t| t != target) {
            batch.push(drag.event(BackendEvent::drag_out(drag.origin, previous, point)));
        }
        match drag.origin {
            DragOrigin::Source(id) => {
                debug!(source = %id, target = %target, "dropped");
                batch.push(drag.event(BackendEvent::drop(id, target, point)));
                shared.emit_all(batch);
            }
            DragOrigin::Native(NativeKind::File) => {
                let files = event.take_files();
                debug!(target = %target, count = files.len(), "native files dropped");
                batch.push(
                    BackendEvent::drop(drag.origin, target, point)
                        .with_native(NativeData::Files(files)),
                );
                batch.push(BackendEvent::drag_end(drag.origin, point));
                shared.emit_all(batch);
            }
            DragOrigin::Native(NativeKind::String) => {
                shared.emit_all(batch);
                shared.read_strings(event, target, point);
            }
        }
    }

    /// Handles the platform ending the gesture. A no-op while idle.
    pub fn drag_end<E: PlatformDragEvent + ?Sized>(&self, event: &E) {
        self.shared
            .force_end(Some(event.client_offset()), "platform drag end");
    }
}

impl<I: Clone + 'static> DragBackend for NativeBackend<I> {
    fn connect_drag_source(&self, id: SourceId, element: Option<ElementRef>) -> Disconnect {
        let Some(element) = element else {
            trace!(source = %id, "source has no element");
            return Disconnect::noop();
        };
        element.set_draggable(true);
        {
            let mut state = self.shared.state.borrow_mut();
            let seq = state.bump_seq();
            state.sources.push(Connected { id, element, seq });
        }
        trace!(source = %id, "source connected");
        let shared = Rc::downgrade(&self.shared);
        Disconnect::new(move || {
            if let Some(shared) = shared.upgrade() {
                shared.disconnect_source(id);
            }
        })
    }

    fn connect_drop_target(&self, id: TargetId, element: Option<ElementRef>) -> Disconnect {
        let Some(element) = element else {
            trace!(target = %id, "target has no element");
            return Disconnect::noop();
        };
        {
            let mut state = self.shared.state.borrow_mut();
            let seq = state.bump_seq();
            state.targets.push(Connected { id, element, seq });
        }
        trace!(target = %id, "target connected");
        let shared = Rc::downgrade(&self.shared);
        Disconnect::new(move || {
            if let Some(shared) = shared.upgrade() {
                shared.disconnect_target(id);
            }
        })
    }

    fn events(&self) -> &EventStream<BackendEvent> {
        &self.shared.events
    }
}
