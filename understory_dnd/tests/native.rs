// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `understory_dnd` dispatcher driven by the native backend.
//!
//! A fake platform event stands in for the host's drag notifications; element
//! bounds come from [`FixedElement`]s.

#![cfg(feature = "native")]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use kurbo::{Point, Rect, Vec2};
use understory_dnd::backends::NativeBackend;
use understory_dnd::transfer::{NativeFile, PlatformDragEvent, StringCallback, TransferItem};
use understory_dnd::{
    BackendConfig, BackendEvent, CanDrop, Dispatcher, DragBackend, DragImageError, DragOrigin, DragSource,
    DropEffect, DropItem, DropTarget, ElementRef, EventKind, FixedElement, Incoming, NativeKind,
    PreviewImage, SourceConnection, TargetConnection, TargetEvent,
};

type NativeDispatcher = Dispatcher<u32, NativeBackend<u32>>;

fn dispatcher() -> NativeDispatcher {
    Dispatcher::builder()
        .backend(|monitor| NativeBackend::new(monitor, BackendConfig::default()))
        .build()
        .unwrap()
}

fn element(x: f64, y: f64, side: f64) -> Option<ElementRef> {
    Some(Rc::new(FixedElement::new(Rect::new(x, y, x + side, y + side))))
}

#[derive(Default)]
struct Notification {
    point: Point,
    time: u64,
    items: Vec<TransferItem>,
    contents: Vec<String>,
    files: Vec<NativeFile>,
    effect: Option<DropEffect>,
    prevented: bool,
}

impl Notification {
    fn at(x: f64, y: f64) -> Self {
        Self {
            point: Point::new(x, y),
            ..Self::default()
        }
    }

    fn time(mut self, time: u64) -> Self {
        self.time = time;
        self
    }

    fn file(mut self, name: &str) -> Self {
        self.items.push(TransferItem::file("text/plain"));
        self.contents.push(String::new());
        self.files.push(NativeFile::named(name));
        self
    }

    fn text(mut self, mime: &str, text: &str) -> Self {
        self.items.push(TransferItem::string(mime));
        self.contents.push(text.to_string());
        self
    }
}

impl PlatformDragEvent for Notification {
    fn client_offset(&self) -> Point {
        self.point
    }

    fn timestamp(&self) -> u64 {
        self.time
    }

    fn items(&self) -> &[TransferItem] {
        &self.items
    }

    fn files(&self) -> &[NativeFile] {
        &self.files
    }

    fn take_files(&mut self) -> Vec<NativeFile> {
        std::mem::take(&mut self.files)
    }

    fn read_string(&mut self, index: usize, done: StringCallback) {
        done(self.contents[index].clone());
    }

    fn set_drag_image(&mut self, _: &PreviewImage, _: Vec2) -> Result<(), DragImageError> {
        Ok(())
    }

    fn set_drop_effect(&mut self, effect: DropEffect) {
        self.effect = Some(effect);
    }

    fn prevent_default(&mut self) {
        self.prevented = true;
    }
}

fn record_target(
    t: &TargetConnection<u32>,
) -> (Rc<RefCell<Vec<TargetEvent<u32>>>>, understory_dnd::Subscription) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    let sub = t
        .events()
        .subscribe(move |ev: &TargetEvent<u32>| sink.borrow_mut().push(ev.clone()));
    (log, sub)
}

#[test]
fn mismatched_types_never_hover() {
    let d = dispatcher();
    let s = d.connect_source(&Rc::new(DragSource::new("a", 1)), element(0.0, 0.0, 50.0));
    let t = d.connect_target(&Rc::new(DropTarget::new("b")), element(100.0, 100.0, 50.0));
    let (log, _sub) = record_target(&t);

    let backend = d.backend();
    backend.drag_start(&mut Notification::at(10.0, 10.0));
    assert_eq!(backend.active_origin(), Some(DragOrigin::Source(s.id())));
    let mut over = Notification::at(120.0, 120.0);
    backend.drag_over(&mut over);
    backend.drag_over(&mut Notification::at(125.0, 125.0));
    let mut dropped = Notification::at(125.0, 125.0);
    backend.drop(&mut dropped);
    backend.drag_end(&Notification::at(125.0, 125.0));

    assert!(log.borrow().is_empty());
    assert_eq!(over.effect, Some(DropEffect::None));
    assert!(!over.prevented);
    assert!(!dropped.prevented);
}

#[test]
fn matching_types_hover_and_drop_with_the_item() {
    let d = dispatcher();
    let s = d.connect_source(&Rc::new(DragSource::new("t", 42)), element(0.0, 0.0, 50.0));
    let target = Rc::new(DropTarget::new("t").with_drop_effect(DropEffect::Copy));
    let t = d.connect_target(&target, element(100.0, 100.0, 50.0));
    let (log, _sub) = record_target(&t);

    let backend = d.backend();
    backend.drag_start(&mut Notification::at(10.0, 20.0));
    let mut over = Notification::at(120.0, 120.0);
    backend.drag_over(&mut over);
    assert_eq!(over.effect, Some(DropEffect::Copy));
    assert!(over.prevented);
    let mut dropped = Notification::at(120.0, 120.0);
    backend.drop(&mut dropped);
    assert!(dropped.prevented);
    assert!(!backend.is_dragging());

    let log = log.borrow();
    let kinds: Vec<_> = log.iter().map(|ev| ev.kind).collect();
    assert_eq!(kinds, [EventKind::DragOver, EventKind::Drop]);
    assert_eq!(log[1].item, Some(DropItem::Item(42)));
    assert_eq!(log[1].origin, Some(DragOrigin::Source(s.id())));
    let offset = log[1].source_offset.unwrap();
    assert_eq!(offset.offset, Vec2::new(10.0, 20.0));
}

#[test]
fn predicates_see_the_dragged_item() {
    let d = dispatcher();
    let _small = d.connect_source(&Rc::new(DragSource::new("n", 3)), element(0.0, 0.0, 10.0));
    let _large = d.connect_source(&Rc::new(DragSource::new("n", 30)), element(20.0, 0.0, 10.0));
    let only_small = CanDrop::<u32>::predicate(|incoming| {
        matches!(incoming, Incoming::Item(&n) if n < 10)
    });
    let t = d.connect_target(
        &Rc::new(DropTarget::new("n").with_can_drop(only_small)),
        element(100.0, 0.0, 50.0),
    );
    let (log, _sub) = record_target(&t);
    let backend = d.backend();

    backend.drag_start(&mut Notification::at(25.0, 5.0));
    backend.drag_over(&mut Notification::at(110.0, 10.0));
    backend.drag_end(&Notification::at(110.0, 10.0));
    assert!(log.borrow().is_empty());

    backend.drag_start(&mut Notification::at(5.0, 5.0));
    backend.drag_over(&mut Notification::at(110.0, 10.0));
    backend.drag_end(&Notification::at(110.0, 10.0));
    let kinds: Vec<_> = log.borrow().iter().map(|ev| ev.kind).collect();
    assert_eq!(kinds, [EventKind::DragOver, EventKind::DragOut]);
}

#[test]
fn dropped_files_reach_file_targets() {
    let d = dispatcher();
    let t = d.connect_target(
        &Rc::new(DropTarget::new(NativeKind::File.tag())),
        element(0.0, 0.0, 100.0),
    );
    let (log, _sub) = record_target(&t);
    let dragging = Rc::new(RefCell::new(Vec::new()));
    let sink = dragging.clone();
    let _dragging = d
        .dragging(NativeKind::File.tag())
        .subscribe(move |v: &bool| sink.borrow_mut().push(*v));

    let backend = d.backend();
    backend.drag_over(&mut Notification::at(10.0, 10.0).file("a.txt").file("b.txt"));
    let mut dropped = Notification::at(10.0, 10.0).file("a.txt").file("b.txt");
    backend.drop(&mut dropped);

    let log = log.borrow();
    assert_eq!(log[0].item, Some(DropItem::Files(Vec::new())));
    let Some(DropItem::Files(files)) = &log[1].item else {
        panic!("expected files, got {:?}", log[1].item);
    };
    let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["a.txt", "b.txt"]);
    assert!(dropped.files.is_empty());
    assert_eq!(*dragging.borrow(), [true, false]);
}

#[test]
fn dropped_text_keeps_payload_order() {
    let d = dispatcher();
    let t = d.connect_target(
        &Rc::new(DropTarget::new(NativeKind::String.tag())),
        element(0.0, 0.0, 100.0),
    );
    let (log, _sub) = record_target(&t);

    let mut dropped = Notification::at(10.0, 10.0)
        .text("text/plain", "one")
        .text("text/html", "<b>skip</b>")
        .text("text/plain", "two");
    d.backend().drop(&mut dropped);

    let log = log.borrow();
    let last = log.last().unwrap();
    assert_eq!(last.kind, EventKind::Drop);
    assert_eq!(
        last.item,
        Some(DropItem::Strings(vec!["one".to_string(), "two".to_string()]))
    );
}

#[test]
fn native_leave_is_debounced() {
    let d = dispatcher();
    let backend = d.backend();
    backend.drag_over(&mut Notification::at(10.0, 10.0).file("a.txt"));
    assert!(backend.is_dragging());

    backend.drag_leave(&Notification::at(0.0, 0.0).time(1_000));
    assert_eq!(backend.next_deadline(), Some(1_100));
    backend.drag_over(&mut Notification::at(12.0, 10.0).time(1_050).file("a.txt"));
    assert_eq!(backend.next_deadline(), None);

    backend.drag_leave(&Notification::at(0.0, 0.0).time(2_000));
    backend.poll_timers(2_099);
    assert!(backend.is_dragging());
    backend.poll_timers(2_100);
    assert!(!backend.is_dragging());
}

#[test]
fn disconnecting_the_dragged_source_ends_the_drag() {
    let d = dispatcher();
    let s = d.connect_source(&Rc::new(DragSource::new("t", 1)), element(0.0, 0.0, 50.0));
    let t = d.connect_target(&Rc::new(DropTarget::new("t")), element(100.0, 0.0, 50.0));
    let (target_log, _t_sub) = record_target(&t);
    let source_log = Rc::new(RefCell::new(Vec::new()));
    let sink = source_log.clone();
    let _s_sub = s
        .events()
        .subscribe(move |ev: &understory_dnd::SourceEvent<u32>| sink.borrow_mut().push(ev.kind));

    d.backend().drag_start(&mut Notification::at(5.0, 5.0));
    d.backend().drag_over(&mut Notification::at(110.0, 5.0));
    d.disconnect_source(s);
    d.run_deferred();

    // The trailing `DragOut` names the target the source was over.
    assert_eq!(
        *source_log.borrow(),
        [
            EventKind::DragStart,
            EventKind::DragOver,
            EventKind::DragEnd,
            EventKind::DragOut
        ]
    );
    let kinds: Vec<_> = target_log.borrow().iter().map(|ev| ev.kind).collect();
    assert_eq!(kinds, [EventKind::DragOver, EventKind::DragOut]);
    assert!(!d.backend().is_dragging());
}

/// Tracks one source's progress through a gesture.
#[derive(Copy, Clone, Debug, PartialEq)]
enum Phase {
    Idle,
    Active,
    /// Just terminated; one trailing `DragOut` for the last target may follow.
    Ended,
}

fn check_paths(events: &[BackendEvent]) {
    let mut phases: HashMap<DragOrigin, Phase> = HashMap::new();
    for (index, ev) in events.iter().enumerate() {
        let origin = ev.origin.unwrap();
        let phase = phases.entry(origin).or_insert(Phase::Idle);
        let next = match (ev.kind, *phase) {
            (EventKind::DragStart, Phase::Idle | Phase::Ended) => Phase::Active,
            (EventKind::DragOver | EventKind::DragOut, Phase::Active) => Phase::Active,
            (EventKind::DragOut, Phase::Ended) => Phase::Idle,
            (EventKind::DragEnd | EventKind::Drop, Phase::Active) => Phase::Ended,
            (kind, phase) => panic!("{kind:?} while {phase:?} at #{index} in {events:#?}"),
        };
        // Only one gesture is ever active.
        if next == Phase::Active {
            for (other, phase) in &phases {
                assert!(*other == origin || *phase != Phase::Active, "two active gestures");
            }
        }
        phases.insert(origin, next);
    }
}

/// Deterministic pseudo-random numbers.
struct Lcg(u64);

impl Lcg {
    fn below(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        usize::try_from(self.0 >> 33).unwrap_or(0) % bound
    }
}

#[test]
fn gestures_follow_the_event_grammar() {
    let d = dispatcher();
    let mut sources: Vec<SourceConnection<u32>> = Vec::new();
    for n in 0..3 {
        let x = f64::from(n) * 60.0;
        sources.push(d.connect_source(&Rc::new(DragSource::new("t", n)), element(x, 0.0, 50.0)));
    }
    let _outer = d.connect_target(&Rc::new(DropTarget::new("t")), element(0.0, 100.0, 200.0));
    let _inner = d.connect_target(&Rc::new(DropTarget::new("t")), element(50.0, 150.0, 40.0));
    let _other = d.connect_target(&Rc::new(DropTarget::new("x")), element(250.0, 100.0, 50.0));

    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    let _sub = d
        .backend()
        .events()
        .subscribe(move |ev: &BackendEvent| sink.borrow_mut().push(ev.clone()));

    let backend = d.backend();
    backend.drag_start(&mut Notification::at(25.0, 25.0));
    backend.drag_over(&mut Notification::at(100.0, 200.0));
    backend.drop(&mut Notification::at(100.0, 200.0));

    // Source centers, both nested targets, the foreign target, empty space.
    let spots = [
        Point::new(25.0, 25.0),
        Point::new(85.0, 25.0),
        Point::new(145.0, 25.0),
        Point::new(20.0, 280.0),
        Point::new(70.0, 170.0),
        Point::new(275.0, 125.0),
        Point::new(310.0, 20.0),
    ];
    let mut rng = Lcg(7);
    let mut time = 0;
    for _ in 0..1_000 {
        time += 16;
        let point = spots[rng.below(spots.len())];
        let mut note = Notification::at(point.x, point.y).time(time);
        match rng.below(10) {
            0 => backend.drag_start(&mut note),
            1..=5 => backend.drag_over(&mut note),
            6 => backend.drop(&mut note),
            7 => backend.drag_end(&note),
            8 => backend.drag_leave(&note),
            _ => backend.poll_timers(time),
        }
    }
    backend.drag_end(&Notification::at(0.0, 0.0));

    for s in sources {
        d.disconnect_source(s);
    }

    let log = log.borrow();
    assert!(log.iter().any(|ev| ev.kind == EventKind::Drop));
    check_paths(&log);
}
