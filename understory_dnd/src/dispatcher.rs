// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dispatcher: connection lifecycle and per-connection event streams.
//!
//! A [`Dispatcher`] owns one backend and the registry behind it. Connecting a
//! [`DragSource`] or [`DropTarget`] assigns it an identifier, registers it,
//! connects it to the backend, and returns a connection whose private stream
//! carries only that connection's events, enriched with the live item.
//!
//! - Source streams carry events whose origin is the source. The item and
//!   item type are read when each event is delivered, so changing the item
//!   mid-drag is observed by the next event.
//! - Target streams carry events naming the target. The item comes from the
//!   dragged source, or from the native payload for native drags.
//!
//! Source registry entries are removed at the end of the turn, by
//! [`Dispatcher::run_deferred`], so subscribers still fanning out the final
//! `DragEnd` can resolve the item.
//!
//! ## Minimal example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use kurbo::Point;
//! use understory_dnd::backends::TestBackend;
//! use understory_dnd::{BackendEvent, Dispatcher, DragSource, DropItem, DropTarget, EventKind};
//!
//! let dispatcher: Dispatcher<String, TestBackend> = Dispatcher::builder()
//!     .backend(|_monitor| TestBackend::new())
//!     .build()
//!     .unwrap();
//!
//! let source = Rc::new(DragSource::new("card", "hello".to_string()));
//! let target = Rc::new(DropTarget::new("card"));
//! let src = dispatcher.connect_source(&source, None);
//! let tgt = dispatcher.connect_target(&target, None);
//!
//! let dropped = Rc::new(RefCell::new(None));
//! let sink = dropped.clone();
//! let _sub = tgt.events().subscribe(move |ev| {
//!     if ev.kind == EventKind::Drop {
//!         *sink.borrow_mut() = ev.item.clone();
//!     }
//! });
//!
//! let backend = dispatcher.backend();
//! backend.publish(BackendEvent::drag_start(src.id(), Point::ZERO));
//! backend.publish(BackendEvent::drop(src.id(), tgt.id(), Point::new(5.0, 5.0)));
//! assert_eq!(*dropped.borrow(), Some(DropItem::Item("hello".to_string())));
//! ```

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use tracing::trace;

use crate::backend::{Disconnect, DragBackend};
use crate::deferred::DeferredQueue;
use crate::error::DispatcherError;
use crate::event::{BackendEvent, DropItem, EventKind, NativeData, SourceEvent, TargetEvent};
use crate::id::{DragOrigin, IdAllocator, NativeKind, SourceId, TargetId};
use crate::monitor::Monitor;
use crate::offset::ElementRef;
use crate::preview::{PreviewLayer, PreviewTracker, PreviewUpdates};
use crate::registry::Registry;
use crate::source::DragSource;
use crate::stream::{EventStream, Subscription};
use crate::target::{DropTarget, ItemTypes};

/// Dispatcher settings.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// How preview movements reach the drag layer.
    pub preview_updates: PreviewUpdates,
}

impl DispatcherConfig {
    /// Sets how preview movements reach the drag layer.
    #[must_use]
    pub const fn with_preview_updates(mut self, preview_updates: PreviewUpdates) -> Self {
        self.preview_updates = preview_updates;
        self
    }
}

type BackendFactory<I, B> = Box<dyn FnOnce(Monitor<I>) -> B>;

/// Builder for [`Dispatcher`].
pub struct DispatcherBuilder<I: 'static, B> {
    backend: Option<BackendFactory<I, B>>,
    config: DispatcherConfig,
}

impl<I: 'static, B> fmt::Debug for DispatcherBuilder<I, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("backend", &self.backend.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl<I: Clone + 'static, B: DragBackend> DispatcherBuilder<I, B> {
    /// Sets the backend factory. It receives the monitor over the
    /// dispatcher's registry.
    #[must_use]
    pub fn backend(mut self, factory: impl FnOnce(Monitor<I>) -> B + 'static) -> Self {
        self.backend = Some(Box::new(factory));
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the dispatcher.
    ///
    /// # Errors
    ///
    /// [`DispatcherError::MissingBackend`] if no backend factory was set.
    pub fn build(self) -> Result<Dispatcher<I, B>, DispatcherError> {
        let factory = self.backend.ok_or(DispatcherError::MissingBackend)?;
        let registry = Rc::new(RefCell::new(Registry::new()));
        let monitor = Monitor::new(registry.clone());
        let backend = factory(monitor.clone());
        Ok(Dispatcher {
            registry,
            monitor,
            backend,
            ids: IdAllocator::default(),
            deferred: DeferredQueue::new(),
            previews: Rc::new(PreviewTracker::new(self.config.preview_updates)),
            config: self.config,
        })
    }
}

/// A connected source.
#[must_use = "a source stays connected until passed to `Dispatcher::disconnect_source`"]
pub struct SourceConnection<I: 'static> {
    id: SourceId,
    source: Rc<DragSource<I>>,
    events: EventStream<SourceEvent<I>>,
    disconnect: Disconnect,
    preview: Subscription,
}

impl<I: 'static> SourceConnection<I> {
    /// The assigned identifier.
    #[must_use]
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// The connected source.
    #[must_use]
    pub fn source(&self) -> &Rc<DragSource<I>> {
        &self.source
    }

    /// The source's private event stream.
    #[must_use]
    pub fn events(&self) -> &EventStream<SourceEvent<I>> {
        &self.events
    }
}

impl<I: 'static> fmt::Debug for SourceConnection<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConnection")
            .field("id", &self.id)
            .field("events", &self.events)
            .field("disconnect", &self.disconnect)
            .field("preview", &self.preview)
            .finish_non_exhaustive()
    }
}

/// A connected target.
#[must_use = "a target stays connected until passed to `Dispatcher::disconnect_target`"]
pub struct TargetConnection<I: 'static> {
    id: TargetId,
    target: Rc<DropTarget<I>>,
    events: EventStream<TargetEvent<I>>,
    disconnect: Disconnect,
}

impl<I: 'static> TargetConnection<I> {
    /// The assigned identifier.
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// The connected target.
    #[must_use]
    pub fn target(&self) -> &Rc<DropTarget<I>> {
        &self.target
    }

    /// The target's private event stream.
    #[must_use]
    pub fn events(&self) -> &EventStream<TargetEvent<I>> {
        &self.events
    }
}

impl<I: 'static> fmt::Debug for TargetConnection<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConnection")
            .field("id", &self.id)
            .field("events", &self.events)
            .field("disconnect", &self.disconnect)
            .finish_non_exhaustive()
    }
}

/// Brokers one backend's events to connected sources and targets.
pub struct Dispatcher<I: 'static, B> {
    registry: Rc<RefCell<Registry<I>>>,
    monitor: Monitor<I>,
    backend: B,
    ids: IdAllocator,
    deferred: DeferredQueue,
    previews: Rc<PreviewTracker<I>>,
    config: DispatcherConfig,
}

impl<I: 'static, B: fmt::Debug> fmt::Debug for Dispatcher<I, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry.borrow())
            .field("backend", &self.backend)
            .field("ids", &self.ids)
            .field("deferred", &self.deferred)
            .field("previews", &self.previews)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn enrich_target_event<I: Clone>(
    registry: &RefCell<Registry<I>>,
    target: &Rc<DropTarget<I>>,
    id: TargetId,
    event: &BackendEvent,
) -> TargetEvent<I> {
    let (item, item_type, source) = match event.origin {
        Some(DragOrigin::Native(kind)) => {
            let item = match (&event.native, kind) {
                (Some(NativeData::Files(files)), _) => DropItem::Files(files.clone()),
                (Some(NativeData::Strings(strings)), _) => DropItem::Strings(strings.clone()),
                (None, NativeKind::File) => DropItem::Files(Vec::new()),
                (None, NativeKind::String) => DropItem::Strings(Vec::new()),
            };
            (Some(item), Some(kind.tag().to_string()), None)
        }
        Some(DragOrigin::Source(source_id)) => {
            let source = registry.borrow().get_source(source_id);
            match source {
                Some(source) => (
                    Some(DropItem::Item(source.item_cloned())),
                    Some(source.item_type()),
                    Some(source),
                ),
                None => (None, None, None),
            }
        }
        None => (None, None, None),
    };
    TargetEvent {
        kind: event.kind,
        id,
        origin: event.origin,
        client_offset: event.client_offset,
        source_offset: event.source_offset,
        item,
        item_type,
        source,
        target: target.clone(),
    }
}

impl<I: Clone + 'static, B: DragBackend> Dispatcher<I, B> {
    /// Starts building a dispatcher.
    #[must_use]
    pub fn builder() -> DispatcherBuilder<I, B> {
        DispatcherBuilder {
            backend: None,
            config: DispatcherConfig::default(),
        }
    }

    /// The backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The monitor over this dispatcher's registry.
    #[must_use]
    pub fn monitor(&self) -> &Monitor<I> {
        &self.monitor
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> DispatcherConfig {
        self.config
    }

    /// Connects `source`, hosted by `element`.
    ///
    /// The element, when given, becomes the source's host. A source without
    /// element still gets an identifier and a stream; whether it ever drags
    /// depends on the backend.
    pub fn connect_source(
        &self,
        source: &Rc<DragSource<I>>,
        element: Option<ElementRef>,
    ) -> SourceConnection<I> {
        let id = self.ids.source();
        source.set_id(Some(id));
        if let Some(element) = &element {
            source.set_host(Some(element.clone()));
        }
        self.registry.borrow_mut().set_source(id, source.clone());
        let disconnect = self.backend.connect_drag_source(id, element);
        trace!(source = %id, "source connected");

        let handle = source.clone();
        let events = self.backend.events().filter_map(move |event: &BackendEvent| {
            (event.source_id() == Some(id)).then(|| SourceEvent {
                kind: event.kind,
                id,
                target: event.target,
                client_offset: event.client_offset,
                source_offset: event.source_offset,
                item: handle.item_cloned(),
                item_type: handle.item_type(),
            })
        });
        let previews = self.previews.clone();
        let handle = source.clone();
        let preview = events.subscribe(move |event| previews.handle(&handle, event));

        SourceConnection {
            id,
            source: source.clone(),
            events,
            disconnect,
            preview,
        }
    }

    /// Disconnects a source.
    ///
    /// If it is being dragged, the backend ends the drag first and the
    /// connection's stream still receives that `DragEnd`. The registry entry
    /// is removed by the next [`run_deferred`](Self::run_deferred).
    ///
    /// Called while the backend is delivering an event, the `DragEnd` is only
    /// queued behind it. The connection's stream then stays attached until
    /// [`run_deferred`](Self::run_deferred) so it still receives it.
    pub fn disconnect_source(&self, connection: SourceConnection<I>) {
        let SourceConnection {
            id,
            source,
            events,
            disconnect,
            preview,
        } = connection;
        disconnect.run();
        self.previews.forget(id);
        if source.id() == Some(id) {
            source.set_id(None);
        }
        let registry = self.registry.clone();
        if self.backend.events().is_emitting() {
            trace!(source = %id, "source disconnected during delivery");
            self.deferred.defer(move || {
                drop(preview);
                events.detach_upstream();
                registry.borrow_mut().delete_source(id);
            });
            return;
        }
        drop(preview);
        events.detach_upstream();
        self.deferred
            .defer(move || registry.borrow_mut().delete_source(id));
        trace!(source = %id, "source disconnected");
    }

    /// Connects `target`, hosted by `element`.
    pub fn connect_target(
        &self,
        target: &Rc<DropTarget<I>>,
        element: Option<ElementRef>,
    ) -> TargetConnection<I> {
        let id = self.ids.target();
        target.set_id(Some(id));
        if let Some(element) = &element {
            target.set_host(Some(element.clone()));
        }
        self.registry.borrow_mut().set_target(id, target.clone());
        let disconnect = self.backend.connect_drop_target(id, element);
        trace!(target = %id, "target connected");

        let registry = self.registry.clone();
        let handle = target.clone();
        let events = self.backend.events().filter_map(move |event: &BackendEvent| {
            (event.target == Some(id)).then(|| enrich_target_event(&registry, &handle, id, event))
        });

        TargetConnection {
            id,
            target: target.clone(),
            events,
            disconnect,
        }
    }

    /// Disconnects a target and removes it from the registry.
    pub fn disconnect_target(&self, connection: TargetConnection<I>) {
        let TargetConnection {
            id,
            target,
            events,
            disconnect,
        } = connection;
        disconnect.run();
        events.detach_upstream();
        if target.id() == Some(id) {
            target.set_id(None);
        }
        self.registry.borrow_mut().delete_target(id);
        trace!(target = %id, "target disconnected");
    }

    /// A stream that is `true` while something of `item_types` is dragged.
    ///
    /// Registered sources match on their item type; native drags match on
    /// their [tag](NativeKind::tag). Only changes are emitted.
    pub fn dragging(&self, item_types: impl Into<ItemTypes>) -> EventStream<bool> {
        let item_types = item_types.into();
        let registry = self.registry.clone();
        let mut last = None;
        self.backend.events().filter_map(move |event: &BackendEvent| {
            let dragging = match event.kind {
                EventKind::DragStart => true,
                EventKind::DragEnd | EventKind::Drop => false,
                EventKind::DragOver | EventKind::DragOut => return None,
            };
            let matches = match event.origin? {
                DragOrigin::Native(kind) => item_types.contains(kind.tag()),
                DragOrigin::Source(id) => {
                    let source = registry.borrow().get_source(id);
                    source.is_some_and(|source| item_types.contains(&source.item_type()))
                }
            };
            if !matches || last == Some(dragging) {
                return None;
            }
            last = Some(dragging);
            Some(dragging)
        })
    }

    /// Attaches the preview layer, replacing any previous one.
    pub fn connect_drag_layer(&self, layer: Rc<dyn PreviewLayer<I>>) {
        self.previews.set_layer(Some(layer));
        trace!("drag layer connected");
    }

    /// Detaches the preview layer.
    pub fn disconnect_drag_layer(&self) {
        self.previews.set_layer(None);
        trace!("drag layer disconnected");
    }

    /// Returns `true` while the drag layer shows a preview for `id`.
    #[must_use]
    pub fn is_previewing(&self, id: SourceId) -> bool {
        self.previews.is_active(id)
    }

    /// Delivers coalesced preview movements. Call once per rendered frame.
    pub fn on_animation_frame(&self) {
        self.previews.flush();
    }

    /// Runs deferred cleanup. Call at the end of each event turn.
    pub fn run_deferred(&self) -> usize {
        self.deferred.run()
    }

    /// Number of jobs waiting for [`run_deferred`](Self::run_deferred).
    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }
}
