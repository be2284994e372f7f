// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-threaded broadcast streams.
//!
//! [`EventStream`] is the channel every layer of the crate publishes through:
//! the backend's canonical events, the dispatcher's per-connection views, and
//! the binding outputs in `understory_dnd_state`.
//!
//! ## Ordering
//!
//! - [`EventStream::emit`] delivers synchronously, to every subscriber, in
//!   subscription order, before returning.
//! - An emission made while the same stream is already delivering (a
//!   subscriber reacting to an event by causing another one) is queued and
//!   delivered after the current value reached every subscriber. Subscribers
//!   therefore observe one global order.
//! - A subscriber removed during a delivery does not receive later values, nor
//!   the rest of the current one.
//!
//! ## Lifetimes
//!
//! A [`Subscription`] keeps its stream alive and unsubscribes when dropped.
//! A derived stream (see [`EventStream::filter_map`]) stays attached to its
//! upstream for as long as the derived stream itself is alive, whether through
//! a handle or through one of its subscriptions.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use understory_dnd::EventStream;
//!
//! let numbers = EventStream::<u32>::new();
//! let evens = numbers.filter(|n| n % 2 == 0);
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = seen.clone();
//! let _sub = evens.subscribe(move |n| sink.borrow_mut().push(*n));
//!
//! for n in 0..5 {
//!     numbers.emit(n);
//! }
//! assert_eq!(*seen.borrow(), vec![0, 2, 4]);
//! ```

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use smallvec::SmallVec;

type Handler<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Slot<T> {
    key: u64,
    handler: Handler<T>,
}

struct Inner<T> {
    subscribers: RefCell<Vec<Slot<T>>>,
    next_key: Cell<u64>,
    queue: RefCell<VecDeque<T>>,
    emitting: Cell<bool>,
    upstream: RefCell<Vec<Subscription>>,
}

impl<T> Inner<T> {
    fn is_subscribed(&self, key: u64) -> bool {
        self.subscribers.borrow().iter().any(|slot| slot.key == key)
    }

    fn remove(&self, key: u64) {
        let removed = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers
                .iter()
                .position(|slot| slot.key == key)
                .map(|index| subscribers.remove(index))
        };
        // The handler may own subscriptions to this very stream; drop it
        // only once the subscriber list is released.
        drop(removed);
    }
}

/// Resets the emitting flag even when a subscriber unwinds.
struct EmitGuard<'a, T> {
    inner: &'a Inner<T>,
}

impl<T> Drop for EmitGuard<'_, T> {
    fn drop(&mut self) {
        self.inner.queue.borrow_mut().clear();
        self.inner.emitting.set(false);
    }
}

/// A cloneable handle to a single-threaded broadcast channel.
pub struct EventStream<T: 'static> {
    inner: Rc<Inner<T>>,
}

impl<T: 'static> Clone for EventStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Default for EventStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("subscribers", &self.subscriber_count())
            .field("emitting", &self.inner.emitting.get())
            .finish_non_exhaustive()
    }
}

impl<T: 'static> EventStream<T> {
    /// Creates a stream with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                subscribers: RefCell::new(Vec::new()),
                next_key: Cell::new(0),
                queue: RefCell::new(VecDeque::new()),
                emitting: Cell::new(false),
                upstream: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Returns `true` while a value is being delivered.
    #[must_use]
    pub fn is_emitting(&self) -> bool {
        self.inner.emitting.get()
    }

    /// Returns `true` when both handles refer to the same channel.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Publishes `value` to every subscriber.
    pub fn emit(&self, value: T) {
        self.inner.queue.borrow_mut().push_back(value);
        if self.inner.emitting.replace(true) {
            return;
        }
        let _guard = EmitGuard { inner: &self.inner };
        loop {
            let next = self.inner.queue.borrow_mut().pop_front();
            let Some(value) = next else {
                break;
            };
            let handlers: SmallVec<[(u64, Handler<T>); 4]> = self
                .inner
                .subscribers
                .borrow()
                .iter()
                .map(|slot| (slot.key, slot.handler.clone()))
                .collect();
            for (key, handler) in handlers {
                if self.inner.is_subscribed(key) {
                    (handler.borrow_mut())(&value);
                }
            }
        }
    }

    /// Cuts a derived stream off from its upstream.
    ///
    /// Subscribers stay attached but receive nothing more. A no-op on streams
    /// that were not derived.
    pub fn detach_upstream(&self) {
        let upstream = core::mem::take(&mut *self.inner.upstream.borrow_mut());
        drop(upstream);
    }

    /// Registers `handler` for every subsequent value.
    pub fn subscribe(&self, handler: impl FnMut(&T) + 'static) -> Subscription {
        let key = self.inner.next_key.get();
        self.inner.next_key.set(key + 1);
        let handler: Handler<T> = Rc::new(RefCell::new(handler));
        self.inner
            .subscribers
            .borrow_mut()
            .push(Slot { key, handler });
        let inner = self.inner.clone();
        Subscription::new(move || inner.remove(key))
    }

    /// Derives a stream carrying `f(value)` for each value where it is `Some`.
    pub fn filter_map<U: 'static>(
        &self,
        mut f: impl FnMut(&T) -> Option<U> + 'static,
    ) -> EventStream<U> {
        let out = EventStream::<U>::new();
        let downstream = Rc::downgrade(&out.inner);
        let upstream = self.subscribe(move |value| {
            let Some(inner) = downstream.upgrade() else {
                return;
            };
            if let Some(mapped) = f(value) {
                EventStream { inner }.emit(mapped);
            }
        });
        out.inner.upstream.borrow_mut().push(upstream);
        out
    }

    /// Derives a stream carrying `f(value)` for each value.
    pub fn map<U: 'static>(&self, mut f: impl FnMut(&T) -> U + 'static) -> EventStream<U> {
        self.filter_map(move |value| Some(f(value)))
    }

    /// Derives a stream carrying only the values accepted by `predicate`.
    pub fn filter(&self, mut predicate: impl FnMut(&T) -> bool + 'static) -> Self
    where
        T: Clone,
    {
        self.filter_map(move |value| predicate(value).then(|| value.clone()))
    }

    /// Derives a stream that skips values `same` considers equal to the
    /// previously forwarded one.
    pub fn distinct_by(&self, mut same: impl FnMut(&T, &T) -> bool + 'static) -> Self
    where
        T: Clone,
    {
        let mut last: Option<T> = None;
        self.filter_map(move |value| {
            if last.as_ref().is_some_and(|prev| same(prev, value)) {
                return None;
            }
            last = Some(value.clone());
            Some(value.clone())
        })
    }
}

/// Handle returned by [`EventStream::subscribe`].
///
/// Dropping it unsubscribes.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription that is not attached to anything.
    pub fn empty() -> Self {
        Self { cancel: None }
    }

    /// Unsubscribes now.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keeps the handler subscribed for the lifetime of the stream.
    pub fn detach(mut self) {
        self.cancel = None;
    }

    /// Returns `true` if dropping this handle would unsubscribe something.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn recorder<T: Clone + 'static>(stream: &EventStream<T>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let sub = stream.subscribe(move |value: &T| sink.borrow_mut().push(value.clone()));
        (seen, sub)
    }

    #[test]
    fn delivers_to_all_subscribers_in_order() {
        let stream = EventStream::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = log.clone();
        let _sa = stream.subscribe(move |v: &u32| a.borrow_mut().push(("a", *v)));
        let b = log.clone();
        let _sb = stream.subscribe(move |v: &u32| b.borrow_mut().push(("b", *v)));

        stream.emit(1);
        stream.emit(2);

        assert_eq!(*log.borrow(), vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let stream = EventStream::new();
        let (seen, sub) = recorder(&stream);
        stream.emit(1_u8);
        drop(sub);
        stream.emit(2);
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(stream.subscriber_count(), 0);
    }

    #[test]
    fn detached_subscription_stays() {
        let stream = EventStream::new();
        let (seen, sub) = recorder(&stream);
        sub.detach();
        stream.emit(1_u8);
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(stream.subscriber_count(), 1);
    }

    #[test]
    fn is_emitting_only_during_delivery() {
        let stream = EventStream::<u8>::new();
        let during = Rc::new(RefCell::new(Vec::new()));
        let (watched, sink) = (stream.clone(), during.clone());
        let _sub = stream.subscribe(move |_| sink.borrow_mut().push(watched.is_emitting()));
        assert!(!stream.is_emitting());
        stream.emit(0);
        assert!(!stream.is_emitting());
        assert_eq!(*during.borrow(), vec![true]);
    }

    #[test]
    fn reentrant_emission_is_queued_behind_current_value() {
        let stream = EventStream::<u32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let again = stream.clone();
        let a = log.clone();
        let _first = stream.subscribe(move |v| {
            a.borrow_mut().push(("first", *v));
            if *v == 1 {
                again.emit(2);
            }
        });
        let b = log.clone();
        let _second = stream.subscribe(move |v| b.borrow_mut().push(("second", *v)));

        stream.emit(1);

        assert_eq!(
            *log.borrow(),
            vec![("first", 1), ("second", 1), ("first", 2), ("second", 2)],
            "the nested value must not overtake the current one"
        );
    }

    #[test]
    fn unsubscribed_during_delivery_misses_the_value() {
        let stream = EventStream::<u32>::new();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let slot = victim.clone();
        let _killer = stream.subscribe(move |_| {
            slot.borrow_mut().take();
        });
        let (seen, sub) = recorder(&stream);
        *victim.borrow_mut() = Some(sub);

        stream.emit(1);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn derived_streams_filter_and_map() {
        let stream = EventStream::<i32>::new();
        let doubled_positive = stream.filter(|v| *v > 0).map(|v| v * 2);
        let (seen, _sub) = recorder(&doubled_positive);

        for v in [-1, 1, 0, 3] {
            stream.emit(v);
        }
        assert_eq!(*seen.borrow(), vec![2, 6]);
    }

    #[test]
    fn derived_stream_detaches_when_dropped() {
        let stream = EventStream::<i32>::new();
        let derived = stream.map(|v| *v);
        assert_eq!(stream.subscriber_count(), 1);
        drop(derived);
        assert_eq!(stream.subscriber_count(), 0);
    }

    #[test]
    fn subscription_keeps_derived_stream_alive() {
        let stream = EventStream::<i32>::new();
        let (seen, sub) = recorder(&stream.map(|v| v + 1));
        stream.emit(1);
        assert_eq!(*seen.borrow(), vec![2]);
        drop(sub);
        assert_eq!(stream.subscriber_count(), 0);
    }

    #[test]
    fn detached_derived_stream_goes_quiet() {
        let stream = EventStream::<i32>::new();
        let derived = stream.map(|v| *v);
        let (seen, _sub) = recorder(&derived);
        stream.emit(1);
        derived.detach_upstream();
        stream.emit(2);
        assert_eq!(*seen.borrow(), vec![1]);
        assert_eq!(stream.subscriber_count(), 0);
    }

    #[test]
    fn distinct_by_skips_consecutive_duplicates() {
        let stream = EventStream::<(i32, i32)>::new();
        let distinct = stream.distinct_by(|a, b| a.0 == b.0);
        let (seen, _sub) = recorder(&distinct);

        for v in [(1, 0), (1, 1), (2, 2), (1, 3)] {
            stream.emit(v);
        }
        assert_eq!(*seen.borrow(), vec![(1, 0), (2, 2), (1, 3)]);
    }
}
