// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Work postponed to the end of the current dispatch turn.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use core::cell::RefCell;
use core::fmt;

/// A FIFO of jobs run by [`run`](Self::run).
///
/// Used for cleanup that must not happen while an event is still being fanned
/// out, such as removing a disconnected source from the registry while other
/// subscribers may still resolve its item.
#[derive(Default)]
pub struct DeferredQueue {
    jobs: RefCell<VecDeque<Box<dyn FnOnce()>>>,
}

impl DeferredQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `job`.
    pub fn defer(&self, job: impl FnOnce() + 'static) {
        self.jobs.borrow_mut().push_back(Box::new(job));
    }

    /// Number of queued jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.borrow().len()
    }

    /// Returns `true` when nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.borrow().is_empty()
    }

    /// Runs queued jobs until the queue is empty, including jobs queued by
    /// jobs. Returns how many ran.
    pub fn run(&self) -> usize {
        let mut ran = 0;
        loop {
            let job = self.jobs.borrow_mut().pop_front();
            let Some(job) = job else {
                return ran;
            };
            job();
            ran += 1;
        }
    }
}

impl fmt::Debug for DeferredQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredQueue")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec::Vec;

    #[test]
    fn runs_in_order_including_nested_jobs() {
        let queue = Rc::new(DeferredQueue::new());
        let log = Rc::new(RefCell::new(Vec::new()));

        let (q, l) = (queue.clone(), log.clone());
        queue.defer(move || {
            l.borrow_mut().push(1);
            let l = l.clone();
            q.defer(move || l.borrow_mut().push(3));
        });
        let l = log.clone();
        queue.defer(move || l.borrow_mut().push(2));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.run(), 3);
        assert_eq!(*log.borrow(), [1, 2, 3]);
        assert!(queue.is_empty());
        assert_eq!(queue.run(), 0);
    }
}
