// Copyright 2021 The Fuchsia Authors. All rights reserved.
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use std::{collections::HashMap, sync::Arc, time::Duration};

#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub struct EventId(pub u64);

/// Schedules and cancels timeouts. A scheduled timeout is reported back to the owner of the
/// `Timer` with the returned id once it fires.
pub trait Scheduler: Send + Sync {
    /// Requests to schedule an event. Returns a unique ID used to cancel the scheduled event.
    fn schedule(&self, after: Duration) -> EventId;
    /// Cancels a previously scheduled event.
    fn cancel(&self, id: EventId);
}

/// A timer to schedule and cancel timeouts and retrieve triggered events.
pub struct Timer<E> {
    events: HashMap<EventId, E>,
    scheduler: Arc<dyn Scheduler>,
}

impl<E> Timer<E> {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self { events: HashMap::default(), scheduler }
    }

    pub fn triggered(&mut self, event_id: &EventId) -> Option<E> {
        self.events.remove(event_id)
    }

    pub fn schedule_after(&mut self, after: Duration, event: E) -> EventId {
        let event_id = self.scheduler.schedule(after);
        self.events.insert(event_id, event);
        event_id
    }

    pub fn cancel_event(&mut self, event_id: EventId) {
        self.events.remove(&event_id);
        self.scheduler.cancel(event_id);
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
pub use self::fake::FakeScheduler;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_cancel_event() {
        #[derive(PartialEq, Eq, Debug, Hash)]
        struct FooEvent(u8);

        let fake_scheduler = FakeScheduler::new();
        let mut timer = Timer::<FooEvent>::new(fake_scheduler.clone());
        let after = Duration::from_millis(5);

        // Verify event triggers no more than once.
        let event_id = timer.schedule_after(after, FooEvent(8));
        assert_eq!(timer.triggered(&event_id), Some(FooEvent(8)));
        assert_eq!(timer.triggered(&event_id), None);

        // Verify event does not trigger if it was canceled.
        let event_id = timer.schedule_after(after, FooEvent(9));
        timer.cancel_event(event_id);
        assert_eq!(timer.triggered(&event_id), None);
        assert_eq!(*fake_scheduler.canceled.lock(), vec![event_id]);

        // Verify multiple events can be scheduled and canceled.
        let event_id_1 = timer.schedule_after(after, FooEvent(8));
        let event_id_2 = timer.schedule_after(after, FooEvent(9));
        let event_id_3 = timer.schedule_after(after, FooEvent(10));
        timer.cancel_event(event_id_2);
        assert_eq!(timer.pending(), 2);
        assert_eq!(timer.triggered(&event_id_2), None);
        assert_eq!(timer.triggered(&event_id_3), Some(FooEvent(10)));
        assert_eq!(timer.triggered(&event_id_1), Some(FooEvent(8)));
        assert_eq!(fake_scheduler.scheduled.lock().len(), 5);
    }
}
