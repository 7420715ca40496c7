// SPDX-License-Identifier: MIT
use std::sync::{Mutex, PoisonError};

/// Single-slot, latest-value-wins handoff between threads.
///
/// `put` never blocks on the consumer: an unconsumed value is replaced.
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Mailbox<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Stores `value`, returning `true` if it replaced one nobody took.
    pub fn put(&self, value: T) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.replace(value).is_some()
    }

    pub fn take(&self) -> Option<T> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn keeps_only_latest() {
        let mailbox = Mailbox::new();
        assert!(!mailbox.put(1));
        assert!(mailbox.put(2));
        assert!(mailbox.put(3));
        assert_eq!(mailbox.take(), Some(3));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn consumer_on_other_thread_sees_last_value() {
        let mailbox = Arc::new(Mailbox::new());
        let producer = Arc::clone(&mailbox);
        thread::spawn(move || {
            for i in 0..100 {
                producer.put(i);
            }
        })
        .join()
        .unwrap();
        assert_eq!(mailbox.take(), Some(99));
    }
}
