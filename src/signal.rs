//! Change-notification plumbing: a minimal mpsc fan-out.
//!
//! Mutating components own a [`Notifier`]; interested parties call
//! [`Notifier::subscribe`] and poll the returned receiver (typically once per
//! frame). Dropping the receiver unsubscribes: dead channels are pruned on
//! the next emit.

use std::sync::mpsc::{channel, Receiver, Sender};

/// Fan-out of cloneable notification values to any number of subscribers.
pub struct Notifier<T> {
    listeners: Vec<Sender<T>>,
}

impl<T: Clone> Notifier<T> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Register a new subscriber. The receiver gets every value emitted
    /// after this call.
    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = channel();
        self.listeners.push(tx);
        rx
    }

    /// Send `value` to all live subscribers, pruning closed channels.
    pub fn emit(&mut self, value: T) {
        self.listeners.retain(|tx| tx.send(value.clone()).is_ok());
    }

    pub fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }
}

impl<T: Clone> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_every_emit() {
        let mut n: Notifier<u32> = Notifier::new();
        let rx = n.subscribe();
        n.emit(1);
        n.emit(2);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn dropped_receiver_is_pruned() {
        let mut n: Notifier<u32> = Notifier::new();
        let rx1 = n.subscribe();
        let rx2 = n.subscribe();
        drop(rx1);
        n.emit(7);
        assert!(n.has_listeners());
        assert_eq!(rx2.try_iter().count(), 1);
    }
}
