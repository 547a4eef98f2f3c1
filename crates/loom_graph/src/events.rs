// SPDX-License-Identifier: MIT OR Apache-2.0
//! Synchronous fan-out event channel.
//!
//! Events are delivered to every live subscriber in publish order. Publishing
//! never blocks; receivers that have been dropped are pruned on the next
//! publish.

use std::sync::mpsc::{self, Receiver, Sender};

/// Fan-out channel handing every published event to all subscribers
#[derive(Debug)]
pub struct EventChannel<E> {
    senders: Vec<Sender<E>>,
}

impl<E: Clone> EventChannel<E> {
    /// Create a channel with no subscribers
    pub fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    /// Register a new subscriber
    pub fn subscribe(&mut self) -> Receiver<E> {
        let (tx, rx) = mpsc::channel();
        self.senders.push(tx);
        rx
    }

    /// Deliver an event to every live subscriber, returning how many got it
    pub fn publish(&mut self, event: E) -> usize {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
        self.senders.len()
    }

    /// Number of registered subscribers (including ones not yet pruned)
    pub fn subscriber_count(&self) -> usize {
        self.senders.len()
    }
}

impl<E: Clone> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_order() {
        let mut channel = EventChannel::new();
        let rx = channel.subscribe();
        channel.publish(1);
        channel.publish(2);
        channel.publish(3);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_dropped_subscriber_pruned() {
        let mut channel = EventChannel::new();
        let kept = channel.subscribe();
        let dropped = channel.subscribe();
        drop(dropped);
        assert_eq!(channel.publish("x"), 1);
        assert_eq!(channel.subscriber_count(), 1);
        assert_eq!(kept.try_recv().ok(), Some("x"));
    }
}
