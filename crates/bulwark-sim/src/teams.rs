//! Team membership notifications.
//!
//! Subscribers hold the receiving end of a channel; a subscriber that has
//! dropped its receiver is pruned on the next publish.

use std::sync::mpsc::{channel, Receiver, Sender};

use bulwark_core::events::TeamEvent;

#[derive(Debug, Default)]
pub struct TeamBus {
    subscribers: Vec<Sender<TeamEvent>>,
}

impl TeamBus {
    pub fn subscribe(&mut self) -> Receiver<TeamEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, event: TeamEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
