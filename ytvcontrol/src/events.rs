use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

use crate::model::PlaybackEvent;

#[derive(Clone, Default)]
pub(crate) struct PlaybackEventBus {
    subscribers: Arc<Mutex<Vec<Sender<PlaybackEvent>>>>,
}

impl PlaybackEventBus {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn subscribe(&self) -> Receiver<PlaybackEvent> {
        let (tx, rx) = unbounded::<PlaybackEvent>();
        self.subscribers.lock().push(tx);
        rx
    }

    pub(crate) fn broadcast(&self, event: PlaybackEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
