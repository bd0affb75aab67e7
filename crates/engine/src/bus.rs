//! Invalidation bus shared by the caching decorators of one factory.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::debug;

/// Receiver of "the store changed" notifications.
pub trait Invalidate: Send + Sync {
    fn on_invalidate(&self);
}

/// Publish/subscribe channel for cache invalidation.
///
/// Subscribers are held weakly: a caching decorator that is dropped together with its proxy simply
/// stops receiving notifications and is pruned on the next publish or subscribe.
#[derive(Default)]
pub struct InvalidationBus {
    subscribers: RwLock<Vec<Weak<dyn Invalidate>>>,
}

impl InvalidationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscriber: Weak<dyn Invalidate>) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|existing| existing.strong_count() > 0);
        subscribers.push(subscriber);
    }

    /// Notifies every live subscriber.
    pub fn publish(&self) {
        let (live, known) = {
            let subscribers = self.subscribers.read();
            let live: Vec<Arc<dyn Invalidate>> = subscribers.iter().filter_map(Weak::upgrade).collect();
            (live, subscribers.len())
        };
        if live.len() != known {
            self.subscribers.write().retain(|existing| existing.strong_count() > 0);
        }
        debug!(subscribers = live.len(), pruned = known - live.len(), "publishing invalidation");
        for subscriber in live {
            subscriber.on_invalidate();
        }
    }

    /// Number of subscribers that are still alive.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().iter().filter(|existing| existing.strong_count() > 0).count()
    }
}

impl std::fmt::Debug for InvalidationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
