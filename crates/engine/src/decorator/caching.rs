use std::sync::{
    Arc, Weak,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::RwLock;
use tracing::trace;

use crate::{
    bus::{Invalidate, InvalidationBus},
    error::ConfigError,
    resolver::{SharedResolver, ValueResolver},
    value::Value,
};

const COMPUTED: u64 = 1;

/// Memoizes the first successful result of the inner resolver, `Null` included.
///
/// `state` packs a generation counter (upper bits) with the computed flag (lowest bit). An
/// invalidation bumps the generation and clears the flag in one step. A computation only publishes
/// its result when the generation it started from is still current, so an invalidation racing a
/// computation costs at most one stale return and the next `resolve` reads through again.
/// Errors are not cached.
pub struct CachingResolver {
    inner: SharedResolver,
    state: AtomicU64,
    slot: RwLock<Value>,
}

impl CachingResolver {
    pub fn new(inner: SharedResolver) -> Self {
        Self {
            inner,
            state: AtomicU64::new(0),
            slot: RwLock::new(Value::Null),
        }
    }

    /// Builds a caching decorator that is invalidated by `bus`.
    pub fn subscribed(inner: SharedResolver, bus: &InvalidationBus) -> Arc<Self> {
        let caching = Arc::new(Self::new(inner));
        let subscriber: Weak<dyn Invalidate> = Arc::downgrade(&caching) as Weak<dyn Invalidate>;
        bus.subscribe(subscriber);
        caching
    }

    pub fn is_computed(&self) -> bool {
        self.state.load(Ordering::Acquire) & COMPUTED == COMPUTED
    }

    /// Stores `value` unless the cache was invalidated since `started` was observed.
    fn publish(&self, started: u64, value: &Value) {
        let mut slot = self.slot.write();
        // Other writers hold the slot lock; only an invalidation can move `state` from here on.
        if self.state.load(Ordering::Acquire) != started {
            trace!(key = %self.inner.key_to_lookup(), "discarding value computed before invalidation");
            return;
        }
        *slot = value.clone();
        if self
            .state
            .compare_exchange(started, started | COMPUTED, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            trace!(key = %self.inner.key_to_lookup(), "invalidated while publishing");
        }
    }
}

impl ValueResolver for CachingResolver {
    fn resolve(&self) -> Result<Value, ConfigError> {
        let started = self.state.load(Ordering::Acquire);
        if started & COMPUTED == COMPUTED {
            trace!(key = %self.inner.key_to_lookup(), "cache hit");
            return Ok(self.slot.read().clone());
        }
        trace!(key = %self.inner.key_to_lookup(), "cache miss");
        let value = self.inner.resolve()?;
        self.publish(started, &value);
        Ok(value)
    }

    fn convert_default_value(&self, raw: &str) -> Result<Value, ConfigError> {
        self.inner.convert_default_value(raw)
    }

    fn key_to_lookup(&self) -> String {
        self.inner.key_to_lookup()
    }
}

impl Invalidate for CachingResolver {
    fn on_invalidate(&self) {
        trace!(key = %self.inner.key_to_lookup(), "cache invalidated");
        // `(s | 1) + 1` is the next even value: new generation, flag cleared.
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| Some((state | COMPUTED).wrapping_add(1)));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize};

    use super::*;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl ValueResolver for Counting {
        fn resolve(&self) -> Result<Value, ConfigError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(if call == 0 { Value::Null } else { Value::I64(call as i64) })
        }

        fn convert_default_value(&self, _raw: &str) -> Result<Value, ConfigError> {
            Ok(Value::Null)
        }

        fn key_to_lookup(&self) -> String {
            "counter".into()
        }
    }

    #[test]
    fn caches_null_until_invalidated() {
        let inner = Arc::new(Counting::default());
        let bus = InvalidationBus::new();
        let caching = CachingResolver::subscribed(inner.clone(), &bus);

        assert_eq!(caching.resolve().expect("first"), Value::Null);
        assert_eq!(caching.resolve().expect("cached"), Value::Null);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        bus.publish();
        assert!(!caching.is_computed());
        assert_eq!(caching.resolve().expect("recomputed"), Value::I64(1));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropped_decorator_leaves_the_bus() {
        let bus = InvalidationBus::new();
        let caching = CachingResolver::subscribed(Arc::new(Counting::default()), &bus);
        assert_eq!(bus.subscriber_count(), 1);
        drop(caching);
        assert_eq!(bus.subscriber_count(), 0);
    }

    /// Reads a shared cell; optionally changes it and publishes while the read is in flight.
    struct Racing {
        store: Arc<AtomicI64>,
        bus: Arc<InvalidationBus>,
        change_during_read: AtomicBool,
        calls: AtomicUsize,
    }

    impl ValueResolver for Racing {
        fn resolve(&self) -> Result<Value, ConfigError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let value = self.store.load(Ordering::SeqCst);
            if self.change_during_read.swap(false, Ordering::SeqCst) {
                self.store.store(value + 1, Ordering::SeqCst);
                self.bus.publish();
            }
            Ok(Value::I64(value))
        }

        fn convert_default_value(&self, _raw: &str) -> Result<Value, ConfigError> {
            Ok(Value::Null)
        }

        fn key_to_lookup(&self) -> String {
            "racing".into()
        }
    }

    fn racing(change_during_read: bool) -> (Arc<Racing>, Arc<InvalidationBus>) {
        let bus = Arc::new(InvalidationBus::new());
        let inner = Arc::new(Racing {
            store: Arc::new(AtomicI64::new(1)),
            bus: Arc::clone(&bus),
            change_during_read: AtomicBool::new(change_during_read),
            calls: AtomicUsize::new(0),
        });
        (inner, bus)
    }

    #[test]
    fn invalidation_during_computation_is_not_lost() {
        let (inner, bus) = racing(true);
        let caching = CachingResolver::subscribed(inner.clone(), &bus);

        assert_eq!(caching.resolve().expect("first"), Value::I64(1));
        assert!(!caching.is_computed());

        assert_eq!(caching.resolve().expect("second"), Value::I64(2));
        assert_eq!(caching.resolve().expect("cached"), Value::I64(2));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_readers_never_see_an_unwritten_slot_and_settle_on_the_latest_value() {
        const UPDATES: i64 = 500;
        let (inner, bus) = racing(false);
        let caching = CachingResolver::subscribed(inner.clone(), &bus);
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    while !done.load(Ordering::SeqCst) {
                        match caching.resolve().expect("resolve") {
                            Value::I64(value) => assert!((1..=UPDATES + 1).contains(&value)),
                            other => panic!("read an unwritten slot: {other:?}"),
                        }
                    }
                });
            }
            scope.spawn(|| {
                for _ in 0..UPDATES {
                    inner.store.fetch_add(1, Ordering::SeqCst);
                    bus.publish();
                }
                done.store(true, Ordering::SeqCst);
            });
        });

        assert_eq!(caching.resolve().expect("settled"), Value::I64(UPDATES + 1));
        assert_eq!(caching.resolve().expect("cached"), Value::I64(UPDATES + 1));
    }
}
