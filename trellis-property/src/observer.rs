//! Ordered observer lists with RAII subscriptions.
//!
//! # Invariants
//!
//! - Handlers run synchronously in subscription order.
//! - The list is snapshotted before handlers run, so a handler may subscribe
//!   or unsubscribe without deadlocking; changes apply to the next emission.
//! - Dropping a [`Subscription`] removes its handler before the next emission.

use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::RwLock;
use smallvec::SmallVec;

type Handler<A> = Arc<dyn Fn(&A) + Send + Sync>;

struct HandlerListInner<A: ?Sized> {
    next_id: AtomicU64,
    handlers: RwLock<SmallVec<[(u64, Handler<A>); 4]>>,
}

impl<A: ?Sized> HandlerListInner<A> {
    fn remove(&self, id: u64) {
        self.handlers.write().retain(|(handler_id, _)| *handler_id != id);
    }
}

/// Ordered list of event handlers receiving `&A`.
pub struct HandlerList<A: ?Sized> {
    inner: Arc<HandlerListInner<A>>,
}

impl<A: ?Sized + 'static> HandlerList<A> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HandlerListInner {
                next_id: AtomicU64::new(1),
                handlers: RwLock::new(SmallVec::new()),
            }),
        }
    }

    /// Append a handler. It stays registered until the returned guard drops.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.handlers.write().push((id, Arc::new(handler)));

        let weak: Weak<HandlerListInner<A>> = Arc::downgrade(&self.inner);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.remove(id);
                }
            })),
        }
    }

    /// Invoke every handler with `args`, in subscription order.
    pub fn emit(&self, args: &A) {
        let handlers: SmallVec<[Handler<A>; 4]> = self
            .inner
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(args);
        }
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.inner.handlers.read().len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: ?Sized + 'static> Default for HandlerList<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard returned by [`HandlerList::subscribe`].
///
/// The handler is removed when the guard is dropped.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Keep the handler registered for the lifetime of the list.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.unsubscribe.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::HandlerList;

    #[test]
    fn handlers_run_in_subscription_order() {
        let list = HandlerList::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let log = log.clone();
            list.subscribe(move |value| log.lock().push(("first", *value)))
        };
        let second = {
            let log = log.clone();
            list.subscribe(move |value| log.lock().push(("second", *value)))
        };

        list.emit(&7);
        assert_eq!(*log.lock(), vec![("first", 7), ("second", 7)]);

        drop(first);
        list.emit(&8);
        assert_eq!(log.lock().last(), Some(&("second", 8)));
        assert_eq!(list.len(), 1);
        drop(second);
        assert!(list.is_empty());
    }

    #[test]
    fn detached_subscription_stays_registered() {
        let list = HandlerList::<()>::new();
        list.subscribe(|_| {}).detach();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn handler_may_subscribe_during_emit() {
        let list = Arc::new(HandlerList::<()>::new());
        let nested = Arc::new(Mutex::new(Vec::new()));

        let _outer = {
            let list_for_handler = list.clone();
            let nested = nested.clone();
            list.subscribe(move |_| {
                nested.lock().push(list_for_handler.subscribe(|_| {}));
            })
        };

        list.emit(&());
        assert_eq!(list.len(), 2);
    }
}
