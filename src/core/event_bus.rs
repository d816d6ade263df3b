//! Typed publish/subscribe channel for timetable notifications.
//!
//! - Handlers subscribe per event type and run synchronously inside `emit()`
//! - Every emitted event is also queued; `poll()` drains the queue for hosts
//!   that prefer to process notifications in their own loop
//!
//! Handler order is FIFO within one event type. Events of different types
//! are delivered in emission order only through the queue.

use log::warn;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Maximum events in queue before oldest are evicted
const MAX_QUEUE_SIZE: usize = 1000;

/// Marker trait for events. Events must be Send + Sync + 'static.
pub trait Event: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

type Callback = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Boxed event for queue storage
pub type BoxedEvent = Box<dyn Event>;

#[derive(Default)]
struct Shared {
    subscribers: RwLock<HashMap<TypeId, Vec<Callback>>>,
    queue: Mutex<Vec<BoxedEvent>>,
}

impl Shared {
    fn dispatch<E: Event + Clone>(&self, event: E) {
        // Clone the handler list so a handler may subscribe without deadlocking.
        let handlers: Vec<Callback> = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<E>())
            .cloned()
            .unwrap_or_default();
        for cb in &handlers {
            cb(&event);
        }

        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if queue.len() >= MAX_QUEUE_SIZE {
            let evict_count = queue.len() / 2;
            warn!("EventBus queue full ({} events), evicting oldest {}", queue.len(), evict_count);
            queue.drain(0..evict_count);
        }
        queue.push(Box::new(event));
    }
}

/// Pub/Sub event bus owned by one timetable.
#[derive(Clone, Default)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field(
                "queued",
                &self.shared.queue.lock().unwrap_or_else(|e| e.into_inner()).len(),
            )
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events of type E.
    ///
    /// ```ignore
    /// timetable.events().subscribe::<ChangeEvent, _>(|e| {
    ///     println!("moved to {}", e.position);
    /// });
    /// ```
    pub fn subscribe<E, F>(&self, callback: F)
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let wrapped: Callback = Arc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                callback(event);
            }
        });
        self.shared
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(TypeId::of::<E>())
            .or_default()
            .push(wrapped);
    }

    /// Invoke handlers for E immediately, then queue the event.
    pub fn emit<E: Event + Clone>(&self, event: E) {
        self.shared.dispatch(event);
    }

    /// Drain all queued events.
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.shared.queue.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// Downcast a queued event to its concrete type.
///
/// Derefs to `dyn Event` first; calling `as_any()` on the `Box` itself
/// would hit the blanket impl for `Box<dyn Event>` and never match.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[derive(Clone, Debug)]
    struct Moved {
        by: i32,
    }

    #[derive(Clone, Debug)]
    struct Clicked;

    #[test]
    fn test_subscribe_emit_immediate() {
        let bus = EventBus::new();
        let total = Arc::new(AtomicI32::new(0));
        let t = Arc::clone(&total);
        bus.subscribe::<Moved, _>(move |e| {
            t.fetch_add(e.by, Ordering::SeqCst);
        });

        bus.emit(Moved { by: 10 });
        assert_eq!(total.load(Ordering::SeqCst), 10);
        bus.emit(Moved { by: 5 });
        assert_eq!(total.load(Ordering::SeqCst), 15);
    }

    #[test]
    fn test_queue_keeps_emission_order() {
        let bus = EventBus::new();
        bus.emit(Moved { by: 1 });
        bus.emit(Clicked);
        bus.emit(Moved { by: 2 });

        let events = bus.poll();
        assert_eq!(events.len(), 3);
        assert!(downcast_event::<Moved>(&events[0]).is_some());
        assert!(downcast_event::<Clicked>(&events[1]).is_some());
        assert_eq!(downcast_event::<Moved>(&events[2]).map(|m| m.by), Some(2));
        assert!(bus.poll().is_empty());
    }

    #[test]
    fn test_handler_may_subscribe_during_emit() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicI32::new(0));
        let inner_bus = bus.clone();
        let h = Arc::clone(&hits);
        bus.subscribe::<Clicked, _>(move |_| {
            let h = Arc::clone(&h);
            inner_bus.subscribe::<Moved, _>(move |e| {
                h.fetch_add(e.by, Ordering::SeqCst);
            });
        });

        bus.emit(Clicked);
        bus.emit(Moved { by: 3 });
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(bus.poll().len(), 2);
    }
}
