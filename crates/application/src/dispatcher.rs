//! Domain event dispatcher with an explicit dispatch table.

use std::collections::HashMap;
use std::sync::Arc;

use domain::{reducer, DomainEvent, EventKind};
use thiserror::Error;

use crate::unit_of_work::UnitOfWork;

/// Upper bound on drain/publish passes per save.
///
/// Handlers may record new events on tracked aggregates, so the loop runs
/// until the unit of work settles. A cascade that never settles is a
/// programming defect; the bound turns it into an error instead of a hang.
pub const MAX_DISPATCH_PASSES: usize = 100;

/// An in-process subscriber invoked synchronously during save.
///
/// Subscribers run inside the same unit of work as the aggregate change
/// that produced the event: anything they append commits atomically with
/// it, and any failure fails the whole save.
pub trait EventSubscriber: Send + Sync {
    /// Subscriber name, used in error and log messages.
    fn name(&self) -> &'static str;

    /// Reacts to a single published event.
    fn handle(
        &self,
        event: &DomainEvent,
        uow: &mut UnitOfWork,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Errors produced while dispatching domain events.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Handlers kept producing new events past the pass bound.
    #[error("domain event cascade did not settle after {passes} dispatch passes")]
    CascadeOverflow { passes: usize },

    /// A subscriber rejected an event, failing the save.
    #[error("subscriber '{subscriber}' failed on {event_type}: {source}")]
    Subscriber {
        subscriber: &'static str,
        event_type: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Publishes drained domain events to registered subscribers.
///
/// The dispatch table is built once at startup and injected wherever a save
/// happens; there is no process-wide registry.
pub struct EventDispatcher {
    table: HashMap<EventKind, Vec<Arc<dyn EventSubscriber>>>,
}

impl EventDispatcher {
    /// Starts building a dispatch table.
    pub fn builder() -> EventDispatcherBuilder {
        EventDispatcherBuilder {
            table: HashMap::new(),
        }
    }

    /// Returns how many subscribers are registered for an event kind.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.table.get(&kind).map_or(0, Vec::len)
    }

    /// Drains, reduces, and publishes events until the unit of work settles.
    ///
    /// Runs as part of "save changes", before the store commit:
    /// 1. collect pending events from every tracked aggregate, clearing the
    ///    buffers immediately,
    /// 2. reduce the batch,
    /// 3. publish each event in sequence to its subscribers,
    /// 4. repeat while publication produced new events.
    pub fn dispatch(&self, uow: &mut UnitOfWork) -> Result<(), DispatchError> {
        let mut passes = 0;

        while uow.has_pending_events() {
            passes += 1;
            if passes > MAX_DISPATCH_PASSES {
                return Err(DispatchError::CascadeOverflow {
                    passes: MAX_DISPATCH_PASSES,
                });
            }

            let batch = reducer::reduce(uow.drain_events());

            for event in batch {
                tracing::debug!(event_type = event.event_type(), "publishing domain event");

                if let Some(subscribers) = self.table.get(&event.kind()) {
                    for subscriber in subscribers {
                        subscriber.handle(&event, uow).map_err(|source| {
                            DispatchError::Subscriber {
                                subscriber: subscriber.name(),
                                event_type: event.event_type(),
                                source,
                            }
                        })?;
                    }
                }

                metrics::counter!("domain_events_published").increment(1);
            }
        }

        Ok(())
    }
}

/// Builder for [`EventDispatcher`].
pub struct EventDispatcherBuilder {
    table: HashMap<EventKind, Vec<Arc<dyn EventSubscriber>>>,
}

impl EventDispatcherBuilder {
    /// Registers a subscriber for an event kind.
    ///
    /// Subscribers for the same kind are invoked in registration order.
    pub fn subscribe(mut self, kind: EventKind, subscriber: Arc<dyn EventSubscriber>) -> Self {
        self.table.entry(kind).or_default().push(subscriber);
        self
    }

    /// Finishes the table.
    pub fn build(self) -> EventDispatcher {
        EventDispatcher { table: self.table }
    }
}
