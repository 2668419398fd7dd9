//! Abonent aggregate implementation.

use chrono::{DateTime, Utc};
use common::AbonentId;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::event::DomainEvent;

use super::{AbonentError, AbonentName, Email};

/// A registered library patron able to borrow books.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Abonent {
    /// Unique abonent identifier.
    id: AbonentId,

    /// Abonent name.
    name: AbonentName,

    /// Unique email address.
    email: Email,

    /// When the abonent registered.
    created_at: DateTime<Utc>,

    /// Pending domain events, drained by the dispatcher.
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

impl Entity for Abonent {
    fn pending_events(&self) -> &[DomainEvent] {
        &self.events
    }

    fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Abonent {
    /// Registers a new abonent and records `AbonentRegistered`.
    pub fn new(
        id: AbonentId,
        name: AbonentName,
        email: Email,
        created_at: DateTime<Utc>,
    ) -> Result<Self, AbonentError> {
        if id.is_nil() {
            return Err(AbonentError::InvalidId);
        }

        Ok(Self {
            id,
            name,
            email,
            created_at,
            events: vec![DomainEvent::abonent_registered(id)],
        })
    }

    /// Reconstructs an abonent from persisted state without recording events.
    pub fn hydrate(
        id: AbonentId,
        name: AbonentName,
        email: Email,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            created_at,
            events: Vec::new(),
        }
    }

    /// Returns the abonent identifier.
    pub fn id(&self) -> AbonentId {
        self.id
    }

    /// Returns the abonent name.
    pub fn name(&self) -> &AbonentName {
        &self.name
    }

    /// Returns the email.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Returns when the abonent registered.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
