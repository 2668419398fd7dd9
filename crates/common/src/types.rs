use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a book copy.
///
/// Wraps a UUID to provide type safety and prevent mixing up
/// book identifiers with other UUID-based identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(Uuid);

impl BookId {
    /// Creates a new random book ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a book ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true for the all-zero UUID.
    ///
    /// A nil identifier never refers to a stored row and is rejected by the
    /// aggregates as an invalid argument.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for BookId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<BookId> for Uuid {
    fn from(id: BookId) -> Self {
        id.0
    }
}

/// Unique identifier of a registered abonent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbonentId(Uuid);

impl AbonentId {
    /// Creates a new random abonent ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an abonent ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true for the all-zero UUID.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for AbonentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AbonentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for AbonentId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<AbonentId> for Uuid {
    fn from(id: AbonentId) -> Self {
        id.0
    }
}

/// Unique identifier of a statistics outbox record.
///
/// Assigned by the producer side so that an insert retried after a partial
/// failure lands on the same row instead of duplicating the delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(Uuid);

impl ChangeId {
    /// Creates a new random change ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a change ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ChangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ChangeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ChangeId> for Uuid {
    fn from(id: ChangeId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_id_new_creates_unique_ids() {
        let id1 = BookId::new();
        let id2 = BookId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn book_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = BookId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn nil_id_is_detected() {
        let id = AbonentId::from_uuid(Uuid::nil());
        assert!(id.is_nil());
        assert!(!AbonentId::new().is_nil());
    }

    #[test]
    fn id_serialization_roundtrip() {
        let id = ChangeId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: ChangeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
