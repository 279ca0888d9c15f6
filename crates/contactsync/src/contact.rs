//! Core contact types for contactsync.
//!
//! This module defines the typed domain model that raw remote documents are
//! projected into.

use serde::{Deserialize, Serialize};

use crate::remote::RawDocument;

/// Field key for a contact's display name.
pub const FIELD_NAME: &str = "name";

/// Field key for a contact's phone number.
pub const FIELD_NUMBER: &str = "number";

/// A single contact record.
///
/// The `id` is assigned exclusively by the remote collection service upon
/// creation; an empty `id` denotes a contact that has not been persisted yet.
/// Contacts are value-equal by all three fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Opaque server-assigned identifier. Empty until persisted.
    pub id: String,

    /// Display name. Free-form, unvalidated.
    pub name: String,

    /// Phone number. Free-form, unvalidated.
    pub number: String,
}

/// An ordered sequence of contacts.
///
/// Order is the arrival order from the most recent snapshot push. The remote
/// service does not promise stable ordering across pushes, so reordering on
/// every change is expected behavior.
pub type ContactList = Vec<Contact>;

impl Contact {
    /// Create a contact that has not been persisted yet.
    ///
    /// The id is left empty; it is assigned by the remote service and becomes
    /// visible through the next snapshot push.
    #[must_use]
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            number: number.into(),
        }
    }

    /// Check whether this contact carries a server-assigned id.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    /// Project a raw remote document into a contact.
    ///
    /// Missing `name`/`number` fields default to the empty string; projection
    /// never fails.
    #[must_use]
    pub fn from_document(doc: &RawDocument) -> Self {
        Self {
            id: doc.id.clone(),
            name: doc.field(FIELD_NAME).unwrap_or_default(),
            number: doc.field(FIELD_NUMBER).unwrap_or_default(),
        }
    }
}

impl std::fmt::Display for Contact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_contact_new_has_empty_id() {
        let contact = Contact::new("Ana", "555-1");
        assert_eq!(contact.id, "");
        assert_eq!(contact.name, "Ana");
        assert_eq!(contact.number, "555-1");
        assert!(!contact.is_persisted());
    }

    #[test]
    fn test_contact_is_persisted() {
        let mut contact = Contact::new("Bo", "1");
        assert!(!contact.is_persisted());

        contact.id = "doc-1".to_string();
        assert!(contact.is_persisted());
    }

    #[test]
    fn test_contact_value_equality() {
        let a = Contact {
            id: "x1".to_string(),
            name: "Ana".to_string(),
            number: "555-1".to_string(),
        };
        let b = a.clone();
        assert_eq!(a, b);

        let mut c = a.clone();
        c.number = "555-2".to_string();
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_document() {
        let mut fields = HashMap::new();
        fields.insert(FIELD_NAME.to_string(), "Ana".to_string());
        fields.insert(FIELD_NUMBER.to_string(), "555-1".to_string());
        let doc = RawDocument {
            id: "x1".to_string(),
            fields,
        };

        let contact = Contact::from_document(&doc);
        assert_eq!(contact.id, "x1");
        assert_eq!(contact.name, "Ana");
        assert_eq!(contact.number, "555-1");
    }

    #[test]
    fn test_from_document_missing_fields_default_to_empty() {
        let doc = RawDocument {
            id: "x2".to_string(),
            fields: HashMap::new(),
        };

        let contact = Contact::from_document(&doc);
        assert_eq!(contact.id, "x2");
        assert_eq!(contact.name, "");
        assert_eq!(contact.number, "");
    }

    #[test]
    fn test_from_document_ignores_extra_fields() {
        let mut fields = HashMap::new();
        fields.insert(FIELD_NAME.to_string(), "Bo".to_string());
        fields.insert("favorite".to_string(), "true".to_string());
        let doc = RawDocument {
            id: "x3".to_string(),
            fields,
        };

        let contact = Contact::from_document(&doc);
        assert_eq!(contact.name, "Bo");
        assert_eq!(contact.number, "");
    }

    #[test]
    fn test_contact_display() {
        let contact = Contact::new("Ana", "555-1");
        assert_eq!(contact.to_string(), "Ana <555-1>");
    }

    #[test]
    fn test_contact_serialization() {
        let contact = Contact {
            id: "x1".to_string(),
            name: "Ana".to_string(),
            number: "555-1".to_string(),
        };

        let json = serde_json::to_string(&contact).unwrap();
        let deserialized: Contact = serde_json::from_str(&json).unwrap();
        assert_eq!(contact, deserialized);
    }
}
