//! Add/edit form contract.
//!
//! The minimal logic behind a contact entry form: two mutable text inputs,
//! seeded from an existing contact when editing and empty when adding. On
//! submit, exactly one of add/update is invoked with the current values; no
//! field validation is performed. Cancelling discards the inputs without
//! touching the repository.

use crate::contact::Contact;
use crate::state::ContactStore;

/// What a submitted form will do.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FormMode {
    /// Create a new contact.
    Add,
    /// Update the contact with this id.
    Edit { id: String },
}

/// Mutable input state for adding or editing a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactForm {
    mode: FormMode,
    name: String,
    number: String,
}

impl Default for ContactForm {
    fn default() -> Self {
        Self::add()
    }
}

impl ContactForm {
    /// Create an empty form for a new contact.
    #[must_use]
    pub fn add() -> Self {
        Self {
            mode: FormMode::Add,
            name: String::new(),
            number: String::new(),
        }
    }

    /// Create a form seeded from an existing contact.
    #[must_use]
    pub fn edit(contact: &Contact) -> Self {
        Self {
            mode: FormMode::Edit {
                id: contact.id.clone(),
            },
            name: contact.name.clone(),
            number: contact.number.clone(),
        }
    }

    /// Check whether submitting will update an existing contact.
    #[must_use]
    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    /// Get the current name input.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current number input.
    #[must_use]
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Replace the name input.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Replace the number input.
    pub fn set_number(&mut self, number: impl Into<String>) {
        self.number = number.into();
    }

    /// Confirm the form, dispatching exactly one mutation to the store.
    ///
    /// Empty inputs are accepted; the whole pipeline is unvalidated. The
    /// dispatch is fire-and-forget, like every store mutation.
    pub fn submit(self, store: &ContactStore) {
        match self.mode {
            FormMode::Add => store.add_contact(self.name, self.number),
            FormMode::Edit { id } => store.update_contact(id, self.name, self.number),
        }
    }

    /// Discard the form without dispatching anything.
    pub fn cancel(self) {}
}
