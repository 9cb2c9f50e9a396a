//! Invigilator profiles and their experience back-references.

use super::{AssignmentDomainError, InvigilatorId, LedgerEntryId, SchoolId};
use serde::{Deserialize, Serialize};

/// A teacher eligible to supervise exam sessions.
///
/// The profile's experience list is a non-owning index into the ledger:
/// entry lifetime belongs to the cascade coordinator, which prunes these
/// references whenever it deletes entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvigilatorProfile {
    id: InvigilatorId,
    name: String,
    email: Option<String>,
    home_school: SchoolId,
    experience: Vec<LedgerEntryId>,
}

impl InvigilatorProfile {
    /// Creates a new invigilator profile.
    ///
    /// # Errors
    ///
    /// Returns [`AssignmentDomainError::EmptyInvigilatorName`] when the name
    /// is empty after trimming.
    pub fn new(
        name: impl Into<String>,
        home_school: SchoolId,
    ) -> Result<Self, AssignmentDomainError> {
        let raw = name.into();
        if raw.trim().is_empty() {
            return Err(AssignmentDomainError::EmptyInvigilatorName);
        }
        Ok(Self {
            id: InvigilatorId::new(),
            name: raw,
            email: None,
            home_school,
            experience: Vec::new(),
        })
    }

    /// Sets the contact email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Returns the invigilator identifier.
    #[must_use]
    pub const fn id(&self) -> InvigilatorId {
        self.id
    }

    /// Returns the invigilator's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the contact email address, if any.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the invigilator's home school.
    #[must_use]
    pub const fn home_school(&self) -> SchoolId {
        self.home_school
    }

    /// Returns the ledger entries recording past assignments.
    #[must_use]
    pub fn experience(&self) -> &[LedgerEntryId] {
        &self.experience
    }

    /// Appends a ledger entry reference after an allocation commit.
    pub fn record_experience(&mut self, entry: LedgerEntryId) {
        if !self.experience.contains(&entry) {
            self.experience.push(entry);
        }
    }

    /// Drops references to ledger entries a cascade is deleting.
    pub fn prune_experience(&mut self, deleted: &[LedgerEntryId]) {
        self.experience.retain(|entry| !deleted.contains(entry));
    }
}
