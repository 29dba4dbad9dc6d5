use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::domain::{EntryId, GuarantorDetails, GuarantorEntry, GuarantorField};
use super::validators::{is_valid_email, is_valid_phone, is_valid_ssn};
use super::zip::{
    ZipApplied, ZipCandidate, ZipLookupOutcome, ZipLookupTicket, ZipSelectionError,
    ZIP_PENDING_MESSAGE,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CollectionError {
    #[error("no guarantor at position {position} (collection holds {len})")]
    PositionOutOfRange { position: usize, len: usize },
    #[error("at least one guarantor must remain on the form")]
    LastEntry,
    #[error(transparent)]
    ZipSelection(#[from] ZipSelectionError),
}

/// Inline feedback for a single input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: GuarantorField,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.wire_name(), self.message)
    }
}

/// Ordered guarantor blocks. Positions are always `1..=len` with no gaps and the
/// collection is never empty.
#[derive(Debug, Clone)]
pub struct GuarantorCollection {
    entries: Vec<GuarantorEntry>,
    next_id: u64,
}

impl Default for GuarantorCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl GuarantorCollection {
    /// A fresh form starts with one empty guarantor.
    pub fn new() -> Self {
        let mut collection = Self {
            entries: Vec::new(),
            next_id: 1,
        };
        collection.add_entry();
        collection
    }

    pub(crate) fn from_details(details: Vec<GuarantorDetails>) -> Self {
        if details.is_empty() {
            return Self::new();
        }

        let mut collection = Self {
            entries: Vec::with_capacity(details.len()),
            next_id: 1,
        };
        for values in details {
            collection.add_entry();
            if let Some(entry) = collection.entries.last_mut() {
                *entry.details_mut() = values;
            }
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GuarantorEntry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&GuarantorEntry> {
        position
            .checked_sub(1)
            .and_then(|index| self.entries.get(index))
    }

    pub fn position_of(&self, id: EntryId) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.id() == id)
            .map(GuarantorEntry::position)
    }

    /// Append an empty guarantor and return its position.
    pub fn add_entry(&mut self) -> usize {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        let position = self.entries.len() + 1;
        self.entries.push(GuarantorEntry::new(id, position));
        position
    }

    /// Remove the guarantor at `position`, closing the gap behind it.
    pub fn remove_entry(&mut self, position: usize) -> Result<GuarantorEntry, CollectionError> {
        let index = self.index_of(position)?;
        if self.entries.len() == 1 {
            return Err(CollectionError::LastEntry);
        }

        let removed = self.entries.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// Store a raw input value. A ZIP edit may hand back a lookup to run.
    pub fn set_field(
        &mut self,
        position: usize,
        field: GuarantorField,
        value: impl Into<String>,
    ) -> Result<Option<ZipLookupTicket>, CollectionError> {
        let entry = self.entry_mut(position)?;
        let id = entry.id();
        let (details, flow) = entry.zip_parts_mut();
        *details.get_mut(field) = value.into();

        match field {
            GuarantorField::Zip => Ok(flow.on_input(id, details)),
            GuarantorField::City | GuarantorField::State => {
                flow.mark_manual();
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    /// Re-run ZIP handling for every entry, e.g. after loading a saved form.
    pub fn refresh_zip_lookups(&mut self) -> Vec<ZipLookupTicket> {
        self.entries
            .iter_mut()
            .filter_map(|entry| {
                let id = entry.id();
                let (details, flow) = entry.zip_parts_mut();
                flow.on_input(id, details)
            })
            .collect()
    }

    /// Results for removed entries are treated as stale.
    pub fn apply_zip_outcome(
        &mut self,
        ticket: &ZipLookupTicket,
        outcome: ZipLookupOutcome,
    ) -> ZipApplied {
        match self.entries.iter_mut().find(|entry| entry.id() == ticket.entry) {
            Some(entry) => {
                let (details, flow) = entry.zip_parts_mut();
                flow.apply(details, ticket, outcome)
            }
            None => {
                debug!(zip = %ticket.zip(), "dropping ZIP result for removed guarantor");
                ZipApplied::Stale
            }
        }
    }

    pub fn select_zip_candidate(
        &mut self,
        position: usize,
        index: usize,
    ) -> Result<ZipCandidate, CollectionError> {
        let entry = self.entry_mut(position)?;
        let (details, flow) = entry.zip_parts_mut();
        Ok(flow.select(details, index)?)
    }

    pub fn dismiss_zip_candidates(&mut self, position: usize) -> Result<(), CollectionError> {
        let entry = self.entry_mut(position)?;
        let (_, flow) = entry.zip_parts_mut();
        flow.dismiss();
        Ok(())
    }

    /// Blur-time feedback for one input.
    pub fn field_error(
        &self,
        position: usize,
        field: GuarantorField,
    ) -> Result<Option<FieldError>, CollectionError> {
        let index = self.index_of(position)?;
        Ok(check_field(&self.entries[index], field))
    }

    pub fn entry_errors(&self, position: usize) -> Result<Vec<FieldError>, CollectionError> {
        let index = self.index_of(position)?;
        Ok(entry_errors(&self.entries[index]))
    }

    /// Every outstanding problem across the form, keyed by position.
    pub fn errors(&self) -> Vec<(usize, FieldError)> {
        self.entries
            .iter()
            .flat_map(|entry| {
                entry_errors(entry)
                    .into_iter()
                    .map(move |error| (entry.position(), error))
            })
            .collect()
    }

    /// Recomputed from scratch on every call.
    pub fn is_form_valid(&self) -> bool {
        self.entries.iter().all(|entry| {
            GuarantorField::ALL
                .into_iter()
                .all(|field| check_field(entry, field).is_none())
        })
    }

    fn index_of(&self, position: usize) -> Result<usize, CollectionError> {
        if position == 0 || position > self.entries.len() {
            return Err(CollectionError::PositionOutOfRange {
                position,
                len: self.entries.len(),
            });
        }
        Ok(position - 1)
    }

    fn entry_mut(&mut self, position: usize) -> Result<&mut GuarantorEntry, CollectionError> {
        let index = self.index_of(position)?;
        Ok(&mut self.entries[index])
    }

    fn renumber(&mut self) {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            entry.set_position(index + 1);
        }
    }
}

fn entry_errors(entry: &GuarantorEntry) -> Vec<FieldError> {
    GuarantorField::ALL
        .into_iter()
        .filter_map(|field| check_field(entry, field))
        .collect()
}

fn check_field(entry: &GuarantorEntry, field: GuarantorField) -> Option<FieldError> {
    let value = entry.value(field);
    let error = |message: String| Some(FieldError { field, message });

    if field.is_required() && value.trim().is_empty() {
        return error(format!("{} is required", field.label()));
    }

    match field {
        GuarantorField::Email if !is_valid_email(value) => {
            error("Enter a valid email address".to_string())
        }
        GuarantorField::Ssn if !is_valid_ssn(value) => {
            error("SSN must contain exactly 9 digits".to_string())
        }
        GuarantorField::Phone if !is_valid_phone(value) => {
            error("Phone number must contain at least 10 digits".to_string())
        }
        GuarantorField::Zip if entry.zip_flow().is_loading() => {
            error(ZIP_PENDING_MESSAGE.to_string())
        }
        GuarantorField::Zip => entry
            .zip_flow()
            .error_message()
            .and_then(|message| error(message.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(collection: &GuarantorCollection) -> Vec<usize> {
        collection
            .entries()
            .iter()
            .map(GuarantorEntry::position)
            .collect()
    }

    #[test]
    fn starts_with_one_entry() {
        let collection = GuarantorCollection::new();
        assert_eq!(positions(&collection), vec![1]);
        assert!(!collection.is_form_valid());
    }

    #[test]
    fn removal_closes_gaps() {
        let mut collection = GuarantorCollection::new();
        collection.add_entry();
        collection.add_entry();
        collection.add_entry();
        collection
            .set_field(3, GuarantorField::FirstName, "Grace")
            .expect("position exists");

        collection.remove_entry(2).expect("removal succeeds");

        assert_eq!(positions(&collection), vec![1, 2, 3]);
        assert_eq!(
            collection
                .get(2)
                .expect("entry present")
                .value(GuarantorField::FirstName),
            "Grace"
        );
        assert_eq!(collection.add_entry(), 4);
    }

    #[test]
    fn last_entry_cannot_be_removed() {
        let mut collection = GuarantorCollection::new();
        assert!(matches!(
            collection.remove_entry(1),
            Err(CollectionError::LastEntry)
        ));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn out_of_range_positions_are_rejected() {
        let mut collection = GuarantorCollection::new();
        assert!(matches!(
            collection.remove_entry(0),
            Err(CollectionError::PositionOutOfRange { position: 0, len: 1 })
        ));
        assert!(matches!(
            collection.set_field(2, GuarantorField::Email, "a@b.co"),
            Err(CollectionError::PositionOutOfRange { position: 2, len: 1 })
        ));
    }

    #[test]
    fn blur_feedback_matches_aggregate_validity() {
        let mut collection = GuarantorCollection::new();
        collection
            .set_field(1, GuarantorField::Email, "not-an-email")
            .expect("position exists");
        collection
            .set_field(1, GuarantorField::Phone, "555-1234")
            .expect("position exists");

        let email = collection
            .field_error(1, GuarantorField::Email)
            .expect("position exists")
            .expect("email flagged");
        assert_eq!(email.message, "Enter a valid email address");

        let phone = collection
            .field_error(1, GuarantorField::Phone)
            .expect("position exists")
            .expect("phone flagged");
        assert_eq!(phone.message, "Phone number must contain at least 10 digits");

        let first_name = collection
            .field_error(1, GuarantorField::FirstName)
            .expect("position exists")
            .expect("first name flagged");
        assert_eq!(first_name.message, "First name is required");

        assert!(collection
            .field_error(1, GuarantorField::DateOfBirth)
            .expect("position exists")
            .is_none());
        assert!(!collection.is_form_valid());
    }

    #[test]
    fn typed_city_does_not_cover_a_pending_lookup() {
        let mut collection = GuarantorCollection::new();
        for (field, value) in [
            (GuarantorField::FirstName, "Ada"),
            (GuarantorField::LastName, "Lovelace"),
            (GuarantorField::Ssn, "123456789"),
            (GuarantorField::Email, "ada@example.com"),
            (GuarantorField::StreetNumber, "100"),
            (GuarantorField::StreetName, "Locust"),
            (GuarantorField::StreetType, "St"),
            (GuarantorField::City, "Des Moines"),
            (GuarantorField::State, "IA"),
        ] {
            collection.set_field(1, field, value).expect("position exists");
        }
        let ticket = collection
            .set_field(1, GuarantorField::Zip, "50309")
            .expect("position exists")
            .expect("lookup issued");

        let zip = collection
            .field_error(1, GuarantorField::Zip)
            .expect("position exists")
            .expect("zip pending");
        assert_eq!(zip.message, ZIP_PENDING_MESSAGE);
        assert!(!collection.is_form_valid());

        collection.apply_zip_outcome(
            &ticket,
            ZipLookupOutcome::Matches(vec![ZipCandidate::new("Des Moines", "IA")]),
        );
        assert!(collection.is_form_valid());
    }

    #[test]
    fn stale_ticket_for_removed_entry_is_ignored() {
        let mut collection = GuarantorCollection::new();
        collection.add_entry();
        let ticket = collection
            .set_field(2, GuarantorField::Zip, "50309")
            .expect("position exists")
            .expect("lookup issued");

        collection.remove_entry(2).expect("removal succeeds");

        let applied = collection.apply_zip_outcome(
            &ticket,
            ZipLookupOutcome::Matches(vec![ZipCandidate::new("Des Moines", "IA")]),
        );
        assert_eq!(applied, ZipApplied::Stale);
    }

    #[test]
    fn ticket_follows_entry_across_renumbering() {
        let mut collection = GuarantorCollection::new();
        collection.add_entry();
        let ticket = collection
            .set_field(2, GuarantorField::Zip, "50309")
            .expect("position exists")
            .expect("lookup issued");

        collection.remove_entry(1).expect("removal succeeds");
        assert_eq!(collection.position_of(ticket.entry()), Some(1));

        collection.apply_zip_outcome(
            &ticket,
            ZipLookupOutcome::Matches(vec![ZipCandidate::new("Des Moines", "IA")]),
        );
        let entry = collection.get(1).expect("entry present");
        assert_eq!(entry.value(GuarantorField::City), "Des Moines");
    }
}
