//! ZIP-driven city/state autofill.
//!
//! Each entry owns a [`ZipFlow`]. Typing a ZIP with at least five digits starts
//! a lookup and hands out a [`ZipLookupTicket`] stamped with the flow's current
//! generation. Any later edit bumps the generation, so a ticket that comes back
//! after a newer lookup was started is dropped no matter when it arrives.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{EntryId, GuarantorDetails};
use super::gateway::{GatewayError, ZipLookupResponse};
use super::validators::digits_only;

pub const ZIP_LOOKUP_DIGITS: usize = 5;
pub const ZIP_NOT_FOUND_MESSAGE: &str = "ZIP code not found";
pub const ZIP_PENDING_MESSAGE: &str = "Looking up ZIP code";

/// A city/state pair a ZIP code may resolve to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipCandidate {
    pub city: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
}

impl ZipCandidate {
    pub fn new(city: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: state.into(),
            county: None,
        }
    }

    pub fn with_county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ZipLookupState {
    #[default]
    Idle,
    Loading,
    ResolvedSingle(ZipCandidate),
    ResolvedMultiple(Vec<ZipCandidate>),
    NotFound,
    /// Same user-facing result as `NotFound`; keeps the transport diagnostic.
    Failed(String),
}

impl ZipLookupState {
    pub const fn label(&self) -> &'static str {
        match self {
            ZipLookupState::Idle => "idle",
            ZipLookupState::Loading => "loading",
            ZipLookupState::ResolvedSingle(_) => "resolved_single",
            ZipLookupState::ResolvedMultiple(_) => "resolved_multiple",
            ZipLookupState::NotFound => "not_found",
            ZipLookupState::Failed(_) => "failed",
        }
    }
}

/// Handle for one in-flight lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipLookupTicket {
    pub(crate) entry: EntryId,
    pub(crate) generation: u64,
    pub(crate) zip: String,
}

impl ZipLookupTicket {
    pub fn entry(&self) -> EntryId {
        self.entry
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The five digits sent to the lookup service.
    pub fn zip(&self) -> &str {
        &self.zip
    }
}

/// What a lookup produced, before it is applied to a flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZipLookupOutcome {
    Matches(Vec<ZipCandidate>),
    Unavailable(String),
}

impl ZipLookupOutcome {
    pub fn from_response(result: Result<ZipLookupResponse, GatewayError>) -> Self {
        match result {
            Ok(response) if response.success => {
                ZipLookupOutcome::Matches(response.results.unwrap_or_default())
            }
            Ok(response) => ZipLookupOutcome::Unavailable(
                response
                    .message
                    .unwrap_or_else(|| "lookup service reported failure".to_string()),
            ),
            Err(err) => ZipLookupOutcome::Unavailable(err.to_string()),
        }
    }
}

/// Result of handing a completed ticket back to its flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZipApplied {
    Applied,
    Stale,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ZipSelectionError {
    #[error("no ZIP candidates are waiting for a selection")]
    NothingToSelect,
    #[error("candidate {index} is out of range ({available} available)")]
    OutOfRange { index: usize, available: usize },
}

/// Per-entry ZIP resolution state.
#[derive(Debug, Clone, Default)]
pub struct ZipFlow {
    state: ZipLookupState,
    generation: u64,
    lookup_key: Option<String>,
    autofilled: bool,
}

impl ZipFlow {
    pub fn state(&self) -> &ZipLookupState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Candidates waiting for the user to pick one. Empty otherwise.
    pub fn candidates(&self) -> &[ZipCandidate] {
        match &self.state {
            ZipLookupState::ResolvedMultiple(candidates) => candidates,
            _ => &[],
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(
            self.state,
            ZipLookupState::NotFound | ZipLookupState::Failed(_)
        )
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.is_unresolved().then_some(ZIP_NOT_FOUND_MESSAGE)
    }

    pub fn is_loading(&self) -> bool {
        self.state == ZipLookupState::Loading
    }

    /// City/state were typed by the user rather than filled from a lookup.
    pub(crate) fn mark_manual(&mut self) {
        self.autofilled = false;
    }

    /// React to the ZIP input changing. `details.zip` must already hold the new value.
    pub(crate) fn on_input(
        &mut self,
        entry: EntryId,
        details: &mut GuarantorDetails,
    ) -> Option<ZipLookupTicket> {
        let digits = digits_only(&details.zip);

        if digits.len() < ZIP_LOOKUP_DIGITS {
            self.generation += 1;
            self.lookup_key = None;
            self.state = ZipLookupState::Idle;
            self.clear_autofill(details);
            return None;
        }

        let key = digits[..ZIP_LOOKUP_DIGITS].to_string();
        if self.lookup_key.as_deref() == Some(key.as_str()) {
            return None;
        }

        self.generation += 1;
        self.lookup_key = Some(key.clone());
        self.state = ZipLookupState::Loading;
        self.clear_autofill(details);

        Some(ZipLookupTicket {
            entry,
            generation: self.generation,
            zip: key,
        })
    }

    /// An unresolved answer forgets the key so the same ZIP can be looked up again.
    pub(crate) fn apply(
        &mut self,
        details: &mut GuarantorDetails,
        ticket: &ZipLookupTicket,
        outcome: ZipLookupOutcome,
    ) -> ZipApplied {
        if ticket.generation != self.generation {
            debug!(
                zip = %ticket.zip,
                ticket = ticket.generation,
                current = self.generation,
                "dropping superseded ZIP lookup result"
            );
            return ZipApplied::Stale;
        }

        self.state = match outcome {
            ZipLookupOutcome::Matches(mut candidates) => match candidates.len() {
                0 => {
                    self.lookup_key = None;
                    self.clear_location(details);
                    ZipLookupState::NotFound
                }
                1 => {
                    let candidate = candidates.remove(0);
                    self.fill(details, &candidate);
                    ZipLookupState::ResolvedSingle(candidate)
                }
                _ => {
                    self.clear_autofill(details);
                    ZipLookupState::ResolvedMultiple(candidates)
                }
            },
            ZipLookupOutcome::Unavailable(reason) => {
                self.lookup_key = None;
                self.clear_location(details);
                ZipLookupState::Failed(reason)
            }
        };

        ZipApplied::Applied
    }

    pub(crate) fn select(
        &mut self,
        details: &mut GuarantorDetails,
        index: usize,
    ) -> Result<ZipCandidate, ZipSelectionError> {
        let candidates = match &self.state {
            ZipLookupState::ResolvedMultiple(candidates) => candidates,
            _ => return Err(ZipSelectionError::NothingToSelect),
        };

        let chosen = candidates
            .get(index)
            .cloned()
            .ok_or(ZipSelectionError::OutOfRange {
                index,
                available: candidates.len(),
            })?;

        self.fill(details, &chosen);
        self.state = ZipLookupState::ResolvedSingle(chosen.clone());
        Ok(chosen)
    }

    /// Close the candidate list without choosing. Re-entering the ZIP triggers a new lookup.
    pub(crate) fn dismiss(&mut self) {
        if matches!(self.state, ZipLookupState::ResolvedMultiple(_)) {
            self.state = ZipLookupState::Idle;
            self.lookup_key = None;
        }
    }

    fn fill(&mut self, details: &mut GuarantorDetails, candidate: &ZipCandidate) {
        details.city = candidate.city.clone();
        details.state = candidate.state.clone();
        self.autofilled = true;
    }

    fn clear_autofill(&mut self, details: &mut GuarantorDetails) {
        if self.autofilled {
            self.clear_location(details);
        }
    }

    /// An unresolvable ZIP wipes city/state regardless of who typed them.
    fn clear_location(&mut self, details: &mut GuarantorDetails) {
        details.city.clear();
        details.state.clear();
        self.autofilled = false;
    }
}
