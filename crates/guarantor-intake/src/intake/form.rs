//! One live intake form: token, guarantor blocks, ZIP flows and submission state.
//!
//! The form is owned by a single task and mutated through `&mut self`; the only
//! suspension points are gateway calls. ZIP lookups can be driven concurrently
//! by taking tickets out of [`IntakeForm::set_field`], running them with
//! [`run_zip_lookup`] and feeding completions back in any order.

use tracing::{info, warn};

use super::collection::{CollectionError, GuarantorCollection};
use super::domain::GuarantorField;
use super::gateway::{GatewayError, IntakeGateway, SubmissionReply};
use super::payload::{PayloadBuilder, SubmissionPayload};
use super::token::AccessToken;
use super::zip::{ZipApplied, ZipCandidate, ZipLookupOutcome, ZipLookupTicket};

pub const MISSING_TOKEN_MESSAGE: &str =
    "Missing token. Please use the secure link from your email.";
pub const NETWORK_FAILURE_MESSAGE: &str =
    "Unable to submit due to a network issue. Please try again. If it continues, contact support.";
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Submitted successfully. You may close this page.";
pub const CONFIRMATION_TITLE: &str = "Submission Received";
pub const CONFIRMATION_HINT: &str = "Thank you. Your information has been submitted successfully.";

fn http_failure_message(status: u16) -> String {
    format!("Submission failed (HTTP {status}). Please try again or contact support.")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Ok,
    Error,
}

/// Form-level message shown above the guarantor blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Ok,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Editing,
    Submitting,
    Confirmed,
}

/// Text that replaces the form once the endpoint accepted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub title: &'static str,
    pub hint: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted,
    Rejected,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormError {
    #[error("missing access token")]
    MissingToken,
    #[error("form has {0} outstanding field error(s)")]
    Invalid(usize),
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("no submission is in flight")]
    NoSubmissionInFlight,
    #[error("form was already submitted")]
    Closed,
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

/// Completed lookup waiting to be applied to its form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipLookupCompletion {
    pub ticket: ZipLookupTicket,
    pub outcome: ZipLookupOutcome,
}

/// Run one ticket against the gateway without touching the form.
pub async fn run_zip_lookup<G: IntakeGateway>(
    gateway: &G,
    ticket: ZipLookupTicket,
) -> ZipLookupCompletion {
    info!(zip = %ticket.zip(), "looking up ZIP");
    let result = gateway.lookup_zip(ticket.zip()).await;
    if let Err(err) = &result {
        warn!(zip = %ticket.zip(), error = %err, "ZIP lookup failed");
    }
    ZipLookupCompletion {
        ticket,
        outcome: ZipLookupOutcome::from_response(result),
    }
}

#[derive(Debug)]
pub struct IntakeForm {
    token: Option<AccessToken>,
    collection: Option<GuarantorCollection>,
    phase: FormPhase,
    banner: Option<Banner>,
}

impl IntakeForm {
    /// Without a token the form still renders but can never be submitted.
    pub fn new(token: Option<AccessToken>) -> Self {
        Self::with_collection(token, GuarantorCollection::new())
    }

    pub fn with_collection(token: Option<AccessToken>, collection: GuarantorCollection) -> Self {
        let banner = token
            .is_none()
            .then(|| Banner::error(MISSING_TOKEN_MESSAGE));

        Self {
            token,
            collection: Some(collection),
            phase: FormPhase::Editing,
            banner,
        }
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// `None` once the form has been torn down after a successful submission.
    pub fn collection(&self) -> Option<&GuarantorCollection> {
        self.collection.as_ref()
    }

    pub fn confirmation(&self) -> Option<Confirmation> {
        (self.phase == FormPhase::Confirmed).then_some(Confirmation {
            title: CONFIRMATION_TITLE,
            hint: CONFIRMATION_HINT,
        })
    }

    pub fn add_guarantor(&mut self) -> Result<usize, FormError> {
        Ok(self.editable()?.add_entry())
    }

    pub fn remove_guarantor(&mut self, position: usize) -> Result<(), FormError> {
        self.editable()?.remove_entry(position)?;
        Ok(())
    }

    pub fn set_field(
        &mut self,
        position: usize,
        field: GuarantorField,
        value: impl Into<String>,
    ) -> Result<Option<ZipLookupTicket>, FormError> {
        Ok(self.editable()?.set_field(position, field, value)?)
    }

    pub fn refresh_zip_lookups(&mut self) -> Result<Vec<ZipLookupTicket>, FormError> {
        Ok(self.editable()?.refresh_zip_lookups())
    }

    pub fn apply_zip_completion(&mut self, completion: ZipLookupCompletion) -> ZipApplied {
        match self.collection.as_mut() {
            Some(collection) => {
                collection.apply_zip_outcome(&completion.ticket, completion.outcome)
            }
            None => ZipApplied::Stale,
        }
    }

    /// Look up and apply in one step.
    pub async fn resolve_zip<G: IntakeGateway>(
        &mut self,
        gateway: &G,
        ticket: ZipLookupTicket,
    ) -> ZipApplied {
        let completion = run_zip_lookup(gateway, ticket).await;
        self.apply_zip_completion(completion)
    }

    pub fn select_zip_candidate(
        &mut self,
        position: usize,
        index: usize,
    ) -> Result<ZipCandidate, FormError> {
        Ok(self.editable()?.select_zip_candidate(position, index)?)
    }

    pub fn dismiss_zip_candidates(&mut self, position: usize) -> Result<(), FormError> {
        Ok(self.editable()?.dismiss_zip_candidates(position)?)
    }

    pub fn is_form_valid(&self) -> bool {
        self.collection
            .as_ref()
            .is_some_and(GuarantorCollection::is_form_valid)
    }

    /// State of the submit control.
    pub fn can_submit(&self) -> bool {
        self.token.is_some() && self.phase == FormPhase::Editing && self.is_form_valid()
    }

    /// Snapshot the payload and lock the submit control until the reply is in.
    pub fn begin_submission(&mut self) -> Result<SubmissionPayload, FormError> {
        match self.phase {
            FormPhase::Submitting => return Err(FormError::SubmissionInFlight),
            FormPhase::Confirmed => return Err(FormError::Closed),
            FormPhase::Editing => {}
        }
        let token = self.token.as_ref().ok_or(FormError::MissingToken)?;
        let collection = self.collection.as_ref().ok_or(FormError::Closed)?;

        let errors = collection.errors();
        if !errors.is_empty() {
            return Err(FormError::Invalid(errors.len()));
        }

        let payload = PayloadBuilder::new(token.as_str()).build(collection);
        self.banner = None;
        self.phase = FormPhase::Submitting;
        info!(guarantors = payload.guarantors.len(), "submission started");
        Ok(payload)
    }

    /// Apply the endpoint's answer. Failures re-enable submission with entries intact.
    pub fn finish_submission(
        &mut self,
        result: Result<SubmissionReply, GatewayError>,
    ) -> Result<SubmissionOutcome, FormError> {
        if self.phase != FormPhase::Submitting {
            return Err(FormError::NoSubmissionInFlight);
        }

        let outcome = match result {
            Ok(reply) if reply.is_success() => {
                let message = reply.message().unwrap_or(DEFAULT_SUCCESS_MESSAGE);
                self.banner = Some(Banner::ok(message));
                self.collection = None;
                self.phase = FormPhase::Confirmed;
                info!(status = reply.status, "submission accepted");
                SubmissionOutcome::Accepted
            }
            Ok(reply) => {
                let message = reply
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| http_failure_message(reply.status));
                warn!(status = reply.status, %message, "submission rejected");
                self.banner = Some(Banner::error(message));
                self.phase = FormPhase::Editing;
                SubmissionOutcome::Rejected
            }
            Err(err) => {
                warn!(error = %err, "submission transport failure");
                self.banner = Some(Banner::error(NETWORK_FAILURE_MESSAGE));
                self.phase = FormPhase::Editing;
                SubmissionOutcome::Rejected
            }
        };

        Ok(outcome)
    }

    pub async fn submit<G: IntakeGateway>(
        &mut self,
        gateway: &G,
    ) -> Result<SubmissionOutcome, FormError> {
        let payload = self.begin_submission()?;
        let result = gateway.submit(&payload).await;
        self.finish_submission(result)
    }

    fn editable(&mut self) -> Result<&mut GuarantorCollection, FormError> {
        self.collection.as_mut().ok_or(FormError::Closed)
    }
}
