//! Guarantor intake: form state, validation, ZIP autofill and the submission payload.

pub mod collection;
pub mod directory;
pub mod domain;
pub mod form;
pub mod gateway;
pub mod naming;
pub mod payload;
pub mod token;
pub mod validators;
pub mod zip;

#[cfg(test)]
mod tests;

pub use collection::{CollectionError, FieldError, GuarantorCollection};
pub use directory::{ZipDirectory, ZipDirectoryError};
pub use domain::{EntryId, GuarantorDetails, GuarantorEntry, GuarantorField};
pub use form::{
    run_zip_lookup, Banner, BannerKind, Confirmation, FormError, FormPhase, IntakeForm,
    SubmissionOutcome, ZipLookupCompletion,
};
pub use gateway::{
    GatewayError, HttpIntakeGateway, IntakeGateway, SubmissionReply, SubmissionResponse,
    ZipLookupResponse,
};
pub use naming::{field_name, parse_field_name};
pub use payload::{NormalizedGuarantor, PayloadBuilder, SubmissionPayload};
pub use token::{AccessToken, TokenError};
pub use validators::{digits_only, is_valid_email, is_valid_phone, is_valid_ssn};
pub use zip::{
    ZipApplied, ZipCandidate, ZipFlow, ZipLookupOutcome, ZipLookupState, ZipLookupTicket,
    ZipSelectionError,
};
