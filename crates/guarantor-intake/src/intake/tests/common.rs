use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::intake::domain::GuarantorField;
use crate::intake::form::IntakeForm;
use crate::intake::gateway::{
    GatewayError, IntakeGateway, SubmissionReply, SubmissionResponse, ZipLookupResponse,
};
use crate::intake::payload::SubmissionPayload;
use crate::intake::token::AccessToken;
use crate::intake::zip::ZipCandidate;

/// Scripted gateway: ZIP answers come from a table, submission replies from a queue.
#[derive(Default, Clone)]
pub(super) struct ScriptedGateway {
    zips: Arc<Mutex<HashMap<String, Result<Vec<ZipCandidate>, String>>>>,
    replies: Arc<Mutex<VecDeque<Result<SubmissionReply, String>>>>,
    submitted: Arc<Mutex<Vec<SubmissionPayload>>>,
}

impl ScriptedGateway {
    pub(super) fn with_zip(self, zip: &str, candidates: Vec<ZipCandidate>) -> Self {
        self.zips
            .lock()
            .expect("zip table poisoned")
            .insert(zip.to_string(), Ok(candidates));
        self
    }

    pub(super) fn with_broken_zip(self, zip: &str) -> Self {
        self.zips
            .lock()
            .expect("zip table poisoned")
            .insert(zip.to_string(), Err("connection reset".to_string()));
        self
    }

    pub(super) fn queue_reply(&self, status: u16, success: bool, message: Option<&str>) {
        self.replies
            .lock()
            .expect("reply queue poisoned")
            .push_back(Ok(SubmissionReply {
                status,
                body: Some(SubmissionResponse {
                    success,
                    message: message.map(str::to_string),
                }),
            }));
    }

    pub(super) fn queue_transport_failure(&self) {
        self.replies
            .lock()
            .expect("reply queue poisoned")
            .push_back(Err("connection refused".to_string()));
    }

    pub(super) fn submitted(&self) -> Vec<SubmissionPayload> {
        self.submitted.lock().expect("submissions poisoned").clone()
    }
}

impl IntakeGateway for ScriptedGateway {
    async fn lookup_zip(&self, zip: &str) -> Result<ZipLookupResponse, GatewayError> {
        let table = self.zips.lock().expect("zip table poisoned");
        match table.get(zip) {
            Some(Ok(candidates)) => Ok(ZipLookupResponse {
                success: true,
                results: Some(candidates.clone()),
                message: None,
            }),
            Some(Err(reason)) => Err(GatewayError::Transport(reason.clone())),
            None => Ok(ZipLookupResponse {
                success: true,
                results: None,
                message: None,
            }),
        }
    }

    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReply, GatewayError> {
        self.submitted
            .lock()
            .expect("submissions poisoned")
            .push(payload.clone());
        let next = self
            .replies
            .lock()
            .expect("reply queue poisoned")
            .pop_front();
        match next {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(reason)) => Err(GatewayError::Transport(reason)),
            None => Ok(SubmissionReply {
                status: 200,
                body: Some(SubmissionResponse {
                    success: true,
                    message: None,
                }),
            }),
        }
    }
}

pub(super) fn token() -> AccessToken {
    AccessToken::new("tok-7f3a").expect("token is valid")
}

pub(super) fn des_moines() -> ZipCandidate {
    ZipCandidate::new("Des Moines", "IA").with_county("Polk")
}

pub(super) fn fort_campbell() -> Vec<ZipCandidate> {
    vec![
        ZipCandidate::new("Fort Campbell", "KY").with_county("Christian"),
        ZipCandidate::new("Fort Campbell", "TN").with_county("Montgomery"),
    ]
}

/// Fill every required field except ZIP (city/state come from the lookup).
pub(super) fn fill_person(form: &mut IntakeForm, position: usize, first_name: &str) {
    for (field, value) in [
        (GuarantorField::FirstName, first_name),
        (GuarantorField::LastName, "Lovelace"),
        (GuarantorField::Ssn, "123-45-6789"),
        (GuarantorField::Email, "ada@example.com"),
        (GuarantorField::StreetNumber, "100"),
        (GuarantorField::StreetName, "Locust"),
        (GuarantorField::StreetType, "St"),
    ] {
        form.set_field(position, field, value)
            .expect("position exists");
    }
}
