use super::common::*;

use serde_json::json;

use crate::intake::domain::GuarantorField;
use crate::intake::form::{
    BannerKind, FormError, FormPhase, IntakeForm, SubmissionOutcome, CONFIRMATION_TITLE,
    DEFAULT_SUCCESS_MESSAGE, MISSING_TOKEN_MESSAGE, NETWORK_FAILURE_MESSAGE,
};

async fn ready_form(gateway: &ScriptedGateway) -> IntakeForm {
    let mut form = IntakeForm::new(Some(token()));
    fill_person(&mut form, 1, "Ada");
    let ticket = form
        .set_field(1, GuarantorField::Zip, "50309")
        .expect("position exists")
        .expect("lookup issued");
    form.resolve_zip(gateway, ticket).await;
    form
}

#[tokio::test]
async fn valid_single_guarantor_submits_trimmed_payload() {
    let gateway = ScriptedGateway::default().with_zip("50309", vec![des_moines()]);
    let mut form = ready_form(&gateway).await;
    assert!(form.is_form_valid());
    assert!(form.can_submit());

    let outcome = form.submit(&gateway).await.expect("submission runs");
    assert_eq!(outcome, SubmissionOutcome::Accepted);

    let submitted = gateway.submitted();
    assert_eq!(submitted.len(), 1);
    let body = serde_json::to_value(&submitted[0]).expect("payload serializes");
    assert_eq!(
        body,
        json!({
            "token": "tok-7f3a",
            "guarantors": [{
                "firstName": "Ada",
                "lastName": "Lovelace",
                "ssn": "123-45-6789",
                "email": "ada@example.com",
                "streetNumber": "100",
                "streetName": "Locust",
                "streetType": "St",
                "city": "Des Moines",
                "state": "IA",
                "zip": "50309"
            }]
        })
    );

    assert_eq!(form.phase(), FormPhase::Confirmed);
    assert!(form.collection().is_none());
    let banner = form.banner().expect("banner shown");
    assert_eq!(banner.kind, BannerKind::Ok);
    assert_eq!(banner.message, DEFAULT_SUCCESS_MESSAGE);
    assert_eq!(
        form.confirmation().expect("confirmation shown").title,
        CONFIRMATION_TITLE
    );
    assert_eq!(form.add_guarantor(), Err(FormError::Closed));
}

#[test]
fn missing_token_disables_submission() {
    let mut form = IntakeForm::new(None);
    let banner = form.banner().expect("banner shown");
    assert_eq!(banner.kind, BannerKind::Error);
    assert_eq!(banner.message, MISSING_TOKEN_MESSAGE);
    assert!(!form.can_submit());
    assert_eq!(form.begin_submission(), Err(FormError::MissingToken));
}

#[tokio::test]
async fn only_one_submission_in_flight() {
    let gateway = ScriptedGateway::default().with_zip("50309", vec![des_moines()]);
    let mut form = ready_form(&gateway).await;

    form.begin_submission().expect("first submission starts");
    assert!(!form.can_submit());
    assert_eq!(form.begin_submission(), Err(FormError::SubmissionInFlight));
}

#[tokio::test]
async fn server_rejection_surfaces_message_and_allows_retry() {
    let gateway = ScriptedGateway::default().with_zip("50309", vec![des_moines()]);
    let mut form = ready_form(&gateway).await;

    gateway.queue_reply(200, false, Some("Token expired"));
    let outcome = form.submit(&gateway).await.expect("submission runs");
    assert_eq!(outcome, SubmissionOutcome::Rejected);
    assert_eq!(form.banner().expect("banner").message, "Token expired");
    assert_eq!(form.phase(), FormPhase::Editing);
    assert!(form.can_submit());

    let outcome = form.submit(&gateway).await.expect("retry runs");
    assert_eq!(outcome, SubmissionOutcome::Accepted);

    let submitted = gateway.submitted();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0], submitted[1]);
}

#[tokio::test]
async fn http_failure_without_message_uses_status_text() {
    let gateway = ScriptedGateway::default().with_zip("50309", vec![des_moines()]);
    let mut form = ready_form(&gateway).await;

    gateway.queue_reply(503, true, None);
    form.submit(&gateway).await.expect("submission runs");
    assert_eq!(
        form.banner().expect("banner").message,
        "Submission failed (HTTP 503). Please try again or contact support."
    );
}

#[tokio::test]
async fn transport_failure_keeps_entries_for_retry() {
    let gateway = ScriptedGateway::default().with_zip("50309", vec![des_moines()]);
    let mut form = ready_form(&gateway).await;

    gateway.queue_transport_failure();
    form.submit(&gateway).await.expect("submission runs");

    assert_eq!(form.banner().expect("banner").message, NETWORK_FAILURE_MESSAGE);
    let entry = form.collection().expect("form open").get(1).expect("entry");
    assert_eq!(entry.value(GuarantorField::FirstName), "Ada");
    assert!(form.can_submit());
}

#[tokio::test]
async fn invalid_form_refuses_to_start() {
    let gateway = ScriptedGateway::default().with_zip("50309", vec![des_moines()]);
    let mut form = ready_form(&gateway).await;
    form.set_field(1, GuarantorField::Ssn, "12345678")
        .expect("position exists");

    assert!(!form.can_submit());
    assert_eq!(form.begin_submission(), Err(FormError::Invalid(1)));
    assert!(gateway.submitted().is_empty());
}

#[tokio::test]
async fn removing_a_guarantor_revalidates_the_form() {
    let gateway = ScriptedGateway::default().with_zip("50309", vec![des_moines()]);
    let mut form = ready_form(&gateway).await;

    let position = form.add_guarantor().expect("form open");
    assert_eq!(position, 2);
    assert!(!form.is_form_valid());

    form.remove_guarantor(2).expect("removal succeeds");
    assert!(form.is_form_valid());
}

#[test]
fn finishing_without_submission_is_rejected() {
    let mut form = IntakeForm::new(Some(token()));
    assert_eq!(
        form.finish_submission(Err(crate::intake::gateway::GatewayError::Transport(
            "x".to_string()
        ))),
        Err(FormError::NoSubmissionInFlight)
    );
}
