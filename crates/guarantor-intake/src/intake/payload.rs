//! Canonical submission shape.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

use super::collection::GuarantorCollection;
use super::domain::{GuarantorDetails, GuarantorEntry};

/// Body posted to the processing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub token: String,
    pub guarantors: Vec<NormalizedGuarantor>,
}

/// A trimmed guarantor. Empty optional inputs are left out of the JSON entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedGuarantor {
    pub first_name: String,
    pub last_name: String,
    pub ssn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// `None` omits the key; `Some(None)` is an explicit `null` for unparseable input.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub ownership_pct: Option<Option<Number>>,
    pub street_number: String,
    pub street_name: String,
    pub street_type: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl NormalizedGuarantor {
    pub fn from_details(details: &GuarantorDetails) -> Self {
        let ownership = details.ownership_pct.trim();

        Self {
            first_name: details.first_name.trim().to_string(),
            last_name: details.last_name.trim().to_string(),
            ssn: details.ssn.trim().to_string(),
            date_of_birth: non_empty(&details.date_of_birth),
            email: details.email.trim().to_string(),
            phone: non_empty(&details.phone),
            ownership_pct: (!ownership.is_empty()).then(|| parse_number(ownership)),
            street_number: details.street_number.trim().to_string(),
            street_name: details.street_name.trim().to_string(),
            street_type: details.street_type.trim().to_string(),
            city: details.city.trim().to_string(),
            state: details.state.trim().to_string(),
            zip: details.zip.trim().to_string(),
        }
    }
}

/// Snapshot a collection into a payload. Performs no validation and never fails.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    token: String,
}

impl PayloadBuilder {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn build(&self, collection: &GuarantorCollection) -> SubmissionPayload {
        let mut entries: Vec<&GuarantorEntry> = collection.entries().iter().collect();
        entries.sort_by_key(|entry| entry.position());

        SubmissionPayload {
            token: self.token.clone(),
            guarantors: entries
                .into_iter()
                .map(|entry| NormalizedGuarantor::from_details(entry.details()))
                .collect(),
        }
    }
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Whole numbers come out as JSON integers so `"25"` serializes as `25`.
/// Unsigned `0x`/`0o`/`0b` literals are read in their radix, as browsers do.
fn parse_number(raw: &str) -> Option<Number> {
    if let Some(value) = parse_radix_literal(raw) {
        return value.map(Number::from);
    }

    let value: f64 = raw.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        return Some(Number::from(value as i64));
    }
    Number::from_f64(value)
}

/// `None` when `raw` carries no radix prefix; `Some(None)` when the digits are invalid.
fn parse_radix_literal(raw: &str) -> Option<Option<u64>> {
    let prefix = raw.get(..2)?.to_ascii_lowercase();
    let radix = match prefix.as_str() {
        "0x" => 16,
        "0o" => 8,
        "0b" => 2,
        _ => return None,
    };
    let digits = &raw[2..];
    if digits.starts_with('+') {
        return Some(None);
    }
    Some(u64::from_str_radix(digits, radix).ok())
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<Number>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Number>::deserialize(deserializer).map(Some)
}
