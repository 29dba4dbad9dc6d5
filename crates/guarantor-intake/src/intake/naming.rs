//! `guarantors[<index>][<field>]` input naming.
//!
//! Indices on the wire are zero-based and may arrive sparse or out of order
//! (a block removed in the page leaves a hole); decoding always yields a
//! collection renumbered from 1.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::collection::GuarantorCollection;
use super::domain::{GuarantorDetails, GuarantorField};

static FIELD_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^guarantors\[(\d+)\]\[([^\]]+)\]$").expect("field key pattern compiles")
});

pub fn field_name(index: usize, field: GuarantorField) -> String {
    format!("guarantors[{index}][{}]", field.wire_name())
}

/// Split a key into its zero-based index and raw field name.
pub fn parse_field_name(key: &str) -> Option<(usize, &str)> {
    let captures = FIELD_KEY_RE.captures(key)?;
    let index = captures.get(1)?.as_str().parse().ok()?;
    let name = captures.get(2)?.as_str();
    Some((index, name))
}

impl GuarantorCollection {
    pub fn from_form_fields<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut by_index: BTreeMap<usize, GuarantorDetails> = BTreeMap::new();

        for (key, value) in pairs {
            let key = key.as_ref();
            let Some((index, name)) = parse_field_name(key) else {
                debug!(key, "skipping form key outside guarantor naming");
                continue;
            };
            let Some(field) = GuarantorField::from_wire_name(name) else {
                debug!(key, "skipping unknown guarantor field");
                continue;
            };
            *by_index.entry(index).or_default().get_mut(field) = value.into();
        }

        Self::from_details(by_index.into_values().collect())
    }

    pub fn to_form_fields(&self) -> Vec<(String, String)> {
        self.entries()
            .iter()
            .flat_map(|entry| {
                let index = entry.position() - 1;
                GuarantorField::ALL
                    .into_iter()
                    .map(move |field| (field_name(index, field), entry.value(field).to_string()))
            })
            .collect()
    }
}
