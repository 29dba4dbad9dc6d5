use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::gateway::ZipLookupResponse;
use super::validators::digits_only;
use super::zip::{ZipCandidate, ZIP_LOOKUP_DIGITS};

#[derive(Debug)]
pub enum ZipDirectoryError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ZipDirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZipDirectoryError::Io(err) => write!(f, "failed to read ZIP directory: {}", err),
            ZipDirectoryError::Csv(err) => write!(f, "invalid ZIP directory CSV data: {}", err),
        }
    }
}

impl std::error::Error for ZipDirectoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ZipDirectoryError::Io(err) => Some(err),
            ZipDirectoryError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ZipDirectoryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ZipDirectoryError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// In-memory ZIP → city/state table, loaded from a `zip,city,state,county` CSV.
#[derive(Debug, Clone, Default)]
pub struct ZipDirectory {
    entries: BTreeMap<String, Vec<ZipCandidate>>,
}

impl ZipDirectory {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ZipDirectoryError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ZipDirectoryError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut directory = Self::default();

        for record in csv_reader.deserialize::<ZipRow>() {
            let row = record?;
            let Some(zip) = normalize_zip(&row.zip) else {
                continue;
            };
            directory.insert(
                zip,
                ZipCandidate {
                    city: row.city,
                    state: row.state,
                    county: row.county,
                },
            );
        }

        Ok(directory)
    }

    /// Small built-in table used by the demo and the sandbox when no CSV is given.
    pub fn sample() -> Self {
        let mut directory = Self::default();
        directory.insert(
            "50309".to_string(),
            ZipCandidate::new("Des Moines", "IA").with_county("Polk"),
        );
        directory.insert(
            "52240".to_string(),
            ZipCandidate::new("Iowa City", "IA").with_county("Johnson"),
        );
        directory.insert(
            "42223".to_string(),
            ZipCandidate::new("Fort Campbell", "KY").with_county("Christian"),
        );
        directory.insert(
            "42223".to_string(),
            ZipCandidate::new("Fort Campbell", "TN").with_county("Montgomery"),
        );
        directory
    }

    pub fn insert(&mut self, zip: String, candidate: ZipCandidate) {
        self.entries.entry(zip).or_default().push(candidate);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, zip: &str) -> &[ZipCandidate] {
        normalize_zip(zip)
            .and_then(|key| self.entries.get(&key))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Answer in the shape the remote lookup endpoint uses.
    pub fn response_for(&self, zip: &str) -> ZipLookupResponse {
        let results = self.lookup(zip).to_vec();
        let message = results
            .is_empty()
            .then(|| format!("No matches for ZIP {}", zip.trim()));
        ZipLookupResponse {
            success: true,
            results: Some(results),
            message,
        }
    }
}

/// First five digits; shorter values are left-padded since spreadsheets drop leading zeros.
fn normalize_zip(raw: &str) -> Option<String> {
    let digits = digits_only(raw);
    match digits.len() {
        0 => None,
        len if len < ZIP_LOOKUP_DIGITS => Some(format!("{digits:0>5}")),
        _ => Some(digits[..ZIP_LOOKUP_DIGITS].to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct ZipRow {
    zip: String,
    city: String,
    state: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    county: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
