use serde::{Deserialize, Serialize};

use super::zip::ZipFlow;

/// Stable identity of an entry inside one collection. Survives renumbering so
/// late asynchronous results still reach the entry that requested them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u64);

/// Every input a guarantor block carries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GuarantorField {
    FirstName,
    LastName,
    Ssn,
    DateOfBirth,
    Email,
    Phone,
    OwnershipPct,
    StreetNumber,
    StreetName,
    StreetType,
    City,
    State,
    Zip,
}

impl GuarantorField {
    pub const ALL: [GuarantorField; 13] = [
        GuarantorField::FirstName,
        GuarantorField::LastName,
        GuarantorField::Ssn,
        GuarantorField::DateOfBirth,
        GuarantorField::Email,
        GuarantorField::Phone,
        GuarantorField::OwnershipPct,
        GuarantorField::StreetNumber,
        GuarantorField::StreetName,
        GuarantorField::StreetType,
        GuarantorField::City,
        GuarantorField::State,
        GuarantorField::Zip,
    ];

    /// Name used on the wire and inside `guarantors[i][...]` keys.
    pub const fn wire_name(self) -> &'static str {
        match self {
            GuarantorField::FirstName => "firstName",
            GuarantorField::LastName => "lastName",
            GuarantorField::Ssn => "ssn",
            GuarantorField::DateOfBirth => "dateOfBirth",
            GuarantorField::Email => "email",
            GuarantorField::Phone => "phone",
            GuarantorField::OwnershipPct => "ownershipPct",
            GuarantorField::StreetNumber => "streetNumber",
            GuarantorField::StreetName => "streetName",
            GuarantorField::StreetType => "streetType",
            GuarantorField::City => "city",
            GuarantorField::State => "state",
            GuarantorField::Zip => "zip",
        }
    }

    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.wire_name() == name)
    }

    pub const fn label(self) -> &'static str {
        match self {
            GuarantorField::FirstName => "First name",
            GuarantorField::LastName => "Last name",
            GuarantorField::Ssn => "SSN",
            GuarantorField::DateOfBirth => "Date of birth",
            GuarantorField::Email => "Email",
            GuarantorField::Phone => "Phone",
            GuarantorField::OwnershipPct => "Ownership %",
            GuarantorField::StreetNumber => "Street number",
            GuarantorField::StreetName => "Street name",
            GuarantorField::StreetType => "Street type",
            GuarantorField::City => "City",
            GuarantorField::State => "State",
            GuarantorField::Zip => "ZIP code",
        }
    }

    pub const fn is_required(self) -> bool {
        !matches!(
            self,
            GuarantorField::DateOfBirth | GuarantorField::Phone | GuarantorField::OwnershipPct
        )
    }
}

/// Raw, user-entered values for one guarantor. Nothing here is normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuarantorDetails {
    pub first_name: String,
    pub last_name: String,
    pub ssn: String,
    pub date_of_birth: String,
    pub email: String,
    pub phone: String,
    pub ownership_pct: String,
    pub street_number: String,
    pub street_name: String,
    pub street_type: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl GuarantorDetails {
    pub fn get(&self, field: GuarantorField) -> &str {
        match field {
            GuarantorField::FirstName => &self.first_name,
            GuarantorField::LastName => &self.last_name,
            GuarantorField::Ssn => &self.ssn,
            GuarantorField::DateOfBirth => &self.date_of_birth,
            GuarantorField::Email => &self.email,
            GuarantorField::Phone => &self.phone,
            GuarantorField::OwnershipPct => &self.ownership_pct,
            GuarantorField::StreetNumber => &self.street_number,
            GuarantorField::StreetName => &self.street_name,
            GuarantorField::StreetType => &self.street_type,
            GuarantorField::City => &self.city,
            GuarantorField::State => &self.state,
            GuarantorField::Zip => &self.zip,
        }
    }

    pub(crate) fn get_mut(&mut self, field: GuarantorField) -> &mut String {
        match field {
            GuarantorField::FirstName => &mut self.first_name,
            GuarantorField::LastName => &mut self.last_name,
            GuarantorField::Ssn => &mut self.ssn,
            GuarantorField::DateOfBirth => &mut self.date_of_birth,
            GuarantorField::Email => &mut self.email,
            GuarantorField::Phone => &mut self.phone,
            GuarantorField::OwnershipPct => &mut self.ownership_pct,
            GuarantorField::StreetNumber => &mut self.street_number,
            GuarantorField::StreetName => &mut self.street_name,
            GuarantorField::StreetType => &mut self.street_type,
            GuarantorField::City => &mut self.city,
            GuarantorField::State => &mut self.state,
            GuarantorField::Zip => &mut self.zip,
        }
    }
}

/// One guarantor block as it sits in the form.
#[derive(Debug, Clone)]
pub struct GuarantorEntry {
    id: EntryId,
    position: usize,
    details: GuarantorDetails,
    zip_flow: ZipFlow,
}

impl GuarantorEntry {
    pub(crate) fn new(id: EntryId, position: usize) -> Self {
        Self {
            id,
            position,
            details: GuarantorDetails::default(),
            zip_flow: ZipFlow::default(),
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    /// 1-based display position.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn details(&self) -> &GuarantorDetails {
        &self.details
    }

    pub fn value(&self, field: GuarantorField) -> &str {
        self.details.get(field)
    }

    pub fn zip_flow(&self) -> &ZipFlow {
        &self.zip_flow
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    pub(crate) fn details_mut(&mut self) -> &mut GuarantorDetails {
        &mut self.details
    }

    pub(crate) fn zip_parts_mut(&mut self) -> (&mut GuarantorDetails, &mut ZipFlow) {
        (&mut self.details, &mut self.zip_flow)
    }
}
