//! Donor and patient records.
//!
//! Records are flat and persisted as JSON objects with camelCase field names.
//! The blood group is kept as its label so that a record written with an
//! unrecognised group still loads; such a record simply counts toward no
//! balance.

use std::fmt;

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::blood_group::BloodGroup;

/// Which collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Blood donors.
    Donor,
    /// Patients receiving blood.
    Patient,
}

impl RecordKind {
    /// The key-value slot holding this collection.
    #[must_use]
    pub fn slot_key(self) -> &'static str {
        match self {
            Self::Donor => "donors",
            Self::Patient => "patients",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Donor => write!(f, "donor"),
            Self::Patient => write!(f, "patient"),
        }
    }
}

/// Common view over donors and patients.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// The collection this record type lives in.
    const KIND: RecordKind;

    /// Unique id within the collection.
    fn id(&self) -> u64;

    /// Display name.
    fn name(&self) -> &str;

    /// Blood group label as stored.
    fn blood_group_label(&self) -> &str;

    /// Units donated or requested.
    fn units(&self) -> u32;

    /// The parsed blood group, or `None` for an unrecognised label.
    fn blood_group(&self) -> Option<BloodGroup> {
        BloodGroup::from_label(self.blood_group_label())
    }
}

/// A blood donor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    /// Unique identifier.
    pub id: u64,
    /// Donor name.
    pub name: String,
    /// Blood group label.
    pub blood_group: String,
    /// Units donated.
    pub units: u32,
    /// Contact details, empty when not given.
    #[serde(default)]
    pub contact: String,
}

/// A patient who has been issued blood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Unique identifier.
    pub id: u64,
    /// Patient name.
    pub name: String,
    /// Blood group label.
    pub blood_group: String,
    /// Units issued.
    pub units: u32,
    /// Contact details, empty when not given.
    #[serde(default)]
    pub contact: String,
    /// Treating hospital.
    pub hospital: String,
}

impl Record for Donor {
    const KIND: RecordKind = RecordKind::Donor;

    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn blood_group_label(&self) -> &str {
        &self.blood_group
    }

    fn units(&self) -> u32 {
        self.units
    }
}

impl Record for Patient {
    const KIND: RecordKind = RecordKind::Patient;

    fn id(&self) -> u64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn blood_group_label(&self) -> &str {
        &self.blood_group
    }

    fn units(&self) -> u32 {
        self.units
    }
}

/// Pick an id for a record about to be appended to `existing`.
///
/// Ids are creation timestamps in milliseconds, bumped past the largest id
/// already present so two records created in the same millisecond never
/// share one.
#[must_use]
pub fn next_id<R: Record>(existing: &[R]) -> u64 {
    let now_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    next_id_at(existing, now_ms)
}

/// [`next_id`] with an explicit clock reading.
#[must_use]
pub fn next_id_at<R: Record>(existing: &[R], now_ms: u64) -> u64 {
    let floor = existing
        .iter()
        .map(Record::id)
        .max()
        .map_or(0, |max| max.saturating_add(1));
    now_ms.max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donor(id: u64, group: &str) -> Donor {
        Donor {
            id,
            name: "Ada".to_string(),
            blood_group: group.to_string(),
            units: 2,
            contact: String::new(),
        }
    }

    #[test]
    fn test_slot_keys() {
        assert_eq!(RecordKind::Donor.slot_key(), "donors");
        assert_eq!(RecordKind::Patient.slot_key(), "patients");
    }

    #[test]
    fn test_donor_json_layout() {
        let json = serde_json::to_value(donor(7, "O+")).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["bloodGroup"], "O+");
        assert_eq!(json["units"], 2);
        assert_eq!(json["contact"], "");
    }

    #[test]
    fn test_patient_without_contact_loads() {
        let json = r#"{"id":1,"name":"Bo","bloodGroup":"A-","units":1,"hospital":"General"}"#;
        let patient: Patient = serde_json::from_str(json).unwrap();
        assert_eq!(patient.contact, "");
        assert_eq!(patient.blood_group(), Some(BloodGroup::ANeg));
    }

    #[test]
    fn test_unknown_group_loads_but_does_not_parse() {
        let d = donor(1, "Z+");
        assert_eq!(d.blood_group(), None);
    }

    #[test]
    fn test_next_id_uses_clock_when_empty() {
        let existing: Vec<Donor> = Vec::new();
        assert_eq!(next_id_at(&existing, 1_000), 1_000);
    }

    #[test]
    fn test_next_id_is_monotonic_within_same_millisecond() {
        let mut existing = vec![donor(1_000, "A+")];
        let id = next_id_at(&existing, 1_000);
        assert_eq!(id, 1_001);
        existing.push(donor(id, "A+"));
        assert_eq!(next_id_at(&existing, 1_000), 1_002);
    }

    #[test]
    fn test_next_id_ignores_clock_going_backwards() {
        let existing = vec![donor(5_000, "A+")];
        assert_eq!(next_id_at(&existing, 10), 5_001);
    }

    #[test]
    fn test_next_id_live_clock_is_positive() {
        let existing: Vec<Donor> = Vec::new();
        assert!(next_id(&existing) > 0);
    }
}
