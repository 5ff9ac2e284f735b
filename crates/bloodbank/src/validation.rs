//! Form input and its validation.
//!
//! Forms carry the raw text of each field. Validation trims strings and
//! checks fields in a fixed order; the first failure is reported and nothing
//! else is looked at.

use crate::blood_group::BloodGroup;
use crate::error::ValidationError;

/// Raw contents of the donor intake form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonorForm {
    /// Donor name.
    pub name: String,
    /// Selected blood group label.
    pub blood_group: String,
    /// Units, as typed.
    pub units: String,
    /// Contact details.
    pub contact: String,
}

/// Raw contents of the patient intake form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientForm {
    /// Patient name.
    pub name: String,
    /// Selected blood group label.
    pub blood_group: String,
    /// Units, as typed.
    pub units: String,
    /// Contact details.
    pub contact: String,
    /// Treating hospital.
    pub hospital: String,
}

/// Raw contents of the availability-check form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityForm {
    /// Requested blood group label.
    pub blood_group: String,
    /// Requested units, as typed.
    pub units: String,
}

/// A donor submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonorEntry {
    /// Trimmed, non-empty name.
    pub name: String,
    /// Blood group.
    pub group: BloodGroup,
    /// Positive unit count.
    pub units: u32,
    /// Trimmed contact, possibly empty.
    pub contact: String,
}

/// A patient submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientEntry {
    /// Trimmed, non-empty name.
    pub name: String,
    /// Blood group.
    pub group: BloodGroup,
    /// Positive unit count.
    pub units: u32,
    /// Trimmed contact, possibly empty.
    pub contact: String,
    /// Trimmed, non-empty hospital.
    pub hospital: String,
}

/// A validated availability request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityRequest {
    /// Requested group.
    pub group: BloodGroup,
    /// Requested units, positive.
    pub units: u32,
}

impl DonorForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: name, blood group, units.
    pub fn validate(&self) -> Result<DonorEntry, ValidationError> {
        let name = required(&self.name).ok_or(ValidationError::EmptyDonorName)?;
        let group = parse_group(&self.blood_group)?;
        let units = parse_units(&self.units)?;
        Ok(DonorEntry {
            name,
            group,
            units,
            contact: self.contact.trim().to_string(),
        })
    }
}

impl PatientForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: name, blood group, units, hospital.
    pub fn validate(&self) -> Result<PatientEntry, ValidationError> {
        let name = required(&self.name).ok_or(ValidationError::EmptyPatientName)?;
        let group = parse_group(&self.blood_group)?;
        let units = parse_units(&self.units)?;
        let hospital = required(&self.hospital).ok_or(ValidationError::EmptyHospital)?;
        Ok(PatientEntry {
            name,
            group,
            units,
            contact: self.contact.trim().to_string(),
            hospital,
        })
    }
}

impl AvailabilityForm {
    /// Validate the form.
    ///
    /// # Errors
    ///
    /// Returns the first failing check: blood group, units.
    pub fn validate(&self) -> Result<AvailabilityRequest, ValidationError> {
        let group = parse_group(&self.blood_group)?;
        let units = parse_units(&self.units)?;
        Ok(AvailabilityRequest { group, units })
    }
}

fn required(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_group(value: &str) -> Result<BloodGroup, ValidationError> {
    value
        .parse()
        .map_err(|_| ValidationError::MissingBloodGroup)
}

/// Parse a unit count the lenient way form inputs are read.
///
/// Leading whitespace and an optional sign are accepted, then as many
/// decimal digits as follow; anything after the digits is ignored, so
/// `"4 units"` is 4 and `"2.9"` is 2. The result must be a positive count
/// that fits in a `u32`.
///
/// # Errors
///
/// Returns [`ValidationError::NonPositiveUnits`] when there are no digits or
/// the value is not positive.
pub fn parse_units(value: &str) -> Result<u32, ValidationError> {
    let s = value.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 || negative {
        return Err(ValidationError::NonPositiveUnits);
    }

    match rest[..digits_len].parse::<u32>() {
        Ok(units) if units > 0 => Ok(units),
        _ => Err(ValidationError::NonPositiveUnits),
    }
}
