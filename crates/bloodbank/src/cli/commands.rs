//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands. The interactive
//! shell parses its lines with the same definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::validation::{AvailabilityForm, DonorForm, PatientForm};

/// Dashboard command arguments.
#[derive(Debug, Args)]
pub struct DashboardCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Donor commands.
#[derive(Debug, Subcommand)]
pub enum DonorCommand {
    /// Register a donation
    Add(DonorFields),

    /// List donors
    List(ListArgs),

    /// Remove a donor by id
    Remove {
        /// Donor id, as shown by `donor list`
        id: u64,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Patient commands.
#[derive(Debug, Subcommand)]
pub enum PatientCommand {
    /// Check whether a request can be met
    Check(CheckFields),

    /// Check availability, then register the patient if stock allows
    Add(PatientFields),

    /// Submit the patient intake form opened by a passed check (shell only)
    Submit(IntakeFields),

    /// List patients
    List(ListArgs),
}

/// Donor intake fields. Values are taken as typed and validated later.
#[derive(Debug, Clone, Args)]
pub struct DonorFields {
    /// Donor name
    #[arg(short, long, default_value = "")]
    pub name: String,

    /// Blood group (A+, A-, B+, B-, AB+, AB-, O+, O-)
    #[arg(short, long, default_value = "", allow_hyphen_values = true)]
    pub blood_group: String,

    /// Units donated
    #[arg(short, long, default_value = "", allow_hyphen_values = true)]
    pub units: String,

    /// Contact details
    #[arg(long, default_value = "")]
    pub contact: String,
}

/// Availability-check fields.
#[derive(Debug, Clone, Args)]
pub struct CheckFields {
    /// Requested blood group
    #[arg(short, long, default_value = "", allow_hyphen_values = true)]
    pub blood_group: String,

    /// Requested units
    #[arg(short, long, default_value = "", allow_hyphen_values = true)]
    pub units: String,
}

/// Patient registration fields for the one-shot `patient add`.
#[derive(Debug, Clone, Args)]
pub struct PatientFields {
    /// Requested blood group and units
    #[command(flatten)]
    pub request: CheckFields,

    /// Patient name
    #[arg(short, long, default_value = "")]
    pub name: String,

    /// Contact details
    #[arg(long, default_value = "")]
    pub contact: String,

    /// Treating hospital
    #[arg(short = 'H', long, default_value = "")]
    pub hospital: String,
}

/// Intake fields; group and units default to the availability-check prefill.
#[derive(Debug, Clone, Args)]
pub struct IntakeFields {
    /// Patient name
    #[arg(short, long, default_value = "")]
    pub name: String,

    /// Contact details
    #[arg(long, default_value = "")]
    pub contact: String,

    /// Treating hospital
    #[arg(short = 'H', long, default_value = "")]
    pub hospital: String,

    /// Override the pre-filled blood group
    #[arg(short, long, allow_hyphen_values = true)]
    pub blood_group: Option<String>,

    /// Override the pre-filled units
    #[arg(short, long, allow_hyphen_values = true)]
    pub units: Option<String>,
}

/// Table listing arguments.
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Only rows whose name or blood group contains this text
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Output format (defaults to the configured table format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab-separated rows
    Plain,
    /// Aligned columns with a header
    #[default]
    Table,
    /// JSON output
    Json,
}

impl From<DonorFields> for DonorForm {
    fn from(fields: DonorFields) -> Self {
        Self {
            name: fields.name,
            blood_group: fields.blood_group,
            units: fields.units,
            contact: fields.contact,
        }
    }
}

impl From<CheckFields> for AvailabilityForm {
    fn from(fields: CheckFields) -> Self {
        Self {
            blood_group: fields.blood_group,
            units: fields.units,
        }
    }
}

impl IntakeFields {
    /// Fill the remaining fields of a (possibly pre-filled) patient form.
    #[must_use]
    pub fn apply(self, mut form: PatientForm) -> PatientForm {
        form.name = self.name;
        form.contact = self.contact;
        form.hospital = self.hospital;
        if let Some(group) = self.blood_group {
            form.blood_group = group;
        }
        if let Some(units) = self.units {
            form.units = units;
        }
        form
    }
}

impl PatientFields {
    /// Split into the availability request and the remaining intake fields.
    #[must_use]
    pub fn split(self) -> (AvailabilityForm, IntakeFields) {
        (
            self.request.into(),
            IntakeFields {
                name: self.name,
                contact: self.contact,
                hospital: self.hospital,
                blood_group: None,
                units: None,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_output_format_serde() {
        assert_eq!(serde_json::to_string(&OutputFormat::Plain).unwrap(), "\"plain\"");
        let f: OutputFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(f, OutputFormat::Json);
    }

    #[test]
    fn test_donor_fields_into_form() {
        let form: DonorForm = DonorFields {
            name: "Ada".to_string(),
            blood_group: "A+".to_string(),
            units: "5".to_string(),
            contact: String::new(),
        }
        .into();
        assert_eq!(form.units, "5");
    }

    #[test]
    fn test_intake_keeps_prefill_unless_overridden() {
        let prefilled = PatientForm {
            blood_group: "O-".to_string(),
            units: "2".to_string(),
            ..PatientForm::default()
        };
        let fields = IntakeFields {
            name: "Pat".to_string(),
            contact: String::new(),
            hospital: "General".to_string(),
            blood_group: None,
            units: Some("1".to_string()),
        };
        let form = fields.apply(prefilled);
        assert_eq!(form.blood_group, "O-");
        assert_eq!(form.units, "1");
        assert_eq!(form.hospital, "General");
    }

    #[test]
    fn test_patient_fields_split() {
        let fields = PatientFields {
            request: CheckFields {
                blood_group: "B+".to_string(),
                units: "3".to_string(),
            },
            name: "Pat".to_string(),
            contact: "555".to_string(),
            hospital: "General".to_string(),
        };
        let (check, intake) = fields.split();
        assert_eq!(check.blood_group, "B+");
        assert_eq!(intake.name, "Pat");
        assert!(intake.units.is_none());
    }
}
