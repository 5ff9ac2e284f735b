//! The front desk: form controllers, the availability gate, and donor removal.
//!
//! Every operation reads the collections fresh from the store, applies one
//! change, writes the whole collection back, and reports the result through
//! the [`Notifier`]. Rejected input is never an `Err`; it becomes an error
//! toast and leaves the store untouched. `Err` is reserved for the store
//! itself failing.

use tracing::{debug, info};

use crate::balance::{compute_balances, Dashboard};
use crate::error::{Result, ValidationError};
use crate::notify::Notifier;
use crate::record::{next_id, Donor, Patient, RecordKind};
use crate::storage::{KeyValueStore, RecordStore};
use crate::table::{render_table, Table};
use crate::validation::{AvailabilityForm, AvailabilityRequest, DonorForm, PatientForm};

/// Which of the two patient forms is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatientView {
    /// The availability check. Patients cannot be registered from here.
    #[default]
    AvailabilityCheck,
    /// The patient intake form, optionally pre-filled by a passed check.
    Intake {
        /// Group and units carried over from the availability check.
        prefill: Option<AvailabilityRequest>,
    },
}

/// Result of an availability check that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// Enough stock; the intake form is now showing.
    Available {
        /// What was asked for.
        request: AvailabilityRequest,
        /// Raw balance of the group.
        balance: i64,
    },
    /// Not enough stock; still on the availability form.
    Shortfall {
        /// What was asked for.
        request: AvailabilityRequest,
        /// Raw balance of the group.
        balance: i64,
    },
}

impl Availability {
    /// Whether the request can be met.
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

/// What happened to a removal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The user said no; nothing changed.
    Declined,
    /// The donor was removed.
    Removed,
    /// Confirmed, but no donor had that id; nothing changed.
    NotFound,
}

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    /// Return `true` to proceed.
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Prompt shown before a donor is removed.
pub const REMOVE_DONOR_PROMPT: &str = "Are you sure to remove donor?";

/// Records, notifications, and the patient-form view state.
#[derive(Debug)]
pub struct FrontDesk<S> {
    store: RecordStore<S>,
    notifier: Notifier,
    view: PatientView,
}

impl<S: KeyValueStore> FrontDesk<S> {
    /// Start a desk over `kv`, on the availability-check view.
    pub fn new(kv: S, notifier: Notifier) -> Self {
        Self {
            store: RecordStore::new(kv),
            notifier,
            view: PatientView::default(),
        }
    }

    /// The record store.
    #[must_use]
    pub fn store(&self) -> &RecordStore<S> {
        &self.store
    }

    /// The notifier toasts go to.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Which patient form is showing.
    #[must_use]
    pub fn view(&self) -> PatientView {
        self.view
    }

    /// Show the patient intake form without running a check.
    pub fn open_intake(&mut self) {
        self.view = PatientView::Intake { prefill: None };
    }

    /// Current dashboard.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn dashboard(&self) -> Result<Dashboard> {
        let donors = self.store.donors()?;
        let patients = self.store.patients()?;
        Ok(Dashboard::from_records(&donors, &patients))
    }

    /// Current table for `kind`, filtered by `search`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn table(&self, kind: RecordKind, search: &str) -> Result<Table> {
        render_table(&self.store, kind, search)
    }

    /// Submit the donor intake form.
    ///
    /// On success the donor is stored, `form` is cleared, and the new record
    /// is returned. On invalid input an error toast is shown and `None` is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn submit_donor(&mut self, form: &mut DonorForm) -> Result<Option<Donor>> {
        let entry = match form.validate() {
            Ok(entry) => entry,
            Err(e) => return Ok(self.reject(e)),
        };

        let mut donors = self.store.donors()?;
        let donor = Donor {
            id: next_id(&donors),
            name: entry.name,
            blood_group: entry.group.label().to_string(),
            units: entry.units,
            contact: entry.contact,
        };
        donors.push(donor.clone());
        self.store.save(&donors)?;

        *form = DonorForm::default();
        info!(id = donor.id, group = %donor.blood_group, units = donor.units, "Donor added");
        self.notifier.success("Donor added successfully!");
        Ok(Some(donor))
    }

    /// Submit the patient intake form.
    ///
    /// Only accepted while the intake form is showing. On success the view
    /// goes back to the availability check.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn submit_patient(&mut self, form: &mut PatientForm) -> Result<Option<Patient>> {
        if !matches!(self.view, PatientView::Intake { .. }) {
            return Ok(self.reject(ValidationError::IntakeHidden));
        }
        let entry = match form.validate() {
            Ok(entry) => entry,
            Err(e) => return Ok(self.reject(e)),
        };

        let mut patients = self.store.patients()?;
        let patient = Patient {
            id: next_id(&patients),
            name: entry.name,
            blood_group: entry.group.label().to_string(),
            units: entry.units,
            contact: entry.contact,
            hospital: entry.hospital,
        };
        patients.push(patient.clone());
        self.store.save(&patients)?;

        *form = PatientForm::default();
        info!(id = patient.id, group = %patient.blood_group, units = patient.units, "Patient added");
        self.notifier.success("Patient added successfully!");
        self.view = PatientView::AvailabilityCheck;
        Ok(Some(patient))
    }

    /// Run the availability check.
    ///
    /// When the group's raw balance covers the request, the intake form is
    /// shown pre-filled with the request. A shortfall returns to the
    /// availability form and drops any earlier prefill. It is reported with
    /// success styling, matching the long-standing behaviour of this screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn check_availability(&mut self, form: &AvailabilityForm) -> Result<Option<Availability>> {
        let request = match form.validate() {
            Ok(request) => request,
            Err(e) => return Ok(self.reject(e)),
        };

        let donors = self.store.donors()?;
        let patients = self.store.patients()?;
        let balance = compute_balances(&donors, &patients)[request.group];
        debug!(group = %request.group, requested = request.units, balance, "Availability check");

        if balance >= i64::from(request.units) {
            self.view = PatientView::Intake {
                prefill: Some(request),
            };
            self.notifier.success("Blood available!");
            Ok(Some(Availability::Available { request, balance }))
        } else {
            self.view = PatientView::AvailabilityCheck;
            // TODO: switch to error severity once product confirms the shortfall wording
            self.notifier.success("Required blood not available.");
            Ok(Some(Availability::Shortfall { request, balance }))
        }
    }

    /// A patient form pre-filled from the last passed availability check.
    #[must_use]
    pub fn patient_form(&self) -> PatientForm {
        let mut form = PatientForm::default();
        if let PatientView::Intake {
            prefill: Some(request),
        } = self.view
        {
            form.blood_group = request.group.label().to_string();
            form.units = request.units.to_string();
        }
        form
    }

    /// Remove a donor after confirmation.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn remove_donor(&mut self, id: u64, confirm: &mut dyn Confirm) -> Result<Removal> {
        if !confirm.confirm(REMOVE_DONOR_PROMPT) {
            debug!(id, "Donor removal declined");
            return Ok(Removal::Declined);
        }

        let donors = self.store.donors()?;
        let before = donors.len();
        let kept: Vec<Donor> = donors.into_iter().filter(|d| d.id != id).collect();
        let removed = kept.len() != before;
        self.store.save(&kept)?;

        if removed {
            info!(id, "Donor removed");
        } else {
            debug!(id, "No donor with that id");
        }
        self.notifier.warn("Donor removed.");
        Ok(if removed {
            Removal::Removed
        } else {
            Removal::NotFound
        })
    }

    /// Forget every donor and patient.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn reset(&mut self) -> Result<()> {
        self.store.clear(RecordKind::Donor)?;
        self.store.clear(RecordKind::Patient)?;
        self.view = PatientView::default();
        info!("All records cleared");
        Ok(())
    }

    fn reject<T>(&self, error: ValidationError) -> Option<T> {
        debug!(%error, "Submission rejected");
        self.notifier.error(error.to_string());
        None
    }
}
