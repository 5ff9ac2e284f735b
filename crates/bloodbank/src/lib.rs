//! `bloodbank` - Blood donation and patient request tracking
//!
//! This library keeps donor and patient records in a small key-value store,
//! derives per-group stock from them, and gates patient registration on an
//! availability check.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod balance;
pub mod blood_group;
pub mod cli;
pub mod config;
pub mod desk;
pub mod error;
pub mod logging;
pub mod notify;
pub mod record;
pub mod shell;
pub mod storage;
pub mod table;
pub mod validation;

pub use balance::{compute_balances, Balances, Dashboard};
pub use blood_group::BloodGroup;
pub use config::Config;
pub use desk::{Availability, Confirm, FrontDesk, PatientView, Removal};
pub use error::{Error, Result, ValidationError};
pub use logging::init_logging;
pub use notify::{Notifier, Severity, Toast};
pub use record::{Donor, Patient, Record, RecordKind};
pub use storage::{KeyValueStore, MemoryStore, RecordStore, SqliteStore};
pub use table::{render_table, Table};
